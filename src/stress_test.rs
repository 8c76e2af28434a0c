use cinnabar_compaction::compress;
use cinnabar_core::ActorId;
use cinnabar_db::{LwwMap, Sequence};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Statistics collected during stress testing
#[derive(Clone, Debug)]
pub struct StressTestStats {
    pub label: &'static str,
    pub num_replicas: usize,
    pub ops_per_replica: usize,
    pub rounds: usize,
    pub ops_exchanged: usize,
    pub ops_after_compression: usize,
    pub total_time: Duration,
    pub ops_per_second: f64,
    pub converged: bool,
}

impl StressTestStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Stress Test Statistics                        ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Container:                 {:>30} ║", self.label);
        println!("║  Number of Replicas:        {:>30} ║", self.num_replicas);
        println!("║  Operations per Replica:    {:>30} ║", self.ops_per_replica);
        println!("║  Sync Rounds:               {:>30} ║", self.rounds);
        println!("║  Operations Exchanged:      {:>30} ║", self.ops_exchanged);
        println!("║  After Compression:         {:>30} ║", self.ops_after_compression);
        println!(
            "║  Total Time:                {:>29}s ║",
            format!("{:.3}", self.total_time.as_secs_f64())
        );
        println!("║  Operations/Second:         {:>30.0} ║", self.ops_per_second);
        println!(
            "║  Converged:                 {:>30} ║",
            if self.converged { "yes" } else { "NO" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// Multi-replica sequence stress: every replica edits independently each
/// round, batches are delivered to every peer in a shuffled order with
/// occasional duplicates, and the run ends with a convergence check.
pub fn stress_test_sequences(
    num_replicas: usize,
    ops_per_replica: usize,
    rounds: usize,
    seed: u64,
) -> StressTestStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Sequence Stress Test                                ║");
    println!(
        "║  Replicas: {:<3} | Ops/Replica: {:<5} | Rounds: {:<5}        ║",
        num_replicas, ops_per_replica, rounds
    );
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut rng = StdRng::seed_from_u64(seed);
    let start = Instant::now();

    let mut replicas: Vec<Sequence<String>> = (0..num_replicas)
        .map(|i| Sequence::new(ActorId::new(format!("replica-{i}"))))
        .collect();

    let mut ops_exchanged = 0usize;
    let mut ops_after_compression = 0usize;

    for round in 0..rounds {
        // Phase 1: independent local editing.
        for replica in replicas.iter_mut() {
            for _ in 0..ops_per_replica {
                let len = replica.len();
                match rng.gen_range(0..4) {
                    0 => replica
                        .insert(rng.gen_range(0..=len), format!("r{round}"))
                        .expect("insert in bounds"),
                    1 if len > 0 => replica.remove(rng.gen_range(0..len)).expect("in bounds"),
                    2 if len > 0 => replica
                        .update(rng.gen_range(0..len), |v| format!("{v}."))
                        .expect("in bounds"),
                    3 if len > 1 => replica
                        .move_item(rng.gen_range(0..len), rng.gen_range(0..len))
                        .expect("in bounds"),
                    _ => replica
                        .insert(0, format!("r{round}"))
                        .expect("insert at head"),
                }
            }
        }

        // Phase 2: exchange raw batches, shuffled, with duplicates.
        // Compression is measured but not shipped here: folded batches are
        // for fresh-replica replay, not incremental exchange.
        let batches: Vec<Vec<_>> = replicas
            .iter_mut()
            .map(|replica| {
                let ops = replica.export_operations();
                ops_exchanged += ops.len();
                ops_after_compression += compress(&ops).len();
                ops
            })
            .collect();

        for (to, replica) in replicas.iter_mut().enumerate() {
            let mut deliveries: Vec<usize> =
                (0..num_replicas).filter(|from| *from != to).collect();
            // Retransmit one batch per round.
            if let Some(&dup) = deliveries.first() {
                deliveries.push(dup);
            }
            deliveries.shuffle(&mut rng);
            for from in deliveries {
                replica.apply_remote(&batches[from]);
            }
        }

        if (round + 1) % 10 == 0 {
            println!("  Rounds completed: {}/{}", round + 1, rounds);
        }
    }

    let converged = replicas
        .windows(2)
        .all(|pair| pair[0].to_vec() == pair[1].to_vec());
    let total_time = start.elapsed();
    let total_ops = num_replicas * ops_per_replica * rounds;

    StressTestStats {
        label: "Sequence<String>",
        num_replicas,
        ops_per_replica,
        rounds,
        ops_exchanged,
        ops_after_compression,
        total_time,
        ops_per_second: total_ops as f64 / total_time.as_secs_f64(),
        converged,
    }
}

/// Register-map stress: rival writers hammer a small key space and every
/// replica must settle on the same winners.
pub fn stress_test_maps(
    num_replicas: usize,
    ops_per_replica: usize,
    rounds: usize,
    seed: u64,
) -> StressTestStats {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Register Map Stress Test                            ║");
    println!(
        "║  Replicas: {:<3} | Ops/Replica: {:<5} | Rounds: {:<5}        ║",
        num_replicas, ops_per_replica, rounds
    );
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut rng = StdRng::seed_from_u64(seed);
    let start = Instant::now();

    let mut replicas: Vec<LwwMap<String>> = (0..num_replicas)
        .map(|i| LwwMap::new(ActorId::new(format!("replica-{i}"))))
        .collect();

    let mut ops_exchanged = 0usize;
    let mut ops_after_compression = 0usize;

    for round in 0..rounds {
        for (idx, replica) in replicas.iter_mut().enumerate() {
            for op in 0..ops_per_replica {
                let key = format!("k{}", rng.gen_range(0..16));
                replica.set(key, format!("r{round}-{idx}-{op}"));
            }
        }

        let batches: Vec<Vec<_>> = replicas
            .iter_mut()
            .map(|replica| {
                let ops = replica.export_operations();
                ops_exchanged += ops.len();
                ops_after_compression += compress(&ops).len();
                ops
            })
            .collect();

        for (to, replica) in replicas.iter_mut().enumerate() {
            let mut deliveries: Vec<usize> =
                (0..num_replicas).filter(|from| *from != to).collect();
            deliveries.shuffle(&mut rng);
            for from in deliveries {
                replica.apply_remote(&batches[from]);
            }
        }
    }

    let converged = replicas
        .windows(2)
        .all(|pair| pair[0].to_map() == pair[1].to_map());
    let total_time = start.elapsed();
    let total_ops = num_replicas * ops_per_replica * rounds;

    StressTestStats {
        label: "LwwMap<String>",
        num_replicas,
        ops_per_replica,
        rounds,
        ops_exchanged,
        ops_after_compression,
        total_time,
        ops_per_second: total_ops as f64 / total_time.as_secs_f64(),
        converged,
    }
}

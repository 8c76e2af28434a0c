use stress_test::{stress_test_maps, stress_test_sequences};
pub mod stress_test;

fn main() {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            CINNABAR STRESS TESTS                           ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: sequences at small scale
    let stats = stress_test_sequences(3, 50, 20, 0xC1AB);
    stats.print();
    assert!(stats.converged);

    // Test 2: register maps at small scale
    let stats = stress_test_maps(3, 50, 20, 0xC1AB);
    stats.print();
    assert!(stats.converged);

    // Test 3: sequences at medium scale
    let stats = stress_test_sequences(8, 200, 50, 0xBEEF);
    stats.print();
    assert!(stats.converged);

    // Test 4: register maps at medium scale
    let stats = stress_test_maps(8, 200, 50, 0xBEEF);
    stats.print();
    assert!(stats.converged);

    println!("\n✓ All stress tests completed successfully!");
}

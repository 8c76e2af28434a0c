//! # Cinnabar Tasks
//!
//! A standalone CLI walkthrough of the Cinnabar CRDT engine: simulated
//! devices edit a shared task list (an ordered sequence) and its settings
//! (a register map) without coordination, broadcast operation batches over
//! the byte-level host contract, and converge.

use clap::{Parser, Subcommand};
use colored::*;

use cinnabar_core::ActorId;
use cinnabar_db::{LwwMap, Sequence};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cinnabar-tasks")]
#[command(about = "CRDT-based task list walkthrough (Cinnabar engine)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Basic demo: two devices edit a list, sync, and converge
    Demo,
    /// Conflict scenario: rival edits to the same task and the same
    /// setting, merge-order independence
    Conflict,
    /// Partition simulation: offline editing on both sides, then heal
    Partition,
}

// ─── Device: a simulated node holding a task list and its settings ─────────

/// Pending changes drained from one device, as the host would put them on
/// the wire. A batch is broadcast: every peer gets the same bytes.
struct Batch {
    from: &'static str,
    tasks: Vec<u8>,
    settings: Vec<u8>,
}

struct Device {
    name: &'static str,
    tasks: Sequence<String>,
    settings: LwwMap<String>,
}

impl Device {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: Sequence::new(ActorId::from(name)),
            settings: LwwMap::new(ActorId::from(name)),
        }
    }

    /// Drain pending changes into a broadcastable batch.
    fn export(&mut self) -> Batch {
        Batch {
            from: self.name,
            tasks: self.tasks.export_bytes().expect("encode tasks"),
            settings: self.settings.export_bytes().expect("encode settings"),
        }
    }

    /// Merge a received batch; prints how many operations applied.
    fn apply(&mut self, batch: &Batch) {
        let applied = self
            .tasks
            .apply_remote_bytes(&batch.tasks)
            .expect("apply tasks")
            + self
                .settings
                .apply_remote_bytes(&batch.settings)
                .expect("apply settings");
        println!(
            "  {} {} → {} ({} ops applied)",
            "sync".cyan(),
            batch.from.bold(),
            self.name.bold(),
            applied
        );
    }

    fn show(&self) {
        println!("  {}:", self.name.bold());
        for (i, task) in self.tasks.iter().enumerate() {
            println!("    {i}. {task}");
        }
        let settings = serde_json::to_string(&self.settings.to_map()).expect("render settings");
        println!("    {} {}", "settings".dimmed(), settings.dimmed());
    }
}

fn exchange(a: &mut Device, b: &mut Device) {
    let from_a = a.export();
    let from_b = b.export();
    b.apply(&from_a);
    a.apply(&from_b);
}

fn banner(text: &str) {
    println!("\n{}", format!("── {text} ──").yellow().bold());
}

// ─── Scenarios ─────────────────────────────────────────────────────────────

fn demo() {
    banner("Two devices, one grocery list");

    let mut tab = Device::new("tab");
    let mut phone = Device::new("phone");

    tab.tasks.push("milk".to_string()).expect("push");
    tab.tasks.push("bread".to_string()).expect("push");
    tab.settings.set("title", "groceries".to_string());
    let seed = tab.export();
    phone.apply(&seed);

    banner("Both edit while apart");
    phone.tasks.insert(1, "eggs".to_string()).expect("insert");
    tab.tasks.push("coffee".to_string()).expect("push");

    banner("Exchange");
    exchange(&mut tab, &mut phone);

    tab.show();
    phone.show();

    assert_eq!(tab.tasks.to_vec(), phone.tasks.to_vec());
    println!("\n{}", "✓ both devices agree".green().bold());
}

fn conflict() {
    banner("Rival edits to the same task and the same setting");

    let mut tab = Device::new("tab");
    let mut phone = Device::new("phone");
    let mut laptop = Device::new("laptop");

    tab.tasks.push("call the bank".to_string()).expect("push");
    let seed = tab.export();
    phone.apply(&seed);
    laptop.apply(&seed);

    // All three rewrite the same task, two also fight over the title.
    tab.tasks
        .update(0, |_| "call the bank (urgent)".to_string())
        .expect("update");
    phone
        .tasks
        .update(0, |_| "call the bank tomorrow".to_string())
        .expect("update");
    laptop
        .tasks
        .update(0, |_| "email the bank".to_string())
        .expect("update");

    tab.settings.set("title", "errands".to_string());
    phone.settings.set("title", "today".to_string());

    banner("Broadcast in different orders");
    let from_tab = tab.export();
    let from_phone = phone.export();
    let from_laptop = laptop.export();

    // Every device hears the other two in a different order.
    tab.apply(&from_phone);
    tab.apply(&from_laptop);
    phone.apply(&from_laptop);
    phone.apply(&from_tab);
    laptop.apply(&from_tab);
    laptop.apply(&from_phone);

    tab.show();
    phone.show();
    laptop.show();

    assert_eq!(tab.tasks.to_vec(), phone.tasks.to_vec());
    assert_eq!(phone.tasks.to_vec(), laptop.tasks.to_vec());
    assert_eq!(tab.settings.to_map(), phone.settings.to_map());
    assert_eq!(phone.settings.to_map(), laptop.settings.to_map());
    println!(
        "\n{}",
        "✓ one writer won everywhere, merge order did not matter"
            .green()
            .bold()
    );
}

fn partition() {
    banner("Partition: both sides edit independently");

    let mut home = Device::new("home");
    let mut office = Device::new("office");

    home.tasks.push("water plants".to_string()).expect("push");
    home.tasks.push("file taxes".to_string()).expect("push");
    let seed = home.export();
    office.apply(&seed);

    // The network is gone; both sides keep working.
    home.tasks.push("fix faucet".to_string()).expect("push");
    home.tasks.remove(0).expect("remove");

    office
        .tasks
        .insert(1, "book flights".to_string())
        .expect("insert");
    office
        .tasks
        .update(1, |v| format!("{v} (before friday)"))
        .expect("update");
    office.tasks.move_item(1, 0).expect("move");

    println!("\n  {}", "while partitioned:".dimmed());
    home.show();
    office.show();

    banner("Heal: exchange everything");
    exchange(&mut home, &mut office);

    home.show();
    office.show();

    assert_eq!(home.tasks.to_vec(), office.tasks.to_vec());
    println!("\n{}", "✓ partition healed, lists identical".green().bold());
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => demo(),
        Commands::Conflict => conflict(),
        Commands::Partition => partition(),
    }
}

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use signal_sim::simulation::{AlwaysGreen, FixedCycle, SimWorld};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyKind {
    /// Keep every signal as configured (all green in the reference network)
    AlwaysGreen,
    /// Alternate north-south and west-east green every `--cycle` time units
    FixedCycle,
}

#[derive(Parser)]
#[command(name = "signal_sim")]
#[command(about = "Traffic simulation of a signalized intersection network")]
struct Cli {
    /// Maximum number of simulation ticks to run
    #[arg(long, default_value = "40")]
    ticks: u64,

    /// Time delta per tick
    #[arg(long, default_value = "1.0")]
    delta: f32,

    /// Signal policy applied after every tick
    #[arg(long, value_enum, default_value = "always-green")]
    policy: PolicyKind,

    /// Phase length for the fixed-cycle policy
    #[arg(long, default_value = "10.0")]
    cycle: f32,

    /// Extra vehicles on random routes, added to the two reference vehicles
    #[arg(long, default_value = "0")]
    random_vehicles: usize,

    /// Number of roads in each random route
    #[arg(long, default_value = "3")]
    hops: usize,

    /// Seed for reproducible random routes
    #[arg(long)]
    seed: Option<u64>,

    /// Only print the final state and statistics
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,signal_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    run_headless(&cli)
}

fn build_world(cli: &Cli) -> Result<SimWorld> {
    let mut world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(seed),
        None => SimWorld::new(),
    };

    match cli.policy {
        PolicyKind::AlwaysGreen => world.set_policy(AlwaysGreen),
        PolicyKind::FixedCycle => world.set_policy(FixedCycle::new(cli.cycle)),
    }

    let grid = world
        .add_reference_roads()
        .context("Failed to build reference network")?;
    world
        .add_reference_vehicles(grid)
        .context("Failed to add reference vehicles")?;

    for _ in 0..cli.random_vehicles {
        world
            .add_random_vehicle(cli.hops)
            .context("Failed to add random vehicle")?;
    }

    Ok(world)
}

/// Run the simulation in headless mode, printing progress after every tick
fn run_headless(cli: &Cli) -> Result<()> {
    println!("Running signalized intersection simulation...");
    println!("Ticks: {}, Delta: {}, Policy: {:?}", cli.ticks, cli.delta, cli.policy);
    println!();

    let mut world = build_world(cli)?;

    println!("Initial state:");
    world.print_summary();
    println!();

    let mut finished = false;
    for tick in 1..=cli.ticks {
        finished = world
            .tick(cli.delta)
            .with_context(|| format!("Simulation failed at tick {}", tick))?;

        if !cli.quiet {
            println!("--- After tick {} ({:.1} simulated time) ---", tick, world.time);
            world.print_summary();
            println!();
        }

        if finished {
            info!("All vehicles arrived after {} ticks", tick);
            break;
        }
    }

    if !finished {
        info!(
            "Stopped after {} ticks with {}/{} vehicles arrived",
            cli.ticks,
            world.arrived_count(),
            world.vehicles().len()
        );
    }

    println!("=== Final State ===");
    world.print_summary();
    println!();

    let stats = world.stats().context("Failed to compute statistics")?;
    print!("{}", stats);

    Ok(())
}

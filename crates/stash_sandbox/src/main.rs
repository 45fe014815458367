//! Stash Sandbox
//!
//! Replays a scripted sequence of input frames against a world described in
//! TOML and prints where every item ended up.
//!
//! Run with: cargo run -p stash_sandbox
//!       or: cargo run --bin stash-sandbox -- path/to/sandbox.toml

mod scene;

use scene::{Sandbox, SandboxDefinition, SandboxResult};
use stash_interact::ItemHolder;

/// Scenario used when no path is given
const DEFAULT_SANDBOX: &str = include_str!("../sandbox.toml");

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    if let Err(e) = run() {
        log::error!("Sandbox failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> SandboxResult<()> {
    // First non-flag argument is the sandbox path
    let path = std::env::args().skip(1).find(|arg| !arg.starts_with("--"));

    let definition = match &path {
        Some(path) => {
            log::info!("Loading sandbox from {}", path);
            SandboxDefinition::load(path)?
        }
        None => {
            log::info!("Loading built-in sandbox");
            SandboxDefinition::from_toml_str(DEFAULT_SANDBOX)?
        }
    };

    let mut sandbox = Sandbox::build(definition)?;
    let events = sandbox.run()?;
    let rejected = events.iter().filter(|e| e.is_rejection()).count();
    log::info!("Replayed {} events ({} refused)", events.len(), rejected);

    println!();
    print!("{}", sandbox.summary());

    let stored: usize = sandbox
        .world()
        .iter()
        .filter_map(|(_, prop)| prop.container.as_ref())
        .map(|c| c.len())
        .sum();
    println!(
        "{} props in the world, {} items inside world containers, {} in the inventory",
        sandbox.world().len(),
        stored,
        sandbox.player().inventory().len()
    );

    Ok(())
}

//! Run Dock Health lifecycle scenarios against a live account
//! Usage: cargo run --bin run_scenario [--scenario NAME]... [--config PATH] [--list]

use std::path::PathBuf;

use dockhealth_client::config::{self, AppConfig};
use dockhealth_client::scenarios;
use dockhealth_client::ScenarioContext;

struct Args {
    scenarios: Vec<String>,
    config: Option<PathBuf>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut parsed = Args {
        scenarios: Vec::new(),
        config: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" | "-s" => {
                if i + 1 < args.len() {
                    parsed.scenarios.push(args[i + 1].clone());
                    i += 2;
                } else {
                    eprintln!("ERROR: --scenario requires a value");
                    std::process::exit(1);
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    parsed.config = Some(PathBuf::from(&args[i + 1]));
                    i += 2;
                } else {
                    eprintln!("ERROR: --config requires a value");
                    std::process::exit(1);
                }
            }
            "--list" => {
                for name in scenarios::NAMES {
                    println!("{}", name);
                }
                std::process::exit(0);
            }
            "--help" | "-h" => {
                println!("Usage: run_scenario [--scenario NAME]... [--config PATH] [--list]");
                println!("  --scenario NAME  Scenario to run; repeat for several (default: all)");
                println!("  --config PATH    YAML configuration file");
                println!("  --list           Print scenario names and exit");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    parsed
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dockhealth_client=info".into()),
        )
        .init();

    let args = parse_args();
    config::load_dotenv();

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    let names: Vec<String> = if args.scenarios.is_empty() {
        scenarios::NAMES.iter().map(|n| n.to_string()).collect()
    } else {
        args.scenarios
    };

    let ctx = ScenarioContext::new(config)?;

    println!("=== Dock Health Scenarios ===");
    let mut failed = Vec::new();
    for name in &names {
        match scenarios::run(name, &ctx).await {
            Ok(report) => {
                println!(
                    "✓ {} ({} steps, {} fixtures)",
                    report.name,
                    report.steps.len(),
                    report.created.len()
                );
                for note in &report.notes {
                    println!("  ! {}", note);
                }
            }
            Err(e) => {
                println!("✗ {}: {}", name, e);
                failed.push(name.clone());
            }
        }
    }

    println!();
    println!("Passed: {}/{}", names.len() - failed.len(), names.len());

    if !failed.is_empty() {
        anyhow::bail!("Failed scenarios: {}", failed.join(", "));
    }

    Ok(())
}

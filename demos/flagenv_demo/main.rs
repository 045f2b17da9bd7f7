//! # flagenv demo application
//!
//! A sample CLI tool that shows how to wire [flagenv](https://docs.rs/flagenv)
//! into an application. It exists purely to demonstrate and manually verify
//! the crate's behavior.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example flagenv_demo -- echo
//! cargo run --example flagenv_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                        |
//! |-------------------------|---------------------------------------------------------------------------|
//! | Struct defaults         | `cargo run --example flagenv_demo -- echo`                                |
//! | Env var override        | `COLOR=red cargo run --example flagenv_demo -- echo`                      |
//! | Explicit env name       | `DEMO_NAME=other cargo run --example flagenv_demo -- echo`                |
//! | Flag beats env          | `SERVER_PORT=1 cargo run --example flagenv_demo -- --server-port 2 echo`  |
//! | Unprefixed nested env   | `MAX_CONNECTIONS=5 cargo run --example flagenv_demo -- echo`              |
//! | Repeated map flag       | `cargo run --example flagenv_demo -- --label a=1 --label b=2 echo`        |
//! | Map from env            | `LABELS='a=1,"b=x,y"' cargo run --example flagenv_demo -- echo`           |
//! | Custom value            | `cargo run --example flagenv_demo -- --log-level warn echo`               |
//! | Where values came from  | `cargo run --example flagenv_demo -- -v --timeout 5s sources`             |
//! | Registration logs       | `RUST_LOG=flagenv=debug cargo run --example flagenv_demo -- echo`         |
//!
//! Flags belong to the top-level command, so they go before the subcommand.

mod config;

use clap::Command;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use flagenv::{Bindings, Flagenv, FlagenvError, SettingEntry};

use config::DemoConfig;

fn base_command() -> Command {
    Command::new("flagenv-demo")
        .about("flagenv demo: a sample CLI app for showcasing flagenv integration")
        .subcommand(Command::new("echo").about("Print resolved configuration values"))
        .subcommand(Command::new("sources").about("Show which layer every value came from"))
}

const RESET: &str = "\x1b[0m";

/// ANSI code for the `--color` values; anything else prints uncolored.
fn ansi_color_code(name: &str) -> &str {
    match name {
        "red" => "\x1b[31m",
        "green" => "\x1b[32m",
        "yellow" => "\x1b[33m",
        _ => RESET,
    }
}

fn echo_all(config: &DemoConfig) {
    let color = ansi_color_code(&config.display.color);

    if config.verbose {
        println!(
            "{color}[verbose] Resolved configuration for {:?}{RESET}",
            config.name
        );
        println!();
    }

    let mut labels: Vec<String> = config
        .labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    labels.sort();

    let entries = [
        ("name", config.name.clone()),
        ("verbose", config.verbose.to_string()),
        ("timeout", format!("{:?}", config.timeout)),
        ("tags", config.tags.join(",")),
        ("labels", labels.join(",")),
        ("log_level", config.log_level.to_string()),
        ("server.host", config.server.host.clone()),
        ("server.port", config.server.port.to_string()),
        (
            "server.max_connections",
            config.server.max_connections.to_string(),
        ),
        ("display.color", config.display.color.clone()),
    ];

    let max_key_len = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &entries {
        println!("{color}{key:<max_key_len$}{RESET}  {value}");
    }
}

/// TOML projection of the settings sources.
#[derive(Serialize)]
struct Listing {
    setting: Vec<SettingEntry>,
}

fn print_sources(bindings: &Bindings) {
    let listing = Listing {
        setting: bindings.sources(),
    };
    match toml::to_string(&listing) {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("Failed to render sources:\n{e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut config = DemoConfig::default();
    let bindings = Flagenv::builder()
        .base_command(base_command())
        .load(&mut config)
        .unwrap_or_else(|e| {
            if let FlagenvError::Cli(err) = &e {
                err.exit();
            }
            eprintln!("Failed to load config:\n{e}");
            std::process::exit(1);
        });

    match bindings.matches.subcommand_name() {
        Some("sources") => print_sources(&bindings),
        _ => echo_all(&config),
    }
}

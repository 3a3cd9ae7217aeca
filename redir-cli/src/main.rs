//! # Redir CLI
//!
//! Operator tooling for the PID/IRI redirect engine, promoting the
//! config-directory smoke checks an operator would otherwise run by hand
//! into two subcommands:
//!
//! - `validate`: load a config directory, report load errors, and flag any
//!   rule whose `!name` destination reference doesn't resolve in `[dests]`,
//!   without starting a server
//! - `dump`: load a config directory and print every resolved host, rule
//!   count, and destination, for inspecting what a directory actually
//!   produces

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use redir_core::config::ConfigLoader;
use redir_core::destinations::DestinationResolver;
use redir_core::model::{RuleEntry, Target};

#[derive(Parser)]
#[command(name = "redir-cli", version, about = "Operator tooling for the redirect engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a config directory and report whether it parses cleanly.
    Validate {
        #[arg(long = "config-dir", default_value = "./config")]
        config_dir: PathBuf,
    },
    /// Load a config directory and print its resolved shape.
    Dump {
        #[arg(long = "config-dir", default_value = "./config")]
        config_dir: PathBuf,
    },
}

type Destinations = HashMap<String, Arc<dyn DestinationResolver>>;

/// `to` begins with `!name` to name a destination rather than a literal
/// URL (§3, §9 `Target`). Record any reference to a name missing from
/// `destinations` as a dangling-reference diagnostic.
fn check_entry(host: &str, key: &str, entry: &RuleEntry, destinations: &Destinations, dangling: &mut Vec<String>) {
    if let Target::DestRef(name) = Target::parse(&entry.to) {
        if !destinations.contains_key(&name) {
            dangling.push(format!(
                "host \"{}\": rule \"{}\" references undefined destination \"{}\"",
                host, key, name
            ));
        }
    }
}

fn check_table(host: &str, table: &HashMap<String, RuleEntry>, destinations: &Destinations, dangling: &mut Vec<String>) {
    for (key, entry) in table {
        check_entry(host, key, entry, destinations, dangling);
    }
}

fn check_conditional_table(
    host: &str,
    table: &HashMap<String, Vec<RuleEntry>>,
    destinations: &Destinations,
    dangling: &mut Vec<String>,
) {
    for (key, entries) in table {
        for entry in entries {
            check_entry(host, key, entry, destinations, dangling);
        }
    }
}

fn main() -> Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    env_logger::init();

    let cli = Cli::parse();
    let mut loader = ConfigLoader::new();

    match cli.command {
        Command::Validate { config_dir } => {
            let (defs, destinations) = loader
                .load_dir(&config_dir, true)?
                .expect("force=true always returns Some");

            let mut dangling = Vec::new();
            for (host, table) in &defs {
                let label = if host.is_empty() { "<default>" } else { host.as_str() };
                check_table(label, &table.redirects, &destinations, &mut dangling);
                check_table(label, &table.rewrites, &destinations, &mut dangling);
                check_conditional_table(label, &table.conditional_redirects, &destinations, &mut dangling);
                check_conditional_table(label, &table.conditional_rewrites, &destinations, &mut dangling);
            }

            if dangling.is_empty() {
                println!(
                    "OK: {} host(s), {} destination(s) loaded from {}",
                    defs.len(),
                    destinations.len(),
                    config_dir.display()
                );
            } else {
                dangling.sort();
                for msg in &dangling {
                    eprintln!("error: {}", msg);
                }
                anyhow::bail!(
                    "{} dangling destination reference(s) in {}",
                    dangling.len(),
                    config_dir.display()
                );
            }
        }
        Command::Dump { config_dir } => {
            let (defs, destinations) = loader
                .load_dir(&config_dir, true)?
                .expect("force=true always returns Some");

            let mut hosts: Vec<&String> = defs.keys().collect();
            hosts.sort();
            for host in hosts {
                let table = &defs[host];
                let label = if host.is_empty() { "<default>" } else { host.as_str() };
                println!(
                    "host {}: {} redirect(s), {} rewrite(s), {} conditional redirect key(s), {} conditional rewrite key(s)",
                    label,
                    table.redirects.len(),
                    table.rewrites.len(),
                    table.conditional_redirects.len(),
                    table.conditional_rewrites.len(),
                );
            }
            let mut dests: Vec<&String> = destinations.keys().collect();
            dests.sort();
            for name in dests {
                println!("destination {}", name);
            }
        }
    }

    Ok(())
}

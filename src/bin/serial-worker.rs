// src/bin/serial-worker.rs
use clap::{Arg, Command};
use std::process;
use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod commands;
use commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let app = Command::new("serial-worker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Run shell jobs in order, confirming each one before the next")
        .subcommand(
            Command::new("run")
                .about("Run a job plan until every job is confirmed")
                .arg(Arg::new("plan")
                    .help("Path to the JSON job plan")
                    .value_name("PLAN")
                    .required(true))
                .arg(Arg::new("attempts")
                    .short('a')
                    .long("attempts")
                    .value_name("NUMBER")
                    .help("Failed confirmations allowed across the whole run")
                    .value_parser(clap::value_parser!(u32).range(1..)))
                .arg(Arg::new("json-events")
                    .long("json-events")
                    .help("Print every worker event as a JSON line on stdout")
                    .action(clap::ArgAction::SetTrue))
        )
        .subcommand(
            Command::new("list")
                .about("List the jobs of a plan")
                .arg(Arg::new("plan")
                    .help("Path to the JSON job plan")
                    .value_name("PLAN")
                    .required(true))
                .arg(Arg::new("json")
                    .long("json")
                    .help("Print the queue as JSON")
                    .action(clap::ArgAction::SetTrue))
        )
        .subcommand(
            Command::new("status")
                .about("Probe every job once and report the furthest one done")
                .arg(Arg::new("plan")
                    .help("Path to the JSON job plan")
                    .value_name("PLAN")
                    .required(true))
        );

    let matches = app.get_matches();

    match matches.subcommand() {
        Some(("run", sub_matches)) => run_command(sub_matches).await,
        Some(("list", sub_matches)) => list_command(sub_matches).await,
        Some(("status", sub_matches)) => status_command(sub_matches).await,
        _ => {
            println!("No command specified. Use --help for usage information.");
            process::exit(1);
        }
    }
}

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use lookthrough_engine::PropagationEngine;
use lookthrough_model::{FundId, Scope};
use lookthrough_store::MemoryStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Command::new("lookthrough")
        .version(lookthrough_engine::VERSION)
        .about("Look-through ESG metric propagation")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("propagate")
                .about("Run one propagation pass over a dataset")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .help("Path to a JSON dataset of funds, companies, and projects"),
                )
                .arg(
                    Arg::new("fund")
                        .long("fund")
                        .help("Restrict the run to one fund's subtree"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Emit the run report as JSON"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("propagate", args)) => {
            let input = args.get_one::<String>("input").expect("required arg");
            let scope = args
                .get_one::<String>("fund")
                .map_or(Scope::All, |id| Scope::Fund(FundId::new(id.as_str())));
            let as_json = args.get_flag("json");

            let raw = std::fs::read_to_string(input)
                .with_context(|| format!("reading dataset {input}"))?;
            let store = Arc::new(
                MemoryStore::from_json_str(&raw)
                    .with_context(|| format!("parsing dataset {input}"))?,
            );

            let engine = PropagationEngine::new(store);
            let report = engine.propagate(&scope).await?;

            if as_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report.generate_text());
            }
            std::process::exit(i32::from(!report.passed()));
        }
        _ => unreachable!("arg_required_else_help"),
    }
}

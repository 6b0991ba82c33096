mod bootstrap_helpers;
mod cli_args;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use keystone_access::load_keystone_access_policy;
use keystone_ledger::{load_keystone_state_or_default, render_keystone_state_report};
use keystone_runtime::{
    run_keystone_runtime, FileKeystoneStateStore, KeystoneRuntimeConfig, KeystoneStateStore,
};
use tokio::io::BufReader;

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::{Cli, CliCommand, CliInspectArgs, CliRunArgs};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}

async fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        CliCommand::Run(args) => run_service(args).await,
        CliCommand::Inspect(args) => inspect_state(&args),
    }
}

async fn run_service(args: CliRunArgs) -> Result<()> {
    let policy = load_keystone_access_policy(&args.access_policy)?
        .with_additional_owners(&args.owner_user_id);
    let config = KeystoneRuntimeConfig {
        state_path: args.state_path,
        command_prefix: args.command_prefix,
        transport: args.transport.into(),
        bot_user_id: args.bot_user_id,
        save_interval: Duration::from_secs(args.save_interval_seconds),
    };
    tracing::info!(
        state_path = %config.state_path.display(),
        transport = config.transport.as_str(),
        "starting keystone runtime"
    );
    let report = run_keystone_runtime(
        config,
        &policy,
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
    )
    .await
    .context("keystone runtime failed")?;
    tracing::info!(
        processed = report.processed_events,
        malformed = report.malformed_events,
        replies = report.replies_sent,
        saves = report.saves,
        save_failures = report.save_failures,
        "keystone runtime stopped"
    );
    Ok(())
}

fn inspect_state(args: &CliInspectArgs) -> Result<()> {
    let store = FileKeystoneStateStore::new(args.state_path.clone());
    let blob = store.load_blob()?;
    let state = load_keystone_state_or_default(blob.as_deref());
    println!(
        "{}",
        render_keystone_state_report(&state, args.channel.as_deref())
    );
    Ok(())
}

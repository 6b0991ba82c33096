use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use keystone_runtime::KeystoneTransport;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliKeystoneTransport {
    Discord,
    Slack,
    Telegram,
    Console,
}

impl From<CliKeystoneTransport> for KeystoneTransport {
    fn from(value: CliKeystoneTransport) -> Self {
        match value {
            CliKeystoneTransport::Discord => KeystoneTransport::Discord,
            CliKeystoneTransport::Slack => KeystoneTransport::Slack,
            CliKeystoneTransport::Telegram => KeystoneTransport::Telegram,
            CliKeystoneTransport::Console => KeystoneTransport::Console,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "keystone",
    about = "Weekly mythic keystone tracker for chat channels",
    version
)]
/// Public struct `Cli` used across keystone components.
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Serve keystone commands from NDJSON events on stdin.
    Run(CliRunArgs),
    /// Print tracked channels from a saved state file.
    Inspect(CliInspectArgs),
}

#[derive(Debug, Args)]
pub struct CliRunArgs {
    #[arg(
        long = "state-path",
        env = "KEYSTONE_STATE_PATH",
        default_value = ".keystone/state.json",
        help = "Path of the persisted keystone state file"
    )]
    pub state_path: PathBuf,

    #[arg(
        long = "access-policy",
        env = "KEYSTONE_ACCESS_POLICY",
        default_value = ".keystone/access-policy.json",
        help = "Owner/moderator policy file. A missing file grants nobody admin commands"
    )]
    pub access_policy: PathBuf,

    #[arg(
        long = "owner-user-id",
        env = "KEYSTONE_OWNER_USER_ID",
        value_delimiter = ',',
        help = "Bot owner user ids merged into the access policy"
    )]
    pub owner_user_id: Vec<String>,

    #[arg(
        long = "command-prefix",
        env = "KEYSTONE_COMMAND_PREFIX",
        default_value = "!",
        help = "Prefix that marks a chat message as a keystone command"
    )]
    pub command_prefix: String,

    #[arg(
        long,
        env = "KEYSTONE_TRANSPORT",
        value_enum,
        default_value_t = CliKeystoneTransport::Discord,
        help = "Chat transport the events come from. Only discord renders monospace usage examples"
    )]
    pub transport: CliKeystoneTransport,

    #[arg(
        long = "bot-user-id",
        env = "KEYSTONE_BOT_USER_ID",
        help = "User id of the bot itself; its own messages are ignored"
    )]
    pub bot_user_id: Option<String>,

    #[arg(
        long = "save-interval-seconds",
        env = "KEYSTONE_SAVE_INTERVAL_SECONDS",
        default_value_t = 60,
        value_parser = parse_positive_u64,
        help = "Seconds between periodic state saves"
    )]
    pub save_interval_seconds: u64,
}

#[derive(Debug, Args)]
pub struct CliInspectArgs {
    #[arg(
        long = "state-path",
        env = "KEYSTONE_STATE_PATH",
        default_value = ".keystone/state.json",
        help = "Path of the persisted keystone state file"
    )]
    pub state_path: PathBuf,

    #[arg(long, help = "Only print this channel")]
    pub channel: Option<String>,
}

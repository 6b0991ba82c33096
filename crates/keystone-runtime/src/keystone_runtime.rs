//! NDJSON live transport and the keystone service loop.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use keystone_access::KeystonePermissions;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::MissedTickBehavior;

use crate::keystone_contract::{
    parse_keystone_inbound_event, KeystoneOutboundMessage, KeystoneTransport,
};
use crate::keystone_dispatch::KeystonePlugin;
use crate::keystone_services::{KeystoneMessenger, KeystoneServices, StaticCommandPrefix};
use crate::keystone_state_store::{FileKeystoneStateStore, KeystoneStateStore};

/// Messenger that writes each reply as one `KeystoneOutboundMessage` JSON line.
pub struct NdjsonKeystoneMessenger<W: Write + Send> {
    transport: KeystoneTransport,
    bot_user_id: Option<String>,
    writer: Mutex<W>,
}

impl<W: Write + Send> NdjsonKeystoneMessenger<W> {
    pub fn new(transport: KeystoneTransport, bot_user_id: Option<String>, writer: W) -> Self {
        Self {
            transport,
            bot_user_id: bot_user_id.filter(|id| !id.trim().is_empty()),
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> KeystoneMessenger for NdjsonKeystoneMessenger<W> {
    fn transport(&self) -> KeystoneTransport {
        self.transport
    }

    fn is_self(&self, actor_id: &str) -> bool {
        self.bot_user_id
            .as_deref()
            .is_some_and(|bot_user_id| bot_user_id == actor_id.trim())
    }

    fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        let message = KeystoneOutboundMessage::new(self.transport, channel_id, text);
        let line =
            serde_json::to_string(&message).context("failed to serialize outbound message")?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}").context("failed to write outbound message")?;
        writer.flush().context("failed to flush outbound message")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Public struct `KeystoneRuntimeConfig` used across keystone components.
pub struct KeystoneRuntimeConfig {
    pub state_path: PathBuf,
    pub command_prefix: String,
    pub transport: KeystoneTransport,
    pub bot_user_id: Option<String>,
    pub save_interval: Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Counters for one service-loop run.
pub struct KeystoneRuntimeReport {
    pub processed_events: usize,
    pub malformed_events: usize,
    pub replies_sent: usize,
    pub saves: usize,
    pub save_failures: usize,
}

/// Serves keystone commands from NDJSON `input` until end of input or ctrl-c,
/// persisting to the file at `config.state_path`.
pub async fn run_keystone_runtime<R, W>(
    config: KeystoneRuntimeConfig,
    permissions: &dyn KeystonePermissions,
    input: R,
    output: W,
) -> Result<KeystoneRuntimeReport>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let store = FileKeystoneStateStore::new(config.state_path.clone());
    serve_keystone_events(&config, &store, permissions, input, output).await
}

/// Service loop over an arbitrary state store.
///
/// State is saved every `save_interval` and once more before returning. Save
/// failures are logged and counted, never fatal.
pub async fn serve_keystone_events<R, W>(
    config: &KeystoneRuntimeConfig,
    store: &dyn KeystoneStateStore,
    permissions: &dyn KeystonePermissions,
    input: R,
    output: W,
) -> Result<KeystoneRuntimeReport>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let plugin = KeystonePlugin::load(store)?;
    let messenger =
        NdjsonKeystoneMessenger::new(config.transport, config.bot_user_id.clone(), output);
    let command_prefix = StaticCommandPrefix::new(config.command_prefix.clone());
    let services = KeystoneServices {
        messenger: &messenger,
        permissions,
        command_prefix: &command_prefix,
    };

    let mut report = KeystoneRuntimeReport::default();
    let mut lines = input.lines();
    let mut save_tick = tokio::time::interval(config.save_interval);
    save_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    save_tick.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut shutdown_armed = true;

    loop {
        tokio::select! {
            result = &mut shutdown, if shutdown_armed => {
                match result {
                    Ok(()) => {
                        tracing::info!("keystone runtime shutdown requested");
                        break;
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "failed to listen for ctrl-c");
                        shutdown_armed = false;
                    }
                }
            }
            _ = save_tick.tick() => {
                save_plugin_state(&plugin, store, config, &mut report);
            }
            line = lines.next_line() => {
                let Some(raw) = line.context("failed to read inbound keystone event")? else {
                    tracing::info!("keystone inbound stream closed");
                    break;
                };
                handle_inbound_line(&plugin, &services, &raw, &mut report);
            }
        }
    }

    save_plugin_state(&plugin, store, config, &mut report);
    Ok(report)
}

fn handle_inbound_line(
    plugin: &KeystonePlugin,
    services: &KeystoneServices<'_>,
    raw: &str,
    report: &mut KeystoneRuntimeReport,
) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let event = match parse_keystone_inbound_event(trimmed) {
        Ok(event) => event,
        Err(error) => {
            report.malformed_events += 1;
            tracing::warn!(error = %format!("{error:#}"), "skipping malformed keystone event");
            return;
        }
    };
    report.processed_events += 1;
    report.replies_sent += plugin.handle_message(&event, services, Utc::now());
}

fn save_plugin_state(
    plugin: &KeystonePlugin,
    store: &dyn KeystoneStateStore,
    config: &KeystoneRuntimeConfig,
    report: &mut KeystoneRuntimeReport,
) {
    match plugin.save(store) {
        Ok(()) => {
            report.saves += 1;
            tracing::info!(path = %config.state_path.display(), "saved keystone state");
        }
        Err(error) => {
            report.save_failures += 1;
            tracing::error!(
                path = %config.state_path.display(),
                error = %format!("{error:#}"),
                "failed to save keystone state"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::{bail, Result};
    use keystone_access::KeystoneAccessPolicy;
    use keystone_ledger::{decode_keystone_state, ActivityId};

    use super::{
        run_keystone_runtime, serve_keystone_events, KeystoneRuntimeConfig,
        KeystoneRuntimeReport, NdjsonKeystoneMessenger,
    };
    use crate::keystone_contract::{KeystoneOutboundMessage, KeystoneTransport};
    use crate::keystone_services::KeystoneMessenger;
    use crate::keystone_state_store::KeystoneStateStore;

    fn config(state_path: std::path::PathBuf) -> KeystoneRuntimeConfig {
        KeystoneRuntimeConfig {
            state_path,
            command_prefix: "!".to_string(),
            transport: KeystoneTransport::Discord,
            bot_user_id: Some("bot-0".to_string()),
            save_interval: Duration::from_secs(60),
        }
    }

    fn event_line(actor_id: &str, text: &str) -> String {
        serde_json::json!({
            "schema_version": 1,
            "transport": "discord",
            "channel_id": "chan-1",
            "actor_id": actor_id,
            "actor_display": format!("{actor_id}-name"),
            "text": text,
        })
        .to_string()
    }

    fn outbound_texts(output: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| {
                serde_json::from_str::<KeystoneOutboundMessage>(line)
                    .expect("outbound json")
                    .text
            })
            .collect()
    }

    #[test]
    fn unit_ndjson_messenger_writes_one_line_per_reply() {
        let messenger =
            NdjsonKeystoneMessenger::new(KeystoneTransport::Slack, Some(" ".to_string()), Vec::new());
        assert!(!messenger.is_self(" "));
        assert!(!messenger.supports_monospace());
        messenger.send_message("chan-1", "first").expect("send");
        messenger.send_message("chan-2", "second\nline").expect("send");
        let output = String::from_utf8(messenger.into_inner()).expect("utf8");
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains(r#""text":"second\nline""#));
    }

    #[tokio::test]
    async fn integration_runtime_serves_commands_and_saves_on_end_of_input() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state_path = temp.path().join("state/state.json");
        let policy = KeystoneAccessPolicy::default().with_additional_owners(["owner-1"]);
        let input = [
            event_line("owner-1", "!start"),
            String::new(),
            "{not json".to_string(),
            event_line("user-7", "!set hoa 5 teeming"),
            event_line("bot-0", "!set pf 9"),
            event_line("user-7", "just chatting"),
        ]
        .join("\n");
        let mut output = Vec::new();

        let report = run_keystone_runtime(
            config(state_path.clone()),
            &policy,
            input.as_bytes(),
            &mut output,
        )
        .await
        .expect("runtime");

        assert_eq!(
            report,
            KeystoneRuntimeReport {
                processed_events: 4,
                malformed_events: 1,
                replies_sent: 3,
                saves: 1,
                save_failures: 0,
            }
        );
        assert_eq!(
            outbound_texts(&output),
            vec![
                "This channel is now tracking mythic keystones.".to_string(),
                "Keystone set.".to_string(),
                "Level 5 **Halls of Atonement** *(teeming)* - user-7-name".to_string(),
            ]
        );

        let saved = decode_keystone_state(&std::fs::read(&state_path).expect("state file"))
            .expect("decode");
        let ledger = saved.channel("chan-1").expect("ledger");
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(
            ledger.record("user-7").expect("record").activity,
            ActivityId::Hoa
        );
    }

    #[tokio::test]
    async fn functional_runtime_resumes_from_saved_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state_path = temp.path().join("state.json");
        let policy = KeystoneAccessPolicy::default().with_additional_owners(["owner-1"]);

        let first = [
            event_line("owner-1", "!start"),
            event_line("user-7", "!set fh 4"),
        ]
        .join("\n");
        run_keystone_runtime(
            config(state_path.clone()),
            &policy,
            first.as_bytes(),
            Vec::new(),
        )
        .await
        .expect("first run");

        let mut output = Vec::new();
        let second = event_line("user-7", "!list");
        run_keystone_runtime(config(state_path), &policy, second.as_bytes(), &mut output)
            .await
            .expect("second run");
        assert_eq!(
            outbound_texts(&output),
            vec!["Level 4 **Freehold** - user-7-name".to_string()]
        );
    }

    struct ReadOnlyStateStore;

    impl KeystoneStateStore for ReadOnlyStateStore {
        fn load_blob(&self) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn save_blob(&self, _payload: &[u8]) -> Result<()> {
            bail!("state volume is read-only")
        }
    }

    #[tokio::test]
    async fn regression_runtime_counts_save_failures_without_aborting() {
        let policy = KeystoneAccessPolicy::default().with_additional_owners(["owner-1"]);
        let mut output = Vec::new();
        let input = event_line("owner-1", "!start");
        let report = serve_keystone_events(
            &config(std::path::PathBuf::from("read-only/state.json")),
            &ReadOnlyStateStore,
            &policy,
            input.as_bytes(),
            &mut output,
        )
        .await
        .expect("runtime");
        assert_eq!(report.processed_events, 1);
        assert_eq!(report.saves, 0);
        assert_eq!(report.save_failures, 1);
        assert_eq!(
            outbound_texts(&output),
            vec!["This channel is now tracking mythic keystones.".to_string()]
        );
    }

    #[tokio::test]
    async fn regression_runtime_refuses_to_start_on_unreadable_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").expect("write blocker");
        let policy = KeystoneAccessPolicy::default();
        let error = run_keystone_runtime(
            config(blocker.join("state.json")),
            &policy,
            &b""[..],
            Vec::new(),
        )
        .await
        .expect_err("unreadable state path");
        assert!(format!("{error:#}").contains("failed to read keystone state"));
    }
}

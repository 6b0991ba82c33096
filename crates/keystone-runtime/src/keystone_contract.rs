//! Keystone live transport contract.
//!
//! Inbound chat events and outbound replies travel as one JSON object per
//! line. Validation keeps the dispatcher from ever seeing an event without a
//! channel or an author.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const KEYSTONE_CONTRACT_SCHEMA_VERSION: u32 = 1;

fn keystone_contract_schema_version() -> u32 {
    KEYSTONE_CONTRACT_SCHEMA_VERSION
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
/// Enumerates supported `KeystoneTransport` values.
pub enum KeystoneTransport {
    #[default]
    Discord,
    Slack,
    Telegram,
    Console,
}

impl KeystoneTransport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Slack => "slack",
            Self::Telegram => "telegram",
            Self::Console => "console",
        }
    }

    /// Only Discord renders backtick-delimited monospace in replies.
    pub fn supports_monospace(self) -> bool {
        matches!(self, Self::Discord)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `KeystoneInboundEvent` used across keystone components.
pub struct KeystoneInboundEvent {
    #[serde(default = "keystone_contract_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub transport: KeystoneTransport,
    #[serde(default)]
    pub event_id: String,
    pub channel_id: String,
    pub actor_id: String,
    #[serde(default)]
    pub actor_display: String,
    #[serde(default)]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub text: String,
}

impl KeystoneInboundEvent {
    /// Display name for listings; falls back to the actor id.
    pub fn display_name(&self) -> &str {
        let display = self.actor_display.trim();
        if display.is_empty() {
            self.actor_id.trim()
        } else {
            display
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `KeystoneOutboundMessage` used across keystone components.
pub struct KeystoneOutboundMessage {
    pub schema_version: u32,
    pub transport: KeystoneTransport,
    pub channel_id: String,
    pub text: String,
}

impl KeystoneOutboundMessage {
    pub fn new(transport: KeystoneTransport, channel_id: &str, text: &str) -> Self {
        Self {
            schema_version: KEYSTONE_CONTRACT_SCHEMA_VERSION,
            transport,
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        }
    }
}

pub fn parse_keystone_inbound_event(raw: &str) -> Result<KeystoneInboundEvent> {
    let event = serde_json::from_str::<KeystoneInboundEvent>(raw)
        .context("failed to parse inbound keystone event")?;
    validate_keystone_inbound_event(&event)?;
    Ok(event)
}

pub fn validate_keystone_inbound_event(event: &KeystoneInboundEvent) -> Result<()> {
    if event.schema_version != KEYSTONE_CONTRACT_SCHEMA_VERSION {
        bail!(
            "inbound keystone event has unsupported schema_version {} (expected {})",
            event.schema_version,
            KEYSTONE_CONTRACT_SCHEMA_VERSION
        );
    }
    if event.channel_id.trim().is_empty() {
        bail!("inbound keystone event has empty channel_id");
    }
    if event.actor_id.trim().is_empty() {
        bail!("inbound keystone event has empty actor_id");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{parse_keystone_inbound_event, KeystoneOutboundMessage, KeystoneTransport};

    #[test]
    fn unit_parse_inbound_event_applies_defaults() {
        let event = parse_keystone_inbound_event(
            r#"{"channel_id":"chan-1","actor_id":"u1","text":"!list"}"#,
        )
        .expect("parse");
        assert_eq!(event.schema_version, 1);
        assert_eq!(event.transport, KeystoneTransport::Discord);
        assert_eq!(event.display_name(), "u1");
        assert_eq!(event.text, "!list");
    }

    #[test]
    fn regression_parse_inbound_event_rejects_missing_author_and_schema_drift() {
        let error = parse_keystone_inbound_event(
            r#"{"channel_id":"chan-1","actor_id":"  ","text":"!list"}"#,
        )
        .expect_err("blank actor");
        assert!(error.to_string().contains("empty actor_id"));

        let error = parse_keystone_inbound_event(
            r#"{"schema_version":2,"channel_id":"chan-1","actor_id":"u1"}"#,
        )
        .expect_err("schema");
        assert!(error.to_string().contains("unsupported schema_version 2"));

        assert!(parse_keystone_inbound_event("not json").is_err());
    }

    #[test]
    fn unit_only_discord_supports_monospace() {
        assert!(KeystoneTransport::Discord.supports_monospace());
        assert!(!KeystoneTransport::Slack.supports_monospace());
        assert!(!KeystoneTransport::Console.supports_monospace());
        let message = KeystoneOutboundMessage::new(KeystoneTransport::Telegram, "chan-1", "hi");
        let encoded = serde_json::to_string(&message).expect("encode");
        assert_eq!(
            encoded,
            r#"{"schema_version":1,"transport":"telegram","channel_id":"chan-1","text":"hi"}"#
        );
    }
}

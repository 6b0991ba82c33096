//! Whole-plugin keystone state and its persisted JSON snapshot.
//!
//! The snapshot mirrors the in-memory model: channel id to ledger, ledger to
//! records keyed by identity key. A `schema_version` tag guards future
//! changes to the layout.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keystone_ledger::ChannelLedger;

pub const KEYSTONE_STATE_SCHEMA_VERSION: u32 = 1;

fn keystone_state_schema_version() -> u32 {
    KEYSTONE_STATE_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Every tracking channel's ledger, keyed by channel id.
pub struct KeystonePluginState {
    #[serde(default = "keystone_state_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelLedger>,
}

impl Default for KeystonePluginState {
    fn default() -> Self {
        Self {
            schema_version: KEYSTONE_STATE_SCHEMA_VERSION,
            channels: BTreeMap::new(),
        }
    }
}

impl KeystonePluginState {
    pub fn is_tracking(&self, channel_id: &str) -> bool {
        self.channels.contains_key(channel_id)
    }

    pub fn channel(&self, channel_id: &str) -> Option<&ChannelLedger> {
        self.channels.get(channel_id)
    }

    pub fn channel_mut(&mut self, channel_id: &str) -> Option<&mut ChannelLedger> {
        self.channels.get_mut(channel_id)
    }

    /// Starts tracking `channel_id`. An existing ledger is kept as is; returns
    /// true only when a new ledger was created.
    pub fn start_channel(&mut self, channel_id: &str, now: DateTime<Utc>) -> bool {
        if self.channels.contains_key(channel_id) {
            return false;
        }
        self.channels
            .insert(channel_id.to_string(), ChannelLedger::new(now));
        true
    }

    pub fn stop_channel(&mut self, channel_id: &str) -> bool {
        self.channels.remove(channel_id).is_some()
    }
}

pub fn encode_keystone_state(state: &KeystonePluginState) -> Result<Vec<u8>> {
    let mut payload =
        serde_json::to_vec_pretty(state).context("failed to serialize keystone state")?;
    payload.push(b'\n');
    Ok(payload)
}

pub fn decode_keystone_state(raw: &[u8]) -> Result<KeystonePluginState> {
    let state = serde_json::from_slice::<KeystonePluginState>(raw)
        .context("failed to parse keystone state")?;
    if state.schema_version != KEYSTONE_STATE_SCHEMA_VERSION {
        bail!(
            "unsupported keystone state schema: expected {}, found {}",
            KEYSTONE_STATE_SCHEMA_VERSION,
            state.schema_version
        );
    }
    for channel_id in state.channels.keys() {
        if channel_id.trim().is_empty() {
            bail!("keystone state channel id must not be empty");
        }
    }
    Ok(state)
}

/// Decodes a stored blob, falling back to empty state when it is missing or
/// unreadable. A bad blob is logged, never fatal.
pub fn load_keystone_state_or_default(raw: Option<&[u8]>) -> KeystonePluginState {
    let Some(raw) = raw else {
        return KeystonePluginState::default();
    };
    match decode_keystone_state(raw) {
        Ok(state) => state,
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "discarding unreadable keystone state");
            KeystonePluginState::default()
        }
    }
}

/// Operator-facing dump of tracked channels, optionally limited to one channel.
pub fn render_keystone_state_report(
    state: &KeystonePluginState,
    channel_filter: Option<&str>,
) -> String {
    let sections = state
        .channels
        .iter()
        .filter(|(channel_id, _)| {
            channel_filter.map_or(true, |filter| filter == channel_id.as_str())
        })
        .map(|(channel_id, ledger)| {
            format!(
                "channel={} region={} records={} last_modified={}\n{}",
                channel_id,
                ledger.region().as_str(),
                ledger.records().len(),
                ledger.last_modified().to_rfc3339(),
                ledger.render_listing()
            )
        })
        .collect::<Vec<_>>();
    if sections.is_empty() {
        return "no channels are tracking keystones".to_string();
    }
    sections.join("\n\n")
}

//! Keystone command dispatch over the lock-guarded plugin state.
//!
//! One `RwLock` protects the whole `KeystonePluginState`. Commands take the
//! write lock for the duration of a single message; saves encode a snapshot
//! under the read lock so they never interleave with a structural change.
//! Replies are collected while the lock is held and sent after it is
//! released.

use std::sync::{PoisonError, RwLock};

use anyhow::Result;
use chrono::{DateTime, Utc};
use keystone_access::authorize_channel_admin;
use keystone_ledger::{
    encode_keystone_state, keystone_identity_key, load_keystone_state_or_default,
    KeystoneParseError, KeystonePluginState, KeystoneRegion,
};
use thiserror::Error;

use crate::keystone_commands::{parse_keystone_command, KeystoneCommand, KeystoneRecordAction};
use crate::keystone_contract::KeystoneInboundEvent;
use crate::keystone_render::{
    render_invalid_alt, render_invalid_keystone, render_keystone_help, render_region_changed,
    KEYSTONE_DEPLETED_MESSAGE, KEYSTONE_SET_MESSAGE, KEYSTONE_UNDEPLETED_MESSAGE,
    KEYSTONE_UNSET_MESSAGE, NO_RECORD_MESSAGE, REGION_DENIED_MESSAGE, START_STOP_DENIED_MESSAGE,
    TRACKING_STARTED_MESSAGE, TRACKING_STOPPED_MESSAGE,
};
use crate::keystone_services::KeystoneServices;
use crate::keystone_state_store::KeystoneStateStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `KeystoneAdminCommand` values.
pub enum KeystoneAdminCommand {
    Start,
    Stop,
    Region,
}

impl KeystoneAdminCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Region => "region",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `KeystoneCommandError` values.
pub enum KeystoneCommandError {
    #[error("caller may not run '{}' in this channel", .command.as_str())]
    PermissionDenied { command: KeystoneAdminCommand },
    #[error("channel is not tracking keystones")]
    NotTracking,
    #[error("caller has no keystone recorded this week")]
    NoRecordForUser,
    #[error("invalid keystone: {0}")]
    InvalidKeystone(#[from] KeystoneParseError),
    #[error("invalid alt command")]
    InvalidAlt,
}

impl KeystoneCommandError {
    /// Chat reply for this error; `None` means the message is ignored silently.
    pub fn user_reply(&self, ticks: &str, prefix: &str) -> Option<String> {
        match self {
            Self::PermissionDenied {
                command: KeystoneAdminCommand::Start | KeystoneAdminCommand::Stop,
            } => Some(START_STOP_DENIED_MESSAGE.to_string()),
            Self::PermissionDenied {
                command: KeystoneAdminCommand::Region,
            } => Some(REGION_DENIED_MESSAGE.to_string()),
            Self::NotTracking => None,
            Self::NoRecordForUser => Some(NO_RECORD_MESSAGE.to_string()),
            Self::InvalidKeystone(_) => Some(render_invalid_keystone(ticks, prefix)),
            Self::InvalidAlt => Some(render_invalid_alt(ticks, prefix)),
        }
    }
}

#[derive(Debug, Default)]
/// Shared keystone plugin: every tracking channel's ledger behind one lock.
pub struct KeystonePlugin {
    state: RwLock<KeystonePluginState>,
}

impl KeystonePlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: KeystonePluginState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Loads state from `store`. A blob that cannot be decoded yields empty
    /// state; only a failing store read is an error.
    pub fn load(store: &dyn KeystoneStateStore) -> Result<Self> {
        let blob = store.load_blob()?;
        let state = load_keystone_state_or_default(blob.as_deref());
        tracing::info!(
            channels = state.channels.len(),
            "loaded keystone plugin state"
        );
        Ok(Self::from_state(state))
    }

    /// Serializes a consistent snapshot and hands it to `store`.
    pub fn save(&self, store: &dyn KeystoneStateStore) -> Result<()> {
        let payload = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            encode_keystone_state(&state)?
        };
        store.save_blob(&payload)
    }

    pub fn snapshot(&self) -> KeystonePluginState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs one inbound message and returns the replies to send, in order.
    pub fn dispatch(
        &self,
        event: &KeystoneInboundEvent,
        services: &KeystoneServices<'_>,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        if services.messenger.is_self(&event.actor_id) {
            tracing::debug!(channel_id = %event.channel_id, "ignoring message authored by the bot");
            return Vec::new();
        }
        let prefix = services.command_prefix.command_prefix();
        let Some(command) = parse_keystone_command(&event.text, &prefix) else {
            tracing::debug!(channel_id = %event.channel_id, "message is not a keystone command");
            return Vec::new();
        };
        let ticks = services.monospace_ticks();

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(ledger) = state.channel_mut(&event.channel_id) {
            if ledger.check_and_maybe_reset(now) {
                tracing::info!(
                    channel_id = %event.channel_id,
                    region = ledger.region().as_str(),
                    "cleared keystones after weekly reset"
                );
            }
        }

        match execute_keystone_command(&mut state, event, &command, services, ticks, &prefix, now) {
            Ok(replies) => replies,
            Err(error) => {
                tracing::debug!(
                    channel_id = %event.channel_id,
                    user_id = %event.actor_id,
                    command = command.as_str(),
                    error = %error,
                    "keystone command rejected"
                );
                error.user_reply(ticks, &prefix).into_iter().collect()
            }
        }
    }

    /// Dispatches `event` and sends every reply through the messenger.
    /// Returns the number of replies delivered.
    pub fn handle_message(
        &self,
        event: &KeystoneInboundEvent,
        services: &KeystoneServices<'_>,
        now: DateTime<Utc>,
    ) -> usize {
        let replies = self.dispatch(event, services, now);
        let mut delivered = 0;
        for reply in replies {
            match services.messenger.send_message(&event.channel_id, &reply) {
                Ok(()) => delivered += 1,
                Err(error) => tracing::warn!(
                    channel_id = %event.channel_id,
                    error = %format!("{error:#}"),
                    "failed to send keystone reply"
                ),
            }
        }
        delivered
    }
}

fn execute_keystone_command(
    state: &mut KeystonePluginState,
    event: &KeystoneInboundEvent,
    command: &KeystoneCommand,
    services: &KeystoneServices<'_>,
    ticks: &str,
    prefix: &str,
    now: DateTime<Utc>,
) -> Result<Vec<String>, KeystoneCommandError> {
    let channel_id = event.channel_id.as_str();
    let actor_id = event.actor_id.as_str();
    match command {
        KeystoneCommand::Start => {
            require_channel_admin(services, event, KeystoneAdminCommand::Start)?;
            if state.start_channel(channel_id, now) {
                tracing::info!(channel_id, user_id = actor_id, "keystone tracking started");
            }
            Ok(vec![TRACKING_STARTED_MESSAGE.to_string()])
        }
        KeystoneCommand::Stop => {
            require_channel_admin(services, event, KeystoneAdminCommand::Stop)?;
            if state.stop_channel(channel_id) {
                tracing::info!(channel_id, user_id = actor_id, "keystone tracking stopped");
            }
            Ok(vec![TRACKING_STOPPED_MESSAGE.to_string()])
        }
        KeystoneCommand::Help => {
            let is_admin =
                authorize_channel_admin(services.permissions, channel_id, actor_id).is_allowed();
            Ok(vec![render_keystone_help(
                ticks,
                prefix,
                is_admin,
                state.is_tracking(channel_id),
            )])
        }
        KeystoneCommand::Region { argument } => {
            if !state.is_tracking(channel_id) {
                return Err(KeystoneCommandError::NotTracking);
            }
            require_channel_admin(services, event, KeystoneAdminCommand::Region)?;
            let ledger = state
                .channel_mut(channel_id)
                .ok_or(KeystoneCommandError::NotTracking)?;
            let region = KeystoneRegion::from_command_argument(argument.as_deref());
            ledger.set_region(region);
            tracing::info!(
                channel_id,
                user_id = actor_id,
                region = region.as_str(),
                "keystone region changed"
            );
            Ok(vec![render_region_changed(region)])
        }
        KeystoneCommand::InvalidAlt => {
            if !state.is_tracking(channel_id) {
                return Err(KeystoneCommandError::NotTracking);
            }
            Err(KeystoneCommandError::InvalidAlt)
        }
        KeystoneCommand::Record { alt_label, action } => {
            let ledger = state
                .channel_mut(channel_id)
                .ok_or(KeystoneCommandError::NotTracking)?;
            let key = keystone_identity_key(actor_id, alt_label.as_deref());
            let display_name = event.display_name();
            let confirmation = match action {
                KeystoneRecordAction::Set { args } => {
                    ledger.set_record(
                        &key,
                        display_name,
                        alt_label.as_deref().unwrap_or_default(),
                        &args.join(" "),
                        now,
                    )?;
                    KEYSTONE_SET_MESSAGE
                }
                KeystoneRecordAction::Unset => {
                    if !ledger.remove_record(&key) {
                        return Err(KeystoneCommandError::NoRecordForUser);
                    }
                    KEYSTONE_UNSET_MESSAGE
                }
                KeystoneRecordAction::List => return Ok(vec![ledger.render_listing()]),
                KeystoneRecordAction::Deplete => {
                    ledger
                        .set_depleted(&key, display_name, true)
                        .ok_or(KeystoneCommandError::NoRecordForUser)?;
                    KEYSTONE_DEPLETED_MESSAGE
                }
                KeystoneRecordAction::Undeplete => {
                    ledger
                        .set_depleted(&key, display_name, false)
                        .ok_or(KeystoneCommandError::NoRecordForUser)?;
                    KEYSTONE_UNDEPLETED_MESSAGE
                }
            };
            tracing::debug!(
                channel_id,
                user_id = actor_id,
                key = %key,
                command = action.as_str(),
                "keystone record updated"
            );
            Ok(vec![confirmation.to_string(), ledger.render_listing()])
        }
    }
}

fn require_channel_admin(
    services: &KeystoneServices<'_>,
    event: &KeystoneInboundEvent,
    command: KeystoneAdminCommand,
) -> Result<(), KeystoneCommandError> {
    let decision = authorize_channel_admin(services.permissions, &event.channel_id, &event.actor_id);
    if decision.is_allowed() {
        return Ok(());
    }
    tracing::info!(
        channel_id = %event.channel_id,
        user_id = %event.actor_id,
        command = command.as_str(),
        reason_code = decision.reason_code(),
        "keystone admin command denied"
    );
    Err(KeystoneCommandError::PermissionDenied { command })
}

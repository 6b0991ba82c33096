use serde::Serialize;

/// Trait contract for `KeystonePermissions` behavior.
///
/// Chat backends answer these from whatever they know about the sender; the
/// dispatcher only needs the two yes/no questions.
pub trait KeystonePermissions: Send + Sync {
    fn is_bot_owner(&self, actor_id: &str) -> bool;

    fn is_moderator(&self, channel_id: &str, actor_id: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
/// Enumerates supported `KeystoneAccessDecision` values.
pub enum KeystoneAccessDecision {
    Allow { reason_code: String },
    Deny { reason_code: String },
}

impl KeystoneAccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn reason_code(&self) -> &str {
        match self {
            Self::Allow { reason_code } | Self::Deny { reason_code } => reason_code,
        }
    }
}

/// Decides whether `actor_id` may run channel-administration commands
/// (start, stop, region) in `channel_id`.
pub fn authorize_channel_admin(
    permissions: &dyn KeystonePermissions,
    channel_id: &str,
    actor_id: &str,
) -> KeystoneAccessDecision {
    if permissions.is_bot_owner(actor_id) {
        return KeystoneAccessDecision::Allow {
            reason_code: "allow_bot_owner".to_string(),
        };
    }
    if permissions.is_moderator(channel_id, actor_id) {
        return KeystoneAccessDecision::Allow {
            reason_code: "allow_channel_moderator".to_string(),
        };
    }
    KeystoneAccessDecision::Deny {
        reason_code: "deny_not_channel_admin".to_string(),
    }
}

//! Collaborator capabilities the dispatcher talks to.

use anyhow::Result;
use keystone_access::KeystonePermissions;

use crate::keystone_contract::KeystoneTransport;

/// Trait contract for `KeystoneMessenger` behavior.
///
/// Sending is fire-and-forget from the dispatcher's point of view: a failed
/// send is logged and the next reply is still attempted.
pub trait KeystoneMessenger: Send + Sync {
    fn transport(&self) -> KeystoneTransport;

    /// True when `actor_id` is the bot itself.
    fn is_self(&self, actor_id: &str) -> bool;

    fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;

    fn supports_monospace(&self) -> bool {
        self.transport().supports_monospace()
    }
}

/// Trait contract for `KeystoneCommandPrefix` behavior.
pub trait KeystoneCommandPrefix: Send + Sync {
    fn command_prefix(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Command prefix fixed at startup.
pub struct StaticCommandPrefix {
    prefix: String,
}

impl StaticCommandPrefix {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl KeystoneCommandPrefix for StaticCommandPrefix {
    fn command_prefix(&self) -> String {
        self.prefix.clone()
    }
}

#[derive(Clone, Copy)]
/// Borrowed bundle of the collaborators one dispatch needs.
pub struct KeystoneServices<'a> {
    pub messenger: &'a dyn KeystoneMessenger,
    pub permissions: &'a dyn KeystonePermissions,
    pub command_prefix: &'a dyn KeystoneCommandPrefix,
}

impl KeystoneServices<'_> {
    pub fn monospace_ticks(&self) -> &'static str {
        if self.messenger.supports_monospace() {
            "`"
        } else {
            ""
        }
    }
}

//! JSON access policy backing `KeystonePermissions`.
//!
//! The file lists bot owners and, per channel, the users that count as
//! moderators. The `*` channel key applies to every channel. A missing file
//! is an empty policy: nobody may administer channels until one is written
//! or owner ids are supplied on the command line.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::keystone_permissions::KeystonePermissions;

pub const KEYSTONE_ACCESS_POLICY_SCHEMA_VERSION: u32 = 1;
pub const KEYSTONE_ACCESS_POLICY_WILDCARD_CHANNEL: &str = "*";

fn keystone_access_policy_schema_version() -> u32 {
    KEYSTONE_ACCESS_POLICY_SCHEMA_VERSION
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Public struct `KeystoneAccessPolicy` used across keystone components.
pub struct KeystoneAccessPolicy {
    #[serde(default = "keystone_access_policy_schema_version")]
    pub schema_version: u32,
    #[serde(default, rename = "ownerUserIds")]
    pub owner_user_ids: BTreeSet<String>,
    #[serde(default)]
    pub moderators: BTreeMap<String, BTreeSet<String>>,
}

impl Default for KeystoneAccessPolicy {
    fn default() -> Self {
        Self {
            schema_version: KEYSTONE_ACCESS_POLICY_SCHEMA_VERSION,
            owner_user_ids: BTreeSet::new(),
            moderators: BTreeMap::new(),
        }
    }
}

impl KeystoneAccessPolicy {
    /// Adds owner ids supplied outside the policy file; blank ids are ignored.
    pub fn with_additional_owners<I, S>(mut self, owner_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for owner_id in owner_ids {
            let trimmed = owner_id.as_ref().trim();
            if !trimmed.is_empty() {
                self.owner_user_ids.insert(trimmed.to_string());
            }
        }
        self
    }
}

impl KeystonePermissions for KeystoneAccessPolicy {
    fn is_bot_owner(&self, actor_id: &str) -> bool {
        self.owner_user_ids.contains(actor_id.trim())
    }

    fn is_moderator(&self, channel_id: &str, actor_id: &str) -> bool {
        let actor_id = actor_id.trim();
        [channel_id.trim(), KEYSTONE_ACCESS_POLICY_WILDCARD_CHANNEL]
            .into_iter()
            .filter_map(|key| self.moderators.get(key))
            .any(|moderators| moderators.contains(actor_id))
    }
}

pub fn load_keystone_access_policy(path: &Path) -> Result<KeystoneAccessPolicy> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "keystone access policy not found; using empty policy");
        return Ok(KeystoneAccessPolicy::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read keystone access policy {}", path.display()))?;
    let parsed = serde_json::from_str::<KeystoneAccessPolicy>(&raw)
        .with_context(|| format!("failed to parse keystone access policy {}", path.display()))?;
    validate_keystone_access_policy(&parsed)
        .with_context(|| format!("invalid keystone access policy {}", path.display()))?;
    Ok(parsed)
}

fn validate_keystone_access_policy(policy: &KeystoneAccessPolicy) -> Result<()> {
    if policy.schema_version != KEYSTONE_ACCESS_POLICY_SCHEMA_VERSION {
        bail!(
            "unsupported keystone access policy schema_version {} (expected {})",
            policy.schema_version,
            KEYSTONE_ACCESS_POLICY_SCHEMA_VERSION
        );
    }
    if policy.owner_user_ids.iter().any(|id| id.trim().is_empty()) {
        bail!("keystone access policy owner ids must not be empty");
    }
    for (channel_id, moderators) in &policy.moderators {
        if channel_id.trim().is_empty() {
            bail!("keystone access policy channel key must not be empty");
        }
        if moderators.iter().any(|id| id.trim().is_empty()) {
            bail!("keystone access policy channel '{channel_id}' lists an empty moderator id");
        }
    }
    Ok(())
}

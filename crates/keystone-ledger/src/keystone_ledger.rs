//! Per-channel keystone ledger and listing renderer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keystone_catalog::ActivityId;
use crate::keystone_parser::{parse_keystone_text, KeystoneParseError};
use crate::keystone_reset_clock::{is_stale, KeystoneRegion};

pub const EMPTY_LISTING_MESSAGE: &str = "No keystones have been set this week.";
const ALT_KEY_SEPARATOR: &str = "__";

/// Returns the ledger key for a user's own record, or for one of their alts.
pub fn keystone_identity_key(user_id: &str, alt_label: Option<&str>) -> String {
    match alt_label.filter(|label| !label.is_empty()) {
        Some(label) => format!("{}{ALT_KEY_SEPARATOR}{user_id}", label.to_lowercase()),
        None => user_id.to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One user's (or alt's) keystone for the current week.
pub struct KeystoneRecord {
    #[serde(rename = "user")]
    pub owner_display_name: String,
    /// Empty when the record is not for an alt.
    #[serde(rename = "alt", default)]
    pub alt_label: String,
    #[serde(rename = "dungeon")]
    pub activity: ActivityId,
    pub level: u32,
    #[serde(default)]
    pub depleted: bool,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl KeystoneRecord {
    pub fn render_summary(&self) -> String {
        let mut summary = format!("Level {} **{}**", self.level, self.activity.name());
        if !self.modifiers.is_empty() {
            summary.push_str(&format!(" *({})*", self.modifiers.join(", ")));
        }
        if self.depleted {
            summary.push_str(" - Depleted");
        }
        summary
    }

    pub fn render_owner(&self) -> String {
        if self.alt_label.is_empty() {
            self.owner_display_name.clone()
        } else {
            format!("{} *({})*", self.alt_label, self.owner_display_name)
        }
    }

    pub fn render_listing_line(&self) -> String {
        format!("{} - {}", self.render_summary(), self.render_owner())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Keystone records, region, and last successful set time for one channel.
pub struct ChannelLedger {
    #[serde(default)]
    records: BTreeMap<String, KeystoneRecord>,
    #[serde(default)]
    region: KeystoneRegion,
    last_modified: DateTime<Utc>,
}

impl ChannelLedger {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            records: BTreeMap::new(),
            region: KeystoneRegion::default(),
            last_modified: now,
        }
    }

    pub fn region(&self) -> KeystoneRegion {
        self.region
    }

    pub fn set_region(&mut self, region: KeystoneRegion) {
        self.region = region;
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn records(&self) -> &BTreeMap<String, KeystoneRecord> {
        &self.records
    }

    pub fn record(&self, key: &str) -> Option<&KeystoneRecord> {
        self.records.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every record once the weekly reset after `last_modified` has
    /// passed. Returns true when records were cleared.
    pub fn check_and_maybe_reset(&mut self, now: DateTime<Utc>) -> bool {
        if !is_stale(self.last_modified, self.region, now) {
            return false;
        }
        let had_records = !self.records.is_empty();
        self.records.clear();
        had_records
    }

    /// Parses `text` and overwrites the record at `key`. Leaves the ledger
    /// untouched when parsing fails.
    pub fn set_record(
        &mut self,
        key: &str,
        owner_display_name: &str,
        alt_label: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<&KeystoneRecord, KeystoneParseError> {
        let parsed = parse_keystone_text(text)?;
        let record = KeystoneRecord {
            owner_display_name: owner_display_name.to_string(),
            alt_label: alt_label.to_string(),
            activity: parsed.activity,
            level: parsed.level,
            depleted: parsed.depleted,
            modifiers: parsed.modifiers,
        };
        self.last_modified = now;
        self.records.insert(key.to_string(), record);
        Ok(&self.records[key])
    }

    pub fn remove_record(&mut self, key: &str) -> bool {
        self.records.remove(key).is_some()
    }

    pub fn set_depleted(
        &mut self,
        key: &str,
        owner_display_name: &str,
        depleted: bool,
    ) -> Option<&KeystoneRecord> {
        let record = self.records.get_mut(key)?;
        record.depleted = depleted;
        record.owner_display_name = owner_display_name.to_string();
        Some(record)
    }

    /// Records ordered by level (high first), then dungeon name descending,
    /// then ledger key.
    pub fn sorted_records(&self) -> Vec<(&str, &KeystoneRecord)> {
        let mut sorted = self
            .records
            .iter()
            .map(|(key, record)| (key.as_str(), record))
            .collect::<Vec<_>>();
        sorted.sort_by(|(_, left), (_, right)| {
            right
                .level
                .cmp(&left.level)
                .then_with(|| right.activity.name().cmp(left.activity.name()))
        });
        sorted
    }

    pub fn render_listing(&self) -> String {
        if self.records.is_empty() {
            return EMPTY_LISTING_MESSAGE.to_string();
        }
        self.sorted_records()
            .into_iter()
            .map(|(_, record)| record.render_listing_line())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

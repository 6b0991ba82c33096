use std::{
    sync::{Arc, Mutex},
    thread,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use keystone_access::KeystoneAccessPolicy;
use keystone_ledger::{decode_keystone_state, ActivityId, KeystoneRegion, EMPTY_LISTING_MESSAGE};
use keystone_runtime::{
    FileKeystoneStateStore, KeystoneInboundEvent, KeystoneMessenger, KeystonePlugin,
    KeystoneServices, KeystoneStateStore, KeystoneTransport, StaticCommandPrefix,
};

const OWNER: &str = "owner-1";

#[derive(Default)]
struct CapturingMessenger {
    sent: Mutex<Vec<(String, String)>>,
}

impl CapturingMessenger {
    fn texts_for(&self, channel_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .filter(|(channel, _)| channel == channel_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

impl KeystoneMessenger for CapturingMessenger {
    fn transport(&self) -> KeystoneTransport {
        KeystoneTransport::Discord
    }

    fn is_self(&self, _actor_id: &str) -> bool {
        false
    }

    fn send_message(&self, channel_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .expect("sent lock")
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }
}

struct Scenario {
    plugin: Arc<KeystonePlugin>,
    messenger: CapturingMessenger,
    policy: KeystoneAccessPolicy,
    prefix: StaticCommandPrefix,
}

impl Scenario {
    fn new(plugin: KeystonePlugin) -> Self {
        Self {
            plugin: Arc::new(plugin),
            messenger: CapturingMessenger::default(),
            policy: KeystoneAccessPolicy::default().with_additional_owners([OWNER]),
            prefix: StaticCommandPrefix::new("!"),
        }
    }

    fn services(&self) -> KeystoneServices<'_> {
        KeystoneServices {
            messenger: &self.messenger,
            permissions: &self.policy,
            command_prefix: &self.prefix,
        }
    }

    fn send(&self, channel_id: &str, actor_id: &str, text: &str, now: DateTime<Utc>) -> usize {
        self.plugin
            .handle_message(&event(channel_id, actor_id, text), &self.services(), now)
    }
}

fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("valid rfc3339")
        .with_timezone(&Utc)
}

fn event(channel_id: &str, actor_id: &str, text: &str) -> KeystoneInboundEvent {
    KeystoneInboundEvent {
        schema_version: 1,
        transport: KeystoneTransport::Discord,
        event_id: String::new(),
        channel_id: channel_id.to_string(),
        actor_id: actor_id.to_string(),
        actor_display: actor_id.to_uppercase(),
        timestamp_ms: 0,
        text: text.to_string(),
    }
}

#[test]
fn integration_channels_keep_independent_ledgers_and_regions() {
    let scenario = Scenario::new(KeystonePlugin::new());
    let start = utc("2024-01-02T09:00:00Z");
    scenario.send("us-chan", OWNER, "!start", start);
    scenario.send("eu-chan", OWNER, "!start", start);
    scenario.send("eu-chan", OWNER, "!region eu", start);

    let set_at = utc("2024-01-04T20:00:00Z");
    scenario.send("us-chan", "alice", "!set the necrotic wake 12 bolstering", set_at);
    scenario.send("eu-chan", "alice", "!set nw 3", set_at);

    assert_eq!(
        scenario.messenger.texts_for("us-chan").last().map(String::as_str),
        Some("Level 12 **The Necrotic Wake** *(bolstering)* - ALICE")
    );
    assert_eq!(
        scenario.messenger.texts_for("eu-chan").last().map(String::as_str),
        Some("Level 3 **The Necrotic Wake** - ALICE")
    );

    // US clears at Tuesday midnight, EU a day later.
    let between_resets = utc("2024-01-09T12:00:00Z");
    scenario.send("us-chan", "alice", "!list", between_resets);
    scenario.send("eu-chan", "alice", "!list", between_resets);
    assert_eq!(
        scenario.messenger.texts_for("us-chan").last().map(String::as_str),
        Some(EMPTY_LISTING_MESSAGE)
    );
    assert_eq!(
        scenario.messenger.texts_for("eu-chan").last().map(String::as_str),
        Some("Level 3 **The Necrotic Wake** - ALICE")
    );

    let snapshot = scenario.plugin.snapshot();
    assert_eq!(
        snapshot.channel("eu-chan").expect("eu ledger").region(),
        KeystoneRegion::Eu
    );
    assert_eq!(
        snapshot.channel("us-chan").expect("us ledger").region(),
        KeystoneRegion::Us
    );
}

#[test]
fn integration_concurrent_members_and_file_store_round_trip() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = FileKeystoneStateStore::new(temp.path().join("keystone/state.json"));
    let scenario = Arc::new(Scenario::new(KeystonePlugin::new()));
    let now = utc("2024-01-04T20:00:00Z");
    scenario.send("chan-1", OWNER, "!start", now);

    let handles = (0..8)
        .map(|index| {
            let scenario = Arc::clone(&scenario);
            thread::spawn(move || {
                let user = format!("member-{index}");
                scenario.send("chan-1", &user, &format!("!set sanguine depths {}", index + 2), now);
                scenario.send(
                    "chan-1",
                    &user,
                    &format!("!alt alt{index} set spires of ascension {}", index + 10),
                    now,
                );
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().expect("member thread");
    }

    let snapshot = scenario.plugin.snapshot();
    let ledger = snapshot.channel("chan-1").expect("ledger");
    assert_eq!(ledger.records().len(), 16);
    assert_eq!(
        ledger
            .record("alt3__member-3")
            .expect("alt record")
            .activity,
        ActivityId::Soa
    );
    let top = ledger.sorted_records()[0].1;
    assert_eq!(top.level, 17);
    assert_eq!(top.alt_label, "alt7");

    scenario.plugin.save(&store).expect("save");
    let reloaded = KeystonePlugin::load(&store).expect("load");
    assert_eq!(reloaded.snapshot(), snapshot);

    let raw = store.load_blob().expect("load blob").expect("blob");
    assert_eq!(decode_keystone_state(&raw).expect("decode"), snapshot);
}

#[test]
fn integration_reloaded_plugin_keeps_serving_commands() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = FileKeystoneStateStore::new(temp.path().join("state.json"));
    let first = Scenario::new(KeystonePlugin::load(&store).expect("empty load"));
    let now = utc("2024-01-04T20:00:00Z");
    first.send("chan-1", OWNER, "!start", now);
    first.send("chan-1", "bob", "!set mists 8 fortified", now);
    first.plugin.save(&store).expect("save");

    let second = Scenario::new(KeystonePlugin::load(&store).expect("reload"));
    assert_eq!(second.send("chan-1", "bob", "!deplete", now), 2);
    assert_eq!(
        second.messenger.texts_for("chan-1"),
        vec![
            "Keystone depleted.".to_string(),
            "Level 8 **Mists of Tirna Scithe** *(fortified)* - Depleted - BOB".to_string(),
        ]
    );
    assert_eq!(second.send("chan-1", OWNER, "!stop", now), 1);
    second.plugin.save(&store).expect("save after stop");

    let third = KeystonePlugin::load(&store).expect("reload after stop");
    assert!(third.snapshot().channels.is_empty());
}

#[test]
fn integration_saved_state_file_is_plain_json() {
    let temp = tempfile::tempdir().expect("tempdir");
    let state_path = temp.path().join("state.json");
    let store = FileKeystoneStateStore::new(state_path.clone());
    let scenario = Scenario::new(KeystonePlugin::new());
    let now = utc("2024-01-04T20:00:00Z");
    scenario.send("chan-1", OWNER, "!start", now);
    scenario.send("chan-1", OWNER, "!region eu", now);
    scenario.send("chan-1", "bob", "!set mists 8 fortified depleted", now);
    scenario.send("chan-1", "bob", "!alt bank set fh 3", now);
    scenario.plugin.save(&store).expect("save");

    let raw = std::fs::read_to_string(&state_path).expect("state file");
    let saved: serde_json::Value = serde_json::from_str(&raw).expect("state json");
    assert_eq!(saved["schema_version"], 1);
    let channel = &saved["channels"]["chan-1"];
    assert_eq!(channel["region"], "eu");
    assert_eq!(channel["records"]["bob"]["dungeon"], "MOTS");
    assert_eq!(channel["records"]["bob"]["user"], "BOB");
    assert_eq!(channel["records"]["bob"]["level"], 8);
    assert_eq!(channel["records"]["bob"]["depleted"], true);
    assert_eq!(
        channel["records"]["bob"]["modifiers"],
        serde_json::json!(["fortified"])
    );
    assert_eq!(channel["records"]["bank__bob"]["alt"], "bank");
    assert_eq!(channel["records"]["bank__bob"]["dungeon"], "FH");
}

//! User-facing reply text for keystone commands.

use keystone_ledger::KeystoneRegion;

pub const TRACKING_STARTED_MESSAGE: &str = "This channel is now tracking mythic keystones.";
pub const TRACKING_STOPPED_MESSAGE: &str = "This channel is no longer tracking mythic keystones.";
pub const START_STOP_DENIED_MESSAGE: &str =
    "You must be a server admin to start tracking mythic keystones.";
pub const REGION_DENIED_MESSAGE: &str = "You must be a server admin to change regions.";
pub const KEYSTONE_SET_MESSAGE: &str = "Keystone set.";
pub const KEYSTONE_UNSET_MESSAGE: &str = "Keystone unset.";
pub const KEYSTONE_DEPLETED_MESSAGE: &str = "Keystone depleted.";
pub const KEYSTONE_UNDEPLETED_MESSAGE: &str = "Keystone undepleted.";
pub const NO_RECORD_MESSAGE: &str = "You haven't set a keystone this week.";

pub fn render_region_changed(region: KeystoneRegion) -> String {
    format!(
        "Your region is now set to {}. Keystones will clear midnight {}.",
        region.as_str(),
        region.reset_day_label()
    )
}

/// Wraps `body` in monospace ticks after the command prefix, e.g. `` `!list` ``.
pub fn render_command_example(ticks: &str, prefix: &str, body: &str) -> String {
    format!("{ticks}{prefix}{body}{ticks}")
}

pub fn render_invalid_keystone(ticks: &str, prefix: &str) -> String {
    format!(
        "Invalid keystone. Eg: {}",
        render_command_example(ticks, prefix, "set mists of tirna scithe 3 sanguine")
    )
}

pub fn render_invalid_alt(ticks: &str, prefix: &str) -> String {
    format!(
        "Invalid alt command. Eg: {}",
        render_command_example(
            ticks,
            prefix,
            "alt iopred set mists of tirna scithe 9 depleted"
        )
    )
}

fn render_help_line(ticks: &str, prefix: &str, command: &str, args: &str, help: &str) -> String {
    let usage = if args.is_empty() {
        command.to_string()
    } else {
        format!("{command} {args}")
    };
    format!("{} - {help}", render_command_example(ticks, prefix, &usage))
}

/// Help for the caller: admin commands when `is_admin`, record commands when
/// the channel is tracking, then worked examples.
pub fn render_keystone_help(ticks: &str, prefix: &str, is_admin: bool, is_tracking: bool) -> String {
    let mut lines = Vec::new();
    if is_admin {
        if is_tracking {
            lines.push(render_help_line(
                ticks,
                prefix,
                "stop",
                "",
                "Stops keystone tracking in this channel.",
            ));
        } else {
            lines.push(render_help_line(
                ticks,
                prefix,
                "start",
                "",
                "Starts keystone tracking in this channel.",
            ));
        }
        lines.push(render_help_line(
            ticks,
            prefix,
            "region",
            "<US|EU>",
            "Sets your region (default US)",
        ));
    }
    if is_tracking {
        lines.push(render_help_line(
            ticks,
            prefix,
            "alt",
            "<alt name> <any other command>",
            &format!(
                "Executes a command for an alt. Eg: {}",
                render_command_example(ticks, prefix, "alt iopred set soa 2")
            ),
        ));
        lines.push(render_help_line(
            ticks,
            prefix,
            "set",
            "<dungeon> <level> [modifiers]",
            &format!(
                "Sets a keystone. Eg: {}",
                render_command_example(ticks, prefix, "set hoa 5 teeming")
            ),
        ));
        for (command, help) in [
            ("list", "Lists all this weeks keystones."),
            ("deplete", "Depletes your keystone"),
            ("undeplete", "Undepletes your keystone"),
            ("unset", "Unsets your keystone"),
        ] {
            lines.push(render_help_line(ticks, prefix, command, "", help));
        }
    }
    lines.push("Examples:".to_string());
    lines.push(format!(
        "{} - Adds a Level 5 Halls of Atonement keystone with teeming.",
        render_command_example(ticks, prefix, "set hoa 5 teeming")
    ));
    lines.push(format!(
        "{} - Adds a depleted Level 2 De Other Side keystone.",
        render_command_example(ticks, prefix, "set de other side 2 depleted")
    ));
    lines.push(format!(
        "{} - Sets the region to EU.",
        render_command_example(ticks, prefix, "region EU")
    ));
    lines.join("\n")
}

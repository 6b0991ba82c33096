//! Keystone chat command parsing.

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `KeystoneRecordAction` values.
pub enum KeystoneRecordAction {
    Set { args: Vec<String> },
    Unset,
    List,
    Deplete,
    Undeplete,
}

impl KeystoneRecordAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Unset => "unset",
            Self::List => "list",
            Self::Deplete => "deplete",
            Self::Undeplete => "undeplete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `KeystoneCommand` values.
pub enum KeystoneCommand {
    Start,
    Stop,
    Help,
    Region {
        argument: Option<String>,
    },
    Record {
        alt_label: Option<String>,
        action: KeystoneRecordAction,
    },
    /// `alt` without a label or without a record command after it.
    InvalidAlt,
}

impl KeystoneCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Help => "help",
            Self::Region { .. } => "region",
            Self::Record {
                alt_label: Some(_),
                ..
            }
            | Self::InvalidAlt => "alt",
            Self::Record { action, .. } => action.as_str(),
        }
    }
}

/// Strips `prefix` from the front of `text`, comparing case-insensitively.
pub fn strip_command_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.to_lowercase() != prefix.to_lowercase() {
        return None;
    }
    Some(&text[prefix.len()..])
}

/// Parses a chat message into a keystone command. Returns `None` when the
/// message is not addressed to the bot or names no known command.
pub fn parse_keystone_command(text: &str, prefix: &str) -> Option<KeystoneCommand> {
    let body = strip_command_prefix(text.trim(), prefix)?;
    let tokens = body.split_whitespace().collect::<Vec<_>>();
    let (command, rest) = tokens.split_first()?;
    let command = command.to_lowercase();
    match command.as_str() {
        "start" => Some(KeystoneCommand::Start),
        "stop" => Some(KeystoneCommand::Stop),
        "help" => Some(KeystoneCommand::Help),
        "region" => Some(KeystoneCommand::Region {
            argument: rest.first().map(|token| token.to_string()),
        }),
        "alt" => Some(parse_alt_command(rest)),
        _ => parse_record_action(&command, rest).map(|action| KeystoneCommand::Record {
            alt_label: None,
            action,
        }),
    }
}

fn parse_alt_command(rest: &[&str]) -> KeystoneCommand {
    let Some((label, redirected)) = rest.split_first() else {
        return KeystoneCommand::InvalidAlt;
    };
    let Some((command, args)) = redirected.split_first() else {
        return KeystoneCommand::InvalidAlt;
    };
    match parse_record_action(&command.to_lowercase(), args) {
        Some(action) => KeystoneCommand::Record {
            alt_label: Some(label.to_string()),
            action,
        },
        None => KeystoneCommand::InvalidAlt,
    }
}

fn parse_record_action(command: &str, args: &[&str]) -> Option<KeystoneRecordAction> {
    match command {
        "set" => Some(KeystoneRecordAction::Set {
            args: args.iter().map(|token| token.to_string()).collect(),
        }),
        "unset" => Some(KeystoneRecordAction::Unset),
        "list" => Some(KeystoneRecordAction::List),
        "deplete" => Some(KeystoneRecordAction::Deplete),
        "undeplete" => Some(KeystoneRecordAction::Undeplete),
        _ => None,
    }
}

//! Free-text keystone parsing: `<dungeon alias> <level> [modifiers...]`.

use thiserror::Error;

use crate::keystone_catalog::{find_activity_by_alias, ActivityId};

const DEPLETED_TOKEN_PREFIX: &str = "deplete";

/// Error returned when keystone text cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeystoneParseError {
    #[error("keystone text does not start with a known dungeon")]
    NoActivityMatch,
    #[error("keystone text is missing a level after the dungeon")]
    MissingLevel,
    #[error("keystone level '{token}' is not a non-negative integer")]
    InvalidLevel { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parsed form of a keystone text.
pub struct ParsedKeystone {
    pub activity: ActivityId,
    pub level: u32,
    pub depleted: bool,
    pub modifiers: Vec<String>,
}

/// Parses keystone text. Input is lower-cased and any whitespace run counts as
/// one separator; tokens starting with `deplete` set the depleted flag instead
/// of becoming modifiers.
pub fn parse_keystone_text(text: &str) -> Result<ParsedKeystone, KeystoneParseError> {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let matched = find_activity_by_alias(&normalized).ok_or(KeystoneParseError::NoActivityMatch)?;

    let remainder = normalized.get(matched.alias_len..).unwrap_or_default();
    let mut tokens = remainder.split_whitespace();
    let level_token = tokens.next().ok_or(KeystoneParseError::MissingLevel)?;
    let level = level_token
        .parse::<u32>()
        .map_err(|_| KeystoneParseError::InvalidLevel {
            token: level_token.to_string(),
        })?;

    let mut depleted = false;
    let mut modifiers = Vec::new();
    for token in tokens {
        if token.starts_with(DEPLETED_TOKEN_PREFIX) {
            depleted = true;
        } else {
            modifiers.push(token.to_string());
        }
    }

    Ok(ParsedKeystone {
        activity: matched.activity,
        level,
        depleted,
        modifiers,
    })
}

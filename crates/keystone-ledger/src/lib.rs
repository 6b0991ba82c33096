//! Weekly keystone ledger primitives.
//!
//! Hosts the dungeon catalog, the regional weekly reset clock, the free-text
//! keystone parser, and the per-channel ledger plus its persisted snapshot
//! codec. Everything here is synchronous and free of I/O so the runtime crate
//! can wrap it in whatever locking and transport it needs.
//!
//! ```rust
//! use keystone_ledger::{parse_keystone_text, ActivityId};
//!
//! let parsed = parse_keystone_text("hall of valor 5 teeming").expect("valid keystone");
//! assert_eq!(parsed.activity, ActivityId::Hov);
//! assert_eq!(parsed.level, 5);
//! assert_eq!(parsed.modifiers, vec!["teeming".to_string()]);
//! ```

pub mod keystone_catalog;
pub mod keystone_ledger;
pub mod keystone_parser;
pub mod keystone_reset_clock;
pub mod keystone_state;

pub use keystone_catalog::*;
pub use keystone_ledger::*;
pub use keystone_parser::*;
pub use keystone_reset_clock::*;
pub use keystone_state::*;

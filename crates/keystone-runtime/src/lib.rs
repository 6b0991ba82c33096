//! Keystone command runtime.
//!
//! Wires the ledger crate to chat collaborators: command parsing and
//! dispatch, the lock-guarded plugin state, state persistence, and the NDJSON
//! live transport loop with periodic and shutdown saves.
//!
//! ```rust
//! use keystone_runtime::{parse_keystone_command, KeystoneCommand, KeystoneRecordAction};
//!
//! let command = parse_keystone_command("!alt Foo set hoa 5", "!").expect("command");
//! assert_eq!(
//!     command,
//!     KeystoneCommand::Record {
//!         alt_label: Some("Foo".to_string()),
//!         action: KeystoneRecordAction::Set {
//!             args: vec!["hoa".to_string(), "5".to_string()],
//!         },
//!     }
//! );
//! ```

pub mod keystone_commands;
pub mod keystone_contract;
pub mod keystone_dispatch;
pub mod keystone_render;
pub mod keystone_runtime;
pub mod keystone_services;
pub mod keystone_state_store;

pub use keystone_commands::*;
pub use keystone_contract::*;
pub use keystone_dispatch::*;
pub use keystone_render::*;
pub use keystone_runtime::*;
pub use keystone_services::*;
pub use keystone_state_store::*;

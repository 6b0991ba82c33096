//! Permission checks for keystone channel administration.
//!
//! Exposes the `KeystonePermissions` capability consumed by the command
//! dispatcher and a JSON access-policy backend that grants bot-owner and
//! per-channel moderator rights.

pub mod keystone_access_policy;
pub mod keystone_permissions;

pub use keystone_access_policy::*;
pub use keystone_permissions::*;

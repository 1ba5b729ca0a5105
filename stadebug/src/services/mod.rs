//! Collaborators the pipeline consumes but does not own.
//!
//! Secret lookup and action logging are passed in by the caller as trait
//! objects; storage format and lifecycle stay on the caller's side.

pub mod action_log;
pub mod secrets;

pub use action_log::{ActionEntry, ActionLog, MemoryActionLog, TracingActionLog};
pub use secrets::{mask_key, JsonKeyFile, KeyEntry, MemorySecretStore, SecretStore};

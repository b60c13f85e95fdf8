//! C ABI for the `AeroCell` diffusion engine.
//!
//! Every entry point takes an opaque `AeroCellInstance` pointer created by
//! [`instance::aerocell_new`] and returns an [`error::AeroCellErrorCode`].
//! The message of the last failure on the calling thread is available from
//! [`error::aerocell_get_last_error`].

pub mod error;
mod helpers;
pub mod instance;
pub mod queries;
pub mod simulation;

pub use error::AeroCellErrorCode;
pub use instance::{AeroCellInstance, AeroCellMapPreset};
pub use queries::AeroCellStats;

//! Durable client-side storage.
//!
//! Small string-keyed slots that survive restarts, holding the session
//! credential bundle and the active cluster selection.

mod base;
mod file;

pub use base::*;
pub use file::*;

//! View-layer helpers shared by every resource listing.

mod search;

pub use search::*;

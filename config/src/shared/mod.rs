mod api;
mod base;
mod console;
mod poll;
mod reconnect;
mod storage;
mod stream;

pub use api::*;
pub use base::*;
pub use console::*;
pub use poll::*;
pub use reconnect::*;
pub use storage::*;
pub use stream::*;

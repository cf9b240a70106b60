pub mod cache;
pub mod clients;
pub mod cluster;
pub mod concurrency;
pub mod error;
mod macros;
pub mod notifications;
pub mod storage;
pub mod stream;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod view;

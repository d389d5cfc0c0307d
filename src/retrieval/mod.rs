//! Execution of query plans against the data services.

pub mod assembler;
pub mod error;
pub mod fetcher;
pub(crate) mod frame;
pub mod map_dates;
pub mod progress;

pub use ola_basic_types::*;

pub mod api;
pub mod proto;
pub mod snapshots;
pub mod tokens;

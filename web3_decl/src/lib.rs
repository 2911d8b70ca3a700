//! `jsonrpsee` declarations of the Ola node JSON-RPC namespaces consumed by the
//! snapshot verifier.

pub use jsonrpsee;

pub mod namespaces;

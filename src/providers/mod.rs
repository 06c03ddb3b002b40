//! Provider implementations.

pub mod cerebras;

pub use cerebras::CerebrasProvider;

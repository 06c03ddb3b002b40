//! Cerebras Cloud inference API.

pub mod client;
pub mod types;

pub use client::CerebrasProvider;

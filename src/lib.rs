//! Cached client for the Marvel comics catalog API.
//!
//! Responses are cached for a fixed time in a durable store (SQLite first,
//! a flat JSON file as fallback), and entities can be loaded together with
//! everything they reference.

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod marvel;

#[cfg(test)]
mod test_support;

//! `conceptev-monitor` library crate.
//!
//! Configuration parsing and exit-code policy for the binary, split out
//! for integration testing. The entrypoint lives in `main.rs`.

pub mod config;
pub mod exit;

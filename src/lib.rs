//! # Solar Log Server Library
//!
//! Collects telemetry pushed by an ESP32 solar power monitor and keeps it as
//! one human-readable text file per calendar day.
//!
//! This library provides the storage core (formatting, daily append with a
//! one-time header, status and file listing) and the axum router that exposes
//! it over HTTP.

pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;

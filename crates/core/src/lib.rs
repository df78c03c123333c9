//! Studyhall Core - Shared types library.
//!
//! This crate provides common types used across all Studyhall components:
//! - `client` - Session store, HTTP access layer, and navigation guard
//! - `integration-tests` - End-to-end tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Platform roles, type-safe IDs, and validated emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Studyhall client library.
//!
//! The client-side access layer for the Studyhall platform, consumed by the
//! application shells (web, desktop) and by the `studyhall` diagnostic
//! binary.
//!
//! # Architecture
//!
//! - [`session`] - The persisted authentication session store
//! - [`api`] - HTTP access layer with bearer injection and centralized
//!   error dispatch
//! - [`routes`] - The static route table and the navigation guard
//! - [`nav`] - The navigation controller that owns the current location
//! - [`notify`] - User-facing notices and the session-expired signal
//! - [`config`] - Environment-based configuration
//!
//! Control flow: a route transition goes through [`nav::Navigator`], which
//! reads the [`session::SessionStore`]; the store's mutating operations call
//! the [`api::ApiClient`]; the HTTP layer's failure dispatch can itself
//! invalidate the session, which the navigator observes through
//! [`notify::SessionWatch`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod nav;
pub mod notify;
pub mod routes;
pub mod session;

//! Nikola telemetry registration service library crate.
//!
//! Holds the partner bearer token cache, the application and user registration
//! flows, and the HTTP surface that exposes them.

pub mod config;
pub mod errors;
pub mod http;
pub mod partner;
pub mod registration;
pub mod storage;

//! CLI command implementations.

pub mod auth;
pub mod backends;
pub mod common;
pub mod job;
pub mod report;
pub mod version;

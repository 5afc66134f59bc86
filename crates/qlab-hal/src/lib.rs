//! qlab execution abstraction
//!
//! This crate is the seam between "a circuit was built" and "here are the
//! measurement counts". Everything that talks to a simulator or a remote
//! service lives behind it; everything downstream (normalizing, sorting,
//! printing, charting) only ever sees an [`ExecutionResult`].
//!
//! # Overview
//!
//! - [`Backend`]: async job lifecycle (`submit`, `status`, `result`, `wait`)
//! - [`Counts`] and [`ExecutionResult`]: raw outcomes with the shot total,
//!   backend name and classical register carried as data
//! - [`BackendInfo`] and [`least_busy`]: service catalogues and selection
//! - [`auth`]: credentials from `.env`, saved accounts, and
//!   [`connect_with_fallback`] returning a typed [`Connection`]
//!
//! # Example: Fetching a result
//!
//! ```ignore
//! use qlab_hal::{Backend, JobId};
//!
//! let result = backend.wait(&JobId::new("ctb7hnpdf6zg0080t7q0")).await?;
//! println!("{} shots on {}", result.shots, result.backend);
//! if let Some((bitstring, count)) = result.counts.most_frequent() {
//!     println!("Most frequent: {bitstring} ({count} times)");
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod catalogue;
pub mod error;
pub mod job;
pub mod registry;
pub mod result;

pub use auth::{
    AccountStore, Connection, CredentialOrigin, Credentials, EnvCredentialSource,
    connect_with_fallback,
};
pub use backend::{Backend, BackendAvailability, BackendConfig, BackendFactory, CircuitSource};
pub use catalogue::{BackendInfo, SelectionFilter, least_busy};
pub use error::{HalError, HalResult};
pub use job::{JobId, JobStatus};
pub use registry::BackendRegistry;
pub use result::{Counts, DEFAULT_REGISTER, ExecutionResult};

//! Job archive backend for qlab.
//!
//! Serves completed jobs from a directory of JSON records, the way a cloud
//! service serves them over its API. Useful for re-reporting old runs and
//! for working offline.
//!
//! # Example
//!
//! ```ignore
//! use qlab_adapter_archive::ArchiveService;
//! use qlab_hal::{Backend, Credentials, JobId};
//!
//! let service = ArchiveService::connect("runs/", &Credentials::new(token))?;
//! let result = service.backend().wait(&JobId::new("ctb7hnpdf6zg0080t7q0")).await?;
//! ```

mod backend;
mod error;
mod store;

pub use backend::{ArchiveBackend, ArchiveService, BACKEND_NAME};
pub use error::{ArchiveError, ArchiveResult};
pub use store::{
    Archive, CATALOGUE_FILE, JOBS_DIR, JobRecord, TOKENS_FILE, hex_to_binary, infer_bit_width,
};

//! Domain models and types for odk-relay.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ProjectId`], [`XFormId`], [`GeodataCategory`])
//! - **Connection credentials** ([`CentralCredentials`])
//! - **Remote call outcomes** ([`RemoteOutcome`])
//! - **Error types** ([`RelayError`], [`CentralError`], [`FormError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RelayError>`]:
//!
//! ```rust
//! use odk_relay::domain::{GeodataCategory, RelayError, Result};
//!
//! fn example() -> Result<GeodataCategory> {
//!     GeodataCategory::new("buildings").map_err(RelayError::Validation)
//! }
//! ```

pub mod credentials;
pub mod errors;
pub mod form;
pub mod ids;
pub mod outcome;
pub mod result;

// Re-export commonly used types for convenience
pub use credentials::CentralCredentials;
pub use errors::{CentralError, FormError, RelayError};
pub use form::{FormSummary, FormValidity};
pub use ids::{GeodataCategory, ProjectId, XFormId};
pub use outcome::RemoteOutcome;
pub use result::Result;

//! # odk-relay
//!
//! odk-relay is the ODK Central side of a field mapping tasking backend. It
//! turns XLSForms into XForms bound to per-task geodata, publishes them with
//! their GeoJSON attachments, manages projects and app users, and converts
//! exported submissions into OSM XML and GeoJSON.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Form transformation, the publish sequence, submission conversion
//! - [`adapters`] - External integrations (ODK Central, the form catalog database)
//! - [`domain`] - Identifiers, credentials, remote outcomes and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use odk_relay::config::load_config;
//! use odk_relay::core::service::RelayService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("odk-relay.toml")?;
//!     let service = RelayService::from_config(&config);
//!
//!     for project in service.list_projects(None).await? {
//!         println!("{} {}", project.id, project.name);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Form Transformation
//!
//! Every generated XForm points its geodata instance at
//! `jr://file/{category}.geojson` and carries the deployment form id:
//!
//! ```rust
//! use odk_relay::core::transform::rewrite_bindings;
//! use odk_relay::domain::{GeodataCategory, XFormId};
//!
//! # fn example(xml: &str) -> odk_relay::domain::Result<()> {
//! let report = rewrite_bindings(
//!     xml,
//!     &XFormId::new("form-42").map_err(odk_relay::domain::RelayError::Validation)?,
//!     &GeodataCategory::new("buildings").map_err(odk_relay::domain::RelayError::Validation)?,
//! )?;
//! println!("{} attribute(s) changed", report.change_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error is
//! [`domain::RelayError`]. Its `status_code()` gives the HTTP-style class a
//! request boundary should report.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

//! External system integrations for odk-relay.
//!
//! - [`central`] - ODK Central REST API
//! - [`postgresql`] - read-only XForm catalog
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with mock implementations. Both adapters sit behind traits
//! ([`central::CentralApi`], [`postgresql::FormCatalog`]) so the orchestration
//! layer can be exercised with fakes.
//!
//! ```rust,no_run
//! use odk_relay::adapters::central::{CentralApi, CentralClient};
//! use odk_relay::domain::CentralCredentials;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let creds = CentralCredentials::new("https://central.example.org", "admin@example.org", "pw");
//! let client = CentralClient::new(&creds, Duration::from_secs(60), true)?;
//! for project in client.list_projects().await? {
//!     println!("{} {}", project.id, project.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod central;
pub mod postgresql;

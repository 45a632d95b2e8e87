//! Core logic for odk-relay.
//!
//! # Modules
//!
//! - [`transform`] - XLSForm → XForm conversion and deployment binding
//! - [`publish`] - the create → attach → publish sequence
//! - [`service`] - every operation callers invoke, with credential resolution
//! - [`submissions`] - CSV submissions → OSM XML and GeoJSON
//!
//! # Publish Workflow
//!
//! 1. **Generate**: convert the uploaded form (unless it is already XML) and
//!    bind `instance@src` / `data@id` to the deployment
//! 2. **Create**: upload the XForm; anything but created/already-exists stops
//!    here
//! 3. **Stage**: write the geodata attachment to the staging directory
//! 4. **Attach**: upload it to the form's draft
//! 5. **Cleanup**: remove the staged file
//! 6. **Publish**: publish the draft
//!
//! # Example
//!
//! ```rust,no_run
//! use odk_relay::config::load_config;
//! use odk_relay::core::service::{DeployRequest, RelayService};
//! use odk_relay::domain::{GeodataCategory, ProjectId, XFormId};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("odk-relay.toml")?;
//! let service = RelayService::from_config(&config);
//!
//! let geodata = std::fs::read("buildings.geojson")?;
//! let request = DeployRequest {
//!     project_id: ProjectId::new(12),
//!     input: Path::new("buildings.xlsx"),
//!     form_type: "xlsx",
//!     form_id: &XFormId::new("form-42")?,
//!     category: &GeodataCategory::new("buildings")?,
//!     geodata: &geodata,
//!     create_draft: false,
//! };
//! let result = service.deploy_form(&request, None).await?;
//! println!("{}", result.final_outcome());
//! # Ok(())
//! # }
//! ```

pub mod publish;
pub mod service;
pub mod submissions;
pub mod transform;

//! Publishing a deployment XForm with its geodata
//!
//! - [`sequence`] - create, attach, publish
//! - [`staging`] - temporary files for attachments

pub mod sequence;
pub mod staging;

pub use sequence::{PublishRequest, PublishResult, PublishSequence};
pub use staging::{remove_staged, stage_geodata, staged_geodata_path};

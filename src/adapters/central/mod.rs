//! ODK Central integration
//!
//! - [`CentralApi`] / [`CentralConnector`] - the seam the orchestration layer
//!   talks to
//! - [`CentralClient`] / [`HttpConnector`] - reqwest implementation
//! - [`models`] - the subset of Central's JSON the relay reads

pub mod api;
pub mod client;
pub mod models;

pub use api::{CentralApi, CentralConnector, APP_USER_ROLE_ID};
pub use client::{CentralClient, HttpConnector};
pub use models::{AppUser, FormInfo, Project};

#![doc = "data-release-core: core logic library for data-release."]

//! This crate holds the two tools behind the `data-release` CLI:
//!
//! - [`docgen`]: scans a tree for processed tables and figures and fills the
//!   data & code availability section of a README.
//! - [`publish`]: republishes a GitHub release on Zenodo, minting a DOI.
//!
//! The publish pipeline is written against the traits in [`contract`];
//! [`github`] and [`zenodo`] provide the HTTP implementations.

pub mod contract;
pub mod docgen;
pub mod error;
pub mod github;
pub mod metadata;
pub mod publish;
pub mod release_info;
pub mod zenodo;

pub(crate) const USER_AGENT: &str = concat!("data-release/", env!("CARGO_PKG_VERSION"));

//! # sweepr common
//!
//! Shared building blocks for every `sweepr` crate:
//!
//! * **[`error`]**: the recon error taxonomy. Only configuration errors are fatal.
//! * **[`models`]**: hosts, ports, banners and the aggregated [`models::ScanSession`].
//! * **[`config`]**: tunables for each pipeline phase.
//! * **[`network`]**: target parsing/expansion, port specifications and interface lookup.

pub mod config;
pub mod error;
pub mod models;
pub mod network;

pub use error::{ReconError, Result};

//! # Apple Music Provider
//!
//! Implements the `MusicCatalog` bridge trait over the Apple Music REST API.
//!
//! ## Overview
//!
//! This module provides:
//! - Catalog song lookup scoped to a storefront
//! - Library song and album search with opaque `next` cursors
//! - Library album listing and track pagination
//!
//! Every call is a single request. Pagination bounds are enforced by the
//! callers in `core-library`.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{AppleMusicConnector, ConnectorSettings};
pub use error::{AppleMusicApiError, Result};

//! # Authorization Module
//!
//! Access control for the subscription music service.
//!
//! ## Overview
//!
//! The OS permission prompt and the settings screen belong to the host. This
//! crate drives them through the `AuthorizationProvider` bridge and turns
//! status changes into `authorizationStatusDidChange` events.
//!
//! ## Features
//!
//! - Developer token configuration with validation
//! - Authorization prompt with settings hand-off when access was refused
//! - Subscription capability check
//! - Status refresh on every return to the foreground

pub mod error;
pub mod manager;

pub use error::{AuthError, Result};
pub use manager::AuthorizationManager;

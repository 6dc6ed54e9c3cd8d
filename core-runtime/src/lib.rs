//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the music bridge core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus and listener registry
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, the configuration surface and the
//! canonical event vocabulary delivered to the host application.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder, PlaybackTuning};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventKind, ListenerHandle, ListenerId, PlaybackState};

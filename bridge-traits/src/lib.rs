//! # Host Bridge Traits
//!
//! Contracts between the music bridge core and the host platform.
//!
//! ## Overview
//!
//! The core owns resolution, event normalization and fade scheduling. Everything
//! that touches a native SDK (audio engines, the permission prompt, the network
//! stack) is implemented per platform behind the traits in this crate.
//!
//! ## Traits
//!
//! ### Playback
//! - [`SubscriptionEngine`](engine::SubscriptionEngine) - Managed-queue streaming engine
//! - [`ClipPlayerFactory`](engine::ClipPlayerFactory) / [`ClipPlayer`](engine::ClipPlayer) - Direct-URL audio element
//!
//! ### Service access
//! - [`AuthorizationProvider`](authorization::AuthorizationProvider) - Permission prompt, settings, subscription check
//! - [`MusicTokenProvider`](authorization::MusicTokenProvider) - Developer and user tokens
//! - [`MusicCatalog`](catalog::MusicCatalog) - Catalog lookup and library queries
//! - [`HttpClient`](http::HttpClient) - Single-attempt async HTTP
//!
//! ### Platform Integration
//! - [`LifecycleObserver`](lifecycle::LifecycleObserver) - App foreground/background transitions
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | HTTP, tokens, lifecycle |
//! | iOS      | host application    | Engines and authorization over native SDKs |
//! | Web      | host application    | Engines over the browser SDK and audio element |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc<dyn Trait>`.

pub mod authorization;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod logger;

pub use error::BridgeError;

// Re-export commonly used types
pub use authorization::{
    AppInfo, AuthorizationProvider, AuthorizationStatus, MusicTokenProvider, ServiceConfig,
};
pub use catalog::{
    CatalogSong, LibraryAlbumSummary, LibraryAlbumTrack, LibrarySong, MusicCatalog, Page,
};
pub use engine::{
    ClipEvent, ClipPlayer, ClipPlayerFactory, EnginePlaybackState, QueueItem, SubscriptionEngine,
};
pub use http::{HttpClient, HttpRequest, HttpResponse};
pub use lifecycle::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};

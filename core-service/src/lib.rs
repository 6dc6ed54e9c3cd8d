//! Core service façade.
//!
//! This crate wires host-provided bridge implementations (subscription
//! engine, clip player factory, authorization provider, HTTP client, token
//! source, lifecycle observer) into the shared Rust core and exposes the
//! resulting call surface as [`MusicBridgeService`]. Desktop hosts typically
//! keep the default `desktop-shims` feature, which supplies the HTTP client
//! and environment token provider from `bridge-desktop`.

pub mod error;
pub mod response;
pub mod service;

pub use error::{CoreError, Result};
pub use response::{
    AlbumListRequest, AlbumLookup, AlbumResponse, AlbumsResponse, ResultResponse, SeekRequest,
    SetSongResponse, TimeResponse, VolumeRequest,
};
pub use service::MusicBridgeService;

pub use bridge_traits::{AppInfo, AuthorizationStatus, ServiceConfig};
pub use core_playback::{PlaybackRequest, ResolvedSource};
pub use core_runtime::{BridgeConfig, BridgeConfigBuilder, CoreEvent, EventKind, PlaybackState};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{
    DesktopLifecycleObserver, EnvTokenProvider, ReqwestHttpClient, StaticTokenProvider,
};

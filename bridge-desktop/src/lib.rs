//! # Desktop Bridge Implementations
//!
//! Default implementations of the network-facing bridge traits for desktop
//! hosts (macOS, Windows, Linux) and for integration testing.
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`
//! - `MusicTokenProvider` backed by environment variables or fixed values
//! - `LifecycleObserver` driven manually (desktop processes stay foreground)
//!
//! Audio engines and the authorization prompt have no desktop equivalent and
//! are supplied by the host application.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{EnvTokenProvider, ReqwestHttpClient};
//!
//! let http = Arc::new(ReqwestHttpClient::new()?);
//! let tokens = Arc::new(EnvTokenProvider::new());
//! ```

mod http;
mod lifecycle;
mod tokens;

pub use http::ReqwestHttpClient;
pub use lifecycle::DesktopLifecycleObserver;
pub use tokens::{EnvTokenProvider, StaticTokenProvider, DEVELOPER_TOKEN_ENV, USER_TOKEN_ENV};

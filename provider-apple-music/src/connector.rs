//! Apple Music API connector implementation
//!
//! Implements the `MusicCatalog` trait for the Apple Music API v1.

use async_trait::async_trait;
use bridge_traits::authorization::MusicTokenProvider;
use bridge_traits::catalog::{
    CatalogSong, LibraryAlbumSummary, LibraryAlbumTrack, LibrarySong, MusicCatalog, Page,
};
use bridge_traits::http::{HttpClient, HttpRequest};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{AppleMusicApiError, Result};
use crate::types::{
    ApiErrorBody, DataResponse, LibraryAlbumAttributes, LibrarySongAttributes, Resource,
    SearchResponse, SongAttributes,
};

/// Apple Music API base URL
pub const DEFAULT_API_BASE: &str = "https://api.music.apple.com";

/// Header carrying the per-user token on `/v1/me` endpoints
const USER_TOKEN_HEADER: &str = "Music-User-Token";

const LIBRARY_SONGS_TYPE: &str = "library-songs";
const LIBRARY_ALBUMS_TYPE: &str = "library-albums";

/// Connector settings
#[derive(Debug, Clone)]
pub struct ConnectorSettings {
    pub base_url: String,
    /// Storefront used for catalog lookups, e.g. `us`
    pub storefront: String,
    /// Page size for library searches
    pub search_limit: u32,
    pub request_timeout: Duration,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            storefront: "us".to_string(),
            search_limit: 25,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Apple Music API connector
///
/// # Example
///
/// ```ignore
/// use provider_apple_music::{AppleMusicConnector, ConnectorSettings};
/// use bridge_traits::catalog::MusicCatalog;
///
/// let connector = AppleMusicConnector::new(http_client, tokens, ConnectorSettings::default());
/// let song = connector.catalog_song("1440857781").await?;
/// ```
pub struct AppleMusicConnector {
    http_client: Arc<dyn HttpClient>,
    tokens: Arc<dyn MusicTokenProvider>,
    settings: ConnectorSettings,
}

impl AppleMusicConnector {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        tokens: Arc<dyn MusicTokenProvider>,
        settings: ConnectorSettings,
    ) -> Self {
        Self {
            http_client,
            tokens,
            settings,
        }
    }

    pub fn settings(&self) -> &ConnectorSettings {
        &self.settings
    }

    /// Absolute URL for an API path or a `next` cursor.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Issue one GET and decode the JSON body.
    #[instrument(skip(self))]
    async fn get_json<T: DeserializeOwned>(&self, path: &str, user_scoped: bool) -> Result<T> {
        let developer_token = self.tokens.developer_token().await?;
        let mut request = HttpRequest::get(self.url(path))
            .bearer_token(developer_token)
            .header("Accept", "application/json")
            .timeout(self.settings.request_timeout);

        if user_scoped {
            let user_token = self
                .tokens
                .music_user_token()
                .await?
                .ok_or(AppleMusicApiError::MissingUserToken)?;
            request = request.header(USER_TOKEN_HEADER, user_token);
        }

        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            debug!(status = response.status, "API request succeeded");
            return serde_json::from_slice(&response.body)
                .map_err(|e| AppleMusicApiError::ParseError(e.to_string()));
        }

        let message = serde_json::from_slice::<ApiErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message())
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).to_string());
        warn!(status = response.status, %message, "API request failed");

        Err(match response.status {
            401 | 403 => AppleMusicApiError::AuthenticationFailed(message),
            404 => AppleMusicApiError::NotFound {
                resource: path.to_string(),
            },
            status_code => AppleMusicApiError::ApiError {
                status_code,
                message,
            },
        })
    }

    fn search_path(&self, term: &str, kind: &str) -> String {
        format!(
            "/v1/me/library/search?term={}&types={}&limit={}",
            urlencoding::encode(term),
            kind,
            self.settings.search_limit
        )
    }

    fn convert_catalog_song(resource: Resource<SongAttributes>) -> Result<CatalogSong> {
        let attributes = resource.attributes.ok_or_else(|| {
            AppleMusicApiError::ParseError(format!("song {} has no attributes", resource.id))
        })?;

        Ok(CatalogSong {
            id: resource.id,
            title: attributes.name,
            album_title: attributes.album_name,
            has_play_params: attributes.play_params.is_some(),
            preview_url: attributes.previews.into_iter().next().map(|p| p.url),
        })
    }

    fn convert_library_song(resource: Resource<LibrarySongAttributes>) -> Option<LibrarySong> {
        let attributes = resource.attributes?;
        let params = attributes.play_params;

        Some(LibrarySong {
            id: resource.id,
            title: attributes.name,
            album_title: attributes.album_name,
            purchased_id: params.as_ref().and_then(|p| p.purchased_id.clone()),
            catalog_id: params.and_then(|p| p.catalog_id),
        })
    }

    fn convert_album_track(resource: Resource<LibrarySongAttributes>) -> Option<LibraryAlbumTrack> {
        let attributes = resource.attributes?;

        Some(LibraryAlbumTrack {
            id: resource.id,
            title: attributes.name,
            disc_number: attributes.disc_number,
            track_number: attributes.track_number,
            purchased_id: attributes.play_params.and_then(|p| p.purchased_id),
        })
    }

    fn convert_album(resource: Resource<LibraryAlbumAttributes>) -> Option<LibraryAlbumSummary> {
        let attributes = resource.attributes?;

        Some(LibraryAlbumSummary {
            id: resource.id,
            title: attributes.name,
            artist_name: attributes.artist_name,
            track_count: attributes.track_count,
        })
    }

    async fn search<A: DeserializeOwned>(
        &self,
        term: &str,
        cursor: Option<&str>,
        kind: &str,
    ) -> Result<DataResponse<A>> {
        let path = match cursor {
            Some(next) => next.to_string(),
            None => self.search_path(term, kind),
        };

        let mut response: SearchResponse<A> = self.get_json(&path, true).await?;
        Ok(response.results.remove(kind).unwrap_or(DataResponse {
            data: Vec::new(),
            next: None,
        }))
    }
}

#[async_trait]
impl MusicCatalog for AppleMusicConnector {
    #[instrument(skip(self))]
    async fn catalog_song(&self, song_id: &str) -> bridge_traits::error::Result<CatalogSong> {
        let path = format!(
            "/v1/catalog/{}/songs/{}",
            self.settings.storefront,
            urlencoding::encode(song_id)
        );

        let response: DataResponse<SongAttributes> = self.get_json(&path, false).await?;
        let resource = response
            .data
            .into_iter()
            .next()
            .ok_or(AppleMusicApiError::NotFound { resource: path })?;

        Ok(Self::convert_catalog_song(resource)?)
    }

    #[instrument(skip(self))]
    async fn search_library_songs(
        &self,
        term: &str,
        cursor: Option<&str>,
    ) -> bridge_traits::error::Result<Page<LibrarySong>> {
        let response = self
            .search::<LibrarySongAttributes>(term, cursor, LIBRARY_SONGS_TYPE)
            .await?;

        let items = response
            .data
            .into_iter()
            .filter_map(Self::convert_library_song)
            .collect::<Vec<_>>();
        debug!(hits = items.len(), has_next = response.next.is_some(), "Library song page");

        Ok(Page::new(items, response.next))
    }

    #[instrument(skip(self))]
    async fn library_albums(
        &self,
        limit: u32,
        offset: u32,
    ) -> bridge_traits::error::Result<Page<LibraryAlbumSummary>> {
        let path = format!("/v1/me/library/albums?limit={}&offset={}", limit, offset);
        let response: DataResponse<LibraryAlbumAttributes> = self.get_json(&path, true).await?;

        let items = response
            .data
            .into_iter()
            .filter_map(Self::convert_album)
            .collect();

        Ok(Page::new(items, response.next))
    }

    #[instrument(skip(self))]
    async fn search_library_albums(
        &self,
        term: &str,
        cursor: Option<&str>,
    ) -> bridge_traits::error::Result<Page<LibraryAlbumSummary>> {
        let response = self
            .search::<LibraryAlbumAttributes>(term, cursor, LIBRARY_ALBUMS_TYPE)
            .await?;

        let items = response
            .data
            .into_iter()
            .filter_map(Self::convert_album)
            .collect();

        Ok(Page::new(items, response.next))
    }

    #[instrument(skip(self))]
    async fn library_album(&self, album_id: &str) -> bridge_traits::error::Result<LibraryAlbumSummary> {
        let path = format!("/v1/me/library/albums/{}", urlencoding::encode(album_id));
        let response: DataResponse<LibraryAlbumAttributes> = self.get_json(&path, true).await?;

        let album = response
            .data
            .into_iter()
            .next()
            .and_then(Self::convert_album)
            .ok_or(AppleMusicApiError::NotFound { resource: path })?;

        Ok(album)
    }

    #[instrument(skip(self))]
    async fn library_album_tracks(
        &self,
        album_id: &str,
        cursor: Option<&str>,
    ) -> bridge_traits::error::Result<Page<LibraryAlbumTrack>> {
        let path = match cursor {
            Some(next) => next.to_string(),
            None => format!(
                "/v1/me/library/albums/{}/tracks",
                urlencoding::encode(album_id)
            ),
        };

        let response: DataResponse<LibrarySongAttributes> = self.get_json(&path, true).await?;
        let items = response
            .data
            .into_iter()
            .filter_map(Self::convert_album_track)
            .collect();

        Ok(Page::new(items, response.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    struct FixedTokens {
        user: Option<String>,
    }

    #[async_trait]
    impl MusicTokenProvider for FixedTokens {
        async fn developer_token(&self) -> bridge_traits::error::Result<String> {
            Ok("dev_token".to_string())
        }

        async fn music_user_token(&self) -> bridge_traits::error::Result<Option<String>> {
            Ok(self.user.clone())
        }
    }

    fn json_response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.as_bytes()),
        }
    }

    fn connector(mock_http: MockHttpClient) -> AppleMusicConnector {
        AppleMusicConnector::new(
            Arc::new(mock_http),
            Arc::new(FixedTokens {
                user: Some("user_token".to_string()),
            }),
            ConnectorSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_catalog_song_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.url == "https://api.music.apple.com/v1/catalog/us/songs/1440857781"
                    && request.headers.get("Authorization") == Some(&"Bearer dev_token".to_string())
                    && !request.headers.contains_key(USER_TOKEN_HEADER)
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{
                        "data": [{
                            "id": "1440857781",
                            "type": "songs",
                            "attributes": {
                                "name": "Song",
                                "albumName": "Album",
                                "playParams": {"id": "1440857781", "kind": "song"},
                                "previews": [{"url": "https://audio.example.com/preview.m4a"}]
                            }
                        }]
                    }"#,
                ))
            });

        let song = connector(mock_http)
            .catalog_song("1440857781")
            .await
            .unwrap();

        assert_eq!(song.title, "Song");
        assert_eq!(song.album_title.as_deref(), Some("Album"));
        assert!(song.is_playable());
        assert_eq!(
            song.preview_url.as_deref(),
            Some("https://audio.example.com/preview.m4a")
        );
    }

    #[tokio::test]
    async fn test_catalog_song_without_play_params_is_not_playable() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                200,
                r#"{"data": [{"id": "1", "type": "songs", "attributes": {"name": "Song"}}]}"#,
            ))
        });

        let song = connector(mock_http).catalog_song("1").await.unwrap();
        assert!(!song.is_playable());
        assert_eq!(song.preview_url, None);
    }

    #[tokio::test]
    async fn test_catalog_song_not_found() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                404,
                r#"{"errors": [{"status": "404", "title": "Resource Not Found"}]}"#,
            ))
        });

        let err = connector(mock_http).catalog_song("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_search_library_songs_first_page() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.url
                    == "https://api.music.apple.com/v1/me/library/search?term=Hello%20World&types=library-songs&limit=25"
                    && request.headers.get(USER_TOKEN_HEADER) == Some(&"user_token".to_string())
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{
                        "results": {
                            "library-songs": {
                                "data": [{
                                    "id": "i.abc",
                                    "type": "library-songs",
                                    "attributes": {
                                        "name": "Hello World",
                                        "albumName": "Album",
                                        "playParams": {"id": "i.abc", "kind": "song", "isLibrary": true, "purchasedId": "42"}
                                    }
                                }],
                                "next": "/v1/me/library/search?offset=25&term=Hello%20World&types=library-songs"
                            }
                        }
                    }"#,
                ))
            });

        let page = connector(mock_http)
            .search_library_songs("Hello World", None)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].purchased_id.as_deref(), Some("42"));
        assert!(page.has_next());
    }

    #[tokio::test]
    async fn test_search_follows_cursor_verbatim() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.url
                    == "https://api.music.apple.com/v1/me/library/search?offset=25&term=x&types=library-songs"
            })
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"results": {}}"#)));

        let page = connector(mock_http)
            .search_library_songs(
                "x",
                Some("/v1/me/library/search?offset=25&term=x&types=library-songs"),
            )
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_library_requests_require_user_token() {
        let mock_http = MockHttpClient::new();
        let connector = AppleMusicConnector::new(
            Arc::new(mock_http),
            Arc::new(FixedTokens { user: None }),
            ConnectorSettings::default(),
        );

        let err = connector.library_albums(25, 0).await.unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }

    #[tokio::test]
    async fn test_library_album_tracks() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .withf(|request| {
                request.url == "https://api.music.apple.com/v1/me/library/albums/l.xyz/tracks"
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(
                    200,
                    r#"{
                        "data": [
                            {"id": "i.1", "type": "library-songs", "attributes": {"name": "One", "discNumber": 1, "trackNumber": 1, "playParams": {"id": "i.1", "purchasedId": "11"}}},
                            {"id": "i.2", "type": "library-songs", "attributes": {"name": "Two", "discNumber": 1, "trackNumber": 2, "playParams": {"id": "i.2"}}}
                        ]
                    }"#,
                ))
            });

        let page = connector(mock_http)
            .library_album_tracks("l.xyz", None)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].purchased_id.as_deref(), Some("11"));
        assert_eq!(page.items[1].purchased_id, None);
        assert_eq!(page.items[1].track_number, Some(2));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(503, "unavailable")));

        let err = connector(mock_http).library_albums(25, 0).await.unwrap_err();
        assert!(matches!(err, BridgeError::OperationFailed(msg) if msg.contains("503")));
    }
}

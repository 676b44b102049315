//! Authenticated JSON-over-HTTP plumbing shared by the OpenStack clients.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::backend::{BlockStorageError, CatalogError, ComputeError, ObjectStorageError};

const AUTH_HEADER: &str = "X-Auth-Token";

/// Failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub(crate) enum HttpFailure {
    /// The endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    Url(String),
    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Error families that can be produced from an HTTP failure.
pub(crate) trait FromHttp: Sized {
    fn not_found(resource: &str, id: &str) -> Self;
    fn provider(message: String) -> Self;
}

impl HttpFailure {
    const fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }

    /// Maps a 404 to the family's not-found error for `resource`/`id`.
    pub(crate) fn lookup<E: FromHttp>(self, resource: &str, id: &str) -> E {
        if self.is_not_found() {
            E::not_found(resource, id)
        } else {
            E::provider(self.to_string())
        }
    }

    /// Maps every failure, 404 included, to a provider error.
    pub(crate) fn provider<E: FromHttp>(self) -> E {
        E::provider(self.to_string())
    }
}

macro_rules! from_http_with_not_found {
    ($($family:ident),+ $(,)?) => {
        $(
            impl FromHttp for $family {
                fn not_found(resource: &str, id: &str) -> Self {
                    Self::NotFound {
                        resource: resource.to_owned(),
                        id: id.to_owned(),
                    }
                }

                fn provider(message: String) -> Self {
                    Self::Provider { message }
                }
            }
        )+
    };
}

from_http_with_not_found!(ComputeError, BlockStorageError, ObjectStorageError);

impl FromHttp for CatalogError {
    fn not_found(resource: &str, id: &str) -> Self {
        Self::Provider {
            message: format!("{resource} {id} not found"),
        }
    }

    fn provider(message: String) -> Self {
        Self::Provider { message }
    }
}

/// HTTP client bound to one service endpoint and token.
#[derive(Clone)]
pub(crate) struct RestClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl RestClient {
    pub(crate) fn new(
        endpoint: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, HttpFailure> {
        let base = Url::parse(endpoint).map_err(|err| HttpFailure::Url(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(HttpFailure::Url(format!("{endpoint} cannot be a base URL")));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| HttpFailure::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base,
            token: token.to_owned(),
        })
    }

    /// Appends percent-encoded path segments to the endpoint.
    fn url(&self, segments: &[&str]) -> Result<Url, HttpFailure> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| HttpFailure::Url(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, HttpFailure> {
        let url = self.url(segments)?;
        debug!(%method, %url, "openstack request");
        Ok(self
            .http
            .request(method, url)
            .header(AUTH_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn send(request: RequestBuilder) -> Result<Response, HttpFailure> {
        let response = request
            .send()
            .await
            .map_err(|err| HttpFailure::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HttpFailure::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HttpFailure> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| HttpFailure::Transport(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| HttpFailure::Decode(err.to_string()))
    }

    /// GETs `segments` with `query` parameters and decodes the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, HttpFailure> {
        let request = self.request(Method::GET, segments)?.query(query);
        Self::decode(Self::send(request).await?).await
    }

    /// GETs a JSON array; an empty or `204 No Content` body is an empty list.
    pub(crate) async fn get_json_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Vec<T>, HttpFailure> {
        let request = self.request(Method::GET, segments)?.query(query);
        let response = Self::send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| HttpFailure::Transport(err.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|err| HttpFailure::Decode(err.to_string()))
    }

    /// POSTs a JSON body and decodes the JSON response.
    pub(crate) async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> Result<T, HttpFailure>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, segments)?.json(body);
        Self::decode(Self::send(request).await?).await
    }

    /// POSTs a JSON body and discards the response.
    pub(crate) async fn post_unit<B>(&self, segments: &[&str], body: &B) -> Result<(), HttpFailure>
    where
        B: Serialize + Sync,
    {
        let request = self.request(Method::POST, segments)?.json(body);
        Self::send(request).await.map(drop)
    }

    /// PUTs raw bytes.
    pub(crate) async fn put_bytes(
        &self,
        segments: &[&str],
        content: Vec<u8>,
    ) -> Result<(), HttpFailure> {
        let request = self.request(Method::PUT, segments)?.body(content);
        Self::send(request).await.map(drop)
    }

    /// GETs a body as raw bytes.
    pub(crate) async fn get_bytes(&self, segments: &[&str]) -> Result<Vec<u8>, HttpFailure> {
        let response = Self::send(self.request(Method::GET, segments)?).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| HttpFailure::Transport(err.to_string()))
    }

    /// Sends a DELETE.
    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<(), HttpFailure> {
        Self::send(self.request(Method::DELETE, segments)?)
            .await
            .map(drop)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Builds `limit`/`marker` query parameters.
pub(crate) fn paging_query(limit: Option<usize>, marker: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(marker) = marker {
        query.push(("marker", marker.to_owned()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn client(endpoint: &str) -> RestClient {
        RestClient::new(endpoint, "token", Duration::from_secs(5)).expect("client")
    }

    #[rstest]
    #[case("https://nova.example/v2.1", &["servers", "detail"], "https://nova.example/v2.1/servers/detail")]
    #[case("https://nova.example/v2.1/", &["servers"], "https://nova.example/v2.1/servers")]
    #[case("https://swift.example/v1/AUTH_p", &["media", "a b/c"], "https://swift.example/v1/AUTH_p/media/a%20b%2Fc")]
    fn segments_are_appended(#[case] endpoint: &str, #[case] segments: &[&str], #[case] expected: &str) {
        let url = client(endpoint).url(segments).expect("url");
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    fn relative_endpoint_is_rejected() {
        let result = RestClient::new("nova/v2.1", "token", Duration::from_secs(5));
        assert!(matches!(result, Err(HttpFailure::Url(_))));
    }

    #[rstest]
    fn only_404_becomes_not_found() {
        let missing = HttpFailure::Status {
            status: 404,
            body: String::new(),
        };
        assert!(matches!(
            missing.lookup::<ComputeError>("server", "srv-1"),
            ComputeError::NotFound { .. }
        ));
        let conflict = HttpFailure::Status {
            status: 409,
            body: String::from("busy"),
        };
        assert_eq!(
            conflict.lookup::<ObjectStorageError>("container", "media"),
            ObjectStorageError::Provider {
                message: String::from("HTTP 409: busy"),
            }
        );
    }

    #[rstest]
    #[case(None, None, 0)]
    #[case(Some(3), None, 1)]
    #[case(Some(3), Some("srv-2"), 2)]
    fn paging_query_includes_set_values(
        #[case] limit: Option<usize>,
        #[case] marker: Option<&str>,
        #[case] expected: usize,
    ) {
        assert_eq!(paging_query(limit, marker).len(), expected);
    }
}

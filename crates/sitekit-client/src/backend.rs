//! The backend API seam.
//!
//! Controllers talk to the site only through [`Backend`]. [`HttpBackend`] is
//! the real implementation over `reqwest`; tests substitute their own.

use reqwest::header::COOKIE;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::endpoint::{self, Auth, BodyKind, Endpoint, Method, Reply, SITE_COOKIE_NAME};
use crate::error::{ApiError, ConfigError};
use crate::session::{AccessToken, SiteCookie};
use crate::types::{
    Ack, BlogPost, ContactRequest, ContactResponse, FormData, HealthReport, ImageFile,
    LoginRequest, LoginResponse, QuoteRequest, UploadResponse, error_message,
};

/// Every backend operation the controllers use. One call per method, no
/// retries.
#[async_trait::async_trait]
pub trait Backend: Send + Sync + 'static {
    /// `POST /api/login`.
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// `POST /admin/login` as a form. Returns the `admin_user_id` cookie
    /// from the redirect, or `None` when the site re-rendered the login page
    /// instead.
    async fn site_login(&self, request: &LoginRequest) -> Result<Option<SiteCookie>, ApiError>;

    /// `GET /api/admin/blogs` with a bearer token.
    async fn list_blogs(&self, token: &AccessToken) -> Result<Vec<BlogPost>, ApiError>;

    /// `POST /api/admin/blog` with a bearer token and the raw form fields.
    async fn create_blog(&self, token: &AccessToken, fields: &FormData) -> Result<Ack, ApiError>;

    /// `POST /admin/upload-image` as multipart field `file`, carrying the
    /// site cookie when there is one.
    async fn upload_image(
        &self,
        file: &ImageFile,
        site_cookie: Option<&SiteCookie>,
    ) -> Result<UploadResponse, ApiError>;

    /// `POST /api/request-quote`.
    async fn request_quote(&self, request: &QuoteRequest) -> Result<(), ApiError>;

    /// `POST /api/contact`.
    async fn contact(&self, request: &ContactRequest) -> Result<ContactResponse, ApiError>;

    /// `GET /api/health`.
    async fn health(&self) -> Result<HealthReport, ApiError>;
}

/// Request content. How it is encoded comes from [`Endpoint::body`].
enum Payload<'a> {
    None,
    Fields(Value),
    File(&'a ImageFile),
}

/// Credentials on hand for a request. Which one is sent comes from
/// [`Endpoint::auth`].
#[derive(Default, Clone, Copy)]
struct Credentials<'a> {
    token: Option<&'a AccessToken>,
    site_cookie: Option<&'a SiteCookie>,
}

impl<'a> Credentials<'a> {
    fn token(token: &'a AccessToken) -> Self {
        Self {
            token: Some(token),
            ..Self::default()
        }
    }

    fn site_cookie(site_cookie: Option<&'a SiteCookie>) -> Self {
        Self {
            site_cookie,
            ..Self::default()
        }
    }
}

/// [`Backend`] over HTTP.
///
/// Keeps no cookie jar and never follows redirects: the site cookie is read
/// off the form login's redirect and sent back explicitly from the session.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Build and send one request as `endpoint` describes it. Returns the
    /// response once its status is a success for the endpoint's [`Reply`].
    async fn send(
        &self,
        endpoint: &Endpoint,
        credentials: Credentials<'_>,
        payload: Payload<'_>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(endpoint.path);
        debug!(method = endpoint.method.as_str(), path = endpoint.path, "request");

        let mut req = match endpoint.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };

        match endpoint.auth {
            Auth::None => {}
            Auth::Bearer => {
                let token = credentials.token.ok_or(ApiError::MissingToken {
                    path: endpoint.path,
                })?;
                req = req.bearer_auth(token.as_str());
            }
            Auth::SiteCookie => match credentials.site_cookie {
                Some(cookie) => {
                    req = req.header(COOKIE, format!("{SITE_COOKIE_NAME}={}", cookie.as_str()));
                }
                None => debug!(path = endpoint.path, "no site cookie stored"),
            },
        }

        req = match (endpoint.body, payload) {
            (BodyKind::Empty, Payload::None) => req,
            (BodyKind::Json, Payload::Fields(value)) => req.json(&value),
            (BodyKind::Form, Payload::Fields(value)) => req.form(&value),
            (BodyKind::Multipart, Payload::File(file)) => {
                let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                    .file_name(file.file_name.clone())
                    .mime_str(&file.content_type)
                    .map_err(|e| ApiError::Encode(e.to_string()))?;
                req.multipart(reqwest::multipart::Form::new().part("file", part))
            }
            (kind, _) => {
                return Err(ApiError::Encode(format!(
                    "{} {} takes a {kind:?} body",
                    endpoint.method.as_str(),
                    endpoint.path
                )));
            }
        };

        let resp = req.send().await.map_err(transport_error)?;
        let status = resp.status();
        let accepted = match endpoint.reply {
            Reply::Json => status.is_success(),
            Reply::Redirect => status.is_success() || status.is_redirection(),
        };
        if accepted {
            return Ok(resp);
        }

        let text = resp.text().await.map_err(transport_error)?;
        let message = error_message(&text);
        warn!(
            path = endpoint.path,
            status = status.as_u16(),
            message = message.as_deref().unwrap_or(""),
            "request failed"
        );
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }

    /// [`send`](Self::send), then decode the JSON body. An empty body does
    /// not decode.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        credentials: Credentials<'_>,
        payload: Payload<'_>,
    ) -> Result<T, ApiError> {
        let resp = self.send(endpoint, credentials, payload).await?;
        let text = resp.text().await.map_err(transport_error)?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(path = endpoint.path, error = %e, "malformed response body");
            ApiError::Decode(e.to_string())
        })
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

fn to_fields<T: serde::Serialize>(value: &T) -> Result<Payload<'static>, ApiError> {
    serde_json::to_value(value)
        .map(Payload::Fields)
        .map_err(|e| ApiError::Encode(e.to_string()))
}

#[async_trait::async_trait]
impl Backend for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.call(&endpoint::LOGIN, Credentials::default(), to_fields(request)?)
            .await
    }

    async fn site_login(&self, request: &LoginRequest) -> Result<Option<SiteCookie>, ApiError> {
        let resp = self
            .send(&endpoint::SITE_LOGIN, Credentials::default(), to_fields(request)?)
            .await?;
        let cookie = resp
            .cookies()
            .find(|c| c.name() == SITE_COOKIE_NAME && !c.value().is_empty())
            .map(|c| SiteCookie::new(c.value()));
        if cookie.is_none() {
            warn!(
                status = resp.status().as_u16(),
                "site login set no {SITE_COOKIE_NAME} cookie"
            );
        }
        Ok(cookie)
    }

    async fn list_blogs(&self, token: &AccessToken) -> Result<Vec<BlogPost>, ApiError> {
        self.call(&endpoint::LIST_BLOGS, Credentials::token(token), Payload::None)
            .await
    }

    async fn create_blog(&self, token: &AccessToken, fields: &FormData) -> Result<Ack, ApiError> {
        self.call(&endpoint::CREATE_BLOG, Credentials::token(token), to_fields(fields)?)
            .await
    }

    async fn upload_image(
        &self,
        file: &ImageFile,
        site_cookie: Option<&SiteCookie>,
    ) -> Result<UploadResponse, ApiError> {
        self.call(
            &endpoint::UPLOAD_IMAGE,
            Credentials::site_cookie(site_cookie),
            Payload::File(file),
        )
        .await
    }

    async fn request_quote(&self, request: &QuoteRequest) -> Result<(), ApiError> {
        self.call::<serde::de::IgnoredAny>(
            &endpoint::REQUEST_QUOTE,
            Credentials::default(),
            to_fields(request)?,
        )
        .await
        .map(|_| ())
    }

    async fn contact(&self, request: &ContactRequest) -> Result<ContactResponse, ApiError> {
        self.call(&endpoint::CONTACT, Credentials::default(), to_fields(request)?)
            .await
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        self.call(&endpoint::HEALTH, Credentials::default(), Payload::None)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unreachable_backend() -> HttpBackend {
        // Port 9 (discard) is never dialed: these checks come first.
        let cfg = ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .unwrap();
        HttpBackend::new(&cfg).unwrap()
    }

    #[test]
    fn url_joins_base_and_path() {
        let cfg = ClientConfig::default()
            .with_base_url("https://site.test/")
            .unwrap();
        let backend = HttpBackend::new(&cfg).unwrap();
        assert_eq!(backend.url(endpoint::LOGIN.path), "https://site.test/api/login");
    }

    #[tokio::test]
    async fn bearer_endpoint_without_token_fails_before_sending() {
        let err = unreachable_backend()
            .call::<Value>(&endpoint::LIST_BLOGS, Credentials::default(), Payload::None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::MissingToken {
                path: "/api/admin/blogs"
            }
        );
    }

    #[tokio::test]
    async fn payload_must_match_endpoint_body() {
        let err = unreachable_backend()
            .call::<Value>(&endpoint::UPLOAD_IMAGE, Credentials::default(), Payload::None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Encode("POST /admin/upload-image takes a Multipart body".to_owned())
        );
    }

    #[test]
    fn only_upload_sends_the_site_cookie() {
        for ep in [
            endpoint::LOGIN,
            endpoint::SITE_LOGIN,
            endpoint::CREATE_BLOG,
            endpoint::LIST_BLOGS,
            endpoint::REQUEST_QUOTE,
            endpoint::CONTACT,
            endpoint::HEALTH,
        ] {
            assert_ne!(ep.auth, Auth::SiteCookie, "{}", ep.path);
        }
        assert_eq!(endpoint::UPLOAD_IMAGE.auth, Auth::SiteCookie);
        assert_eq!(endpoint::SITE_LOGIN.reply, Reply::Redirect);
    }
}

//! Backend endpoint descriptors and fixed site paths.
//!
//! [`HttpBackend`](crate::backend::HttpBackend) reads every descriptor field:
//! the method and path build the request, `auth` picks the credential, `body`
//! picks the encoding, and `reply` decides which statuses count as success
//! and whether the body is decoded.

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Credentials attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Nothing beyond what the client always sends.
    None,
    /// `Authorization: Bearer <token>` from the session. Required.
    Bearer,
    /// `Cookie: admin_user_id=<value>` from the session, when one is stored.
    /// The server decides what to do without it.
    SiteCookie,
}

/// Request body encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Empty,
    Json,
    /// `application/x-www-form-urlencoded`.
    Form,
    Multipart,
}

/// What a successful reply looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// 2xx with a JSON body. An empty body is a decode error.
    Json,
    /// 2xx or 3xx; the body is ignored and redirects are not followed.
    Redirect,
}

/// One backend operation: where it lives and how it is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: &'static str,
    pub auth: Auth,
    pub body: BodyKind,
    pub reply: Reply,
}

/// Name of the cookie the site's admin pages and image upload check.
pub const SITE_COOKIE_NAME: &str = "admin_user_id";

/// `POST /api/login`: `{email, password}` → `{success, access_token, user, message}`.
pub const LOGIN: Endpoint = Endpoint {
    method: Method::Post,
    path: "/api/login",
    auth: Auth::None,
    body: BodyKind::Json,
    reply: Reply::Json,
};

/// `POST /admin/login`: form `email`, `password` → 302 to the dashboard with
/// `Set-Cookie: admin_user_id=...`, or 200 with the login page re-rendered.
pub const SITE_LOGIN: Endpoint = Endpoint {
    method: Method::Post,
    path: "/admin/login",
    auth: Auth::None,
    body: BodyKind::Form,
    reply: Reply::Redirect,
};

/// `POST /api/admin/blog`: raw form fields → `{success, message}`.
pub const CREATE_BLOG: Endpoint = Endpoint {
    method: Method::Post,
    path: "/api/admin/blog",
    auth: Auth::Bearer,
    body: BodyKind::Json,
    reply: Reply::Json,
};

/// `GET /api/admin/blogs` → `[{_id, title, slug, created_at, ...}]`.
pub const LIST_BLOGS: Endpoint = Endpoint {
    method: Method::Get,
    path: "/api/admin/blogs",
    auth: Auth::Bearer,
    body: BodyKind::Empty,
    reply: Reply::Json,
};

/// `POST /admin/upload-image`: multipart field `file` → `{url}` or `{detail}`.
pub const UPLOAD_IMAGE: Endpoint = Endpoint {
    method: Method::Post,
    path: "/admin/upload-image",
    auth: Auth::SiteCookie,
    body: BodyKind::Multipart,
    reply: Reply::Json,
};

/// `POST /api/request-quote`: lead fields → 201 `{success, message, lead_id}` or `{detail}`.
pub const REQUEST_QUOTE: Endpoint = Endpoint {
    method: Method::Post,
    path: "/api/request-quote",
    auth: Auth::None,
    body: BodyKind::Json,
    reply: Reply::Json,
};

/// `POST /api/contact`: `{name, email, subject, message}` → `{message}` or `{detail}`.
pub const CONTACT: Endpoint = Endpoint {
    method: Method::Post,
    path: "/api/contact",
    auth: Auth::None,
    body: BodyKind::Json,
    reply: Reply::Json,
};

/// `GET /api/health` → `{status, service, db_connected}`.
pub const HEALTH: Endpoint = Endpoint {
    method: Method::Get,
    path: "/api/health",
    auth: Auth::None,
    body: BodyKind::Empty,
    reply: Reply::Json,
};

/// Where a successful login navigates to.
pub const ADMIN_DASHBOARD_PATH: &str = "/admin/dashboard";

/// Where the admin gate sends callers without a token.
pub const LOGIN_PAGE_PATH: &str = "/admin/login";

//! Scripted [`Backend`] for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use crate::backend::Backend;
use crate::error::ApiError;
use crate::session::{AccessToken, SiteCookie};
use crate::types::{
    Ack, BlogPost, ContactRequest, ContactResponse, FormData, HealthReport, ImageFile,
    LoginRequest, LoginResponse, QuoteRequest, UploadResponse,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Login { email: String, password: String },
    SiteLogin { email: String },
    ListBlogs { token: String },
    CreateBlog { token: String, fields: FormData },
    UploadImage {
        file_name: String,
        size: usize,
        site_cookie: Option<String>,
    },
    RequestQuote(QuoteRequest),
    Contact(ContactRequest),
    Health,
}

fn unscripted<T>() -> Result<T, ApiError> {
    Err(ApiError::Transport("no scripted response".to_owned()))
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    pub login: Mutex<Option<Result<LoginResponse, ApiError>>>,
    pub site_login: Mutex<Option<Result<Option<SiteCookie>, ApiError>>>,
    pub list_blogs: Mutex<Option<Result<Vec<BlogPost>, ApiError>>>,
    pub create_blog: Mutex<Option<Result<Ack, ApiError>>>,
    pub upload_image: Mutex<Option<Result<UploadResponse, ApiError>>>,
    pub request_quote: Mutex<Option<Result<(), ApiError>>>,
    pub contact: Mutex<Option<Result<ContactResponse, ApiError>>>,
}

impl FakeBackend {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted<T: Clone>(slot: &Mutex<Option<Result<T, ApiError>>>) -> Result<T, ApiError> {
        slot.lock().unwrap().clone().unwrap_or_else(unscripted)
    }
}

#[async_trait::async_trait]
impl Backend for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.record(Call::Login {
            email: request.email.clone(),
            password: request.password.clone(),
        });
        Self::scripted(&self.login)
    }

    async fn site_login(&self, request: &LoginRequest) -> Result<Option<SiteCookie>, ApiError> {
        self.record(Call::SiteLogin {
            email: request.email.clone(),
        });
        Self::scripted(&self.site_login)
    }

    async fn list_blogs(&self, token: &AccessToken) -> Result<Vec<BlogPost>, ApiError> {
        self.record(Call::ListBlogs {
            token: token.as_str().to_owned(),
        });
        Self::scripted(&self.list_blogs)
    }

    async fn create_blog(&self, token: &AccessToken, fields: &FormData) -> Result<Ack, ApiError> {
        self.record(Call::CreateBlog {
            token: token.as_str().to_owned(),
            fields: fields.clone(),
        });
        Self::scripted(&self.create_blog)
    }

    async fn upload_image(
        &self,
        file: &ImageFile,
        site_cookie: Option<&SiteCookie>,
    ) -> Result<UploadResponse, ApiError> {
        self.record(Call::UploadImage {
            file_name: file.file_name.clone(),
            size: file.size(),
            site_cookie: site_cookie.map(|c| c.as_str().to_owned()),
        });
        Self::scripted(&self.upload_image)
    }

    async fn request_quote(&self, request: &QuoteRequest) -> Result<(), ApiError> {
        self.record(Call::RequestQuote(request.clone()));
        Self::scripted(&self.request_quote)
    }

    async fn contact(&self, request: &ContactRequest) -> Result<ContactResponse, ApiError> {
        self.record(Call::Contact(request.clone()));
        Self::scripted(&self.contact)
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        self.record(Call::Health);
        unscripted()
    }
}

//! HTTP client for the content server's animal endpoints.

use crate::error::SubmissionError;
use crate::payload::AnimalPayload;
use log::{debug, info};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::future::Future;

/// Where animal records live on the content server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base_url: String,
}

impl Endpoints {
    /// `base_url` should be like `http://localhost:5000`; a trailing slash is dropped.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn collection(&self) -> String {
        format!("{}/api/animals/", self.base_url)
    }

    pub fn item(&self, id: &str) -> String {
        format!("{}{}", self.collection(), id)
    }
}

/// What the server sent back. Only `error` changes the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub id: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub body: Value,
}

impl ApiResponse {
    /// An empty body (e.g. `204 No Content`) reads as `null`.
    pub fn from_body(text: &str) -> Result<Self, serde_json::Error> {
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text)?
        };
        let string_field = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

        let id = string_field("_id");
        let message = string_field("message");
        let error = string_field("error");

        Ok(Self {
            id,
            message,
            error,
            body,
        })
    }
}

/// Transport for record submissions and deletions.
pub trait Backend {
    fn submit(
        &self,
        method: Method,
        url: &str,
        payload: AnimalPayload,
    ) -> impl Future<Output = Result<ApiResponse, SubmissionError>>;

    fn delete(&self, url: &str) -> impl Future<Output = Result<ApiResponse, SubmissionError>>;
}

pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: RequestBuilder) -> Result<ApiResponse, SubmissionError> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SubmissionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let response = ApiResponse::from_body(&body)?;
        if let Some(error) = &response.error {
            return Err(SubmissionError::Rejected(error.clone()));
        }
        debug!("Server response: {}", response.body);
        Ok(response)
    }
}

impl Backend for HttpBackend {
    async fn submit(
        &self,
        method: Method,
        url: &str,
        payload: AnimalPayload,
    ) -> Result<ApiResponse, SubmissionError> {
        info!("{} {} ({})", method, url, payload.image().file_name);
        debug!("Fields: {:?}", payload.fields().collect::<Vec<_>>());
        let form = payload.into_form()?;
        self.send(self.client.request(method, url).multipart(form))
            .await
    }

    async fn delete(&self, url: &str) -> Result<ApiResponse, SubmissionError> {
        info!("DELETE {}", url);
        self.send(self.client.delete(url)).await
    }
}

//! HTTP client for uploading documents to a lexstack server.

use lexstack_core::{ClassifyResponse, ErrorBody};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with an `{"error": ..}` body.
    #[error("{0}")]
    Api(String),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct ClassifyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ClassifyClient {
    /// Create a client for a server such as `http://localhost:8000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /`: the server's status message.
    pub async fn status(&self) -> Result<Value, ClientError> {
        let resp = self.client.get(format!("{}/", self.base_url)).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Upload a document to `POST /predict`.
    pub async fn classify(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ClassifyResponse, ClientError> {
        let url = format!("{}/predict", self.base_url);
        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_string()));

        info!(url = %url, filename, "uploading document");
        let resp = self.client.post(&url).multipart(form).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        let response = decode(status, &body)?;
        info!(
            prediction = %response.result.prediction,
            confidence = response.result.confidence,
            "classified"
        );
        Ok(response)
    }
}

/// Interpret a `/predict` response. An `{"error": ..}` body is an API error
/// whatever the status code.
fn decode(status: u16, body: &str) -> Result<ClassifyResponse, ClientError> {
    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return Err(ClientError::Api(err.error));
    }
    if !(200..300).contains(&status) {
        return Err(ClientError::Server {
            status,
            body: body.to_string(),
        });
    }
    Ok(serde_json::from_str(body)?)
}

//! HTTP transport for the controller values API
//!
//! The controller ships with a self-signed certificate, so certificate
//! validation is turned off for every request.

use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use crate::error::TransportError;

/// Blocking request/response exchange with the controller.
///
/// Implementations return the response body of 2xx replies and
/// `TransportError::Status` for anything else.
pub trait Transport: Send + Sync {
    fn get(&self, url: &Url) -> Result<String, TransportError>;

    fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<String, TransportError>;
}

/// `reqwest` backed transport.
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(true); // Self-signed certs
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
        })
    }

    fn finish(response: reqwest::blocking::Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text()?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        let response = self.http_client.get(url.clone()).send()?;
        Self::finish(response)
    }

    fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<String, TransportError> {
        let response = self
            .http_client
            .post(url.clone())
            .header("Content-Type", "application/json")
            .json(body)
            .send()?;
        Self::finish(response)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        (**self).get(url)
    }

    fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<String, TransportError> {
        (**self).post_json(url, body)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(&self, url: &Url) -> Result<String, TransportError> {
        (**self).get(url)
    }

    fn post_json(&self, url: &Url, body: &serde_json::Value) -> Result<String, TransportError> {
        (**self).post_json(url, body)
    }
}

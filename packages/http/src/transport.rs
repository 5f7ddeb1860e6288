//! HTTP transport abstraction.
//!
//! A [`Transport`] takes a fully-formed request and returns a promise of the
//! response. [`ReqwestTransport`] performs real exchanges; the
//! [`StubTransport`](crate::StubTransport) answers from scripted
//! expectations so request-layer code can be tested without a network.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use seeclickfix_promise::{default_context, Context, Promise};

use crate::error::Error;
use crate::types::{HttpRequest, HttpResponse};

/// Submits HTTP requests.
///
/// The returned promise is fulfilled with whatever response the server
/// sent, whatever its status code, and rejected only when no response was
/// obtained. Status interpretation belongs to the caller.
pub trait Transport: Send + Sync {
    fn submit(&self, request: HttpRequest) -> Promise<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn submit(&self, request: HttpRequest) -> Promise<HttpResponse> {
        (**self).submit(request)
    }
}

/// Production transport using reqwest's blocking client.
///
/// Each request runs to completion on the transport's execution context
/// (the shared worker pool unless configured otherwise).
pub struct ReqwestTransport {
    client: Client,
    context: Context,
}

impl ReqwestTransport {
    /// Create a new transport with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(Duration::from_secs(30))
    }

    /// Wrap a preconfigured client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            context: default_context(),
        }
    }

    /// Run requests on `context` instead of the default worker pool.
    pub fn on_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl Transport for ReqwestTransport {
    fn submit(&self, request: HttpRequest) -> Promise<HttpResponse> {
        let client = self.client.clone();
        Promise::spawn_on(&self.context, move |resolver| {
            debug!(method = %request.method, url = %request.url, "submitting request");
            let outcome = execute(&client, &request);
            match &outcome {
                Ok(response) => debug!(url = %request.url, status = response.status, "response received"),
                Err(error) => debug!(url = %request.url, %error, "request failed"),
            }
            resolver.complete(outcome);
            Ok::<(), Infallible>(())
        })
    }
}

fn execute(client: &Client, request: &HttpRequest) -> Result<HttpResponse, Error> {
    let method: http::Method = request.method.into();

    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        let header_name = HeaderName::try_from(name.as_str())?;
        let header_value = HeaderValue::try_from(value.as_str())?;
        headers.insert(header_name, header_value);
    }

    let mut req_builder = client.request(method, request.url.clone());
    req_builder = req_builder.headers(headers);

    if let Some(body) = &request.body {
        req_builder = req_builder.body(body.clone());
    }

    let response = req_builder.send()?;

    let status = response.status().as_u16();
    let status_text = response
        .status()
        .canonical_reason()
        .unwrap_or("Unknown")
        .to_string();

    let mut resp_headers = std::collections::BTreeMap::new();
    for (name, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            resp_headers.insert(name.to_string(), v.to_string());
        }
    }

    let body = response.bytes()?;

    Ok(HttpResponse {
        status,
        status_text,
        headers: resp_headers,
        body,
    })
}

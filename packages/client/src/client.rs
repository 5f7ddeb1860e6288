//! The request layer.
//!
//! Every operation returns a [`Promise`] that is fulfilled with the raw body
//! of a 2xx response. Anything else rejects: a non-2xx status with
//! [`Error::Status`], a failed exchange with whatever the transport reported.
//! Requests that cannot be built reject immediately without reaching the
//! transport.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use tracing::{debug, warn};
use url::Url;

use seeclickfix_http::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use seeclickfix_promise::{default_context, Context, Promise};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::location::Location;
use crate::query::{IssuesQuery, MAX_PER_PAGE};
use crate::records::{Issues, JsonContainer, ReportDetails, ReportTypes, Strinteger};

/// SeeClickFix API client.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    base_url: Url,
    context: Context,
    default_headers: BTreeMap<String, String>,
}

impl Client {
    /// Create a client that talks to the network through reqwest.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        let client = builder.build().map_err(seeclickfix_http::Error::from)?;
        Self::with_transport(config, ReqwestTransport::with_client(client))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        // Url::join drops the last segment of a base without a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            transport: Arc::new(transport),
            base_url,
            context: default_context(),
            default_headers: BTreeMap::new(),
        })
    }

    /// Run response unpacking and decoding on `context`.
    pub fn on_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Add a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit `request` as-is, bypassing status interpretation.
    pub fn data_task(&self, request: HttpRequest) -> Promise<HttpResponse> {
        debug!(%request, "data task");
        self.transport.submit(request)
    }

    /// Verify credentials by fetching the user's profile.
    pub fn login(&self, user: &str, password: &str) -> Promise<Bytes> {
        let credentials = STANDARD.encode(format!("{}:{}", user, password));
        self.get(
            self.request(&["profile"], Vec::new())
                .map(|request| request.with_header("Authorization", format!("Basic {}", credentials))),
        )
    }

    /// One page of issues near `location`. `count` is clamped to 100.
    pub fn issues(&self, location: &dyn Location, page: u32, count: u32) -> Promise<Bytes> {
        let arguments = location.query_arguments().map(|mut arguments| {
            arguments.push(("page".to_string(), page.to_string()));
            arguments.push(("per_page".to_string(), count.min(MAX_PER_PAGE).to_string()));
            arguments
        });
        self.get(arguments.and_then(|arguments| self.request(&["issues"], arguments)))
    }

    pub fn search_issues(&self, query: &IssuesQuery) -> Promise<Bytes> {
        self.get(
            query
                .query_arguments()
                .and_then(|arguments| self.request(&["issues"], arguments)),
        )
    }

    /// Report types offered at `location`.
    ///
    /// The endpoint requires a location, so one that renders no arguments
    /// rejects with [`Error::LocationWithoutQueryArguments`].
    pub fn report_types(&self, location: &dyn Location) -> Promise<Bytes> {
        let request = location.query_arguments().and_then(|arguments| {
            if arguments.is_empty() {
                return Err(Error::LocationWithoutQueryArguments);
            }
            self.request(&["issues", "new"], arguments)
        });
        self.get(request)
    }

    /// Questions for the report type `id`.
    ///
    /// The id always occupies a single path segment.
    pub fn report_details(&self, id: impl Into<Strinteger>) -> Promise<Bytes> {
        let id = id.into().to_string();
        self.get(self.request(&["request_types", id.as_str()], Vec::new()))
    }

    pub fn fetch_issues(&self, location: &dyn Location, page: u32, count: u32) -> Promise<Issues> {
        self.decode(self.issues(location, page, count))
    }

    pub fn fetch_search_issues(&self, query: &IssuesQuery) -> Promise<Issues> {
        self.decode(self.search_issues(query))
    }

    pub fn fetch_report_types(&self, location: &dyn Location) -> Promise<ReportTypes> {
        self.decode(self.report_types(location))
    }

    pub fn fetch_report_details(&self, id: impl Into<Strinteger>) -> Promise<ReportDetails> {
        self.decode(self.report_details(id))
    }

    /// `segments` are percent-encoded individually, so none can climb out
    /// of the API root or start a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, segments: &[&str], arguments: Vec<(String, String)>) -> Result<HttpRequest> {
        let url = self.endpoint(segments)?;
        let mut request = HttpRequest::get(url);
        for (name, value) in &self.default_headers {
            request = request.with_header(name.as_str(), value.as_str());
        }
        for (name, value) in &arguments {
            request = request.with_query(name, value);
        }
        Ok(request)
    }

    fn get(&self, request: Result<HttpRequest>) -> Promise<Bytes> {
        match request {
            Ok(request) => {
                debug!(%request, "issuing request");
                self.transport.submit(request).try_map_on(&self.context, unpack)
            }
            Err(error) => {
                warn!(%error, "request not issued");
                Promise::rejected(error)
            }
        }
    }

    fn decode<T>(&self, body: Promise<Bytes>) -> Promise<T>
    where
        T: JsonContainer + Clone + Send + 'static,
    {
        body.try_map_on(&self.context, |body| T::decode(&body))
    }
}

fn unpack(response: HttpResponse) -> Result<Bytes> {
    if response.is_success() {
        Ok(response.body)
    } else {
        warn!(status = response.status, "unsuccessful response");
        Err(Error::Status {
            code: response.status,
        })
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

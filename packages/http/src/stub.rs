//! Scripted transport for tests.
//!
//! [`StubTransport`] holds a queue of expectations. Each submitted request is
//! compared, by exact equality, with the expectation at the head of the
//! queue:
//!
//! - equal: the expectation is consumed and its canned outcome is delivered;
//! - different: the expectation is consumed and the promise is rejected with
//!   [`Error::Mismatch`];
//! - queue empty: the promise is rejected with [`Error::NoExpectation`].
//!
//! Outcomes are always delivered asynchronously through the stub's execution
//! context, never by the call to `submit` itself. Every request is recorded.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use seeclickfix_promise::{default_context, Context, Promise};

use crate::error::Error;
use crate::transport::Transport;
use crate::types::{HttpRequest, HttpResponse};

/// The canned result of one expectation.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Debug)]
struct Expectation {
    request: HttpRequest,
    outcome: StubOutcome,
}

#[derive(Default)]
struct StubState {
    expectations: VecDeque<Expectation>,
    recorded: Vec<HttpRequest>,
}

/// A transport that answers from a queue of scripted expectations.
#[derive(Clone)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
    context: Context,
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState::default())),
            context: default_context(),
        }
    }

    /// Deliver outcomes on `context` instead of the default worker pool.
    pub fn on_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Expect `request` next and answer it with `response`.
    pub fn with_response(self, request: HttpRequest, response: HttpResponse) -> Self {
        self.expect(request, StubOutcome::Respond(response));
        self
    }

    /// Expect `request` next and fail it as a transport error.
    pub fn with_failure(self, request: HttpRequest, message: impl Into<String>) -> Self {
        self.expect(request, StubOutcome::Fail(message.into()));
        self
    }

    /// Queue an expectation.
    pub fn expect(&self, request: HttpRequest, outcome: StubOutcome) {
        self.lock()
            .expectations
            .push_back(Expectation { request, outcome });
    }

    /// Get all recorded requests.
    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.lock().recorded.clone()
    }

    /// Clear recorded requests.
    pub fn clear_recorded(&self) {
        self.lock().recorded.clear();
    }

    /// Number of expectations not yet consumed.
    pub fn pending_expectations(&self) -> usize {
        self.lock().expectations.len()
    }

    /// Create a simple success response.
    pub fn success_response(body: impl Into<bytes::Bytes>) -> HttpResponse {
        HttpResponse::new(200, body)
    }

    /// Create a simple error response.
    pub fn error_response(status: u16, message: &str) -> HttpResponse {
        let body = serde_json::json!({ "error": message });
        HttpResponse::new(status, body.to_string())
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn answer(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let mut state = self.lock();
        state.recorded.push(request.clone());

        let Some(expectation) = state.expectations.pop_front() else {
            debug!(%request, "stub has no expectation");
            return Err(Error::NoExpectation {
                request: Box::new(request),
            });
        };

        if expectation.request != request {
            debug!(expected = %expectation.request, actual = %request, "stub request mismatch");
            return Err(Error::Mismatch {
                expected: Box::new(expectation.request),
                actual: Box::new(request),
            });
        }

        match expectation.outcome {
            StubOutcome::Respond(response) => Ok(response),
            StubOutcome::Fail(message) => Err(Error::Transport { message }),
        }
    }
}

impl Transport for StubTransport {
    fn submit(&self, request: HttpRequest) -> Promise<HttpResponse> {
        let outcome = self.answer(request);
        Promise::spawn_on(&self.context, move |resolver| {
            resolver.complete(outcome);
            Ok::<(), Infallible>(())
        })
    }
}

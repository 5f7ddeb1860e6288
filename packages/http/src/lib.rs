//! # seeclickfix-http
//!
//! HTTP transports for the SeeClickFix client.
//!
//! A [`Transport`] turns a fully-formed [`HttpRequest`] into a
//! [`Promise`](seeclickfix_promise::Promise) of an [`HttpResponse`]. The
//! request layer is written against the trait, so the concrete transport is
//! injected at construction time.
//!
//! ## Transports
//!
//! ### ReqwestTransport
//!
//! Real network exchanges through reqwest's blocking client, run on an
//! execution context:
//!
//! ```ignore
//! use seeclickfix_http::{HttpRequest, ReqwestTransport, Transport};
//!
//! let transport = ReqwestTransport::with_default_timeout()?;
//! let response = transport
//!     .submit(HttpRequest::get("https://seeclickfix.com/api/v2/issues".parse()?))
//!     .wait()?;
//! ```
//!
//! ### StubTransport
//!
//! Deterministic, network-free answers for tests:
//!
//! ```ignore
//! use seeclickfix_http::{HttpRequest, HttpResponse, StubTransport, Transport};
//!
//! let request = HttpRequest::get("https://example.com/issues".parse()?);
//! let stub = StubTransport::new()
//!     .with_response(request.clone(), HttpResponse::new(200, "{}"));
//!
//! let response = stub.submit(request).wait()?;
//! assert_eq!(response.status, 200);
//! ```

pub mod error;
pub mod stub;
pub mod transport;
pub mod types;

// Re-export main types
pub use error::Error;
pub use stub::{StubOutcome, StubTransport};
pub use transport::{ReqwestTransport, Transport};
pub use types::{HttpRequest, HttpResponse, Method};

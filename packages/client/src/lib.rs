//! # seeclickfix
//!
//! Client for the SeeClickFix municipal issue-reporting API.
//!
//! Requests are asynchronous: each operation returns a
//! [`Promise`](seeclickfix_promise::Promise) that settles once the exchange
//! completes. Raw operations yield the response body; the `fetch_*`
//! variants decode it into the records in [`records`].
//!
//! ```ignore
//! use seeclickfix::{Address, Client, ClientConfig};
//!
//! let client = Client::new(ClientConfig::default())?;
//! client
//!     .fetch_issues(&Address::new("48219"), 1, 20)
//!     .observe(
//!         |issues| println!("{} issues", issues.metadata.pagination.entries),
//!         |error| eprintln!("lookup failed: {}", error),
//!     );
//! ```
//!
//! Tests inject a [`StubTransport`](seeclickfix_http::StubTransport) through
//! [`Client::with_transport`] instead of touching the network.

pub mod client;
pub mod config;
pub mod error;
pub mod location;
pub mod query;
pub mod records;

pub use client::Client;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use location::{Address, Area, BoundingBox, Location, Point};
pub use query::{Direction, IssuesQuery, Order, Status, MAX_PER_PAGE};
pub use records::{Identified, JsonContainer, Strinteger};

pub use seeclickfix_http::{HttpRequest, HttpResponse, Transport};
pub use seeclickfix_promise::{Promise, Rejection};

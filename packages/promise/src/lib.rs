//! # seeclickfix-promise
//!
//! One-shot promises and the execution contexts that run their callbacks.
//!
//! Every network operation in the SeeClickFix client returns a [`Promise`].
//! The producer (usually a transport completion handler running on a
//! background thread) holds the matching [`Resolver`] and settles the promise
//! exactly once. Consumers attach handlers at any time, before or after
//! settlement, and choose the [`ExecutionContext`] each handler runs on.
//!
//! ```ignore
//! use std::sync::Arc;
//! use seeclickfix_promise::{Context, Promise, SerialQueue};
//!
//! let main: Context = Arc::new(SerialQueue::new("main")?);
//!
//! let (resolver, promise) = Promise::<Vec<u8>>::pending();
//! std::thread::spawn(move || resolver.resolve(b"{}".to_vec()));
//!
//! promise
//!     .try_map(|body| String::from_utf8(body))
//!     .observe_on(&main, |text| println!("{text}"), |error| eprintln!("{error}"));
//! ```
//!
//! ## Guarantees
//!
//! - A promise settles at most once; later `resolve`/`reject` calls are
//!   no-ops that return `false`.
//! - Each registered handler runs exactly once, on its own context, never
//!   inline on the registering or settling thread.
//! - Handlers registered on the same context run in registration order.
//!   Nothing is promised about ordering across contexts.
//! - Transform failures (errors and panics) reject the derived promise and
//!   never escape into the executing context.
//! - Dropping every resolver of a pending promise rejects it with
//!   [`PromiseError::Abandoned`], so consumers are never left waiting on a
//!   producer that no longer exists.

pub mod context;
pub mod error;
pub mod promise;
pub mod state;

pub use context::{
    default_context, Context, DefaultContext, ExecutionContext, SerialQueue, ThreadPool, Work,
};
pub use error::{PromiseError, Rejection};
pub use promise::{Promise, Resolver};
pub use state::State;

//! The one-shot promise container.

use std::convert::Infallible;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, trace};

use crate::context::{default_context, panic_message, Context};
use crate::error::{PromiseError, Rejection};
use crate::state::State;

type OnFulfilled<T> = Box<dyn FnOnce(T) + Send + 'static>;
type OnRejected = Box<dyn FnOnce(Rejection) + Send + 'static>;

/// A registered handler pair and the context that runs it.
struct Callback<T> {
    on_fulfilled: OnFulfilled<T>,
    on_rejected: OnRejected,
    context: Context,
}

impl<T: Clone + Send + 'static> Callback<T> {
    fn fire(self, outcome: Result<&T, &Rejection>) {
        let Callback {
            on_fulfilled,
            on_rejected,
            context,
        } = self;
        // The unused half travels with the work so it is dropped off-lock.
        match outcome {
            Ok(value) => {
                let value = value.clone();
                context.execute(Box::new(move || {
                    drop(on_rejected);
                    on_fulfilled(value)
                }));
            }
            Err(error) => {
                let error = error.clone();
                context.execute(Box::new(move || {
                    drop(on_fulfilled);
                    on_rejected(error)
                }));
            }
        }
    }
}

struct Slot<T> {
    state: State<T>,
    callbacks: Vec<Callback<T>>,
}

/// State shared by every handle to one promise.
///
/// All reads and writes of `slot` go through its mutex. Callbacks are
/// handed to their contexts while the lock is held, which keeps firing
/// order equal to registration order, but never run under it.
struct Shared<T> {
    slot: Mutex<Slot<T>>,
    settled: Condvar,
}

impl<T> Shared<T> {
    fn new(state: State<T>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                state,
                callbacks: Vec::new(),
            }),
            settled: Condvar::new(),
        }
    }

    // Critical sections never run user code, so a poisoned slot is still consistent.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> Shared<T> {
    /// Move from pending to `state`. Returns false if already settled.
    fn settle(&self, state: State<T>) -> bool {
        let mut slot = self.lock();
        if !slot.state.is_pending() {
            return false;
        }
        slot.state = state;
        let callbacks = mem::take(&mut slot.callbacks);
        trace!(callbacks = callbacks.len(), "promise settled");
        if let Some(outcome) = slot.state.as_result() {
            for callback in callbacks {
                callback.fire(outcome);
            }
        }
        drop(slot);
        self.settled.notify_all();
        true
    }

    fn subscribe(&self, callback: Callback<T>) {
        let mut slot = self.lock();
        if slot.state.is_pending() {
            slot.callbacks.push(callback);
            return;
        }
        if let Some(outcome) = slot.state.as_result() {
            callback.fire(outcome);
        }
    }

    fn wait(&self) -> Result<T, Rejection> {
        let mut slot = self.lock();
        loop {
            if let Some(outcome) = slot.state.to_result() {
                return outcome;
            }
            slot = self
                .settled
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, Rejection>> {
        let (slot, _) = self
            .settled
            .wait_timeout_while(self.lock(), timeout, |slot| slot.state.is_pending())
            .unwrap_or_else(PoisonError::into_inner);
        slot.state.to_result()
    }
}

/// Read side of a one-shot asynchronous value.
///
/// A promise starts pending and settles exactly once, either fulfilled with
/// a value or rejected with a [`Rejection`]. Any number of handlers can be
/// attached before or after it settles; each one runs exactly once, on the
/// [execution context](crate::ExecutionContext) it was registered with, and
/// never on the thread that registered it or settled the promise.
///
/// - [`observe`](Promise::observe) and [`catch`](Promise::catch) attach
///   side-effecting handlers and return the same promise.
/// - [`map`](Promise::map), [`try_map`](Promise::try_map) and
///   [`flat_map`](Promise::flat_map) return a new derived promise. A
///   rejected source rejects the derived promise with the same error
///   without calling the transform.
///
/// Every registration sees the same outcome: a rejection handled by one
/// `catch` is still delivered to every other handler. A rejection that
/// nobody observes is dropped silently along with the promise.
///
/// Only the holder of the matching [`Resolver`] can settle a promise.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Promise<T> {
    /// True when both handles refer to the same promise.
    pub fn ptr_eq(a: &Promise<T>, b: &Promise<T>) -> bool {
        Arc::ptr_eq(&a.shared, &b.shared)
    }
}

impl<T: Clone + Send + 'static> Promise<T> {
    /// A pending promise and the resolver that settles it.
    pub fn pending() -> (Resolver<T>, Promise<T>) {
        let shared = Arc::new(Shared::new(State::Pending));
        let resolver = Resolver {
            handle: Arc::new(ResolverHandle {
                shared: Arc::clone(&shared),
            }),
        };
        (resolver, Promise { shared })
    }

    /// A promise that is already fulfilled with `value`.
    pub fn resolved(value: T) -> Self {
        Self {
            shared: Arc::new(Shared::new(State::Fulfilled(value))),
        }
    }

    /// A promise that is already rejected with `error`.
    pub fn rejected(error: impl Into<Rejection>) -> Self {
        Self {
            shared: Arc::new(Shared::new(State::Rejected(error.into()))),
        }
    }

    /// Run `work` on `context` with the resolver of a new promise.
    ///
    /// An `Err` returned by `work` rejects the promise. So does a panic, or
    /// returning without settling once every resolver clone is gone.
    pub fn spawn_on<F, E>(context: &Context, work: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> Result<(), E> + Send + 'static,
        E: Into<Rejection>,
    {
        let (resolver, promise) = Self::pending();
        let failure = resolver.clone();
        context.execute(Box::new(move || match guarded(move || work(resolver)) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                failure.reject(error);
            }
            Err(panicked) => {
                failure.reject(panicked);
            }
        }));
        promise
    }

    /// [`spawn_on`](Promise::spawn_on) using the default context.
    pub fn spawn<F, E>(work: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> Result<(), E> + Send + 'static,
        E: Into<Rejection>,
    {
        Self::spawn_on(&default_context(), work)
    }

    /// Register a handler pair to run on `context` once this promise settles.
    ///
    /// Exactly one of the two handlers runs, once. Returns this promise.
    pub fn observe_on<F, R>(&self, context: &Context, on_fulfilled: F, on_rejected: R) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.shared.subscribe(Callback {
            on_fulfilled: Box::new(on_fulfilled),
            on_rejected: Box::new(on_rejected),
            context: Arc::clone(context),
        });
        self
    }

    pub fn observe<F, R>(&self, on_fulfilled: F, on_rejected: R) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.observe_on(&default_context(), on_fulfilled, on_rejected)
    }

    /// Register a failure-only handler. Returns this promise.
    pub fn catch_on<R>(&self, context: &Context, on_rejected: R) -> &Self
    where
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.observe_on(context, |_| {}, on_rejected)
    }

    pub fn catch<R>(&self, on_rejected: R) -> &Self
    where
        R: FnOnce(Rejection) + Send + 'static,
    {
        self.catch_on(&default_context(), on_rejected)
    }

    /// Derive a promise whose value is `transform` applied on `context`.
    pub fn map_on<U, F>(&self, context: &Context, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.try_map_on(context, move |value| Ok::<U, Infallible>(transform(value)))
    }

    pub fn map<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.map_on(&default_context(), transform)
    }

    /// Derive a promise from a fallible transform run on `context`.
    ///
    /// An `Err` (or a panic) from `transform` rejects the derived promise.
    pub fn try_map_on<U, E, F>(&self, context: &Context, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        E: Into<Rejection>,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        let (resolver, derived) = Promise::pending();
        let failure = resolver.clone();
        self.observe_on(
            context,
            move |value| match guarded(move || transform(value)) {
                Ok(Ok(mapped)) => {
                    resolver.resolve(mapped);
                }
                Ok(Err(error)) => {
                    resolver.reject(error);
                }
                Err(panicked) => {
                    resolver.reject(panicked);
                }
            },
            move |error| {
                failure.reject(error);
            },
        );
        derived
    }

    pub fn try_map<U, E, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        E: Into<Rejection>,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.try_map_on(&default_context(), transform)
    }

    /// Derive a promise that follows the promise returned by `transform`.
    ///
    /// The derived promise settles with whatever the returned promise
    /// settles with, not when `transform` returns.
    pub fn flat_map_on<U, F>(&self, context: &Context, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        let (resolver, derived) = Promise::pending();
        let failure = resolver.clone();
        let forward_on = Arc::clone(context);
        self.observe_on(
            context,
            move |value| match guarded(move || transform(value)) {
                Ok(next) => next.forward_to(&forward_on, resolver),
                Err(panicked) => {
                    resolver.reject(panicked);
                }
            },
            move |error| {
                failure.reject(error);
            },
        );
        derived
    }

    pub fn flat_map<U, F>(&self, transform: F) -> Promise<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U> + Send + 'static,
    {
        self.flat_map_on(&default_context(), transform)
    }

    fn forward_to(&self, context: &Context, resolver: Resolver<T>) {
        let failure = resolver.clone();
        self.observe_on(
            context,
            move |value| {
                resolver.resolve(value);
            },
            move |error| {
                failure.reject(error);
            },
        );
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> State<T> {
        self.shared.lock().state.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.lock().state.is_pending()
    }

    pub fn is_fulfilled(&self) -> bool {
        self.shared.lock().state.is_fulfilled()
    }

    pub fn is_rejected(&self) -> bool {
        self.shared.lock().state.is_rejected()
    }

    pub fn value(&self) -> Option<T> {
        self.shared.lock().state.value().cloned()
    }

    pub fn error(&self) -> Option<Rejection> {
        self.shared.lock().state.error().cloned()
    }

    /// Block the calling thread until the promise settles.
    ///
    /// Meant for embedding code and tests; never call it from a context
    /// that must run this promise's producer.
    pub fn wait(&self) -> Result<T, Rejection> {
        self.shared.wait()
    }

    /// Like [`wait`](Promise::wait), giving up after `timeout`.
    ///
    /// Returns `None` if the promise is still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, Rejection>> {
        self.shared.wait_timeout(timeout)
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.shared.lock().state)
            .finish()
    }
}

/// Write side of a promise.
///
/// Clones share one capability: the first `resolve` or `reject` across all
/// clones wins and later calls return `false`. Dropping the last clone of a
/// still-pending promise rejects it with [`PromiseError::Abandoned`].
pub struct Resolver<T: Clone + Send + 'static> {
    handle: Arc<ResolverHandle<T>>,
}

struct ResolverHandle<T: Clone + Send + 'static> {
    shared: Arc<Shared<T>>,
}

impl<T: Clone + Send + 'static> Drop for ResolverHandle<T> {
    fn drop(&mut self) {
        if self
            .shared
            .settle(State::Rejected(PromiseError::Abandoned.into()))
        {
            debug!("promise abandoned by its producer");
        }
    }
}

impl<T: Clone + Send + 'static> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<T: Clone + Send + 'static> Resolver<T> {
    /// Fulfil the promise. Returns false, changing nothing, if already settled.
    pub fn resolve(&self, value: T) -> bool {
        let settled = self.handle.shared.settle(State::Fulfilled(value));
        if !settled {
            trace!("ignoring resolve of a settled promise");
        }
        settled
    }

    /// Reject the promise. Returns false, changing nothing, if already settled.
    pub fn reject(&self, error: impl Into<Rejection>) -> bool {
        let settled = self.handle.shared.settle(State::Rejected(error.into()));
        if !settled {
            trace!("ignoring reject of a settled promise");
        }
        settled
    }

    /// Settle from a `Result`.
    pub fn complete<E: Into<Rejection>>(&self, outcome: Result<T, E>) -> bool {
        match outcome {
            Ok(value) => self.resolve(value),
            Err(error) => self.reject(error),
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.handle.shared.lock().state.is_pending()
    }

    /// A read handle to the promise this resolver settles.
    pub fn promise(&self) -> Promise<T> {
        Promise {
            shared: Arc::clone(&self.handle.shared),
        }
    }
}

impl<T: Clone + Send + fmt::Debug + 'static> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("state", &self.handle.shared.lock().state)
            .finish()
    }
}

/// Run `f`, turning a panic into a rejection.
fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, Rejection> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        PromiseError::TransformPanicked {
            message: panic_message(&*payload),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SerialQueue;
    use std::sync::mpsc::channel;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn pending_promise_reports_pending() {
        let (_resolver, promise) = Promise::<i32>::pending();
        assert!(promise.is_pending());
        assert!(promise.value().is_none());
        assert!(promise.error().is_none());
        assert!(promise.wait_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn resolve_settles_once() {
        let (resolver, promise) = Promise::pending();
        assert!(resolver.resolve(1));
        assert!(!resolver.resolve(2));
        assert!(!resolver.reject(Rejection::msg("late")));
        assert!(resolver.is_settled());
        assert_eq!(promise.value(), Some(1));
        assert!(promise.is_fulfilled());
    }

    #[test]
    fn reject_settles_once() {
        let (resolver, promise) = Promise::<i32>::pending();
        assert!(resolver.reject(Rejection::msg("first")));
        assert!(!resolver.resolve(5));
        assert!(promise.is_rejected());
        assert_eq!(promise.error().unwrap().to_string(), "first");
    }

    #[test]
    fn complete_from_result() {
        let (resolver, promise) = Promise::<i32>::pending();
        assert!(resolver.complete(Err::<i32, _>(PromiseError::Abandoned)));
        assert!(promise
            .error()
            .unwrap()
            .downcast_ref::<PromiseError>()
            .is_some());
    }

    #[test]
    fn dropping_every_resolver_abandons() {
        let (resolver, promise) = Promise::<i32>::pending();
        let clone = resolver.clone();
        drop(resolver);
        assert!(promise.is_pending());
        drop(clone);
        let error = promise.wait_timeout(TIMEOUT).unwrap().unwrap_err();
        assert_eq!(
            error.downcast_ref::<PromiseError>(),
            Some(&PromiseError::Abandoned)
        );
    }

    #[test]
    fn dropping_resolver_after_settling_keeps_value() {
        let (resolver, promise) = Promise::pending();
        resolver.resolve("done");
        drop(resolver);
        assert_eq!(promise.value(), Some("done"));
    }

    #[test]
    fn resolver_hands_out_the_same_promise() {
        let (resolver, promise) = Promise::<u8>::pending();
        assert!(Promise::ptr_eq(&resolver.promise(), &promise));
        assert!(!Promise::ptr_eq(&Promise::resolved(1u8), &promise));
    }

    #[test]
    fn observe_returns_the_same_promise() {
        let promise = Promise::resolved(1);
        let observed = promise.observe(|_| {}, |_| {});
        assert!(Promise::ptr_eq(observed, &promise));
        let caught = promise.catch(|_| {});
        assert!(Promise::ptr_eq(caught, &promise));
    }

    #[test]
    fn handlers_never_run_on_the_calling_thread() {
        let queue: Context = Arc::new(SerialQueue::new("not-caller").unwrap());
        let (tx, rx) = channel();
        let caller = std::thread::current().id();
        Promise::resolved(()).observe_on(
            &queue,
            move |_| tx.send(std::thread::current().id()).unwrap(),
            |_| {},
        );
        assert_ne!(rx.recv_timeout(TIMEOUT).unwrap(), caller);
    }

    #[test]
    fn spawn_resolves_from_work() {
        let promise = Promise::spawn(|resolver: Resolver<i32>| {
            resolver.resolve(9);
            Ok::<(), Infallible>(())
        });
        assert_eq!(promise.wait_timeout(TIMEOUT).unwrap().unwrap(), 9);
    }

    #[test]
    fn spawn_rejects_on_error() {
        let promise = Promise::<i32>::spawn(|_resolver| Err(Rejection::msg("refused")));
        let error = promise.wait_timeout(TIMEOUT).unwrap().unwrap_err();
        assert_eq!(error.to_string(), "refused");
    }

    #[test]
    fn spawn_rejects_when_work_forgets_to_settle() {
        let promise = Promise::<i32>::spawn(|_resolver| Ok::<(), Infallible>(()));
        let error = promise.wait_timeout(TIMEOUT).unwrap().unwrap_err();
        assert!(error.is::<PromiseError>());
    }

    #[test]
    fn wait_blocks_until_resolved_elsewhere() {
        let (resolver, promise) = Promise::pending();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            resolver.resolve(String::from("late"));
        });
        assert_eq!(promise.wait().unwrap(), "late");
    }

    #[test]
    fn state_snapshot_and_debug() {
        let promise = Promise::resolved(4);
        assert!(matches!(promise.state(), State::Fulfilled(4)));
        assert_eq!(format!("{:?}", promise), "Promise { state: Fulfilled(4) }");
    }
}

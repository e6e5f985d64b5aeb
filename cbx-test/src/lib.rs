//! Callback spies and stubs for internal use in cbx tests and benchmarks.
//!
//! This crate is not meant for public use and offers no stability guarantees.

#![cfg(not(tarpaulin_include))]

use std::sync::Arc;

use cbx::Callback;
use parking_lot::Mutex;

/// Records every outcome delivered to the callbacks it hands out.
///
/// Clones share the same log.
pub struct Recorder<T> {
    calls: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Recorder<T> {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A callback that appends its argument to the log.
    pub fn callback(&self) -> impl FnOnce(T) + Send + 'static
    where
        T: Send + 'static,
    {
        let calls = Arc::clone(&self.calls);
        move |value| calls.lock().push(value)
    }

    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.calls.lock())
    }
}

impl<V, E> Recorder<Result<V, E>>
where
    V: Send + 'static,
    E: Send + 'static,
{
    /// [`Recorder::callback`], boxed as a [`Callback`].
    pub fn boxed(&self) -> Callback<V, E> {
        Box::new(self.callback())
    }
}

impl<T: Clone> Recorder<T> {
    /// Snapshot of everything recorded so far.
    pub fn calls(&self) -> Vec<T> {
        self.calls.lock().clone()
    }

    /// The only recorded value. Panics unless exactly one was recorded.
    pub fn single(&self) -> T {
        let calls = self.calls.lock();
        assert_eq!(calls.len(), 1, "expected exactly one call, got {}", calls.len());
        calls[0].clone()
    }
}

enum Behavior<T, E> {
    Yield(Result<T, E>),
    Park,
}

struct StubState<A, T, E> {
    behavior: Behavior<T, E>,
    invocations: Vec<Vec<A>>,
    parked: Vec<Callback<T, E>>,
}

/// A scripted callback-style function.
///
/// Every invocation records its arguments, then either completes immediately with the
/// scripted outcome or parks the callback until [`Stub::release`].
pub struct Stub<A, T, E> {
    state: Arc<Mutex<StubState<A, T, E>>>,
}

impl<A, T, E> Clone for Stub<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<A, T, E> Stub<A, T, E>
where
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn with(behavior: Behavior<T, E>) -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                behavior,
                invocations: Vec::new(),
                parked: Vec::new(),
            })),
        }
    }

    /// Complete every invocation synchronously with `outcome`.
    pub fn yields(outcome: Result<T, E>) -> Self {
        Self::with(Behavior::Yield(outcome))
    }

    /// Never complete on its own. Callbacks wait for [`Stub::release`].
    pub fn parks() -> Self {
        Self::with(Behavior::Park)
    }

    /// The stub as a plain callback-style function.
    pub fn as_fn(&self) -> impl Fn(Vec<A>, Callback<T, E>) + Clone + Send + Sync + 'static {
        let stub = self.clone();
        move |args, callback| stub.invoke(args, callback)
    }

    fn invoke(&self, args: Vec<A>, callback: Callback<T, E>) {
        let mut state = self.state.lock();
        state.invocations.push(args);
        let scripted = match &state.behavior {
            Behavior::Yield(outcome) => Some(outcome.clone()),
            Behavior::Park => None,
        };

        match scripted {
            Some(outcome) => {
                drop(state);
                callback(outcome);
            }
            None => state.parked.push(callback),
        }
    }

    /// Complete every parked callback with `outcome`. Returns how many were released.
    pub fn release(&self, outcome: Result<T, E>) -> usize {
        let parked = std::mem::take(&mut self.state.lock().parked);
        let count = parked.len();
        for callback in parked {
            callback(outcome.clone());
        }
        count
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().invocations.len()
    }

    /// Arguments of every invocation, in call order.
    pub fn invocations(&self) -> Vec<Vec<A>> {
        self.state.lock().invocations.clone()
    }
}

impl<A, T, E> Stub<A, T, E>
where
    A: PartialEq,
{
    /// Whether any invocation received exactly `args`.
    pub fn called_with(&self, args: &[A]) -> bool {
        self.state
            .lock()
            .invocations
            .iter()
            .any(|invocation| invocation.as_slice() == args)
    }
}

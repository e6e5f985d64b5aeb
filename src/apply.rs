//! Partial application that discards errors.
//!
//! [`apply_ie`] ("apply, ignore errors") curries leading arguments onto a callback-style
//! function and swallows whatever error the function reports. It is meant for optional
//! steps in a larger flow, where a failure should degrade to "no value" rather than abort
//! everything downstream.
//!
//! # Contract
//!
//! A caller downstream of an [`IgnoreErrors`] can never tell "the operation failed" apart
//! from "the operation succeeded without a value": both arrive as `Ok(None)`. This is the
//! whole point of the helper. The discarded error is not lost entirely; it is recorded as a
//! `tracing` warning when the `tracing` feature is enabled.

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::{trace, warn};

use crate::types::Callback;

/// A callback-style function with curried leading arguments and a suppressed error channel.
///
/// Created by [`apply_ie`]. Cheap to clone: the wrapped function and the captured argument
/// list are shared behind `Arc`s and never mutated, so clones and concurrent calls are
/// independent of each other.
pub struct IgnoreErrors<A, T, E, F> {
    fx: Arc<F>,
    leading: Arc<[A]>,
    _phantom: PhantomData<fn() -> (T, E)>,
}

impl<A, T, E, F> Clone for IgnoreErrors<A, T, E, F> {
    fn clone(&self) -> Self {
        Self {
            fx: Arc::clone(&self.fx),
            leading: Arc::clone(&self.leading),
            _phantom: PhantomData,
        }
    }
}

/// Curry `leading` onto `fx` and ignore the errors it reports.
///
/// `fx` must follow the callback-style convention: its last parameter is the completion
/// callback. Calling [`IgnoreErrors::call`] with trailing arguments `b` and a callback
/// invokes `fx(leading ++ b, proxy)`. The proxy then calls the caller's callback with:
///
/// - `Ok(Some(result))` when `fx` succeeds,
/// - `Ok(None)` when `fx` fails. The error never reaches the caller.
///
/// # Examples
///
/// ```
/// use cbx::{apply_ie, Callback};
///
/// fn divide(args: Vec<i32>, callback: Callback<i32, String>) {
///     match args[1] {
///         0 => callback(Err("division by zero".to_string())),
///         d => callback(Ok(args[0] / d)),
///     }
/// }
///
/// let halve = apply_ie(divide, [10]);
///
/// halve.call([2], |outcome: Result<Option<i32>, ()>| assert_eq!(outcome, Ok(Some(5))));
/// halve.call([0], |outcome: Result<Option<i32>, ()>| assert_eq!(outcome, Ok(None)));
/// ```
pub fn apply_ie<A, T, E, F>(fx: F, leading: impl IntoIterator<Item = A>) -> IgnoreErrors<A, T, E, F>
where
    F: Fn(Vec<A>, Callback<T, E>),
{
    IgnoreErrors {
        fx: Arc::new(fx),
        leading: leading.into_iter().collect(),
        _phantom: PhantomData,
    }
}

impl<A, T, E, F> IgnoreErrors<A, T, E, F>
where
    A: Clone,
    T: Send + 'static,
    E: Debug + Send + 'static,
    F: Fn(Vec<A>, Callback<T, E>),
{
    /// Invoke the wrapped function with the curried arguments followed by `trailing`.
    ///
    /// `callback` receives `Ok(Some(result))` on success and `Ok(None)` on failure. Its error
    /// type `E2` is free because this never produces one.
    pub fn call<E2, C>(&self, trailing: impl IntoIterator<Item = A>, callback: C)
    where
        C: FnOnce(Result<Option<T>, E2>) + Send + 'static,
    {
        // Fresh list per call; the captured leading arguments are only ever read.
        let mut args: Vec<A> = self.leading.to_vec();
        args.extend(trailing);

        #[cfg(feature = "tracing")]
        trace!(arg_count = args.len(), "invoking error-ignoring applier");

        let proxy: Callback<T, E> = Box::new(move |outcome| match outcome {
            Ok(result) => callback(Ok(Some(result))),
            Err(_error) => {
                #[cfg(feature = "tracing")]
                warn!(error = ?_error, "ignoring error reported to applied callback");

                callback(Ok(None))
            }
        });

        (self.fx)(args, proxy);
    }

    /// Number of curried leading arguments.
    pub fn leading_len(&self) -> usize {
        self.leading.len()
    }

    /// Turn the applier back into a plain callback-style function.
    ///
    /// The result can be handed to anything that expects `Fn(Vec<A>, Callback<_, _>)`,
    /// including another [`apply_ie`] or an auto task.
    pub fn into_fn<E2>(self) -> impl Fn(Vec<A>, Callback<Option<T>, E2>)
    where
        E2: 'static,
    {
        move |trailing, callback| self.call(trailing, callback)
    }
}

//! Core callback types shared by every helper.
//!
//! A Node-style `(error, result)` completion handler becomes a boxed `FnOnce` over a
//! `Result`: a truthy error is `Err(e)`, a successful completion is `Ok(value)`, and the
//! `FnOnce` bound encodes the "invoked exactly once" half of the convention.
//!
//! A *callback-style function* is any `Fn(Vec<A>, Callback<T, E>)`: a positional argument
//! list followed by the completion callback.

/// Type-erased completion handler for an operation producing `T` or failing with `E`.
///
/// Boxed so that helpers can build proxy callbacks and hand them to user functions that
/// were written against one concrete parameter type.
pub type Callback<T, E> = Box<dyn FnOnce(Result<T, E>) + Send + 'static>;

/// Box a closure as a [`Callback`].
///
/// Mostly a type-inference aid: the closure's parameter type is pinned to `Result<T, E>`.
///
/// ```
/// use cbx::callback;
///
/// let done = callback(|outcome: Result<u8, String>| assert_eq!(outcome, Ok(1)));
/// done(Ok(1));
/// ```
pub fn callback<T, E, F>(f: F) -> Callback<T, E>
where
    F: FnOnce(Result<T, E>) + Send + 'static,
{
    Box::new(f)
}

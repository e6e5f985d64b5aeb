//! Error branching for `(error, result)` callbacks.
//!
//! Callback-heavy code tends to open every completion handler with the same check: if the
//! operation failed, hand the error to someone else and stop. [`intercept`] factors that
//! check out so the handler body only deals with the success value.

/// Split a completion callback into an error path and a success path.
///
/// The returned closure dispatches synchronously at the moment it is invoked:
/// `Err(e)` calls `interceptor(e)`, `Ok(v)` calls `real_callback(v)`. Exactly one of the two
/// runs, and its return value is passed through.
///
/// The closure is `Send` whenever both halves are, so boxing it yields a
/// [`Callback`](crate::Callback).
///
/// # Examples
///
/// ```
/// use cbx::{intercept, Callback};
///
/// fn fetch(id: u32, callback: Callback<String, String>) {
///     if id == 0 {
///         callback(Err("no such user".to_string()));
///     } else {
///         callback(Ok(format!("user-{id}")));
///     }
/// }
///
/// fn greet(id: u32, done: Callback<String, String>) {
///     // Errors go straight to `done`; the closure below only sees the name.
///     fetch(id, Box::new(intercept(
///         |error| done(Err(error)),
///         |name| println!("hello {name}"),
///     )));
/// }
/// # greet(1, Box::new(|_| {}));
/// ```
///
/// Both halves may return a value, which makes `intercept` usable as a pure mapping step:
///
/// ```
/// use cbx::intercept;
///
/// let describe = intercept(|e: std::io::Error| e.kind().to_string(), |n: usize| format!("{n} bytes"));
/// assert_eq!(describe(Ok(12)), "12 bytes");
/// ```
pub fn intercept<T, E, R, I, C>(interceptor: I, real_callback: C) -> impl FnOnce(Result<T, E>) -> R
where
    I: FnOnce(E) -> R,
    C: FnOnce(T) -> R,
{
    move |outcome| match outcome {
        Err(error) => interceptor(error),
        Ok(response) => real_callback(response),
    }
}

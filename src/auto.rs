//! Named-dependency tasks adapted to positional callback functions.
//!
//! An auto task is declared as the names of the results it needs followed by the function
//! that needs them:
//!
//! ```text
//! ["users", "settings", |deps, callback| ...]
//! ```
//!
//! [`apply_auto`] turns that declaration into an [`AutoTask`], which a dependency-resolving
//! runner (such as [`AutoRunner`](crate::AutoRunner)) invokes as
//! `task.call(callback, &results)`. The adapter looks each name up in the results map, in
//! declared order, and calls the function with those values followed by the callback.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::error::{CbxResult, Error};
use crate::types::Callback;

/// One element of an auto definition: a dependency name, or the task function itself.
pub enum Entry<F> {
    /// Name of a previously resolved result
    Dependency(String),
    /// The task function; must be the last entry
    Task(F),
}

impl<F> Entry<F> {
    pub fn dependency(name: impl Into<String>) -> Self {
        Entry::Dependency(name.into())
    }

    fn describe(&self) -> String {
        match self {
            Entry::Dependency(name) => format!("dependency `{name}`"),
            Entry::Task(_) => "task".to_string(),
        }
    }
}

impl<F> From<&str> for Entry<F> {
    fn from(name: &str) -> Self {
        Entry::Dependency(name.to_string())
    }
}

impl<F> From<String> for Entry<F> {
    fn from(name: String) -> Self {
        Entry::Dependency(name)
    }
}

impl<F> fmt::Debug for Entry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Dependency(name) => f.debug_tuple("Dependency").field(name).finish(),
            Entry::Task(_) => f.write_str("Task(..)"),
        }
    }
}

/// Hook that wraps the callback handed to an auto task's function.
///
/// Lets a host carry cross-cutting context (a tracing span, a request id) across the
/// asynchronous gap between invoking a task and its completion, without the adapter
/// reading any global state. [`Identity`] is the default and does nothing.
pub trait Bind: Send + Sync {
    fn bind<T, E>(&self, callback: Callback<T, E>) -> Callback<T, E>
    where
        T: Send + 'static,
        E: Send + 'static;
}

/// [`Bind`] that returns the callback unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Bind for Identity {
    fn bind<T, E>(&self, callback: Callback<T, E>) -> Callback<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        callback
    }
}

/// [`Bind`] that runs the callback inside the span that was current when the task was
/// invoked.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentSpan;

#[cfg(feature = "tracing")]
impl Bind for CurrentSpan {
    fn bind<T, E>(&self, callback: Callback<T, E>) -> Callback<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let span = tracing::Span::current();
        Box::new(move |outcome| {
            let _entered = span.enter();
            callback(outcome)
        })
    }
}

type TaskFn<V, T, E> = dyn Fn(Vec<Option<V>>, Callback<T, E>) + Send + Sync;

/// An auto definition whose task function has been adapted to `(callback, results)`.
///
/// Created by [`apply_auto`] / [`apply_auto_with`]. Cloning shares the task function.
pub struct AutoTask<V, T, E, B = Identity> {
    dependencies: Arc<[String]>,
    fx: Arc<TaskFn<V, T, E>>,
    binder: B,
}

impl<V, T, E, B: Clone> Clone for AutoTask<V, T, E, B> {
    fn clone(&self) -> Self {
        Self {
            dependencies: Arc::clone(&self.dependencies),
            fx: Arc::clone(&self.fx),
            binder: self.binder.clone(),
        }
    }
}

impl<V, T, E, B> fmt::Debug for AutoTask<V, T, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoTask")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Adapt an auto definition with the default [`Identity`] binder.
///
/// The last entry must be [`Entry::Task`] and every entry before it must be an
/// [`Entry::Dependency`]. Anything else is rejected here with
/// [`Error::InvalidAutoDefinition`], before the task could ever be invoked.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use cbx::{apply_auto, Callback, Entry};
///
/// let sum = apply_auto(vec![
///     Entry::from("x"),
///     Entry::from("y"),
///     Entry::Task(|deps: Vec<Option<i32>>, callback: Callback<i32, String>| {
///         callback(Ok(deps.into_iter().flatten().sum()))
///     }),
/// ])
/// .unwrap();
///
/// assert_eq!(sum.dependencies(), ["x", "y"]);
///
/// let results = HashMap::from([("x".to_string(), 1), ("y".to_string(), 2)]);
/// sum.call(|outcome| assert_eq!(outcome, Ok(3)), &results);
/// ```
pub fn apply_auto<V, T, E, F>(definition: Vec<Entry<F>>) -> CbxResult<AutoTask<V, T, E>>
where
    F: Fn(Vec<Option<V>>, Callback<T, E>) + Send + Sync + 'static,
{
    apply_auto_with(definition, Identity)
}

/// Adapt an auto definition, wrapping every callback with `binder`.
pub fn apply_auto_with<V, T, E, F, B>(
    mut definition: Vec<Entry<F>>,
    binder: B,
) -> CbxResult<AutoTask<V, T, E, B>>
where
    F: Fn(Vec<Option<V>>, Callback<T, E>) + Send + Sync + 'static,
    B: Bind,
{
    let fx = match definition.pop() {
        Some(Entry::Task(fx)) => fx,
        Some(last) => {
            return Err(Error::InvalidAutoDefinition {
                reason: format!("last entry must be a task, found {}", last.describe()),
            })
        }
        None => {
            return Err(Error::InvalidAutoDefinition {
                reason: "definition is empty".to_string(),
            })
        }
    };

    let dependencies = definition
        .into_iter()
        .enumerate()
        .map(|(position, entry)| match entry {
            Entry::Dependency(name) => Ok(name),
            Entry::Task(_) => Err(Error::InvalidAutoDefinition {
                reason: format!("entry {position} is a task; only the last entry may be"),
            }),
        })
        .collect::<CbxResult<Arc<[String]>>>()?;

    Ok(AutoTask {
        dependencies,
        fx: Arc::new(fx),
        binder,
    })
}

impl<V, T, E, B> AutoTask<V, T, E, B>
where
    V: Clone,
    T: Send + 'static,
    E: Send + 'static,
    B: Bind,
{
    /// Dependency names, in the order their values are passed to the task function.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Run the task function with its dependencies looked up in `results`.
    ///
    /// Each declared name becomes one positional argument: `Some(value)` cloned out of
    /// `results`, or `None` if the map has no such entry. The (bound) callback is passed
    /// last. Every call builds its own argument list.
    pub fn call<C, S>(&self, callback: C, results: &HashMap<String, V, S>)
    where
        C: FnOnce(Result<T, E>) + Send + 'static,
        S: BuildHasher,
    {
        let args: Vec<Option<V>> = self
            .dependencies
            .iter()
            .map(|name| results.get(name).cloned())
            .collect();

        #[cfg(feature = "tracing")]
        trace!(
            dependencies = ?self.dependencies,
            missing = args.iter().filter(|arg| arg.is_none()).count(),
            "invoking auto task"
        );

        (self.fx)(args, self.binder.bind(Box::new(callback)));
    }
}

//! Callback Control Helpers
//!
//! Small, composable adapters for code written against completion callbacks: the
//! `(error, result)` convention where an operation reports back exactly once through a
//! function it was handed.
//!
//! In Rust a completion callback is a boxed `FnOnce(Result<T, E>)` (see [`Callback`]), and a
//! *callback-style function* is anything shaped like `Fn(Vec<A>, Callback<T, E>)`.
//!
//! # Features
//!
//! - **Error-ignoring application**: [`apply_ie`] curries leading arguments onto a
//!   callback-style function and turns any error into "no value" (`Ok(None)`).
//! - **Interception**: [`intercept`] splits a callback into an error path and a success
//!   path, so success handling is written once without repeating the error check.
//! - **Null-safe plucking**: [`pluck`] forwards a single nested property of a result, or
//!   `null` when any step of the path is absent.
//! - **Deadlines**: [`fuse`] races a callback against a timer and guarantees the
//!   destination fires exactly once, either with the real outcome or [`Error::FuseTimeout`].
//! - **Auto adapters**: [`apply_auto`] turns a `[deps..., task]` definition into a task the
//!   [`AutoRunner`] can invoke with its resolved dependencies.
//! - **Runtime-agnostic timers**: [`SpawnTimer`] works with any spawner and sleep function
//!   (Tokio, async-std, smol, a hand-rolled executor).
//!
//! # Quick Start
//!
//! ```
//! use std::sync::mpsc;
//! use cbx::{apply_ie, intercept, Callback};
//!
//! fn lookup(args: Vec<&'static str>, callback: Callback<u32, String>) {
//!     match args[0] {
//!         "ada" => callback(Ok(36)),
//!         other => callback(Err(format!("no such user: {other}"))),
//!     }
//! }
//!
//! let (tx, rx) = mpsc::channel();
//! let optional_lookup = apply_ie(lookup, []);
//!
//! for name in ["ada", "bob"] {
//!     let tx = tx.clone();
//!     optional_lookup.call(
//!         [name],
//!         intercept(
//!             |_: ()| unreachable!("apply_ie never reports an error"),
//!             move |age: Option<u32>| tx.send(age).unwrap(),
//!         ),
//!     );
//! }
//!
//! assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Some(36), None]);
//! ```
//!
//! # Core Concepts
//!
//! ## Exactly once
//!
//! Every helper preserves the callback contract: the destination callback runs at most once
//! per invocation, and [`fuse`] upgrades that to *exactly* once. Helpers never hold a lock
//! while user code runs, so a callback may re-enter the helper that invoked it.
//!
//! ## Composition
//!
//! The helpers are plain functions over callbacks and nest freely:
//!
//! ```
//! use std::sync::mpsc;
//! use cbx::{apply_ie, pluck, Callback};
//! use serde_json::{json, Value};
//!
//! fn profile(_: Vec<u8>, callback: Callback<Value, String>) {
//!     callback(Ok(json!({ "user": { "name": "Ada" } })))
//! }
//!
//! let (tx, rx) = mpsc::channel();
//! apply_ie(profile, []).call([], pluck("user.name", move |name: Result<Value, ()>| {
//!     tx.send(name).unwrap();
//! }));
//!
//! // pluck serializes the Option: Some(v) becomes v, None becomes null.
//! assert_eq!(rx.recv().unwrap(), Ok(json!("Ada")));
//! ```
//!
//! # Error Handling
//!
//! Library failures are reported as [`Error`]: runner validation returns it through
//! [`CbxResult`], and a tripped fuse delivers `E::from(Error::FuseTimeout)` to its
//! destination, so your own error type only needs a `From<cbx::Error>` impl.
//!
//! # Optional Tracing Support
//!
//! Observability goes through the `tracing` crate and is compiled in only with the
//! `tracing` feature (on by default). With the feature off, every log statement is removed
//! at compile time via `#[cfg(feature = "tracing")]`.
//!
//! ```no_run
//! use tracing_subscriber::{fmt, EnvFilter};
//!
//! fmt()
//!     .with_env_filter(
//!         EnvFilter::try_from_default_env()
//!             .unwrap_or_else(|_| EnvFilter::new("cbx=info"))
//!     )
//!     .init();
//! ```
//!
//! ## Log Levels
//!
//! - **INFO**: auto run start/completion
//! - **DEBUG**: fuse arming, task registration, layer computation, unserializable pluck input
//! - **TRACE**: individual invocations and ignored late completions
//! - **WARN**: errors swallowed by [`apply_ie`], tripped fuses
//! - **ERROR**: failed auto tasks, dependency cycles
//!
//! ## Tokio
//!
//! The `tokio` feature adds [`SpawnTimer::tokio`], a timer bound to the ambient Tokio
//! runtime.

// Module declarations
mod apply;
mod auto;
mod config;
mod error;
mod fuse;
mod intercept;
mod pluck;
mod runner;
mod timer;
mod types;

// Public re-exports
pub use apply::{apply_ie, IgnoreErrors};
#[cfg(feature = "tracing")]
pub use auto::CurrentSpan;
pub use auto::{apply_auto, apply_auto_with, AutoTask, Bind, Entry, Identity};
pub use config::FuseConfig;
pub use error::{CbxResult, Error};
pub use fuse::{fuse, Fuse};
pub use intercept::intercept;
pub use pluck::{pluck, PropertyPath, Segment};
pub use runner::AutoRunner;
#[cfg(feature = "tokio")]
pub use timer::TokioTimer;
pub use timer::{Elapsed, SpawnTimer, Timer, TimerHandle};
pub use types::{callback, Callback};

//! Error types for callback helpers.
//!
//! Most errors that flow through this crate belong to the caller: they are carried in the
//! `Err` side of a [`Callback`](crate::Callback) and forwarded untouched. The variants here
//! are the few errors the crate itself produces, either at construction time (an invalid
//! auto definition, an unresolvable task graph) or on a callback path (a tripped fuse).

/// Errors produced by the helpers in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A [`Fuse`](crate::Fuse) reached its deadline before the wrapped callback fired.
    #[error("fuse timeout")]
    FuseTimeout,

    /// An auto definition does not end with a task, or has a task before its last entry.
    #[error("invalid auto definition: {reason}")]
    InvalidAutoDefinition { reason: String },

    /// Two tasks registered with the same name on an [`AutoRunner`](crate::AutoRunner).
    #[error("task `{name}` is already registered")]
    DuplicateTask { name: String },

    /// A task names a dependency that no registered task provides.
    #[error("task `{task}` depends on unknown task `{dependency}`")]
    UnknownDependency { task: String, dependency: String },

    /// The named tasks depend on each other in a cycle and can never become ready.
    #[error("dependency cycle detected between tasks: {}", .tasks.join(", "))]
    CycleDetected { tasks: Vec<String> },
}

/// Result type for fallible construction and validation in this crate
pub type CbxResult<T> = Result<T, Error>;

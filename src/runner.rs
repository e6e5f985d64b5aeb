//! Dependency-resolving runner for auto tasks.
//!
//! Provides [`AutoRunner`], the callback-driven counterpart of `async.auto`: tasks are
//! registered by name, each declaring the names of the results it needs, and the runner
//! invokes every task as soon as its dependencies have completed.
//!
//! The runner owns no threads and no timers. Ready tasks are invoked by whichever thread
//! is already draining the ready queue, or else by the thread that delivered the
//! completion that made them ready. Tasks may complete synchronously, from a spawned
//! future, or from a foreign thread.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, trace, warn};

use crate::auto::{AutoTask, Bind, Identity};
use crate::error::{CbxResult, Error};

type Finish<V, E> = Box<dyn FnOnce(Result<HashMap<String, V>, E>) + Send + 'static>;

/// Build and run a graph of named [`AutoTask`]s.
///
/// # Workflow
///
/// 1. Create a runner with [`AutoRunner::new`]
/// 2. Register tasks with [`AutoRunner::add_task`]
/// 3. Start everything with [`AutoRunner::run`], passing the completion callback
///
/// The completion callback receives every task's result keyed by name, or the first error
/// any task reported. It is invoked exactly once; completions that arrive after an error
/// are ignored.
///
/// # Examples
///
/// ```
/// use std::sync::mpsc;
/// use cbx::{apply_auto, AutoRunner, Callback, Entry};
///
/// let mut runner = AutoRunner::new();
///
/// runner.add_task("x", apply_auto(vec![Entry::Task(
///     |_: Vec<Option<i64>>, cb: Callback<i64, String>| cb(Ok(2)),
/// )]).unwrap()).unwrap();
///
/// runner.add_task("y", apply_auto(vec![Entry::Task(
///     |_: Vec<Option<i64>>, cb: Callback<i64, String>| cb(Ok(3)),
/// )]).unwrap()).unwrap();
///
/// runner.add_task("sum", apply_auto(vec![
///     "x".into(),
///     "y".into(),
///     Entry::Task(|deps: Vec<Option<i64>>, cb: Callback<i64, String>| {
///         cb(Ok(deps.into_iter().flatten().sum()))
///     }),
/// ]).unwrap()).unwrap();
///
/// let (tx, rx) = mpsc::channel();
/// runner.run(move |outcome| tx.send(outcome).unwrap()).unwrap();
///
/// let results = rx.recv().unwrap().unwrap();
/// assert_eq!(results["sum"], 5);
/// ```
pub struct AutoRunner<V, E, B = Identity> {
    tasks: Vec<(String, AutoTask<V, V, E, B>)>,
    index: HashMap<String, usize>,
}

impl<V, E, B> Default for AutoRunner<V, E, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E, B> fmt::Debug for AutoRunner<V, E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoRunner")
            .field("tasks", &self.tasks.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<V, E, B> AutoRunner<V, E, B> {
    /// Create an empty runner.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl<V, E, B> AutoRunner<V, E, B>
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    B: Bind + 'static,
{
    /// Register `task` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTask`] if `name` is already registered.
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        task: AutoTask<V, V, E, B>,
    ) -> CbxResult<&mut Self> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateTask { name });
        }

        #[cfg(feature = "tracing")]
        debug!(
            task = %name,
            dependencies = ?task.dependencies(),
            "adding task to runner"
        );

        self.index.insert(name.clone(), self.tasks.len());
        self.tasks.push((name, task));
        Ok(self)
    }

    /// Group task names into topological layers.
    ///
    /// Layer `n` holds the tasks whose dependencies all live in layers `0..n`. Names
    /// within a layer are sorted.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownDependency`] if a task names a dependency nobody provides, and
    /// [`Error::CycleDetected`] if some tasks can never become ready.
    pub fn layers(&self) -> CbxResult<Vec<Vec<String>>> {
        #[cfg(feature = "tracing")]
        debug!("computing topological layers");

        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, task) in &self.tasks {
            let deps: HashSet<&str> = task.dependencies().iter().map(String::as_str).collect();
            for &dep in &deps {
                if !self.index.contains_key(dep) {
                    return Err(Error::UnknownDependency {
                        task: name.clone(),
                        dependency: dep.to_string(),
                    });
                }
                dependents.entry(dep).or_default().push(name);
            }
            in_degree.insert(name, deps.len());
        }

        // Sources: tasks with no dependencies
        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(&name, _)| name)
            .collect();

        let mut layers = Vec::new();
        let mut visited = HashSet::new();

        while !queue.is_empty() {
            let mut current_layer = Vec::new();

            for _ in 0..queue.len() {
                let Some(name) = queue.pop_front() else {
                    break;
                };
                if !visited.insert(name) {
                    continue;
                }
                current_layer.push(name.to_string());

                for &dependent in dependents.get(name).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }

            if !current_layer.is_empty() {
                current_layer.sort(); // Deterministic ordering
                layers.push(current_layer);
            }
        }

        if visited.len() < self.tasks.len() {
            let mut stuck: Vec<String> = self
                .tasks
                .iter()
                .map(|(name, _)| name)
                .filter(|name| !visited.contains(name.as_str()))
                .cloned()
                .collect();
            stuck.sort();

            #[cfg(feature = "tracing")]
            error!(tasks = ?stuck, "dependency cycle detected");

            return Err(Error::CycleDetected { tasks: stuck });
        }

        #[cfg(feature = "tracing")]
        debug!(layer_count = layers.len(), "topological layers computed");

        Ok(layers)
    }

    /// Validate the graph and start every task whose dependencies are satisfied.
    ///
    /// Returns once the tasks that are ready *now* have been invoked; the rest start as
    /// completions arrive. `on_finish` receives either all results or the first error.
    ///
    /// # Errors
    ///
    /// Validation errors from [`layers`](Self::layers). Nothing has been invoked and
    /// `on_finish` is dropped without being called.
    pub fn run<C>(self, on_finish: C) -> CbxResult<()>
    where
        C: FnOnce(Result<HashMap<String, V>, E>) + Send + 'static,
    {
        #[cfg(feature = "tracing")]
        info!(task_count = self.tasks.len(), "starting auto run");

        let layers = self.layers()?;

        #[cfg(feature = "tracing")]
        debug!(layer_count = layers.len(), "validated task graph");

        let mut waiting_on = HashMap::with_capacity(self.tasks.len());
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut ready = VecDeque::new();
        let mut pending = HashMap::with_capacity(self.tasks.len());

        for (name, task) in self.tasks {
            let deps: HashSet<&String> = task.dependencies().iter().collect();
            for dep in &deps {
                dependents
                    .entry((*dep).clone())
                    .or_default()
                    .push(name.clone());
            }
            if deps.is_empty() {
                ready.push_back((name, task));
            } else {
                waiting_on.insert(name.clone(), deps.len());
                pending.insert(name, task);
            }
        }

        if ready.is_empty() {
            // Validation guarantees a source exists unless the graph is empty.
            #[cfg(feature = "tracing")]
            info!("auto run completed with no tasks");

            on_finish(Ok(HashMap::new()));
            return Ok(());
        }

        let state = Arc::new(Mutex::new(RunState {
            pending,
            waiting_on,
            dependents,
            ready,
            dispatching: true,
            results: HashMap::new(),
            remaining: layers.iter().map(Vec::len).sum(),
            on_finish: Some(Box::new(on_finish)),
        }));

        dispatch(&state);
        Ok(())
    }
}

struct RunState<V, E, B> {
    pending: HashMap<String, AutoTask<V, V, E, B>>,
    waiting_on: HashMap<String, usize>,
    dependents: HashMap<String, Vec<String>>,
    ready: VecDeque<(String, AutoTask<V, V, E, B>)>,
    // Set while some thread is draining `ready`; completions only enqueue then
    dispatching: bool,
    results: HashMap<String, V>,
    remaining: usize,
    // Taken exactly once: on the first error or when `remaining` hits zero
    on_finish: Option<Finish<V, E>>,
}

// Drain the ready queue, invoking each task with the lock released. Only the thread that
// set `dispatching` runs this loop; tasks completing synchronously enqueue their
// dependents and return, so the stack stays flat however long the chain is.
fn dispatch<V, E, B>(state: &Arc<Mutex<RunState<V, E, B>>>)
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    B: Bind + 'static,
{
    loop {
        let (name, task, inputs) = {
            let mut guard = state.lock();
            if guard.on_finish.is_none() {
                // An earlier task already failed
                guard.ready.clear();
                guard.dispatching = false;
                return;
            }
            let Some((name, task)) = guard.ready.pop_front() else {
                guard.dispatching = false;
                return;
            };
            let inputs: HashMap<String, V> = task
                .dependencies()
                .iter()
                .filter_map(|dep| guard.results.get(dep).map(|v| (dep.clone(), v.clone())))
                .collect();
            (name, task, inputs)
        };

        #[cfg(feature = "tracing")]
        trace!(task = %name, "invoking task");

        let state_ref = Arc::clone(state);
        task.call(move |outcome| complete(&state_ref, name, outcome), &inputs);
    }
}

fn complete<V, E, B>(state: &Arc<Mutex<RunState<V, E, B>>>, name: String, outcome: Result<V, E>)
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    B: Bind + 'static,
{
    let value = match outcome {
        Ok(value) => value,
        Err(err) => {
            let finish = state.lock().on_finish.take();
            match finish {
                Some(finish) => {
                    #[cfg(feature = "tracing")]
                    error!(task = %name, "task failed, aborting auto run");

                    finish(Err(err));
                }
                None => {
                    #[cfg(feature = "tracing")]
                    trace!(task = %name, "ignoring error after auto run finished");
                }
            }
            return;
        }
    };

    let mut guard = state.lock();
    if guard.on_finish.is_none() {
        #[cfg(feature = "tracing")]
        trace!(task = %name, "ignoring completion after auto run finished");
        return;
    }
    if guard.results.contains_key(&name) {
        #[cfg(feature = "tracing")]
        warn!(task = %name, "task completed more than once, ignoring");
        return;
    }

    guard.results.insert(name.clone(), value);
    guard.remaining -= 1;

    let RunState {
        pending,
        waiting_on,
        dependents,
        ready,
        ..
    } = &mut *guard;
    for dependent in dependents.get(&name).into_iter().flatten() {
        if let Some(count) = waiting_on.get_mut(dependent) {
            *count -= 1;
            if *count == 0 {
                waiting_on.remove(dependent);
                if let Some(task) = pending.remove(dependent) {
                    ready.push_back((dependent.clone(), task));
                }
            }
        }
    }

    if guard.remaining == 0 {
        let results = std::mem::take(&mut guard.results);
        let finish = guard.on_finish.take();
        drop(guard);

        if let Some(finish) = finish {
            #[cfg(feature = "tracing")]
            info!(result_count = results.len(), "auto run completed successfully");

            finish(Ok(results));
        }
        return;
    }

    // A dispatch loop further up this stack (or on another thread) picks the new work up.
    if guard.dispatching || guard.ready.is_empty() {
        return;
    }
    guard.dispatching = true;
    drop(guard);

    dispatch(state);
}

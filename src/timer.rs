//! Runtime-agnostic one-shot timers.
//!
//! The crate never owns an executor. Anything that needs to wait (only the
//! [`Fuse`](crate::Fuse) does) asks an injected [`Timer`] to call it back later. The
//! bundled [`SpawnTimer`] builds one from a spawner and a sleep function, the same way
//! runners in the async ecosystem take a spawner closure:
//!
//! - Tokio: `SpawnTimer::new(|fut| { tokio::spawn(fut); }, tokio::time::sleep)`
//! - Smol: `SpawnTimer::new(|fut| smol::spawn(fut).detach(), |d| async move { smol::Timer::after(d).await; })`
//! - Async-std: `SpawnTimer::new(|fut| { async_std::task::spawn(fut); }, async_std::task::sleep)`

use std::future::Future;
use std::time::Duration;

use futures::future::{abortable, AbortHandle, BoxFuture};
use futures::FutureExt;

/// Work to run once a timer elapses
pub type Elapsed = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run a closure after a delay.
pub trait Timer {
    /// Arm a one-shot timer that runs `on_elapsed` after `after`, unless cancelled first.
    fn arm(&self, after: Duration, on_elapsed: Elapsed) -> TimerHandle;
}

impl<Tm: Timer + ?Sized> Timer for &Tm {
    fn arm(&self, after: Duration, on_elapsed: Elapsed) -> TimerHandle {
        (**self).arm(after, on_elapsed)
    }
}

impl<Tm: Timer + ?Sized> Timer for std::sync::Arc<Tm> {
    fn arm(&self, after: Duration, on_elapsed: Elapsed) -> TimerHandle {
        (**self).arm(after, on_elapsed)
    }
}

/// Cancellation handle for an armed timer.
///
/// Dropping the handle does **not** cancel the timer; call [`TimerHandle::cancel`].
#[derive(Debug, Clone)]
pub struct TimerHandle {
    abort: AbortHandle,
}

impl TimerHandle {
    /// Wrap an [`AbortHandle`] controlling the timer's future.
    pub fn new(abort: AbortHandle) -> Self {
        Self { abort }
    }

    /// Prevent the timer from firing. Has no effect if it already fired.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

/// A [`Timer`] backed by any async runtime.
///
/// `spawner` receives each timer's future, `sleep` produces the delay. The future is
/// wrapped with [`abortable`] so [`TimerHandle::cancel`] stops it even if it has not been
/// polled yet.
#[derive(Clone)]
pub struct SpawnTimer<S, Sl> {
    spawner: S,
    sleep: Sl,
}

impl<S, Sl, D> SpawnTimer<S, Sl>
where
    S: Fn(BoxFuture<'static, ()>),
    Sl: Fn(Duration) -> D,
    D: Future<Output = ()> + Send + 'static,
{
    /// Build a timer from a spawner and a sleep function.
    pub fn new(spawner: S, sleep: Sl) -> Self {
        Self { spawner, sleep }
    }
}

impl<S, Sl, D> Timer for SpawnTimer<S, Sl>
where
    S: Fn(BoxFuture<'static, ()>),
    Sl: Fn(Duration) -> D,
    D: Future<Output = ()> + Send + 'static,
{
    fn arm(&self, after: Duration, on_elapsed: Elapsed) -> TimerHandle {
        let delay = (self.sleep)(after);
        let (timer, abort) = abortable(async move {
            delay.await;
            on_elapsed();
        });

        (self.spawner)(timer.map(|_| ()).boxed());

        TimerHandle::new(abort)
    }
}

/// [`SpawnTimer`] on the ambient Tokio runtime.
#[cfg(feature = "tokio")]
pub type TokioTimer =
    SpawnTimer<fn(BoxFuture<'static, ()>), fn(Duration) -> tokio::time::Sleep>;

#[cfg(feature = "tokio")]
impl SpawnTimer<fn(BoxFuture<'static, ()>), fn(Duration) -> tokio::time::Sleep> {
    /// Timer that spawns onto the current Tokio runtime.
    ///
    /// Arming panics if called outside a runtime, like `tokio::spawn` does.
    pub fn tokio() -> TokioTimer {
        fn spawn(fut: BoxFuture<'static, ()>) {
            tokio::spawn(fut);
        }

        SpawnTimer {
            spawner: spawn,
            sleep: tokio::time::sleep,
        }
    }
}

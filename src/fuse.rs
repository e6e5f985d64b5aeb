//! Deadlines for callbacks that might never fire.
//!
//! A [`Fuse`] stands in for a completion callback. It races the real completion against a
//! timer: whichever happens first is forwarded to the destination callback, and everything
//! after that is dropped. The destination is invoked exactly once, either with the real
//! outcome or with [`Error::FuseTimeout`].

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

use crate::config::FuseConfig;
#[cfg(feature = "tracing")]
use crate::config::saturating_millis;
use crate::error::Error;
use crate::timer::{Timer, TimerHandle};
use crate::types::Callback;

struct FuseState<T, E> {
    callback: Option<Callback<T, E>>,
    timer: Option<TimerHandle>,
    tripped: bool,
}

/// A completion callback with a deadline.
///
/// Created by [`fuse`]. Clones share the same state, so a fuse can be handed to code that
/// may call it from several places (or several times); only the first completion counts,
/// and none counts once the deadline has passed.
pub struct Fuse<T, E> {
    state: Arc<Mutex<FuseState<T, E>>>,
}

impl<T, E> Clone for Fuse<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

/// Put a deadline of `timeout` on `callback`.
///
/// The timer is armed immediately through `timer`. If the returned [`Fuse`] is called
/// first, the timer is cancelled and the outcome is forwarded verbatim. If the timer
/// elapses first, `callback` receives `Err(Error::FuseTimeout.into())` and later calls to
/// the fuse do nothing.
///
/// # Examples
///
/// ```
/// use std::sync::mpsc;
/// use std::time::Duration;
///
/// use cbx::{fuse, Error, SpawnTimer};
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() {
/// let timer = SpawnTimer::new(|fut| { tokio::spawn(fut); }, tokio::time::sleep);
/// let (tx, rx) = mpsc::channel();
///
/// // Completes in time: forwarded once, the second call is ignored.
/// let done = tx.clone();
/// let in_time = fuse(Duration::from_millis(50), &timer, move |outcome: Result<&str, Error>| {
///     done.send(outcome).unwrap();
/// });
/// in_time.call(Ok("ok"));
/// in_time.call(Ok("again"));
///
/// // Never completes: the fuse trips.
/// let _never = fuse(Duration::from_millis(10), &timer, move |outcome: Result<&str, Error>| {
///     tx.send(outcome).unwrap();
/// });
///
/// tokio::time::sleep(Duration::from_millis(100)).await;
/// assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Ok("ok"), Err(Error::FuseTimeout)]);
/// # }
/// ```
pub fn fuse<T, E, Tm, C>(timeout: Duration, timer: &Tm, callback: C) -> Fuse<T, E>
where
    T: Send + 'static,
    E: From<Error> + Send + 'static,
    Tm: Timer + ?Sized,
    C: FnOnce(Result<T, E>) + Send + 'static,
{
    let state = Arc::new(Mutex::new(FuseState {
        callback: Some(Box::new(callback) as Callback<T, E>),
        timer: None,
        tripped: false,
    }));

    #[cfg(feature = "tracing")]
    debug!(timeout_ms = saturating_millis(timeout), "arming fuse");

    let on_timeout = Arc::clone(&state);
    let handle = timer.arm(timeout, Box::new(move || trip(&on_timeout, timeout)));

    // The timer may already have fired (zero timeout, or a timer thread that beat us to the
    // lock). Only keep the handle while the race is still open.
    let mut guard = state.lock();
    if guard.callback.is_some() {
        guard.timer = Some(handle);
    }
    drop(guard);

    Fuse { state }
}

fn trip<T, E>(state: &Mutex<FuseState<T, E>>, _timeout: Duration)
where
    E: From<Error>,
{
    let callback = {
        let mut guard = state.lock();
        guard.timer = None;
        let callback = guard.callback.take();
        if callback.is_some() {
            guard.tripped = true;
        }
        callback
    };

    if let Some(callback) = callback {
        #[cfg(feature = "tracing")]
        warn!(
            timeout_ms = saturating_millis(_timeout),
            "fuse tripped before callback fired"
        );

        callback(Err(E::from(Error::FuseTimeout)));
    }
}

impl<T, E> Fuse<T, E>
where
    T: Send + 'static,
    E: From<Error> + Send + 'static,
{
    /// Put a deadline on `callback` using a [`FuseConfig`].
    pub fn with_config<Tm, C>(config: &FuseConfig, timer: &Tm, callback: C) -> Self
    where
        Tm: Timer + ?Sized,
        C: FnOnce(Result<T, E>) + Send + 'static,
    {
        fuse(config.timeout(), timer, callback)
    }

    /// Deliver the real outcome.
    ///
    /// Forwards `outcome` and cancels the timer if this is the first completion and the
    /// deadline has not passed. Otherwise does nothing.
    pub fn call(&self, outcome: Result<T, E>) {
        let (callback, timer) = {
            let mut guard = self.state.lock();
            (guard.callback.take(), guard.timer.take())
        };

        if let Some(timer) = timer {
            timer.cancel();
        }

        match callback {
            Some(callback) => {
                #[cfg(feature = "tracing")]
                trace!("fuse forwarding real completion");

                callback(outcome)
            }
            None => {
                #[cfg(feature = "tracing")]
                trace!(tripped = self.is_tripped(), "ignoring completion on spent fuse");
            }
        }
    }

    /// Whether the deadline passed before the real completion.
    pub fn is_tripped(&self) -> bool {
        self.state.lock().tripped
    }

    /// Whether the destination callback has been invoked, by either path.
    pub fn is_spent(&self) -> bool {
        self.state.lock().callback.is_none()
    }

    /// Box this fuse as a plain [`Callback`].
    pub fn into_callback(self) -> Callback<T, E> {
        Box::new(move |outcome| self.call(outcome))
    }
}

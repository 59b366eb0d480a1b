// vim: tw=80
//! Background tasks of the health monitor

use futures::{
    channel::mpsc,
    select,
    FutureExt,
    SinkExt,
    StreamExt,
};
use std::{future::Future, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, sleep_until, timeout},
};
use tracing::{debug, error, warn};
use tracing_futures::Instrument;

use crate::kmsg::{DiskEvent, EventStream};

#[derive(Debug)]
pub(super) enum LoopMsg {
    /// Run the loop's body right away, and restart the wait
    Kick,
    /// Tell the loop to shut down, and wait for it to do so
    Shutdown,
}

/// Send `Shutdown` and wait for the task to exit, but not forever.
///
/// A task that doesn't exit in time is aborted.
async fn stop<T>(name: &'static str, mut tx: mpsc::Sender<LoopMsg>,
                 jh: JoinHandle<T>, limit: Duration) -> Option<T>
{
    let abort = jh.abort_handle();
    let fut = async move {
        // If the task already exited, the send fails.  The join still works.
        let _ = tx.send(LoopMsg::Shutdown).await;
        jh.await
    };
    match timeout(limit, fut).await {
        Ok(Ok(t)) => {
            debug!(name, "task stopped");
            Some(t)
        }
        Ok(Err(e)) => {
            error!(name, "task failed: {e}");
            None
        }
        Err(_) => {
            warn!(name, ?limit, "task did not stop in time; aborting it");
            abort.abort();
            None
        }
    }
}

/// A task that runs some work at a fixed interval.
pub(super) struct Periodic {
    name: &'static str,
    jh: JoinHandle<()>,
    tx: mpsc::Sender<LoopMsg>,
}

impl Periodic {
    /// Start a task that calls `f` every `interval`, until shut down.
    pub fn spawn<F, Fut>(name: &'static str, interval: Duration, mut f: F)
        -> Self
        where F: FnMut() -> Fut + Send + 'static,
              Fut: Future<Output=()> + Send + 'static
    {
        let (tx, mut rx) = mpsc::channel(1);
        let taskfut = async move {
            loop {
                let wakeup_time = Instant::now() + interval;
                let mut delay_fut = Box::pin(sleep_until(wakeup_time).fuse());
                select! {
                    _ = delay_fut => f().await,
                    msg = rx.select_next_some() => {
                        match msg {
                            LoopMsg::Kick => f().await,
                            LoopMsg::Shutdown => break,
                        }
                    },
                    complete => break,
                }
            }
        }.instrument(tracing::info_span!("loop", name));
        let jh = tokio::spawn(taskfut);
        Periodic { name, jh, tx }
    }

    /// Ask the task to run now.  Does nothing if a request is already queued.
    pub fn kick(&self) {
        let mut tx = self.tx.clone();
        let _ = tx.try_send(LoopMsg::Kick);
    }

    pub async fn shutdown(self, limit: Duration) {
        stop(self.name, self.tx, self.jh, limit).await;
    }
}

/// Wake-up reasons for the event listener
enum Wake {
    Event(Option<DiskEvent>),
    Msg(LoopMsg),
}

/// A task that handles kernel disk events as they arrive.
pub(super) struct Listener {
    jh: JoinHandle<Option<EventStream>>,
    tx: mpsc::Sender<LoopMsg>,
}

impl Listener {
    /// Start a task that calls `f` for each event.
    ///
    /// The task ends when shut down, returning the stream so that a later
    /// listener can pick up where this one left off.  It also ends if the
    /// stream does.
    pub fn spawn<F, Fut>(mut events: EventStream, mut f: F) -> Self
        where F: FnMut(DiskEvent) -> Fut + Send + 'static,
              Fut: Future<Output=()> + Send + 'static
    {
        let (tx, mut rx) = mpsc::channel(1);
        let taskfut = async move {
            loop {
                let wake = {
                    let mut next = events.next().fuse();
                    select! {
                        ev = next => Wake::Event(ev),
                        msg = rx.select_next_some() => Wake::Msg(msg),
                    }
                };
                match wake {
                    Wake::Event(Some(ev)) => f(ev).await,
                    Wake::Event(None) => {
                        warn!("kernel message stream ended");
                        return None;
                    }
                    Wake::Msg(LoopMsg::Kick) => (),
                    Wake::Msg(LoopMsg::Shutdown) => return Some(events),
                }
            }
        }.instrument(tracing::info_span!("loop", name = "listener"));
        let jh = tokio::spawn(taskfut);
        Listener { jh, tx }
    }

    /// Stop the task, and recover its event stream if it still has one.
    pub async fn shutdown(self, limit: Duration) -> Option<EventStream> {
        stop("listener", self.tx, self.jh, limit).await.flatten()
    }
}

// LCOV_EXCL_START
#[cfg(test)]
mod t {
use futures::stream;
use pretty_assertions::assert_eq;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use super::*;

#[tokio::test(start_paused = true)]
async fn periodic_runs_and_stops() {
    let count = Arc::new(AtomicUsize::new(0));
    let count2 = count.clone();
    let p = Periodic::spawn("test", Duration::from_secs(10), move || {
        let count3 = count2.clone();
        async move {
            count3.fetch_add(1, Ordering::Relaxed);
        }
    });
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(count.load(Ordering::Relaxed), 3);
    p.shutdown(Duration::from_secs(1)).await;
    tokio::time::sleep(Duration::from_secs(35)).await;
    assert_eq!(count.load(Ordering::Relaxed), 3);
}

#[tokio::test(start_paused = true)]
async fn periodic_kick() {
    let count = Arc::new(AtomicUsize::new(0));
    let count2 = count.clone();
    let p = Periodic::spawn("test", Duration::from_secs(10), move || {
        let count3 = count2.clone();
        async move {
            count3.fetch_add(1, Ordering::Relaxed);
        }
    });
    p.kick();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(count.load(Ordering::Relaxed), 1);
    p.shutdown(Duration::from_secs(1)).await;
}

/// A task stuck in its body gets aborted
#[tokio::test(start_paused = true)]
async fn periodic_stuck() {
    let p = Periodic::spawn("stuck", Duration::from_secs(1), || {
        futures::future::pending::<()>()
    });
    tokio::time::sleep(Duration::from_secs(2)).await;
    let start = Instant::now();
    p.shutdown(Duration::from_secs(5)).await;
    assert_eq!(start.elapsed(), Duration::from_secs(5));
}

#[tokio::test]
async fn listener_returns_stream() {
    let (mut etx, erx) = mpsc::channel::<DiskEvent>(4);
    let seen = Arc::new(AtomicUsize::new(0));
    let seen2 = seen.clone();
    let l = Listener::spawn(erx.boxed(), move |_ev| {
        let seen3 = seen2.clone();
        async move {
            seen3.fetch_add(1, Ordering::Relaxed);
        }
    });
    etx.send(DiskEvent::Attached("sdb".into())).await.unwrap();
    // Wait for the listener to consume it
    while seen.load(Ordering::Relaxed) == 0 {
        tokio::task::yield_now().await;
    }
    let mut events = l.shutdown(Duration::from_secs(5)).await.unwrap();
    etx.send(DiskEvent::Detached("sdb".into())).await.unwrap();
    assert_eq!(events.next().await, Some(DiskEvent::Detached("sdb".into())));
}

#[tokio::test]
async fn listener_stream_ends() {
    let l = Listener::spawn(stream::empty().boxed(), |_ev| async {});
    assert!(l.shutdown(Duration::from_secs(5)).await.is_none());
}
}
// LCOV_EXCL_STOP

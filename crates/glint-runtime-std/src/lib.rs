//! Standard host services backed by Rust's `std` library.
//!
//! The rendering core never flushes on its own; it raises a wake-up through
//! [`glint_core::FlushScheduler`] and waits for the host to drain the queue.
//! This crate supplies the `std` half of that contract: a pollable scheduler
//! with an optional waker, a monotonic clock for frame pacing, and a
//! [`StdRuntime`] bundle that wires both into a [`glint_core::Runtime`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use glint_core::{App, CoreError, FlushScheduler, Runtime, RuntimeHandle, UiTree, VNode};

/// Scheduler that records flush requests for a polling host loop.
pub struct StdScheduler {
    flush_requested: AtomicBool,
    flush_waker: RwLock<Option<Arc<dyn Fn() + Send + Sync + 'static>>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            flush_requested: AtomicBool::new(false),
            flush_waker: RwLock::new(None),
        }
    }

    /// Returns whether a flush has been requested since the last call.
    pub fn take_flush_request(&self) -> bool {
        self.flush_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a flush is scheduled.
    pub fn set_flush_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.flush_waker.write().unwrap() = Some(Arc::new(waker));
    }

    /// Clears any registered flush waker.
    pub fn clear_flush_waker(&self) {
        *self.flush_waker.write().unwrap() = None;
    }

    fn wake(&self) {
        let waker = self.flush_waker.read().unwrap().clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "flush_requested",
                &self.flush_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl FlushScheduler for StdScheduler {
    fn schedule_flush(&self) {
        self.flush_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Monotonic clock backed by [`std::time`].
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl StdClock {
    pub fn now(&self) -> Instant {
        Instant::now()
    }

    pub fn elapsed(&self, since: Instant) -> Duration {
        since.elapsed()
    }

    pub fn elapsed_millis(&self, since: Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }
}

/// Convenience bundle of the standard scheduler, clock, and a runtime wired
/// to them.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            clock: Arc::new(StdClock),
            runtime,
        }
    }

    /// Mounts `vnode` on this runtime's queue.
    pub fn mount<T: UiTree>(
        &self,
        tree: T,
        vnode: VNode,
        container: &str,
    ) -> Result<App<T>, CoreError> {
        App::mount_with_runtime(tree, vnode, container, self.runtime.clone())
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> Arc<StdClock> {
        Arc::clone(&self.clock)
    }

    /// Returns whether a flush was requested since the last poll.
    pub fn take_flush_request(&self) -> bool {
        self.scheduler.take_flush_request()
    }

    pub fn set_flush_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_flush_waker(waker);
    }

    pub fn clear_flush_waker(&self) {
        self.scheduler.clear_flush_waker();
    }

    /// Drains scheduled turns until the queue is idle, flushing at most
    /// `limit` times. Returns how many turns ran.
    pub fn drain<T: UiTree>(&self, app: &mut App<T>, limit: usize) -> Result<usize, CoreError> {
        let mut turns = 0;
        while app.has_work() && turns < limit {
            self.take_flush_request();
            app.flush()?;
            turns += 1;
        }
        if app.has_work() {
            log::warn!("drain stopped after {turns} turn(s) with work still queued");
        }
        Ok(turns)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use glint_core::{
        build_element, children, component, use_state, MemoryTree, Props, SetState, VNode,
    };

    use super::StdRuntime;

    thread_local! {
        static SETTER: RefCell<Option<SetState<i32>>> = RefCell::new(None);
    }

    fn counter(_props: &Props) -> VNode {
        let (count, set_count) = use_state(|| 0);
        SETTER.with(|slot| *slot.borrow_mut() = Some(set_count));
        build_element("div", Props::new(), children![count])
    }

    #[test]
    fn state_writes_request_a_flush_and_wake_the_host() {
        let runtime = StdRuntime::new();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter_arc = wakes.clone();
        runtime.set_flush_waker(move || {
            counter_arc.fetch_add(1, Ordering::SeqCst);
        });

        let mut tree = MemoryTree::new();
        tree.register_container("root");
        let mut app = runtime
            .mount(tree, component(counter, Props::new()), "root")
            .expect("mount");
        runtime.drain(&mut app, 8).expect("drain");
        runtime.take_flush_request();

        let set = SETTER.with(|slot| slot.borrow().clone()).expect("setter");
        set.set(1);
        assert!(runtime.take_flush_request(), "write should request a flush");
        assert!(wakes.load(Ordering::SeqCst) >= 1);

        runtime.drain(&mut app, 8).expect("drain");
        assert_eq!(
            app.tree().text_content(app.container()).expect("text"),
            "1"
        );
    }
}

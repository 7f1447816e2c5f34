//! Render scheduling.
//!
//! State writes never re-render in place; they enqueue the owning instance
//! here. The queue is deduplicated by instance identity and drained in one
//! pass per host turn, so any number of writes within a turn collapse into
//! a single render of each affected instance.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::CoreError;
use crate::instance::{ComponentInstance, Effect, InstanceId};
use crate::tree::UiTree;

/// Host hook for waking the event loop. Called at most once per turn, when
/// the queue transitions from empty to non-empty.
pub trait FlushScheduler: Send + Sync {
    fn schedule_flush(&self);
}

/// No-op wake. Suits hosts that poll [`Runtime::has_work`] themselves.
#[derive(Default)]
pub struct DefaultScheduler;

impl FlushScheduler for DefaultScheduler {
    fn schedule_flush(&self) {}
}

struct DeferredMount {
    instance: Rc<ComponentInstance>,
    effects: Vec<Effect>,
}

struct RuntimeInner {
    scheduler: Arc<dyn FlushScheduler>,
    /// Identity filter for the render queue.
    queued: RefCell<IndexSet<InstanceId>>,
    /// Invalidated instances in arrival order.
    queue: RefCell<Vec<(InstanceId, Weak<ComponentInstance>)>>,
    /// First-mount effects waiting for the next turn.
    deferred: RefCell<Vec<DeferredMount>>,
    flush_pending: Cell<bool>,
    flushes: Cell<u64>,
}

impl RuntimeInner {
    fn invalidate(&self, instance: &Rc<ComponentInstance>) {
        let fresh = self.queued.borrow_mut().insert(instance.id());
        if fresh {
            log::trace!("queueing instance {} for re-render", instance.id());
            self.queue
                .borrow_mut()
                .push((instance.id(), Rc::downgrade(instance)));
        }
        self.request_flush();
    }

    fn defer_first_mount(&self, instance: Rc<ComponentInstance>, effects: Vec<Effect>) {
        log::trace!(
            "deferring {} first-mount effect(s) for instance {}",
            effects.len(),
            instance.id()
        );
        self.deferred
            .borrow_mut()
            .push(DeferredMount { instance, effects });
        self.request_flush();
    }

    fn request_flush(&self) {
        if !self.flush_pending.replace(true) {
            self.scheduler.schedule_flush();
        }
    }

    fn has_work(&self) -> bool {
        !self.queue.borrow().is_empty() || !self.deferred.borrow().is_empty()
    }

    fn run_deferred(&self) -> usize {
        let pending: Vec<DeferredMount> = self.deferred.borrow_mut().drain(..).collect();
        let count = pending.len();
        for mount in pending {
            mount.instance.mark_mounted();
            for effect in mount.effects {
                effect();
            }
        }
        count
    }

    fn flush(&self, tree: &mut dyn UiTree) -> Result<usize, CoreError> {
        // Deferred first-mount effects run first; the writes they issue
        // land in the queue snapshotted just below, so they still make
        // this pass.
        self.run_deferred();

        let entries: Vec<(InstanceId, Weak<ComponentInstance>)> =
            self.queue.borrow_mut().drain(..).collect();
        self.queued.borrow_mut().clear();
        // Writes issued by the renders below re-arm the wake-up.
        self.flush_pending.set(false);

        let mut rendered = 0;
        for (id, weak) in entries {
            match weak.upgrade() {
                Some(instance) => {
                    instance.render(tree)?;
                    rendered += 1;
                }
                None => log::trace!("instance {id} dropped before its re-render"),
            }
        }
        if rendered > 0 {
            self.flushes.set(self.flushes.get() + 1);
            log::debug!("flushed {rendered} re-render(s)");
        }
        Ok(rendered)
    }
}

/// Owner of the render queue. One per mounted application; clones share the
/// same queue.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn FlushScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                scheduler,
                queued: RefCell::new(IndexSet::new()),
                queue: RefCell::new(Vec::new()),
                deferred: RefCell::new(Vec::new()),
                flush_pending: Cell::new(false),
                flushes: Cell::new(0),
            }),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Queued work, either re-renders or deferred first-mount effects.
    pub fn has_work(&self) -> bool {
        self.inner.has_work()
    }

    /// Completed flush passes that rendered at least one instance.
    pub fn flush_count(&self) -> u64 {
        self.inner.flushes.get()
    }

    /// Drains one turn of work: deferred first-mount effects, then a single
    /// render of every queued instance. Returns how many instances rendered.
    pub fn flush_turn(&self, tree: &mut dyn UiTree) -> Result<usize, CoreError> {
        self.inner.flush(tree)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

/// Weak runtime reference held by instances and state cells. Operations on
/// a handle whose runtime is gone are silently dropped.
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

impl RuntimeHandle {
    pub(crate) fn invalidate(&self, instance: &Rc<ComponentInstance>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.invalidate(instance);
        }
    }

    pub(crate) fn defer_first_mount(&self, instance: Rc<ComponentInstance>, effects: Vec<Effect>) {
        if let Some(inner) = self.inner.upgrade() {
            inner.defer_first_mount(instance, effects);
        }
    }

    pub fn has_work(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_work())
            .unwrap_or(false)
    }
}

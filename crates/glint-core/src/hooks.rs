//! Positional hooks.
//!
//! Every hook call consumes the next slot of the rendering instance's hook
//! table, creating the record on first encounter and reusing it on every
//! later render. Identity is purely positional: the sequence of hook kinds
//! must be the same on every render of an instance, and divergence is a
//! fatal usage error rather than silent slot misalignment.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::cell::ReactiveCell;
use crate::context;
use crate::error::{CoreError, HookKind};
use crate::instance::ComponentInstance;

/// A dependency list: either "always re-run" (no list) or a sequence of
/// comparison keys hashed from the caller's values. An empty key list means
/// "run once". Build key lists with the [`deps!`](crate::deps) macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deps {
    Always,
    Keys(Vec<u64>),
}

impl Deps {
    pub fn always() -> Self {
        Deps::Always
    }

    pub fn once() -> Self {
        Deps::Keys(Vec::new())
    }

    fn changed_from(&self, previous: Option<&Deps>) -> bool {
        match (self, previous) {
            (Deps::Always, _) => true,
            (_, None) => true,
            (Deps::Keys(_), Some(Deps::Always)) => true,
            (Deps::Keys(current), Some(Deps::Keys(previous))) => current != previous,
        }
    }
}

/// Hashes each expression into a dependency key list.
#[macro_export]
macro_rules! deps {
    () => {
        $crate::hooks::Deps::once()
    };
    ($($dep:expr),+ $(,)?) => {
        $crate::hooks::Deps::Keys(vec![$($crate::hash::hash_one(&$dep)),+])
    };
}

/// Optional teardown returned by an effect callback.
#[derive(Default)]
pub struct EffectCleanup(Option<Box<dyn FnOnce()>>);

impl EffectCleanup {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    fn into_inner(self) -> Option<Box<dyn FnOnce()>> {
        self.0
    }
}

impl From<()> for EffectCleanup {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

/// Sugar for `EffectCleanup::new` at the end of an effect body.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> EffectCleanup {
    EffectCleanup::new(f)
}

#[derive(Default)]
pub(crate) struct EffectState {
    deps: Option<Deps>,
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl EffectState {
    fn should_run(&self, deps: &Deps) -> bool {
        deps.changed_from(self.deps.as_ref())
    }

    fn begin_run(&mut self, deps: Deps) {
        self.run_cleanup();
        self.deps = Some(deps);
    }

    fn set_cleanup(&mut self, cleanup: Option<Box<dyn FnOnce()>>) {
        self.cleanup = cleanup;
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for EffectState {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}

pub(crate) enum HookRecord {
    State(Box<dyn Any>),
    Effect(Rc<RefCell<EffectState>>),
    Ref(Box<dyn Any>),
    Memo { value: Box<dyn Any>, deps: Deps },
}

impl HookRecord {
    fn kind(&self) -> HookKind {
        match self {
            HookRecord::State(_) => HookKind::State,
            HookRecord::Effect(_) => HookKind::Effect,
            HookRecord::Ref(_) => HookKind::Ref,
            HookRecord::Memo { .. } => HookKind::Memo,
        }
    }
}

/// Ordered, per-instance hook records, indexed by call order within a
/// render pass.
#[derive(Default)]
pub(crate) struct HookTable {
    records: Vec<HookRecord>,
    previous_len: Option<usize>,
}

impl HookTable {
    /// Called once per completed render with the number of slots consumed.
    pub(crate) fn finish_render(&mut self, used: usize) -> Result<(), CoreError> {
        if let Some(previous) = self.previous_len {
            if previous != used {
                return Err(CoreError::HookCountChanged {
                    previous,
                    current: used,
                });
            }
        }
        self.previous_len = Some(used);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    /// Resolves `slot`, creating the record on first encounter and failing
    /// loudly when the recorded kind does not match `expected`.
    fn slot(
        &mut self,
        slot: usize,
        expected: HookKind,
        create: impl FnOnce() -> HookRecord,
    ) -> &mut HookRecord {
        if slot == self.records.len() {
            self.records.push(create());
        }
        let record = &mut self.records[slot];
        let found = record.kind();
        if found != expected {
            panic!(
                "{}",
                CoreError::HookKindChanged {
                    slot,
                    previous: found,
                    current: expected,
                }
            );
        }
        record
    }
}

/// Stable setter half of a state hook. Callable from event handlers and
/// effects as well as inside renders.
pub struct SetState<T> {
    cell: ReactiveCell<T>,
    instance: Weak<ComponentInstance>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            instance: Weak::clone(&self.instance),
        }
    }
}

impl<T: PartialEq + 'static> SetState<T> {
    /// Writes `next` into the cell. When the value actually changes, the
    /// owning instance is scheduled for a batched re-render.
    pub fn set(&self, next: T) {
        if self.cell.write(next) {
            if let Some(instance) = self.instance.upgrade() {
                instance.schedule_rerender();
            }
        }
    }
}

impl<T: Clone + PartialEq + 'static> SetState<T> {
    /// Functional form: resolves the next value against the current one
    /// immediately, so repeated updates in one turn compound.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.cell.with(|value| f(value));
        self.set(next);
    }
}

/// Declares a state slot: returns the current value and a setter that
/// schedules the owning instance on change.
///
/// Panics with an "invalid hook call" error outside an active render
/// context, like every hook here.
pub fn use_state<T: Clone + PartialEq + 'static>(init: impl FnOnce() -> T) -> (T, SetState<T>) {
    let ctx = context::expect_active("use_state");
    let slot = ctx.take_slot();
    let instance = ctx.instance();
    let cell = instance.with_hooks(|hooks| {
        let record = hooks.slot(slot, HookKind::State, || {
            HookRecord::State(Box::new(ReactiveCell::new(init())))
        });
        match record {
            HookRecord::State(any) => match any.downcast_ref::<ReactiveCell<T>>() {
                Some(cell) => cell.clone(),
                None => panic!(
                    "{}",
                    CoreError::HookTypeChanged {
                        slot,
                        kind: HookKind::State,
                    }
                ),
            },
            _ => unreachable!("slot kind validated above"),
        }
    });
    let value = cell.read();
    let setter = SetState {
        cell,
        instance: Rc::downgrade(&instance),
    };
    (value, setter)
}

/// Declares an effect gated by `deps`. When the dependency list changed
/// since the previous render (or is [`Deps::Always`]), the prior cleanup
/// runs immediately and the callback is queued to run after the tree for
/// this render has been committed, never synchronously during render.
pub fn use_effect<C: Into<EffectCleanup>>(deps: Deps, effect: impl FnOnce() -> C + 'static) {
    let ctx = context::expect_active("use_effect");
    let slot = ctx.take_slot();
    let instance = ctx.instance();
    let state = instance.with_hooks(|hooks| {
        let record = hooks.slot(slot, HookKind::Effect, || {
            HookRecord::Effect(Rc::new(RefCell::new(EffectState::default())))
        });
        match record {
            HookRecord::Effect(state) => Rc::clone(state),
            _ => unreachable!("slot kind validated above"),
        }
    });
    if state.borrow().should_run(&deps) {
        state.borrow_mut().begin_run(deps);
        let state_for_run = Rc::clone(&state);
        instance.queue_effect(Box::new(move || {
            let cleanup = effect().into();
            state_for_run.borrow_mut().set_cleanup(cleanup.into_inner());
        }));
    }
}

/// A mutable box with identity stable across renders. Participates in no
/// comparison and no scheduling.
pub struct RefBox<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for RefBox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for RefBox<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for RefBox<T> {}

impl<T: 'static> RefBox<T> {
    fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }
}

impl<T: Clone + 'static> RefBox<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

/// Declares a ref slot: the same [`RefBox`] on every render.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> RefBox<T> {
    let ctx = context::expect_active("use_ref");
    let slot = ctx.take_slot();
    let instance = ctx.instance();
    instance.with_hooks(|hooks| {
        let record = hooks.slot(slot, HookKind::Ref, || {
            HookRecord::Ref(Box::new(RefBox::new(init())))
        });
        match record {
            HookRecord::Ref(any) => match any.downcast_ref::<RefBox<T>>() {
                Some(boxed) => boxed.clone(),
                None => panic!(
                    "{}",
                    CoreError::HookTypeChanged {
                        slot,
                        kind: HookKind::Ref,
                    }
                ),
            },
            _ => unreachable!("slot kind validated above"),
        }
    })
}

/// Declares a memo slot: recomputes only when `deps` changed, otherwise
/// returns the cached value.
pub fn use_memo<T: Clone + 'static>(deps: Deps, compute: impl FnOnce() -> T) -> T {
    let ctx = context::expect_active("use_memo");
    let slot = ctx.take_slot();
    let instance = ctx.instance();
    instance.with_hooks(|hooks| {
        if slot == hooks.records.len() {
            let value = compute();
            hooks.records.push(HookRecord::Memo {
                value: Box::new(value.clone()),
                deps,
            });
            return value;
        }
        let record = &mut hooks.records[slot];
        match record {
            HookRecord::Memo {
                value,
                deps: previous,
            } => {
                if deps.changed_from(Some(previous)) {
                    let next = compute();
                    *value = Box::new(next.clone());
                    *previous = deps;
                    next
                } else {
                    match value.downcast_ref::<T>() {
                        Some(cached) => cached.clone(),
                        None => panic!(
                            "{}",
                            CoreError::HookTypeChanged {
                                slot,
                                kind: HookKind::Memo,
                            }
                        ),
                    }
                }
            }
            other => panic!(
                "{}",
                CoreError::HookKindChanged {
                    slot,
                    previous: other.kind(),
                    current: HookKind::Memo,
                }
            ),
        }
    })
}

/// Stable-callback-identity hook: the degenerate memo that returns the
/// callback itself behind an `Rc`.
pub fn use_callback<F: 'static>(deps: Deps, callback: F) -> Rc<F> {
    use_memo(deps, move || Rc::new(callback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deps_change_detection() {
        let a = Deps::Keys(vec![1, 2]);
        let same = Deps::Keys(vec![1, 2]);
        let different = Deps::Keys(vec![1, 3]);
        assert!(a.changed_from(None));
        assert!(!same.changed_from(Some(&a)));
        assert!(different.changed_from(Some(&a)));
        assert!(Deps::Always.changed_from(Some(&a)));
        assert!(!Deps::once().changed_from(Some(&Deps::once())));
    }

    #[test]
    fn deps_macro_hashes_values() {
        let a = deps![1, "x"];
        let b = deps![1, "x"];
        let c = deps![2, "x"];
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(deps![], Deps::once());
    }

    #[test]
    fn effect_state_runs_cleanup_on_drop() {
        use std::cell::Cell;

        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        {
            let mut state = EffectState::default();
            state.set_cleanup(Some(Box::new(move || flag.set(true))));
        }
        assert!(ran.get());
    }
}

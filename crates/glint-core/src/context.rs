//! The single-active render context.
//!
//! Exactly one context is active per component invocation: it names the
//! instance being rendered and hands out hook slot indices in call order.
//! Contexts live on a thread-local stack pushed on render entry and popped
//! by a drop guard, so their lifetime is explicit and the stack can be
//! asserted empty at idle. Components must not render other components
//! synchronously inside their own body; nesting only happens when the
//! mounter instantiates children from returned trees, after the parent
//! context is already popped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::CoreError;
use crate::instance::ComponentInstance;

pub struct RenderCtx {
    instance: Rc<ComponentInstance>,
    next_slot: Cell<usize>,
}

impl RenderCtx {
    pub(crate) fn instance(&self) -> Rc<ComponentInstance> {
        Rc::clone(&self.instance)
    }

    /// Consumes the next positional hook slot for this render pass.
    pub(crate) fn take_slot(&self) -> usize {
        let slot = self.next_slot.get();
        self.next_slot.set(slot + 1);
        slot
    }

    pub(crate) fn slots_used(&self) -> usize {
        self.next_slot.get()
    }
}

thread_local! {
    static ACTIVE: RefCell<Vec<Rc<RenderCtx>>> = const { RefCell::new(Vec::new()) };
}

pub(crate) struct CtxGuard {
    ctx: Rc<RenderCtx>,
}

impl CtxGuard {
    pub(crate) fn slots_used(&self) -> usize {
        self.ctx.slots_used()
    }
}

impl Drop for CtxGuard {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert!(
                popped.map_or(false, |top| Rc::ptr_eq(&top, &self.ctx)),
                "render context stack out of balance"
            );
        });
    }
}

/// Installs a render context for `instance`; the guard pops it on exit.
pub(crate) fn enter(instance: Rc<ComponentInstance>) -> CtxGuard {
    let ctx = Rc::new(RenderCtx {
        instance,
        next_slot: Cell::new(0),
    });
    ACTIVE.with(|stack| stack.borrow_mut().push(Rc::clone(&ctx)));
    CtxGuard { ctx }
}

pub(crate) fn active() -> Option<Rc<RenderCtx>> {
    ACTIVE.with(|stack| stack.borrow().last().cloned())
}

pub(crate) fn active_instance() -> Option<Rc<ComponentInstance>> {
    active().map(|ctx| ctx.instance())
}

/// True when no render is in progress on this thread.
pub fn is_idle() -> bool {
    ACTIVE.with(|stack| stack.borrow().is_empty())
}

/// Resolves the active context for a hook call, failing the way the public
/// contract demands when none is installed.
pub(crate) fn expect_active(hook: &'static str) -> Rc<RenderCtx> {
    match active() {
        Some(ctx) => ctx,
        None => panic!("{}", CoreError::HookOutsideRender { hook }),
    }
}

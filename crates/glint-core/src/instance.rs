//! Durable component instances.
//!
//! A `ComponentInstance` binds a component function to its hook table and
//! live UI node across the instance's lifetime. Instances are owned by the
//! mount call that created them (the root ones by the [`App`](crate::App)
//! handle) and are destroyed when their parent's subtree is replaced;
//! dropping one runs its outstanding effect cleanups via the hook records.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::context;
use crate::error::CoreError;
use crate::hooks::HookTable;
use crate::mount;
use crate::scheduler::RuntimeHandle;
use crate::tree::{NodeId, UiTree};
use crate::vnode::{ComponentFn, Props, VNode};

pub type InstanceId = usize;

static NEXT_INSTANCE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_instance_id() -> InstanceId {
    NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) type Effect = Box<dyn FnOnce()>;

pub struct ComponentInstance {
    id: InstanceId,
    component: ComponentFn,
    props: RefCell<Props>,
    hooks: RefCell<HookTable>,
    pending_effects: RefCell<Vec<Effect>>,
    children: RefCell<Vec<Rc<ComponentInstance>>>,
    live_node: Cell<Option<NodeId>>,
    mounted: Cell<bool>,
    runtime: RuntimeHandle,
}

impl ComponentInstance {
    pub(crate) fn new(component: ComponentFn, props: Props, runtime: RuntimeHandle) -> Rc<Self> {
        Rc::new(Self {
            id: next_instance_id(),
            component,
            props: RefCell::new(props),
            hooks: RefCell::new(HookTable::default()),
            pending_effects: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            live_node: Cell::new(None),
            mounted: Cell::new(false),
            runtime,
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn live_node(&self) -> Option<NodeId> {
        self.live_node.get()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.borrow().len()
    }

    pub(crate) fn mark_mounted(&self) {
        self.mounted.set(true);
    }

    pub(crate) fn with_hooks<R>(&self, f: impl FnOnce(&mut HookTable) -> R) -> R {
        f(&mut self.hooks.borrow_mut())
    }

    pub(crate) fn queue_effect(&self, effect: Effect) {
        self.pending_effects.borrow_mut().push(effect);
    }

    /// Adds this instance to the render queue; coalesced with any other
    /// invalidations arriving in the same turn.
    pub(crate) fn schedule_rerender(self: &Rc<Self>) {
        self.runtime.invalidate(self);
    }

    /// Runs one full render pass: invoke the component function under a
    /// fresh render context, mount the produced tree, commit it in place of
    /// the previous live node, then run or defer this pass's effects.
    pub(crate) fn render(self: &Rc<Self>, tree: &mut dyn UiTree) -> Result<NodeId, CoreError> {
        self.pending_effects.borrow_mut().clear();
        let vnode = self.invoke_component()?;

        // The old child instances stay alive until the replacement subtree
        // exists, mirroring the live tree's commit-at-the-end discipline.
        let old_children = self.children.take();
        let mut new_children = Vec::new();
        let node = mount::mount_vnode(tree, &vnode, &self.runtime, &mut new_children)?;
        *self.children.borrow_mut() = new_children;

        if let Some(old) = self.live_node.get() {
            tree.replace_node(old, node)?;
        }
        self.live_node.set(Some(node));
        drop(old_children);

        let effects = std::mem::take(&mut *self.pending_effects.borrow_mut());
        if self.mounted.get() {
            // Re-render: effects run synchronously, after the commit,
            // within the same flush step.
            for effect in effects {
                effect();
            }
        } else {
            // First mount: let the tree settle for a turn before side
            // effects observe it.
            self.runtime.defer_first_mount(Rc::clone(self), effects);
        }
        Ok(node)
    }

    fn invoke_component(self: &Rc<Self>) -> Result<VNode, CoreError> {
        let guard = context::enter(Rc::clone(self));
        let vnode = {
            let props = self.props.borrow();
            self.component.call(&props)
        };
        let used = guard.slots_used();
        drop(guard);
        self.hooks.borrow_mut().finish_render(used)?;
        Ok(vnode)
    }
}

//! Mounting tree descriptions into a live tree.
//!
//! The mounter walks a [`VNode`], creating detached live nodes bottom-up and
//! instantiating component references as it meets them. Nothing becomes
//! visible until the finished subtree is appended (first mount) or swapped
//! in with `replace_node` (re-render), so a render that fails partway leaves
//! the visible tree untouched.

use std::rc::Rc;
use std::sync::Arc;

use crate::error::CoreError;
use crate::instance::ComponentInstance;
use crate::scheduler::{FlushScheduler, Runtime, RuntimeHandle};
use crate::tree::{NodeId, UiTree};
use crate::vnode::{PropValue, Props, VKind, VNode, CLASS_NAME_PROP, HANDLER_PREFIX, STYLE_PROP};

/// Materializes `vnode` as a detached subtree of `tree`. Component instances
/// created along the way are pushed into `children_out`; the caller owns
/// them for as long as the subtree stays live.
pub(crate) fn mount_vnode(
    tree: &mut dyn UiTree,
    vnode: &VNode,
    runtime: &RuntimeHandle,
    children_out: &mut Vec<Rc<ComponentInstance>>,
) -> Result<NodeId, CoreError> {
    match vnode.kind() {
        VKind::Text => Ok(tree.create_text(vnode.text().unwrap_or(""))),
        VKind::Component(f) => {
            let instance =
                ComponentInstance::new(f.clone(), vnode.props().clone(), runtime.clone());
            let node = instance.render(tree)?;
            children_out.push(instance);
            Ok(node)
        }
        VKind::Element(tag) => {
            let id = tree.create_element(tag);
            apply_props(tree, id, vnode.props())?;
            for child in vnode.children() {
                let child_node = mount_vnode(tree, child, runtime, children_out)?;
                tree.append_child(id, child_node)?;
            }
            Ok(id)
        }
    }
}

fn apply_props(tree: &mut dyn UiTree, id: NodeId, props: &Props) -> Result<(), CoreError> {
    for (name, value) in props.iter() {
        match value {
            PropValue::Handler(handler) => match name.strip_prefix(HANDLER_PREFIX) {
                Some(event) => tree.add_listener(id, event, handler.clone())?,
                None => log::warn!("handler prop `{name}` lacks the `{HANDLER_PREFIX}` prefix"),
            },
            PropValue::Style(bag) if name == STYLE_PROP => tree.merge_style(id, bag)?,
            PropValue::Style(_) => {
                log::warn!("style bag under non-style prop `{name}` ignored")
            }
            other => {
                let attr = if name == CLASS_NAME_PROP { "class" } else { name };
                if let Some(text) = other.to_attr_string() {
                    tree.set_attribute(id, attr, &text)?;
                }
            }
        }
    }
    Ok(())
}

/// A mounted application: the live tree, its runtime, and the root component
/// instances. Dropping it tears the instances down, running their effect
/// cleanups.
pub struct App<T: UiTree> {
    tree: T,
    runtime: Runtime,
    container: NodeId,
    roots: Vec<Rc<ComponentInstance>>,
}

impl<T: UiTree> App<T> {
    /// Mounts `vnode` into the container registered under `container`,
    /// clearing whatever the container held before.
    pub fn mount(tree: T, vnode: VNode, container: &str) -> Result<Self, CoreError> {
        Self::mount_with_runtime(tree, vnode, container, Runtime::default())
    }

    /// As [`App::mount`], with a runtime wired to a host scheduler.
    pub fn mount_with_scheduler(
        tree: T,
        vnode: VNode,
        container: &str,
        scheduler: Arc<dyn FlushScheduler>,
    ) -> Result<Self, CoreError> {
        Self::mount_with_runtime(tree, vnode, container, Runtime::new(scheduler))
    }

    /// As [`App::mount`], sharing an externally owned runtime.
    pub fn mount_with_runtime(
        mut tree: T,
        vnode: VNode,
        container: &str,
        runtime: Runtime,
    ) -> Result<Self, CoreError> {
        let container_id =
            tree.resolve_container(container)
                .ok_or_else(|| CoreError::ContainerNotFound {
                    name: container.to_owned(),
                })?;
        tree.clear_children(container_id)?;

        let handle = runtime.handle();
        let mut roots = Vec::new();
        let node = mount_vnode(&mut tree, &vnode, &handle, &mut roots)?;
        tree.append_child(container_id, node)?;
        log::debug!("mounted into `{container}` (node {node})");

        Ok(Self {
            tree,
            runtime,
            container: container_id,
            roots,
        })
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn root_instances(&self) -> &[Rc<ComponentInstance>] {
        &self.roots
    }

    /// Pending re-renders or deferred first-mount effects.
    pub fn has_work(&self) -> bool {
        self.runtime.has_work()
    }

    /// Runs one turn of scheduled work. Returns how many instances rendered.
    pub fn flush(&mut self) -> Result<usize, CoreError> {
        self.runtime.flush_turn(&mut self.tree)
    }
}

/// Convenience entry point mirroring [`App::mount`].
pub fn mount<T: UiTree>(tree: T, vnode: VNode, container: &str) -> Result<App<T>, CoreError> {
    App::mount(tree, vnode, container)
}

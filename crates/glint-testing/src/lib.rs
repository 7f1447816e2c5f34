//! Testing harness for the glint rendering core.
//!
//! [`TestHost`] mounts a component tree into an in-memory tree and plays the
//! part of the host event loop: it dispatches events, drains scheduled turns,
//! and counts flush passes so tests can assert on batching behavior.

use glint_core::{component, mount, App, CoreError, MemoryTree, NodeId, Props, VNode};

pub mod prelude {
    pub use crate::TestHost;
    pub use glint_core::{
        build_element, children, component, deps, fragment, on_cleanup, use_callback, use_effect,
        use_memo, use_ref, use_state, Props, VNode,
    };
}

const DEFAULT_TURN_LIMIT: usize = 64;

/// A mounted application plus the host-loop plumbing tests need.
pub struct TestHost {
    app: App<MemoryTree>,
}

impl TestHost {
    /// Mounts `component_fn` with empty props into a fresh tree with a
    /// single `root` container, then settles all scheduled turns.
    pub fn mount(component_fn: impl Fn(&Props) -> VNode + 'static) -> Self {
        Self::mount_view(component(component_fn, Props::new()))
    }

    /// Mounts an arbitrary tree description.
    pub fn mount_view(view: VNode) -> Self {
        let mut tree = MemoryTree::new();
        tree.register_container("root");
        let app = mount(tree, view, "root").expect("mount failed");
        let mut host = Self { app };
        host.pump();
        host
    }

    pub fn app(&self) -> &App<MemoryTree> {
        &self.app
    }

    pub fn container(&self) -> NodeId {
        self.app.container()
    }

    /// The single child mounted under the root container.
    pub fn root(&self) -> NodeId {
        self.app
            .tree()
            .children_of(self.app.container())
            .expect("container children")[0]
    }

    /// Drains every scheduled turn; returns how many flush passes ran.
    /// Panics when the queue fails to settle, which in practice means a
    /// render loop (an effect unconditionally writing state it depends on).
    pub fn pump(&mut self) -> usize {
        let mut passes = 0;
        while self.app.has_work() {
            self.app.flush().expect("flush failed");
            passes += 1;
            assert!(
                passes < DEFAULT_TURN_LIMIT,
                "render queue failed to settle after {passes} turns"
            );
        }
        passes
    }

    /// One turn only, for tests asserting intermediate states.
    pub fn flush_once(&mut self) -> Result<usize, CoreError> {
        self.app.flush()
    }

    pub fn has_work(&self) -> bool {
        self.app.has_work()
    }

    /// Flush passes completed so far that re-rendered at least one instance.
    pub fn flush_count(&self) -> u64 {
        self.app.runtime().flush_count()
    }

    /// Concatenated text under the root container.
    pub fn text(&self) -> String {
        self.app
            .tree()
            .text_content(self.app.container())
            .expect("container text")
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.app.tree().find_by_tag(self.app.container(), tag)
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.app
            .tree()
            .attribute(id, name)
            .expect("attribute lookup")
            .map(str::to_owned)
    }

    /// Fires `event` on the first element with `tag`, then settles the
    /// scheduled work. Returns how many listeners fired.
    pub fn dispatch_to_tag(&mut self, tag: &str, event: &str) -> usize {
        let id = match self.find_by_tag(tag) {
            Some(id) => id,
            None => panic!("no `{tag}` element in the mounted tree"),
        };
        let fired = self
            .app
            .tree_mut()
            .dispatch(id, event)
            .expect("dispatch failed");
        self.pump();
        fired
    }

    /// The usual shorthand for button-driven tests.
    pub fn click(&mut self, tag: &str) -> usize {
        self.dispatch_to_tag(tag, "click")
    }

    /// Renders the live tree as an indented outline for failure messages.
    pub fn dump(&self) -> String {
        self.app.tree().dump_tree(self.app.container())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use glint_core::{
        build_element, children, component, use_state, Props, SetState, VNode,
    };

    use super::TestHost;

    thread_local! {
        static SETTER: RefCell<Option<SetState<i32>>> = RefCell::new(None);
    }

    fn counter(_props: &Props) -> VNode {
        let (count, set_count) = use_state(|| 0);
        SETTER.with(|slot| *slot.borrow_mut() = Some(set_count.clone()));
        let set = set_count;
        build_element(
            "button",
            Props::new().on("click", move |_| set.update(|n| n + 1)),
            children![count],
        )
    }

    #[test]
    fn click_helper_drives_a_counter() {
        let mut host = TestHost::mount(counter);
        assert_eq!(host.text(), "0");
        host.click("button");
        host.click("button");
        assert_eq!(host.text(), "2");
    }

    #[test]
    fn flush_count_exposes_batching() {
        let mut host = TestHost::mount(counter);
        let set = SETTER.with(|slot| slot.borrow().clone()).expect("setter");
        set.update(|n| n + 1);
        set.update(|n| n + 1);
        host.pump();
        assert_eq!(host.flush_count(), 1);
        assert_eq!(host.text(), "2");
    }

    #[test]
    fn dump_renders_an_outline() {
        let host = TestHost::mount(counter);
        let outline = host.dump();
        assert!(outline.contains("<button>"), "outline was:\n{outline}");
        assert!(outline.contains("\"0\""), "outline was:\n{outline}");
    }
}

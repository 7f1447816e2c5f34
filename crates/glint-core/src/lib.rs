//! Reactive rendering core.
//!
//! Components are plain functions from a property bag to an immutable tree
//! description. Hooks give them durable, positionally-addressed state;
//! writes to that state are change-gated and coalesce into one batched
//! re-render per host turn. A re-render rebuilds the instance's whole
//! subtree and swaps it in atomically; there is no diffing layer.
//!
//! ```no_run
//! use glint_core::{build_element, component, mount, use_state, MemoryTree, Props};
//!
//! let view = component(
//!     |_props| {
//!         let (count, set_count) = use_state(|| 0);
//!         build_element(
//!             "button",
//!             Props::new().on("click", move |_| set_count.update(|n| n + 1)),
//!             glint_core::children![count],
//!         )
//!     },
//!     Props::new(),
//! );
//!
//! let mut tree = MemoryTree::new();
//! tree.register_container("root");
//! let mut app = mount(tree, view, "root").unwrap();
//! while app.has_work() {
//!     app.flush().unwrap();
//! }
//! ```

pub mod cell;
pub mod collections;
pub mod context;
pub mod error;
pub mod hash;
pub mod hooks;
mod instance;
mod mount;
pub mod scheduler;
pub mod tree;
pub mod vnode;

pub use cell::{ListenerId, ReactiveCell};
pub use context::is_idle;
pub use error::{CoreError, HookKind};
pub use hooks::{
    on_cleanup, use_callback, use_effect, use_memo, use_ref, use_state, Deps, EffectCleanup,
    RefBox, SetState,
};
pub use instance::{ComponentInstance, InstanceId};
pub use mount::{mount, App};
pub use scheduler::{DefaultScheduler, FlushScheduler, Runtime, RuntimeHandle};
pub use tree::{MemoryTree, NodeId, UiTree};
pub use vnode::{
    build_element, component, fragment, Child, ComponentFn, Event, EventHandler,
    PropValue, Props, StyleBag, VKind, VNode,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests;

use std::fmt;

use crate::tree::NodeId;

/// Kind tag carried by every hook slot. Hook identity is positional, so the
/// kind recorded at a slot must match on every subsequent render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    State,
    Effect,
    Ref,
    Memo,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::State => "state",
            HookKind::Effect => "effect",
            HookKind::Ref => "ref",
            HookKind::Memo => "memo",
        };
        f.write_str(name)
    }
}

/// Errors raised by the rendering core. All of them are fatal to the
/// triggering call; none are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A hook function was invoked with no render context active.
    HookOutsideRender { hook: &'static str },
    /// The sequence of hook kinds diverged from the previous render at `slot`.
    HookKindChanged {
        slot: usize,
        previous: HookKind,
        current: HookKind,
    },
    /// A render produced a different number of hook calls than the last one.
    HookCountChanged { previous: usize, current: usize },
    /// A slot was reused with the same hook kind but a different value type.
    HookTypeChanged { slot: usize, kind: HookKind },
    /// The mount target could not be resolved.
    ContainerNotFound { name: String },
    /// A live-tree operation referenced a node that no longer exists.
    NodeMissing { id: NodeId },
    /// A live-tree operation targeted a node of the wrong shape.
    InvalidTarget { id: NodeId, expected: &'static str },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::HookOutsideRender { hook } => {
                write!(f, "invalid hook call: {hook} outside an active render context")
            }
            CoreError::HookKindChanged {
                slot,
                previous,
                current,
            } => write!(
                f,
                "hook order changed: slot {slot} held a {previous} hook, now a {current} hook"
            ),
            CoreError::HookCountChanged { previous, current } => write!(
                f,
                "hook order changed: {previous} hook calls last render, {current} this render"
            ),
            CoreError::HookTypeChanged { slot, kind } => write!(
                f,
                "hook order changed: slot {slot} reused a {kind} hook with a different value type"
            ),
            CoreError::ContainerNotFound { name } => {
                write!(f, "container not found: `{name}`")
            }
            CoreError::NodeMissing { id } => write!(f, "node {id} missing"),
            CoreError::InvalidTarget { id, expected } => {
                write!(f, "node {id} is not {expected}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

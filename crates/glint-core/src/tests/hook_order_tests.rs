//! Failure-mode coverage for positional hook identity.

use std::cell::{Cell, RefCell};

use crate::{children, deps};
use crate::{
    build_element, component, mount, use_effect, use_ref, use_state, CoreError, MemoryTree, Props,
    SetState, VNode,
};

fn host() -> MemoryTree {
    let mut tree = MemoryTree::new();
    tree.register_container("root");
    tree
}

thread_local! {
    static FLIP: Cell<bool> = const { Cell::new(false) };
    static TRIGGER: RefCell<Option<SetState<i32>>> = RefCell::new(None);
}

fn arm(set: SetState<i32>) {
    TRIGGER.with(|slot| *slot.borrow_mut() = Some(set));
}

fn trip() -> SetState<i32> {
    FLIP.with(|flip| flip.set(true));
    TRIGGER.with(|slot| slot.borrow().clone()).expect("setter")
}

#[test]
#[should_panic(expected = "invalid hook call")]
fn state_hook_outside_a_render_panics() {
    let _ = use_state(|| 0);
}

#[test]
#[should_panic(expected = "invalid hook call")]
fn effect_hook_outside_a_render_panics() {
    use_effect(deps![], || {});
}

fn shrinking(_props: &Props) -> VNode {
    let (n, set) = use_state(|| 0);
    arm(set);
    if !FLIP.with(Cell::get) {
        let _ = use_ref(|| 0);
    }
    build_element("div", Props::new(), children![n])
}

#[test]
fn dropping_a_hook_call_fails_the_flush() {
    FLIP.with(|flip| flip.set(false));
    let mut app = mount(host(), component(shrinking, Props::new()), "root").expect("mount");
    while app.has_work() {
        app.flush().expect("flush");
    }

    trip().set(1);
    assert!(matches!(
        app.flush(),
        Err(CoreError::HookCountChanged {
            previous: 2,
            current: 1,
        })
    ));
}

fn kind_swapping(_props: &Props) -> VNode {
    let flipped = FLIP.with(Cell::get);
    if !flipped {
        let (n, set) = use_state(|| 0);
        arm(set);
        build_element("div", Props::new(), children![n])
    } else {
        let _ = use_ref(|| 0);
        build_element("div", Props::new(), children![])
    }
}

#[test]
#[should_panic(expected = "hook order changed")]
fn swapping_the_hook_kind_at_a_slot_panics() {
    FLIP.with(|flip| flip.set(false));
    let mut app = mount(host(), component(kind_swapping, Props::new()), "root").expect("mount");
    while app.has_work() {
        app.flush().expect("flush");
    }

    trip().set(1);
    let _ = app.flush();
}

fn type_swapping(_props: &Props) -> VNode {
    let flipped = FLIP.with(Cell::get);
    if !flipped {
        let (n, set) = use_state(|| 0i32);
        arm(set);
        build_element("div", Props::new(), children![n])
    } else {
        let (text, _set) = use_state(String::new);
        build_element("div", Props::new(), children![text])
    }
}

#[test]
#[should_panic(expected = "different value type")]
fn swapping_the_state_type_at_a_slot_panics() {
    FLIP.with(|flip| flip.set(false));
    let mut app = mount(host(), component(type_swapping, Props::new()), "root").expect("mount");
    while app.has_work() {
        app.flush().expect("flush");
    }

    trip().set(1);
    let _ = app.flush();
}

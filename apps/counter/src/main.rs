//! Terminal counter demo.
//!
//! Mounts a small component tree into an in-memory tree, simulates a few
//! click events, and prints the live tree after each settled turn. Run with
//! `RUST_LOG=debug` to watch the scheduler batch the writes.

use std::cell::RefCell;

use glint_core::{
    build_element, children, component, deps, on_cleanup, use_effect, use_state, MemoryTree,
    Props, SetState, VNode,
};
use glint_runtime_std::StdRuntime;

const TURN_LIMIT: usize = 32;

thread_local! {
    static RESET: RefCell<Option<SetState<i32>>> = RefCell::new(None);
}

fn header(props: &Props) -> VNode {
    let title = match props.get("title") {
        Some(glint_core::PropValue::Text(title)) => title.clone(),
        _ => String::new(),
    };
    build_element(
        "h1",
        Props::new().class_name("header"),
        children![title],
    )
}

fn counter(_props: &Props) -> VNode {
    let (count, set_count) = use_state(|| 0);
    RESET.with(|slot| *slot.borrow_mut() = Some(set_count.clone()));

    use_effect(deps![count], move || {
        log::info!("count is now {count}");
        on_cleanup(move || log::info!("leaving count {count}"))
    });

    let on_click = {
        let set = set_count.clone();
        move |_: &glint_core::Event| set.update(|n| n + 1)
    };

    build_element(
        "div",
        Props::new().class_name("counter"),
        children![
            component(header, Props::new().attr("title", "glint counter")),
            build_element(
                "button",
                Props::new().on("click", on_click),
                children!["count: ", count],
            ),
            (count >= 3).then(|| build_element(
                "p",
                Props::new().style([("color", "green")]),
                children!["threshold reached"],
            )),
        ],
    )
}

fn main() {
    env_logger::init();

    let runtime = StdRuntime::new();
    let clock = runtime.clock();
    let started = clock.now();

    let mut tree = MemoryTree::new();
    tree.register_container("root");
    let mut app = runtime
        .mount(tree, component(counter, Props::new()), "root")
        .expect("mount failed");
    runtime.drain(&mut app, TURN_LIMIT).expect("initial turns");

    println!("initial tree:");
    print!("{}", app.tree().dump_tree(app.container()));

    for round in 1..=4 {
        let button = app
            .tree()
            .find_by_tag(app.container(), "button")
            .expect("button");
        app.tree_mut().dispatch(button, "click").expect("dispatch");
        runtime.drain(&mut app, TURN_LIMIT).expect("turns");
        println!("\nafter click {round}:");
        print!("{}", app.tree().dump_tree(app.container()));
    }

    // Writes from outside any event handler batch the same way.
    let reset = RESET.with(|slot| slot.borrow().clone()).expect("setter");
    reset.set(0);
    runtime.drain(&mut app, TURN_LIMIT).expect("turns");
    println!("\nafter reset:");
    print!("{}", app.tree().dump_tree(app.container()));

    log::info!(
        "done in {}ms after {} batched flush(es)",
        clock.elapsed_millis(started),
        app.runtime().flush_count()
    );
}

use std::cell::RefCell;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glint_core::{
    build_element, children, component, mount, use_state, App, MemoryTree, Props, SetState, VNode,
};

const ROW_SAMPLES: &[usize] = &[16, 64, 256];

thread_local! {
    static LIST_SET: RefCell<Option<SetState<i32>>> = RefCell::new(None);
}

fn list(props: &Props) -> VNode {
    let rows = match props.get("rows") {
        Some(glint_core::PropValue::Number(n)) => *n as usize,
        _ => 0,
    };
    let (generation, set_generation) = use_state(|| 0);
    LIST_SET.with(|slot| *slot.borrow_mut() = Some(set_generation));
    let items: Vec<VNode> = (0..rows)
        .map(|row| {
            build_element(
                "li",
                Props::new().attr("data-row", row.to_string()),
                children![format!("item {row} gen {generation}")],
            )
        })
        .collect();
    build_element("ul", Props::new(), children![items])
}

fn mounted_app(rows: usize) -> App<MemoryTree> {
    let mut tree = MemoryTree::new();
    tree.register_container("root");
    let view = component(list, Props::new().number("rows", rows as f64));
    let mut app = mount(tree, view, "root").expect("mount");
    while app.has_work() {
        app.flush().expect("flush");
    }
    app
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("mount");
    for &rows in ROW_SAMPLES {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| black_box(mounted_app(rows)));
        });
    }
    group.finish();
}

fn bench_coalesced_rerender(c: &mut Criterion) {
    let mut group = c.benchmark_group("coalesced_rerender");
    for &rows in ROW_SAMPLES {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            let mut app = mounted_app(rows);
            b.iter(|| {
                let set = LIST_SET
                    .with(|slot| slot.borrow().clone())
                    .expect("setter");
                set.update(|n| n + 1);
                set.update(|n| n + 1);
                let rendered = app.flush().expect("flush");
                black_box(rendered)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mount, bench_coalesced_rerender);
criterion_main!(benches);

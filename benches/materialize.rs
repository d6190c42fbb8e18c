//! Benchmark: eager materialization vs lazy expansion of a wide, deep render.
//!
//! Run with: `cargo bench --bench materialize`

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;
use serde_json::{Value, json};

use vdom_inspector::{
    ItemLabelRenderer, ItemTree, SerializedNode, TreeListView, TreeViewState, TreeViewStyle,
    materialize,
};

/// Builds an element tree with `fanout` children per level.
fn render(depth: usize, fanout: usize) -> Value {
    if depth == 0 {
        return json!("leaf text");
    }
    let children: Vec<Value> = (0..fanout).map(|_| render(depth - 1, fanout)).collect();
    json!({
        "type": "hnode",
        "tag": "div",
        "properties": { "classes": ["row"], "key": depth },
        "children": children
    })
}

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");
    for (depth, fanout) in [(4, 6), (6, 5)] {
        let node = SerializedNode::from_value(render(depth, fanout));
        let label = format!("{depth}x{fanout}");

        group.bench_with_input(BenchmarkId::new("eager", &label), &node, |b, node| {
            b.iter(|| black_box(materialize(node, "")));
        });

        group.bench_with_input(BenchmarkId::new("lazy_root", &label), &node, |b, node| {
            b.iter(|| {
                let mut tree = ItemTree::from_vdom(node);
                let mut state = TreeViewState::new();
                state.set_expanded("/0", true);
                state.sync(&mut tree);
                black_box(state.visible_len())
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let node = SerializedNode::from_value(render(5, 6));
    let pure = materialize(&node, "");
    let mut tree = ItemTree::from_vdom(&node);
    let mut state = TreeViewState::new();
    for id in pure.ids() {
        state.set_expanded(id, true);
    }
    state.sync(&mut tree);

    let style = TreeViewStyle::default();
    let label = ItemLabelRenderer::new(&style);
    let area = Rect::new(0, 0, 120, 40);

    c.bench_function("render_expanded_viewport", |b| {
        b.iter(|| {
            let mut buffer = Buffer::empty(area);
            TreeListView::new(&tree, &label, style.clone()).render(area, &mut buffer, &mut state);
            black_box(buffer);
        });
    });
}

criterion_group!(benches, bench_materialize, bench_render);
criterion_main!(benches);

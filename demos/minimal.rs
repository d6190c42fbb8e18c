// Minimal example: render a small vDOM snapshot as a lazy tree into a buffer.
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;
use serde_json::json;

use vdom_inspector::{ItemLabelRenderer, ItemTree, SerializedNode, TreeListView, TreeViewState, TreeViewStyle};

fn main() {
    // A widget rendering a list; only the expanded levels get materialized.
    let snapshot = SerializedNode::from_value(json!({
        "type": "wnode",
        "widgetConstructor": "TodoList",
        "rendered": [{
            "type": "hnode",
            "tag": "ul",
            "children": [
                { "type": "hnode", "tag": "li", "properties": { "key": "a" }, "children": ["write"] },
                { "type": "hnode", "tag": "li", "properties": { "key": "b" }, "children": ["test"] }
            ]
        }]
    }));
    let mut tree = ItemTree::from_vdom(&snapshot);

    // State holds expansion/selection by path and must live across frames.
    let mut state = TreeViewState::new();
    state.set_expanded("/0", true);
    state.set_expanded("/0/0", true);
    state.sync(&mut tree);

    let style = TreeViewStyle::default();
    let label = ItemLabelRenderer::new(&style);
    let widget = TreeListView::new(&tree, &label, style.clone());

    // Render into an in-memory buffer (no terminal required for the example).
    let area = Rect::new(0, 0, 40, 8);
    let mut buffer = Buffer::empty(area);
    widget.render(area, &mut buffer, &mut state);

    for y in 0..area.height {
        let line: String = (0..area.width)
            .filter_map(|x| buffer.cell((x, y)).map(ratatui::buffer::Cell::symbol))
            .collect();
        println!("{line}");
    }
}

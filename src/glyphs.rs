use ratatui::style::Style;
use ratatui::text::{Line, Span};
use serde::{Deserialize, Serialize};

use crate::context::TreeRowContext;
use crate::model::TreeModel;
use crate::style::TreeViewStyle;
use crate::tree::{ItemTree, NodeId};

/// Named glyph set, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlyphSet {
    #[default]
    Unicode,
    Ascii,
}

#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
    /// Marker in front of an identity-key badge.
    pub key: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
            key: "⚷",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
            key: "#",
        }
    }

    pub const fn from_set(set: GlyphSet) -> Self {
        match set {
            GlyphSet::Unicode => Self::unicode(),
            GlyphSet::Ascii => Self::ascii(),
        }
    }
}

/// Turns a tree row into a styled line.
pub trait TreeLabelRenderer<T: TreeModel> {
    fn line<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Line<'a>;
}

/// Guide lines and expander glyph in front of a row's label.
pub fn tree_prefix_spans<'a>(ctx: &TreeRowContext<'_>, glyphs: &TreeGlyphs<'a>) -> Vec<Span<'a>> {
    let expander = if ctx.has_children {
        if ctx.is_expanded {
            glyphs.expanded
        } else {
            glyphs.collapsed
        }
    } else if ctx.level == 0 {
        ""
    } else {
        glyphs.leaf
    };

    let mut spans = Vec::with_capacity(ctx.is_tail_stack.len() + 2);
    if ctx.level == 0 || !ctx.draw_lines {
        for _ in 0..ctx.level {
            spans.push(Span::raw(glyphs.empty));
        }
    } else {
        for (l, is_last) in ctx.is_tail_stack.iter().enumerate() {
            let part = if l == (ctx.level as usize) - 1 {
                if *is_last {
                    glyphs.branch_last
                } else {
                    glyphs.branch
                }
            } else if *is_last {
                glyphs.indent
            } else {
                glyphs.vert
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    }

    if !expander.is_empty() {
        spans.push(Span::raw(expander));
        spans.push(Span::raw(" "));
    }
    spans
}

/// Renders [`ItemTree`] rows: guides, `key: ` prefix, kind-styled value text and key badge.
pub struct ItemLabelRenderer<'s> {
    style: &'s TreeViewStyle<'s>,
}

impl<'s> ItemLabelRenderer<'s> {
    pub const fn new(style: &'s TreeViewStyle<'s>) -> Self {
        Self { style }
    }
}

impl TreeLabelRenderer<ItemTree> for ItemLabelRenderer<'_> {
    fn line<'a>(
        &'a self,
        model: &'a ItemTree,
        id: NodeId,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Line<'a> {
        let mut spans = tree_prefix_spans(ctx, glyphs);
        let Some(label) = model.label(id) else {
            return Line::from(spans);
        };
        let value_style = model
            .icon(id)
            .map_or_else(Style::default, |icon| self.style.palette.style_for(icon));

        if let Some(key) = &label.key {
            spans.push(Span::styled(key.as_str(), self.style.key_style));
            spans.push(Span::raw(": "));
        }
        spans.push(Span::styled(label.text.as_str(), value_style));
        if let Some(badge) = &label.badge {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(glyphs.key, self.style.badge_style));
            spans.push(Span::styled(badge.as_str(), self.style.badge_style));
        }

        let line = Line::from(spans);
        if ctx.is_selected {
            line.patch_style(self.style.selected_style)
        } else {
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(level: u16, tail: &[bool], has_children: bool, draw_lines: bool) -> TreeRowContext<'_> {
        TreeRowContext {
            level,
            is_tail_stack: tail,
            is_expanded: false,
            has_children,
            is_selected: false,
            draw_lines,
            line_style: Style::default(),
        }
    }

    fn text(spans: &[Span<'_>]) -> String {
        spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn guide_lines_follow_tail_stack() {
        let glyphs = TreeGlyphs::ascii();
        let spans = tree_prefix_spans(&ctx(2, &[false, true], false, true), &glyphs);

        assert_eq!(text(&spans), "|  `--* ");
    }

    #[test]
    fn root_without_children_has_no_expander() {
        let glyphs = TreeGlyphs::ascii();
        let spans = tree_prefix_spans(&ctx(0, &[], false, true), &glyphs);

        assert!(spans.is_empty());
    }

    #[test]
    fn collapsed_node_without_lines_is_indented() {
        let glyphs = TreeGlyphs::ascii();
        let spans = tree_prefix_spans(&ctx(1, &[true], true, false), &glyphs);

        assert_eq!(text(&spans), "   > ");
    }
}

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Borders;
use serde::{Deserialize, Serialize};

use crate::materialize::IconClass;

/// Scroll policy applied when the cursor row changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeScrollPolicy {
    #[default]
    KeepInView,
    CenterOnSelect,
}

/// Per-kind styles, so each runtime kind of value is visually distinct.
#[derive(Clone, Copy, Debug)]
pub struct KindPalette {
    pub empty: Style,
    pub string: Style,
    pub number: Style,
    pub boolean: Style,
    pub symbol: Style,
    pub function: Style,
    pub composite: Style,
    pub element: Style,
    pub widget: Style,
}

impl KindPalette {
    pub const fn plain() -> Self {
        let style = Style::new();
        Self {
            empty: style,
            string: style,
            number: style,
            boolean: style,
            symbol: style,
            function: style,
            composite: style,
            element: style,
            widget: style,
        }
    }

    pub const fn colored() -> Self {
        Self {
            empty: Style::new().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            string: Style::new().fg(Color::Green),
            number: Style::new().fg(Color::Cyan),
            boolean: Style::new().fg(Color::Magenta),
            symbol: Style::new().fg(Color::Yellow),
            function: Style::new().fg(Color::Blue).add_modifier(Modifier::ITALIC),
            composite: Style::new().fg(Color::Gray),
            element: Style::new().fg(Color::LightBlue),
            widget: Style::new().fg(Color::LightYellow).add_modifier(Modifier::BOLD),
        }
    }

    pub const fn style_for(&self, icon: IconClass) -> Style {
        match icon {
            IconClass::Null | IconClass::Undefined => self.empty,
            IconClass::String => self.string,
            IconClass::Number => self.number,
            IconClass::Boolean => self.boolean,
            IconClass::Symbol => self.symbol,
            IconClass::Function => self.function,
            IconClass::Array | IconClass::Object => self.composite,
            IconClass::HNode => self.element,
            IconClass::WNode => self.widget,
        }
    }
}

impl Default for KindPalette {
    fn default() -> Self {
        Self::colored()
    }
}

/// Visual settings of the tree widget.
#[derive(Clone)]
pub struct TreeViewStyle<'a> {
    pub title: Option<Line<'a>>,
    pub block_style: Style,
    pub border_style: Style,
    /// Style of the cursor row.
    pub highlight_style: Style,
    /// Style of the selected row.
    pub selected_style: Style,
    pub line_style: Style,
    pub key_style: Style,
    pub badge_style: Style,
    pub palette: KindPalette,
    pub highlight_symbol: &'a str,
    pub borders: Borders,
    pub virtualize_rows: bool,
    pub scroll_policy: TreeScrollPolicy,
}

impl Default for TreeViewStyle<'_> {
    fn default() -> Self {
        Self {
            title: None,
            block_style: Style::default(),
            border_style: Style::default(),
            highlight_style: Style::default().add_modifier(Modifier::REVERSED),
            selected_style: Style::default().add_modifier(Modifier::BOLD),
            line_style: Style::default(),
            key_style: Style::default().fg(Color::LightMagenta),
            badge_style: Style::default().fg(Color::DarkGray),
            palette: KindPalette::default(),
            highlight_symbol: ">> ",
            borders: Borders::ALL,
            virtualize_rows: false,
            scroll_policy: TreeScrollPolicy::KeepInView,
        }
    }
}

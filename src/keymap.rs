use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::action::TreeAction;
use crate::panel::PanelAction;
use crate::store::View;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeymapProfile {
    #[default]
    Default,
    Vim,
    Arrows,
}

#[derive(Clone, Copy, Debug)]
pub struct TreeKeyBindings {
    profile: KeymapProfile,
}

impl Default for TreeKeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeKeyBindings {
    pub const fn new() -> Self {
        Self {
            profile: KeymapProfile::Default,
        }
    }

    pub const fn with_profile(profile: KeymapProfile) -> Self {
        Self { profile }
    }

    pub const fn profile(&self) -> KeymapProfile {
        self.profile
    }

    pub const fn set_profile(&mut self, profile: KeymapProfile) {
        self.profile = profile;
    }

    pub fn resolve<C>(&self, key: KeyEvent) -> Option<TreeAction<C>> {
        let nav_action = match self.profile {
            KeymapProfile::Default => Self::resolve_default_nav(key),
            KeymapProfile::Vim => Self::resolve_vim_nav(key),
            KeymapProfile::Arrows => Self::resolve_arrow_nav(key),
        };
        if nav_action.is_some() {
            return nav_action;
        }

        Self::resolve_common(key)
    }

    pub fn resolve_with<C, F>(&self, key: KeyEvent, custom: F) -> Option<TreeAction<C>>
    where
        F: Fn(KeyEvent) -> Option<C>,
    {
        if let Some(action) = custom(key) {
            return Some(TreeAction::Custom(action));
        }

        self.resolve(key)
    }

    /// Resolves panel-wide keys: view switching, refresh, focus, the invalidation toggle and quit.
    pub const fn resolve_panel(key: KeyEvent) -> Option<PanelAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(PanelAction::Quit),
                KeyCode::Char('r') => Some(PanelAction::Refresh),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Char('1') => Some(PanelAction::Show(View::Vdom)),
            KeyCode::Char('2') => Some(PanelAction::Show(View::Logs)),
            KeyCode::Char('3') => Some(PanelAction::Show(View::Store)),
            KeyCode::Char('4') => Some(PanelAction::Show(View::Messages)),
            KeyCode::Char('i') => Some(PanelAction::ToggleInvalidationHighlight),
            KeyCode::F(5) | KeyCode::Char('R') => Some(PanelAction::Refresh),
            KeyCode::Tab => Some(PanelAction::SwitchFocus),
            KeyCode::Char('q') | KeyCode::Esc => Some(PanelAction::Quit),
            _ => None,
        }
    }

    const fn resolve_default_nav<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Some(TreeAction::SelectPrev),
            KeyCode::Down | KeyCode::Char('j') => Some(TreeAction::SelectNext),
            KeyCode::Left | KeyCode::Char('h') => Some(TreeAction::SelectParent),
            KeyCode::Right | KeyCode::Char('l') => Some(TreeAction::SelectChild),
            _ => None,
        }
    }

    const fn resolve_vim_nav<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Char('k') => Some(TreeAction::SelectPrev),
            KeyCode::Char('j') => Some(TreeAction::SelectNext),
            KeyCode::Char('h') => Some(TreeAction::SelectParent),
            KeyCode::Char('l') => Some(TreeAction::SelectChild),
            _ => None,
        }
    }

    const fn resolve_arrow_nav<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Up => Some(TreeAction::SelectPrev),
            KeyCode::Down => Some(TreeAction::SelectNext),
            KeyCode::Left => Some(TreeAction::SelectParent),
            KeyCode::Right => Some(TreeAction::SelectChild),
            _ => None,
        }
    }

    const fn resolve_common<C>(key: KeyEvent) -> Option<TreeAction<C>> {
        match key.code {
            KeyCode::Enter => Some(TreeAction::Activate),
            KeyCode::Char(' ') => Some(TreeAction::ToggleNode),
            KeyCode::Char('c') => Some(TreeAction::CollapseAll),
            KeyCode::Char('g') => Some(TreeAction::ToggleGuides),
            KeyCode::Home => Some(TreeAction::SelectFirst),
            KeyCode::End => Some(TreeAction::SelectLast),
            _ => None,
        }
    }
}

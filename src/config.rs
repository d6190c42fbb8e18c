//! User configuration, loaded from TOML.
//!
//! ```toml
//! diagnostic_root = "__dojo2_diagnostics__"
//! glyphs = "ascii"
//! draw_lines = true
//! scroll_policy = "center_on_select"
//! sort_properties = true
//! render_precision = 2
//! message_capacity = 500
//! keymap = "vim"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bridge::DEFAULT_DIAGNOSTIC_ROOT;
use crate::channel::DEFAULT_MESSAGE_CAPACITY;
use crate::error::{InspectorError, Result};
use crate::glyphs::GlyphSet;
#[cfg(feature = "keymap")]
use crate::keymap::KeymapProfile;
use crate::properties::PropertyOptions;
use crate::style::TreeScrollPolicy;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Global the inspected page exposes its diagnostics API under.
    pub diagnostic_root: String,
    pub glyphs: GlyphSet,
    /// Draw tree guide lines. Default: true.
    pub draw_lines: bool,
    pub scroll_policy: TreeScrollPolicy,
    /// List properties in key order instead of insertion order. Default: false.
    pub sort_properties: bool,
    /// Decimals shown for `innerRender` / `outerRender` timings. Default: 2.
    pub render_precision: usize,
    /// Push messages kept before the oldest are dropped. Default: 500.
    pub message_capacity: usize,
    #[cfg(feature = "keymap")]
    pub keymap: KeymapProfile,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            diagnostic_root: DEFAULT_DIAGNOSTIC_ROOT.to_owned(),
            glyphs: GlyphSet::default(),
            draw_lines: true,
            scroll_policy: TreeScrollPolicy::default(),
            sort_properties: false,
            render_precision: 2,
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            #[cfg(feature = "keymap")]
            keymap: KeymapProfile::default(),
        }
    }
}

impl InspectorConfig {
    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Loads a TOML file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|source| InspectorError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded inspector config");
        Ok(config)
    }

    pub const fn property_options(&self) -> PropertyOptions {
        PropertyOptions {
            sort: self.sort_properties,
            precision: self.render_precision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = InspectorConfig::from_toml_str("").unwrap();
        assert_eq!(config, InspectorConfig::default());
        assert_eq!(config.diagnostic_root, "__dojo2_diagnostics__");
    }

    #[test]
    fn partial_document_overrides_given_keys() {
        let config = InspectorConfig::from_toml_str(
            "glyphs = \"ascii\"\nscroll_policy = \"center_on_select\"\nrender_precision = 3\nmessage_capacity = 20\n",
        )
        .unwrap();

        assert_eq!(config.glyphs, GlyphSet::Ascii);
        assert_eq!(config.scroll_policy, TreeScrollPolicy::CenterOnSelect);
        assert_eq!(config.property_options().precision, 3);
        assert_eq!(config.message_capacity, 20);
        assert!(config.draw_lines);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        assert!(InspectorConfig::from_toml_str("glyphs = \"emoji\"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = InspectorConfig::load("/nonexistent/vdom-inspector.toml");
        assert!(matches!(result, Err(InspectorError::Io(_))));
    }
}

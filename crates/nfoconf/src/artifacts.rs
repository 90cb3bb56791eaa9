//! Artifact policy - how uploads are rendered and how long they live.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retention window for uploaded groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Seconds after creation before a group and its sidecars are deleted.
    /// Default: 300
    #[serde(default = "RetentionConfig::default_ttl_secs")]
    pub ttl_secs: u64,

    /// Re-arm evictions from stored deadlines at startup.
    /// Default: true
    #[serde(default = "RetentionConfig::default_persist_deadlines")]
    pub persist_deadlines: bool,
}

impl RetentionConfig {
    fn default_ttl_secs() -> u64 {
        300
    }

    fn default_persist_deadlines() -> bool {
        true
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: Self::default_ttl_secs(),
            persist_deadlines: Self::default_persist_deadlines(),
        }
    }
}

/// Glyph cell and colours for the text rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Glyph cell width in pixels. Default: 8
    #[serde(default = "RenderConfig::default_glyph_width")]
    pub glyph_width: u32,

    /// Glyph cell height (row pitch) in pixels. Default: 16
    #[serde(default = "RenderConfig::default_glyph_height")]
    pub glyph_height: u32,

    /// Border around the text block in pixels. Default: 20
    #[serde(default = "RenderConfig::default_padding")]
    pub padding: u32,

    /// Text colour. Default: #ffffff
    #[serde(default = "RenderConfig::default_foreground")]
    pub foreground: String,

    /// Canvas colour. Default: #000000
    #[serde(default = "RenderConfig::default_background")]
    pub background: String,
}

impl RenderConfig {
    fn default_glyph_width() -> u32 {
        8
    }

    fn default_glyph_height() -> u32 {
        16
    }

    fn default_padding() -> u32 {
        20
    }

    fn default_foreground() -> String {
        "#ffffff".to_string()
    }

    fn default_background() -> String {
        "#000000".to_string()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            glyph_width: Self::default_glyph_width(),
            glyph_height: Self::default_glyph_height(),
            padding: Self::default_padding(),
            foreground: Self::default_foreground(),
            background: Self::default_background(),
        }
    }
}

/// Artifact policy configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default)]
    pub retention: RetentionConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

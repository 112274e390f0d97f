use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default layer side in pixels.
pub const DEFAULT_SIDE: u32 = 2048;

/// Order in which sprites are fed to the packer. Every order is a stable sort
/// over the registry snapshot (identifier order), so packing is deterministic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending `w * h`.
    AreaAsc,
    /// Descending `w * h`; usually gives tighter layers.
    AreaDesc,
    MaxSideDesc,
    NameAsc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_asc" => Ok(Self::AreaAsc),
            "area_desc" => Ok(Self::AreaDesc),
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "name_asc" => Ok(Self::NameAsc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasConfig {
    /// Side of every (square) layer in pixels. Must be a power of two.
    #[serde(default = "default_side")]
    pub side: u32,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    /// Pixels with alpha <= threshold count as transparent when trimming.
    #[serde(default)]
    pub trim_threshold: u8,
    /// Draw red outlines around placements when compositing (debug).
    #[serde(default)]
    pub outlines: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            side: default_side(),
            sort_order: default_sort_order(),
            trim_threshold: 0,
            outlines: false,
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns `InvalidSide` unless `side` is a non-zero power of two.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.side.is_power_of_two() {
            return Err(crate::error::AtlasError::InvalidSide(self.side));
        }
        Ok(())
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_side() -> u32 {
    DEFAULT_SIDE
}
fn default_sort_order() -> SortOrder {
    SortOrder::AreaAsc
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn side(mut self, v: u32) -> Self {
        self.cfg.side = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn trim_threshold(mut self, v: u8) -> Self {
        self.cfg.trim_threshold = v;
        self
    }
    pub fn outlines(mut self, v: bool) -> Self {
        self.cfg.outlines = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

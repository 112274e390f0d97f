//! Core library of the atlasmaker sprite-atlas tool.
//!
//! - Registry: `SpriteRegistry` maps unique identifiers to sprites and tracks image lifetimes
//! - Trimming: `trim` computes the opaque bounds of an RGBA bitmap
//! - Packing: `AtlasPacker` sorts the registry's sprites and packs them into square layers
//!   with a guillotine binary partition tree, leaving a one-pixel gutter between neighbours
//!
//! Quick example:
//! ```ignore
//! use std::sync::Arc;
//! use atlasmaker_core::prelude::*;
//! # fn main() -> atlasmaker_core::Result<()> {
//! let registry = Arc::new(SpriteRegistry::new());
//! let img = image::ImageReader::open("hero.png")?.decode()?;
//! registry.register(load_sprite("hero", img, 0)?)?;
//! let packer = AtlasPacker::new(registry.clone(), AtlasConfig::default())?;
//! packer.rebuild()?;
//! println!("layers: {}", packer.fetch_layers().len());
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod packer;
pub mod registry;
pub mod trim;

pub use atlas::*;
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use registry::*;
pub use trim::*;

/// Convenience prelude for common types and functions.
/// Importing `atlasmaker_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::AtlasPacker;
    pub use crate::compositing::render_layer;
    pub use crate::config::{AtlasConfig, AtlasConfigBuilder, SortOrder, DEFAULT_SIDE};
    pub use crate::error::{AtlasError, Result};
    pub use crate::import::{import_files, import_files_with, load_sprite, ImportReport};
    pub use crate::model::{AtlasStats, ImageHandle, Layer, Placement, Point, Rect, Sprite};
    pub use crate::packer::pack_sprites;
    pub use crate::registry::{Removed, SpriteRegistry};
    pub use crate::trim::{trim, trim_image, trim_with_threshold};
}

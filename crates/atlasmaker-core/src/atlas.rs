use crate::compositing::render_layer;
use crate::config::AtlasConfig;
use crate::error::Result;
use crate::model::{AtlasStats, Layer};
use crate::packer::pack_sprites;
use crate::registry::SpriteRegistry;
use image::RgbaImage;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, instrument};

/// Packs the sprites of a registry into layers and publishes the result.
///
/// The published layer list is replaced as a whole: readers calling
/// [`fetch_layers`](Self::fetch_layers) see either the previous list or the new one.
/// A failed rebuild leaves the previous list in place.
pub struct AtlasPacker {
    registry: Arc<SpriteRegistry>,
    cfg: AtlasConfig,
    layers: Mutex<Arc<Vec<Layer>>>,
    rebuilding: Mutex<()>,
}

impl AtlasPacker {
    pub fn new(registry: Arc<SpriteRegistry>, cfg: AtlasConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            registry,
            cfg,
            layers: Mutex::new(Arc::new(Vec::new())),
            rebuilding: Mutex::new(()),
        })
    }

    pub fn registry(&self) -> &Arc<SpriteRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.cfg
    }

    /// Layer side in pixels.
    pub fn side(&self) -> u32 {
        self.cfg.side
    }

    #[instrument(skip_all)]
    /// Re-packs the registry's current sprites and publishes the new layers.
    ///
    /// Concurrent calls run one after the other; the last to finish wins.
    pub fn rebuild(&self) -> Result<()> {
        let _serial = lock(&self.rebuilding);
        let snapshot = self.registry.sprites();
        let layers = pack_sprites(snapshot.values(), &self.cfg)?;
        let stats = AtlasStats::from_layers(&layers);
        *lock(&self.layers) = Arc::new(layers);
        info!(
            layers = stats.num_layers,
            sprites = stats.num_sprites,
            occupancy = format!("{:.2}%", stats.occupancy * 100.0),
            "atlas rebuilt"
        );
        Ok(())
    }

    /// Currently published layers, in creation order.
    pub fn fetch_layers(&self) -> Arc<Vec<Layer>> {
        lock(&self.layers).clone()
    }

    /// Drops all published layers.
    pub fn clear(&self) {
        *lock(&self.layers) = Arc::new(Vec::new());
    }

    /// Draws the published layers, outlining placements when `outlines` is set
    /// in the config.
    pub fn render_layers(&self) -> Vec<RgbaImage> {
        self.fetch_layers()
            .iter()
            .map(|layer| render_layer(layer, self.cfg.outlines))
            .collect()
    }

    /// Statistics over the published layers.
    pub fn stats(&self) -> AtlasStats {
        AtlasStats::from_layers(&self.fetch_layers())
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

use crate::error::{AtlasError, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge (`x + w`), saturating at `u32::MAX`.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge (`y + h`), saturating at `u32::MAX`.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }

    /// Returns true if `r` lies fully inside `self` (half-open edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }

    /// Returns true if the half-open areas of `self` and `r` share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
}

/// Named anchor location in image coordinates. May lie outside the image.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Process-unique identity of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl ImageId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared handle to decoded RGBA pixels.
///
/// Cloning is cheap and keeps the same [`ImageId`]; two handles are "the same image"
/// exactly when their ids are equal, regardless of pixel content.
#[derive(Clone)]
pub struct ImageHandle {
    id: ImageId,
    pixels: Arc<RgbaImage>,
}

impl ImageHandle {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            id: ImageId::next(),
            pixels: Arc::new(image),
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Number of live clones of this handle, the registry's included.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.pixels)
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImageHandle {}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// A sprite record: identifier, source image and its opaque bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    identifier: String,
    image: ImageHandle,
    bounds: Rect,
    anchors: BTreeMap<String, Point>,
}

impl Sprite {
    /// Creates a sprite after checking that `bounds` lies inside the image.
    pub fn new(identifier: impl Into<String>, image: ImageHandle, bounds: Rect) -> Result<Self> {
        let identifier = identifier.into();
        let right = bounds.x.checked_add(bounds.w);
        let bottom = bounds.y.checked_add(bounds.h);
        let inside = matches!(
            (right, bottom),
            (Some(r), Some(b)) if r <= image.width() && b <= image.height()
        );
        if !inside {
            return Err(AtlasError::InvalidInput(format!(
                "bounds {:?} of sprite {} exceed its {}x{} image",
                bounds,
                identifier,
                image.width(),
                image.height()
            )));
        }
        Ok(Self {
            identifier,
            image,
            bounds,
            anchors: BTreeMap::new(),
        })
    }

    pub fn with_anchor(mut self, name: impl Into<String>, at: Point) -> Self {
        self.anchors.insert(name.into(), at);
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn anchors(&self) -> &BTreeMap<String, Point> {
        &self.anchors
    }

    /// Packed size `(w, h)`.
    pub fn size(&self) -> (u32, u32) {
        (self.bounds.w, self.bounds.h)
    }

    pub(crate) fn set_identifier(&mut self, identifier: String) {
        self.identifier = identifier;
    }

    pub(crate) fn anchors_mut(&mut self) -> &mut BTreeMap<String, Point> {
        &mut self.anchors
    }
}

/// A sprite placed at its top-left position within a layer.
#[derive(Debug, Clone)]
pub struct Placement {
    pub sprite: Sprite,
    pub x: u32,
    pub y: u32,
}

impl Placement {
    /// Occupied rectangle in layer coordinates.
    pub fn rect(&self) -> Rect {
        let (w, h) = self.sprite.size();
        Rect::new(self.x, self.y, w, h)
    }
}

/// One square atlas texture and the sprites placed on it.
#[derive(Debug, Clone)]
pub struct Layer {
    pub index: usize,
    pub side: u32,
    pub placements: Vec<Placement>,
}

impl Layer {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Top-left position of `identifier` in this layer, if placed here.
    pub fn position_of(&self, identifier: &str) -> Option<(u32, u32)> {
        self.placements
            .iter()
            .find(|p| p.sprite.identifier() == identifier)
            .map(|p| (p.x, p.y))
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect().area()).sum()
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtlasStats {
    /// Number of layers produced.
    pub num_layers: usize,
    /// Number of placed sprites.
    pub num_sprites: usize,
    /// Sum of `side * side` over all layers.
    pub total_layer_area: u64,
    /// Sum of placed sprite areas.
    pub used_area: u64,
    /// used_area / total_layer_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl AtlasStats {
    pub fn from_layers(layers: &[Layer]) -> Self {
        let num_layers = layers.len();
        let num_sprites = layers.iter().map(Layer::len).sum();
        let total_layer_area = layers
            .iter()
            .map(|l| (l.side as u64) * (l.side as u64))
            .sum();
        let used_area = layers.iter().map(Layer::used_area).sum();
        let occupancy = if total_layer_area > 0 {
            used_area as f64 / total_layer_area as f64
        } else {
            0.0
        };
        Self {
            num_layers,
            num_sprites,
            total_layer_area,
            used_area,
            occupancy,
        }
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Layers: {}, Sprites: {}, Occupancy: {:.2}%, Total Area: {} px², Used Area: {} px²",
            self.num_layers,
            self.num_sprites,
            self.occupancy * 100.0,
            self.total_layer_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.total_layer_area.saturating_sub(self.used_area)
    }
}

use crate::error::{AtlasError, Result};
use crate::model::{ImageHandle, ImageId, Point, Sprite};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Identifier → sprite registry with image lifetime tracking.
///
/// Every binding holds one reference on its sprite's image, counted per
/// [`ImageId`]. The registry keeps a handle alive while any binding refers to it
/// and drops it with the last one. All access goes through a single mutex, so a
/// registry can be shared as `Arc<SpriteRegistry>` between the packer and UI code.
#[derive(Default)]
pub struct SpriteRegistry {
    inner: Mutex<RegistryState>,
}

#[derive(Default)]
struct RegistryState {
    by_id: BTreeMap<String, Sprite>,
    // Parallel to `by_id`: which image each identifier holds.
    image_refs: HashMap<String, ImageId>,
    owners: HashMap<ImageId, (usize, ImageHandle)>,
}

/// Outcome of [`SpriteRegistry::remove`].
#[derive(Debug, Clone)]
pub struct Removed {
    pub sprite: Sprite,
    /// True when the removed binding was the last owner of its image.
    pub image_released: bool,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // Mutations validate before writing, so a poisoned state is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Binds `sprite` under its identifier.
    pub fn register(&self, sprite: Sprite) -> Result<()> {
        let mut state = self.lock();
        state.check_free(sprite.identifier())?;
        debug!(identifier = sprite.identifier(), "register sprite");
        state.bind(sprite);
        Ok(())
    }

    /// Moves the binding of `old` to `new`. Renaming to the current identifier is a no-op.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        let mut state = self.lock();
        if !state.by_id.contains_key(old) {
            return Err(AtlasError::UnknownIdentifier(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        state.check_free(new)?;
        let Some(mut sprite) = state.unbind(old) else {
            return Err(AtlasError::UnknownIdentifier(old.to_string()));
        };
        sprite.set_identifier(new.to_string());
        debug!(old, new, "rename sprite");
        state.bind(sprite);
        Ok(())
    }

    /// Unbinds `identifier`, releasing its image if no other binding shares it.
    pub fn remove(&self, identifier: &str) -> Result<Removed> {
        let mut state = self.lock();
        let image_id = state
            .image_refs
            .get(identifier)
            .copied()
            .ok_or_else(|| AtlasError::UnknownIdentifier(identifier.to_string()))?;
        let sprite = state
            .unbind(identifier)
            .ok_or_else(|| AtlasError::UnknownIdentifier(identifier.to_string()))?;
        let image_released = !state.owners.contains_key(&image_id);
        debug!(identifier, image_released, "remove sprite");
        Ok(Removed {
            sprite,
            image_released,
        })
    }

    /// Checks that `candidate` could be registered right now.
    pub fn validate_identifier(&self, candidate: &str) -> Result<()> {
        self.lock().check_free(candidate)
    }

    /// Snapshot of the current identifiers.
    pub fn identifiers(&self) -> BTreeSet<String> {
        self.lock().by_id.keys().cloned().collect()
    }

    /// Snapshot of the identifier → sprite map.
    pub fn sprites(&self) -> BTreeMap<String, Sprite> {
        self.lock().by_id.clone()
    }

    pub fn get(&self, identifier: &str) -> Option<Sprite> {
        self.lock().by_id.get(identifier).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.lock().by_id.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().by_id.is_empty()
    }

    /// True while at least one binding refers to `image`.
    pub fn holds_image(&self, image: &ImageHandle) -> bool {
        self.lock().owners.contains_key(&image.id())
    }

    /// Number of bindings sharing `image`.
    pub fn image_owner_count(&self, image: &ImageHandle) -> usize {
        self.lock()
            .owners
            .get(&image.id())
            .map(|(count, _)| *count)
            .unwrap_or(0)
    }

    /// Adds or moves the named anchor of a registered sprite.
    pub fn set_anchor(&self, identifier: &str, name: &str, at: Point) -> Result<()> {
        let mut state = self.lock();
        let sprite = state
            .by_id
            .get_mut(identifier)
            .ok_or_else(|| AtlasError::UnknownIdentifier(identifier.to_string()))?;
        sprite.anchors_mut().insert(name.to_string(), at);
        Ok(())
    }

    /// Removes the named anchor; returns its last position if it existed.
    pub fn remove_anchor(&self, identifier: &str, name: &str) -> Result<Option<Point>> {
        let mut state = self.lock();
        let sprite = state
            .by_id
            .get_mut(identifier)
            .ok_or_else(|| AtlasError::UnknownIdentifier(identifier.to_string()))?;
        Ok(sprite.anchors_mut().remove(name))
    }
}

impl RegistryState {
    fn check_free(&self, identifier: &str) -> Result<()> {
        if identifier.is_empty() {
            return Err(AtlasError::EmptyIdentifier);
        }
        if self.by_id.contains_key(identifier) {
            return Err(AtlasError::DuplicateIdentifier(identifier.to_string()));
        }
        Ok(())
    }

    fn bind(&mut self, sprite: Sprite) {
        let image = sprite.image().clone();
        let identifier = sprite.identifier().to_string();
        self.owners
            .entry(image.id())
            .and_modify(|(count, _)| *count += 1)
            .or_insert_with(|| (1, image.clone()));
        self.image_refs.insert(identifier.clone(), image.id());
        self.by_id.insert(identifier, sprite);
    }

    fn unbind(&mut self, identifier: &str) -> Option<Sprite> {
        let sprite = self.by_id.remove(identifier)?;
        if let Some(image_id) = self.image_refs.remove(identifier) {
            if let Some((count, _)) = self.owners.get_mut(&image_id) {
                *count -= 1;
                if *count == 0 {
                    self.owners.remove(&image_id);
                }
            }
        }
        Some(sprite)
    }
}

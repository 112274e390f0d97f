use crate::config::{AtlasConfig, SortOrder};
use crate::error::{AtlasError, Result};
use crate::model::{Layer, Sprite};
use tracing::{debug, instrument};

pub mod kd_tree;

use kd_tree::KdNode;

/// Stable-sorts `sprites` in place according to `order`.
pub fn sort_sprites(sprites: &mut [&Sprite], order: SortOrder) {
    match order {
        SortOrder::AreaAsc => sprites.sort_by_key(|s| s.bounds().area()),
        SortOrder::AreaDesc => sprites.sort_by(|a, b| b.bounds().area().cmp(&a.bounds().area())),
        SortOrder::MaxSideDesc => sprites.sort_by(|a, b| {
            let (aw, ah) = a.size();
            let (bw, bh) = b.size();
            bw.max(bh).cmp(&aw.max(ah))
        }),
        SortOrder::NameAsc => sprites.sort_by(|a, b| a.identifier().cmp(b.identifier())),
        SortOrder::None => {}
    }
}

#[instrument(skip_all, fields(count = tracing::field::Empty, side = cfg.side))]
/// Packs `sprites` into as many `side x side` layers as needed.
///
/// Sprites are sorted (stably) by `cfg.sort_order`, then placed greedily into the
/// newest layer; when it has no room a new layer is opened. Earlier layers are never
/// revisited. Fails with `OversizedSprite` if a sprite does not fit an empty layer.
pub fn pack_sprites<'a, I>(sprites: I, cfg: &AtlasConfig) -> Result<Vec<Layer>>
where
    I: IntoIterator<Item = &'a Sprite>,
{
    cfg.validate()?;
    let mut sorted: Vec<&Sprite> = sprites.into_iter().collect();
    tracing::Span::current().record("count", sorted.len());
    sort_sprites(&mut sorted, cfg.sort_order);

    let mut roots: Vec<KdNode<'_>> = Vec::new();
    for spr in sorted {
        let placed = roots.last_mut().and_then(|root| root.insert(spr));
        if placed.is_some() {
            continue;
        }
        let mut root = KdNode::root(cfg.side);
        if root.insert(spr).is_none() {
            let (width, height) = spr.size();
            return Err(AtlasError::OversizedSprite {
                identifier: spr.identifier().to_string(),
                width,
                height,
                side: cfg.side,
            });
        }
        debug!(layer = roots.len(), first = spr.identifier(), "open layer");
        roots.push(root);
    }

    Ok(roots
        .iter()
        .enumerate()
        .map(|(index, root)| {
            let mut placements = Vec::new();
            root.collect(&mut placements);
            Layer {
                index,
                side: cfg.side,
                placements,
            }
        })
        .collect())
}

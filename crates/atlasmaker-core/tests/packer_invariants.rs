use atlasmaker_core::packer::kd_tree::KdNode;
use atlasmaker_core::prelude::*;
use image::RgbaImage;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;

fn sprite(id: &str, w: u32, h: u32) -> Sprite {
    Sprite::new(id, ImageHandle::new(RgbaImage::new(w, h)), Rect::new(0, 0, w, h)).expect("sprite")
}

fn random_registry(seed: u64, count: usize, max: u32) -> Arc<SpriteRegistry> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let registry = Arc::new(SpriteRegistry::new());
    for i in 0..count {
        let w = rng.gen_range(1..=max);
        let h = rng.gen_range(1..=max);
        registry.register(sprite(&format!("s{:04}", i), w, h)).expect("register");
    }
    registry
}

/// Grows each rect by the one-pixel gutter and checks pairwise disjointness.
fn gutters_disjoint(rects: &[Rect]) -> bool {
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            let a = rects[i];
            let b = rects[j];
            let a = Rect::new(a.x, a.y, a.w + 1, a.h + 1);
            let b = Rect::new(b.x, b.y, b.w + 1, b.h + 1);
            if a.intersects(&b) {
                return false;
            }
        }
    }
    true
}

#[test]
fn random_pack_is_disjoint_contained_and_complete() {
    for order in [SortOrder::AreaAsc, SortOrder::AreaDesc, SortOrder::MaxSideDesc] {
        let registry = random_registry(42, 300, 120);
        let cfg = AtlasConfig::builder().side(512).sort_order(order).build();
        let packer = AtlasPacker::new(registry.clone(), cfg).expect("packer");
        packer.rebuild().expect("rebuild");
        let layers = packer.fetch_layers();
        assert!(layers.len() > 1, "300 sprites should not fit one 512 layer");

        let bounds = Rect::new(0, 0, 512, 512);
        let mut seen = BTreeSet::new();
        for (i, layer) in layers.iter().enumerate() {
            assert_eq!(layer.index, i);
            assert!(!layer.is_empty());
            let rects: Vec<Rect> = layer.placements.iter().map(|p| p.rect()).collect();
            for r in &rects {
                assert!(bounds.contains(r), "{:?} escapes the layer", r);
            }
            assert!(gutters_disjoint(&rects), "placements touch in layer {}", i);
            for p in &layer.placements {
                assert!(seen.insert(p.sprite.identifier().to_string()), "placed twice");
            }
        }
        assert_eq!(seen, registry.identifiers());
    }
}

#[test]
fn rebuild_is_deterministic() {
    let registry = random_registry(7, 200, 200);
    let packer = AtlasPacker::new(registry, AtlasConfig::builder().side(1024).build()).expect("packer");

    let layout = |packer: &AtlasPacker| -> Vec<Vec<(String, u32, u32)>> {
        packer
            .fetch_layers()
            .iter()
            .map(|l| {
                l.placements
                    .iter()
                    .map(|p| (p.sprite.identifier().to_string(), p.x, p.y))
                    .collect()
            })
            .collect()
    };

    packer.rebuild().expect("rebuild");
    let first = layout(&packer);
    packer.rebuild().expect("rebuild");
    let second = layout(&packer);
    assert_eq!(first, second);
}

#[test]
fn pack_sprites_matches_rebuild() {
    let registry = random_registry(11, 50, 64);
    let cfg = AtlasConfig::builder().side(256).build();
    let packer = AtlasPacker::new(registry.clone(), cfg.clone()).expect("packer");
    packer.rebuild().expect("rebuild");
    let sprites = registry.sprites();
    let direct = pack_sprites(sprites.values(), &cfg).expect("pack");
    let published = packer.fetch_layers();
    assert_eq!(direct.len(), published.len());
    for (a, b) in direct.iter().zip(published.iter()) {
        let ra: Vec<Rect> = a.placements.iter().map(|p| p.rect()).collect();
        let rb: Vec<Rect> = b.placements.iter().map(|p| p.rect()).collect();
        assert_eq!(ra, rb);
    }
}

#[test]
fn kd_node_children_tile_parent_with_seam() {
    let spr = sprite("a", 30, 10);
    let mut root = KdNode::root(64);
    let placed = root.insert(&spr).expect("fits");
    assert_eq!(placed, Rect::new(0, 0, 30, 10));
    assert!(!root.is_leaf());
    assert!(root.sprite().is_none());

    // dw = 34 > dh = 54 is false: horizontal split first.
    let [top, bottom] = root.children().expect("split");
    assert_eq!(top.placeholder(), Rect::new(0, 0, 64, 10));
    assert_eq!(bottom.placeholder(), Rect::new(0, 11, 64, 53));
    assert!(bottom.is_leaf());

    // The top strip then splits vertically around the sprite.
    let [left, right] = top.children().expect("split");
    assert_eq!(left.placeholder(), Rect::new(0, 0, 30, 10));
    assert_eq!(left.sprite().map(|s| s.identifier()), Some("a"));
    assert_eq!(right.placeholder(), Rect::new(31, 0, 33, 10));
}

#[test]
fn kd_node_rejects_when_full() {
    let a = sprite("a", 16, 16);
    let b = sprite("b", 1, 1);
    let mut root = KdNode::root(16);
    assert_eq!(root.insert(&a), Some(Rect::new(0, 0, 16, 16)));
    assert!(root.is_leaf());
    assert_eq!(root.insert(&b), None);
}

#[test]
fn concurrent_readers_never_see_partial_layers() {
    let registry = random_registry(3, 150, 100);
    let total = registry.len();
    let packer = AtlasPacker::new(registry, AtlasConfig::builder().side(512).build()).expect("packer");

    std::thread::scope(|s| {
        for _ in 0..2 {
            s.spawn(|| {
                for _ in 0..5 {
                    packer.rebuild().expect("rebuild");
                }
            });
        }
        s.spawn(|| {
            for _ in 0..200 {
                let layers = packer.fetch_layers();
                let placed: usize = layers.iter().map(|l| l.len()).sum();
                assert!(placed == 0 || placed == total);
            }
        });
    });
    assert_eq!(packer.stats().num_sprites, total);
}

use atlasmaker_core::import::{identifier_from_path, is_image};
use atlasmaker_core::prelude::*;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("atlasmaker-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn write_png(path: &Path, w: u32, h: u32, opaque: (u32, u32)) {
    let mut img = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    img.put_pixel(opaque.0, opaque.1, Rgba([200, 100, 50, 255]));
    img.save(path).expect("write png");
}

#[test]
fn identifiers_come_from_file_stems() {
    assert_eq!(identifier_from_path(Path::new("a/b/hero.png")).as_deref(), Some("hero"));
    assert_eq!(identifier_from_path(Path::new("Walk.01.JPG")).as_deref(), Some("Walk.01"));
    assert_eq!(identifier_from_path(Path::new("notes.txt")).as_deref(), Some("notes.txt"));
    assert_eq!(identifier_from_path(Path::new("..")), None);
    assert!(is_image(Path::new("x.GIF")));
    assert!(is_image(Path::new("x.jpeg")));
    assert!(!is_image(Path::new("x.bmp")));
    assert!(!is_image(Path::new("png")));
}

#[test]
fn load_sprite_trims_transparent_margin() {
    let mut img = RgbaImage::from_pixel(10, 8, Rgba([0, 0, 0, 0]));
    img.put_pixel(2, 1, Rgba([1, 2, 3, 255]));
    img.put_pixel(6, 5, Rgba([1, 2, 3, 255]));
    img.put_pixel(9, 7, Rgba([1, 2, 3, 4]));
    let sprite = load_sprite("s", DynamicImage::ImageRgba8(img.clone()), 4).expect("sprite");
    assert_eq!(sprite.identifier(), "s");
    assert_eq!(sprite.bounds(), Rect::new(2, 1, 4, 4));
    assert_eq!(sprite.size(), (4, 4));
    assert_eq!(sprite.image().width(), 10);

    let loose = load_sprite("t", DynamicImage::ImageRgba8(img), 0).expect("sprite");
    assert_eq!(loose.bounds(), Rect::new(2, 1, 7, 6));
}

#[test]
fn import_registers_skips_and_reports_failures() {
    let dir = scratch_dir("import");
    let hero = dir.join("hero.png");
    let coin = dir.join("coin.png");
    let broken = dir.join("broken.png");
    write_png(&hero, 16, 16, (3, 4));
    write_png(&coin, 8, 8, (0, 0));
    std::fs::write(&broken, b"not an image").expect("write");
    let missing = dir.join("missing.png");

    let registry = SpriteRegistry::new();
    let paths = vec![hero.clone(), coin.clone(), broken.clone(), missing.clone()];
    let report = import_files(&registry, &paths, 0);

    let mut imported = report.imported.clone();
    imported.sort();
    assert_eq!(imported, vec!["coin".to_string(), "hero".to_string()]);
    assert!(report.skipped.is_empty());
    let failed: Vec<&PathBuf> = report.failed.iter().map(|(p, _)| p).collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&&broken));
    assert!(failed.contains(&&missing));
    assert_eq!(registry.get("hero").expect("hero").bounds(), Rect::new(3, 4, 0, 0));

    // Importing again leaves the registry alone.
    let again = import_files(&registry, &[hero.clone(), coin.clone()], 0);
    assert!(again.imported.is_empty());
    assert_eq!(again.skipped.len(), 2);
    assert_eq!(registry.len(), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn same_stem_in_one_batch_is_skipped() {
    let dir = scratch_dir("stems");
    let a = dir.join("tile.png");
    let b = dir.join("sub");
    std::fs::create_dir_all(&b).expect("mkdir");
    let b = b.join("tile.png");
    write_png(&a, 4, 4, (1, 1));
    write_png(&b, 4, 4, (2, 2));

    let registry = SpriteRegistry::new();
    let report = import_files(&registry, &[a, b], 0);
    assert_eq!(report.imported, vec!["tile".to_string()]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(registry.len(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn config_validation_and_defaults() {
    let cfg = AtlasConfig::default();
    assert_eq!(cfg.side, DEFAULT_SIDE);
    assert_eq!(cfg.sort_order, SortOrder::AreaAsc);
    assert!(cfg.validate().is_ok());

    for bad in [0, 3, 1000, 2047] {
        let cfg = AtlasConfig::builder().side(bad).build();
        assert!(matches!(cfg.validate(), Err(AtlasError::InvalidSide(s)) if s == bad));
    }
    assert!(AtlasConfig::builder().side(1).build().validate().is_ok());
}

#[test]
fn config_deserialises_partial_json() {
    let cfg: AtlasConfig =
        serde_json::from_str(r#"{ "side": 512, "sort_order": "max_side_desc" }"#).expect("parse");
    assert_eq!(cfg.side, 512);
    assert_eq!(cfg.sort_order, SortOrder::MaxSideDesc);
    assert_eq!(cfg.trim_threshold, 0);
    assert!(!cfg.outlines);

    let empty: AtlasConfig = serde_json::from_str("{}").expect("parse");
    assert_eq!(empty, AtlasConfig::default());
}

#[test]
fn sort_order_parses_case_insensitively() {
    assert_eq!("AREA_DESC".parse::<SortOrder>(), Ok(SortOrder::AreaDesc));
    assert_eq!("name_asc".parse::<SortOrder>(), Ok(SortOrder::NameAsc));
    assert_eq!("none".parse::<SortOrder>(), Ok(SortOrder::None));
    assert!("diagonal".parse::<SortOrder>().is_err());
}

#[test]
fn import_reports_every_path_to_the_callback() {
    use std::sync::Mutex;

    let dir = scratch_dir("callback");
    let ok = dir.join("ok.png");
    let dup = dir.join("dup.png");
    let bad = dir.join("bad.gif");
    write_png(&ok, 4, 4, (1, 1));
    write_png(&dup, 4, 4, (1, 1));
    std::fs::write(&bad, b"GIF89a?").expect("write");

    let registry = SpriteRegistry::new();
    let taken = Sprite::new("dup", ImageHandle::new(RgbaImage::new(1, 1)), Rect::new(0, 0, 1, 1)).expect("sprite");
    registry.register(taken).expect("register");

    let seen = Mutex::new(Vec::new());
    let paths = vec![ok.clone(), dup.clone(), bad.clone()];
    let report = import_files_with(&registry, &paths, 0, |p| {
        seen.lock().expect("lock").push(p.to_path_buf());
    });

    let mut seen = seen.into_inner().expect("lock");
    seen.sort();
    let mut expected = paths.clone();
    expected.sort();
    assert_eq!(seen, expected);
    assert_eq!(report.imported, vec!["ok".to_string()]);
    assert_eq!(report.skipped, vec![dup]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, bad);

    let _ = std::fs::remove_dir_all(&dir);
}

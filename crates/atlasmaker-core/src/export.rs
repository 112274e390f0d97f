use crate::model::{AtlasStats, Layer};
use serde_json::{json, Value};

/// Describe `layers` as JSON: `{ layers: [{ index, side, sprites: [...] }], meta }`.
///
/// Each sprite entry carries its identifier, placed rectangle (`x, y, w, h`), the
/// trimmed `source` rectangle inside its image, the image size and its anchors.
pub fn layers_to_json(layers: &[Layer]) -> Value {
    let layers_val = layers
        .iter()
        .map(|layer| {
            let sprites: Vec<Value> = layer
                .placements
                .iter()
                .map(|p| {
                    let r = p.rect();
                    let src = p.sprite.bounds();
                    let image = p.sprite.image();
                    json!({
                        "identifier": p.sprite.identifier(),
                        "x": r.x,
                        "y": r.y,
                        "w": r.w,
                        "h": r.h,
                        "source": {"x": src.x, "y": src.y, "w": src.w, "h": src.h},
                        "sourceSize": {"w": image.width(), "h": image.height()},
                        "anchors": p.sprite.anchors(),
                    })
                })
                .collect();
            json!({
                "index": layer.index,
                "side": layer.side,
                "sprites": sprites,
            })
        })
        .collect::<Vec<_>>();
    json!({
        "layers": layers_val,
        "meta": {
            "app": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "stats": AtlasStats::from_layers(layers),
        }
    })
}

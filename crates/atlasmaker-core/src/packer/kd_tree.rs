use crate::model::{Placement, Rect, Sprite};

/// Node of the binary partition tree that carves one layer.
///
/// A node is either a leaf (no children, possibly occupied by one sprite whose size
/// equals the placeholder) or an internal node with exactly two children that tile
/// the placeholder minus a one-pixel seam. Internal nodes never hold a sprite.
pub struct KdNode<'a> {
    placeholder: Rect,
    sub: Option<Box<[KdNode<'a>; 2]>>,
    sprite: Option<&'a Sprite>,
}

impl<'a> KdNode<'a> {
    pub fn new(placeholder: Rect) -> Self {
        Self {
            placeholder,
            sub: None,
            sprite: None,
        }
    }

    /// Root covering a whole `side x side` layer.
    pub fn root(side: u32) -> Self {
        Self::new(Rect::new(0, 0, side, side))
    }

    pub fn placeholder(&self) -> Rect {
        self.placeholder
    }

    pub fn is_leaf(&self) -> bool {
        self.sub.is_none()
    }

    pub fn sprite(&self) -> Option<&'a Sprite> {
        self.sprite
    }

    pub fn children(&self) -> Option<&[KdNode<'a>; 2]> {
        self.sub.as_deref()
    }

    /// Places `spr` somewhere in this subtree.
    ///
    /// Returns the placeholder of the leaf that now holds it, or `None` when the
    /// subtree has no room. A failed insert never modifies the tree.
    pub fn insert(&mut self, spr: &'a Sprite) -> Option<Rect> {
        if let Some(sub) = self.sub.as_mut() {
            let [first, second] = &mut **sub;
            return first.insert(spr).or_else(|| second.insert(spr));
        }
        if self.sprite.is_some() {
            return None;
        }

        let Rect {
            x: px,
            y: py,
            w: pw,
            h: ph,
        } = self.placeholder;
        let (rw, rh) = spr.size();
        if rw > pw || rh > ph {
            return None;
        }
        if rw == pw && rh == ph {
            self.sprite = Some(spr);
            return Some(self.placeholder);
        }

        let dw = pw - rw;
        let dh = ph - rh;
        // The +1/-1 leaves a one-pixel gutter between the two children.
        let children = if dw > dh {
            [
                KdNode::new(Rect::new(px, py, rw, ph)),
                KdNode::new(Rect::new(px + rw + 1, py, pw - rw - 1, ph)),
            ]
        } else {
            [
                KdNode::new(Rect::new(px, py, pw, rh)),
                KdNode::new(Rect::new(px, py + rh + 1, pw, ph - rh - 1)),
            ]
        };
        let sub = self.sub.insert(Box::new(children));
        sub[0].insert(spr)
    }

    /// Appends every occupied leaf in this subtree, `sub[0]` before `sub[1]`.
    pub fn collect(&self, out: &mut Vec<Placement>) {
        if let Some(spr) = self.sprite {
            out.push(Placement {
                sprite: spr.clone(),
                x: self.placeholder.x,
                y: self.placeholder.y,
            });
        }
        if let Some(sub) = &self.sub {
            for child in sub.iter() {
                child.collect(out);
            }
        }
    }
}

//! Binary-tree rectangle packer for square texture atlases.
//!
//! Every node owns a rectangle. A leaf is either free or holds one payload;
//! splitting a free leaf turns it into an internal node whose two children
//! partition its rectangle exactly. Nodes never merge back.
//!
//! ```text
//!  vertical split (width slack larger)   horizontal split
//!  ┌──────┬───────────┐                   ┌──────────────────┐
//!  │ left │   right   │                   │       left       │
//!  │ w×H  │ (W-w)×H   │                   │       W×h        │
//!  │      │           │                   ├──────────────────┤
//!  └──────┴───────────┘                   │  right  W×(H-h)  │
//!                                         └──────────────────┘
//! ```

/// Axis-aligned rectangle in atlas units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Position assigned to a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PackedRect<P> {
    pub x: u32,
    pub y: u32,
    pub payload: P,
}

#[derive(Debug)]
enum NodeKind<T> {
    Leaf(Option<T>),
    Split(Box<[AtlasNode<T>; 2]>),
}

#[derive(Debug)]
struct AtlasNode<T> {
    rect: Rect,
    kind: NodeKind<T>,
}

impl<T> AtlasNode<T> {
    fn new(rect: Rect) -> Self {
        Self { rect, kind: NodeKind::Leaf(None) }
    }

    /// Place `payload` in a `width x height` slot, handing it back on failure.
    fn insert(&mut self, width: u32, height: u32, payload: T) -> Result<(), T> {
        let rect = self.rect;
        match &mut self.kind {
            NodeKind::Split(children) => {
                let [left, right] = &mut **children;
                return match left.insert(width, height, payload) {
                    Ok(()) => Ok(()),
                    Err(payload) => right.insert(width, height, payload),
                };
            }
            NodeKind::Leaf(Some(_)) => return Err(payload),
            NodeKind::Leaf(slot) => {
                if width == rect.width && height == rect.height {
                    *slot = Some(payload);
                    return Ok(());
                }
            }
        }

        if width > rect.width || height > rect.height {
            return Err(payload);
        }

        let (first, second) = if rect.width - width > rect.height - height {
            (
                Rect::new(rect.x, rect.y, width, rect.height),
                Rect::new(rect.x + width, rect.y, rect.width - width, rect.height),
            )
        } else {
            (
                Rect::new(rect.x, rect.y, rect.width, height),
                Rect::new(rect.x, rect.y + height, rect.width, rect.height - height),
            )
        };

        let mut left = AtlasNode::new(first);
        let result = left.insert(width, height, payload);
        self.kind = NodeKind::Split(Box::new([left, AtlasNode::new(second)]));
        result
    }
}

/// Square atlas packer.
///
/// # Example
/// ```
/// use qb_mesher::AtlasPacker;
///
/// let mut atlas = AtlasPacker::new(4);
/// assert!(atlas.insert(2, 4, "a").is_ok());
/// assert!(atlas.insert(2, 2, "b").is_ok());
/// assert!(atlas.insert(3, 1, "c").is_err());
///
/// let placed: Vec<_> = atlas.iter().map(|p| (p.x, p.y, *p.payload)).collect();
/// assert_eq!(placed, vec![(0, 0, "a"), (2, 0, "b")]);
/// ```
#[derive(Debug)]
pub struct AtlasPacker<T> {
    root: AtlasNode<T>,
    size: u32,
    len: usize,
}

impl<T> AtlasPacker<T> {
    /// Empty atlas of `size x size`.
    pub fn new(size: u32) -> Self {
        Self {
            root: AtlasNode::new(Rect::new(0, 0, size, size)),
            size,
            len: 0,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of payloads placed.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Place a `width x height` rectangle. On failure the payload is returned
    /// and the atlas is left usable.
    pub fn insert(&mut self, width: u32, height: u32, payload: T) -> Result<(), T> {
        self.root.insert(width, height, payload)?;
        self.len += 1;
        Ok(())
    }

    /// Occupied leaves, left subtree before right subtree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter { stack: vec![&self.root] }
    }

    /// Consume the atlas, returning placements in traversal order.
    pub fn into_packed(self) -> Vec<PackedRect<T>> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            match node.kind {
                NodeKind::Split(children) => {
                    let [left, right] = *children;
                    stack.push(right);
                    stack.push(left);
                }
                NodeKind::Leaf(Some(payload)) => out.push(PackedRect {
                    x: node.rect.x,
                    y: node.rect.y,
                    payload,
                }),
                NodeKind::Leaf(None) => {}
            }
        }
        out
    }
}

/// Depth-first iterator over occupied leaves.
pub struct Iter<'a, T> {
    stack: Vec<&'a AtlasNode<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = PackedRect<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match &node.kind {
                NodeKind::Split(children) => {
                    self.stack.push(&children[1]);
                    self.stack.push(&children[0]);
                }
                NodeKind::Leaf(Some(payload)) => {
                    return Some(PackedRect { x: node.rect.x, y: node.rect.y, payload });
                }
                NodeKind::Leaf(None) => {}
            }
        }
        None
    }
}

impl<'a, T> IntoIterator for &'a AtlasPacker<T> {
    type Item = PackedRect<&'a T>;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn overlaps(a: Rect, b: Rect) -> bool {
        a.x < b.x + b.width && b.x < a.x + a.width && a.y < b.y + b.height && b.y < a.y + a.height
    }

    #[test]
    fn exact_fit_occupies_root() {
        let mut atlas = AtlasPacker::new(8);
        assert!(atlas.insert(8, 8, 1).is_ok());
        assert_eq!(atlas.insert(1, 1, 2), Err(2));
        assert_eq!(atlas.len(), 1);
    }

    #[test]
    fn oversized_rejected() {
        let mut atlas = AtlasPacker::new(4);
        assert_eq!(atlas.insert(5, 1, 'a'), Err('a'));
        assert_eq!(atlas.insert(1, 5, 'b'), Err('b'));
        assert!(atlas.is_empty());
        // A failed insert leaves the atlas usable.
        assert!(atlas.insert(4, 4, 'c').is_ok());
    }

    #[test]
    fn vertical_split_when_width_slack_larger() {
        let mut atlas = AtlasPacker::new(8);
        atlas.insert(2, 6, 'a').unwrap();
        // Remaining column strip starts at x=2.
        atlas.insert(6, 8, 'b').unwrap();
        let placed: Vec<_> = atlas.iter().map(|p| (p.x, p.y, *p.payload)).collect();
        assert_eq!(placed, vec![(0, 0, 'a'), (2, 0, 'b')]);
    }

    #[test]
    fn horizontal_split_on_tie() {
        let mut atlas = AtlasPacker::new(4);
        atlas.insert(2, 2, 'a').unwrap();
        // Tie on slack splits horizontally: a 4x2 strip remains below.
        atlas.insert(4, 2, 'b').unwrap();
        let placed: Vec<_> = atlas.iter().map(|p| (p.x, p.y, *p.payload)).collect();
        assert_eq!(placed, vec![(0, 0, 'a'), (0, 2, 'b')]);
    }

    #[test]
    fn traversal_order_is_depth_first() {
        let mut atlas = AtlasPacker::new(4);
        atlas.insert(4, 1, 0).unwrap();
        atlas.insert(1, 1, 1).unwrap();
        atlas.insert(3, 3, 2).unwrap();

        let order: Vec<_> = atlas.iter().map(|p| *p.payload).collect();
        assert_eq!(order, vec![0, 1, 2]);

        let owned: Vec<_> = atlas.into_packed().into_iter().map(|p| (p.x, p.y, p.payload)).collect();
        assert_eq!(owned, vec![(0, 0, 0), (0, 1, 1), (1, 1, 2)]);
    }

    #[test]
    fn random_rects_never_overlap() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut atlas = AtlasPacker::new(64);
        let mut sizes = Vec::new();
        for i in 0..200usize {
            let w = rng.gen_range(1..12);
            let h = rng.gen_range(1..12);
            if atlas.insert(w, h, i).is_ok() {
                sizes.push((w, h));
            } else {
                sizes.push((0, 0));
            }
        }

        let rects: Vec<Rect> = atlas
            .iter()
            .map(|p| {
                let (w, h) = sizes[*p.payload];
                Rect::new(p.x, p.y, w, h)
            })
            .collect();
        assert_eq!(rects.len(), atlas.len());

        for (i, a) in rects.iter().enumerate() {
            assert!(a.x + a.width <= 64 && a.y + a.height <= 64);
            for b in &rects[i + 1..] {
                assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
            }
        }
    }
}

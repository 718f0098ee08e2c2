//! Region tree: the pure partition of the screen into tiles.
//!
//! `build` turns a layout family and slot count into a binary tree of splits
//! whose leaves, read depth-first first-child-first, are the slots in order.
//! `assign_geometry` is a separate pass that maps the tree onto a concrete
//! cell rectangle. Neither step mutates anything; a new layout is a new tree.

use crate::types::config::LayoutFamily;
use crate::types::geometry::Rect;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Children stacked top then bottom.
    Horizontal,
    /// Children side by side, left then right.
    Vertical,
}


/// Where a leaf sits within its parent split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dock {
    Fill,
    Top,
    Bottom,
    Left,
    Right,
}


#[derive(Debug, Clone, PartialEq)]
pub enum RegionNode {
    Leaf {
        slot: usize,
        /// Share of the whole screen width, in percent.
        width_pct: f64,
        /// Share of the whole screen height, in percent.
        height_pct: f64,
        dock: Dock,
    },
    Split {
        orientation: Orientation,
        /// Share of this split's extent given to the first child, in percent.
        first_pct: f64,
        children: Box<[RegionNode; 2]>,
    },
}


impl RegionNode {
    /// Slot indices in leaf order.
    pub fn slots(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_slots(&mut out);
        out
    }

    fn collect_slots(&self, out: &mut Vec<usize>) {
        match self {
            RegionNode::Leaf { slot, .. } => out.push(*slot),
            RegionNode::Split { children, .. } => {
                children[0].collect_slots(out);
                children[1].collect_slots(out);
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            RegionNode::Leaf { .. } => 1,
            RegionNode::Split { children, .. } => children[0].leaf_count() + children[1].leaf_count(),
        }
    }

    /// Leaves as `(slot, width_pct, height_pct)`, in leaf order.
    pub fn leaf_shares(&self) -> Vec<(usize, f64, f64)> {
        let mut out = Vec::new();
        self.walk_leaves(&mut |node| {
            if let RegionNode::Leaf {
                slot,
                width_pct,
                height_pct,
                ..
            } = node
            {
                out.push((*slot, *width_pct, *height_pct));
            }
        });
        out
    }

    fn walk_leaves(&self, f: &mut impl FnMut(&RegionNode)) {
        match self {
            RegionNode::Leaf { .. } => f(self),
            RegionNode::Split { children, .. } => {
                children[0].walk_leaves(f);
                children[1].walk_leaves(f);
            }
        }
    }
}


// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

/// Build the region tree for `family`.
///
/// A fixed family produces its own leaf count for up to that many slots.
/// More slots than a fixed family holds, and every `Auto` tree, go through
/// the balanced splitter over `max(slot_count, 1)` leaves, using `area` to
/// choose the orientation of the larger splits.
pub fn build(family: LayoutFamily, slot_count: usize, area: Rect) -> RegionNode {
    let mut b = Builder { next_slot: 0 };
    let whole = Share { w: 100.0, h: 100.0 };
    let overflow = family.fixed_leaf_count().is_some_and(|fixed| slot_count > fixed);
    let tree = match family {
        _ if overflow => b.balanced(whole, slot_count, area, Dock::Fill),
        LayoutFamily::Single => b.leaf(whole, Dock::Fill),
        LayoutFamily::Grid2x2 => b.grid(whole, 2),
        LayoutFamily::Grid3x3 => b.grid(whole, 3),
        LayoutFamily::Big2x2 => b.big_2x2(whole),
        LayoutFamily::Auto => b.balanced(whole, slot_count.max(1), area, Dock::Fill),
    };
    tracing::debug!(family = %family, leaves = tree.leaf_count(), "built region tree");
    tree
}


#[derive(Debug, Clone, Copy)]
struct Share {
    w: f64,
    h: f64,
}


impl Share {
    fn part(self, orientation: Orientation, pct: f64) -> Share {
        match orientation {
            Orientation::Horizontal => Share { w: self.w, h: self.h * pct / 100.0 },
            Orientation::Vertical => Share { w: self.w * pct / 100.0, h: self.h },
        }
    }
}


struct Builder {
    next_slot: usize,
}


impl Builder {
    fn leaf(&mut self, share: Share, dock: Dock) -> RegionNode {
        let slot = self.next_slot;
        self.next_slot += 1;
        RegionNode::Leaf {
            slot,
            width_pct: share.w,
            height_pct: share.h,
            dock,
        }
    }

    /// Split `share`, building the first child before the second.
    fn split(
        &mut self,
        share: Share,
        orientation: Orientation,
        first_pct: f64,
        first: impl FnOnce(&mut Self, Share, Dock) -> RegionNode,
        second: impl FnOnce(&mut Self, Share, Dock) -> RegionNode,
    ) -> RegionNode {
        let (first_dock, second_dock) = docks(orientation);
        let a = first(self, share.part(orientation, first_pct), first_dock);
        let b = second(self, share.part(orientation, 100.0 - first_pct), second_dock);
        RegionNode::Split {
            orientation,
            first_pct,
            children: Box::new([a, b]),
        }
    }

    /// `n` equal parts along `orientation`, as a right-leaning chain.
    fn equal_run(
        &mut self,
        share: Share,
        orientation: Orientation,
        n: usize,
        dock: Dock,
        cell: &mut impl FnMut(&mut Self, Share, Dock) -> RegionNode,
    ) -> RegionNode {
        if n <= 1 {
            return cell(self, share, dock);
        }
        let pct = 100.0 / n as f64;
        let (first_dock, second_dock) = docks(orientation);
        let a = cell(self, share.part(orientation, pct), first_dock);
        let rest = share.part(orientation, 100.0 - pct);
        let b = self.equal_run(rest, orientation, n - 1, second_dock, cell);
        RegionNode::Split {
            orientation,
            first_pct: pct,
            children: Box::new([a, b]),
        }
    }

    /// `n` equal bands, each of `n` equal columns, row-major.
    fn grid(&mut self, share: Share, n: usize) -> RegionNode {
        let mut row = |b: &mut Self, band: Share, dock: Dock| {
            b.equal_run(band, Orientation::Vertical, n, dock, &mut |b, s, d| b.leaf(s, d))
        };
        self.equal_run(share, Orientation::Horizontal, n, Dock::Fill, &mut row)
    }

    /// Top band 66%: a 33% column of two stacked cells beside the big cell.
    /// Bottom band 34%: one full-width cell.
    fn big_2x2(&mut self, share: Share) -> RegionNode {
        self.split(
            share,
            Orientation::Horizontal,
            66.0,
            |b, top, _| {
                b.split(
                    top,
                    Orientation::Vertical,
                    33.0,
                    |b, column, _| {
                        b.split(
                            column,
                            Orientation::Horizontal,
                            50.0,
                            |b, s, d| b.leaf(s, d),
                            |b, s, d| b.leaf(s, d),
                        )
                    },
                    |b, s, d| b.leaf(s, d),
                )
            },
            |b, s, d| b.leaf(s, d),
        )
    }

    /// Balanced recursive split over `n` slots.
    fn balanced(&mut self, share: Share, n: usize, area: Rect, dock: Dock) -> RegionNode {
        match n {
            0 | 1 => self.leaf(share, dock),
            2 => self.split(
                share,
                Orientation::Vertical,
                50.0,
                |b, s, d| b.leaf(s, d),
                |b, s, d| b.leaf(s, d),
            ),
            3 => self.split(
                share,
                Orientation::Vertical,
                50.0,
                |b, s, d| b.leaf(s, d),
                |b, s, _| {
                    b.split(
                        s,
                        Orientation::Horizontal,
                        50.0,
                        |b, s, d| b.leaf(s, d),
                        |b, s, d| b.leaf(s, d),
                    )
                },
            ),
            _ => {
                let orientation = orientation_for(area);
                let (first_area, second_area) = split_rect(area, orientation, 50.0);
                let first_n = n / 2;
                self.split(
                    share,
                    orientation,
                    50.0,
                    |b, s, d| b.balanced(s, first_n, first_area, d),
                    |b, s, d| b.balanced(s, n - first_n, second_area, d),
                )
            }
        }
    }
}


fn docks(orientation: Orientation) -> (Dock, Dock) {
    match orientation {
        Orientation::Horizontal => (Dock::Top, Dock::Bottom),
        Orientation::Vertical => (Dock::Left, Dock::Right),
    }
}


/// Terminal cells are roughly twice as tall as wide, so an area only counts
/// as wide when its width is at least twice its height.
pub fn orientation_for(area: Rect) -> Orientation {
    if area.width as u32 >= 2 * area.height as u32 {
        Orientation::Vertical
    } else {
        Orientation::Horizontal
    }
}


// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Split `area`: the first part gets `round(extent × pct / 100)` cells, the
/// second gets the rest.
pub fn split_rect(area: Rect, orientation: Orientation, first_pct: f64) -> (Rect, Rect) {
    let cells = |extent: u16| -> u16 {
        let raw = (extent as f64 * first_pct / 100.0).round();
        raw.clamp(0.0, extent as f64) as u16
    };
    match orientation {
        Orientation::Horizontal => {
            let first = cells(area.height);
            (
                Rect::new(area.left, area.top, area.width, first),
                Rect::new(area.left, area.top + first, area.width, area.height - first),
            )
        }
        Orientation::Vertical => {
            let first = cells(area.width);
            (
                Rect::new(area.left, area.top, first, area.height),
                Rect::new(area.left + first, area.top, area.width - first, area.height),
            )
        }
    }
}


/// One rectangle per leaf, in leaf order.
pub fn assign_geometry(tree: &RegionNode, area: Rect) -> Vec<(usize, Rect)> {
    let mut out = Vec::with_capacity(tree.leaf_count());
    place(tree, area, &mut out);
    out
}


fn place(node: &RegionNode, area: Rect, out: &mut Vec<(usize, Rect)>) {
    match node {
        RegionNode::Leaf { slot, .. } => out.push((*slot, area)),
        RegionNode::Split {
            orientation,
            first_pct,
            children,
        } => {
            let (a, b) = split_rect(area, *orientation, *first_pct);
            place(&children[0], a, out);
            place(&children[1], b, out);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect::new(0, 0, 120, 40);

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn single_is_one_full_leaf() {
        let tree = build(LayoutFamily::Single, 1, SCREEN);
        assert_eq!(tree.slots(), vec![0]);
        assert_eq!(assign_geometry(&tree, SCREEN), vec![(0, SCREEN)]);
    }

    #[test]
    fn overfull_fixed_family_uses_balanced_split() {
        let tree = build(LayoutFamily::Grid2x2, 5, SCREEN);
        assert_eq!(tree.slots(), vec![0, 1, 2, 3, 4]);
        assert_eq!(tree, build(LayoutFamily::Auto, 5, SCREEN));
        assert_eq!(build(LayoutFamily::Single, 7, SCREEN).leaf_count(), 7);
        assert_eq!(build(LayoutFamily::Grid3x3, 9, SCREEN).leaf_count(), 9);
    }

    #[test]
    fn grid_2x2_quarters() {
        let tree = build(LayoutFamily::Grid2x2, 2, SCREEN);
        assert_eq!(tree.slots(), vec![0, 1, 2, 3]);
        for (_, w, h) in tree.leaf_shares() {
            assert!(close(w, 50.0) && close(h, 50.0));
        }
        let rects = assign_geometry(&tree, SCREEN);
        assert_eq!(rects[0].1, Rect::new(0, 0, 60, 20));
        assert_eq!(rects[1].1, Rect::new(60, 0, 60, 20));
        assert_eq!(rects[2].1, Rect::new(0, 20, 60, 20));
        assert_eq!(rects[3].1, Rect::new(60, 20, 60, 20));
    }

    #[test]
    fn big_2x2_shape() {
        let tree = build(LayoutFamily::Big2x2, 4, SCREEN);
        let shares = tree.leaf_shares();
        assert_eq!(shares.iter().map(|s| s.0).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(close(shares[0].1, 33.0) && close(shares[0].2, 33.0));
        assert!(close(shares[1].1, 33.0) && close(shares[1].2, 33.0));
        assert!(close(shares[2].1, 67.0) && close(shares[2].2, 66.0));
        assert!(close(shares[3].1, 100.0) && close(shares[3].2, 34.0));

        let rects = assign_geometry(&tree, SCREEN);
        // 40 × 0.66 = 26.4 → 26 rows on top; 120 × 0.33 = 39.6 → 40 columns.
        assert_eq!(rects[0].1, Rect::new(0, 0, 40, 13));
        assert_eq!(rects[1].1, Rect::new(0, 13, 40, 13));
        assert_eq!(rects[2].1, Rect::new(40, 0, 80, 26));
        assert_eq!(rects[3].1, Rect::new(0, 26, 120, 14));
    }

    #[test]
    fn grid_3x3_is_row_major() {
        let tree = build(LayoutFamily::Grid3x3, 0, Rect::new(0, 0, 90, 30));
        assert_eq!(tree.slots(), (0..9).collect::<Vec<_>>());
        let rects = assign_geometry(&tree, Rect::new(0, 0, 90, 30));
        assert_eq!(rects[4].1, Rect::new(30, 10, 30, 10));
        assert_eq!(rects[8].1, Rect::new(60, 20, 30, 10));
        for (_, w, h) in tree.leaf_shares() {
            assert!(close(w, 100.0 / 3.0) && close(h, 100.0 / 3.0));
        }
    }

    #[test]
    fn auto_small_counts() {
        let two = build(LayoutFamily::Auto, 2, SCREEN);
        let rects = assign_geometry(&two, SCREEN);
        assert_eq!(rects[0].1, Rect::new(0, 0, 60, 40));
        assert_eq!(rects[1].1, Rect::new(60, 0, 60, 40));

        let three = build(LayoutFamily::Auto, 3, SCREEN);
        let rects = assign_geometry(&three, SCREEN);
        assert_eq!(rects[0].1, Rect::new(0, 0, 60, 40));
        assert_eq!(rects[1].1, Rect::new(60, 0, 60, 20));
        assert_eq!(rects[2].1, Rect::new(60, 20, 60, 20));

        assert_eq!(build(LayoutFamily::Auto, 0, SCREEN).leaf_count(), 1);
    }

    #[test]
    fn auto_orientation_follows_aspect() {
        // 120 ≥ 2 × 40: wide, so the first split is vertical.
        let wide = build(LayoutFamily::Auto, 4, SCREEN);
        assert!(matches!(wide, RegionNode::Split { orientation: Orientation::Vertical, .. }));
        let tall = build(LayoutFamily::Auto, 4, Rect::new(0, 0, 60, 40));
        assert!(matches!(tall, RegionNode::Split { orientation: Orientation::Horizontal, .. }));
    }

    #[test]
    fn auto_five_splits_two_then_three() {
        let tree = build(LayoutFamily::Auto, 5, SCREEN);
        let RegionNode::Split { children, .. } = &tree else {
            panic!("expected split");
        };
        assert_eq!(children[0].leaf_count(), 2);
        assert_eq!(children[1].leaf_count(), 3);
        assert_eq!(tree.slots(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn rounding_gives_remainder_to_second_child() {
        let (a, b) = split_rect(Rect::new(3, 2, 7, 5), Orientation::Vertical, 50.0);
        // 3.5 rounds away from zero.
        assert_eq!(a, Rect::new(3, 2, 4, 5));
        assert_eq!(b, Rect::new(7, 2, 3, 5));
    }
}

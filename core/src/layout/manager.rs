//! Window manager: owns the region tree, the tiles and their timers.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::ConfigSnapshot;
use crate::error::{Error, Result};
use crate::layout::timer::{Scheduler, TimerKind};
use crate::layout::tree::{self, Orientation, RegionNode};
use crate::registry::PluginRegistry;
use crate::tile::{Tile, TileView};
use crate::types::config::{LayoutDirective, LayoutFamily};
use crate::types::geometry::Rect;


pub struct WindowManager {
    directive: LayoutDirective,
    tree: Option<RegionNode>,
    tiles: Vec<Tile>,
    focused: Option<usize>,
    area: Rect,
    scheduler: Scheduler,
}


impl WindowManager {
    pub fn new(width: u16, height: u16) -> Self {
        WindowManager {
            directive: LayoutDirective::default(),
            tree: None,
            tiles: Vec::new(),
            focused: None,
            area: Rect::new(0, 0, width, height),
            scheduler: Scheduler::new(),
        }
    }

    /// Tear down whatever is live and build the layout `snapshot` describes.
    ///
    /// Focus returns to the tile with the previously focused id when it
    /// survives the rebuild, otherwise to the first tile.
    pub fn build(&mut self, snapshot: &ConfigSnapshot, registry: &PluginRegistry, now_ms: u64) {
        let previous_focus = self.focused_tile().map(|t| t.id().to_string());
        self.teardown();

        self.directive = snapshot.layout.clone();
        let family = self.directive.family;
        let slots = snapshot.slots_for(family);
        let region = tree::build(family, slots.len(), self.area);

        let mut by_slot: HashMap<usize, _> = slots.into_iter().enumerate().collect();
        self.tiles = region
            .slots()
            .into_iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let spec = by_slot.remove(&slot)?;
                Some(Tile::load(index, spec, registry, snapshot))
            })
            .collect();
        self.tree = Some(region);
        self.place_tiles();
        for tile in &mut self.tiles {
            tile.activate(&mut self.scheduler, now_ms);
        }

        let restored = previous_focus
            .and_then(|id| self.tiles.iter().position(|t| t.id() == id))
            .unwrap_or(0);
        self.set_focus((!self.tiles.is_empty()).then_some(restored));
        tracing::info!(
            family = %family,
            tiles = self.tiles.len(),
            timers = self.scheduler.live_count(),
            "layout built"
        );
    }

    /// Cancel every timer and drop every tile. A no-op when nothing is built.
    pub fn teardown(&mut self) {
        if self.tree.is_none() && self.tiles.is_empty() {
            return;
        }
        for tile in &mut self.tiles {
            tile.teardown(&mut self.scheduler);
        }
        let stray = self.scheduler.cancel_all();
        if stray > 0 {
            tracing::warn!(stray, "cancelled timers left after tile teardown");
        }
        self.tiles.clear();
        self.tree = None;
        self.focused = None;
        tracing::debug!("layout torn down");
    }

    /// Re-run the tree build and geometry pass for a new screen size. Tiles
    /// keep their sources; leaf count and order do not change.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.area = Rect::new(0, 0, width, height);
        if self.tree.is_some() {
            let region = tree::build(self.directive.family, self.tiles.len(), self.area);
            self.tree = Some(region);
            self.place_tiles();
        }
    }

    fn place_tiles(&mut self) {
        let Some(region) = &self.tree else {
            return;
        };
        let bordered = self.directive.border_style != "none";
        for (index, (_, rect)) in tree::assign_geometry(region, self.area).into_iter().enumerate() {
            if let Some(tile) = self.tiles.get_mut(index) {
                let content = if bordered { rect.inner() } else { rect };
                tile.set_area(rect, content);
            }
        }
    }

    /// Fire due timers. Events whose timer was cancelled earlier in the
    /// batch are dropped.
    pub fn advance(&mut self, now_ms: u64) -> usize {
        let mut dispatched = 0;
        for fired in self.scheduler.fire_due(now_ms) {
            if !self.scheduler.is_live(fired.id) {
                continue;
            }
            let Some(tile) = self.tiles.get_mut(fired.owner.tile) else {
                continue;
            };
            match fired.owner.kind {
                TimerKind::Tick => tile.tick(Duration::from_millis(fired.elapsed_ms)),
                TimerKind::Cycle => {
                    tile.cycle(&mut self.scheduler, now_ms);
                }
            }
            dispatched += 1;
        }
        dispatched
    }

    // -----------------------------------------------------------------------
    // Focus
    // -----------------------------------------------------------------------

    pub fn focus_next(&mut self) {
        if let Some(current) = self.focused {
            self.set_focus(Some((current + 1) % self.tiles.len()));
        }
    }

    pub fn focus_previous(&mut self) {
        if let Some(current) = self.focused {
            let n = self.tiles.len();
            self.set_focus(Some((current + n - 1) % n));
        }
    }

    fn set_focus(&mut self, index: Option<usize>) {
        self.focused = index;
        for (i, tile) in self.tiles.iter_mut().enumerate() {
            tile.set_focused(Some(i) == index);
        }
    }

    // -----------------------------------------------------------------------
    // Window operations
    // -----------------------------------------------------------------------

    pub fn split_focused_window(&mut self, orientation: Orientation) -> Result<()> {
        tracing::debug!(?orientation, "split requested");
        Err(Error::Unsupported {
            operation: "Window splitting".into(),
        })
    }

    pub fn close_focused_window(&mut self) -> Result<()> {
        Err(Error::Unsupported {
            operation: "Window closing".into(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn family(&self) -> LayoutFamily {
        self.directive.family
    }

    pub fn directive(&self) -> &LayoutDirective {
        &self.directive
    }

    pub fn tree(&self) -> Option<&RegionNode> {
        self.tree.as_ref()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    pub fn focused_tile(&self) -> Option<&Tile> {
        self.focused.and_then(|i| self.tiles.get(i))
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn live_timer_count(&self) -> usize {
        self.scheduler.live_count()
    }

    /// One tick timer per tile with a live source, one cycle timer per
    /// cycling tile.
    pub fn expected_timer_count(&self) -> usize {
        self.tiles
            .iter()
            .map(|t| t.has_live_source() as usize + t.is_cycling() as usize)
            .sum()
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.scheduler.next_due_ms()
    }

    pub fn views(&self) -> Vec<TileView> {
        self.tiles.iter().map(Tile::view).collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigModel;
    use crate::types::config::ConfigDocument;

    fn snapshot(yaml: &str) -> std::sync::Arc<ConfigSnapshot> {
        let doc: ConfigDocument = serde_yaml::from_str(yaml).unwrap();
        ConfigModel::in_memory(&doc).snapshot()
    }

    fn built(yaml: &str) -> WindowManager {
        let mut wm = WindowManager::new(120, 40);
        wm.build(&snapshot(yaml), &PluginRegistry::with_builtins(), 0);
        wm
    }

    const FOUR: &str = "layout: { layout_type: 2x2 }\n\
        windows:\n\
          - { id: a, plugins: [{ type: HexScroll }] }\n\
          - { id: b, plugins: [{ type: LogScroll }] }\n\
          - { id: c, plugins: [{ type: MatrixRain }] }\n\
          - { id: d, plugins: [{ type: SystemMonitor }] }\n";

    #[test]
    fn single_window_focus_is_stable() {
        let mut wm = built("layout: { layout_type: single }\nwindows: [{ id: a, plugins: [{ type: HexScroll }] }]");
        assert_eq!(wm.tiles().len(), 1);
        assert_eq!(wm.focused_tile().unwrap().id(), "a");
        wm.focus_next();
        assert_eq!(wm.focused_tile().unwrap().id(), "a");
        wm.focus_previous();
        assert_eq!(wm.focused_index(), Some(0));
    }

    #[test]
    fn focus_cycles_through_grid() {
        let mut wm = built(FOUR);
        let ids: Vec<&str> = wm.tiles().iter().map(Tile::id).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
        for expected in ["b", "c", "d", "a"] {
            wm.focus_next();
            assert_eq!(wm.focused_tile().unwrap().id(), expected);
        }
        wm.focus_previous();
        assert_eq!(wm.focused_tile().unwrap().id(), "d");
        assert_eq!(wm.tiles().iter().filter(|t| t.is_focused()).count(), 1);
    }

    #[test]
    fn missing_windows_are_padded() {
        let wm = built("layout: { layout_type: 3x3 }\nwindows: [{ id: a }]");
        assert_eq!(wm.tiles().len(), 9);
        assert!(wm.tiles()[0].is_placeholder());
        assert!(wm.tiles()[1..].iter().all(|t| t.id() == "default"));
        assert_eq!(wm.live_timer_count(), 8);
        assert_eq!(wm.live_timer_count(), wm.expected_timer_count());
    }

    #[test]
    fn empty_config_still_builds() {
        let wm = built("layout: { layout_type: auto }");
        assert_eq!(wm.tiles().len(), 1);
        assert_eq!(wm.focused_index(), Some(0));
    }

    #[test]
    fn teardown_is_idempotent() {
        let mut wm = built(FOUR);
        assert_eq!(wm.live_timer_count(), 4);
        wm.teardown();
        wm.teardown();
        assert_eq!(wm.live_timer_count(), 0);
        assert!(wm.tiles().is_empty());
        assert!(wm.focused_tile().is_none());
        wm.focus_next();
        assert!(wm.focused_tile().is_none());
    }

    #[test]
    fn rebuild_restores_focus_by_id() {
        let registry = PluginRegistry::with_builtins();
        let mut wm = WindowManager::new(120, 40);
        wm.build(&snapshot(FOUR), &registry, 0);
        wm.focus_next();
        wm.focus_next();
        assert_eq!(wm.focused_tile().unwrap().id(), "c");
        let reordered = "layout: { layout_type: 2x2 }\nwindows: [{ id: c }, { id: a }]";
        wm.build(&snapshot(reordered), &registry, 100);
        assert_eq!(wm.focused_tile().unwrap().id(), "c");
        assert_eq!(wm.focused_index(), Some(0));
        let gone = "layout: { layout_type: single }\nwindows: [{ id: z }]";
        wm.build(&snapshot(gone), &registry, 200);
        assert_eq!(wm.focused_index(), Some(0));
    }

    #[test]
    fn split_and_close_change_nothing() {
        let mut wm = built(FOUR);
        let before: Vec<Rect> = wm.tiles().iter().map(Tile::area).collect();
        let err = wm.split_focused_window(Orientation::Vertical).unwrap_err();
        assert_eq!(err.to_string(), "Window splitting is not available with fixed layouts");
        let err = wm.close_focused_window().unwrap_err();
        assert_eq!(err.to_string(), "Window closing is not available with fixed layouts");
        let after: Vec<Rect> = wm.tiles().iter().map(Tile::area).collect();
        assert_eq!(before, after);
        assert_eq!(wm.tiles().len(), 4);
    }

    #[test]
    fn tiles_cover_the_screen() {
        let wm = built(FOUR);
        let total: u32 = wm.tiles().iter().map(|t| t.area().area()).sum();
        assert_eq!(total, 120 * 40);
    }

    #[test]
    fn resize_keeps_tiles_and_reflows() {
        let mut wm = built("layout: { layout_type: auto }\nwindows: [{ id: a }, { id: b }, { id: c }, { id: d }]");
        // Wide screen: the first split is side by side.
        assert_eq!(wm.tiles()[2].area().top, 0);
        assert_eq!(wm.tiles()[2].area().left, 60);
        wm.resize(60, 60);
        assert_eq!(wm.tiles().len(), 4);
        // Tall screen: the first split stacks.
        assert_eq!(wm.tiles()[1].area().left, 30);
        assert_eq!(wm.tiles()[2].area().top, 30);
        assert_eq!(wm.tiles()[2].area().left, 0);
    }

    #[test]
    fn ticks_reach_sources() {
        let mut wm = built("layout: { layout_type: single }\nwindows: [{ id: a, plugins: [{ type: SystemMonitor, config: { refresh_rate: 1.0 } }] }]");
        assert_eq!(wm.advance(999), 0);
        assert_eq!(wm.advance(1000), 1);
        assert_eq!(wm.advance(2000), 1);
    }
}

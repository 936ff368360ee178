//! Viewport windowing for the thumbnail grid.
//!
//! Only the rows around the visible viewport are rendered. [`compute`] turns
//! a viewport and item count into a half-open index range; the
//! [`WindowingEngine`] coalesces scroll/resize triggers to one recomputation
//! per frame and remembers the last applied window.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grid cell size and rendering slack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridGeometry {
    pub item_width: f64,
    pub item_height: f64,
    pub gap: f64,
    /// Extra rows rendered above and below the viewport.
    pub buffer_rows: usize,
    /// Window size used before the first measurement.
    pub default_window: usize,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            item_width: 100.0,
            item_height: 130.0,
            gap: 20.0,
            buffer_rows: 5,
            default_window: 50,
        }
    }
}

impl GridGeometry {
    fn is_usable(&self) -> bool {
        is_positive(self.item_height) && is_positive(self.item_width + self.gap)
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// The scroll container as last measured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_top: f64,
    pub container_width: f64,
    pub container_height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, container_width: f64, container_height: f64) -> Self {
        Self {
            scroll_top,
            container_width,
            container_height,
        }
    }

    /// Pulls `scroll_top` back inside the content height of `item_count`
    /// items, as a scroll container does when its content shrinks.
    pub fn clamp_scroll(&mut self, item_count: usize, geometry: &GridGeometry) {
        if !is_positive(self.container_width) || !geometry.is_usable() {
            return;
        }
        let rows = item_count.div_ceil(items_per_row(self.container_width, geometry));
        let max = (rows as f64 * geometry.item_height - self.container_height).max(0.0);
        if !self.scroll_top.is_finite() || self.scroll_top > max {
            self.scroll_top = max;
        }
    }
}

fn items_per_row(container_width: f64, geometry: &GridGeometry) -> usize {
    ((container_width / (geometry.item_width + geometry.gap)).floor() as usize).max(1)
}

/// Half-open range `[start, end)` of item indices to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibleWindow {
    pub start: usize,
    pub end: usize,
    pub items_per_row: usize,
}

impl VisibleWindow {
    /// The window used before measurement and after the list empties.
    pub fn reset(default_window: usize) -> Self {
        Self {
            start: 0,
            end: default_window,
            items_per_row: 1,
        }
    }

    /// The window with both bounds clamped to a list of `len` items.
    pub fn clamped(&self, len: usize) -> Self {
        let range = self.range_for(len);
        Self {
            start: range.start,
            end: range.end,
            items_per_row: self.items_per_row,
        }
    }

    /// The window clamped to a list of `len` items.
    pub fn range_for(&self, len: usize) -> Range<usize> {
        let end = self.end.min(len);
        self.start.min(end)..end
    }

    /// Heights of the empty space above and below the rendered rows.
    pub fn spacer_heights(&self, item_count: usize, geometry: &GridGeometry) -> (f64, f64) {
        let per_row = self.items_per_row.max(1);
        let range = self.range_for(item_count);
        let total_rows = item_count.div_ceil(per_row);
        let top_rows = range.start / per_row;
        let bottom_rows = total_rows.saturating_sub(range.end.div_ceil(per_row));
        (
            top_rows as f64 * geometry.item_height,
            bottom_rows as f64 * geometry.item_height,
        )
    }
}

/// Computes the window for `item_count` items laid out in `geometry`.
///
/// Returns `None` when the container or the geometry is degenerate (zero or
/// non-finite); callers keep their previous window in that case.
pub fn compute(
    viewport: &Viewport,
    item_count: usize,
    geometry: &GridGeometry,
) -> Option<VisibleWindow> {
    if !is_positive(viewport.container_width)
        || !is_positive(viewport.container_height)
        || !geometry.is_usable()
    {
        return None;
    }

    let scroll_top = if viewport.scroll_top.is_finite() {
        viewport.scroll_top.max(0.0)
    } else {
        0.0
    };

    let items_per_row = items_per_row(viewport.container_width, geometry);
    let first_visible_row = (scroll_top / geometry.item_height).floor() as usize;
    let start_row = first_visible_row.saturating_sub(geometry.buffer_rows);

    let total_rows = item_count.div_ceil(items_per_row);
    let last_visible_row =
        ((scroll_top + viewport.container_height) / geometry.item_height).ceil() as usize;
    let end_row = total_rows.min(last_visible_row.saturating_add(geometry.buffer_rows));

    let end = item_count.min(end_row.saturating_mul(items_per_row));
    let start = start_row.saturating_mul(items_per_row).min(end);

    Some(VisibleWindow {
        start,
        end,
        items_per_row,
    })
}

/// Owns the applied window and the frame-coalescing flag.
#[derive(Debug, Clone)]
pub struct WindowingEngine {
    geometry: GridGeometry,
    applied: VisibleWindow,
    item_count: usize,
    frame_pending: bool,
}

impl WindowingEngine {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            applied: VisibleWindow::reset(geometry.default_window),
            geometry,
            item_count: 0,
            frame_pending: false,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// The last applied window.
    pub fn window(&self) -> VisibleWindow {
        self.applied
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Marks a recomputation as wanted. Returns `true` when the caller should
    /// schedule a frame, `false` when one is already pending.
    pub fn request_frame(&mut self) -> bool {
        if self.frame_pending {
            debug!("window recompute coalesced into pending frame");
            return false;
        }
        self.frame_pending = true;
        true
    }

    /// Runs the pending recomputation. Returns the new window if it differs
    /// from the applied one.
    pub fn on_frame(&mut self, viewport: &Viewport) -> Option<VisibleWindow> {
        self.frame_pending = false;
        if self.item_count == 0 {
            return None;
        }
        let next = compute(viewport, self.item_count, &self.geometry)?;
        if next == self.applied {
            return None;
        }
        self.applied = next;
        Some(next)
    }

    /// Updates the item count.
    ///
    /// A transition to or from zero resets the window without recomputing and
    /// returns `false`. Any other change clamps the applied window to `count`
    /// and returns `true`: the window should be recomputed.
    pub fn set_item_count(&mut self, count: usize) -> bool {
        let previous = self.item_count;
        self.item_count = count;
        if (previous == 0) != (count == 0) || count == 0 {
            self.applied = VisibleWindow::reset(self.geometry.default_window);
            return false;
        }
        self.applied = self.applied.clamped(count);
        previous != count
    }

    /// Returns to the initial window, dropping any pending frame.
    pub fn reset(&mut self) {
        self.applied = VisibleWindow::reset(self.geometry.default_window);
        self.frame_pending = false;
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Conversions between screen pixels, map-local pixels and normalized
//! fractions of the unscaled map surface.
//!
//! `map_bounds` is always the *rendered* bounding box of the map layer, i.e.
//! already scaled by the current zoom. Pins live inside that layer and are
//! positioned in unscaled units.

use geo::{coord, Coord, Rect};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 7.0;

/// Pan padding per zoom step below [`MAX_ZOOM`].
const PAN_PADDING_PER_STEP: f64 = 50.0;

/// Permissible offsets for the draggable map layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanBounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl PanBounds {
    /// Clamp an offset into these bounds.
    pub fn clamp_offset(&self, offset: Coord<f64>) -> Coord<f64> {
        coord! {
            x: clamp(self.left, self.right, offset.x),
            y: clamp(self.top, self.bottom, offset.y),
        }
    }
}

/// Saturating clamp. When `min > max`, `max` wins.
pub fn clamp(min: f64, max: f64, value: f64) -> f64 {
    value.max(min).min(max)
}

/// Bound a zoom factor to the supported range; non-finite values fall back
/// to the minimum.
pub fn bound_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() {
        clamp(MIN_ZOOM, MAX_ZOOM, zoom)
    } else {
        MIN_ZOOM
    }
}

/// Full-resolution size of the map: rendered size divided by zoom.
pub fn unscaled_size(map_bounds: &Rect<f64>, zoom: f64) -> (f64, f64) {
    let zoom = bound_zoom(zoom);
    (map_bounds.width() / zoom, map_bounds.height() / zoom)
}

/// Convert a screen point to a normalized fraction of the surface.
///
/// Points outside the surface produce fractions outside `[0, 1]`; callers
/// decide whether to clamp.
pub fn screen_to_normalized(click: Coord<f64>, map_bounds: &Rect<f64>, zoom: f64) -> (f64, f64) {
    let zoom = bound_zoom(zoom);
    let (width, height) = unscaled_size(map_bounds, zoom);
    let origin = map_bounds.min();

    (
        ratio((click.x - origin.x) / zoom, width),
        ratio((click.y - origin.y) / zoom, height),
    )
}

/// Unscaled pixel position of a normalized fraction, as used for pins.
pub fn normalized_to_local(fx: f64, fy: f64, map_bounds: &Rect<f64>, zoom: f64) -> Coord<f64> {
    let (width, height) = unscaled_size(map_bounds, zoom);
    coord! { x: fx * width, y: fy * height }
}

/// Screen position of a normalized fraction; inverse of
/// [`screen_to_normalized`].
pub fn normalized_to_screen(fx: f64, fy: f64, map_bounds: &Rect<f64>, zoom: f64) -> Coord<f64> {
    let zoom = bound_zoom(zoom);
    let local = normalized_to_local(fx, fy, map_bounds, zoom);
    let origin = map_bounds.min();
    coord! {
        x: origin.x + local.x * zoom,
        y: origin.y + local.y * zoom,
    }
}

/// Map-local unscaled position of a screen point.
pub fn screen_to_local(click: Coord<f64>, map_bounds: &Rect<f64>, zoom: f64) -> Coord<f64> {
    let zoom = bound_zoom(zoom);
    let origin = map_bounds.min();
    coord! {
        x: (click.x - origin.x) / zoom,
        y: (click.y - origin.y) / zoom,
    }
}

/// Pan limits so the map can't be dragged fully off-screen.
///
/// Padding shrinks toward zero at maximum zoom. Maps too small for the
/// padding collapse the range onto `right`/`bottom`, so `left <= right` and
/// `top <= bottom` always hold.
pub fn compute_pan_bounds(map_bounds: &Rect<f64>, zoom: f64) -> PanBounds {
    let zoom = bound_zoom(zoom);
    let padding = (MAX_ZOOM - zoom) * PAN_PADDING_PER_STEP;

    let right = padding;
    let bottom = padding;
    let left = -(map_bounds.width() - padding * zoom);
    let top = -(map_bounds.height() - padding * zoom);

    PanBounds {
        left: left.min(right),
        right,
        top: top.min(bottom),
        bottom,
    }
}

fn ratio(value: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        value / extent
    } else {
        0.0
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zoom/pan state of the map surface.

use crate::map::transform::{self, PanBounds};
use geo::{coord, Coord, Rect};

pub const ZOOM_STEP: f64 = 0.5;
pub const RESET_ZOOM: f64 = 3.0;

/// Stepped zoom controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomAction {
    In,
    Out,
    Reset,
}

/// Result of a zoom action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomChange {
    pub old_zoom: f64,
    pub new_zoom: f64,
}

/// Zoom factor, pan offset and geometry of the draggable map layer.
///
/// The layer is scaled from its top-left corner, which sits at
/// `viewport_origin + offset` in screen space.
#[derive(Debug, Clone)]
pub struct MapView {
    zoom: f64,
    offset: Coord<f64>,
    unscaled: (f64, f64),
    viewport_origin: Coord<f64>,
}

impl MapView {
    pub fn new(zoom: f64, unscaled_width: f64, unscaled_height: f64) -> Self {
        Self {
            zoom: transform::bound_zoom(zoom),
            offset: coord! { x: 0.0, y: 0.0 },
            unscaled: (unscaled_width, unscaled_height),
            viewport_origin: coord! { x: 0.0, y: 0.0 },
        }
    }

    /// Active scale factor, bounded to `[1, 7]`.
    pub fn current_zoom(&self) -> f64 {
        transform::bound_zoom(self.zoom)
    }

    pub fn offset(&self) -> Coord<f64> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Coord<f64>) {
        self.offset = offset;
    }

    pub fn unscaled_size(&self) -> (f64, f64) {
        self.unscaled
    }

    /// Screen position of the map container's top-left corner.
    pub fn set_viewport_origin(&mut self, origin: Coord<f64>) {
        self.viewport_origin = origin;
    }

    /// Resize the unscaled surface (e.g. the map image changed).
    pub fn set_unscaled_size(&mut self, width: f64, height: f64) {
        self.unscaled = (width, height);
    }

    /// Rendered bounding box of the map layer in screen space.
    pub fn map_bounds(&self) -> Rect<f64> {
        let zoom = self.current_zoom();
        let min = coord! {
            x: self.viewport_origin.x + self.offset.x,
            y: self.viewport_origin.y + self.offset.y,
        };
        Rect::new(
            min,
            coord! {
                x: min.x + self.unscaled.0 * zoom,
                y: min.y + self.unscaled.1 * zoom,
            },
        )
    }

    pub fn pan_bounds(&self) -> PanBounds {
        transform::compute_pan_bounds(&self.map_bounds(), self.current_zoom())
    }

    /// Apply a zoom step, rescaling the offset so the visual center holds.
    pub fn apply_zoom(&mut self, action: ZoomAction) -> ZoomChange {
        let old_zoom = self.current_zoom();
        let new_zoom = match action {
            ZoomAction::In => (old_zoom + ZOOM_STEP).min(transform::MAX_ZOOM),
            ZoomAction::Out => (old_zoom - ZOOM_STEP).max(transform::MIN_ZOOM),
            ZoomAction::Reset => {
                self.offset = coord! { x: 0.0, y: 0.0 };
                RESET_ZOOM
            }
        };

        let factor = new_zoom / old_zoom;
        self.offset = coord! { x: self.offset.x * factor, y: self.offset.y * factor };
        self.zoom = new_zoom;

        ZoomChange { old_zoom, new_zoom }
    }
}

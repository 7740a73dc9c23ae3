// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drag-pan gesture state machine with click/drag disambiguation.
//!
//! `Idle -> Pressed -> (Dragging | click) -> Idle`. Mouse and touch go
//! through the same machine. Move/up input is only honoured while a gesture
//! from the same source is active, so nothing lingers between gestures.

use crate::map::transform::PanBounds;
use crate::map::view::MapView;
use geo::{coord, Coord};

/// A press released faster than this may be a click.
pub const CLICK_MAX_MS: u64 = 200;
/// A press that travelled further than this is a drag.
pub const CLICK_MAX_MOVEMENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Touch,
}

/// One pointer sample in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub source: PointerSource,
    pub point: Coord<f64>,
    /// Monotonic timestamp in milliseconds
    pub at_ms: u64,
}

impl PointerInput {
    pub fn mouse(x: f64, y: f64, at_ms: u64) -> Self {
        Self {
            source: PointerSource::Mouse,
            point: coord! { x: x, y: y },
            at_ms,
        }
    }

    pub fn touch(x: f64, y: f64, at_ms: u64) -> Self {
        Self {
            source: PointerSource::Touch,
            point: coord! { x: x, y: y },
            at_ms,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    source: PointerSource,
    start: Coord<f64>,
    origin_offset: Coord<f64>,
    bounds: PanBounds,
    at_ms: u64,
    max_distance: f64,
}

#[derive(Debug, Clone, Copy, Default)]
enum GestureState {
    #[default]
    Idle,
    Pressed(Press),
    Dragging(Press),
}

/// Result of a pointer move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// New pan offset, if the move belonged to the active gesture
    pub offset: Option<Coord<f64>>,
    /// Suppress default touch scrolling
    pub prevent_default: bool,
}

/// How a gesture ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Quick, stationary press: carries the release screen point
    Click(Coord<f64>),
    Drag,
    /// Release without a matching press
    Ignored,
}

/// Per-surface drag controller.
#[derive(Debug, Default)]
pub struct DragController {
    state: GestureState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging(_))
    }

    /// Start a gesture, replacing any gesture whose release was lost.
    pub fn pointer_down(&mut self, input: PointerInput, view: &MapView) {
        self.state = GestureState::Pressed(Press {
            source: input.source,
            start: input.point,
            origin_offset: view.offset(),
            bounds: view.pan_bounds(),
            at_ms: input.at_ms,
            max_distance: 0.0,
        });
    }

    /// Pan the view live while a gesture is active.
    pub fn pointer_move(&mut self, input: PointerInput, view: &mut MapView) -> MoveOutcome {
        let mut press = match self.state {
            GestureState::Pressed(p) | GestureState::Dragging(p) if p.source == input.source => p,
            _ => {
                return MoveOutcome {
                    offset: None,
                    prevent_default: false,
                }
            }
        };

        let dx = input.point.x - press.start.x;
        let dy = input.point.y - press.start.y;
        press.max_distance = press.max_distance.max(dx.hypot(dy));

        let offset = press.bounds.clamp_offset(coord! {
            x: press.origin_offset.x + dx,
            y: press.origin_offset.y + dy,
        });
        view.set_offset(offset);
        self.state = GestureState::Dragging(press);

        MoveOutcome {
            offset: Some(offset),
            prevent_default: input.source == PointerSource::Touch,
        }
    }

    /// Finish the gesture and decide between click and drag.
    pub fn pointer_up(&mut self, input: PointerInput) -> GestureOutcome {
        let press = match self.state {
            GestureState::Pressed(p) | GestureState::Dragging(p) if p.source == input.source => p,
            _ => return GestureOutcome::Ignored,
        };
        self.state = GestureState::Idle;

        let elapsed = input.at_ms.saturating_sub(press.at_ms);
        let released_at = (input.point.x - press.start.x).hypot(input.point.y - press.start.y);
        let moved = press.max_distance.max(released_at);

        if elapsed < CLICK_MAX_MS && moved <= CLICK_MAX_MOVEMENT {
            tracing::trace!(elapsed, moved, "Gesture resolved as click");
            GestureOutcome::Click(input.point)
        } else {
            tracing::trace!(elapsed, moved, "Gesture resolved as drag");
            GestureOutcome::Drag
        }
    }
}

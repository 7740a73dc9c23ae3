// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map surface: coordinate transforms, pins, view state and gestures.

pub mod gesture;
pub mod pin;
pub mod transform;
pub mod view;

pub use gesture::{DragController, GestureOutcome, MoveOutcome, PointerInput, PointerSource};
pub use pin::{Pin, PinId, PinImage, PinKind, PinLayer, PinView};
pub use transform::PanBounds;
pub use view::{MapView, ZoomAction, ZoomChange};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pin view-models and the layer that holds them.
//!
//! A pin keeps its pixel position (unscaled units, inside the CSS-scaled
//! layer) and, when known, the normalized fraction it came from, so a
//! resize can re-layout it without going back to screen clicks.

use geo::{coord, Coord};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Avatar shown while the real one is unknown or pending.
pub const PLACEHOLDER_AVATAR: &str = "images/default-avatar.svg";

/// Pixel radius around a meetup pin that still counts as a hit.
const MEETUP_HIT_RADIUS: f64 = 15.0;

/// Handle to a pin in a [`PinLayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId(u64);

/// What a pin stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinKind {
    Me,
    Peer(String),
    Meetup(String),
}

/// Visual body of a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(tag = "type", content = "src", rename_all = "snake_case")]
pub enum PinImage {
    Avatar(String),
    Placeholder,
    /// Icon-less colored dot used for meetups
    Dot,
}

#[derive(Debug, Clone)]
pub struct Pin {
    pub kind: PinKind,
    pub image: PinImage,
    pub label: Option<String>,
    pub clickable: bool,
    pub visible: bool,
    /// Unscaled pixel position (left/top)
    pub position: Coord<f64>,
    /// Originating normalized fraction, if placed from one
    pub normalized: Option<(f64, f64)>,
}

impl Pin {
    pub fn is_meetup(&self) -> bool {
        matches!(self.kind, PinKind::Meetup(_))
    }

    /// Place from a normalized fraction of a surface of `unscaled` size.
    pub fn set_normalized(&mut self, fx: f64, fy: f64, unscaled: (f64, f64)) {
        self.normalized = Some((fx, fy));
        self.position = coord! { x: fx * unscaled.0, y: fy * unscaled.1 };
    }

    /// Place at a raw pixel position, forgetting any stored fraction.
    pub fn set_pixel(&mut self, x: f64, y: f64) {
        self.normalized = None;
        self.position = coord! { x: x, y: y };
    }

    pub fn set_image_src(&mut self, src: Option<String>) {
        if self.is_meetup() {
            return;
        }
        self.image = match src {
            Some(src) if !src.is_empty() => PinImage::Avatar(src),
            _ => PinImage::Placeholder,
        };
    }

    /// Render props for the UI layer.
    pub fn render(&self) -> PinView {
        PinView {
            image: self.image.clone(),
            label: self.label.clone(),
            clickable: self.clickable,
            visible: self.visible,
            left: self.position.x,
            top: self.position.y,
        }
    }
}

/// Serializable render props of one pin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PinView {
    pub image: PinImage,
    pub label: Option<String>,
    pub clickable: bool,
    pub visible: bool,
    pub left: f64,
    pub top: f64,
}

/// Container that owns every pin on the map surface.
#[derive(Debug, Default)]
pub struct PinLayer {
    pins: Vec<(PinId, Pin)>,
    next_id: u64,
}

impl PinLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new pin to the layer.
    ///
    /// Meetup pins are clickable and render as a dot; other pins render
    /// `image_src` or the placeholder when it is missing.
    pub fn create_pin(
        &mut self,
        kind: PinKind,
        image_src: Option<&str>,
        label: Option<&str>,
    ) -> PinId {
        let is_meetup = matches!(kind, PinKind::Meetup(_));
        let image = if is_meetup {
            PinImage::Dot
        } else {
            match image_src {
                Some(src) if !src.is_empty() => PinImage::Avatar(src.to_string()),
                _ => PinImage::Placeholder,
            }
        };

        let id = PinId(self.next_id);
        self.next_id += 1;

        self.pins.push((
            id,
            Pin {
                kind,
                image,
                label: label.filter(|l| !l.is_empty()).map(str::to_string),
                clickable: is_meetup,
                visible: true,
                position: coord! { x: 0.0, y: 0.0 },
                normalized: None,
            },
        ));
        id
    }

    pub fn get(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|(p, _)| *p == id).map(|(_, pin)| pin)
    }

    pub fn get_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins
            .iter_mut()
            .find(|(p, _)| *p == id)
            .map(|(_, pin)| pin)
    }

    pub fn remove(&mut self, id: PinId) -> Option<Pin> {
        let index = self.pins.iter().position(|(p, _)| *p == id)?;
        Some(self.pins.remove(index).1)
    }

    /// Drop every peer and meetup pin; the self pin stays.
    pub fn clear_remote(&mut self) {
        self.pins.retain(|(_, pin)| pin.kind == PinKind::Me);
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PinId, &Pin)> {
        self.pins.iter().map(|(id, pin)| (*id, pin))
    }

    /// Reapply stored fractions after the unscaled surface size changed.
    pub fn relayout(&mut self, unscaled: (f64, f64)) {
        for (_, pin) in self.pins.iter_mut() {
            if let Some((fx, fy)) = pin.normalized {
                pin.set_normalized(fx, fy, unscaled);
            }
        }
    }

    /// Meetup under a map-local point, nearest first.
    pub fn hit_test_meetup(&self, local: Coord<f64>) -> Option<&str> {
        self.pins
            .iter()
            .filter(|(_, pin)| pin.visible && pin.clickable)
            .filter_map(|(_, pin)| match &pin.kind {
                PinKind::Meetup(id) => {
                    let d = (pin.position.x - local.x).hypot(pin.position.y - local.y);
                    (d <= MEETUP_HIT_RADIUS).then_some((d, id.as_str()))
                }
                _ => None,
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    /// Render props for every pin in layer order.
    pub fn render_all(&self) -> Vec<PinView> {
        self.pins.iter().map(|(_, pin)| pin.render()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meetup_pin_is_clickable_dot() {
        let mut layer = PinLayer::new();
        let id = layer.create_pin(PinKind::Meetup("m1".into()), Some("ignored.png"), Some("Lunch"));
        let pin = layer.get(id).unwrap();
        assert_eq!(pin.image, PinImage::Dot);
        assert!(pin.clickable);
        assert_eq!(pin.label.as_deref(), Some("Lunch"));
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        let mut layer = PinLayer::new();
        let id = layer.create_pin(PinKind::Peer("u1".into()), None, None);
        let pin = layer.get(id).unwrap();
        assert_eq!(pin.image, PinImage::Placeholder);
        assert!(!pin.clickable);
        assert_eq!(pin.label, None);
    }

    #[test]
    fn test_relayout_reapplies_fractions() {
        let mut layer = PinLayer::new();
        let placed = layer.create_pin(PinKind::Peer("u1".into()), None, None);
        let raw = layer.create_pin(PinKind::Peer("u2".into()), None, None);
        layer.get_mut(placed).unwrap().set_normalized(0.5, 0.25, (1000.0, 800.0));
        layer.get_mut(raw).unwrap().set_pixel(10.0, 10.0);

        layer.relayout((2000.0, 1600.0));

        assert_eq!(layer.get(placed).unwrap().position, coord! { x: 1000.0, y: 400.0 });
        assert_eq!(layer.get(raw).unwrap().position, coord! { x: 10.0, y: 10.0 });
    }

    #[test]
    fn test_clear_remote_keeps_self() {
        let mut layer = PinLayer::new();
        let me = layer.create_pin(PinKind::Me, None, None);
        layer.create_pin(PinKind::Peer("u1".into()), None, None);
        layer.create_pin(PinKind::Meetup("m1".into()), None, None);

        layer.clear_remote();

        assert_eq!(layer.len(), 1);
        assert!(layer.get(me).is_some());
    }

    #[test]
    fn test_hit_test_prefers_nearest_meetup() {
        let mut layer = PinLayer::new();
        let a = layer.create_pin(PinKind::Meetup("a".into()), None, None);
        let b = layer.create_pin(PinKind::Meetup("b".into()), None, None);
        layer.get_mut(a).unwrap().set_pixel(100.0, 100.0);
        layer.get_mut(b).unwrap().set_pixel(108.0, 100.0);

        assert_eq!(layer.hit_test_meetup(coord! { x: 106.0, y: 100.0 }), Some("b"));
        assert_eq!(layer.hit_test_meetup(coord! { x: 300.0, y: 300.0 }), None);
    }

    #[test]
    fn test_render_props_serialize() {
        let mut layer = PinLayer::new();
        let id = layer.create_pin(PinKind::Peer("u1".into()), Some("a.svg"), Some("Ana"));
        let json = serde_json::to_value(layer.get(id).unwrap().render()).unwrap();
        assert_eq!(json["image"]["type"], "avatar");
        assert_eq!(json["image"]["src"], "a.svg");
        assert_eq!(json["label"], "Ana");
    }
}

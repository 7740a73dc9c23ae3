// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map session: the context object tying the map surface to its services.
//!
//! Owns the view, the pin layer, the gesture controller and the location
//! workflow for one signed-in user. Shared state sits behind short-lived
//! `std::sync::Mutex` guards that are never held across an `.await` or an
//! event emit. Lock order is drag, view, pins.

use crate::config::Config;
use crate::db::{collections, fields, DocumentStore};
use crate::error::AppError;
use crate::events::{AppEvent, EventBus, EventKind, ListenerId};
use crate::map::pin::{Pin, PinId, PinKind, PinLayer, PinView};
use crate::map::transform;
use crate::map::{DragController, GestureOutcome, MapView, MoveOutcome, PointerInput, ZoomAction, ZoomChange};
use crate::models::{CreateMeetupRequest, Meetup};
use crate::services::geolocation::{self, GeolocationError, Geolocator};
use crate::services::{LeaveResult, MeetupService, PreferenceStore, PresenceSync};
use crate::ui::{Dialog, FrameMessenger, LocationMessage, MeetupDetail, ModalProps};
use chrono::NaiveDateTime;
use geo::Coord;
use std::sync::{Arc, Mutex, MutexGuard};

const HINT_TITLE: &str = "How to Update Your Location";
const HINT_TEXT: &str = "Click any point on the map and click 'Save My Location'. \
Your friends will now be able to see you in your new spot. Confirm to stop showing this hint.";

/// State of the two-state location button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationMode {
    /// Button reads "Update My Location"
    #[default]
    Update,
    /// Placing the pin; button reads "Save My Location"
    Set,
}

/// How a pointer release was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerUpResult {
    pub gesture: GestureOutcome,
    /// Meetup opened by clicking its pin
    pub meetup: Option<MeetupDetail>,
}

#[derive(Debug, Default)]
struct Placement {
    mode: LocationMode,
    listener: Option<ListenerId>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub struct MapSession<S: DocumentStore, D: Dialog> {
    config: Config,
    store: S,
    bus: EventBus,
    dialog: D,
    frame: Option<Box<dyn FrameMessenger>>,
    presence: PresenceSync<S>,
    meetups: MeetupService<S>,
    view: Arc<Mutex<MapView>>,
    pins: Arc<Mutex<PinLayer>>,
    self_pin: PinId,
    drag: Mutex<DragController>,
    prefs: Mutex<PreferenceStore>,
    user_id: Mutex<Option<String>>,
    placement: Mutex<Placement>,
    /// Fraction picked while placing, not yet saved
    pending: Arc<Mutex<Option<(f64, f64)>>>,
}

impl<S: DocumentStore, D: Dialog> MapSession<S, D> {
    pub fn new(config: Config, store: S, bus: EventBus, dialog: D, prefs: PreferenceStore) -> Self {
        let view = MapView::new(prefs.map().zoom, config.map_width, config.map_height);

        let mut pins = PinLayer::new();
        let self_pin = pins.create_pin(PinKind::Me, None, None);
        if let Some(pin) = pins.get_mut(self_pin) {
            // Hidden until presence knows where we are
            pin.visible = false;
        }

        Self {
            presence: PresenceSync::new(store.clone()),
            meetups: MeetupService::new(store.clone()),
            config,
            store,
            bus,
            dialog,
            frame: None,
            view: Arc::new(Mutex::new(view)),
            pins: Arc::new(Mutex::new(pins)),
            self_pin,
            drag: Mutex::new(DragController::new()),
            prefs: Mutex::new(prefs),
            user_id: Mutex::new(None),
            placement: Mutex::new(Placement::default()),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Send picked locations to a parent frame instead of the database.
    pub fn with_frame<F: FrameMessenger + 'static>(mut self, messenger: F) -> Self {
        self.frame = Some(Box::new(messenger));
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn meetups(&self) -> &MeetupService<S> {
        &self.meetups
    }

    pub fn user_id(&self) -> Option<String> {
        lock(&self.user_id).clone()
    }

    pub fn location_mode(&self) -> LocationMode {
        lock(&self.placement).mode
    }

    pub fn current_zoom(&self) -> f64 {
        lock(&self.view).current_zoom()
    }

    pub fn offset(&self) -> Coord<f64> {
        lock(&self.view).offset()
    }

    /// Screen position of the map container.
    pub fn set_viewport_origin(&self, origin: Coord<f64>) {
        lock(&self.view).set_viewport_origin(origin);
    }

    /// The unscaled surface changed size; move every pin with it.
    pub fn resize_surface(&self, width: f64, height: f64) {
        let mut view = lock(&self.view);
        view.set_unscaled_size(width, height);
        lock(&self.pins).relayout(view.unscaled_size());
    }

    pub fn self_pin(&self) -> Option<Pin> {
        lock(&self.pins).get(self.self_pin).cloned()
    }

    /// Run `f` against the pin layer.
    pub fn with_pins<R>(&self, f: impl FnOnce(&PinLayer) -> R) -> R {
        f(&lock(&self.pins))
    }

    pub fn render_pins(&self) -> Vec<PinView> {
        lock(&self.pins).render_all()
    }

    // ─── Auth & Presence ────────────────────────────────────────

    /// React to the auth provider: broadcast, then load or clear presence.
    ///
    /// A placement in progress belongs to the previous user and is dropped
    /// unsaved.
    pub async fn handle_auth_change(&self, user_id: Option<String>) {
        if self.location_mode() == LocationMode::Set {
            tracing::info!("Auth changed mid-placement, discarding picked location");
        }
        self.end_placement();

        *lock(&self.user_id) = user_id.clone();
        self.bus.emit(&AppEvent::AuthStateChange(user_id.clone()));

        match user_id {
            Some(uid) => {
                tracing::info!(user_id = %uid, "Signed in, syncing presence");
                self.sync_presence().await;
            }
            None => {
                tracing::info!("Signed out, clearing map");
                // Invalidate any sync still in flight
                self.presence.begin();
                let mut pins = lock(&self.pins);
                pins.clear_remote();
                if let Some(pin) = pins.get_mut(self.self_pin) {
                    pin.visible = false;
                }
            }
        }
    }

    /// Reload peers and meetups. Returns whether the result was applied.
    pub async fn sync_presence(&self) -> bool {
        let Some(user_id) = self.user_id() else {
            tracing::debug!("No signed-in user, skipping presence sync");
            return false;
        };

        let ticket = self.presence.begin();
        let snapshot = self.presence.load(&user_id).await;

        if !self.presence.is_current(ticket) {
            tracing::debug!(
                user_id = %user_id,
                generation = ticket.generation(),
                "Discarding stale presence"
            );
            return false;
        }

        {
            let unscaled = lock(&self.view).unscaled_size();
            snapshot.apply(&mut lock(&self.pins), self.self_pin, unscaled);
        }

        if let Some(me) = &snapshot.me {
            self.bus.emit(&AppEvent::ProfilePicFound(me.avatar.clone()));
        }

        tracing::debug!(user_id = %user_id, generation = ticket.generation(), "Presence applied");
        true
    }

    // ─── Gestures & Zoom ────────────────────────────────────────

    pub fn pointer_down(&self, input: PointerInput) {
        let mut drag = lock(&self.drag);
        drag.pointer_down(input, &lock(&self.view));
    }

    pub fn pointer_move(&self, input: PointerInput) -> MoveOutcome {
        let mut drag = lock(&self.drag);
        drag.pointer_move(input, &mut lock(&self.view))
    }

    /// Finish a gesture. A click is broadcast as `MAP_CLICK`; outside of
    /// pin placement, a click on a meetup pin opens its details.
    pub async fn pointer_up(&self, input: PointerInput) -> PointerUpResult {
        let gesture = lock(&self.drag).pointer_up(input);

        let GestureOutcome::Click(point) = gesture else {
            return PointerUpResult { gesture, meetup: None };
        };

        self.bus.emit(&AppEvent::MapClick(point));

        if self.location_mode() == LocationMode::Set {
            return PointerUpResult { gesture, meetup: None };
        }

        let hit = {
            let view = lock(&self.view);
            let local = transform::screen_to_local(point, &view.map_bounds(), view.current_zoom());
            lock(&self.pins).hit_test_meetup(local).map(str::to_string)
        };

        let meetup = match hit {
            Some(meetup_id) => self.open_meetup(&meetup_id).await,
            None => None,
        };
        PointerUpResult { gesture, meetup }
    }

    /// Step the zoom and persist it.
    pub fn zoom(&self, action: ZoomAction) -> ZoomChange {
        let change = lock(&self.view).apply_zoom(action);
        if let Err(e) = lock(&self.prefs).set_zoom(change.new_zoom) {
            tracing::warn!(zoom = change.new_zoom, error = %e, "Failed to persist zoom");
        }
        tracing::debug!(old_zoom = change.old_zoom, new_zoom = change.new_zoom, "Zoom changed");
        change
    }

    // ─── Location Workflow ──────────────────────────────────────

    /// Press the location button. Returns the new mode.
    pub async fn toggle_location_mode(&self) -> LocationMode {
        match self.location_mode() {
            LocationMode::Update => {
                self.begin_placing().await;
                LocationMode::Set
            }
            LocationMode::Set => match self.save_location().await {
                Ok(()) => LocationMode::Update,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to save location");
                    self.report(&e).await;
                    LocationMode::Set
                }
            },
        }
    }

    async fn begin_placing(&self) {
        if !lock(&self.prefs).map().has_pinned_before {
            let dont_show_again = self
                .dialog
                .show(ModalProps::confirm(HINT_TITLE, HINT_TEXT))
                .await;
            if dont_show_again {
                if let Err(e) = lock(&self.prefs).set_has_pinned_before(true) {
                    tracing::warn!(error = %e, "Failed to persist hint preference");
                }
            }
        }

        let mut placement = lock(&self.placement);
        if placement.mode == LocationMode::Set {
            return;
        }
        *lock(&self.pending) = None;

        let view = Arc::clone(&self.view);
        let pins = Arc::clone(&self.pins);
        let pending = Arc::clone(&self.pending);
        let self_pin = self.self_pin;

        let listener = self.bus.on(EventKind::MapClick, move |event| {
            let AppEvent::MapClick(point) = event else {
                return;
            };
            let view = lock(&view);
            let (fx, fy) = transform::screen_to_normalized(*point, &view.map_bounds(), view.current_zoom());
            if let Some(pin) = lock(&pins).get_mut(self_pin) {
                pin.set_normalized(fx, fy, view.unscaled_size());
                pin.visible = true;
            }
            *lock(&pending) = Some((fx, fy));
        });

        placement.mode = LocationMode::Set;
        placement.listener = Some(listener);
        tracing::debug!("Placing location pin");
    }

    /// Leave placement mode: drop the click listener and the pending pick.
    fn end_placement(&self) {
        let listener = {
            let mut placement = lock(&self.placement);
            placement.mode = LocationMode::Update;
            placement.listener.take()
        };
        if let Some(id) = listener {
            self.bus.off(EventKind::MapClick, Some(id));
        }
        *lock(&self.pending) = None;
    }

    /// Persist the picked location, or hand it to the parent frame.
    async fn save_location(&self) -> Result<(), AppError> {
        let picked = *lock(&self.pending);

        match picked {
            None => tracing::debug!("No location picked, nothing to save"),
            Some((fx, fy)) if self.config.embedded => {
                let frame = self.frame.as_ref().ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!("Embedded map has no parent frame"))
                })?;
                frame.post(LocationMessage::new(fx, fy))?;
                tracing::info!(fx, fy, "Posted location to parent frame");
            }
            Some((fx, fy)) => {
                let user_id = self
                    .user_id()
                    .ok_or_else(|| AppError::BadRequest("Sign in to save your location".to_string()))?;

                let mut patch = serde_json::Map::new();
                patch.insert(fields::LOCATION.to_string(), serde_json::json!([fx, fy]));
                self.store
                    .update_fields(collections::USERS, &user_id, patch)
                    .await?;
                tracing::info!(user_id = %user_id, fx, fy, "Saved location");
            }
        }

        self.end_placement();

        if picked.is_some() {
            let mut prefs = lock(&self.prefs);
            if !prefs.map().has_pinned_before {
                if let Err(e) = prefs.set_has_pinned_before(true) {
                    tracing::warn!(error = %e, "Failed to persist pin preference");
                }
            }
        }
        Ok(())
    }

    /// Move the self pin to the device's location, entering placement mode.
    ///
    /// The fix is only picked, not saved; the user still confirms with the
    /// location button. Failures are shown once and not retried.
    pub async fn snap_to_device_location<G: Geolocator>(&self, geolocator: &G) -> Option<(f64, f64)> {
        match self.locate(geolocator).await {
            Ok((fx, fy)) => {
                if self.location_mode() == LocationMode::Update {
                    self.begin_placing().await;
                }
                {
                    let unscaled = lock(&self.view).unscaled_size();
                    if let Some(pin) = lock(&self.pins).get_mut(self.self_pin) {
                        pin.set_normalized(fx, fy, unscaled);
                        pin.visible = true;
                    }
                }
                *lock(&self.pending) = Some((fx, fy));
                tracing::info!(fx, fy, "Snapped to device location");
                Some((fx, fy))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Device location failed");
                self.report(&e.into()).await;
                None
            }
        }
    }

    async fn locate<G: Geolocator>(&self, geolocator: &G) -> Result<(f64, f64), GeolocationError> {
        let campus = self
            .config
            .campus_bounds
            .ok_or(GeolocationError::NoCampusBounds)?;
        let fix = geolocator.current_position().await?;
        geolocation::fix_to_normalized(fix, &campus)
    }

    // ─── Meetups ────────────────────────────────────────────────

    /// Details of one meetup as seen by the signed-in user.
    pub async fn open_meetup(&self, meetup_id: &str) -> Option<MeetupDetail> {
        let viewer = self.user_id().unwrap_or_default();
        match self.meetups.get(meetup_id).await {
            Ok(meetup) => Some(MeetupDetail::new(&meetup, &viewer, now())),
            Err(e) => {
                tracing::warn!(meetup_id, error = %e, "Failed to open meetup");
                None
            }
        }
    }

    /// Join from the detail dialog. Returns the refreshed details.
    pub async fn join_meetup(&self, meetup_id: &str) -> Option<MeetupDetail> {
        let user_id = self.require_user().await?;
        match self.meetups.join(meetup_id, &user_id).await {
            Ok(meetup) => Some(MeetupDetail::new(&meetup, &user_id, now())),
            Err(e) => {
                self.report(&e).await;
                None
            }
        }
    }

    /// Leave from the detail dialog. `None` when refused or when leaving
    /// deleted the meetup.
    pub async fn leave_meetup(&self, meetup_id: &str) -> Option<MeetupDetail> {
        let user_id = self.require_user().await?;
        match self.meetups.leave(meetup_id, &user_id).await {
            Ok(LeaveResult::Left(meetup)) => Some(MeetupDetail::new(&meetup, &user_id, now())),
            Ok(LeaveResult::Deleted) => {
                self.sync_presence().await;
                None
            }
            Err(e) => {
                self.report(&e).await;
                None
            }
        }
    }

    pub async fn delete_meetup(&self, meetup_id: &str) -> bool {
        let Some(user_id) = self.require_user().await else {
            return false;
        };
        match self.meetups.delete(meetup_id, &user_id).await {
            Ok(()) => {
                self.sync_presence().await;
                true
            }
            Err(e) => {
                self.report(&e).await;
                false
            }
        }
    }

    /// Submit the create-meetup form.
    pub async fn create_meetup(&self, request: CreateMeetupRequest) -> Option<Meetup> {
        let user_id = self.require_user().await?;
        match self.meetups.create(&user_id, request, now()).await {
            Ok(meetup) => {
                self.sync_presence().await;
                Some(meetup)
            }
            Err(e) => {
                self.report(&e).await;
                None
            }
        }
    }

    async fn require_user(&self) -> Option<String> {
        let user_id = self.user_id();
        if user_id.is_none() {
            self.dialog
                .show(ModalProps::alert("Not Signed In", "Please sign in first."))
                .await;
        }
        user_id
    }

    /// Show an error to the user.
    async fn report(&self, err: &AppError) {
        if !err.is_user_facing() {
            tracing::warn!(error = %err, "Operation failed");
        }
        let (title, desc) = err.user_message();
        self.dialog.show(ModalProps::alert(title, desc)).await;
    }
}

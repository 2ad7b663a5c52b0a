//! # Map View-Model
//!
//! Marker management for the campus map. Tap behavior is gated by an
//! explicit finite-state mode value with named transitions; there is no
//! ambient "current tool" state anywhere else.
//!
//! Device location acquisition stays outside the core: the UI hands a raw
//! coordinate reading (or none) to `resolve_current_location`.

use std::sync::Arc;

use tokio::sync::watch;

/// A latitude/longitude pair. 0.0/0.0 means "unset" in stored records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// What a map tap currently does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerMode {
    #[default]
    Normal,
    AddMarker,
    DeleteMarker,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapState {
    pub markers: Vec<Coordinate>,
    pub current_location: Option<Coordinate>,
    pub location_permission_granted: bool,
    pub error: Option<String>,
    pub mode: MarkerMode,
}

/// Campus center, the fallback when no usable reading is available.
const CAMPUS_DEFAULT: Coordinate = Coordinate::new(43.0731, -89.4012);
/// The stock emulator coordinate; a reading this close to it is a stub, not
/// a real position.
const EMULATOR_DEFAULT: Coordinate = Coordinate::new(37.4219983, -122.084);
const EMULATOR_TOLERANCE: f64 = 1e-4;

fn is_emulator_default(position: Coordinate) -> bool {
    (position.latitude - EMULATOR_DEFAULT.latitude).abs() < EMULATOR_TOLERANCE
        && (position.longitude - EMULATOR_DEFAULT.longitude).abs() < EMULATOR_TOLERANCE
}

pub struct MapViewModel {
    state_tx: Arc<watch::Sender<MapState>>,
    selected_tx: Arc<watch::Sender<Option<Coordinate>>>,
}

impl Default for MapViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MapViewModel {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(MapState::default());
        let (selected_tx, _) = watch::channel(None);
        Self { state_tx: Arc::new(state_tx), selected_tx: Arc::new(selected_tx) }
    }

    pub fn state(&self) -> watch::Receiver<MapState> {
        self.state_tx.subscribe()
    }

    pub fn selected_marker(&self) -> watch::Receiver<Option<Coordinate>> {
        self.selected_tx.subscribe()
    }

    pub fn update_location_permission(&self, granted: bool) {
        self.state_tx.send_modify(|state| state.location_permission_granted = granted);
    }

    /// Folds a raw sensor reading into the state. Without permission this is
    /// an error; a missing or emulator-stub reading falls back to campus.
    pub fn resolve_current_location(&self, reading: Option<Coordinate>) {
        self.state_tx.send_modify(|state| {
            if !state.location_permission_granted {
                state.error = Some("Location permission not granted.".to_string());
                return;
            }
            let resolved = match reading {
                None => CAMPUS_DEFAULT,
                Some(position) if is_emulator_default(position) => CAMPUS_DEFAULT,
                Some(position) => position,
            };
            state.current_location = Some(resolved);
            state.error = None;
        });
    }

    pub fn enter_add_mode(&self) {
        self.state_tx.send_modify(|state| state.mode = MarkerMode::AddMarker);
    }

    pub fn enter_delete_mode(&self) {
        self.state_tx.send_modify(|state| state.mode = MarkerMode::DeleteMarker);
    }

    pub fn exit_mode(&self) {
        self.state_tx.send_modify(|state| state.mode = MarkerMode::Normal);
    }

    /// Adds a marker and returns to `Normal`. An exact duplicate position is
    /// ignored.
    pub fn add_marker(&self, position: Coordinate) {
        self.state_tx.send_modify(|state| {
            if !state.markers.contains(&position) {
                state.markers.push(position);
            }
            state.mode = MarkerMode::Normal;
        });
    }

    /// Removes a marker and returns to `Normal`.
    pub fn remove_marker(&self, position: Coordinate) {
        self.state_tx.send_modify(|state| {
            state.markers.retain(|marker| *marker != position);
            state.mode = MarkerMode::Normal;
        });
    }

    pub fn select_marker(&self, position: Coordinate) {
        self.selected_tx.send_replace(Some(position));
    }

    pub fn clear_selection(&self) {
        self.selected_tx.send_replace(None);
    }
}

//! URL fragment sync for camera and style.
//!
//! The fragment looks like `#map=<zoom>/<lat>/<lng>[/<bearing>/<pitch>]&style=<key>`.
//! Writes are throttled on the trailing edge: every request (re)arms a single
//! pending slot and [`HashSync::poll`] performs the write once the slot is
//! due. Time is passed in explicitly so hosts can drive it from a frame loop
//! or a timer and tests can step it.

use crate::constants::MAX_COORD_DIGITS;
use crate::core::config::StylerConfig;
use crate::core::geo::{Camera, LatLng};
use crate::traits::{FragmentStore, MapEvent, MapSurface};
use fxhash::FxHashSet;
use instant::Instant;
use std::time::Duration;

/// Decoded fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// `None` when the map segment was missing or malformed.
    pub camera: Option<Camera>,
    pub style_key: String,
}

impl ViewState {
    /// Parse a fragment. Anything unreadable falls back to `baseline` and no
    /// camera; this never fails.
    pub fn parse(fragment: &str, valid_keys: &[String], baseline: &str) -> Self {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let mut camera = None;
        let mut style_key = baseline.to_string();

        for segment in fragment.split('&') {
            let Some((name, value)) = segment.split_once('=') else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            match name {
                "map" => camera = parse_map_segment(value).or(camera),
                "style" => {
                    if valid_keys.iter().any(|k| k == value) {
                        style_key = value.to_string();
                    } else {
                        log::debug!("ignoring unknown style '{value}' in fragment");
                        style_key = baseline.to_string();
                    }
                }
                _ => {}
            }
        }

        Self { camera, style_key }
    }

    /// Encode a camera and style key. `style=` is left out for `baseline`.
    pub fn encode(camera: &Camera, style_key: &str, baseline: &str) -> String {
        let digits = coordinate_digits(camera.zoom);
        let mut map = format!(
            "{}/{}/{}",
            fixed(camera.zoom, 2),
            fixed(camera.center.lat, digits),
            fixed(camera.center.lng, digits)
        );
        if camera.is_rotated() {
            map.push_str(&format!(
                "/{}/{}",
                fixed(camera.bearing, 1),
                fixed(camera.pitch, 1)
            ));
        }

        let mut fragment = format!("#map={map}");
        if style_key != baseline {
            fragment.push_str("&style=");
            fragment.push_str(style_key);
        }
        fragment
    }
}

fn parse_map_segment(value: &str) -> Option<Camera> {
    let parts = value
        .trim_end_matches('/')
        .split('/')
        .map(|part| part.parse::<f64>().ok().filter(|n| n.is_finite()))
        .collect::<Option<Vec<_>>>()?;
    if parts.len() < 3 {
        return None;
    }
    let bearing = parts.get(3).copied().unwrap_or(0.0);
    let pitch = parts.get(4).copied().unwrap_or(0.0);
    let center = LatLng::new(parts[1], parts[2]);
    if !center.is_valid() {
        return None;
    }
    Some(Camera::new(center, parts[0]).with_rotation(bearing, pitch))
}

/// Decimal digits for coordinates at `zoom`: enough to resolve a pixel.
///
/// `log2(zoom) + log2(180) + 8` is the precision in bits; it is converted
/// to decimal digits so every zoom level stays within `f64` precision.
pub fn coordinate_digits(zoom: f64) -> usize {
    let bits = zoom.log2() + 180f64.log2() + 8.0;
    let digits = (bits * std::f64::consts::LOG10_2).ceil();
    if digits.is_nan() || digits <= 0.0 {
        0
    } else {
        (digits as usize).min(MAX_COORD_DIGITS)
    }
}

/// Fixed-point formatting with redundant zeros and a bare point removed.
fn fixed(value: f64, digits: usize) -> String {
    let text = format!("{value:.digits$}");
    if !text.contains('.') {
        return text;
    }
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Subscription {
    MoveEnd,
    FragmentChange,
}

type StyleCallback = Box<dyn FnMut(&str)>;

/// Bidirectional camera/style ⇄ fragment sync.
pub struct HashSync {
    baseline: String,
    valid_keys: Vec<String>,
    throttle: Duration,
    style_key: String,
    applying: bool,
    pending: Option<Instant>,
    awaiting_load: bool,
    last_written: Option<String>,
    subscriptions: FxHashSet<Subscription>,
    on_style_change: Option<StyleCallback>,
}

impl HashSync {
    pub fn new(config: &StylerConfig, valid_keys: Vec<String>) -> Self {
        Self {
            baseline: config.default_style.clone(),
            valid_keys,
            throttle: config.throttle(),
            style_key: config.default_style.clone(),
            applying: false,
            pending: None,
            awaiting_load: false,
            last_written: None,
            subscriptions: FxHashSet::default(),
            on_style_change: None,
        }
    }

    /// Called when an external fragment edit picks a different style.
    pub fn on_style_change(mut self, callback: impl FnMut(&str) + 'static) -> Self {
        self.on_style_change = Some(Box::new(callback));
        self
    }

    /// Styles the fragment may select from now on.
    pub fn set_valid_keys(&mut self, valid_keys: Vec<String>) {
        self.valid_keys = valid_keys;
    }

    pub fn style_key(&self) -> &str {
        &self.style_key
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending write is due, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
    }

    pub fn is_active(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Read the fragment, move the camera and return the style to start
    /// with. The first write happens after the map reports `Load` if it is
    /// not loaded yet.
    pub fn initialize(
        &mut self,
        now: Instant,
        map: &mut dyn MapSurface,
        fragment: &dyn FragmentStore,
    ) -> String {
        let state = ViewState::parse(&fragment.read(), &self.valid_keys, &self.baseline);
        self.style_key = state.style_key;
        if let Some(camera) = &state.camera {
            map.jump_to(camera);
        }

        self.subscriptions.insert(Subscription::MoveEnd);
        self.subscriptions.insert(Subscription::FragmentChange);

        if map.is_loaded() {
            self.schedule(now);
        } else {
            log::debug!("hash: deferring first write until the map loads");
            self.awaiting_load = true;
        }

        log::debug!("hash: initialized with style '{}'", self.style_key);
        self.style_key.clone()
    }

    pub fn handle_map_event(&mut self, now: Instant, event: MapEvent) {
        match event {
            MapEvent::MoveEnd => {
                if self.subscriptions.contains(&Subscription::MoveEnd) && !self.applying {
                    self.schedule(now);
                }
            }
            MapEvent::Load => {
                if self.awaiting_load {
                    self.awaiting_load = false;
                    self.schedule(now);
                }
            }
        }
    }

    pub fn set_style_key(&mut self, now: Instant, key: &str) {
        self.style_key = key.to_string();
        self.schedule(now);
    }

    fn schedule(&mut self, now: Instant) {
        if self.applying {
            return;
        }
        self.pending = Some(now + self.throttle);
    }

    /// Perform the pending write if it is due. Returns whether a write
    /// happened.
    pub fn poll(
        &mut self,
        now: Instant,
        map: &dyn MapSurface,
        fragment: &mut dyn FragmentStore,
    ) -> bool {
        match self.pending {
            Some(due) if due <= now => {
                self.pending = None;
                self.applying = true;
                let encoded = ViewState::encode(&map.camera(), &self.style_key, &self.baseline);
                log::debug!("hash: writing {encoded}");
                fragment.replace(&encoded);
                self.last_written = Some(encoded);
                self.applying = false;
                true
            }
            _ => false,
        }
    }

    /// React to a fragment edit made outside the sync (address bar, links).
    pub fn handle_fragment_change(&mut self, map: &mut dyn MapSurface, fragment: &dyn FragmentStore) {
        if self.applying || !self.subscriptions.contains(&Subscription::FragmentChange) {
            return;
        }
        let current = fragment.read();
        if self.last_written.as_deref() == Some(current.as_str()) {
            return;
        }

        self.applying = true;
        let state = ViewState::parse(&current, &self.valid_keys, &self.baseline);
        if let Some(camera) = &state.camera {
            map.jump_to(camera);
        }
        if state.style_key != self.style_key {
            log::info!("hash: style changed to '{}'", state.style_key);
            self.style_key = state.style_key;
            if let Some(callback) = self.on_style_change.as_mut() {
                callback(&self.style_key);
            }
        }
        self.applying = false;
    }

    /// Stop listening and drop any pending write.
    pub fn destroy(&mut self) {
        self.subscriptions.clear();
        self.pending = None;
        self.awaiting_load = false;
    }
}

impl std::fmt::Debug for HashSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashSync")
            .field("style_key", &self.style_key)
            .field("pending", &self.pending)
            .field("awaiting_load", &self.awaiting_load)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{MemoryFragment, RecordingMap};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn keys() -> Vec<String> {
        ["colorful", "eclipse", "graybeard", "shadow", "neutrino", "satellite"]
            .iter()
            .map(|k| k.to_string())
            .collect()
    }

    fn sync() -> HashSync {
        HashSync::new(&StylerConfig::default(), keys())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_parse_full_fragment() {
        let state = ViewState::parse("#map=10/51.5/-0.12&style=eclipse", &keys(), "colorful");
        assert_eq!(state.style_key, "eclipse");
        assert_eq!(
            state.camera,
            Some(Camera::new(LatLng::new(51.5, -0.12), 10.0))
        );
    }

    #[test]
    fn test_parse_unknown_style_keeps_camera() {
        let state = ViewState::parse("#map=3/10/20/45/30&style=bogus", &keys(), "colorful");
        assert_eq!(state.style_key, "colorful");
        assert_eq!(
            state.camera,
            Some(Camera::new(LatLng::new(10.0, 20.0), 3.0).with_rotation(45.0, 30.0))
        );
    }

    #[test]
    fn test_parse_malformed_is_no_information() {
        for fragment in ["", "#", "#map=10/51.5", "#map=a/b/c", "#map=1/inf/2", "garbage", "#=x"] {
            let state = ViewState::parse(fragment, &keys(), "colorful");
            assert_eq!(state.camera, None, "{fragment}");
            assert_eq!(state.style_key, "colorful");
        }
    }

    #[test]
    fn test_encode_omits_defaults() {
        let camera = Camera::new(LatLng::new(51.5, -0.12), 10.0);
        assert_eq!(ViewState::encode(&camera, "colorful", "colorful"), "#map=10/51.5/-0.12");
        assert_eq!(
            ViewState::encode(&camera, "eclipse", "colorful"),
            "#map=10/51.5/-0.12&style=eclipse"
        );
    }

    #[test]
    fn test_encode_rotation_and_rounding() {
        let camera = Camera::new(LatLng::new(0.0, 0.0), 4.256).with_rotation(12.34, 0.0);
        assert_eq!(ViewState::encode(&camera, "colorful", "colorful"), "#map=4.26/0/0/12.3/0");
    }

    #[test]
    fn test_round_trip() {
        let camera = Camera::new(LatLng::new(48.137154, 11.576124), 12.5).with_rotation(30.0, 45.0);
        let encoded = ViewState::encode(&camera, "shadow", "colorful");
        let decoded = ViewState::parse(&encoded, &keys(), "colorful");
        assert_eq!(decoded.style_key, "shadow");
        assert_eq!(decoded.camera, Some(camera));
    }

    #[test]
    fn test_coordinate_digits_grow_with_zoom() {
        assert_eq!(coordinate_digits(0.0), 0);
        assert!(coordinate_digits(0.01) < coordinate_digits(1.0));
        assert_eq!(coordinate_digits(1.0), 5);
        assert_eq!(coordinate_digits(11.0), 6);
        assert_eq!(coordinate_digits(22.0), 7);
        assert!(coordinate_digits(1.0) < coordinate_digits(22.0));
        assert!(coordinate_digits(22.0) < MAX_COORD_DIGITS);
    }

    #[test]
    fn test_encode_precision_follows_zoom() {
        let center = LatLng::new(52.123456789, 13.987654321);
        let low = ViewState::encode(&Camera::new(center, 1.0), "colorful", "colorful");
        let high = ViewState::encode(&Camera::new(center, 22.0), "colorful", "colorful");
        assert_eq!(low, "#map=1/52.12346/13.98765");
        assert_eq!(high, "#map=22/52.1234568/13.9876543");
    }

    #[test]
    fn test_parse_ignores_trailing_slash() {
        let state = ViewState::parse("#map=10/51.5/-0.12/", &keys(), "colorful");
        assert_eq!(
            state.camera,
            Some(Camera::new(LatLng::new(51.5, -0.12), 10.0))
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range_center() {
        let state = ViewState::parse("#map=3/95/10&style=eclipse", &keys(), "colorful");
        assert_eq!(state.camera, None);
        assert_eq!(state.style_key, "eclipse");
    }

    #[test]
    fn test_initialize_jumps_and_returns_style() {
        let mut map = RecordingMap::default();
        map.loaded = true;
        let fragment = MemoryFragment::new("#map=10/51.5/-0.12&style=eclipse");
        let mut hash = sync();
        let key = hash.initialize(Instant::now(), &mut map, &fragment);
        assert_eq!(key, "eclipse");
        assert_eq!(map.jumps, vec![Camera::new(LatLng::new(51.5, -0.12), 10.0)]);
        assert!(hash.is_pending());
    }

    #[test]
    fn test_burst_collapses_to_one_write() {
        let start = Instant::now();
        let mut map = RecordingMap::new(Camera::new(LatLng::new(1.0, 2.0), 5.0));
        let mut fragment = MemoryFragment::default();
        let mut hash = sync();
        hash.initialize(start, &mut map, &fragment);

        hash.set_style_key(start + ms(50), "eclipse");
        hash.set_style_key(start + ms(100), "shadow");
        hash.set_style_key(start + ms(150), "neutrino");

        assert!(!hash.poll(start + ms(300), &map, &mut fragment));
        assert!(hash.poll(start + ms(450), &map, &mut fragment));
        assert!(!hash.poll(start + ms(900), &map, &mut fragment));
        assert_eq!(fragment.writes(), 1);
        assert_eq!(fragment.read(), "#map=5/1/2&style=neutrino");
    }

    #[test]
    fn test_first_write_waits_for_load() {
        let start = Instant::now();
        let mut map = RecordingMap::default();
        map.loaded = false;
        let mut fragment = MemoryFragment::default();
        let mut hash = sync();
        hash.initialize(start, &mut map, &fragment);
        assert!(!hash.is_pending());

        hash.handle_map_event(start + ms(1000), MapEvent::Load);
        assert!(hash.poll(start + ms(1300), &map, &mut fragment));
        assert_eq!(fragment.writes(), 1);
    }

    #[test]
    fn test_external_change_switches_style_once() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let start = Instant::now();
        let mut map = RecordingMap::new(Camera::default());
        let mut fragment = MemoryFragment::default();
        let mut hash = sync().on_style_change(move |key| sink.borrow_mut().push(key.to_string()));
        hash.initialize(start, &mut map, &fragment);
        hash.poll(start + ms(300), &map, &mut fragment);

        // our own write is not an external change
        hash.handle_fragment_change(&mut map, &fragment);
        assert!(changes.borrow().is_empty());

        fragment.set_external("#map=2/3/4&style=graybeard");
        hash.handle_fragment_change(&mut map, &fragment);
        assert_eq!(*changes.borrow(), vec!["graybeard".to_string()]);
        assert_eq!(map.camera, Camera::new(LatLng::new(3.0, 4.0), 2.0));
        assert_eq!(hash.style_key(), "graybeard");

        hash.handle_fragment_change(&mut map, &fragment);
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_destroy_cancels_pending_write() {
        let start = Instant::now();
        let mut map = RecordingMap::new(Camera::default());
        let mut fragment = MemoryFragment::default();
        let mut hash = sync();
        hash.initialize(start, &mut map, &fragment);
        hash.destroy();

        assert!(!hash.poll(start + ms(1000), &map, &mut fragment));
        hash.handle_map_event(start + ms(1000), MapEvent::MoveEnd);
        assert!(!hash.is_pending());
        assert!(!hash.is_active());
        assert_eq!(fragment.writes(), 0);
    }
}

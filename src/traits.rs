//! Seams to the host environment
//!
//! The control never talks to a map library, the address bar or the system
//! clipboard directly. Hosts implement these traits; the crate ships
//! in-memory implementations for headless use and tests.

use crate::{core::geo::Camera, styles::StyleDocument, Result, StylerError};
use async_trait::async_trait;

/// The map the control is attached to.
pub trait MapSurface {
    /// Replace the rendered style.
    fn set_style(&mut self, style: &StyleDocument);

    fn camera(&self) -> Camera;

    fn jump_to(&mut self, camera: &Camera);

    /// Whether the map finished its initial load.
    fn is_loaded(&self) -> bool;
}

/// Lifecycle events the host forwards from its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEvent {
    MoveEnd,
    Load,
}

/// Storage for the URL fragment (`location.hash` in a browser).
pub trait FragmentStore {
    /// Current fragment including the leading `#`, or empty.
    fn read(&self) -> String;

    /// Replace the fragment without adding a history entry.
    fn replace(&mut self, fragment: &str);
}

/// Text clipboard. Writes are async because the browser clipboard answers
/// with a promise; a rejected write is an error.
#[async_trait(?Send)]
pub trait Clipboard {
    async fn write_text(&mut self, text: &str) -> Result<()>;
}

/// In-memory fragment, standing in for the address bar.
#[derive(Debug, Clone, Default)]
pub struct MemoryFragment {
    fragment: String,
    writes: usize,
}

impl MemoryFragment {
    pub fn new(fragment: impl Into<String>) -> Self {
        Self {
            fragment: fragment.into(),
            writes: 0,
        }
    }

    /// Number of `replace` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Simulate the user editing the address bar. Does not count as a write.
    pub fn set_external(&mut self, fragment: impl Into<String>) {
        self.fragment = fragment.into();
    }
}

impl FragmentStore for MemoryFragment {
    fn read(&self) -> String {
        self.fragment.clone()
    }

    fn replace(&mut self, fragment: &str) {
        self.fragment = fragment.to_string();
        self.writes += 1;
    }
}

/// Clipboard that keeps the last text, optionally refusing writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub deny: bool,
}

impl MemoryClipboard {
    pub fn denying() -> Self {
        Self {
            contents: None,
            deny: true,
        }
    }
}

#[async_trait(?Send)]
impl Clipboard for MemoryClipboard {
    async fn write_text(&mut self, text: &str) -> Result<()> {
        if self.deny {
            return Err(StylerError::Clipboard("permission denied".into()));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Map stand-in that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingMap {
    pub camera: Camera,
    pub loaded: bool,
    pub styles: Vec<StyleDocument>,
    pub jumps: Vec<Camera>,
}

impl RecordingMap {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            loaded: true,
            styles: Vec::new(),
            jumps: Vec::new(),
        }
    }

    pub fn last_style(&self) -> Option<&StyleDocument> {
        self.styles.last()
    }
}

impl MapSurface for RecordingMap {
    fn set_style(&mut self, style: &StyleDocument) {
        self.styles.push(style.clone());
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn jump_to(&mut self, camera: &Camera) {
        self.camera = *camera;
        self.jumps.push(*camera);
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

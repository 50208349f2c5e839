//! Prelude module for common maplet-styler types and traits
//!
//! `use maplet_styler::prelude::*;` brings in the control, the option tree
//! types, the host traits and the std/fxhash shorthands used internally.

pub use crate::core::{
    color::{Color, Recolor},
    config::StylerConfig,
    diff::{diff, diff_tree, merge},
    geo::{Camera, LatLng},
    options::{OptionPath, OptionValue, OptionsTree},
};

pub use crate::control::{Metadata, MetadataResult, PanelEvent, PanelOutcome, StylerControl};
pub use crate::export::{StyleDownload, COPIED_NOTICE};
pub use crate::hash::{HashSync, ViewState};
pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner, TaskSet};
pub use crate::styles::{StyleBuilder, StyleDocument, StyleFamily, StyleRegistry};
pub use crate::tiles::{FontFamily, TileJson};
pub use crate::traits::{
    Clipboard, FragmentStore, MapEvent, MapSurface, MemoryClipboard, MemoryFragment, RecordingMap,
};
pub use crate::ui::{
    ContainerId, ControlValue, FieldDescriptor, FieldEvent, FieldKind, FieldList, FieldState,
    MemorySurface, Notice, RowId, UiSurface,
};

#[cfg(feature = "egui")]
pub use crate::ui::EguiSurface;

pub use crate::{Result, StylerError};

// Re-export common external types
pub use serde::{Deserialize, Serialize};
pub use serde_json::Value as JsonValue;

// Standard library re-exports
pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
pub use std::{
    future::Future,
    pin::Pin,
    rc::Rc,
    sync::atomic::{AtomicBool, Ordering},
    sync::Arc,
    time::Duration,
};

pub use instant::Instant;

pub use async_trait::async_trait;

//! Form engine and panel surfaces.

pub mod fields;
pub mod list;
pub mod memory;
pub mod surface;

#[cfg(feature = "egui")]
pub mod panel;

#[cfg(feature = "wasm")]
pub mod browser;

pub use fields::{ControlKind, ControlSpec, ControlValue, FieldDescriptor, FieldKind, SelectEntry};
pub use list::{FieldAdder, FieldChange, FieldList, FieldState};
pub use memory::{MemoryRow, MemorySurface};
pub use surface::{ContainerId, FieldAction, FieldEvent, Notice, RowId, StyleEntry, UiSurface};

#[cfg(feature = "egui")]
pub use panel::EguiSurface;

#[cfg(feature = "wasm")]
pub use browser::{trigger_download, LocationFragment, NavigatorClipboard};

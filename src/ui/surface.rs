//! The UI surface the control renders into.
//!
//! A surface owns the actual widgets (DOM nodes, egui rows, or plain structs
//! in tests). The form engine only creates rows, pushes display values into
//! them and reads user input back, so it runs the same everywhere.

use crate::ui::fields::{ControlSpec, ControlValue};
use serde::{Deserialize, Serialize};

/// Sections of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerId {
    Styles,
    Colors,
    Recolor,
    Options,
    Satellite,
}

impl ContainerId {
    pub const ALL: [ContainerId; 5] = [
        ContainerId::Styles,
        ContainerId::Colors,
        ContainerId::Recolor,
        ContainerId::Options,
        ContainerId::Satellite,
    ];

    /// Section heading shown above the rows.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Styles => "Select a style",
            Self::Colors => "Edit individual colors",
            Self::Recolor => "Modify all colors",
            Self::Options => "Select Options",
            Self::Satellite => "Satellite options",
        }
    }
}

/// Handle of a rendered field row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub u64);

/// The two things a user can do to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldAction {
    Changed,
    ResetClicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEvent {
    pub row: RowId,
    pub action: FieldAction,
}

impl FieldEvent {
    pub fn changed(row: RowId) -> Self {
        Self {
            row,
            action: FieldAction::Changed,
        }
    }

    pub fn reset(row: RowId) -> Self {
        Self {
            row,
            action: FieldAction::ResetClicked,
        }
    }
}

/// One entry of the style picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleEntry {
    pub key: String,
    pub active: bool,
}

/// Message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// Widget backend.
pub trait UiSurface {
    /// Drop every row of a container.
    fn clear(&mut self, container: ContainerId);

    /// Append a row at the end of a container. The row's reset control
    /// starts disabled.
    fn append_row(&mut self, container: ContainerId, spec: &ControlSpec) -> RowId;

    /// Push a display value into a row's control.
    fn set_control(&mut self, row: RowId, value: &ControlValue);

    /// What the row's control currently shows, including user input.
    fn control(&self, row: RowId) -> Option<ControlValue>;

    fn set_reset_enabled(&mut self, row: RowId, enabled: bool);

    /// Background of a color row's swatch.
    fn set_swatch(&mut self, row: RowId, css: &str);

    fn set_style_entries(&mut self, entries: &[StyleEntry]);

    fn set_section_visible(&mut self, container: ContainerId, visible: bool);

    fn set_pane_open(&mut self, open: bool);

    fn show_notice(&mut self, notice: Notice);
}

//! Headless [`UiSurface`] keeping rows as plain structs.
//!
//! Used by tests and by [`panel`](super::panel) as its row model.

use crate::ui::fields::{ControlSpec, ControlValue};
use crate::ui::surface::{ContainerId, FieldEvent, Notice, RowId, StyleEntry, UiSurface};
use fxhash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
    pub id: RowId,
    pub container: ContainerId,
    pub spec: ControlSpec,
    pub control: Option<ControlValue>,
    pub reset_enabled: bool,
    pub swatch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    rows: Vec<MemoryRow>,
    next_id: u64,
    style_entries: Vec<StyleEntry>,
    hidden: FxHashMap<ContainerId, bool>,
    pane_open: bool,
    notices: Vec<Notice>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            style_entries: Vec::new(),
            hidden: FxHashMap::default(),
            pane_open: false,
            notices: Vec::new(),
        }
    }

    pub fn row(&self, id: RowId) -> Option<&MemoryRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub(crate) fn row_mut(&mut self, id: RowId) -> Option<&mut MemoryRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn rows_mut(
        &mut self,
        container: ContainerId,
    ) -> impl Iterator<Item = &mut MemoryRow> {
        self.rows.iter_mut().filter(move |r| r.container == container)
    }

    /// Rows of a container in display order.
    pub fn rows(&self, container: ContainerId) -> Vec<&MemoryRow> {
        self.rows
            .iter()
            .filter(|r| r.container == container)
            .collect()
    }

    pub fn all_rows(&self) -> &[MemoryRow] {
        &self.rows
    }

    /// First row of `container` titled `title`.
    pub fn find(&self, container: ContainerId, title: &str) -> Option<RowId> {
        self.rows
            .iter()
            .find(|r| r.container == container && r.spec.title == title)
            .map(|r| r.id)
    }

    /// Put user input into a row and return the event a real widget would
    /// emit.
    pub fn user_input(&mut self, id: RowId, value: ControlValue) -> FieldEvent {
        if let Some(row) = self.row_mut(id) {
            row.control = Some(value);
        }
        FieldEvent::changed(id)
    }

    pub fn click_reset(&self, id: RowId) -> FieldEvent {
        FieldEvent::reset(id)
    }

    pub fn style_entries(&self) -> &[StyleEntry] {
        &self.style_entries
    }

    pub fn active_style(&self) -> Option<&str> {
        self.style_entries
            .iter()
            .find(|e| e.active)
            .map(|e| e.key.as_str())
    }

    pub fn is_visible(&self, container: ContainerId) -> bool {
        !self.hidden.get(&container).copied().unwrap_or(false)
    }

    pub fn pane_open(&self) -> bool {
        self.pane_open
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl UiSurface for MemorySurface {
    fn clear(&mut self, container: ContainerId) {
        self.rows.retain(|r| r.container != container);
    }

    fn append_row(&mut self, container: ContainerId, spec: &ControlSpec) -> RowId {
        let id = RowId(self.next_id);
        self.next_id += 1;
        self.rows.push(MemoryRow {
            id,
            container,
            spec: spec.clone(),
            control: None,
            reset_enabled: false,
            swatch: None,
        });
        id
    }

    fn set_control(&mut self, row: RowId, value: &ControlValue) {
        if let Some(row) = self.row_mut(row) {
            row.control = Some(value.clone());
        }
    }

    fn control(&self, row: RowId) -> Option<ControlValue> {
        self.row(row).and_then(|r| r.control.clone())
    }

    fn set_reset_enabled(&mut self, row: RowId, enabled: bool) {
        if let Some(row) = self.row_mut(row) {
            row.reset_enabled = enabled;
        }
    }

    fn set_swatch(&mut self, row: RowId, css: &str) {
        if let Some(row) = self.row_mut(row) {
            row.swatch = Some(css.to_string());
        }
    }

    fn set_style_entries(&mut self, entries: &[StyleEntry]) {
        self.style_entries = entries.to_vec();
    }

    fn set_section_visible(&mut self, container: ContainerId, visible: bool) {
        self.hidden.insert(container, !visible);
    }

    fn set_pane_open(&mut self, open: bool) {
        self.pane_open = open;
    }

    fn show_notice(&mut self, notice: Notice) {
        match &notice {
            Notice::Info(text) => log::info!("{text}"),
            Notice::Error(text) => log::warn!("{text}"),
        }
        self.notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::fields::ControlKind;

    fn spec(title: &str) -> ControlSpec {
        ControlSpec {
            title: title.into(),
            class: "checkbox".into(),
            kind: ControlKind::Checkbox,
        }
    }

    #[test]
    fn test_clear_only_touches_one_container() {
        let mut surface = MemorySurface::new();
        surface.append_row(ContainerId::Colors, &spec("land"));
        surface.append_row(ContainerId::Recolor, &spec("rotate"));
        surface.clear(ContainerId::Colors);
        assert!(surface.rows(ContainerId::Colors).is_empty());
        assert_eq!(surface.rows(ContainerId::Recolor).len(), 1);
    }

    #[test]
    fn test_row_ids_are_unique_across_clears() {
        let mut surface = MemorySurface::new();
        let first = surface.append_row(ContainerId::Colors, &spec("land"));
        surface.clear(ContainerId::Colors);
        let second = surface.append_row(ContainerId::Colors, &spec("land"));
        assert_ne!(first, second);
        assert_eq!(surface.find(ContainerId::Colors, "land"), Some(second));
    }
}

//! egui rendition of the styler panel.
//!
//! Rows live in a [`MemorySurface`]; [`EguiSurface::show`] draws them every
//! frame and returns what the user did as [`PanelEvent`]s for the control.

use crate::control::PanelEvent;
use crate::core::color::Color;
use crate::ui::fields::{ControlKind, ControlSpec, ControlValue};
use crate::ui::memory::{MemoryRow, MemorySurface};
use crate::ui::surface::{ContainerId, FieldEvent, Notice, RowId, StyleEntry, UiSurface};
use egui::{Button, CollapsingHeader, Color32, ComboBox, Slider, Ui};

const FIELD_SECTIONS: [ContainerId; 4] = [
    ContainerId::Colors,
    ContainerId::Recolor,
    ContainerId::Options,
    ContainerId::Satellite,
];

#[derive(Debug, Clone, Default)]
pub struct EguiSurface {
    model: MemorySurface,
}

impl EguiSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &MemorySurface {
        &self.model
    }

    /// Draw the panel and collect user actions.
    pub fn show(&mut self, ui: &mut Ui) -> Vec<PanelEvent> {
        let mut events = Vec::new();

        let toggle = if self.model.pane_open() { "◀ Styler" } else { "▶ Styler" };
        if ui.button(toggle).clicked() {
            events.push(PanelEvent::TogglePane);
        }
        if !self.model.pane_open() {
            return events;
        }

        ui.heading(ContainerId::Styles.title());
        ui.horizontal_wrapped(|ui| {
            for entry in self.model.style_entries() {
                if ui.selectable_label(entry.active, entry.key.as_str()).clicked() && !entry.active {
                    events.push(PanelEvent::SelectStyle(entry.key.clone()));
                }
            }
        });

        for container in FIELD_SECTIONS {
            if !self.model.is_visible(container) || self.model.rows(container).is_empty() {
                continue;
            }
            let model = &mut self.model;
            CollapsingHeader::new(container.title())
                .default_open(container != ContainerId::Recolor)
                .show(ui, |ui| {
                    for row in model.rows_mut(container) {
                        if let Some(event) = show_row(ui, row) {
                            events.push(PanelEvent::Field(event));
                        }
                    }
                });
        }

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Download style").clicked() {
                events.push(PanelEvent::Download);
            }
            if ui.button("Copy code").clicked() {
                events.push(PanelEvent::CopyCode);
            }
        });

        for notice in self.model.notices().iter().rev().take(3) {
            match notice {
                Notice::Info(text) => ui.label(text.as_str()),
                Notice::Error(text) => ui.colored_label(Color32::from_rgb(200, 40, 40), text.as_str()),
            };
        }

        events
    }

    pub fn dismiss_notices(&mut self) {
        self.model.take_notices();
    }
}

fn show_row(ui: &mut Ui, row: &mut MemoryRow) -> Option<FieldEvent> {
    let mut event = None;
    let id = row.id;
    let title = row.spec.title.as_str();

    ui.horizontal(|ui| {
        let changed = match (&row.spec.kind, &mut row.control) {
            (ControlKind::Checkbox, Some(ControlValue::Checked(checked))) => {
                ui.checkbox(checked, title).changed()
            }
            (ControlKind::Range { min, max, step }, Some(ControlValue::Range(value))) => {
                ui.label(title);
                ui.add(Slider::new(value, *min..=*max).step_by(*step)).changed()
            }
            (ControlKind::Color, Some(ControlValue::Text(text))) => {
                ui.label(title);
                let mut rgb = Color::parse(text)
                    .map(|c| [c.r, c.g, c.b])
                    .unwrap_or([0, 0, 0]);
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    *text = Color::rgb(rgb[0], rgb[1], rgb[2]).to_hex();
                    true
                } else {
                    false
                }
            }
            (ControlKind::Select { entries }, Some(ControlValue::Text(token))) => {
                ui.label(title);
                let before = token.clone();
                let selected = entries
                    .iter()
                    .find(|e| e.token == *token)
                    .map(|e| e.label.clone())
                    .unwrap_or_else(|| token.clone());
                ComboBox::from_id_source(("styler-select", id.0))
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for entry in entries {
                            ui.selectable_value(&mut *token, entry.token.clone(), entry.label.as_str());
                        }
                    });
                *token != before
            }
            _ => {
                ui.label(title);
                false
            }
        };
        if changed {
            event = Some(FieldEvent::changed(id));
        }
        if ui.add_enabled(row.reset_enabled, Button::new("↺")).clicked() {
            event = Some(FieldEvent::reset(id));
        }
    });

    event
}

impl UiSurface for EguiSurface {
    fn clear(&mut self, container: ContainerId) {
        self.model.clear(container);
    }

    fn append_row(&mut self, container: ContainerId, spec: &ControlSpec) -> RowId {
        self.model.append_row(container, spec)
    }

    fn set_control(&mut self, row: RowId, value: &ControlValue) {
        self.model.set_control(row, value);
    }

    fn control(&self, row: RowId) -> Option<ControlValue> {
        self.model.control(row)
    }

    fn set_reset_enabled(&mut self, row: RowId, enabled: bool) {
        self.model.set_reset_enabled(row, enabled);
    }

    fn set_swatch(&mut self, row: RowId, css: &str) {
        self.model.set_swatch(row, css);
    }

    fn set_style_entries(&mut self, entries: &[StyleEntry]) {
        self.model.set_style_entries(entries);
    }

    fn set_section_visible(&mut self, container: ContainerId, visible: bool) {
        self.model.set_section_visible(container, visible);
    }

    fn set_pane_open(&mut self, open: bool) {
        self.model.set_pane_open(open);
    }

    fn show_notice(&mut self, notice: Notice) {
        self.model.show_notice(notice);
    }
}

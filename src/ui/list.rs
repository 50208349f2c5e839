//! Field lists: a group of rows bound to one scope of the live options tree.
//!
//! The list keeps a snapshot of the builder defaults for its scope. When a
//! row is added the live value is seeded from that snapshot, the control is
//! filled, and the reset control is enabled iff the live value differs from
//! the default. User edits and resets write straight into the live tree and
//! then fire the list's change callback.

use crate::core::options::{OptionPath, OptionValue, OptionsTree};
use crate::ui::fields::{self, FieldDescriptor, FieldKind};
use crate::ui::surface::{ContainerId, FieldAction, FieldEvent, RowId, UiSurface};
use crate::{Result, StylerError};

/// Passed to the change callback after the live tree was updated.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    /// Absolute path in the live tree.
    pub path: OptionPath,
    /// New live value; `None` when a reset removed the entry.
    pub value: Option<OptionValue>,
    pub reset: bool,
}

/// Snapshot of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub current: Option<OptionValue>,
    pub default: Option<OptionValue>,
    pub dirty: bool,
}

type ChangeCallback = Box<dyn FnMut(&FieldChange)>;

struct FieldRow {
    row: RowId,
    descriptor: FieldDescriptor,
    default: Option<OptionValue>,
}

pub struct FieldList {
    container: ContainerId,
    scope: OptionPath,
    defaults: OptionsTree,
    rows: Vec<FieldRow>,
    on_change: ChangeCallback,
}

impl FieldList {
    /// Create an empty list over `scope` and clear its container.
    pub fn new(
        surface: &mut dyn UiSurface,
        container: ContainerId,
        scope: OptionPath,
        defaults: OptionsTree,
        on_change: impl FnMut(&FieldChange) + 'static,
    ) -> Self {
        surface.clear(container);
        Self {
            container,
            scope,
            defaults,
            rows: Vec::new(),
            on_change: Box::new(on_change),
        }
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    pub fn scope(&self) -> &OptionPath {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Start adding rows. Rows are appended in call order.
    pub fn fields<'a>(
        &'a mut self,
        surface: &'a mut dyn UiSurface,
        options: &'a mut OptionsTree,
    ) -> FieldAdder<'a> {
        FieldAdder {
            list: self,
            surface,
            options,
            error: None,
        }
    }

    /// Add one row.
    ///
    /// A second row for an already bound key is ignored. Fails only when the
    /// live tree cannot hold the value, e.g. the scope runs through a leaf.
    pub fn add_field(
        &mut self,
        surface: &mut dyn UiSurface,
        options: &mut OptionsTree,
        descriptor: FieldDescriptor,
    ) -> Result<Option<RowId>> {
        if self.rows.iter().any(|r| r.descriptor.path == descriptor.path) {
            log::warn!(
                "{:?}: field '{}' is already bound, ignoring",
                self.container,
                descriptor.path
            );
            return Ok(None);
        }

        let path = self.scope.join(&descriptor.path);
        let default = self.defaults.get_path(&descriptor.path).cloned();
        if options.get_path(&path).is_none() {
            if let Some(default) = &default {
                options.set_path(&path, default.clone())?;
            }
        }

        let row = surface.append_row(self.container, &fields::render(&descriptor));
        let current = options.get_path(&path).cloned();
        let applied = fields::apply_value(&descriptor.kind, current.as_ref());
        surface.set_control(row, &applied.control);
        if let Some(css) = &applied.swatch {
            surface.set_swatch(row, css);
        }
        let current = match applied.stored {
            Some(stored) if current.as_ref() != Some(&stored) => {
                options.set_path(&path, stored.clone())?;
                Some(stored)
            }
            _ => current,
        };
        surface.set_reset_enabled(row, current != default);

        self.rows.push(FieldRow {
            row,
            descriptor,
            default,
        });
        Ok(Some(row))
    }

    /// Route a row event. Returns `Ok(false)` for rows this list doesn't own.
    pub fn handle_event(
        &mut self,
        surface: &mut dyn UiSurface,
        options: &mut OptionsTree,
        event: &FieldEvent,
    ) -> Result<bool> {
        let Some(field) = self.rows.iter().find(|r| r.row == event.row) else {
            return Ok(false);
        };
        let path = self.scope.join(&field.descriptor.path);

        let change = match event.action {
            FieldAction::Changed => {
                let control = surface.control(field.row).ok_or_else(|| {
                    StylerError::UnsupportedValue(format!("row {:?} has no control", field.row))
                })?;
                let value = fields::read_value(&field.descriptor.kind, &control)?;
                options.set_path(&path, value.clone())?;
                if matches!(field.descriptor.kind, FieldKind::Color) {
                    if let Some(css) = value.as_str() {
                        surface.set_swatch(field.row, css);
                    }
                }
                surface.set_reset_enabled(field.row, Some(&value) != field.default.as_ref());
                FieldChange {
                    path,
                    value: Some(value),
                    reset: false,
                }
            }
            FieldAction::ResetClicked => {
                let applied = fields::apply_value(&field.descriptor.kind, field.default.as_ref());
                surface.set_control(field.row, &applied.control);
                if let Some(css) = &applied.swatch {
                    surface.set_swatch(field.row, css);
                }
                let restored = applied.stored.or_else(|| field.default.clone());
                match &restored {
                    Some(value) => options.set_path(&path, value.clone())?,
                    None => {
                        options.remove_path(&path);
                    }
                }
                surface.set_reset_enabled(field.row, false);
                FieldChange {
                    path,
                    value: restored,
                    reset: true,
                }
            }
        };

        log::debug!("{:?}: {} -> {:?}", self.container, change.path, change.value);
        (self.on_change)(&change);
        Ok(true)
    }

    pub fn owns(&self, row: RowId) -> bool {
        self.rows.iter().any(|r| r.row == row)
    }

    pub fn row_id(&self, key: &str) -> Option<RowId> {
        let key = OptionPath::from(key);
        self.rows
            .iter()
            .find(|r| r.descriptor.path == key)
            .map(|r| r.row)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.rows.iter().map(|r| &r.descriptor)
    }

    /// State of the field bound to `key` (relative to the scope).
    pub fn field_state(&self, options: &OptionsTree, key: &str) -> Option<FieldState> {
        let key = OptionPath::from(key);
        let field = self.rows.iter().find(|r| r.descriptor.path == key)?;
        let current = options.get_path(&self.scope.join(&key)).cloned();
        let dirty = current != field.default;
        Some(FieldState {
            current,
            default: field.default.clone(),
            dirty,
        })
    }
}

impl std::fmt::Debug for FieldList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldList")
            .field("container", &self.container)
            .field("scope", &self.scope)
            .field("rows", &self.rows.len())
            .finish()
    }
}

/// Chained row builder returned by [`FieldList::fields`]. The first failure
/// stops further rows and is reported by [`finish`](Self::finish).
#[must_use = "call finish() to see whether every row was added"]
pub struct FieldAdder<'a> {
    list: &'a mut FieldList,
    surface: &'a mut dyn UiSurface,
    options: &'a mut OptionsTree,
    error: Option<StylerError>,
}

impl<'a> FieldAdder<'a> {
    pub fn add(mut self, descriptor: FieldDescriptor) -> Self {
        if self.error.is_none() {
            if let Err(err) = self
                .list
                .add_field(&mut *self.surface, &mut *self.options, descriptor)
            {
                self.error = Some(err);
            }
        }
        self
    }

    pub fn add_checkbox(self, key: &str, title: &str) -> Self {
        self.add(FieldDescriptor::checkbox(key, title))
    }

    pub fn add_number(self, key: &str, title: &str, min: f64, max: f64, scale: f64) -> Self {
        self.add(FieldDescriptor::number(key, title, min, max, scale))
    }

    pub fn add_color(self, key: &str, title: &str) -> Self {
        self.add(FieldDescriptor::color(key, title))
    }

    pub fn add_select<L, T>(
        self,
        key: &str,
        title: &str,
        options: impl IntoIterator<Item = (L, T)>,
    ) -> Self
    where
        L: Into<String>,
        T: Into<String>,
    {
        self.add(FieldDescriptor::select(key, title, options))
    }

    pub fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

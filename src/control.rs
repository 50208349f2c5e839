//! The style session controller.
//!
//! [`StylerControl`] owns the selected style, its live options tree and the
//! field lists bound to it. Every field change re-runs the style builder
//! and pushes the new document to the map. Metadata that fills in optional
//! selects (languages, fonts) and the tile source list arrive from
//! background tasks through a channel drained in [`StylerControl::poll`];
//! results requested by an older session are dropped.

use crate::constants::{BASE_URL_KEY, VECTOR_SOURCE};
use crate::core::config::StylerConfig;
use crate::core::diff::diff_tree;
use crate::core::options::{OptionPath, OptionsTree};
use crate::export::{self, StyleDownload, COPIED_NOTICE};
use crate::hash::HashSync;
use crate::prelude::{Arc, Instant, Rc};
use crate::runtime::{self, AsyncHandle, MaybeSend, TaskSet};
use crate::styles::{StyleBuilder, StyleDocument, StyleFamily, StyleRegistry};
use crate::tiles::{self, FontFamily};
use crate::traits::{Clipboard, FragmentStore, MapEvent, MapSurface};
use crate::ui::fields::FieldDescriptor;
use crate::ui::list::{FieldChange, FieldList, FieldState};
use crate::ui::surface::{ContainerId, FieldEvent, Notice, StyleEntry, UiSurface};
use crate::{Result, StylerError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::{Cell, RefCell};

/// Language entries offered when tile metadata is not looked up.
pub const STATIC_LANGUAGES: [(&str, &str); 3] = [("local", ""), ("German", "de"), ("English", "en")];

/// What the user did in the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    SelectStyle(String),
    Field(FieldEvent),
    TogglePane,
    Download,
    CopyCode,
}

/// Result of handling a [`PanelEvent`] the host may have to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelOutcome {
    Handled,
    /// Save this document (browser download, file dialog, ...).
    Download(StyleDownload),
    /// The snippet that was put on the clipboard.
    Copied(String),
}

/// Payload of a background metadata request.
#[derive(Debug)]
pub enum Metadata {
    Languages(Result<Vec<(String, String)>>),
    Fonts(Result<Vec<FontFamily>>),
    Sources(Result<Vec<String>>),
}

/// A finished metadata request. `generation` is the session that asked for
/// it; `None` for control-wide requests.
#[derive(Debug)]
pub struct MetadataResult {
    pub generation: Option<u64>,
    pub metadata: Metadata,
}

struct StyleSession {
    key: String,
    builder: Arc<dyn StyleBuilder>,
    options: OptionsTree,
    defaults: OptionsTree,
    lists: Vec<FieldList>,
    document: Option<StyleDocument>,
}

pub struct StylerControl<S: UiSurface, M: MapSurface> {
    config: StylerConfig,
    all_styles: StyleRegistry,
    registry: StyleRegistry,
    surface: S,
    map: M,
    clipboard: Option<Box<dyn Clipboard>>,
    fragment: Option<Box<dyn FragmentStore>>,
    hash: Option<HashSync>,
    hash_style: Rc<RefCell<Option<String>>>,
    session: Option<StyleSession>,
    generation: u64,
    changed: Rc<Cell<bool>>,
    metadata_tx: Sender<MetadataResult>,
    metadata_rx: Receiver<MetadataResult>,
    tasks: TaskSet,
    discovery: Option<Box<dyn AsyncHandle>>,
    sources: Option<Vec<String>>,
    pane_open: bool,
}

impl<S: UiSurface, M: MapSurface> StylerControl<S, M> {
    pub fn new(config: StylerConfig, registry: StyleRegistry, surface: S, map: M) -> Result<Self> {
        config.validate()?;
        if registry.is_empty() {
            return Err(StylerError::Config("style registry is empty".into()));
        }
        let (metadata_tx, metadata_rx) = unbounded();
        Ok(Self {
            pane_open: config.open,
            config,
            all_styles: registry.clone(),
            registry,
            surface,
            map,
            clipboard: None,
            fragment: None,
            hash: None,
            hash_style: Rc::new(RefCell::new(None)),
            session: None,
            generation: 0,
            changed: Rc::new(Cell::new(false)),
            metadata_tx,
            metadata_rx,
            tasks: TaskSet::new(),
            discovery: None,
            sources: None,
        })
    }

    /// Clipboard for "copy code". Without one, copying fails with a notice.
    pub fn with_clipboard(mut self, clipboard: impl Clipboard + 'static) -> Self {
        self.clipboard = Some(Box::new(clipboard));
        self
    }

    /// Fragment storage used when `config.hash` is set.
    pub fn with_fragment(mut self, fragment: impl FragmentStore + 'static) -> Self {
        self.fragment = Some(Box::new(fragment));
        self
    }

    /// Build the panel, pick the initial style and render it.
    pub async fn mount(&mut self) -> Result<()> {
        self.surface.set_pane_open(self.pane_open);

        let mut initial = self.config.default_style.clone();
        if self.config.hash {
            if let Some(fragment) = self.fragment.as_deref() {
                let slot = self.hash_style.clone();
                let mut hash = HashSync::new(&self.config, self.registry.keys())
                    .on_style_change(move |key| *slot.borrow_mut() = Some(key.to_string()));
                initial = hash.initialize(Instant::now(), &mut self.map, fragment);
                self.hash = Some(hash);
            } else {
                log::warn!("hash sync enabled without a fragment store");
            }
        }
        if !self.registry.contains(&initial) {
            log::warn!("initial style '{initial}' is not registered");
            initial = self.registry.keys().into_iter().next().unwrap_or_default();
        }

        if !self.config.offline {
            let url = self.config.tile_index_url();
            self.discovery = self.spawn_metadata(None, async move {
                Metadata::Sources(tiles::fetch_tile_sources(&url).await)
            });
        }

        log::info!("mounting styler with style '{initial}'");
        self.select_style(&initial).await
    }

    /// Tear everything down. The control can be mounted again.
    pub fn unmount(&mut self) {
        if let Some(mut hash) = self.hash.take() {
            hash.destroy();
        }
        self.tasks.cancel_all();
        if let Some(discovery) = self.discovery.take() {
            discovery.cancel();
        }
        self.session = None;
        for container in ContainerId::ALL {
            self.surface.clear(container);
        }
        self.surface.set_style_entries(&[]);
        log::debug!("styler unmounted");
    }

    /// Start a fresh session for `key`. Unknown keys are rejected before
    /// anything changes.
    pub async fn select_style(&mut self, key: &str) -> Result<()> {
        let builder = self.registry.require(key)?;

        self.generation += 1;
        self.tasks.cancel_all();
        self.changed.set(false);

        let defaults = builder.default_options();
        let mut options = defaults.clone();
        options.insert(BASE_URL_KEY, self.config.origin.clone());

        let lists = self.build_lists(builder.family(), &mut options, &defaults)?;
        self.session = Some(StyleSession {
            key: key.to_string(),
            builder: builder.clone(),
            options,
            defaults,
            lists,
            document: None,
        });

        if builder.family() == StyleFamily::Vector && !self.config.offline {
            self.request_vector_metadata();
        }

        self.refresh_style_entries();
        if let Some(hash) = self.hash.as_mut() {
            if hash.style_key() != key {
                hash.set_style_key(Instant::now(), key);
            }
        }

        log::info!("selected style '{key}' (session {})", self.generation);
        self.render().await
    }

    fn build_lists(
        &mut self,
        family: StyleFamily,
        options: &mut OptionsTree,
        defaults: &OptionsTree,
    ) -> Result<Vec<FieldList>> {
        let vector = family == StyleFamily::Vector;
        for container in [ContainerId::Colors, ContainerId::Recolor, ContainerId::Options] {
            self.surface.set_section_visible(container, vector);
        }
        self.surface
            .set_section_visible(ContainerId::Satellite, !vector);
        for container in ContainerId::ALL {
            if container != ContainerId::Styles {
                self.surface.clear(container);
            }
        }

        let mut lists = Vec::new();
        if vector {
            let colors = defaults.subtree("colors").cloned().unwrap_or_default();
            let mut list = self.list(ContainerId::Colors, "colors", colors.clone());
            let mut adder = list.fields(&mut self.surface, options);
            for key in colors.keys() {
                adder = adder.add_color(key, key);
            }
            adder.finish()?;
            lists.push(list);

            let recolor = defaults.subtree("recolor").cloned().unwrap_or_default();
            let mut list = self.list(ContainerId::Recolor, "recolor", recolor);
            list.fields(&mut self.surface, options)
                .add_checkbox("invertBrightness", "invert brightness")
                .add_number("rotate", "rotate hue", 0.0, 360.0, 1.0)
                .add_number("saturate", "saturate", -1.0, 1.0, 100.0)
                .add_number("gamma", "gamma", 0.1, 10.0, 1.0)
                .add_number("contrast", "contrast", 0.0, 10.0, 100.0)
                .add_number("brightness", "brightness", -1.0, 1.0, 100.0)
                .add_number("tint", "tint", 0.0, 1.0, 100.0)
                .add_color("tintColor", "tint color")
                .add_number("blend", "blend", 0.0, 1.0, 100.0)
                .add_color("blendColor", "blend color")
                .finish()?;
            lists.push(list);

            let mut list = self.list(ContainerId::Options, "", defaults.clone());
            if self.config.offline {
                list.fields(&mut self.surface, options)
                    .add_select("language", "language", STATIC_LANGUAGES)
                    .finish()?;
            }
            lists.push(list);
        } else {
            let has_overlay = self.has_source(VECTOR_SOURCE);
            let mut list = self.list(ContainerId::Satellite, "", defaults.clone());
            let mut adder = list.fields(&mut self.surface, options);
            if has_overlay {
                adder = adder.add_checkbox("overlay", "show overlay");
            }
            adder
                .add_number("rasterOpacity", "opacity", 0.0, 1.0, 100.0)
                .add_number("rasterHueRotate", "rotate hue", 0.0, 360.0, 1.0)
                .add_number("rasterBrightnessMin", "brightness min", 0.0, 1.0, 100.0)
                .add_number("rasterBrightnessMax", "brightness max", 0.0, 1.0, 100.0)
                .add_number("rasterSaturation", "saturation", -1.0, 1.0, 100.0)
                .add_number("rasterContrast", "contrast", -1.0, 1.0, 100.0)
                .finish()?;
            lists.push(list);
        }
        Ok(lists)
    }

    fn list(&mut self, container: ContainerId, scope: &str, defaults: OptionsTree) -> FieldList {
        let changed = self.changed.clone();
        let scope = if scope.is_empty() {
            OptionPath::root()
        } else {
            OptionPath::from(scope)
        };
        FieldList::new(
            &mut self.surface,
            container,
            scope,
            defaults,
            move |change: &FieldChange| {
                log::debug!("option {} changed", change.path);
                changed.set(true);
            },
        )
    }

    fn has_source(&self, source: &str) -> bool {
        self.sources
            .as_ref()
            .map_or(true, |sources| sources.iter().any(|s| s == source))
    }

    fn refresh_style_entries(&mut self) {
        let active = self.session.as_ref().map(|s| s.key.as_str());
        let entries: Vec<StyleEntry> = self
            .registry
            .keys()
            .into_iter()
            .map(|key| StyleEntry {
                active: Some(key.as_str()) == active,
                key,
            })
            .collect();
        self.surface.set_style_entries(&entries);
    }

    fn request_vector_metadata(&mut self) {
        let generation = Some(self.generation);

        let url = self.config.tile_json_url();
        if let Some(handle) = self.spawn_metadata(generation, async move {
            let languages = tiles::fetch_tile_json(&url).await.map(|t| t.languages());
            Metadata::Languages(languages)
        }) {
            self.tasks.push(handle);
        }

        let url = self.config.font_index_url();
        if let Some(handle) = self.spawn_metadata(generation, async move {
            Metadata::Fonts(tiles::fetch_font_families(&url).await)
        }) {
            self.tasks.push(handle);
        }
    }

    fn spawn_metadata<F>(&self, generation: Option<u64>, request: F) -> Option<Box<dyn AsyncHandle>>
    where
        F: std::future::Future<Output = Metadata> + MaybeSend + 'static,
    {
        let tx = self.metadata_tx.clone();
        let task = async move {
            let metadata = request.await;
            let _ = tx.send(MetadataResult {
                generation,
                metadata,
            });
        };
        match runtime::spawn(task) {
            Ok(handle) => Some(handle),
            Err(err) => {
                log::warn!("cannot start metadata request: {err}");
                None
            }
        }
    }

    /// Run the selected builder and push the document to the map.
    pub async fn render(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        match session.builder.build(&session.options).await {
            Ok(document) => {
                self.map.set_style(&document);
                session.document = Some(document);
                Ok(())
            }
            Err(err) => {
                log::warn!("building '{}' failed: {err}", session.key);
                self.surface
                    .show_notice(Notice::Error(format!("Could not build style: {err}")));
                Err(err)
            }
        }
    }

    /// Options that differ from the selected style's defaults.
    pub fn minimal_options(&self) -> Option<OptionsTree> {
        let session = self.session.as_ref()?;
        diff_tree(&session.options, &session.defaults)
    }

    pub async fn handle_event(&mut self, event: PanelEvent) -> Result<PanelOutcome> {
        match event {
            PanelEvent::SelectStyle(key) => {
                if self.current_style() != Some(key.as_str()) {
                    self.select_style(&key).await?;
                }
                Ok(PanelOutcome::Handled)
            }
            PanelEvent::Field(event) => {
                self.handle_field_event(event).await?;
                Ok(PanelOutcome::Handled)
            }
            PanelEvent::TogglePane => {
                self.pane_open = !self.pane_open;
                self.surface.set_pane_open(self.pane_open);
                Ok(PanelOutcome::Handled)
            }
            PanelEvent::Download => Ok(PanelOutcome::Download(self.export_download()?)),
            PanelEvent::CopyCode => Ok(PanelOutcome::Copied(self.export_code().await?)),
        }
    }

    async fn handle_field_event(&mut self, event: FieldEvent) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Some(list) = session.lists.iter_mut().find(|l| l.owns(event.row)) else {
            log::debug!("ignoring event for unknown row {:?}", event.row);
            return Ok(());
        };
        if let Err(err) = list.handle_event(&mut self.surface, &mut session.options, &event) {
            self.surface.show_notice(Notice::Error(err.to_string()));
            return Err(err);
        }
        if self.changed.replace(false) {
            self.render().await?;
        }
        Ok(())
    }

    /// The last rendered document as a download.
    pub fn export_download(&self) -> Result<StyleDownload> {
        let document = self
            .session
            .as_ref()
            .and_then(|s| s.document.as_ref())
            .ok_or_else(|| StylerError::Build("no style rendered yet".into()))?;
        let download = StyleDownload::new(document)?;
        log::info!("exporting {} ({} bytes)", download.file_name, download.contents.len());
        Ok(download)
    }

    /// Copy the builder call for the current options to the clipboard.
    /// Failures, including a control without a clipboard, are shown to the
    /// user and returned.
    pub async fn export_code(&mut self) -> Result<String> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| StylerError::Build("no style selected".into()))?;
        let result = match self.clipboard.as_deref_mut() {
            Some(clipboard) => {
                let minimal = diff_tree(&session.options, &session.defaults);
                export::copy_style_code(
                    clipboard,
                    &session.key,
                    minimal.as_ref(),
                    session.builder.is_async(),
                )
                .await
            }
            None => Err(StylerError::Clipboard("no clipboard configured".into())),
        };
        match &result {
            Ok(_) => self
                .surface
                .show_notice(Notice::Info(COPIED_NOTICE.to_string())),
            Err(err) => self
                .surface
                .show_notice(Notice::Error(format!("Could not copy style code: {err}"))),
        }
        result
    }

    /// Apply finished metadata requests and due fragment writes.
    pub async fn poll(&mut self, now: Instant) -> Result<()> {
        let results: Vec<MetadataResult> = self.metadata_rx.try_iter().collect();
        for result in results {
            self.apply_metadata(result).await?;
        }

        if let (Some(hash), Some(fragment)) = (self.hash.as_mut(), self.fragment.as_deref_mut()) {
            hash.poll(now, &self.map, fragment);
        }
        self.follow_hash_style(now).await
    }

    /// Sender for metadata results, for hosts that fetch on their own.
    pub fn metadata_sender(&self) -> Sender<MetadataResult> {
        self.metadata_tx.clone()
    }

    async fn apply_metadata(&mut self, result: MetadataResult) -> Result<()> {
        if let Some(generation) = result.generation {
            if generation != self.generation {
                log::debug!(
                    "dropping metadata from session {generation} (current {})",
                    self.generation
                );
                return Ok(());
            }
        }

        match result.metadata {
            Metadata::Languages(Ok(languages)) => self.add_option_rows(vec![
                FieldDescriptor::select("language", "language", languages),
            ]),
            Metadata::Fonts(Ok(fonts)) => {
                let entries: Vec<(String, String)> =
                    fonts.into_iter().map(|f| (f.name, f.id)).collect();
                self.add_option_rows(vec![
                    FieldDescriptor::select("fonts.regular", "Font regular", entries.clone()),
                    FieldDescriptor::select("fonts.bold", "Font bold", entries),
                ])
            }
            Metadata::Sources(Ok(sources)) => self.apply_sources(sources).await,
            Metadata::Languages(Err(err)) | Metadata::Fonts(Err(err)) | Metadata::Sources(Err(err)) => {
                log::warn!("metadata unavailable: {err}");
                Ok(())
            }
        }
    }

    fn add_option_rows(&mut self, descriptors: Vec<FieldDescriptor>) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let options = &mut session.options;
        let Some(list) = session
            .lists
            .iter_mut()
            .find(|l| l.container() == ContainerId::Options)
        else {
            return Ok(());
        };
        descriptors
            .into_iter()
            .fold(list.fields(&mut self.surface, options), |adder, d| adder.add(d))
            .finish()
    }

    async fn apply_sources(&mut self, sources: Vec<String>) -> Result<()> {
        log::info!("tile sources available: {sources:?}");
        self.registry = self.all_styles.retain_sources(&sources);
        let overlay_changed = !sources.iter().any(|s| s == VECTOR_SOURCE);
        self.sources = Some(sources);
        self.refresh_style_entries();
        if let Some(hash) = self.hash.as_mut() {
            hash.set_valid_keys(self.registry.keys());
        }

        let current = self.current_style().map(str::to_string);
        match current {
            Some(key) if !self.registry.contains(&key) => {
                let fallback = self.registry.keys().into_iter().next().unwrap_or_default();
                log::info!("style '{key}' has no tile source, switching to '{fallback}'");
                self.select_style(&fallback).await
            }
            Some(key) if overlay_changed && self.current_family() == Some(StyleFamily::Satellite) => {
                self.select_style(&key).await
            }
            _ => Ok(()),
        }
    }

    pub fn handle_map_event(&mut self, now: Instant, event: MapEvent) {
        if let Some(hash) = self.hash.as_mut() {
            hash.handle_map_event(now, event);
        }
    }

    /// The host saw the fragment change.
    pub async fn handle_fragment_change(&mut self) -> Result<()> {
        if let (Some(hash), Some(fragment)) = (self.hash.as_mut(), self.fragment.as_deref()) {
            hash.handle_fragment_change(&mut self.map, fragment);
        }
        self.follow_hash_style(Instant::now()).await
    }

    /// Act on a style requested by the fragment. A request the registry
    /// cannot serve puts the shown style back into the fragment.
    async fn follow_hash_style(&mut self, now: Instant) -> Result<()> {
        let requested = self.hash_style.borrow_mut().take();
        let Some(key) = requested else {
            return Ok(());
        };
        if self.current_style() == Some(key.as_str()) {
            return Ok(());
        }
        match self.select_style(&key).await {
            Err(StylerError::UnknownStyle(key)) => {
                log::warn!("fragment asked for unavailable style '{key}'");
                let current = self.session.as_ref().map(|s| s.key.clone());
                if let (Some(hash), Some(current)) = (self.hash.as_mut(), current) {
                    hash.set_style_key(now, &current);
                }
                Ok(())
            }
            other => other,
        }
    }

    pub fn current_style(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.key.as_str())
    }

    pub fn current_family(&self) -> Option<StyleFamily> {
        self.session.as_ref().map(|s| s.builder.family())
    }

    /// The live options tree of the current session.
    pub fn options(&self) -> Option<&OptionsTree> {
        self.session.as_ref().map(|s| &s.options)
    }

    pub fn defaults(&self) -> Option<&OptionsTree> {
        self.session.as_ref().map(|s| &s.defaults)
    }

    pub fn last_document(&self) -> Option<&StyleDocument> {
        self.session.as_ref().and_then(|s| s.document.as_ref())
    }

    pub fn field_list(&self, container: ContainerId) -> Option<&FieldList> {
        self.session
            .as_ref()?
            .lists
            .iter()
            .find(|l| l.container() == container)
    }

    pub fn field_state(&self, container: ContainerId, key: &str) -> Option<FieldState> {
        let session = self.session.as_ref()?;
        let list = session.lists.iter().find(|l| l.container() == container)?;
        list.field_state(&session.options, key)
    }

    /// Session counter, bumped on every style selection.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &StylerConfig {
        &self.config
    }

    pub fn hash(&self) -> Option<&HashSync> {
        self.hash.as_ref()
    }

    pub fn pane_open(&self) -> bool {
        self.pane_open
    }

    pub fn running_tasks(&self) -> usize {
        self.tasks.running()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn fragment(&self) -> Option<&dyn FragmentStore> {
        self.fragment.as_deref()
    }

    pub fn fragment_mut(&mut self) -> Option<&mut (dyn FragmentStore + 'static)> {
        self.fragment.as_deref_mut()
    }
}

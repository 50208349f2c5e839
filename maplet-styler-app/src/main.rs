use maplet_styler::prelude::*;
use std::cell::RefCell;

/// Map stand-in for the viewer: keeps the camera and shows the style JSON.
struct PreviewMap {
    camera: Camera,
    style: Option<StyleDocument>,
    updates: usize,
}

impl MapSurface for PreviewMap {
    fn set_style(&mut self, style: &StyleDocument) {
        self.style = Some(style.clone());
        self.updates += 1;
    }

    fn camera(&self) -> Camera {
        self.camera
    }

    fn jump_to(&mut self, camera: &Camera) {
        self.camera = *camera;
    }

    fn is_loaded(&self) -> bool {
        true
    }
}

/// Hands copied text to egui at the end of the frame.
#[derive(Clone, Default)]
struct FrameClipboard(Rc<RefCell<Option<String>>>);

#[async_trait(?Send)]
impl Clipboard for FrameClipboard {
    async fn write_text(&mut self, text: &str) -> maplet_styler::Result<()> {
        *self.0.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Maplet Styler"),
        ..Default::default()
    };

    let app = StylerApp::new()?;
    eframe::run_native(
        "maplet-styler-app",
        options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;

    Ok(())
}

struct StylerApp {
    control: StylerControl<EguiSurface, PreviewMap>,
    clipboard: FrameClipboard,
    saved: Option<StyleDownload>,
}

impl StylerApp {
    fn new() -> anyhow::Result<Self> {
        let map = PreviewMap {
            camera: Camera::new(LatLng::new(52.52, 13.405), 11.0),
            style: None,
            updates: 0,
        };
        let config = StylerConfig {
            open: true,
            ..Default::default()
        };
        let clipboard = FrameClipboard::default();
        let mut control =
            StylerControl::new(config, StyleRegistry::reference(), EguiSurface::new(), map)?
                .with_clipboard(clipboard.clone())
                .with_fragment(MemoryFragment::new("#map=11/52.52/13.405"));

        if let Err(err) = futures::executor::block_on(control.mount()) {
            log::error!("mount failed: {err}");
        }

        Ok(Self {
            control,
            clipboard,
            saved: None,
        })
    }

    fn handle(&mut self, event: PanelEvent) {
        match futures::executor::block_on(self.control.handle_event(event)) {
            Ok(PanelOutcome::Download(download)) => self.saved = Some(download),
            Ok(_) => {}
            Err(err) => log::warn!("panel event failed: {err}"),
        }
    }

    fn camera_controls(&mut self, ui: &mut egui::Ui) {
        let mut camera = self.control.map().camera;
        ui.horizontal(|ui| {
            ui.label("lat");
            ui.add(egui::DragValue::new(&mut camera.center.lat).speed(0.01));
            ui.label("lng");
            ui.add(egui::DragValue::new(&mut camera.center.lng).speed(0.01));
            ui.label("zoom");
            ui.add(egui::DragValue::new(&mut camera.zoom).speed(0.1).clamp_range(0.0..=22.0));
        });
        if camera != self.control.map().camera {
            self.control.map_mut().jump_to(&camera);
            self.control.handle_map_event(Instant::now(), MapEvent::MoveEnd);
        }
    }
}

impl eframe::App for StylerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Err(err) = futures::executor::block_on(self.control.poll(Instant::now())) {
            log::warn!("poll failed: {err}");
        }

        egui::SidePanel::right("styler_panel")
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let events = self.control.surface_mut().show(ui);
                    for event in events {
                        self.handle(event);
                    }
                });
            });

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.camera_controls(ui);
            if let Some(fragment) = self.control.fragment() {
                ui.monospace(fragment.read());
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let map = self.control.map();
            ui.label(format!("Style updates: {}", map.updates));
            if let Some(saved) = &self.saved {
                ui.label(format!("Last download: {} ({} bytes)", saved.file_name, saved.contents.len()));
            }
            egui::ScrollArea::vertical().show(ui, |ui| {
                let json = map
                    .style
                    .as_ref()
                    .and_then(|s| s.to_pretty_json().ok())
                    .unwrap_or_default();
                ui.monospace(json);
            });
        });

        if let Some(text) = self.clipboard.0.borrow_mut().take() {
            ctx.output_mut(|o| o.copied_text = text);
        }
        if self.control.hash().map_or(false, |h| h.is_pending()) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

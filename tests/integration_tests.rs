use maplet_styler::prelude::*;
use maplet_styler::ui::ControlValue;

/// Integration tests driving the control the way a host does: mount,
/// forward panel events and map events, poll.
#[cfg(test)]
mod integration_tests {
    use super::*;

    fn berlin() -> Camera {
        Camera::new(LatLng::new(52.52, 13.405), 11.0)
    }

    /// Offline control with a fragment store; the map is already loaded.
    async fn mount_with_fragment(fragment: &str) -> StylerControl<MemorySurface, RecordingMap> {
        let config = StylerConfig {
            hash: true,
            ..StylerConfig::offline()
        };
        let mut control = StylerControl::new(
            config,
            StyleRegistry::reference(),
            MemorySurface::new(),
            RecordingMap::new(berlin()),
        )
        .unwrap()
        .with_clipboard(MemoryClipboard::default())
        .with_fragment(MemoryFragment::new(fragment));
        control.mount().await.unwrap();
        control
    }

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(1)
    }

    fn fragment(control: &StylerControl<MemorySurface, RecordingMap>) -> String {
        control.fragment().unwrap().read()
    }

    /// A recolor edit shows up in the exported code and nothing else does.
    #[tokio::test]
    async fn test_recolor_edit_exports_minimal_code() {
        let mut control = mount_with_fragment("").await;

        let row = control
            .surface()
            .find(ContainerId::Recolor, "rotate hue")
            .unwrap();
        let event = control
            .surface_mut()
            .user_input(row, ControlValue::Range(90.0));
        control.handle_event(PanelEvent::Field(event)).await.unwrap();

        let outcome = control.handle_event(PanelEvent::CopyCode).await.unwrap();
        assert_eq!(
            outcome,
            PanelOutcome::Copied(
                "import { colorful } from '@versatiles/style';\nconst style = colorful({\n  recolor: {\n    rotate: 90\n  }\n});"
                    .into()
            )
        );
    }

    /// Scaled sliders store the unscaled value.
    #[tokio::test]
    async fn test_percent_slider_is_unscaled() {
        let mut control = mount_with_fragment("").await;
        let row = control
            .surface()
            .find(ContainerId::Recolor, "saturate")
            .unwrap();
        let event = control
            .surface_mut()
            .user_input(row, ControlValue::Range(50.0));
        control.handle_event(PanelEvent::Field(event)).await.unwrap();

        let state = control
            .field_state(ContainerId::Recolor, "saturate")
            .unwrap();
        assert_eq!(state.current, Some(OptionValue::from(0.5)));
        assert!(state.dirty);
    }

    /// The download carries the last rendered document.
    #[tokio::test]
    async fn test_download_matches_rendered_style() {
        let mut control = mount_with_fragment("").await;
        let outcome = control.handle_event(PanelEvent::Download).await.unwrap();
        let PanelOutcome::Download(download) = outcome else {
            panic!("expected a download, got {outcome:?}");
        };
        assert_eq!(download.file_name, "style.json");
        assert_eq!(
            download.contents,
            control.map().last_style().unwrap().to_pretty_json().unwrap()
        );
    }

    /// Fragment on load picks the style and camera.
    #[tokio::test]
    async fn test_fragment_restores_view() {
        let control = mount_with_fragment("#map=5/10/20&style=eclipse").await;
        assert_eq!(control.current_style(), Some("eclipse"));
        let jump = control.map().jumps.last().unwrap();
        assert_eq!(jump.zoom, 5.0);
        assert_eq!(jump.center, LatLng::new(10.0, 20.0));
    }

    /// An unknown style in the fragment falls back to the default.
    #[tokio::test]
    async fn test_fragment_with_unknown_style() {
        let control = mount_with_fragment("#map=5/10/20&style=nope").await;
        assert_eq!(control.current_style(), Some("colorful"));
    }

    /// Picking a style in the panel is written back after the throttle.
    #[tokio::test]
    async fn test_style_switch_is_written_to_fragment() {
        let mut control = mount_with_fragment("").await;
        control
            .handle_event(PanelEvent::SelectStyle("graybeard".into()))
            .await
            .unwrap();

        control.poll(Instant::now()).await.unwrap();
        assert_eq!(fragment(&control), "");

        control.poll(later()).await.unwrap();
        assert!(fragment(&control).ends_with("&style=graybeard"));
        assert!(fragment(&control).starts_with("#map=11/52.52"));
    }

    /// Editing the address bar switches the style once.
    #[tokio::test]
    async fn test_external_fragment_edit_switches_style() {
        let mut control = mount_with_fragment("").await;
        control.poll(later()).await.unwrap();
        let generation = control.generation();

        control
            .fragment_mut()
            .unwrap()
            .replace("#map=3/1/2&style=satellite");
        control.handle_fragment_change().await.unwrap();

        assert_eq!(control.current_style(), Some("satellite"));
        assert_eq!(control.generation(), generation + 1);
        assert!(control.surface().is_visible(ContainerId::Satellite));

        control.handle_fragment_change().await.unwrap();
        assert_eq!(control.generation(), generation + 1);
    }

    /// A fragment style that the tile server no longer offers does not
    /// leave the fragment out of step with the shown style.
    #[tokio::test]
    async fn test_fragment_style_filtered_by_sources() {
        let mut control = mount_with_fragment("").await;
        control
            .metadata_sender()
            .send(MetadataResult {
                generation: None,
                metadata: Metadata::Sources(Ok(vec!["osm".into()])),
            })
            .unwrap();
        control.poll(later()).await.unwrap();
        assert_eq!(control.current_style(), Some("colorful"));

        control
            .fragment_mut()
            .unwrap()
            .replace("#map=3/1/2&style=satellite");
        control.handle_fragment_change().await.unwrap();
        assert_eq!(control.current_style(), Some("colorful"));

        control.handle_map_event(Instant::now(), MapEvent::MoveEnd);
        control.poll(later()).await.unwrap();

        assert_eq!(control.hash().unwrap().style_key(), "colorful");
        assert!(!fragment(&control).contains("satellite"));
    }

    /// When the baseline style is filtered out too, the fragment is pointed
    /// back at the style on screen.
    #[tokio::test]
    async fn test_fragment_falls_back_to_shown_style() {
        let mut control = mount_with_fragment("").await;
        control
            .metadata_sender()
            .send(MetadataResult {
                generation: None,
                metadata: Metadata::Sources(Ok(vec!["satellite".into()])),
            })
            .unwrap();
        control.poll(later()).await.unwrap();
        assert_eq!(control.current_style(), Some("satellite"));

        control.fragment_mut().unwrap().replace("#map=3/1/2");
        control.handle_fragment_change().await.unwrap();
        assert_eq!(control.current_style(), Some("satellite"));
        assert_eq!(control.hash().unwrap().style_key(), "satellite");

        control.poll(later()).await.unwrap();
        assert!(fragment(&control).ends_with("&style=satellite"));
    }

    /// Camera moves collapse into one write.
    #[tokio::test]
    async fn test_move_burst_writes_once() {
        let mut control = mount_with_fragment("").await;
        control.poll(later()).await.unwrap();
        let first = fragment(&control);

        for zoom in [12.0, 13.0, 14.0] {
            control.map_mut().camera.zoom = zoom;
            control.handle_map_event(Instant::now(), MapEvent::MoveEnd);
        }
        assert!(control.hash().unwrap().is_pending());
        control.poll(later()).await.unwrap();

        let written = fragment(&control);
        assert_ne!(written, first);
        assert!(written.starts_with("#map=14/"));
        assert!(!control.hash().unwrap().is_pending());
    }

    /// Unmount stops fragment writes and empties the panel.
    #[tokio::test]
    async fn test_unmount_tears_down() {
        let mut control = mount_with_fragment("").await;
        control.unmount();

        assert!(control.current_style().is_none());
        assert!(control.hash().is_none());
        assert!(control.surface().all_rows().is_empty());
        assert!(control.surface().style_entries().is_empty());
    }

    /// The pane toggle flips the surface state.
    #[tokio::test]
    async fn test_toggle_pane() {
        let mut control = mount_with_fragment("").await;
        assert!(control.surface().pane_open());
        control.handle_event(PanelEvent::TogglePane).await.unwrap();
        assert!(!control.surface().pane_open());
        assert!(!control.pane_open());
    }
}

//! Browser glue for the wasm build.

use crate::export::StyleDownload;
use crate::traits::{Clipboard, FragmentStore};
use crate::{Result, StylerError};
use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

fn window() -> Result<web_sys::Window> {
    web_sys::window().ok_or_else(|| StylerError::Config("no global window".into()))
}

fn js_error(context: &str, err: JsValue) -> StylerError {
    StylerError::Config(format!("{context}: {err:?}"))
}

/// `location.hash`, rewritten through `history.replaceState` so edits do not
/// pile up in the back button history.
#[derive(Debug, Clone)]
pub struct LocationFragment {
    window: web_sys::Window,
}

impl LocationFragment {
    pub fn new() -> Result<Self> {
        Ok(Self { window: window()? })
    }
}

impl FragmentStore for LocationFragment {
    fn read(&self) -> String {
        self.window.location().hash().unwrap_or_default()
    }

    fn replace(&mut self, fragment: &str) {
        let result = self
            .window
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(fragment)));
        if let Err(err) = result {
            log::warn!("could not replace location hash: {err:?}");
        }
    }
}

/// `navigator.clipboard`. A rejected write (no permission, page not
/// focused) comes back as [`StylerError::Clipboard`].
#[derive(Debug, Clone)]
pub struct NavigatorClipboard {
    clipboard: web_sys::Clipboard,
}

impl NavigatorClipboard {
    pub fn new() -> Result<Self> {
        Ok(Self {
            clipboard: window()?.navigator().clipboard(),
        })
    }
}

#[async_trait(?Send)]
impl Clipboard for NavigatorClipboard {
    async fn write_text(&mut self, text: &str) -> Result<()> {
        JsFuture::from(self.clipboard.write_text(text))
            .await
            .map(|_| ())
            .map_err(|err| StylerError::Clipboard(format!("{err:?}")))
    }
}

/// Save a style document through a temporary `<a download>` element.
pub fn trigger_download(download: &StyleDownload) -> Result<()> {
    let document = window()?
        .document()
        .ok_or_else(|| StylerError::Config("no document".into()))?;
    let anchor = document
        .create_element("a")
        .map_err(|e| js_error("create anchor", e))?;
    anchor
        .set_attribute("href", &download.data_url())
        .map_err(|e| js_error("set href", e))?;
    anchor
        .set_attribute("download", &download.file_name)
        .map_err(|e| js_error("set download", e))?;
    anchor
        .dyn_into::<web_sys::HtmlElement>()
        .map_err(|e| js_error("anchor is not an HtmlElement", e.into()))?
        .click();
    Ok(())
}

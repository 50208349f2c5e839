//! Style export: a downloadable document and a copy-paste code snippet.

use crate::constants::{DOWNLOAD_FILE_NAME, STYLE_PACKAGE};
use crate::core::options::OptionsTree;
use crate::styles::StyleDocument;
use crate::traits::Clipboard;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Notice shown after the snippet was copied.
pub const COPIED_NOTICE: &str = "Style code copied to clipboard";

/// A pretty-printed style document ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDownload {
    pub file_name: String,
    pub contents: String,
}

impl StyleDownload {
    pub fn new(document: &StyleDocument) -> Result<Self> {
        Ok(Self {
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            contents: document.to_pretty_json()?,
        })
    }

    /// `data:` URL an anchor can point its `href` at.
    pub fn data_url(&self) -> String {
        format!(
            "data:text/json;charset=utf-8,{}",
            encode_uri_component(&self.contents)
        )
    }
}

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// The builder call for `key`, e.g. `await satellite({ ... })`.
///
/// Options are rendered as a JavaScript object literal: pretty JSON with
/// the quotes around keys dropped. `None` renders an empty argument list.
pub fn style_call(key: &str, minimal: Option<&OptionsTree>, is_async: bool) -> Result<String> {
    let arguments = match minimal {
        Some(tree) => unquote_keys(&serde_json::to_string_pretty(&tree.to_json())?),
        None => String::new(),
    };
    let prefix = if is_async { "await " } else { "" };
    Ok(format!("{prefix}{key}({arguments})"))
}

/// Full snippet importing the builder and calling it.
pub fn style_code(key: &str, minimal: Option<&OptionsTree>, is_async: bool) -> Result<String> {
    Ok(format!(
        "import {{ {key} }} from '{STYLE_PACKAGE}';\nconst style = {};",
        style_call(key, minimal, is_async)?
    ))
}

/// Put the snippet on the clipboard and return it.
pub async fn copy_style_code(
    clipboard: &mut dyn Clipboard,
    key: &str,
    minimal: Option<&OptionsTree>,
    is_async: bool,
) -> Result<String> {
    let code = style_code(key, minimal, is_async)?;
    clipboard.write_text(&code).await?;
    log::info!("copied style code for '{key}' ({} bytes)", code.len());
    Ok(code)
}

/// `  "name": ` → `  name: ` on every indented line.
fn unquote_keys(json: &str) -> String {
    json.lines()
        .map(|line| {
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];
            if indent.len() < 2 {
                return line.to_string();
            }
            let Some(rest) = body.strip_prefix('"') else {
                return line.to_string();
            };
            match rest.split_once("\": ") {
                Some((key, value)) if !key.is_empty() && !key.contains('"') => {
                    format!("{indent}{key}: {value}")
                }
                _ => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

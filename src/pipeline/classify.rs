//! Extension classifier: which conversion, if any, a file needs.
//!
//! Whiteboard rooms display documents either as page images (`static`) or as
//! animated slide decks (`dynamic`). The choice is made purely from the file
//! extension; nothing is read from disk or the network.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use url::Url;

/// Extensions converted to static page images.
pub const STATIC_EXTENSIONS: [&str; 4] = ["pdf", "ppt", "doc", "docx"];

/// Extensions converted to dynamic (animated) slides.
pub const DYNAMIC_EXTENSIONS: [&str; 1] = ["pptx"];

static CONVERTIBLE_EXTENSIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    STATIC_EXTENSIONS
        .iter()
        .chain(DYNAMIC_EXTENSIONS.iter())
        .copied()
        .collect()
});

/// How the conversion service should render a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionKind {
    /// Rendered to page images.
    Static,
    /// Rendered as an animated slide deck.
    Dynamic,
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionKind::Static => f.write_str("static"),
            ConversionKind::Dynamic => f.write_str("dynamic"),
        }
    }
}

/// Classify a path or URL by its extension.
///
/// Returns `None` when the file is not convertible.
pub fn classify(path: &str) -> Option<ConversionKind> {
    let ext = extension_of(path)?;
    if STATIC_EXTENSIONS.contains(&ext.as_str()) {
        Some(ConversionKind::Static)
    } else if DYNAMIC_EXTENSIONS.contains(&ext.as_str()) {
        Some(ConversionKind::Dynamic)
    } else {
        None
    }
}

/// `true` if the extension is in either conversion set.
pub fn is_convertible(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| CONVERTIBLE_EXTENSIONS.contains(ext.as_str()))
}

/// Lower-cased extension of the last path component.
///
/// URLs (anything with a scheme longer than one character, so `C:\` drive
/// letters stay paths) use their last path segment; query strings and
/// fragments never contribute. Inputs that parse as URLs without a path
/// are read as plain file names. Dotfiles such as `.pdf` have no extension.
pub fn extension_of(path: &str) -> Option<String> {
    let trimmed = path.trim();
    let url_segment = Url::parse(trimmed)
        .ok()
        .filter(|url| url.scheme().len() > 1)
        .and_then(|url| url.path_segments()?.next_back().map(str::to_string));
    let file_name = match url_segment {
        Some(segment) => segment,
        None => Path::new(trimmed).file_name()?.to_string_lossy().into_owned(),
    };

    Path::new(&file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty())
}

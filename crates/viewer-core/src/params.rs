//! Startup parameters read from the page's query string.
//!
//! ```
//! use folio_viewer_core::StartupParams;
//!
//! let query = "?file=books%2Fatlas.pdf&title=My+Atlas&first";
//! let params = StartupParams::from_query(query).unwrap();
//! assert_eq!(params.file, "books/atlas.pdf");
//! assert_eq!(params.title, "My Atlas");
//! assert!(params.first_page_alone);
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "PDF book";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("missing required parameter `file`")]
    MissingFile,
    #[error("invalid percent-encoding in parameter `{0}`")]
    InvalidEncoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupParams {
    /// Heading shown above the book.
    pub title: String,
    /// Document locator; also the download link target.
    pub file: String,
    /// Show the first page on its own, like a book cover.
    pub first_page_alone: bool,
}

impl StartupParams {
    pub fn from_query(query: &str) -> Result<Self, ParamsError> {
        let pairs = parse_query(query)?;
        let lookup = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let file = match lookup("file") {
            Some(file) if !file.is_empty() => file.to_owned(),
            _ => return Err(ParamsError::MissingFile),
        };

        let title = match lookup("title") {
            Some(title) if !title.is_empty() => title.to_owned(),
            _ => DEFAULT_TITLE.to_owned(),
        };

        Ok(Self {
            title,
            file,
            first_page_alone: lookup("first").is_some(),
        })
    }
}

fn parse_query(query: &str) -> Result<Vec<(String, String)>, ParamsError> {
    let query = query.strip_prefix('?').unwrap_or(query);

    query
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = decode_component(key)
                .ok_or_else(|| ParamsError::InvalidEncoding(key.to_owned()))?;
            let value = decode_component(value)
                .ok_or_else(|| ParamsError::InvalidEncoding(key.clone()))?;
            Ok::<_, ParamsError>((key, value))
        })
        .collect()
}

/// `application/x-www-form-urlencoded` decoding: `+` is a space and `%XX`
/// is a byte. Malformed escapes and invalid UTF-8 yield `None`.
fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        match bytes[index] {
            b'+' => decoded.push(b' '),
            b'%' => {
                let hex = bytes.get(index + 1..index + 3)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let hex = std::str::from_utf8(hex).ok()?;
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                index += 2;
            }
            byte => decoded.push(byte),
        }
        index += 1;
    }

    String::from_utf8(decoded).ok()
}

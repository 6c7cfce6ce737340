//! Map server descriptors and request URL construction.
//!
//! A map server is a WMS-style endpoint described by a base URL and a
//! command template with bounding-box and size placeholders:
//!
//! ```text
//! {latLL} {lonLL} {latUR} {lonUR}   degrees, formatted with six decimals
//! {szWidth} {szHight}               pixels ({szHeight} is accepted too)
//! ```

use std::fmt;

use thiserror::Error;

const LAT_LL: &str = "{latLL}";
const LON_LL: &str = "{lonLL}";
const LAT_UR: &str = "{latUR}";
const LON_UR: &str = "{lonUR}";
const WIDTH: &str = "{szWidth}";
const HEIGHT: &str = "{szHight}";
const HEIGHT_ALIAS: &str = "{szHeight}";

/// Resolved tile widths at or above this request a lossy payload.
pub const LOSSY_WIDTH_THRESHOLD: u32 = 4096;

/// Errors in a map server's command template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("map server {server}: template is missing placeholder {placeholder}")]
    MissingPlaceholder {
        server: String,
        placeholder: &'static str,
    },

    #[error("map server {server}: unresolved placeholder in {url}")]
    Unresolved { server: String, url: String },
}

/// One sub-image request: a bounding box and a pixel size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRequest {
    pub lat_ll: f64,
    pub lon_ll: f64,
    pub lat_ur: f64,
    pub lon_ur: f64,
    pub width: u32,
    pub height: u32,
    /// Resolved width of the whole tile this cell belongs to
    pub tile_width: u32,
}

/// A configured imagery endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct MapServer {
    pub id: u32,
    pub name: String,
    pub url_base: String,
    pub url_command: String,
    pub comment: String,
    pub proxy: Option<String>,
}

impl MapServer {
    /// Create a descriptor. `|` in the command stands for `&` so templates
    /// survive config formats that treat `&` specially.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        url_base: impl Into<String>,
        url_command: impl AsRef<str>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            url_base: url_base.into().trim().to_string(),
            url_command: url_command.as_ref().trim().replace('|', "&"),
            comment: String::new(),
            proxy: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Check that every placeholder is present in the command template.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for placeholder in [LAT_LL, LON_LL, LAT_UR, LON_UR, WIDTH] {
            if !self.url_command.contains(placeholder) {
                return Err(self.missing(placeholder));
            }
        }
        if !self.url_command.contains(HEIGHT) && !self.url_command.contains(HEIGHT_ALIAS) {
            return Err(self.missing(HEIGHT));
        }
        Ok(())
    }

    /// Full request URL for one cell.
    pub fn request_url(&self, cell: &CellRequest) -> Result<String, TemplateError> {
        self.validate()?;

        let mut command = self.url_command.clone();
        if cell.tile_width >= LOSSY_WIDTH_THRESHOLD {
            command = command.replace("format=png", "format=jpg");
        }
        let command = command
            .replace(LAT_LL, &format!("{:.6}", cell.lat_ll))
            .replace(LON_LL, &format!("{:.6}", cell.lon_ll))
            .replace(LAT_UR, &format!("{:.6}", cell.lat_ur))
            .replace(LON_UR, &format!("{:.6}", cell.lon_ur))
            .replace(WIDTH, &cell.width.to_string())
            .replace(HEIGHT, &cell.height.to_string())
            .replace(HEIGHT_ALIAS, &cell.height.to_string());

        let url = format!("{}{}", self.url_base, command);
        if has_placeholder(&command) {
            return Err(TemplateError::Unresolved {
                server: self.label(),
                url,
            });
        }
        Ok(url)
    }

    fn missing(&self, placeholder: &'static str) -> TemplateError {
        TemplateError::MissingPlaceholder {
            server: self.label(),
            placeholder,
        }
    }

    fn label(&self) -> String {
        format!("{} ({})", self.id, self.name)
    }
}

impl fmt::Display for MapServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3}  {}", self.id, self.name)?;
        if !self.comment.is_empty() {
            write!(f, "  ({})", self.comment)?;
        }
        Ok(())
    }
}

/// `{word}` with an identifier inside, the shape of a template placeholder.
fn has_placeholder(s: &str) -> bool {
    let mut rest = s;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close)
                if close > 0
                    && after[..close]
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                return true;
            }
            _ => rest = after,
        }
    }
    false
}

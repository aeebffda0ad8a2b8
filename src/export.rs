//! Output formats and SVG conversion.

use std::path::Path;

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
    Json,
}

impl OutputFormat {
    /// Pick the format from the output file's extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(String::new()))?
            .to_ascii_lowercase();

        match ext.as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            "json" => Ok(Self::Json),
            _ => Err(Error::UnsupportedFormat(ext)),
        }
    }
}

// usvg and svg2pdf pin different fontdb versions, so the same code has to be
// expanded against both database types.
macro_rules! configure_font_fallbacks {
    ($fontdb:expr) => {{
        let fontdb = $fontdb;
        let mut sans_family: Option<String> = None;
        let mut mono_family: Option<String> = None;
        let mut first_family: Option<String> = None;

        for face in fontdb.faces() {
            for (family, _) in &face.families {
                if first_family.is_none() {
                    first_family = Some(family.clone());
                }
                let lower = family.to_ascii_lowercase();
                if sans_family.is_none() && lower.contains("sans") {
                    sans_family = Some(family.clone());
                }
                if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                    mono_family = Some(family.clone());
                }
            }
        }

        if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
            fontdb.set_sans_serif_family(family);
            fontdb.set_serif_family(family);
        }
        if let Some(family) = mono_family
            .as_deref()
            .or(sans_family.as_deref())
            .or(first_family.as_deref())
        {
            fontdb.set_monospace_family(family);
        }
    }};
}

pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Export(format!("invalid PNG scale: {}", scale)));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();

        let local_fonts = Path::new("fonts");
        if local_fonts.is_dir() {
            fontdb.load_fonts_dir(local_fonts);
        }

        configure_font_fallbacks!(fontdb);
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("failed to parse SVG: {}", e)))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Export(format!("cannot allocate a {width}x{height} pixmap")))?;
    let transform = Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| Error::Export(format!("failed to encode PNG: {}", e)))
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();

    let local_fonts = Path::new("fonts");
    if local_fonts.is_dir() {
        fontdb.load_fonts_dir(local_fonts);
    }

    configure_font_fallbacks!(&mut fontdb);

    let opts = svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(fontdb),
        ..Default::default()
    };

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("failed to parse SVG: {}", e)))?;

    // Text as paths: viewers without the fonts still show labels
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };
    let page_options = svg2pdf::PageOptions::default();

    svg2pdf::to_pdf(&tree, options, page_options)
        .map_err(|e| Error::Export(format!("failed to convert SVG to PDF: {}", e)))
}

pub fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| Error::io(path, e))
}

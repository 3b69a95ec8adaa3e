// src/transform/images.rs

//! Per-format image optimizers.
//!
//! Every optimizer is lossless with respect to the decoded image. PNG, JPEG
//! and SVG results are only kept when strictly smaller than the input. GIFs
//! are rewritten interlaced once; an already interlaced GIF is left alone.
//! Running the optimizer over its own output is therefore a no-op.

use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageEncoder, ImageFormat};
use regex::Regex;
use tracing::debug;

use crate::config::ImagesSection;

use super::markup::collapse_between_tags;
use super::{Asset, Transform};

/// Image format, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Svg,
    Gif,
    Ico,
    Other,
}

impl ImageKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => ImageKind::Png,
            "jpg" | "jpeg" => ImageKind::Jpeg,
            "svg" => ImageKind::Svg,
            "gif" => ImageKind::Gif,
            "ico" => ImageKind::Ico,
            _ => ImageKind::Other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageOptimizer {
    settings: ImagesSection,
}

impl ImageOptimizer {
    pub fn new(settings: ImagesSection) -> Self {
        Self { settings }
    }

    /// Stable description of the settings, folded into cache keys.
    pub fn fingerprint(&self) -> String {
        let s = &self.settings;
        format!(
            "v2;png-level={};svg-viewbox={};svg-groups={};jpeg-meta={};gif-interlace=true",
            s.optimization_level, s.remove_view_box, s.collapse_groups, s.strip_jpeg_metadata
        )
    }

    /// Optimize `data`. Size-reducing results replace the input only when smaller.
    pub fn optimize(&self, rel: &Path, data: &[u8]) -> Result<Vec<u8>> {
        let kind = ImageKind::from_path(rel);
        let candidate = match kind {
            ImageKind::Png => Some(
                optimize_png(data, self.settings.optimization_level)
                    .with_context(|| format!("optimizing PNG {}", rel.display()))?,
            ),
            ImageKind::Jpeg if self.settings.strip_jpeg_metadata => strip_jpeg_metadata(data),
            ImageKind::Svg => {
                let text = std::str::from_utf8(data)
                    .with_context(|| format!("{} is not valid UTF-8", rel.display()))?;
                Some(optimize_svg(text, &self.settings).into_bytes())
            }
            // Interlacing is kept regardless of size.
            ImageKind::Gif => return Ok(interlaced_or_original(rel, data)),
            ImageKind::Jpeg | ImageKind::Ico | ImageKind::Other => None,
        };

        match candidate {
            Some(out) if out.len() < data.len() => {
                debug!(
                    file = %rel.display(),
                    before = data.len(),
                    after = out.len(),
                    "image optimized"
                );
                Ok(out)
            }
            _ => Ok(data.to_vec()),
        }
    }
}

impl Transform for ImageOptimizer {
    fn name(&self) -> &'static str {
        "image"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let contents = self.optimize(&asset.rel, &asset.contents)?;
        Ok(Asset { contents, ..asset })
    }
}

fn optimize_png(data: &[u8], level: u8) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(data, ImageFormat::Png)?;
    let compression = match level {
        0..=1 => CompressionType::Fast,
        2..=4 => CompressionType::Default,
        _ => CompressionType::Best,
    };

    let mut out = Cursor::new(Vec::new());
    PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive).write_image(
        img.as_bytes(),
        img.width(),
        img.height(),
        img.color(),
    )?;
    Ok(out.into_inner())
}

fn interlaced_or_original(rel: &Path, data: &[u8]) -> Vec<u8> {
    match interlace_gif(data) {
        Ok(Some(out)) => {
            debug!(file = %rel.display(), before = data.len(), after = out.len(), "gif interlaced");
            out
        }
        Ok(None) => data.to_vec(),
        Err(err) => {
            debug!(file = %rel.display(), error = %err, "gif not decodable; copied as is");
            data.to_vec()
        }
    }
}

/// Re-encode every frame of a GIF interlaced.
///
/// Palettes, disposal, delays and the loop count are carried over. Returns
/// `None` when every frame is already interlaced.
fn interlace_gif(data: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(data)?;
    let (width, height) = (decoder.width(), decoder.height());
    let palette = decoder.global_palette().map(<[u8]>::to_vec).unwrap_or_default();

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        frames.push(frame.clone());
    }
    if frames.iter().all(|f| f.interlaced) {
        return Ok(None);
    }

    let mut out = Vec::with_capacity(data.len());
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, &palette)?;
        encoder.set_repeat(decoder.repeat())?;
        for mut frame in frames {
            if !frame.interlaced {
                // The encoder writes rows in the order given.
                let rows = interlace_rows(&frame.buffer, usize::from(frame.width), usize::from(frame.height));
                frame.buffer = rows.into();
                frame.interlaced = true;
            }
            encoder.write_frame(&frame)?;
        }
    }
    Ok(Some(out))
}

/// Reorder top-to-bottom rows into the four GIF interlace passes.
fn interlace_rows(buffer: &[u8], width: usize, height: usize) -> Vec<u8> {
    if width == 0 {
        return buffer.to_vec();
    }
    let rows: Vec<&[u8]> = buffer.chunks(width).take(height).collect();
    let mut out = Vec::with_capacity(buffer.len());
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for row in rows.iter().skip(start).step_by(step) {
            out.extend_from_slice(row);
        }
    }
    out
}

/// Remove metadata segments from a baseline or progressive JPEG.
///
/// Kept: JFIF (`APP0`), ICC profile (`APP2`), Adobe (`APP14`) and every
/// non-`APPn` segment. Dropped: EXIF/XMP (`APP1`), `APP3`-`APP13`, `APP15`
/// and comments. Scan data after `SOS` is copied verbatim. Returns `None`
/// for anything that does not parse as a JPEG segment stream.
pub fn strip_jpeg_metadata(data: &[u8]) -> Option<Vec<u8>> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&data[..2]);
    let mut i = 2;

    loop {
        if i + 2 > data.len() || data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];

        match marker {
            // Fill byte before a marker.
            0xFF => {
                i += 1;
                continue;
            }
            // Start of scan / end of image: the rest is entropy-coded data.
            0xDA | 0xD9 => {
                out.extend_from_slice(&data[i..]);
                return Some(out);
            }
            // Standalone markers without a length.
            0x01 | 0xD0..=0xD7 => {
                out.extend_from_slice(&data[i..i + 2]);
                i += 2;
                continue;
            }
            _ => {}
        }

        if i + 4 > data.len() {
            return None;
        }
        let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if len < 2 || i + 2 + len > data.len() {
            return None;
        }

        let drop = matches!(marker, 0xE1 | 0xE3..=0xED | 0xEF | 0xFE);
        if !drop {
            out.extend_from_slice(&data[i..i + 2 + len]);
        }
        i += 2 + len;
    }
}

static SVG_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static SVG_METADATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<metadata\b[^>]*/>|<metadata\b.*?</metadata\s*>").expect("static regex")
});
static SVG_DOCTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<!DOCTYPE[^>\[]*(\[[^\]]*\])?\s*>").expect("static regex"));
static SVG_G_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)g((?:\s[^>]*?)?)(/?)>").expect("static regex"));
static SVG_ROOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<svg\b[^>]*>").expect("static regex"));

pub fn optimize_svg(svg: &str, settings: &ImagesSection) -> String {
    let s = SVG_COMMENT.replace_all(svg, "");
    let s = SVG_METADATA.replace_all(&s, "");
    let s = SVG_DOCTYPE.replace_all(&s, "");
    // Whitespace only renders between text runs.
    let is_run = |tag: &str| matches!(tag, "tspan" | "textPath");
    let s = collapse_between_tags(&s, |before, after| is_run(before) || is_run(after));
    let mut s = s.trim().to_string();

    if settings.collapse_groups {
        s = collapse_empty_groups(&s);
    }
    if settings.remove_view_box {
        s = remove_redundant_view_box(&s);
    }
    s
}

/// Unwrap `<g>` elements without attributes and drop empty `<g/>`.
///
/// Leaves the document untouched if the `<g>` tags are unbalanced.
fn collapse_empty_groups(svg: &str) -> String {
    let mut stack: Vec<(usize, usize, bool)> = Vec::new();
    let mut removed: Vec<(usize, usize)> = Vec::new();

    for caps in SVG_G_TAG.captures_iter(svg) {
        let Some(whole) = caps.get(0) else { continue };
        let closing = !caps[1].is_empty();
        let bare = caps[2].trim().is_empty();
        let self_closing = !caps[3].is_empty();

        if self_closing {
            if bare {
                removed.push((whole.start(), whole.end()));
            }
        } else if closing {
            let Some((start, end, bare_open)) = stack.pop() else {
                return svg.to_string();
            };
            if bare_open {
                removed.push((start, end));
                removed.push((whole.start(), whole.end()));
            }
        } else {
            stack.push((whole.start(), whole.end(), bare));
        }
    }

    if !stack.is_empty() || removed.is_empty() {
        return svg.to_string();
    }

    removed.sort_unstable();
    let mut out = String::with_capacity(svg.len());
    let mut last = 0;
    for (start, end) in removed {
        out.push_str(&svg[last..start]);
        last = end;
    }
    out.push_str(&svg[last..]);
    out
}

/// Remove `viewBox="0 0 W H"` from the root element when it carries
/// matching `width="W"` and `height="H"`.
fn remove_redundant_view_box(svg: &str) -> String {
    let Some(root) = SVG_ROOT.find(svg) else {
        return svg.to_string();
    };
    let tag = root.as_str();

    let attr = |name: &str| -> Option<String> {
        let re = Regex::new(&format!(r#"\s{name}="([^"]*)""#)).ok()?;
        re.captures(tag).map(|c| c[1].trim().to_string())
    };

    let (Some(width), Some(height), Some(view_box)) = (attr("width"), attr("height"), attr("viewBox"))
    else {
        return svg.to_string();
    };

    let parts: Vec<&str> = view_box.split([' ', ',']).filter(|p| !p.is_empty()).collect();
    if parts.len() != 4 || parts[0] != "0" || parts[1] != "0" || parts[2] != width || parts[3] != height {
        return svg.to_string();
    }

    let new_tag = tag.replacen(&format!(r#" viewBox="{view_box}""#), "", 1);
    format!("{}{}{}", &svg[..root.start()], new_tag, &svg[root.end()..])
}

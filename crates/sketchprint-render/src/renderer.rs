//! Render pipeline: configuration, errors and the document-to-PDF entry points.

use crate::pdf_impl::{PdfPage, PdfRenderer};
use crate::resource::ImageResolver;
use serde::{Deserialize, Serialize};
use sketchprint_core::optimize;
use sketchprint_core::shapes::SerializableColor;
use sketchprint_core::{
    Document, DocumentError, DocumentSnapshot, DrawContext, ShapeRegistry, SnapshotIssue,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Renderer errors.
///
/// Any of these aborts the whole output; per-element problems are reported in
/// [`RenderReport`] instead.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Invalid render configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Output settings, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Document title written to the PDF info dictionary.
    pub title: Option<String>,
    pub author: Option<String>,
    /// Page background painted under all shapes.
    pub background: SerializableColor,
    /// Flate-compress page content streams.
    pub compress: bool,
    /// Clamp the page and pull shapes onto it before drawing.
    pub optimize_for_print: bool,
    /// Base directory for relative image paths.
    pub image_root: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            background: SerializableColor::white(),
            compress: true,
            optimize_for_print: false,
            image_root: None,
        }
    }
}

impl RenderConfig {
    pub fn from_json(json: &str) -> RenderResult<Self> {
        serde_json::from_str(json).map_err(|e| RenderError::Config(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> RenderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

/// An element left out of the output, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedElement {
    pub index: usize,
    pub reason: String,
}

/// What a render produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub pages: usize,
    pub elements_drawn: usize,
    pub skipped: Vec<SkippedElement>,
    pub images_embedded: usize,
    pub image_placeholders: usize,
    pub bytes_written: u64,
}

/// Ask every shape of `document` to draw itself onto `ctx`, in index order.
///
/// A shape that fails is logged and returned in the skip list; the walk
/// continues with the next one. Returns the number of shapes drawn.
pub fn render_to_context(
    document: &Document,
    ctx: &mut dyn DrawContext,
) -> (usize, Vec<SkippedElement>) {
    let mut drawn = 0;
    let mut skipped = Vec::new();
    for (index, shape) in document.shapes().iter().enumerate() {
        match shape.draw(ctx) {
            Ok(()) => drawn += 1,
            Err(err) => {
                log::warn!("Skipping element {} ({}): {}", index, shape.type_name(), err);
                skipped.push(SkippedElement {
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }
    (drawn, skipped)
}

/// Render `document` as a single-page PDF into `sink`.
///
/// The sink is written incrementally; a write failure aborts the render.
pub fn render_document_to<W: Write>(
    document: &Document,
    sink: W,
    config: &RenderConfig,
) -> RenderResult<RenderReport> {
    let optimized;
    let document = if config.optimize_for_print {
        optimized = optimize::optimize_document_for_pdf(document);
        &optimized
    } else {
        document
    };

    let mut resolver = ImageResolver::new(config.image_root.clone());
    let mut renderer = PdfRenderer::new(sink, config)?;

    let mut page = PdfPage::new(document.width(), document.height(), config, &mut resolver);
    let (elements_drawn, skipped) = render_to_context(document, &mut page);
    let content = page.finish();
    let mut report = RenderReport {
        elements_drawn,
        skipped,
        images_embedded: content.image_count(),
        image_placeholders: content.image_failures(),
        ..RenderReport::default()
    };
    renderer.add_page(content)?;

    let (_, bytes_written) = renderer.finish()?;
    report.pages = 1;
    report.bytes_written = bytes_written;
    log::info!(
        "Rendered {} of {} elements ({} bytes)",
        report.elements_drawn,
        document.len(),
        bytes_written
    );
    Ok(report)
}

/// Rebuild a document from `snapshot` and walk it onto `ctx`.
///
/// Records that cannot be rebuilt are skipped alongside shapes that fail to
/// draw; all skip indices refer to snapshot positions.
pub fn render_snapshot_to_context(
    snapshot: &DocumentSnapshot,
    registry: &ShapeRegistry,
    ctx: &mut dyn DrawContext,
) -> RenderResult<(usize, Vec<SkippedElement>)> {
    let (document, issues) = Document::from_snapshot(snapshot, registry)?;
    let (drawn, mut skipped) = render_to_context(&document, ctx);
    remap_skipped(snapshot, issues, &mut skipped);
    Ok((drawn, skipped))
}

/// Rebuild a document from `snapshot` and render it as PDF.
pub fn render_snapshot_to<W: Write>(
    snapshot: &DocumentSnapshot,
    sink: W,
    config: &RenderConfig,
) -> RenderResult<RenderReport> {
    let registry = ShapeRegistry::new();
    let (document, issues) = Document::from_snapshot(snapshot, &registry)?;
    let mut report = render_document_to(&document, sink, config)?;
    remap_skipped(snapshot, issues, &mut report.skipped);
    Ok(report)
}

/// Skip indices from the rebuilt document are shifted back to snapshot
/// positions, then the rebuild issues are merged in.
fn remap_skipped(
    snapshot: &DocumentSnapshot,
    issues: Vec<SnapshotIssue>,
    skipped: &mut Vec<SkippedElement>,
) {
    let kept: Vec<usize> = (0..snapshot.elements.len())
        .filter(|i| !issues.iter().any(|issue| issue.index == *i))
        .collect();
    for entry in skipped.iter_mut() {
        if let Some(original) = kept.get(entry.index) {
            entry.index = *original;
        }
    }
    skipped.extend(issues.into_iter().map(|issue| SkippedElement {
        index: issue.index,
        reason: issue.message,
    }));
    skipped.sort_by_key(|s| s.index);
}

/// Render into a fresh byte buffer.
pub fn render_document_to_vec(
    document: &Document,
    config: &RenderConfig,
) -> RenderResult<(Vec<u8>, RenderReport)> {
    let mut out = Vec::new();
    let report = render_document_to(document, &mut out, config)?;
    Ok((out, report))
}

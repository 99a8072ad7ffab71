//! Print-layout helpers: clamp shapes onto the page, estimate output size and
//! suggest fixes for text that would be clipped.

use crate::document::Document;
use crate::props::NAMED_COLORS;
use crate::shapes::{SerializableColor, Shape, ShapeStyle, Text};
use kurbo::{Point, Rect};
use serde::Serialize;

/// Smallest and largest canvas edge accepted for print output.
pub const MIN_PRINT_EDGE: f64 = 100.0;
pub const MAX_PRINT_EDGE: f64 = 2000.0;

const MIN_FONT_SIZE: f64 = 8.0;
const LARGE_CANVAS_EDGE: f64 = 1200.0;
const MANY_ELEMENTS: usize = 50;

/// Parse a six-digit hex color into RGB, falling back to black.
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return (0, 0, 0);
    }
    match SerializableColor::from_hex(&format!("#{digits}")) {
        Some(c) => (c.r, c.g, c.b),
        None => (0, 0, 0),
    }
}

/// Accept `#rgb`/`#rrggbb` or a named color; anything else yields `fallback`.
pub fn validate_color(color: Option<&str>, fallback: &str) -> String {
    let Some(color) = color.filter(|c| !c.is_empty()) else {
        return fallback.to_string();
    };
    if let Some(digits) = color.strip_prefix('#') {
        if matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return color.to_string();
        }
    }
    let lower = color.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map_or_else(|| fallback.to_string(), |(_, hex)| (*hex).to_string())
}

/// Font size bounded by `[8, min(width, height) / 10]`.
pub fn optimize_font_size(font_size: f64, width: f64, height: f64) -> f64 {
    let max = width.min(height) / 10.0;
    font_size.min(max).max(MIN_FONT_SIZE)
}

/// Stroke width bounded by `[0, min(width, height) / 100]`.
pub fn optimize_stroke_width(stroke_width: f64, width: f64, height: f64) -> f64 {
    let max = width.min(height) / 100.0;
    stroke_width.min(max).max(0.0)
}

/// Pull a shape onto a `width` x `height` page.
///
/// The anchor is clamped onto the page (the whole shape moves with it), boxes
/// are shrunk to fit from their corner, circles to fit around their center,
/// text font size and every stroke width are bounded.
pub fn optimize_element_dimensions(shape: &mut Shape, width: f64, height: f64) {
    let anchor = shape.anchor();
    let target = Point::new(anchor.x.clamp(0.0, width), anchor.y.clamp(0.0, height));
    shape.translate(target - anchor);

    match shape {
        Shape::Rectangle(r) => {
            r.width = fit_extent(r.width, width - r.position.x);
            r.height = fit_extent(r.height, height - r.position.y);
        }
        Shape::Image(img) => {
            img.width = fit_extent(img.width, width - img.position.x);
            img.height = fit_extent(img.height, height - img.position.y);
        }
        Shape::Circle(c) => {
            let Point { x, y } = c.center;
            let max_radius = x.min(y).min(width - x).min(height - y);
            c.radius = c.radius.min(max_radius).max(1.0);
        }
        Shape::Text(t) => {
            t.font_size = optimize_font_size(t.font_size, width, height);
        }
        _ => {}
    }

    let style: &mut ShapeStyle = shape.style_mut();
    style.stroke_width = optimize_stroke_width(style.stroke_width, width, height);
}

fn fit_extent(extent: f64, available: f64) -> f64 {
    extent.min(available).max(1.0)
}

/// Keep a text element readable on the page.
///
/// The baseline is clamped to `[font_size, height]` using the incoming size,
/// then the size is bounded and over-long content is cut with an ellipsis.
pub fn optimize_text_element(text: &mut Text, width: f64, height: f64) {
    text.position.x = text.position.x.min(width - 10.0).max(0.0);
    text.position.y = text.position.y.min(height).max(text.font_size);
    text.font_size = optimize_font_size(text.font_size, width, height);

    let advance = text.font_size * Text::CHAR_WIDTH_FACTOR;
    if text.position.x + text.estimated_width() > width {
        let max_chars = ((width - text.position.x) / advance).floor().max(0.0) as usize;
        let len = text.content.chars().count();
        if max_chars < len {
            let keep = max_chars.saturating_sub(3).max(1);
            let mut cut: String = text.content.chars().take(keep).collect();
            cut.push_str("...");
            text.content = cut;
        }
    }
}

/// A copy of `document` with the canvas clamped to `[100, 2000]` on each edge
/// and every shape pulled onto it.
pub fn optimize_document_for_pdf(document: &Document) -> Document {
    let width = document.width().clamp(MIN_PRINT_EDGE, MAX_PRINT_EDGE);
    let height = document.height().clamp(MIN_PRINT_EDGE, MAX_PRINT_EDGE);
    let mut optimized = document.clone();
    if optimized.initialize(width, height, true).is_err() {
        log::warn!("Could not resize document to {}x{}", width, height);
        return optimized;
    }
    for shape in optimized.shapes_mut() {
        optimize_element_dimensions(shape, width, height);
    }
    optimized
}

/// Rough output size in bytes.
pub fn estimate_pdf_size(document: &Document) -> u64 {
    let base = 1024.0;
    let area = document.width() * document.height() * 0.1;
    let per_element = document.len() as f64 * 100.0;
    (base + area + per_element).round() as u64
}

/// Two shapes whose bounds intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlapPair {
    pub element1: usize,
    pub element2: usize,
}

/// Every index pair (`i < j`) whose bounds touch or intersect.
pub fn detect_overlapping_elements(document: &Document) -> Vec<OverlapPair> {
    let bounds: Vec<Rect> = document.shapes().iter().map(Shape::bounds).collect();
    let mut pairs = Vec::new();
    for (i, a) in bounds.iter().enumerate() {
        for (j, b) in bounds.iter().enumerate().skip(i + 1) {
            if rects_touch(*a, *b) {
                pairs.push(OverlapPair {
                    element1: i,
                    element2: j,
                });
            }
        }
    }
    pairs
}

fn rects_touch(a: Rect, b: Rect) -> bool {
    !(a.x1 < b.x0 || b.x1 < a.x0 || a.y1 < b.y0 || b.y1 < a.y0)
}

/// Human-readable suggestions for the document as a whole.
pub fn optimization_recommendations(document: &Document) -> Vec<&'static str> {
    let mut out = Vec::new();
    if document.width() > LARGE_CANVAS_EDGE || document.height() > LARGE_CANVAS_EDGE {
        out.push("Consider reducing canvas dimensions for smaller file size");
    }
    if document.len() > MANY_ELEMENTS {
        out.push("Large number of elements may increase processing time");
    }
    if !detect_overlapping_elements(document).is_empty() {
        out.push("Some elements may be overlapping and hidden");
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Position,
    Color,
}

/// A suggested fix for a text element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRecommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_color: Option<&'static str>,
}

impl TextRecommendation {
    fn position(message: &'static str) -> Self {
        Self {
            kind: RecommendationKind::Position,
            message,
            suggested_x: None,
            suggested_y: None,
            suggested_color: None,
        }
    }
}

/// Check a text element against the page edges and the white background.
pub fn text_position_recommendations(
    text: &Text,
    width: f64,
    height: f64,
) -> Vec<TextRecommendation> {
    let mut out = Vec::new();
    let text_width = text.estimated_width();
    let text_height = text.font_size;

    if text.position.x + text_width > width {
        out.push(TextRecommendation {
            suggested_x: Some((width - text_width - 10.0).max(0.0)),
            ..TextRecommendation::position("Text may extend beyond canvas width")
        });
    }
    if text.position.y < text_height {
        out.push(TextRecommendation {
            suggested_y: Some(text_height + 5.0),
            ..TextRecommendation::position("Text may be cut off at the top")
        });
    }
    if text.position.y > height - 5.0 {
        out.push(TextRecommendation {
            suggested_y: Some(height - 10.0),
            ..TextRecommendation::position("Text may be cut off at the bottom")
        });
    }

    let fill = text.style.fill_color;
    if (fill.r, fill.g, fill.b) == (255, 255, 255) {
        out.push(TextRecommendation {
            kind: RecommendationKind::Color,
            message: "White text may not be visible on white background",
            suggested_x: None,
            suggested_y: None,
            suggested_color: Some("#000000"),
        });
    }
    out
}

/// A ready-made text element with a short description.
#[derive(Debug, Clone, PartialEq)]
pub struct TextExample {
    pub text: Text,
    pub description: &'static str,
}

/// Four sample text elements spread over the page, already optimized for it.
pub fn text_examples(width: f64, height: f64) -> Vec<TextExample> {
    let samples = [
        (50.0, 50.0, "Hello World", 24.0, "#000000", "Top-left black text"),
        (
            width / 2.0 - 60.0,
            height / 2.0,
            "Center Text",
            32.0,
            "#FF0000",
            "Centered red text",
        ),
        (
            width - 150.0,
            height - 30.0,
            "Bottom Right",
            18.0,
            "#0000FF",
            "Bottom-right blue text",
        ),
        (100.0, 150.0, "Colorful Text", 28.0, "#FF6600", "Orange text"),
    ];

    samples
        .into_iter()
        .map(|(x, y, content, font_size, color, description)| {
            let mut text = Text::new(Point::new(x, y), content);
            text.font_size = font_size;
            text.style.fill_color =
                SerializableColor::from_hex(color).unwrap_or_else(SerializableColor::black);
            optimize_text_element(&mut text, width, height);
            TextExample { text, description }
        })
        .collect()
}

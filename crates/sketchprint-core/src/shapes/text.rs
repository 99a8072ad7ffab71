//! Text shape.

use super::{ShapeStyle, ShapeTrait, contains_inclusive, ensure_min_extent};
use crate::context::DrawContext;
use crate::error::DocumentError;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// A single line of text drawn in the fill color.
///
/// Layout is not shaped: width is estimated from the character count.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Start of the baseline.
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub font_family: String,
    pub style: ShapeStyle,
}

impl Text {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;
    pub const MIN_FONT_SIZE: f64 = 8.0;
    pub const MAX_FONT_SIZE: f64 = 100.0;
    pub const DEFAULT_FONT_FAMILY: &'static str = "Helvetica";
    /// Average glyph advance as a fraction of the font size.
    pub const CHAR_WIDTH_FACTOR: f64 = 0.6;

    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: Self::DEFAULT_FONT_FAMILY.to_string(),
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Result<Self, DocumentError> {
        let content = props::string(bag, "text")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DocumentError::validation("Text content is required"))?;
        Ok(Self {
            position: Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0)),
            content,
            font_size: props::clamped_or(
                bag,
                "fontSize",
                Self::DEFAULT_FONT_SIZE,
                Self::MIN_FONT_SIZE,
                Self::MAX_FONT_SIZE,
            ),
            font_family: props::string_or(bag, "fontFamily", Self::DEFAULT_FONT_FAMILY),
            style: ShapeStyle::from_bag(bag),
        })
    }

    /// Estimated advance width of `content` at `font_size`.
    pub fn estimate_width(content: &str, font_size: f64) -> f64 {
        content.chars().count() as f64 * font_size * Self::CHAR_WIDTH_FACTOR
    }

    pub fn estimated_width(&self) -> f64 {
        Self::estimate_width(&self.content, self.font_size)
    }

    fn text_box(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y - self.font_size,
            self.position.x + self.estimated_width(),
            self.position.y,
        )
    }
}

impl ShapeTrait for Text {
    const TYPE_NAME: &'static str = "text";

    fn anchor(&self) -> Point {
        self.position
    }

    fn bounds(&self) -> Rect {
        ensure_min_extent(self.text_box())
    }

    fn contains_point(&self, point: Point) -> bool {
        contains_inclusive(self.text_box(), point)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    fn draw_body(&self, ctx: &mut dyn DrawContext) {
        ctx.set_fill_color(self.style.fill());
        ctx.fill_text(
            &self.content,
            self.position.x,
            self.position.y,
            &self.font_family,
            self.font_size,
        );
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("text".into(), Value::from(self.content.clone()));
        record.insert("fontSize".into(), Value::from(self.font_size));
        record.insert("fontFamily".into(), Value::from(self.font_family.clone()));
    }
}

//! Image shape referencing an external raster.

use super::{SerializableColor, ShapeStyle, ShapeTrait, contains_inclusive, ensure_min_extent};
use crate::context::DrawContext;
use crate::error::DocumentError;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// An image placed into a box.
///
/// `source` is a file path, an `http(s)://` URL or a `data:` URL; the drawing
/// context decides which of these it can resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    /// Top-left corner position.
    pub position: Point,
    /// Display width.
    pub width: f64,
    /// Display height.
    pub height: f64,
    pub source: String,
    pub style: ShapeStyle,
}

impl Image {
    pub const DEFAULT_SIZE: f64 = 100.0;

    pub fn new(position: Point, width: f64, height: f64, source: impl Into<String>) -> Self {
        Self {
            position,
            width,
            height,
            source: source.into(),
            style: ShapeStyle::default(),
        }
    }

    /// Reads `imagePath`, falling back to `imageUrl`.
    pub fn from_bag(bag: &PropertyBag) -> Result<Self, DocumentError> {
        let source = ["imagePath", "imageUrl"]
            .iter()
            .filter_map(|key| props::string(bag, key))
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
            .ok_or_else(|| DocumentError::validation("Image file or URL is required"))?;
        Ok(Self {
            position: Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0)),
            width: props::positive_or(bag, "width", Self::DEFAULT_SIZE),
            height: props::positive_or(bag, "height", Self::DEFAULT_SIZE),
            source,
            style: ShapeStyle::from_bag(bag),
        })
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// Grey box with a darker border and an "IMAGE" label.
    fn draw_placeholder(&self, ctx: &mut dyn DrawContext) {
        let Point { x, y } = self.position;
        ctx.set_fill_color(SerializableColor::rgb(220, 220, 220).into());
        ctx.fill_rect(x, y, self.width, self.height);
        ctx.set_stroke_color(SerializableColor::rgb(150, 150, 150).into());
        ctx.set_line_width(1.0);
        ctx.stroke_rect(x, y, self.width, self.height);

        let label = "IMAGE";
        let size = 12.0;
        let label_width = super::Text::estimate_width(label, size);
        ctx.set_fill_color(SerializableColor::rgb(100, 100, 100).into());
        ctx.fill_text(
            label,
            x + (self.width - label_width) / 2.0,
            y + (self.height + size) / 2.0 - 2.0,
            "Helvetica",
            size,
        );
    }
}

impl ShapeTrait for Image {
    const TYPE_NAME: &'static str = "image";

    fn anchor(&self) -> Point {
        self.position
    }

    fn bounds(&self) -> Rect {
        ensure_min_extent(self.as_rect())
    }

    fn contains_point(&self, point: Point) -> bool {
        contains_inclusive(self.as_rect(), point)
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
        let Point { x, y } = self.position;
        if let Err(err) = ctx.draw_image(&self.source, x, y, self.width, self.height) {
            log::warn!("Drawing placeholder for image {}: {}", self.source, err);
            self.draw_placeholder(ctx);
        }
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("width".into(), Value::from(self.width));
        record.insert("height".into(), Value::from(self.height));
        record.insert("imagePath".into(), Value::from(self.source.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::testing::{Call, RecordingContext};
    use serde_json::json;

    #[test]
    fn test_requires_source() {
        let err = Image::from_bag(&PropertyBag::new()).unwrap_err();
        assert_eq!(err.to_string(), "Image file or URL is required");
        let bag = json!({ "imageUrl": "https://example.com/a.png" });
        let image = Image::from_bag(bag.as_object().unwrap()).unwrap();
        assert_eq!(image.source, "https://example.com/a.png");
    }

    #[test]
    fn test_draws_image_when_available() {
        let image = Image::new(Point::new(0.0, 0.0), 40.0, 30.0, "a.png");
        let mut ctx = RecordingContext::default();
        image.draw_body(&mut ctx);
        assert_eq!(ctx.calls, vec![Call::Image("a.png".into())]);
    }

    #[test]
    fn test_placeholder_when_unavailable() {
        let image = Image::new(Point::new(10.0, 10.0), 100.0, 50.0, "missing.png");
        let mut ctx = RecordingContext {
            images_unavailable: true,
            ..Default::default()
        };
        image.draw_body(&mut ctx);
        assert!(ctx.calls.contains(&Call::FillRect(10.0, 10.0, 100.0, 50.0)));
        assert!(ctx.calls.contains(&Call::StrokeRect(10.0, 10.0, 100.0, 50.0)));
        assert!(ctx.calls.contains(&Call::FillColor(SerializableColor::rgb(220, 220, 220))));
        assert_eq!(ctx.count(|c| matches!(c, Call::Text(t, _, _) if t == "IMAGE")), 1);
    }
}

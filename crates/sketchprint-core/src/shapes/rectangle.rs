//! Rectangle shape.

use super::{ShapeStyle, ShapeTrait, contains_inclusive, ensure_min_extent};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// A rectangle shape with optional rounded corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    /// Top-left corner position.
    pub position: Point,
    pub width: f64,
    pub height: f64,
    /// Corner radius (0 = sharp corners).
    pub corner_radius: f64,
    pub style: ShapeStyle,
}

impl Rectangle {
    pub const DEFAULT_SIZE: f64 = 100.0;

    /// Create a new rectangle.
    pub fn new(position: Point, width: f64, height: f64) -> Self {
        Self {
            position,
            width,
            height,
            corner_radius: 0.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Self {
        Self {
            position: Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0)),
            width: props::positive_or(bag, "width", Self::DEFAULT_SIZE),
            height: props::positive_or(bag, "height", Self::DEFAULT_SIZE),
            corner_radius: props::non_negative_or(bag, "cornerRadius", 0.0),
            style: ShapeStyle::from_bag(bag),
        }
    }

    /// Get the rectangle as a kurbo Rect.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }

    /// Corner radius limited to half the shorter side.
    pub fn effective_radius(&self) -> f64 {
        self.corner_radius
            .min(self.width / 2.0)
            .min(self.height / 2.0)
            .max(0.0)
    }

    fn rounded_path(&self, ctx: &mut dyn DrawContext, r: f64) {
        let Point { x, y } = self.position;
        let (w, h) = (self.width, self.height);
        ctx.begin_path();
        ctx.move_to(x + r, y);
        ctx.line_to(x + w - r, y);
        ctx.quadratic_curve_to(x + w, y, x + w, y + r);
        ctx.line_to(x + w, y + h - r);
        ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
        ctx.line_to(x + r, y + h);
        ctx.quadratic_curve_to(x, y + h, x, y + h - r);
        ctx.line_to(x, y + r);
        ctx.quadratic_curve_to(x, y, x + r, y);
        ctx.close_path();
    }
}

impl ShapeTrait for Rectangle {
    const TYPE_NAME: &'static str = "rectangle";

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
        let radius = self.effective_radius();
        if radius > 0.0 {
            self.rounded_path(ctx, radius);
            self.style.fill_and_stroke(ctx);
            return;
        }
        let Point { x, y } = self.position;
        ctx.set_fill_color(self.style.fill());
        ctx.fill_rect(x, y, self.width, self.height);
        if self.style.has_stroke() {
            ctx.set_stroke_color(self.style.stroke());
            ctx.set_line_width(self.style.stroke_width);
            ctx.stroke_rect(x, y, self.width, self.height);
        }
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("width".into(), Value::from(self.width));
        record.insert("height".into(), Value::from(self.height));
        record.insert("cornerRadius".into(), Value::from(self.corner_radius));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::testing::{Call, RecordingContext};
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let rect = Rectangle::from_bag(&PropertyBag::new());
        assert!((rect.width - 100.0).abs() < f64::EPSILON);
        assert!((rect.height - 100.0).abs() < f64::EPSILON);
        assert!(rect.corner_radius.abs() < f64::EPSILON);
        assert!((rect.style.stroke_width - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_contains_point() {
        let rect = Rectangle::new(Point::new(50.0, 50.0), 100.0, 100.0);
        assert!(rect.contains_point(Point::new(75.0, 75.0)));
        assert!(rect.contains_point(Point::new(50.0, 50.0)));
        assert!(rect.contains_point(Point::new(150.0, 150.0)));
        assert!(!rect.contains_point(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_bounds() {
        let rect = Rectangle::new(Point::new(10.0, 20.0), 100.0, 50.0);
        let bounds = rect.bounds();
        assert!((bounds.x0 - 10.0).abs() < f64::EPSILON);
        assert!((bounds.y0 - 20.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 110.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_radius_is_clamped() {
        let bag = json!({ "width": 40, "height": 10, "cornerRadius": 30 });
        let rect = Rectangle::from_bag(bag.as_object().unwrap());
        assert!((rect.corner_radius - 30.0).abs() < f64::EPSILON);
        assert!((rect.effective_radius() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plain_draw_uses_rect_calls() {
        let rect = Rectangle::new(Point::new(0.0, 0.0), 10.0, 20.0);
        let mut ctx = RecordingContext::default();
        rect.draw_body(&mut ctx);
        assert!(ctx.calls.contains(&Call::FillRect(0.0, 0.0, 10.0, 20.0)));
        assert!(ctx.calls.contains(&Call::StrokeRect(0.0, 0.0, 10.0, 20.0)));
    }

    #[test]
    fn test_zero_stroke_skips_outline() {
        let mut rect = Rectangle::new(Point::new(0.0, 0.0), 10.0, 20.0);
        rect.style.stroke_width = 0.0;
        rect.corner_radius = 2.0;
        let mut ctx = RecordingContext::default();
        rect.draw_body(&mut ctx);
        assert_eq!(ctx.count(|c| matches!(c, Call::Stroke | Call::StrokeRect(..))), 0);
        assert_eq!(ctx.count(|c| matches!(c, Call::Quad(..))), 4);
        assert_eq!(ctx.count(|c| matches!(c, Call::Fill)), 1);
    }
}

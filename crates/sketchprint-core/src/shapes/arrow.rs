//! Arrow shape.

use super::{ShapeStyle, ShapeTrait, contains_inclusive, ensure_min_extent};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// A block arrow: a rectangular shaft with a triangular head at `end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    /// Tail point.
    pub start: Point,
    /// Tip point (where the arrowhead points).
    pub end: Point,
    pub head_length: f64,
    pub head_width: f64,
    pub body_width: f64,
    pub style: ShapeStyle,
}

impl Arrow {
    /// Create a new arrow.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            head_length: 20.0,
            head_width: 10.0,
            body_width: 4.0,
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Self {
        let start = Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0));
        Self {
            start,
            end: Point::new(
                props::number_or(bag, "x2", start.x + 100.0),
                props::number_or(bag, "y2", start.y),
            ),
            head_length: props::positive_or(bag, "headLength", 20.0),
            head_width: props::positive_or(bag, "headWidth", 10.0),
            body_width: props::positive_or(bag, "bodyWidth", 4.0),
            style: ShapeStyle::from_bag(bag),
        }
    }

    /// Tail-to-tip distance.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Direction of the arrow in radians.
    pub fn angle(&self) -> f64 {
        (self.end.y - self.start.y).atan2(self.end.x - self.start.x)
    }
}

impl ShapeTrait for Arrow {
    const TYPE_NAME: &'static str = "arrow";

    fn anchor(&self) -> Point {
        self.start
    }

    fn bounds(&self) -> Rect {
        let pad = self.head_width.max(self.body_width) / 2.0;
        ensure_min_extent(Rect::from_points(self.start, self.end).inflate(pad, pad))
    }

    /// Bounding-box approximation.
    fn contains_point(&self, point: Point) -> bool {
        contains_inclusive(self.bounds(), point)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }

    fn draw_body(&self, ctx: &mut dyn DrawContext) {
        let length = self.length();
        let shaft = (length - self.head_length).max(0.0);
        let head_start = length - self.head_length;

        ctx.save();
        ctx.translate(self.start.x, self.start.y);
        ctx.rotate(self.angle());

        ctx.begin_path();
        ctx.rect(0.0, -self.body_width / 2.0, shaft, self.body_width);
        self.style.fill_and_stroke(ctx);

        ctx.begin_path();
        ctx.move_to(head_start, -self.head_width / 2.0);
        ctx.line_to(length, 0.0);
        ctx.line_to(head_start, self.head_width / 2.0);
        ctx.close_path();
        self.style.fill_and_stroke(ctx);

        ctx.restore();
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("x2".into(), Value::from(self.end.x));
        record.insert("y2".into(), Value::from(self.end.y));
        record.insert("headLength".into(), Value::from(self.head_length));
        record.insert("headWidth".into(), Value::from(self.head_width));
        record.insert("bodyWidth".into(), Value::from(self.body_width));
    }
}

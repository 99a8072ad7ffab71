//! Ellipse shape.

use super::{ShapeStyle, ShapeTrait};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// An axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    pub style: ShapeStyle,
}

impl Ellipse {
    /// Create a new ellipse.
    pub fn new(center: Point, radius_x: f64, radius_y: f64) -> Self {
        Self {
            center,
            radius_x,
            radius_y,
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Self {
        Self {
            center: Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0)),
            radius_x: props::positive_or(bag, "radiusX", 50.0),
            radius_y: props::positive_or(bag, "radiusY", 30.0),
            style: ShapeStyle::from_bag(bag),
        }
    }
}

impl ShapeTrait for Ellipse {
    const TYPE_NAME: &'static str = "ellipse";

    fn anchor(&self) -> Point {
        self.center
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn contains_point(&self, point: Point) -> bool {
        let dx = (point.x - self.center.x) / self.radius_x;
        let dy = (point.y - self.center.y) / self.radius_y;
        dx * dx + dy * dy <= 1.0
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.center += delta;
    }

    fn draw_body(&self, ctx: &mut dyn DrawContext) {
        ctx.begin_path();
        ctx.ellipse(self.center.x, self.center.y, self.radius_x, self.radius_y);
        self.style.fill_and_stroke(ctx);
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("radiusX".into(), Value::from(self.radius_x));
        record.insert("radiusY".into(), Value::from(self.radius_y));
    }
}

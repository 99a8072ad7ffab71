//! Circle shape.

use super::{ShapeStyle, ShapeTrait};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;
use std::f64::consts::TAU;

/// A circle defined by its center and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub style: ShapeStyle,
}

impl Circle {
    pub const DEFAULT_RADIUS: f64 = 50.0;

    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Self {
        Self {
            center: Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0)),
            radius: props::positive_or(bag, "radius", Self::DEFAULT_RADIUS),
            style: ShapeStyle::from_bag(bag),
        }
    }
}

impl ShapeTrait for Circle {
    const TYPE_NAME: &'static str = "circle";

    fn anchor(&self) -> Point {
        self.center
    }

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center, (self.radius * 2.0, self.radius * 2.0))
    }

    fn contains_point(&self, point: Point) -> bool {
        self.center.distance(point) <= self.radius
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
        ctx.arc(self.center.x, self.center.y, self.radius, 0.0, TAU, false);
        self.style.fill_and_stroke(ctx);
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("radius".into(), Value::from(self.radius));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_point() {
        let circle = Circle::new(Point::new(100.0, 100.0), 50.0);
        assert!(circle.contains_point(Point::new(149.0, 100.0)));
        assert!(!circle.contains_point(Point::new(151.0, 100.0)));
        assert!(circle.contains_point(circle.anchor()));
    }

    #[test]
    fn test_bounds() {
        let bounds = Circle::new(Point::new(50.0, 50.0), 10.0).bounds();
        assert!((bounds.x0 - 40.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 60.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_radius_falls_back() {
        let bag = serde_json::json!({ "radius": "nope" });
        let circle = Circle::from_bag(bag.as_object().unwrap());
        assert!((circle.radius - Circle::DEFAULT_RADIUS).abs() < f64::EPSILON);
    }
}

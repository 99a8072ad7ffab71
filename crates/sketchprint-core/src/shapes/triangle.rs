//! Triangle shape.

use super::{ShapeStyle, ShapeTrait, contains_inclusive, ensure_min_extent, points_bounds};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// A triangle given by three explicit vertices; the first is the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
    pub style: ShapeStyle,
}

impl Triangle {
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            a,
            b,
            c,
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Self {
        let a = Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0));
        Self {
            a,
            b: Point::new(
                props::number_or(bag, "x2", a.x + 50.0),
                props::number_or(bag, "y2", a.y + 100.0),
            ),
            c: Point::new(
                props::number_or(bag, "x3", a.x - 50.0),
                props::number_or(bag, "y3", a.y + 100.0),
            ),
            style: ShapeStyle::from_bag(bag),
        }
    }

    pub fn vertices(&self) -> [Point; 3] {
        [self.a, self.b, self.c]
    }
}

impl ShapeTrait for Triangle {
    const TYPE_NAME: &'static str = "triangle";

    fn anchor(&self) -> Point {
        self.a
    }

    fn bounds(&self) -> Rect {
        ensure_min_extent(points_bounds(self.vertices()))
    }

    fn contains_point(&self, point: Point) -> bool {
        let (a, b, c) = (self.a, self.b, self.c);
        let denom = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        if denom.abs() < 1e-6 {
            // Collinear vertices: no interior to test against.
            return contains_inclusive(self.bounds(), point);
        }
        let u = ((b.y - c.y) * (point.x - c.x) + (c.x - b.x) * (point.y - c.y)) / denom;
        let v = ((c.y - a.y) * (point.x - c.x) + (a.x - c.x) * (point.y - c.y)) / denom;
        let w = 1.0 - u - v;
        u >= 0.0 && v >= 0.0 && w >= 0.0
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.a += delta;
        self.b += delta;
        self.c += delta;
    }

    fn draw_body(&self, ctx: &mut dyn DrawContext) {
        ctx.begin_path();
        ctx.move_to(self.a.x, self.a.y);
        ctx.line_to(self.b.x, self.b.y);
        ctx.line_to(self.c.x, self.c.y);
        ctx.close_path();
        self.style.fill_and_stroke(ctx);
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("x2".into(), Value::from(self.b.x));
        record.insert("y2".into(), Value::from(self.b.y));
        record.insert("x3".into(), Value::from(self.c.x));
        record.insert("y3".into(), Value::from(self.c.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vertices() {
        let bag = serde_json::json!({ "x": 100, "y": 0 });
        let tri = Triangle::from_bag(bag.as_object().unwrap());
        assert_eq!(tri.b, Point::new(150.0, 100.0));
        assert_eq!(tri.c, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_contains_point() {
        let tri = Triangle::new(
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(0.0, 100.0),
        );
        assert!(tri.contains_point(Point::new(10.0, 10.0)));
        assert!(tri.contains_point(tri.anchor()));
        assert!(!tri.contains_point(Point::new(80.0, 80.0)));
    }

    #[test]
    fn test_degenerate_uses_bounds() {
        let tri = Triangle::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 0.0));
        assert!(tri.contains_point(Point::new(5.0, 0.2)));
        assert!(!tri.contains_point(Point::new(5.0, 3.0)));
    }
}

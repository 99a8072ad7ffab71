//! Star shape.

use super::{ShapeStyle, ShapeTrait};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;
use std::f64::consts::{FRAC_PI_2, PI};

/// A regular star with alternating outer and inner vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub center: Point,
    pub outer_radius: f64,
    pub inner_radius: f64,
    /// Number of tips, in `[3, 20]`.
    pub points: u32,
    pub style: ShapeStyle,
}

impl Star {
    pub const MIN_POINTS: u32 = 3;
    pub const MAX_POINTS: u32 = 20;

    pub fn new(center: Point, outer_radius: f64, inner_radius: f64, points: u32) -> Self {
        Self {
            center,
            outer_radius,
            inner_radius,
            points: points.clamp(Self::MIN_POINTS, Self::MAX_POINTS),
            style: ShapeStyle::default(),
        }
    }

    pub fn from_bag(bag: &PropertyBag) -> Self {
        Self {
            center: Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0)),
            outer_radius: props::positive_or(bag, "outerRadius", 50.0),
            inner_radius: props::positive_or(bag, "innerRadius", 25.0),
            points: props::count_or(bag, "points", 5, Self::MIN_POINTS, Self::MAX_POINTS),
            style: ShapeStyle::from_bag(bag),
        }
    }

    /// The `2 * points` outline vertices, starting at the top tip.
    pub fn vertices(&self) -> Vec<Point> {
        let step = PI / self.points as f64;
        (0..self.points * 2)
            .map(|i| {
                let angle = i as f64 * step - FRAC_PI_2;
                let radius = if i % 2 == 0 { self.outer_radius } else { self.inner_radius };
                Point::new(
                    self.center.x + angle.cos() * radius,
                    self.center.y + angle.sin() * radius,
                )
            })
            .collect()
    }
}

impl ShapeTrait for Star {
    const TYPE_NAME: &'static str = "star";

    fn anchor(&self) -> Point {
        self.center
    }

    fn bounds(&self) -> Rect {
        let r = self.outer_radius.max(self.inner_radius);
        Rect::from_center_size(self.center, (r * 2.0, r * 2.0))
    }

    /// Approximated by the outer circle.
    fn contains_point(&self, point: Point) -> bool {
        self.center.distance(point) <= self.outer_radius
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
        let vertices = self.vertices();
        let Some((first, rest)) = vertices.split_first() else {
            return;
        };
        ctx.begin_path();
        ctx.move_to(first.x, first.y);
        for p in rest {
            ctx.line_to(p.x, p.y);
        }
        ctx.close_path();
        self.style.fill_and_stroke(ctx);
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("outerRadius".into(), Value::from(self.outer_radius));
        record.insert("innerRadius".into(), Value::from(self.inner_radius));
        record.insert("points".into(), Value::from(self.points));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertices() {
        let star = Star::new(Point::ZERO, 50.0, 25.0, 5);
        let vertices = star.vertices();
        assert_eq!(vertices.len(), 10);
        // First tip points straight up (-90 degrees).
        assert!(vertices[0].x.abs() < 1e-9);
        assert!((vertices[0].y + 50.0).abs() < 1e-9);
        assert!((vertices[1].distance(Point::ZERO) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_points_are_clamped() {
        let bag = serde_json::json!({ "points": 50 });
        assert_eq!(Star::from_bag(bag.as_object().unwrap()).points, 20);
        let bag = serde_json::json!({ "points": 1 });
        assert_eq!(Star::from_bag(bag.as_object().unwrap()).points, 3);
    }

    #[test]
    fn test_contains_point() {
        let star = Star::new(Point::new(10.0, 10.0), 50.0, 25.0, 5);
        assert!(star.contains_point(star.anchor()));
        assert!(!star.contains_point(Point::new(100.0, 10.0)));
    }
}

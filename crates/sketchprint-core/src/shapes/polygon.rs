//! Polygon shape.

use super::{ShapeStyle, ShapeTrait, ensure_min_extent, points_bounds};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// A closed polygon over an explicit vertex list.
///
/// The anchor is only the reference for moves and rotation; it is not
/// necessarily one of the vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub origin: Point,
    /// At least three vertices.
    pub points: Vec<Point>,
    pub style: ShapeStyle,
}

impl Polygon {
    pub const MIN_POINTS: usize = 3;

    /// Vertex lists with fewer than [`Self::MIN_POINTS`] usable entries fall
    /// back to the default triangle.
    pub fn from_bag(bag: &PropertyBag) -> Self {
        let origin = Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0));
        let points = match props::points(bag, "points") {
            None => Self::default_points(origin),
            Some(points) if points.len() >= Self::MIN_POINTS => points,
            Some(points) => {
                log::warn!(
                    "Polygon needs at least {} valid points, got {}; using defaults",
                    Self::MIN_POINTS,
                    points.len()
                );
                Self::default_points(origin)
            }
        };
        Self {
            origin,
            points,
            style: ShapeStyle::from_bag(bag),
        }
    }

    fn default_points(origin: Point) -> Vec<Point> {
        vec![
            origin,
            Point::new(origin.x + 50.0, origin.y + 50.0),
            Point::new(origin.x - 50.0, origin.y + 50.0),
        ]
    }
}

impl ShapeTrait for Polygon {
    const TYPE_NAME: &'static str = "polygon";

    fn anchor(&self) -> Point {
        self.origin
    }

    fn bounds(&self) -> Rect {
        ensure_min_extent(points_bounds(self.points.iter().copied()))
    }

    /// Even-odd ray casting.
    fn contains_point(&self, point: Point) -> bool {
        let mut inside = false;
        let n = self.points.len();
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let (pi, pj) = (self.points[i], self.points[j]);
            if (pi.y > point.y) != (pj.y > point.y)
                && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn translate(&mut self, delta: Vec2) {
        self.origin += delta;
        for p in &mut self.points {
            *p += delta;
        }
    }

    fn draw_body(&self, ctx: &mut dyn DrawContext) {
        let Some((first, rest)) = self.points.split_first() else {
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
        record.insert("points".into(), props::points_value(&self.points));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Polygon {
        let bag = json!({
            "points": [
                { "x": 0, "y": 0 },
                { "x": 10, "y": 0 },
                { "x": 10, "y": 10 },
                { "x": 0, "y": 10 }
            ]
        });
        Polygon::from_bag(bag.as_object().unwrap())
    }

    #[test]
    fn test_ray_casting() {
        let poly = square();
        assert!(poly.contains_point(Point::new(5.0, 5.0)));
        assert!(!poly.contains_point(Point::new(15.0, 5.0)));
    }

    #[test]
    fn test_default_points() {
        let bag = json!({ "x": 100, "y": 100 });
        let poly = Polygon::from_bag(bag.as_object().unwrap());
        assert_eq!(poly.points.len(), 3);
        assert_eq!(poly.points[1], Point::new(150.0, 150.0));
    }

    #[test]
    fn test_too_few_points_use_defaults() {
        let bag = json!({ "x": 20, "y": 30, "points": [{ "x": 0, "y": 0 }, { "x": 10, "y": 10 }] });
        let poly = Polygon::from_bag(bag.as_object().unwrap());
        assert_eq!(poly.points, Polygon::default_points(Point::new(20.0, 30.0)));
    }

    #[test]
    fn test_malformed_point_is_dropped_then_defaulted() {
        let bag = json!({
            "points": [{ "x": "a", "y": 0 }, { "x": 10, "y": 0 }, { "x": 10, "y": 10 }]
        });
        let poly = Polygon::from_bag(bag.as_object().unwrap());
        assert_eq!(poly.points.len(), Polygon::MIN_POINTS);
        assert_eq!(poly.points[0], Point::ZERO);
        assert_eq!(poly.points[1], Point::new(50.0, 50.0));
    }

    #[test]
    fn test_translate_moves_vertices() {
        let mut poly = square();
        poly.translate(Vec2::new(5.0, -5.0));
        assert_eq!(poly.points[2], Point::new(15.0, 5.0));
        assert_eq!(poly.anchor(), Point::new(5.0, -5.0));
    }
}

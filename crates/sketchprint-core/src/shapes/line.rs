//! Line shape.

use super::{ShapeStyle, ShapeTrait, ensure_min_extent, point_to_segment_dist};
use crate::context::{DrawContext, LineCap};
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde_json::Value;

/// Extra hit slop around a line's stroke, in canvas units.
const HIT_SLOP: f64 = 2.0;

/// A straight line segment. Stroke only.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    pub line_cap: LineCap,
    /// Dash lengths; empty means solid.
    pub line_dash: Vec<f64>,
    pub style: ShapeStyle,
}

impl Line {
    /// Create a new line.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start,
            end,
            line_cap: LineCap::default(),
            line_dash: Vec::new(),
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
            line_cap: props::enum_or(bag, "lineCap", LineCap::default()),
            line_dash: props::dash_pattern(bag, "lineDash"),
            style: ShapeStyle::from_bag(bag),
        }
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

impl ShapeTrait for Line {
    const TYPE_NAME: &'static str = "line";

    fn anchor(&self) -> Point {
        self.start
    }

    fn bounds(&self) -> Rect {
        let pad = self.style.stroke_width / 2.0;
        ensure_min_extent(Rect::from_points(self.start, self.end).inflate(pad, pad))
    }

    fn contains_point(&self, point: Point) -> bool {
        let reach = self.style.stroke_width / 2.0 + HIT_SLOP;
        point_to_segment_dist(point, self.start, self.end) <= reach
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
        if !self.style.has_stroke() {
            return;
        }
        ctx.begin_path();
        ctx.move_to(self.start.x, self.start.y);
        ctx.line_to(self.end.x, self.end.y);
        ctx.set_line_cap(self.line_cap);
        if !self.line_dash.is_empty() {
            ctx.set_line_dash(&self.line_dash);
        }
        self.style.stroke_path(ctx);
        if !self.line_dash.is_empty() {
            ctx.set_line_dash(&[]);
        }
        ctx.set_line_cap(LineCap::default());
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("x2".into(), Value::from(self.end.x));
        record.insert("y2".into(), Value::from(self.end.y));
        record.insert("lineCap".into(), Value::from(self.line_cap.as_str()));
        record.insert("lineDash".into(), Value::from(self.line_dash.clone()));
    }
}

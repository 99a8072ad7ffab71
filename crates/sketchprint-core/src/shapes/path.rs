//! Free-form path shape built from canvas-style commands.

use super::{ShapeStyle, ShapeTrait, contains_inclusive, ensure_min_extent, points_bounds};
use crate::context::DrawContext;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One path construction step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    QuadraticCurveTo {
        cpx: f64,
        cpy: f64,
        x: f64,
        y: f64,
    },
    BezierCurveTo {
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
    },
    Arc {
        x: f64,
        y: f64,
        radius: f64,
        #[serde(rename = "startAngle")]
        start_angle: f64,
        #[serde(rename = "endAngle")]
        end_angle: f64,
        #[serde(default)]
        counterclockwise: bool,
    },
}

impl PathCommand {
    /// Every coordinate the command references, control points included.
    /// Arcs contribute the corners of their full circle's box.
    pub fn points(&self) -> Vec<Point> {
        match *self {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => vec![Point::new(x, y)],
            PathCommand::QuadraticCurveTo { cpx, cpy, x, y } => {
                vec![Point::new(cpx, cpy), Point::new(x, y)]
            }
            PathCommand::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y } => vec![
                Point::new(cp1x, cp1y),
                Point::new(cp2x, cp2y),
                Point::new(x, y),
            ],
            PathCommand::Arc { x, y, radius, .. } => vec![
                Point::new(x - radius, y - radius),
                Point::new(x + radius, y + radius),
            ],
        }
    }

    fn is_valid(&self) -> bool {
        let finite = self.points().iter().all(|p| p.is_finite());
        match *self {
            PathCommand::Arc {
                radius,
                start_angle,
                end_angle,
                ..
            } => finite && radius >= 0.0 && start_angle.is_finite() && end_angle.is_finite(),
            _ => finite,
        }
    }

    fn translate(&mut self, d: Vec2) {
        match self {
            PathCommand::MoveTo { x, y } | PathCommand::LineTo { x, y } => {
                *x += d.x;
                *y += d.y;
            }
            PathCommand::QuadraticCurveTo { cpx, cpy, x, y } => {
                *cpx += d.x;
                *cpy += d.y;
                *x += d.x;
                *y += d.y;
            }
            PathCommand::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y } => {
                *cp1x += d.x;
                *cp1y += d.y;
                *cp2x += d.x;
                *cp2y += d.y;
                *x += d.x;
                *y += d.y;
            }
            PathCommand::Arc { x, y, .. } => {
                *x += d.x;
                *y += d.y;
            }
        }
    }

    fn replay(&self, ctx: &mut dyn DrawContext) {
        match *self {
            PathCommand::MoveTo { x, y } => ctx.move_to(x, y),
            PathCommand::LineTo { x, y } => ctx.line_to(x, y),
            PathCommand::QuadraticCurveTo { cpx, cpy, x, y } => {
                ctx.quadratic_curve_to(cpx, cpy, x, y)
            }
            PathCommand::BezierCurveTo { cp1x, cp1y, cp2x, cp2y, x, y } => {
                ctx.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y)
            }
            PathCommand::Arc {
                x,
                y,
                radius,
                start_angle,
                end_angle,
                counterclockwise,
            } => ctx.arc(x, y, radius, start_angle, end_angle, counterclockwise),
        }
    }
}

/// A path made of [`PathCommand`]s. Filled only when `closed`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathShape {
    /// Reference point for moves and rotation.
    pub origin: Point,
    pub commands: Vec<PathCommand>,
    pub closed: bool,
    /// Curve smoothing factor in `[0, 1]` used when synthesizing commands from points.
    pub smoothing: f64,
    pub style: ShapeStyle,
}

impl PathShape {
    pub fn new(origin: Point, commands: Vec<PathCommand>) -> Self {
        Self {
            origin,
            commands,
            closed: false,
            smoothing: 0.0,
            style: ShapeStyle::default(),
        }
    }

    /// Reads `pathData`; when only a raw `points` list is given, commands are
    /// synthesized with [`PathShape::smooth_commands`].
    pub fn from_bag(bag: &PropertyBag) -> Self {
        let origin = Point::new(props::number_or(bag, "x", 0.0), props::number_or(bag, "y", 0.0));
        let smoothing = props::clamped_or(bag, "smoothing", 0.0, 0.0, 1.0);
        let commands = match bag.get("pathData").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(|item| serde_json::from_value::<PathCommand>(item.clone()).ok())
                .filter(PathCommand::is_valid)
                .collect(),
            None => props::points(bag, "points")
                .map(|points| Self::smooth_commands(&points, smoothing))
                .unwrap_or_default(),
        };
        Self {
            origin,
            commands,
            closed: props::bool_or(bag, "closed", false),
            smoothing,
            style: ShapeStyle::from_bag(bag),
        }
    }

    /// Build a command list through `points`.
    ///
    /// With `smoothing > 0`, every interior point is reached with a cubic whose
    /// control points lean toward the neighbouring points; otherwise straight
    /// segments are used.
    pub fn smooth_commands(points: &[Point], smoothing: f64) -> Vec<PathCommand> {
        if points.len() < 2 {
            return Vec::new();
        }
        let mut commands = vec![PathCommand::MoveTo {
            x: points[0].x,
            y: points[0].y,
        }];
        for i in 1..points.len() {
            let curr = points[i];
            if smoothing > 0.0 && i < points.len() - 1 {
                let (prev, next) = (points[i - 1], points[i + 1]);
                commands.push(PathCommand::BezierCurveTo {
                    cp1x: prev.x + (curr.x - prev.x) * smoothing,
                    cp1y: prev.y + (curr.y - prev.y) * smoothing,
                    cp2x: curr.x - (next.x - curr.x) * smoothing,
                    cp2y: curr.y - (next.y - curr.y) * smoothing,
                    x: curr.x,
                    y: curr.y,
                });
            } else {
                commands.push(PathCommand::LineTo { x: curr.x, y: curr.y });
            }
        }
        commands
    }
}

impl ShapeTrait for PathShape {
    const TYPE_NAME: &'static str = "path";

    fn anchor(&self) -> Point {
        self.origin
    }

    fn bounds(&self) -> Rect {
        if self.commands.is_empty() {
            return ensure_min_extent(Rect::from_points(self.origin, self.origin));
        }
        ensure_min_extent(points_bounds(self.commands.iter().flat_map(PathCommand::points)))
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
        self.origin += delta;
        for command in &mut self.commands {
            command.translate(delta);
        }
    }

    fn draw_body(&self, ctx: &mut dyn DrawContext) {
        if self.commands.is_empty() {
            return;
        }
        ctx.begin_path();
        for command in &self.commands {
            command.replay(ctx);
        }
        if self.closed {
            ctx.close_path();
            ctx.set_fill_color(self.style.fill());
            ctx.fill();
        }
        self.style.stroke_path(ctx);
    }

    fn write_fields(&self, record: &mut PropertyBag) {
        let commands =
            serde_json::to_value(&self.commands).unwrap_or_else(|_| Value::Array(Vec::new()));
        record.insert("pathData".into(), commands);
        record.insert("closed".into(), Value::from(self.closed));
        record.insert("smoothing".into(), Value::from(self.smoothing));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::testing::{Call, RecordingContext};
    use serde_json::json;

    #[test]
    fn test_parse_commands_drops_invalid() {
        let bag = json!({
            "pathData": [
                { "type": "moveTo", "x": 0, "y": 0 },
                { "type": "lineTo", "x": "a", "y": 0 },
                { "type": "teleport", "x": 1, "y": 1 },
                { "type": "arc", "x": 10, "y": 10, "radius": 5, "startAngle": 0, "endAngle": 3.14 },
                {
                    "type": "bezierCurveTo",
                    "cp1x": 1, "cp1y": 2, "cp2x": 3, "cp2y": 4, "x": 5, "y": 6
                }
            ],
            "closed": true
        });
        let path = PathShape::from_bag(bag.as_object().unwrap());
        assert_eq!(path.commands.len(), 3);
        assert!(path.closed);
        assert!(matches!(path.commands[1], PathCommand::Arc { counterclockwise: false, .. }));
    }

    #[test]
    fn test_bounds_include_control_points_and_arcs() {
        let path = PathShape::new(
            Point::ZERO,
            vec![
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::QuadraticCurveTo { cpx: 50.0, cpy: -40.0, x: 100.0, y: 0.0 },
                PathCommand::Arc {
                    x: 100.0,
                    y: 50.0,
                    radius: 20.0,
                    start_angle: 0.0,
                    end_angle: 1.0,
                    counterclockwise: false,
                },
            ],
        );
        let bounds = path.bounds();
        assert!((bounds.y0 + 40.0).abs() < f64::EPSILON);
        assert!((bounds.x1 - 120.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_smooth_commands() {
        let points = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(20.0, 10.0)];
        let commands = PathShape::smooth_commands(&points, 0.5);
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[1],
            PathCommand::BezierCurveTo {
                cp1x: 5.0,
                cp1y: 0.0,
                cp2x: 5.0,
                cp2y: -5.0,
                x: 10.0,
                y: 0.0
            }
        );
        assert_eq!(commands[2], PathCommand::LineTo { x: 20.0, y: 10.0 });
        assert!(PathShape::smooth_commands(&points[..1], 0.5).is_empty());
        assert!(PathShape::smooth_commands(&points, 0.0)
            .iter()
            .skip(1)
            .all(|c| matches!(c, PathCommand::LineTo { .. })));
    }

    #[test]
    fn test_open_path_is_not_filled() {
        let bag = json!({
            "pathData": [{ "type": "moveTo", "x": 0, "y": 0 }, { "type": "lineTo", "x": 5, "y": 5 }]
        });
        let path = PathShape::from_bag(bag.as_object().unwrap());
        let mut ctx = RecordingContext::default();
        path.draw_body(&mut ctx);
        assert_eq!(ctx.count(|c| matches!(c, Call::Fill)), 0);
        assert_eq!(ctx.count(|c| matches!(c, Call::Stroke)), 1);
    }

    #[test]
    fn test_translate_moves_every_coordinate() {
        let mut path = PathShape::new(
            Point::new(1.0, 1.0),
            vec![PathCommand::BezierCurveTo {
                cp1x: 0.0,
                cp1y: 0.0,
                cp2x: 1.0,
                cp2y: 1.0,
                x: 2.0,
                y: 2.0,
            }],
        );
        path.translate(Vec2::new(10.0, 20.0));
        assert_eq!(path.origin, Point::new(11.0, 21.0));
        assert_eq!(
            path.commands[0],
            PathCommand::BezierCurveTo {
                cp1x: 10.0,
                cp1y: 20.0,
                cp2x: 11.0,
                cp2y: 21.0,
                x: 12.0,
                y: 22.0
            }
        );
    }

    #[test]
    fn test_commands_round_trip_through_record() {
        let bag = json!({
            "pathData": [{
                "type": "arc",
                "x": 1,
                "y": 2,
                "radius": 3,
                "startAngle": 0,
                "endAngle": 1,
                "counterclockwise": true
            }]
        });
        let path = PathShape::from_bag(bag.as_object().unwrap());
        let mut record = PropertyBag::new();
        path.write_fields(&mut record);
        let again = PathShape::from_bag(&record);
        assert_eq!(path.commands, again.commands);
    }
}

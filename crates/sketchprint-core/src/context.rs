//! Abstract immediate-mode drawing protocol.
//!
//! Shapes describe themselves through [`DrawContext`]; each output backend
//! implements it once. The call vocabulary mirrors a 2-D canvas: a current
//! path is built with `move_to`/`line_to`/curve calls and painted with `fill`
//! or `stroke`, while `save`/`restore` bracket transform and style changes.

use crate::error::ContextError;
use kurbo::{Arc, BezPath, PathEl, Point, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Line cap style for open strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

impl FromStr for LineCap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            other => Err(format!("Invalid line cap: {other}")),
        }
    }
}

impl fmt::Display for LineCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A 2-D drawing target.
///
/// Transform calls (`translate`, `rotate`) are only issued between paths, never
/// while a path is being built, so backends may apply the transform state that
/// is current when the path is painted.
pub trait DrawContext {
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    /// Circular arc around `(x, y)`. Angles in radians, clockwise in canvas space.
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, counterclockwise: bool);
    /// Full ellipse around `(x, y)`.
    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64);
    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn close_path(&mut self);

    /// Paint the current path with the fill color.
    fn fill(&mut self);
    /// Paint the current path outline with the stroke settings.
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn set_fill_color(&mut self, color: Color);
    fn set_stroke_color(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    /// Dash lengths; an empty slice restores solid strokes.
    fn set_line_dash(&mut self, dashes: &[f64]);
    fn set_global_alpha(&mut self, alpha: f64);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    /// Rotate by `angle` radians.
    fn rotate(&mut self, angle: f64);

    /// Draw `text` with its baseline starting at `(x, y)` in the fill color.
    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_family: &str, font_size: f64);

    /// Place the image referenced by `source` into the given box.
    ///
    /// Returns an error when the reference cannot be resolved or decoded;
    /// nothing is drawn in that case.
    fn draw_image(
        &mut self,
        source: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ContextError>;
}

/// Accumulates canvas-style path calls into a [`BezPath`].
///
/// Arcs and ellipses become cubic segments, so every backend paints the same
/// geometry.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    path: BezPath,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    /// Tolerance used when approximating arcs with cubic curves.
    pub const ARC_TOLERANCE: f64 = 0.1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current path.
    pub fn clear(&mut self) {
        self.path = BezPath::new();
        self.current = None;
        self.subpath_start = None;
    }

    pub fn path(&self) -> &BezPath {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let p = Point::new(x, y);
        self.path.move_to(p);
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            self.move_to(x, y);
            return;
        }
        let p = Point::new(x, y);
        self.path.line_to(p);
        self.current = Some(p);
    }

    pub fn quad_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.ensure_subpath(cpx, cpy);
        let p = Point::new(x, y);
        self.path.quad_to(Point::new(cpx, cpy), p);
        self.current = Some(p);
    }

    pub fn curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.ensure_subpath(cp1x, cp1y);
        let p = Point::new(x, y);
        self.path
            .curve_to(Point::new(cp1x, cp1y), Point::new(cp2x, cp2y), p);
        self.current = Some(p);
    }

    pub fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        counterclockwise: bool,
    ) {
        let sweep = arc_sweep(start, end, counterclockwise);
        self.append_arc(Arc {
            center: Point::new(x, y),
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: sweep,
            x_rotation: 0.0,
        });
    }

    pub fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64) {
        self.append_arc(Arc {
            center: Point::new(x, y),
            radii: Vec2::new(radius_x, radius_y),
            start_angle: 0.0,
            sweep_angle: TAU,
            x_rotation: 0.0,
        });
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close();
    }

    pub fn close(&mut self) {
        if self.current.is_some() {
            self.path.close_path();
            self.current = self.subpath_start;
        }
    }

    /// Take the built path, leaving the builder empty.
    pub fn take(&mut self) -> BezPath {
        let path = std::mem::take(&mut self.path);
        self.current = None;
        self.subpath_start = None;
        path
    }

    fn ensure_subpath(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            self.move_to(x, y);
        }
    }

    fn append_arc(&mut self, arc: Arc) {
        let start = arc_point(&arc, arc.start_angle);
        // Canvas semantics: an arc continues the current subpath with a straight
        // segment to its start point.
        if self.current.is_some() {
            self.line_to(start.x, start.y);
        } else {
            self.move_to(start.x, start.y);
        }
        if arc.sweep_angle == 0.0 {
            return;
        }
        for el in arc.append_iter(Self::ARC_TOLERANCE) {
            if let PathEl::CurveTo(p1, p2, p3) = el {
                self.path.curve_to(p1, p2, p3);
            }
        }
        self.current = Some(arc_point(&arc, arc.start_angle + arc.sweep_angle));
    }
}

fn arc_point(arc: &Arc, angle: f64) -> Point {
    arc.center + Vec2::new(arc.radii.x * angle.cos(), arc.radii.y * angle.sin())
}

/// Signed sweep for a canvas-style arc from `start` to `end`.
pub fn arc_sweep(start: f64, end: f64, counterclockwise: bool) -> f64 {
    if counterclockwise {
        if start - end >= TAU {
            -TAU
        } else {
            -(start - end).rem_euclid(TAU)
        }
    } else if end - start >= TAU {
        TAU
    } else {
        (end - start).rem_euclid(TAU)
    }
}

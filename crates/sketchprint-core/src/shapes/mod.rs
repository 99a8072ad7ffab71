//! Shape definitions for the scene.

mod arrow;
mod circle;
mod ellipse;
mod image;
mod line;
mod path;
mod polygon;
mod rectangle;
mod star;
mod text;
mod triangle;

pub use arrow::Arrow;
pub use circle::Circle;
pub use ellipse::Ellipse;
pub use image::Image;
pub use line::Line;
pub use path::{PathCommand, PathShape};
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use star::Star;
pub use text::Text;
pub use triangle::Triangle;

use crate::context::DrawContext;
use crate::error::DrawError;
use crate::props::{self, PropertyBag};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            3 => {
                let nibble =
                    |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Style properties shared by every shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeStyle {
    pub fill_color: SerializableColor,
    pub stroke_color: SerializableColor,
    /// Stroke width; 0 disables the outline.
    pub stroke_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    pub opacity: f64,
    /// Rotation in degrees around the shape's anchor.
    pub rotation: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill_color: SerializableColor::black(),
            stroke_color: SerializableColor::black(),
            stroke_width: 1.0,
            opacity: 1.0,
            rotation: 0.0,
        }
    }
}

impl ShapeStyle {
    /// Read the common style fields, normalizing each one.
    pub fn from_bag(bag: &PropertyBag) -> Self {
        let defaults = Self::default();
        Self {
            fill_color: props::color_or(bag, "fillColor", defaults.fill_color),
            stroke_color: props::color_or(bag, "strokeColor", defaults.stroke_color),
            stroke_width: props::non_negative_or(bag, "strokeWidth", defaults.stroke_width),
            opacity: props::clamped_or(bag, "opacity", defaults.opacity, 0.0, 1.0),
            rotation: props::number_or(bag, "rotation", defaults.rotation),
        }
    }

    pub(crate) fn write_fields(&self, record: &mut PropertyBag) {
        record.insert("fillColor".into(), Value::from(self.fill_color.to_hex()));
        record.insert("strokeColor".into(), Value::from(self.stroke_color.to_hex()));
        record.insert("strokeWidth".into(), Value::from(self.stroke_width));
        record.insert("opacity".into(), Value::from(self.opacity));
        record.insert("rotation".into(), Value::from(self.rotation));
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Color {
        self.fill_color.into()
    }

    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    pub fn has_stroke(&self) -> bool {
        self.stroke_width > 0.0
    }

    fn is_finite(&self) -> bool {
        in_output_range(self.stroke_width) && self.opacity.is_finite() && self.rotation.is_finite()
    }

    /// Fill the current path, then outline it.
    pub(crate) fn fill_and_stroke(&self, ctx: &mut dyn DrawContext) {
        ctx.set_fill_color(self.fill());
        ctx.fill();
        self.stroke_path(ctx);
    }

    /// Outline the current path if the stroke width is positive.
    pub(crate) fn stroke_path(&self, ctx: &mut dyn DrawContext) {
        if self.has_stroke() {
            ctx.set_stroke_color(self.stroke());
            ctx.set_line_width(self.stroke_width);
            ctx.stroke();
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let pv = Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    point.distance(proj)
}

/// Smallest axis-aligned rect containing all points.
pub(crate) fn points_bounds(points: impl IntoIterator<Item = Point>) -> Rect {
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p))
}

/// Largest magnitude a drawing backend can carry; PDF reals are single precision.
const OUTPUT_LIMIT: f64 = f32::MAX as f64;

fn in_output_range(value: f64) -> bool {
    value.is_finite() && value.abs() <= OUTPUT_LIMIT
}

fn rect_in_output_range(rect: Rect) -> bool {
    [rect.x0, rect.y0, rect.x1, rect.y1].into_iter().all(in_output_range)
}

/// Range check with closed edges on all four sides.
pub(crate) fn contains_inclusive(rect: Rect, point: Point) -> bool {
    let rect = rect.abs();
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Widen zero-width or zero-height rects to at least one unit, keeping the center.
pub(crate) fn ensure_min_extent(rect: Rect) -> Rect {
    let rect = rect.abs();
    let grow_x = (1.0 - rect.width()).max(0.0) / 2.0;
    let grow_y = (1.0 - rect.height()).max(0.0) / 2.0;
    Rect::new(rect.x0 - grow_x, rect.y0 - grow_y, rect.x1 + grow_x, rect.y1 + grow_y)
}

/// Capabilities every shape variant provides.
pub trait ShapeTrait {
    /// Registry tag used in flat records.
    const TYPE_NAME: &'static str;

    /// The reference point rotation and moves are expressed against.
    fn anchor(&self) -> Point;

    /// Axis-aligned bounding box; never zero-area.
    fn bounds(&self) -> Rect;

    /// Check if a point hits this shape.
    fn contains_point(&self, point: Point) -> bool;

    fn style(&self) -> &ShapeStyle;

    fn style_mut(&mut self) -> &mut ShapeStyle;

    /// Move the anchor and every auxiliary point by `delta`.
    fn translate(&mut self, delta: Vec2);

    /// Issue path, fill and stroke calls in the shape's own coordinates.
    fn draw_body(&self, ctx: &mut dyn DrawContext);

    /// Write the variant-specific fields into a flat record.
    fn write_fields(&self, record: &mut PropertyBag);
}

/// Closed set of shape variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle(Rectangle),
    Circle(Circle),
    Ellipse(Ellipse),
    Line(Line),
    Arrow(Arrow),
    Triangle(Triangle),
    Polygon(Polygon),
    Path(PathShape),
    Star(Star),
    Text(Text),
    Image(Image),
}

macro_rules! dispatch {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Rectangle($s) => $body,
            Shape::Circle($s) => $body,
            Shape::Ellipse($s) => $body,
            Shape::Line($s) => $body,
            Shape::Arrow($s) => $body,
            Shape::Triangle($s) => $body,
            Shape::Polygon($s) => $body,
            Shape::Path($s) => $body,
            Shape::Star($s) => $body,
            Shape::Text($s) => $body,
            Shape::Image($s) => $body,
        }
    };
}

fn type_name_of<T: ShapeTrait>(_: &T) -> &'static str {
    T::TYPE_NAME
}

impl Shape {
    pub fn type_name(&self) -> &'static str {
        dispatch!(self, s => type_name_of(s))
    }

    pub fn anchor(&self) -> Point {
        dispatch!(self, s => s.anchor())
    }

    pub fn bounds(&self) -> Rect {
        dispatch!(self, s => s.bounds())
    }

    pub fn contains_point(&self, point: Point) -> bool {
        dispatch!(self, s => s.contains_point(point))
    }

    pub fn style(&self) -> &ShapeStyle {
        dispatch!(self, s => s.style())
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        dispatch!(self, s => s.style_mut())
    }

    pub fn translate(&mut self, delta: Vec2) {
        dispatch!(self, s => s.translate(delta))
    }

    /// Draw through `ctx`.
    ///
    /// Rotation and opacity are applied inside a `save`/`restore` bracket, so
    /// no drawing state leaks into the next shape.
    pub fn draw(&self, ctx: &mut dyn DrawContext) -> Result<(), DrawError> {
        let style = self.style();
        let anchor = self.anchor();
        let drawable = rect_in_output_range(self.bounds())
            && in_output_range(anchor.x)
            && in_output_range(anchor.y)
            && style.is_finite();
        if !drawable {
            return Err(DrawError::NonFiniteGeometry(self.type_name()));
        }

        let rotated = style.rotation != 0.0;
        let translucent = style.opacity != 1.0;
        let bracketed = rotated || translucent;
        if bracketed {
            ctx.save();
            if rotated {
                ctx.translate(anchor.x, anchor.y);
                ctx.rotate(style.rotation.to_radians());
                ctx.translate(-anchor.x, -anchor.y);
            }
            if translucent {
                ctx.set_global_alpha(style.opacity);
            }
        }

        dispatch!(self, s => s.draw_body(ctx));

        if bracketed {
            ctx.restore();
        }
        Ok(())
    }

    /// Flat record of every field, including the `type` tag.
    pub fn to_persistent_form(&self) -> PropertyBag {
        let mut record = PropertyBag::new();
        record.insert("type".into(), Value::from(self.type_name()));
        let anchor = self.anchor();
        record.insert("x".into(), Value::from(anchor.x));
        record.insert("y".into(), Value::from(anchor.y));
        self.style().write_fields(&mut record);
        dispatch!(self, s => s.write_fields(&mut record));
        record
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A drawing context that records calls, for asserting draw output.

    use super::*;
    use crate::error::ContextError;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        BeginPath,
        MoveTo(f64, f64),
        LineTo(f64, f64),
        Quad(f64, f64, f64, f64),
        Bezier(f64, f64, f64, f64, f64, f64),
        Arc(f64, f64, f64),
        Ellipse(f64, f64, f64, f64),
        Rect(f64, f64, f64, f64),
        ClosePath,
        Fill,
        Stroke,
        FillRect(f64, f64, f64, f64),
        StrokeRect(f64, f64, f64, f64),
        FillColor(SerializableColor),
        StrokeColor(SerializableColor),
        LineWidth(f64),
        LineCap(crate::context::LineCap),
        LineDash(Vec<f64>),
        GlobalAlpha(f64),
        Save,
        Restore,
        Translate(f64, f64),
        Rotate(f64),
        Text(String, f64, f64),
        Image(String),
    }

    #[derive(Debug, Default)]
    pub struct RecordingContext {
        pub calls: Vec<Call>,
        /// When set, `draw_image` fails.
        pub images_unavailable: bool,
    }

    impl RecordingContext {
        pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }
    }

    impl DrawContext for RecordingContext {
        fn begin_path(&mut self) {
            self.calls.push(Call::BeginPath);
        }
        fn move_to(&mut self, x: f64, y: f64) {
            self.calls.push(Call::MoveTo(x, y));
        }
        fn line_to(&mut self, x: f64, y: f64) {
            self.calls.push(Call::LineTo(x, y));
        }
        fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
            self.calls.push(Call::Quad(cpx, cpy, x, y));
        }
        fn bezier_curve_to(&mut self, a: f64, b: f64, c: f64, d: f64, x: f64, y: f64) {
            self.calls.push(Call::Bezier(a, b, c, d, x, y));
        }
        fn arc(&mut self, x: f64, y: f64, radius: f64, _: f64, _: f64, _: bool) {
            self.calls.push(Call::Arc(x, y, radius));
        }
        fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64) {
            self.calls.push(Call::Ellipse(x, y, rx, ry));
        }
        fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
            self.calls.push(Call::Rect(x, y, w, h));
        }
        fn close_path(&mut self) {
            self.calls.push(Call::ClosePath);
        }
        fn fill(&mut self) {
            self.calls.push(Call::Fill);
        }
        fn stroke(&mut self) {
            self.calls.push(Call::Stroke);
        }
        fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
            self.calls.push(Call::FillRect(x, y, w, h));
        }
        fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
            self.calls.push(Call::StrokeRect(x, y, w, h));
        }
        fn set_fill_color(&mut self, color: Color) {
            self.calls.push(Call::FillColor(color.into()));
        }
        fn set_stroke_color(&mut self, color: Color) {
            self.calls.push(Call::StrokeColor(color.into()));
        }
        fn set_line_width(&mut self, width: f64) {
            self.calls.push(Call::LineWidth(width));
        }
        fn set_line_cap(&mut self, cap: crate::context::LineCap) {
            self.calls.push(Call::LineCap(cap));
        }
        fn set_line_dash(&mut self, dashes: &[f64]) {
            self.calls.push(Call::LineDash(dashes.to_vec()));
        }
        fn set_global_alpha(&mut self, alpha: f64) {
            self.calls.push(Call::GlobalAlpha(alpha));
        }
        fn save(&mut self) {
            self.calls.push(Call::Save);
        }
        fn restore(&mut self) {
            self.calls.push(Call::Restore);
        }
        fn translate(&mut self, x: f64, y: f64) {
            self.calls.push(Call::Translate(x, y));
        }
        fn rotate(&mut self, angle: f64) {
            self.calls.push(Call::Rotate(angle));
        }
        fn fill_text(&mut self, text: &str, x: f64, y: f64, _: &str, _: f64) {
            self.calls.push(Call::Text(text.to_string(), x, y));
        }
        fn draw_image(
            &mut self,
            source: &str,
            _: f64,
            _: f64,
            _: f64,
            _: f64,
        ) -> Result<(), ContextError> {
            if self.images_unavailable {
                return Err(ContextError::Unavailable(source.to_string()));
            }
            self.calls.push(Call::Image(source.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingContext};
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(SerializableColor::from_hex("#fff"), Some(SerializableColor::white()));
        assert_eq!(
            SerializableColor::from_hex("#11223344"),
            Some(SerializableColor::new(0x11, 0x22, 0x33, 0x44))
        );
        assert_eq!(SerializableColor::from_hex("123456"), None);
        assert_eq!(SerializableColor::from_hex("#12345"), None);
        assert_eq!(SerializableColor::from_hex("#ééé"), None);
        assert_eq!(SerializableColor::rgb(255, 0, 16).to_hex(), "#ff0010");
        assert_eq!(SerializableColor::new(0, 0, 0, 128).to_hex(), "#00000080");
    }

    #[test]
    fn test_point_to_segment_dist() {
        let d = point_to_segment_dist(Point::new(5.0, 3.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 3.0).abs() < f64::EPSILON);
        let d = point_to_segment_dist(Point::new(13.0, 4.0), Point::ZERO, Point::new(10.0, 0.0));
        assert!((d - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ensure_min_extent() {
        let r = ensure_min_extent(Rect::new(5.0, 5.0, 5.0, 20.0));
        assert!((r.width() - 1.0).abs() < f64::EPSILON);
        assert!((r.height() - 15.0).abs() < f64::EPSILON);
        assert!((r.center().x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plain_draw_has_no_bracket() {
        let shape = Shape::Circle(Circle::new(Point::new(10.0, 10.0), 5.0));
        let mut ctx = RecordingContext::default();
        shape.draw(&mut ctx).unwrap();
        assert_eq!(ctx.count(|c| matches!(c, Call::Save)), 0);
    }

    #[test]
    fn test_rotation_bracket() {
        let mut circle = Circle::new(Point::new(10.0, 20.0), 5.0);
        circle.style.rotation = 90.0;
        circle.style.opacity = 0.5;
        let shape = Shape::Circle(circle);
        let mut ctx = RecordingContext::default();
        shape.draw(&mut ctx).unwrap();

        assert_eq!(ctx.calls[0], Call::Save);
        assert_eq!(ctx.calls[1], Call::Translate(10.0, 20.0));
        assert!(matches!(
            ctx.calls[2],
            Call::Rotate(a) if (a - std::f64::consts::FRAC_PI_2).abs() < 1e-12
        ));
        assert_eq!(ctx.calls[3], Call::Translate(-10.0, -20.0));
        assert_eq!(ctx.calls[4], Call::GlobalAlpha(0.5));
        assert_eq!(ctx.calls.last(), Some(&Call::Restore));
    }

    #[test]
    fn test_non_finite_geometry_is_rejected() {
        let shape = Shape::Circle(Circle::new(Point::new(f64::NAN, 0.0), 5.0));
        let mut ctx = RecordingContext::default();
        assert!(matches!(shape.draw(&mut ctx), Err(DrawError::NonFiniteGeometry("circle"))));
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn test_geometry_beyond_single_precision_is_rejected() {
        let mut ctx = RecordingContext::default();
        let far = Shape::Rectangle(Rectangle::new(Point::new(1e40, 10.0), 10.0, 10.0));
        assert!(matches!(far.draw(&mut ctx), Err(DrawError::NonFiniteGeometry("rectangle"))));

        let mut wide = Circle::new(Point::new(50.0, 50.0), 10.0);
        wide.style.stroke_width = 1e39;
        assert!(Shape::Circle(wide).draw(&mut ctx).is_err());
        assert!(ctx.calls.is_empty());

        let near = Shape::Rectangle(Rectangle::new(Point::new(1e30, 10.0), 10.0, 10.0));
        assert!(near.draw(&mut ctx).is_ok());
    }

    #[test]
    fn test_persistent_form_has_common_fields() {
        let shape = Shape::Rectangle(Rectangle::new(Point::new(1.0, 2.0), 3.0, 4.0));
        let record = shape.to_persistent_form();
        assert_eq!(record.get("type").and_then(Value::as_str), Some("rectangle"));
        assert_eq!(record.get("fillColor").and_then(Value::as_str), Some("#000000"));
        assert_eq!(record.get("x").and_then(Value::as_f64), Some(1.0));
        assert_eq!(record.get("width").and_then(Value::as_f64), Some(3.0));
    }
}

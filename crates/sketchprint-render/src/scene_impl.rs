//! Display-list backend.
//!
//! Records what a GPU or raster painter would need: flattened paths with their
//! transform, brush and stroke style. Useful for previews and for asserting
//! render output without parsing PDF.

use crate::resource::ImageResolver;
use kurbo::{Affine, BezPath, Cap, Point, Rect, Shape as _, Stroke};
use peniko::Color;
use sketchprint_core::{ContextError, Document, DrawContext, LineCap, PathBuilder};

/// One painted item.
#[derive(Debug, Clone)]
pub enum SceneItem {
    Fill {
        path: BezPath,
        brush: Color,
        transform: Affine,
    },
    Stroke {
        path: BezPath,
        style: Stroke,
        brush: Color,
        transform: Affine,
    },
    Text {
        text: String,
        origin: Point,
        font_family: String,
        font_size: f64,
        brush: Color,
        transform: Affine,
    },
    Image {
        image: peniko::ImageData,
        rect: Rect,
        alpha: f32,
        transform: Affine,
    },
}

impl SceneItem {
    /// Bounding box in page coordinates.
    pub fn bounds(&self) -> Rect {
        match self {
            SceneItem::Fill { path, transform, .. } => (*transform * path.clone()).bounding_box(),
            SceneItem::Stroke {
                path,
                style,
                transform,
                ..
            } => {
                let pad = style.width / 2.0;
                (*transform * path.clone()).bounding_box().inflate(pad, pad)
            }
            SceneItem::Text {
                origin,
                text,
                font_size,
                transform,
                ..
            } => {
                let width = sketchprint_core::shapes::Text::estimate_width(text, *font_size);
                let rect = Rect::new(origin.x, origin.y - font_size, origin.x + width, origin.y);
                transform.transform_rect_bbox(rect)
            }
            SceneItem::Image { rect, transform, .. } => transform.transform_rect_bbox(*rect),
        }
    }
}

#[derive(Debug, Clone)]
struct State {
    fill: Color,
    stroke: Color,
    line_width: f64,
    line_cap: LineCap,
    dash: Vec<f64>,
    alpha: f32,
    transform: Affine,
}

impl Default for State {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            dash: Vec::new(),
            alpha: 1.0,
            transform: Affine::IDENTITY,
        }
    }
}

/// Drawing context that builds a [`SceneItem`] list.
pub struct SceneContext {
    items: Vec<SceneItem>,
    builder: PathBuilder,
    state: State,
    stack: Vec<State>,
    resolver: ImageResolver,
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new(ImageResolver::default())
    }
}

impl SceneContext {
    pub fn new(resolver: ImageResolver) -> Self {
        Self {
            items: Vec::new(),
            builder: PathBuilder::new(),
            state: State::default(),
            stack: Vec::new(),
            resolver,
        }
    }

    /// Draw every shape of `document`, logging and skipping failures.
    pub fn from_document(document: &Document, resolver: ImageResolver) -> Self {
        let mut scene = Self::new(resolver);
        crate::render_to_context(document, &mut scene);
        scene
    }

    pub fn items(&self) -> &[SceneItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<SceneItem> {
        self.items
    }

    /// Current save/restore nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Union of every item's bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.items.iter().map(SceneItem::bounds).reduce(|a, b| a.union(b))
    }

    fn brush(&self, color: Color) -> Color {
        color.multiply_alpha(self.state.alpha)
    }

    fn stroke_style(&self) -> Stroke {
        let cap = match self.state.line_cap {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        };
        Stroke::new(self.state.line_width)
            .with_caps(cap)
            .with_dashes(0.0, self.state.dash.iter().copied())
    }
}

impl DrawContext for SceneContext {
    fn begin_path(&mut self) {
        self.builder.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.builder.line_to(x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.builder.quad_to(cpx, cpy, x, y);
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.builder.curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64, counterclockwise: bool) {
        self.builder.arc(x, y, radius, start, end, counterclockwise);
    }

    fn ellipse(&mut self, x: f64, y: f64, radius_x: f64, radius_y: f64) {
        self.builder.ellipse(x, y, radius_x, radius_y);
    }

    fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.builder.rect(x, y, width, height);
    }

    fn close_path(&mut self) {
        self.builder.close();
    }

    fn fill(&mut self) {
        if self.builder.is_empty() {
            return;
        }
        self.items.push(SceneItem::Fill {
            path: self.builder.path().clone(),
            brush: self.brush(self.state.fill),
            transform: self.state.transform,
        });
    }

    fn stroke(&mut self) {
        if self.builder.is_empty() {
            return;
        }
        self.items.push(SceneItem::Stroke {
            path: self.builder.path().clone(),
            style: self.stroke_style(),
            brush: self.brush(self.state.stroke),
            transform: self.state.transform,
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.items.push(SceneItem::Fill {
            path: Rect::new(x, y, x + width, y + height).to_path(0.1),
            brush: self.brush(self.state.fill),
            transform: self.state.transform,
        });
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.items.push(SceneItem::Stroke {
            path: Rect::new(x, y, x + width, y + height).to_path(0.1),
            style: self.stroke_style(),
            brush: self.brush(self.state.stroke),
            transform: self.state.transform,
        });
    }

    fn set_fill_color(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    fn set_line_dash(&mut self, dashes: &[f64]) {
        self.state.dash = dashes.to_vec();
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha.clamp(0.0, 1.0) as f32;
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.state = previous;
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.transform *= Affine::translate((x, y));
    }

    fn rotate(&mut self, angle: f64) {
        self.state.transform *= Affine::rotate(angle);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_family: &str, font_size: f64) {
        self.items.push(SceneItem::Text {
            text: text.to_string(),
            origin: Point::new(x, y),
            font_family: font_family.to_string(),
            font_size,
            brush: self.brush(self.state.fill),
            transform: self.state.transform,
        });
    }

    fn draw_image(
        &mut self,
        source: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ContextError> {
        let decoded = self.resolver.resolve(source)?;
        self.items.push(SceneItem::Image {
            image: decoded.to_image_data(),
            rect: Rect::new(x, y, x + width, y + height),
            alpha: self.state.alpha,
            transform: self.state.transform,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::sample_data_url;
    use sketchprint_core::Shape;
    use sketchprint_core::shapes::{Circle, Image, Line, Rectangle};

    #[test]
    fn test_rectangle_fill_and_stroke() {
        let mut scene = SceneContext::default();
        let rect = Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), 50.0, 20.0));
        rect.draw(&mut scene).unwrap();
        assert!(matches!(scene.items()[0], SceneItem::Fill { .. }));
        assert!(matches!(scene.items()[1], SceneItem::Stroke { .. }));
        let bounds = scene.bounds().unwrap();
        assert!((bounds.x0 - 9.5).abs() < 1e-9);
        assert!((bounds.x1 - 60.5).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_and_opacity_are_scoped() {
        let mut circle = Circle::new(Point::new(50.0, 50.0), 10.0);
        circle.style.rotation = 90.0;
        circle.style.opacity = 0.5;
        let mut doc = Document::default();
        doc.append(Shape::Circle(circle));
        doc.append(Shape::Rectangle(Rectangle::new(Point::ZERO, 5.0, 5.0)));

        let scene = SceneContext::from_document(&doc, ImageResolver::default());
        assert_eq!(scene.depth(), 0);
        let SceneItem::Fill { brush, transform, .. } = &scene.items()[0] else {
            panic!("expected fill");
        };
        assert!((brush.components[3] - 0.5).abs() < 1e-6);
        assert_ne!(*transform, Affine::IDENTITY);

        // circle fill, circle stroke, then the rectangle
        let SceneItem::Fill { brush, transform, .. } = &scene.items()[2] else {
            panic!("expected fill");
        };
        assert!((brush.components[3] - 1.0).abs() < 1e-6);
        assert_eq!(*transform, Affine::IDENTITY);
    }

    #[test]
    fn test_dashed_line() {
        let mut line = Line::new(Point::ZERO, Point::new(100.0, 0.0));
        line.line_cap = LineCap::Round;
        line.line_dash = vec![4.0, 2.0];
        let mut scene = SceneContext::default();
        Shape::Line(line).draw(&mut scene).unwrap();
        let SceneItem::Stroke { style, .. } = &scene.items()[0] else {
            panic!("expected stroke");
        };
        assert_eq!(style.start_cap, Cap::Round);
        assert_eq!(style.dash_pattern.as_slice(), &[4.0, 2.0]);
    }

    #[test]
    fn test_image_and_placeholder() {
        let mut scene = SceneContext::default();
        Shape::Image(Image::new(Point::ZERO, 20.0, 10.0, sample_data_url()))
            .draw(&mut scene)
            .unwrap();
        let SceneItem::Image { image, .. } = &scene.items()[0] else {
            panic!("expected image");
        };
        assert_eq!((image.width, image.height), (2, 1));

        let mut scene = SceneContext::default();
        Shape::Image(Image::new(Point::ZERO, 20.0, 10.0, "https://example.com/a.png"))
            .draw(&mut scene)
            .unwrap();
        assert!(scene
            .items()
            .iter()
            .any(|item| matches!(item, SceneItem::Text { text, .. } if text == "IMAGE")));
    }
}

//! Shape registry: maps type tags to normalizing constructors and schemas.

use crate::error::DocumentError;
use crate::props::PropertyBag;
use crate::shapes::{
    Arrow, Circle, Ellipse, Image, Line, PathShape, Polygon, Rectangle, Shape, Star, Text, Triangle,
};
use serde::Serialize;
use serde_json::{Value, json};

/// Kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Number,
    Integer,
    Boolean,
    Text,
    Color,
    Points,
    NumberList,
    PathCommands,
}

/// Introspection metadata for one field. Never used for validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<&'static str>,
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            default: None,
            minimum: None,
            maximum: None,
            enum_values: Vec::new(),
            required: false,
        }
    }

    fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    fn one_of(mut self, values: &[&'static str]) -> Self {
        self.enum_values = values.to_vec();
        self
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Field schema of one shape type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSchema {
    #[serde(rename = "type")]
    pub shape_type: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl ShapeSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

type Constructor = fn(&PropertyBag) -> Result<Shape, DocumentError>;

struct ShapeEntry {
    tag: &'static str,
    description: &'static str,
    build: Constructor,
    fields: fn() -> Vec<FieldSpec>,
}

/// Registered shape types, in registration order.
pub struct ShapeRegistry {
    entries: Vec<ShapeEntry>,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeRegistry {
    /// Registry with every built-in shape type.
    pub fn new() -> Self {
        let mut registry = Self { entries: Vec::new() };
        registry.register(
            "rectangle",
            "Axis-aligned rectangle with optional rounded corners",
            |b| Ok(Shape::Rectangle(Rectangle::from_bag(b))),
            rectangle_fields,
        );
        registry.register(
            "circle",
            "Circle around its center",
            |b| Ok(Shape::Circle(Circle::from_bag(b))),
            circle_fields,
        );
        registry.register(
            "line",
            "Straight stroked segment",
            |b| Ok(Shape::Line(Line::from_bag(b))),
            line_fields,
        );
        registry.register(
            "triangle",
            "Triangle over three vertices",
            |b| Ok(Shape::Triangle(Triangle::from_bag(b))),
            triangle_fields,
        );
        registry.register(
            "polygon",
            "Closed polygon over a vertex list",
            |b| Ok(Shape::Polygon(Polygon::from_bag(b))),
            polygon_fields,
        );
        registry.register(
            "path",
            "Free-form path of drawing commands",
            |b| Ok(Shape::Path(PathShape::from_bag(b))),
            path_fields,
        );
        registry.register(
            "ellipse",
            "Axis-aligned ellipse around its center",
            |b| Ok(Shape::Ellipse(Ellipse::from_bag(b))),
            ellipse_fields,
        );
        registry.register(
            "arrow",
            "Block arrow from tail to tip",
            |b| Ok(Shape::Arrow(Arrow::from_bag(b))),
            arrow_fields,
        );
        registry.register(
            "star",
            "Regular star",
            |b| Ok(Shape::Star(Star::from_bag(b))),
            star_fields,
        );
        registry.register(
            "text",
            "Single line of text on a baseline",
            |b| Text::from_bag(b).map(Shape::Text),
            text_fields,
        );
        registry.register(
            "image",
            "Raster image placed into a box",
            |b| Image::from_bag(b).map(Shape::Image),
            image_fields,
        );
        registry
    }

    fn register(
        &mut self,
        tag: &'static str,
        description: &'static str,
        build: Constructor,
        fields: fn() -> Vec<FieldSpec>,
    ) {
        self.entries.retain(|e| e.tag != tag);
        self.entries.push(ShapeEntry {
            tag,
            description,
            build,
            fields,
        });
    }

    fn entry(&self, tag: &str) -> Option<&ShapeEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.entry(tag).is_some()
    }

    /// Build a shape from a loosely typed record. Numeric and color fields are
    /// normalized; only missing required content is rejected.
    pub fn create_shape(&self, tag: &str, bag: &PropertyBag) -> Result<Shape, DocumentError> {
        let entry = self
            .entry(tag)
            .ok_or_else(|| DocumentError::UnknownShapeType(tag.to_string()))?;
        (entry.build)(bag)
    }

    /// Build a shape from a flat record carrying its own `type` tag.
    pub fn create_from_record(&self, record: &PropertyBag) -> Result<Shape, DocumentError> {
        let tag = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::validation("Drawing type is required"))?;
        self.create_shape(tag, record)
    }

    pub fn supported_types(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.tag).collect()
    }

    pub fn schema(&self, tag: &str) -> Option<ShapeSchema> {
        self.entry(tag).map(|e| ShapeSchema {
            shape_type: e.tag,
            description: e.description,
            fields: (e.fields)(),
        })
    }

    pub fn all_schemas(&self) -> Vec<ShapeSchema> {
        self.entries
            .iter()
            .filter_map(|e| self.schema(e.tag))
            .collect()
    }
}

fn common_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("x", FieldKind::Number).default_value(json!(0)),
        FieldSpec::new("y", FieldKind::Number).default_value(json!(0)),
        FieldSpec::new("fillColor", FieldKind::Color).default_value(json!("#000000")),
        FieldSpec::new("strokeColor", FieldKind::Color).default_value(json!("#000000")),
        FieldSpec::new("strokeWidth", FieldKind::Number).default_value(json!(1)).min(0.0),
        FieldSpec::new("opacity", FieldKind::Number).default_value(json!(1)).min(0.0).max(1.0),
        FieldSpec::new("rotation", FieldKind::Number).default_value(json!(0)),
    ]
}

fn with_common(extra: Vec<FieldSpec>) -> Vec<FieldSpec> {
    let mut fields = common_fields();
    fields.extend(extra);
    fields
}

fn rectangle_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("width", FieldKind::Number).default_value(json!(100)).min(1.0),
        FieldSpec::new("height", FieldKind::Number).default_value(json!(100)).min(1.0),
        FieldSpec::new("cornerRadius", FieldKind::Number).default_value(json!(0)).min(0.0),
    ])
}

fn circle_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("radius", FieldKind::Number).default_value(json!(50)).min(1.0),
    ])
}

fn ellipse_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("radiusX", FieldKind::Number).default_value(json!(50)).min(1.0),
        FieldSpec::new("radiusY", FieldKind::Number).default_value(json!(30)).min(1.0),
    ])
}

fn line_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("x2", FieldKind::Number),
        FieldSpec::new("y2", FieldKind::Number),
        FieldSpec::new("lineCap", FieldKind::Text)
            .default_value(json!("butt"))
            .one_of(&["butt", "round", "square"]),
        FieldSpec::new("lineDash", FieldKind::NumberList).default_value(json!([])),
    ])
}

fn arrow_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("x2", FieldKind::Number),
        FieldSpec::new("y2", FieldKind::Number),
        FieldSpec::new("headLength", FieldKind::Number).default_value(json!(20)).min(1.0),
        FieldSpec::new("headWidth", FieldKind::Number).default_value(json!(10)).min(1.0),
        FieldSpec::new("bodyWidth", FieldKind::Number).default_value(json!(4)).min(1.0),
    ])
}

fn triangle_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("x2", FieldKind::Number),
        FieldSpec::new("y2", FieldKind::Number),
        FieldSpec::new("x3", FieldKind::Number),
        FieldSpec::new("y3", FieldKind::Number),
    ])
}

fn polygon_fields() -> Vec<FieldSpec> {
    with_common(vec![FieldSpec::new("points", FieldKind::Points).min(3.0)])
}

fn path_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("pathData", FieldKind::PathCommands)
            .default_value(json!([]))
            .one_of(&["moveTo", "lineTo", "quadraticCurveTo", "bezierCurveTo", "arc"]),
        FieldSpec::new("closed", FieldKind::Boolean).default_value(json!(false)),
        FieldSpec::new("smoothing", FieldKind::Number).default_value(json!(0)).min(0.0).max(1.0),
    ])
}

fn star_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("outerRadius", FieldKind::Number).default_value(json!(50)).min(1.0),
        FieldSpec::new("innerRadius", FieldKind::Number).default_value(json!(25)).min(1.0),
        FieldSpec::new("points", FieldKind::Integer).default_value(json!(5)).min(3.0).max(20.0),
    ])
}

fn text_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("text", FieldKind::Text).required(),
        FieldSpec::new("fontSize", FieldKind::Number).default_value(json!(16)).min(8.0).max(100.0),
        FieldSpec::new("fontFamily", FieldKind::Text).default_value(json!("Helvetica")),
    ])
}

fn image_fields() -> Vec<FieldSpec> {
    with_common(vec![
        FieldSpec::new("imagePath", FieldKind::Text).required(),
        FieldSpec::new("width", FieldKind::Number).default_value(json!(100)).min(1.0),
        FieldSpec::new("height", FieldKind::Number).default_value(json!(100)).min(1.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_types_order() {
        let registry = ShapeRegistry::new();
        assert_eq!(
            registry.supported_types(),
            vec![
                "rectangle", "circle", "line", "triangle", "polygon", "path", "ellipse", "arrow",
                "star", "text", "image"
            ]
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = ShapeRegistry::new()
            .create_shape("hexagon", &PropertyBag::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown shape type: hexagon");
    }

    #[test]
    fn test_every_type_has_a_schema() {
        let registry = ShapeRegistry::new();
        for tag in registry.supported_types() {
            let schema = registry.schema(tag).unwrap();
            assert_eq!(schema.shape_type, tag);
            assert!(schema.field("strokeWidth").is_some());
        }
        assert!(registry.schema("hexagon").is_none());
        assert_eq!(registry.all_schemas().len(), registry.supported_types().len());
    }

    #[test]
    fn test_schema_serializes() {
        let schema = ShapeRegistry::new().schema("star").unwrap();
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["type"], "star");
        let points = value["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == "points")
            .unwrap();
        assert_eq!(points["maximum"], 20.0);
        assert_eq!(points["kind"], "integer");
    }

    #[test]
    fn test_short_polygon_is_normalized() {
        let registry = ShapeRegistry::new();
        let bag = json!({ "points": [{ "x": 0, "y": 0 }, { "x": 10, "y": 10 }] });
        let shape = registry
            .create_shape("polygon", bag.as_object().unwrap())
            .unwrap();
        let Shape::Polygon(polygon) = shape else {
            panic!("expected polygon");
        };
        assert_eq!(polygon.points.len(), Polygon::MIN_POINTS);
    }

    #[test]
    fn test_create_defaults_for_every_type() {
        let registry = ShapeRegistry::new();
        let mut bag = PropertyBag::new();
        bag.insert("text".into(), Value::from("hi"));
        bag.insert("imagePath".into(), Value::from("a.png"));
        for tag in registry.supported_types() {
            let shape = registry.create_shape(tag, &bag).unwrap();
            assert_eq!(shape.type_name(), tag);
        }
    }
}

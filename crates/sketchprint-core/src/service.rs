//! Request layer: named operations over a document, exchanging JSON.
//!
//! A host (HTTP handler, script runner, CLI) owns one [`CanvasService`] and
//! calls [`CanvasService::execute`] per request. Hosts sharing a service
//! between threads wrap it in a `Mutex`.

use crate::document::{Document, ZDirection};
use crate::error::{DocumentError, DocumentResult};
use crate::optimize;
use crate::props::{self, PropertyBag};
use crate::registry::ShapeRegistry;
use crate::shapes::{SerializableColor, Shape, Text};
use kurbo::Point;
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

/// Operations understood by [`CanvasService::execute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    Get,
    Clear,
    Elements,
    Add,
    Update,
    Delete,
    Duplicate,
    Move,
    Reorder,
    HitTest,
    Stats,
    Types,
    Schema,
    ValidateText,
    TextExamples,
}

impl Operation {
    pub const ALL: [Operation; 16] = [
        Operation::Init,
        Operation::Get,
        Operation::Clear,
        Operation::Elements,
        Operation::Add,
        Operation::Update,
        Operation::Delete,
        Operation::Duplicate,
        Operation::Move,
        Operation::Reorder,
        Operation::HitTest,
        Operation::Stats,
        Operation::Types,
        Operation::Schema,
        Operation::ValidateText,
        Operation::TextExamples,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Init => "init",
            Operation::Get => "get",
            Operation::Clear => "clear",
            Operation::Elements => "elements",
            Operation::Add => "add",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Duplicate => "duplicate",
            Operation::Move => "move",
            Operation::Reorder => "reorder",
            Operation::HitTest => "hitTest",
            Operation::Stats => "stats",
            Operation::Types => "types",
            Operation::Schema => "schema",
            Operation::ValidateText => "validateText",
            Operation::TextExamples => "textExamples",
        }
    }

    /// Whether the operation can change the document.
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::Init
                | Operation::Clear
                | Operation::Add
                | Operation::Update
                | Operation::Delete
                | Operation::Duplicate
                | Operation::Move
                | Operation::Reorder
        )
    }
}

impl FromStr for Operation {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| DocumentError::validation(format!("Unknown operation: {s}")))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owns the document and the shape registry.
#[derive(Default)]
pub struct CanvasService {
    document: Document,
    registry: ShapeRegistry,
}

impl CanvasService {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            registry: ShapeRegistry::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Run the operation called `op` with its arguments.
    pub fn execute(&mut self, op: &str, args: &PropertyBag) -> DocumentResult<Value> {
        let operation: Operation = op.parse()?;
        log::debug!("Executing {}", operation);
        let result = self.run(operation, args);
        if let Err(err) = &result {
            log::warn!("Operation {} failed: {}", operation, err);
        }
        result
    }

    fn run(&mut self, op: Operation, args: &PropertyBag) -> DocumentResult<Value> {
        match op {
            Operation::Init => self.init(args),
            Operation::Get => Ok(serde_json::to_value(self.document.snapshot())?),
            Operation::Clear => {
                self.document.clear();
                Ok(json!({ "message": "Canvas cleared successfully" }))
            }
            Operation::Elements => Ok(self.elements()),
            Operation::Add => self.add(args),
            Operation::Update => self.update(args),
            Operation::Delete => self.delete(args),
            Operation::Duplicate => self.duplicate(args),
            Operation::Move => self.move_element(args),
            Operation::Reorder => self.reorder(args),
            Operation::HitTest => self.hit_test(args),
            Operation::Stats => Ok(serde_json::to_value(self.document.stats())?),
            Operation::Types => Ok(self.types()),
            Operation::Schema => self.schema(args),
            Operation::ValidateText => Ok(self.validate_text(args)),
            Operation::TextExamples => Ok(self.text_examples()),
        }
    }

    fn init(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let width = props::number(args, "width").unwrap_or(0.0).trunc();
        let height = props::number(args, "height").unwrap_or(0.0).trunc();
        let preserve = props::bool_or(args, "preserveElements", false);
        self.document.initialize(width, height, preserve)?;
        Ok(json!({
            "message": "Canvas initialized successfully",
            "canvas": self.document.snapshot(),
            "elementsPreserved": preserve && !self.document.is_empty(),
        }))
    }

    fn elements(&self) -> Value {
        let elements: Vec<PropertyBag> = self
            .document
            .shapes()
            .iter()
            .enumerate()
            .map(|(index, shape)| with_id(index, shape))
            .collect();
        json!({ "count": elements.len(), "elements": elements })
    }

    /// Generic draw: build the shape named by `type` and append it on top.
    fn add(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let mut shape = self.registry.create_from_record(args)?;
        if let Some(text) = shape.as_text_mut() {
            keep_text_on_canvas(text, self.document.width(), self.document.height());
        }
        let type_name = shape.type_name();
        let element = shape.to_persistent_form();
        let id = self.document.append(shape);
        log::info!("Added {} at index {}", type_name, id);
        Ok(json!({
            "message": format!("{type_name} added successfully"),
            "element": element,
            "id": id,
        }))
    }

    fn update(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let index = element_id(args)?;
        let mut updates = args.clone();
        updates.remove("id");
        let shape = self.document.replace(index, &updates, &self.registry)?;
        Ok(json!({
            "message": "Element updated successfully",
            "element": with_id(index, shape),
        }))
    }

    fn delete(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let index = element_id(args)?;
        let removed = self.document.remove(index)?;
        Ok(json!({
            "message": "Element deleted successfully",
            "deletedElement": with_id(index, &removed),
        }))
    }

    fn duplicate(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let index = element_id(args)?;
        let new_index = self.document.duplicate(index)?;
        let copy = self.document.get(new_index)?;
        Ok(json!({
            "message": "Element duplicated successfully",
            "element": with_id(new_index, copy),
        }))
    }

    fn move_element(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let index = element_id(args)?;
        let (Some(x), Some(y)) = (props::number(args, "x"), props::number(args, "y")) else {
            return Err(DocumentError::validation("Both x and y coordinates are required"));
        };
        let shape = self.document.move_to(index, x, y)?;
        let anchor = shape.anchor();
        Ok(json!({
            "message": "Element moved successfully",
            "element": with_id(index, shape),
            "newPosition": { "x": anchor.x, "y": anchor.y },
        }))
    }

    fn reorder(&mut self, args: &PropertyBag) -> DocumentResult<Value> {
        let index = element_id(args)?;
        let direction: ZDirection = props::string(args, "direction").unwrap_or_default().parse()?;
        let reordered = self.document.reorder(index, direction)?;
        Ok(json!({
            "message": format!("Element moved {direction} successfully"),
            "newIndex": reordered.new_index,
            "element": reordered.shape.to_persistent_form(),
        }))
    }

    fn hit_test(&self, args: &PropertyBag) -> DocumentResult<Value> {
        let (Some(x), Some(y)) = (props::number(args, "x"), props::number(args, "y")) else {
            return Err(DocumentError::validation("Both x and y coordinates are required"));
        };
        let matches: Vec<PropertyBag> = self
            .document
            .hit_test(x, y)
            .iter()
            .map(|m| with_id(m.index, m.shape))
            .collect();
        let topmost = self.document.topmost_at(x, y).map(|m| m.index);
        Ok(json!({ "count": matches.len(), "elements": matches, "topmost": topmost }))
    }

    fn types(&self) -> Value {
        let supported = self.registry.supported_types();
        json!({
            "count": supported.len(),
            "supportedTypes": supported,
            "schemas": self.registry.all_schemas(),
        })
    }

    fn schema(&self, args: &PropertyBag) -> DocumentResult<Value> {
        let tag = props::string(args, "type").unwrap_or_default();
        let schema = self
            .registry
            .schema(&tag)
            .ok_or(DocumentError::UnknownShapeType(tag))?;
        Ok(json!({ "type": schema.shape_type, "schema": schema }))
    }

    fn validate_text(&self, args: &PropertyBag) -> Value {
        let (width, height) = (self.document.width(), self.document.height());
        let content = props::string(args, "text")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "Sample Text".to_string());
        let mut original = Text::new(
            Point::new(props::number_or(args, "x", 0.0), props::number_or(args, "y", 0.0)),
            content,
        );
        original.font_size = props::positive_or(args, "fontSize", Text::DEFAULT_FONT_SIZE);
        original.style.fill_color = props::color_or(args, "fillColor", SerializableColor::black());

        let recommendations = optimize::text_position_recommendations(&original, width, height);
        let mut optimized = original.clone();
        optimize::optimize_text_element(&mut optimized, width, height);
        let preview = format!(
            "\"{}\" at ({}, {}) in {}",
            optimized.content,
            optimized.position.x,
            optimized.position.y,
            optimized.style.fill_color.to_hex()
        );
        json!({
            "original": Shape::Text(original).to_persistent_form(),
            "optimized": Shape::Text(optimized).to_persistent_form(),
            "isValid": recommendations.is_empty(),
            "recommendations": recommendations,
            "preview": preview,
        })
    }

    fn text_examples(&self) -> Value {
        let (width, height) = (self.document.width(), self.document.height());
        let examples: Vec<PropertyBag> = optimize::text_examples(width, height)
            .into_iter()
            .map(|example| {
                let mut record = Shape::Text(example.text).to_persistent_form();
                record.insert("description".into(), Value::from(example.description));
                record
            })
            .collect();
        json!({
            "examples": examples,
            "canvasSize": { "width": width, "height": height },
            "tips": [
                "Y position represents the baseline of the text",
                "Ensure text color contrasts with background",
                "Consider font size relative to canvas dimensions",
                "Leave margin space around text for better readability",
            ],
        })
    }
}

/// Flat record of a shape plus its index as `id`.
fn with_id(index: usize, shape: &Shape) -> PropertyBag {
    let mut record = shape.to_persistent_form();
    record.insert("id".into(), Value::from(index));
    record
}

fn element_id(args: &PropertyBag) -> DocumentResult<usize> {
    match props::number(args, "id") {
        Some(id) if id >= 0.0 && id.fract() == 0.0 => Ok(id as usize),
        Some(id) => Err(DocumentError::validation(format!("Invalid element id: {id}"))),
        None => Err(DocumentError::validation("Element id is required")),
    }
}

/// Nudge newly added text back onto the canvas: `x` into `[0, width - 10]`,
/// the baseline into `[font_size, height - 10]`.
fn keep_text_on_canvas(text: &mut Text, width: f64, height: f64) {
    let Point { x, y } = text.position;
    if x < 0.0 || x > width {
        text.position.x = x.min(width - 10.0).max(0.0);
    }
    if y < text.font_size || y > height {
        text.position.y = y.min(height - 10.0).max(text.font_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> PropertyBag {
        value.as_object().cloned().unwrap_or_default()
    }

    fn service_with(records: &[Value]) -> CanvasService {
        let mut service = CanvasService::default();
        for record in records {
            service.execute("add", &args(record.clone())).unwrap();
        }
        service
    }

    #[test]
    fn test_operation_names() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert!(matches!(
            "explode".parse::<Operation>(),
            Err(DocumentError::Validation(_))
        ));
        assert!(Operation::Move.is_mutation());
        assert!(!Operation::Stats.is_mutation());
    }

    #[test]
    fn test_init_validates_dimensions() {
        let mut service = CanvasService::default();
        assert!(service.execute("init", &args(json!({ "width": 0, "height": 10 }))).is_err());
        let out = service
            .execute("init", &args(json!({ "width": "1024", "height": 768 })))
            .unwrap();
        assert_eq!(out["canvas"]["width"], json!(1024.0));
        assert_eq!(out["elementsPreserved"], json!(false));
    }

    #[test]
    fn test_add_and_elements() {
        let mut service = service_with(&[json!({ "type": "rectangle", "x": 5, "y": 6 })]);
        let out = service
            .execute("add", &args(json!({ "type": "circle", "radius": 12 })))
            .unwrap();
        assert_eq!(out["id"], json!(1));
        assert_eq!(out["message"], json!("circle added successfully"));

        let listed = service.execute("elements", &PropertyBag::new()).unwrap();
        assert_eq!(listed["count"], json!(2));
        assert_eq!(listed["elements"][0]["type"], json!("rectangle"));
        assert_eq!(listed["elements"][1]["id"], json!(1));
    }

    #[test]
    fn test_add_rejects_bad_records() {
        let mut service = CanvasService::default();
        assert!(matches!(
            service.execute("add", &args(json!({ "x": 1 }))),
            Err(DocumentError::Validation(_))
        ));
        assert!(matches!(
            service.execute("add", &args(json!({ "type": "hexagon" }))),
            Err(DocumentError::UnknownShapeType(_))
        ));
        assert!(service.document().is_empty());
    }

    #[test]
    fn test_add_text_is_kept_on_canvas() {
        let mut service = CanvasService::default();
        service
            .execute(
                "add",
                &args(json!({ "type": "text", "text": "Hi", "x": 900, "y": 2, "fontSize": 20 })),
            )
            .unwrap();
        let text = service.document().get(0).unwrap().as_text().unwrap();
        assert_eq!(text.position, Point::new(790.0, 20.0));
    }

    #[test]
    fn test_update_and_delete() {
        let mut service = service_with(&[
            json!({ "type": "rectangle" }),
            json!({ "type": "text", "text": "keep" }),
        ]);
        let out = service
            .execute("update", &args(json!({ "id": 0, "fillColor": "#ff0000" })))
            .unwrap();
        assert_eq!(out["element"]["fillColor"], json!("#ff0000"));

        assert!(service.execute("update", &args(json!({ "id": 1, "text": "" }))).is_err());
        assert_eq!(service.document().get(1).unwrap().as_text().unwrap().content, "keep");

        let out = service.execute("delete", &args(json!({ "id": 0 }))).unwrap();
        assert_eq!(out["deletedElement"]["type"], json!("rectangle"));
        assert_eq!(service.document().len(), 1);
        assert!(matches!(
            service.execute("delete", &args(json!({ "id": 4 }))),
            Err(DocumentError::IndexOutOfBounds { .. })
        ));
        assert!(service.execute("delete", &args(json!({ "id": -1 }))).is_err());
    }

    #[test]
    fn test_move_duplicate_reorder() {
        let mut service = service_with(&[
            json!({ "type": "circle", "x": 100, "y": 100 }),
            json!({ "type": "rectangle" }),
        ]);
        let out = service.execute("move", &args(json!({ "id": 0, "x": 900, "y": 50 }))).unwrap();
        assert_eq!(out["newPosition"], json!({ "x": 800.0, "y": 50.0 }));
        assert!(service.execute("move", &args(json!({ "id": 0, "x": 1 }))).is_err());

        let out = service.execute("duplicate", &args(json!({ "id": 1 }))).unwrap();
        assert_eq!(out["element"]["id"], json!(2));
        assert_eq!(out["element"]["x"], json!(20.0));

        let out = service
            .execute("reorder", &args(json!({ "id": 0, "direction": "front" })))
            .unwrap();
        assert_eq!(out["newIndex"], json!(2));
        assert_eq!(out["message"], json!("Element moved front successfully"));
        assert!(service
            .execute("reorder", &args(json!({ "id": 0, "direction": "up" })))
            .is_err());
    }

    #[test]
    fn test_hit_test_and_stats() {
        let mut service = service_with(&[
            json!({ "type": "rectangle", "x": 50, "y": 50, "width": 100, "height": 100 }),
            json!({ "type": "circle", "x": 80, "y": 80, "radius": 10 }),
        ]);
        let out = service.execute("hitTest", &args(json!({ "x": 80, "y": 80 }))).unwrap();
        assert_eq!(out["count"], json!(2));
        assert_eq!(out["topmost"], json!(1));

        let stats = service.execute("stats", &PropertyBag::new()).unwrap();
        assert_eq!(stats["elementCount"], json!(2));
        assert_eq!(stats["elementTypes"]["circle"], json!(1));
    }

    #[test]
    fn test_types_and_schema() {
        let mut service = CanvasService::default();
        let out = service.execute("types", &PropertyBag::new()).unwrap();
        assert_eq!(out["count"], json!(11));
        let out = service.execute("schema", &args(json!({ "type": "star" }))).unwrap();
        assert_eq!(out["type"], json!("star"));
        assert!(matches!(
            service.execute("schema", &args(json!({ "type": "blob" }))),
            Err(DocumentError::UnknownShapeType(_))
        ));
    }

    #[test]
    fn test_validate_text() {
        let mut service = CanvasService::default();
        let out = service
            .execute("validateText", &args(json!({ "x": 10, "y": 4, "text": "Hi" })))
            .unwrap();
        assert_eq!(out["isValid"], json!(false));
        assert_eq!(out["optimized"]["y"], json!(16.0));
        assert_eq!(out["preview"], json!("\"Hi\" at (10, 16) in #000000"));

        let out = service
            .execute("validateText", &args(json!({ "x": 10, "y": 100 })))
            .unwrap();
        assert_eq!(out["isValid"], json!(true));
        assert_eq!(out["original"]["text"], json!("Sample Text"));
    }

    #[test]
    fn test_text_examples() {
        let mut service = CanvasService::default();
        let out = service.execute("textExamples", &PropertyBag::new()).unwrap();
        assert_eq!(out["examples"].as_array().map(Vec::len), Some(4));
        assert_eq!(out["examples"][0]["description"], json!("Top-left black text"));
    }

    #[test]
    fn test_get_and_clear() {
        let mut service = service_with(&[json!({ "type": "star" })]);
        let snapshot = service.execute("get", &PropertyBag::new()).unwrap();
        assert_eq!(snapshot["elements"].as_array().map(Vec::len), Some(1));
        service.execute("clear", &PropertyBag::new()).unwrap();
        assert!(service.document().is_empty());
        assert!((service.document().width() - 800.0).abs() < f64::EPSILON);
    }
}

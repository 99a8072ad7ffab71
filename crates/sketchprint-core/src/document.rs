//! Scene document: an ordered shape list over a fixed-size canvas.

use crate::error::{DocumentError, DocumentResult};
use crate::props::{self, PropertyBag};
use crate::registry::ShapeRegistry;
use crate::shapes::Shape;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Offset applied to duplicated shapes.
pub const DUPLICATE_OFFSET: Vec2 = Vec2::new(20.0, 20.0);

/// Z-order move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZDirection {
    /// Topmost position.
    Front,
    /// Bottom position.
    Back,
    /// One step up.
    Forward,
    /// One step down.
    Backward,
}

impl FromStr for ZDirection {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(ZDirection::Front),
            "back" => Ok(ZDirection::Back),
            "forward" => Ok(ZDirection::Forward),
            "backward" => Ok(ZDirection::Backward),
            other => Err(DocumentError::validation(format!(
                "Invalid direction: {other}. Use front, back, forward, or backward"
            ))),
        }
    }
}

impl fmt::Display for ZDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ZDirection::Front => "front",
            ZDirection::Back => "back",
            ZDirection::Forward => "forward",
            ZDirection::Backward => "backward",
        })
    }
}

/// Result of a z-order move.
#[derive(Debug, Clone, Copy)]
pub struct Reordered<'a> {
    pub shape: &'a Shape,
    pub new_index: usize,
}

/// A shape under a hit-test point.
#[derive(Debug, Clone, Copy)]
pub struct HitMatch<'a> {
    pub index: usize,
    pub shape: &'a Shape,
}

/// Summary counts for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub width: f64,
    pub height: f64,
    pub element_count: usize,
    pub element_types: BTreeMap<String, usize>,
}

/// Serialized document: canvas size plus one flat record per shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub elements: Vec<PropertyBag>,
}

impl DocumentSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A snapshot record that could not be turned into a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotIssue {
    pub index: usize,
    pub message: String,
}

/// The scene document.
///
/// Shape index is z-order: index 0 is painted first (bottom). Index-taking
/// operations reject out-of-range indices; they never clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    width: f64,
    height: f64,
    shapes: Vec<Shape>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            shapes: Vec::new(),
        }
    }
}

impl Document {
    pub const DEFAULT_WIDTH: f64 = 800.0;
    pub const DEFAULT_HEIGHT: f64 = 600.0;

    /// Create an empty document with the given canvas size.
    pub fn new(width: f64, height: f64) -> DocumentResult<Self> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            shapes: Vec::new(),
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Canvas area as a rect at the origin.
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Reset the canvas size. Shapes are kept only when `preserve_shapes` is set.
    pub fn initialize(
        &mut self,
        width: f64,
        height: f64,
        preserve_shapes: bool,
    ) -> DocumentResult<&Self> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        if !preserve_shapes {
            self.shapes.clear();
        }
        log::info!(
            "Canvas initialized at {}x{} ({} shapes kept)",
            width,
            height,
            self.shapes.len()
        );
        Ok(self)
    }

    /// Append a shape on top and return its index.
    pub fn append(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn get(&self, index: usize) -> DocumentResult<&Shape> {
        self.shapes.get(index).ok_or(DocumentError::IndexOutOfBounds {
            index,
            len: self.shapes.len(),
        })
    }

    fn check_index(&self, index: usize) -> DocumentResult<()> {
        if index < self.shapes.len() {
            Ok(())
        } else {
            Err(DocumentError::IndexOutOfBounds {
                index,
                len: self.shapes.len(),
            })
        }
    }

    /// Merge `fields` into the shape's flat record and rebuild it.
    ///
    /// A `type` field may switch the variant. The stored shape is only
    /// replaced if the rebuild succeeds.
    pub fn replace(
        &mut self,
        index: usize,
        fields: &PropertyBag,
        registry: &ShapeRegistry,
    ) -> DocumentResult<&Shape> {
        self.check_index(index)?;
        let mut record = self.shapes[index].to_persistent_form();
        props::merge(&mut record, fields);
        let rebuilt = registry.create_from_record(&record)?;
        self.shapes[index] = rebuilt;
        Ok(&self.shapes[index])
    }

    /// Remove and return the shape at `index`; later shapes shift down.
    pub fn remove(&mut self, index: usize) -> DocumentResult<Shape> {
        self.check_index(index)?;
        Ok(self.shapes.remove(index))
    }

    /// Move the shape at `index` in z-order.
    pub fn reorder(
        &mut self,
        index: usize,
        direction: ZDirection,
    ) -> DocumentResult<Reordered<'_>> {
        self.check_index(index)?;
        let last = self.shapes.len() - 1;
        let new_index = match direction {
            ZDirection::Front => {
                let shape = self.shapes.remove(index);
                self.shapes.push(shape);
                last
            }
            ZDirection::Back => {
                let shape = self.shapes.remove(index);
                self.shapes.insert(0, shape);
                0
            }
            ZDirection::Forward if index < last => {
                self.shapes.swap(index, index + 1);
                index + 1
            }
            ZDirection::Backward if index > 0 => {
                self.shapes.swap(index, index - 1);
                index - 1
            }
            // Already at the boundary.
            ZDirection::Forward | ZDirection::Backward => index,
        };
        Ok(Reordered {
            shape: &self.shapes[new_index],
            new_index,
        })
    }

    /// Move the shape's anchor to `(x, y)` clamped onto the canvas.
    ///
    /// Every auxiliary point moves by the same delta, so the shape keeps its
    /// form.
    pub fn move_to(&mut self, index: usize, x: f64, y: f64) -> DocumentResult<&Shape> {
        self.check_index(index)?;
        if !(x.is_finite() && y.is_finite()) {
            return Err(DocumentError::validation("Both x and y coordinates are required"));
        }
        let target = Point::new(x.clamp(0.0, self.width), y.clamp(0.0, self.height));
        let shape = &mut self.shapes[index];
        let delta = target - shape.anchor();
        shape.translate(delta);
        Ok(shape)
    }

    /// Append a copy of the shape at `index`, offset by (+20, +20), and return
    /// the new index. Every point of the copy moves, as with `move_to`; the
    /// offset is not clamped to the canvas.
    pub fn duplicate(&mut self, index: usize) -> DocumentResult<usize> {
        let mut copy = self.get(index)?.clone();
        copy.translate(DUPLICATE_OFFSET);
        Ok(self.append(copy))
    }

    /// All shapes containing the point, in ascending index order (the last
    /// match is topmost).
    pub fn hit_test(&self, x: f64, y: f64) -> Vec<HitMatch<'_>> {
        let point = Point::new(x, y);
        self.shapes
            .iter()
            .enumerate()
            .filter(|(_, shape)| shape.contains_point(point))
            .map(|(index, shape)| HitMatch { index, shape })
            .collect()
    }

    /// The topmost shape containing the point.
    pub fn topmost_at(&self, x: f64, y: f64) -> Option<HitMatch<'_>> {
        let point = Point::new(x, y);
        self.shapes
            .iter()
            .enumerate()
            .rev()
            .find(|(_, shape)| shape.contains_point(point))
            .map(|(index, shape)| HitMatch { index, shape })
    }

    /// Remove all shapes, keeping the canvas size.
    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    /// Union of all shape bounds.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    pub fn stats(&self) -> DocumentStats {
        let mut element_types = BTreeMap::new();
        for shape in &self.shapes {
            *element_types.entry(shape.type_name().to_string()).or_insert(0) += 1;
        }
        DocumentStats {
            width: self.width,
            height: self.height,
            element_count: self.shapes.len(),
            element_types,
        }
    }

    pub(crate) fn shapes_mut(&mut self) -> &mut [Shape] {
        &mut self.shapes
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            width: self.width,
            height: self.height,
            elements: self.shapes.iter().map(Shape::to_persistent_form).collect(),
        }
    }

    /// Rebuild a document from a snapshot.
    ///
    /// Records that fail to build are skipped and reported; the canvas size
    /// must be valid.
    pub fn from_snapshot(
        snapshot: &DocumentSnapshot,
        registry: &ShapeRegistry,
    ) -> DocumentResult<(Self, Vec<SnapshotIssue>)> {
        let mut document = Self::new(snapshot.width, snapshot.height)?;
        let mut issues = Vec::new();
        for (index, record) in snapshot.elements.iter().enumerate() {
            match registry.create_from_record(record) {
                Ok(shape) => {
                    document.append(shape);
                }
                Err(err) => {
                    log::warn!("Skipping snapshot element {}: {}", index, err);
                    issues.push(SnapshotIssue {
                        index,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok((document, issues))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        self.snapshot().to_json()
    }

    pub fn from_json(
        json: &str,
        registry: &ShapeRegistry,
    ) -> DocumentResult<(Self, Vec<SnapshotIssue>)> {
        let snapshot = DocumentSnapshot::from_json(json)?;
        Self::from_snapshot(&snapshot, registry)
    }
}

fn validate_dimensions(width: f64, height: f64) -> DocumentResult<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(DocumentError::validation("Valid width and height are required"))
    }
}

//! Sketchprint Core Library
//!
//! Backend-agnostic scene model for sketchprint: shapes, the ordered document,
//! the drawing protocol every output backend implements and the request layer.

pub mod context;
pub mod document;
pub mod error;
pub mod optimize;
pub mod props;
pub mod registry;
pub mod service;
pub mod shapes;

pub use context::{DrawContext, LineCap, PathBuilder};
pub use document::{
    Document, DocumentSnapshot, DocumentStats, HitMatch, Reordered, SnapshotIssue, ZDirection,
};
pub use error::{ContextError, DocumentError, DocumentResult, DrawError};
pub use props::PropertyBag;
pub use registry::{FieldKind, FieldSpec, ShapeRegistry, ShapeSchema};
pub use service::{CanvasService, Operation};
pub use shapes::{SerializableColor, Shape, ShapeStyle, ShapeTrait};

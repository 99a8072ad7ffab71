//! Sketchprint Render Library
//!
//! Turns a [`sketchprint_core::Document`] into a single-page PDF. A display-list
//! backend is also available for previews and tests.

mod pdf_impl;
mod renderer;
pub mod resource;

#[cfg(feature = "scene-backend")]
mod scene_impl;

pub use pdf_impl::{PageContent, PdfPage, PdfRenderer, StandardFont, win_ansi};
pub use renderer::{
    RenderConfig, RenderError, RenderReport, RenderResult, SkippedElement, render_document_to,
    render_document_to_vec, render_snapshot_to, render_snapshot_to_context, render_to_context,
};

#[cfg(feature = "scene-backend")]
pub use scene_impl::{SceneContext, SceneItem};

//! PDF backend: a streaming object writer and a page drawing context.
//!
//! Objects are written to the sink as soon as they are complete; only their
//! byte offsets are kept for the cross-reference table. The page content uses
//! a y-down coordinate system (flipped once at the top of the stream) so
//! canvas coordinates go through unchanged.

use crate::renderer::{RenderConfig, RenderResult};
use crate::resource::{DecodedImage, ImageResolver};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use kurbo::{PathEl, Point};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use peniko::Color;
use sketchprint_core::{ContextError, DrawContext, LineCap, PathBuilder};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{self, Write};
use std::sync::Arc;

const PDF_VERSION: &str = "1.7";
const PRODUCER: &str = "sketchprint";

/// The base-14 fonts text is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StandardFont {
    Helvetica,
    TimesRoman,
    Courier,
}

impl StandardFont {
    /// Map a CSS-like family name onto a standard font. Unknown families use
    /// Helvetica.
    pub fn for_family(family: &str) -> Self {
        let family = family.to_ascii_lowercase();
        if family.contains("courier") || family.contains("mono") {
            StandardFont::Courier
        } else if family.contains("times")
            || (family.contains("serif") && !family.contains("sans"))
        {
            StandardFont::TimesRoman
        } else {
            StandardFont::Helvetica
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::Courier => "Courier",
        }
    }

    fn resource_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "F1",
            StandardFont::TimesRoman => "F2",
            StandardFont::Courier => "F3",
        }
    }
}

/// Counts bytes passed to the inner writer, so offsets need no `Seek`.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streams a PDF document into any [`Write`] sink.
pub struct PdfRenderer<W: Write> {
    writer: CountingWriter<W>,
    offsets: BTreeMap<u32, u64>,
    max_id: u32,
    pages_id: ObjectId,
    catalog_id: ObjectId,
    info_id: ObjectId,
    page_ids: Vec<ObjectId>,
    font_ids: BTreeMap<StandardFont, ObjectId>,
    image_ids: HashMap<String, ObjectId>,
    compress: bool,
    title: Option<String>,
    author: Option<String>,
}

impl<W: Write> PdfRenderer<W> {
    /// Write the file header and reserve the document-level objects.
    pub fn new(sink: W, config: &RenderConfig) -> RenderResult<Self> {
        let mut writer = CountingWriter { inner: sink, written: 0 };
        writeln!(writer, "%PDF-{}", PDF_VERSION)?;
        writer.write_all(b"%\xE2\xE3\xCF\xD3\n")?;
        Ok(Self {
            writer,
            offsets: BTreeMap::new(),
            max_id: 3,
            pages_id: (1, 0),
            catalog_id: (2, 0),
            info_id: (3, 0),
            page_ids: Vec::new(),
            font_ids: BTreeMap::new(),
            image_ids: HashMap::new(),
            compress: config.compress,
            title: config.title.clone(),
            author: config.author.clone(),
        })
    }

    fn new_object_id(&mut self) -> ObjectId {
        self.max_id += 1;
        (self.max_id, 0)
    }

    fn write_object_at(&mut self, id: ObjectId, object: &Object) -> io::Result<()> {
        self.offsets.insert(id.0, self.writer.written);
        internal_writer::write_indirect_object(&mut self.writer, id, object)
    }

    fn add_object(&mut self, object: impl Into<Object>) -> io::Result<ObjectId> {
        let id = self.new_object_id();
        self.write_object_at(id, &object.into())?;
        Ok(id)
    }

    fn font_id(&mut self, font: StandardFont) -> io::Result<ObjectId> {
        if let Some(id) = self.font_ids.get(&font) {
            return Ok(*id);
        }
        let id = self.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        })?;
        self.font_ids.insert(font, id);
        Ok(id)
    }

    fn image_id(&mut self, source: &str, image: &DecodedImage) -> io::Result<ObjectId> {
        if let Some(id) = self.image_ids.get(source) {
            return Ok(*id);
        }
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(alpha) = &image.alpha {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(alpha)?,
            );
            let mask_id = self.add_object(mask)?;
            dict.set("SMask", mask_id);
        }
        let id = self.add_object(Stream::new(dict, deflate(&image.rgb)?))?;
        self.image_ids.insert(source.to_string(), id);
        Ok(id)
    }

    /// Write a finished page with its resources.
    pub fn add_page(&mut self, page: PageContent) -> RenderResult<()> {
        let mut fonts = Dictionary::new();
        for font in &page.fonts {
            fonts.set(font.resource_name(), self.font_id(*font)?);
        }

        let mut xobjects = Dictionary::new();
        for image in &page.images {
            xobjects.set(image.name.as_str(), self.image_id(&image.source, &image.data)?);
        }

        let mut ext_states = Dictionary::new();
        for (name, (fill_alpha, stroke_alpha)) in &page.alpha_states {
            ext_states.set(
                name.as_str(),
                dictionary! {
                    "Type" => "ExtGState",
                    "ca" => *fill_alpha,
                    "CA" => *stroke_alpha,
                },
            );
        }

        let encoded = Content {
            operations: page.operations,
        }
        .encode()?;
        let content = if self.compress {
            Stream::new(dictionary! { "Filter" => "FlateDecode" }, deflate(&encoded)?)
        } else {
            Stream::new(Dictionary::new(), encoded)
        };
        let content_id = self.add_object(content)?;

        let resources = dictionary! {
            "Font" => fonts,
            "XObject" => xobjects,
            "ExtGState" => ext_states,
        };
        let page_id = self.new_object_id();
        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(page.width), real(page.height)],
            "Contents" => content_id,
            "Resources" => resources,
        };
        self.write_object_at(page_id, &page_dict.into())?;
        self.page_ids.push(page_id);
        log::debug!("Wrote page {} ({} images)", self.page_ids.len(), page.images.len());
        Ok(())
    }

    /// Write the page tree, catalog, cross-reference table and trailer.
    ///
    /// Returns the sink and the total number of bytes written.
    pub fn finish(mut self) -> RenderResult<(W, u64)> {
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self
                .page_ids
                .iter()
                .map(|id| Object::Reference(*id))
                .collect::<Vec<Object>>(),
            "Count" => self.page_ids.len() as i64,
        };
        self.write_object_at(self.pages_id, &pages_dict.into())?;

        let catalog = dictionary! { "Type" => "Catalog", "Pages" => self.pages_id };
        self.write_object_at(self.catalog_id, &catalog.into())?;

        let mut info = dictionary! { "Producer" => text_string(PRODUCER) };
        if let Some(title) = &self.title {
            info.set("Title", text_string(title));
        }
        if let Some(author) = &self.author {
            info.set("Author", text_string(author));
        }
        self.write_object_at(self.info_id, &info.into())?;

        let xref_start = self.writer.written;
        let size = self.max_id + 1;
        internal_writer::write_xref(&mut self.writer, &self.offsets, size)?;

        let file_id = Object::String(
            uuid::Uuid::new_v4().as_bytes().to_vec(),
            StringFormat::Hexadecimal,
        );
        let trailer = dictionary! {
            "Size" => size as i64,
            "Root" => self.catalog_id,
            "Info" => self.info_id,
            "ID" => vec![file_id.clone(), file_id],
        };
        writeln!(self.writer, "trailer")?;
        internal_writer::write_dictionary(&mut self.writer, &trailer)?;
        writeln!(self.writer, "\nstartxref")?;
        writeln!(self.writer, "{}", xref_start)?;
        write!(self.writer, "%%EOF")?;
        self.writer.flush()?;

        let CountingWriter { inner, written } = self.writer;
        Ok((inner, written))
    }
}

/// An image placed on a page, named in the page resources.
struct PageImage {
    name: String,
    source: String,
    data: Arc<DecodedImage>,
}

/// A finished page, ready for [`PdfRenderer::add_page`].
pub struct PageContent {
    width: f64,
    height: f64,
    operations: Vec<Operation>,
    fonts: BTreeSet<StandardFont>,
    alpha_states: BTreeMap<String, (f32, f32)>,
    images: Vec<PageImage>,
    image_failures: usize,
}

impl PageContent {
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Images that could not be resolved and were drawn as placeholders.
    pub fn image_failures(&self) -> usize {
        self.image_failures
    }
}

/// Values already set in the PDF graphics state; `None` means unknown.
#[derive(Debug, Clone, Default, PartialEq)]
struct Applied {
    fill: Option<[u8; 3]>,
    stroke: Option<[u8; 3]>,
    line_width: Option<f64>,
    line_cap: Option<LineCap>,
    dash: Option<Vec<f64>>,
    alpha: Option<(u16, u16)>,
}

/// Canvas-level drawing state, saved and restored alongside `q`/`Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    fill: Color,
    stroke: Color,
    line_width: f64,
    line_cap: LineCap,
    dash: Vec<f64>,
    alpha: f64,
    applied: Applied,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            line_cap: LineCap::Butt,
            dash: Vec::new(),
            alpha: 1.0,
            applied: Applied::default(),
        }
    }
}

/// Drawing context that records PDF content operators for one page.
pub struct PdfPage<'a> {
    width: f64,
    height: f64,
    ops: Vec<Operation>,
    builder: PathBuilder,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    resolver: &'a mut ImageResolver,
    fonts: BTreeSet<StandardFont>,
    alpha_states: BTreeMap<String, (f32, f32)>,
    images: Vec<PageImage>,
    image_failures: usize,
}

impl<'a> PdfPage<'a> {
    /// Start a page, flipping to y-down coordinates and painting the background.
    pub fn new(
        width: f64,
        height: f64,
        config: &RenderConfig,
        resolver: &'a mut ImageResolver,
    ) -> Self {
        let mut page = Self {
            width,
            height,
            ops: Vec::new(),
            builder: PathBuilder::new(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            resolver,
            fonts: BTreeSet::new(),
            alpha_states: BTreeMap::new(),
            images: Vec::new(),
            image_failures: 0,
        };
        page.op("cm", vec![real(1.0), real(0.0), real(0.0), real(-1.0), real(0.0), real(height)]);
        page.set_fill_color(config.background.into());
        page.fill_rect(0.0, 0.0, width, height);
        page
    }

    pub fn finish(self) -> PageContent {
        PageContent {
            width: self.width,
            height: self.height,
            operations: self.ops,
            fonts: self.fonts,
            alpha_states: self.alpha_states,
            images: self.images,
            image_failures: self.image_failures,
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn sync_alpha(&mut self) {
        let fill = self.state.alpha * f64::from(self.state.fill.to_rgba8().a) / 255.0;
        let stroke = self.state.alpha * f64::from(self.state.stroke.to_rgba8().a) / 255.0;
        let key = (per_mille(fill), per_mille(stroke));
        if self.state.applied.alpha == Some(key) {
            return;
        }
        let name = format!("GS{}_{}", key.0, key.1);
        self.alpha_states
            .insert(name.clone(), (f32::from(key.0) / 1000.0, f32::from(key.1) / 1000.0));
        self.op("gs", vec![Object::Name(name.into_bytes())]);
        self.state.applied.alpha = Some(key);
    }

    fn sync_fill(&mut self) {
        let rgb = rgb_of(self.state.fill);
        if self.state.applied.fill != Some(rgb) {
            self.op("rg", color_operands(rgb));
            self.state.applied.fill = Some(rgb);
        }
        self.sync_alpha();
    }

    fn sync_stroke(&mut self) {
        let rgb = rgb_of(self.state.stroke);
        if self.state.applied.stroke != Some(rgb) {
            self.op("RG", color_operands(rgb));
            self.state.applied.stroke = Some(rgb);
        }
        if self.state.applied.line_width != Some(self.state.line_width) {
            self.op("w", vec![real(self.state.line_width)]);
            self.state.applied.line_width = Some(self.state.line_width);
        }
        if self.state.applied.line_cap != Some(self.state.line_cap) {
            let cap = match self.state.line_cap {
                LineCap::Butt => 0,
                LineCap::Round => 1,
                LineCap::Square => 2,
            };
            self.op("J", vec![Object::Integer(cap)]);
            self.state.applied.line_cap = Some(self.state.line_cap);
        }
        if self.state.applied.dash.as_ref() != Some(&self.state.dash) {
            let pattern: Vec<Object> = self.state.dash.iter().map(|d| real(*d)).collect();
            self.op("d", vec![Object::Array(pattern), Object::Integer(0)]);
            self.state.applied.dash = Some(self.state.dash.clone());
        }
        self.sync_alpha();
    }

    fn emit_path(&mut self) {
        let mut current = Point::ZERO;
        let mut start = Point::ZERO;
        let elements: Vec<PathEl> = self.builder.path().elements().to_vec();
        for el in elements {
            match el {
                PathEl::MoveTo(p) => {
                    self.op("m", vec![real(p.x), real(p.y)]);
                    current = p;
                    start = p;
                }
                PathEl::LineTo(p) => {
                    self.op("l", vec![real(p.x), real(p.y)]);
                    current = p;
                }
                PathEl::QuadTo(q, p) => {
                    // Degree elevation to a cubic.
                    let c1 = current + (q - current) * (2.0 / 3.0);
                    let c2 = p + (q - p) * (2.0 / 3.0);
                    self.op(
                        "c",
                        vec![real(c1.x), real(c1.y), real(c2.x), real(c2.y), real(p.x), real(p.y)],
                    );
                    current = p;
                }
                PathEl::CurveTo(c1, c2, p) => {
                    self.op(
                        "c",
                        vec![real(c1.x), real(c1.y), real(c2.x), real(c2.y), real(p.x), real(p.y)],
                    );
                    current = p;
                }
                PathEl::ClosePath => {
                    self.op("h", vec![]);
                    current = start;
                }
            }
        }
    }

    fn image_name(&mut self, source: &str, data: Arc<DecodedImage>) -> String {
        if let Some(existing) = self.images.iter().find(|img| img.source == source) {
            return existing.name.clone();
        }
        let name = format!("Im{}", self.images.len() + 1);
        self.images.push(PageImage {
            name: name.clone(),
            source: source.to_string(),
            data,
        });
        name
    }
}

impl DrawContext for PdfPage<'_> {
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
        self.sync_fill();
        self.emit_path();
        self.op("f", vec![]);
    }

    fn stroke(&mut self) {
        if self.builder.is_empty() {
            return;
        }
        self.sync_stroke();
        self.emit_path();
        self.op("S", vec![]);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.sync_fill();
        self.op("re", vec![real(x), real(y), real(width), real(height)]);
        self.op("f", vec![]);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.sync_stroke();
        self.op("re", vec![real(x), real(y), real(width), real(height)]);
        self.op("S", vec![]);
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
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }

    fn save(&mut self) {
        self.op("q", vec![]);
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.op("Q", vec![]);
            self.state = previous;
        }
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.op("cm", vec![real(1.0), real(0.0), real(0.0), real(1.0), real(x), real(y)]);
    }

    fn rotate(&mut self, angle: f64) {
        let (sin, cos) = angle.sin_cos();
        self.op("cm", vec![real(cos), real(sin), real(-sin), real(cos), real(0.0), real(0.0)]);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, font_family: &str, font_size: f64) {
        let font = StandardFont::for_family(font_family);
        self.fonts.insert(font);
        self.sync_fill();
        self.op("BT", vec![]);
        self.op(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(font_size)],
        );
        // The text matrix flips glyphs back upright inside the y-down page.
        self.op("Tm", vec![real(1.0), real(0.0), real(0.0), real(-1.0), real(x), real(y)]);
        self.op("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]);
        self.op("ET", vec![]);
    }

    fn draw_image(
        &mut self,
        source: &str,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<(), ContextError> {
        let data = match self.resolver.resolve(source) {
            Ok(data) => data,
            Err(err) => {
                self.image_failures += 1;
                return Err(err);
            }
        };
        let name = self.image_name(source, data);
        self.sync_alpha();
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(-height), real(x), real(y + height)],
        );
        self.op("Do", vec![Object::Name(name.into_bytes())]);
        self.op("Q", vec![]);
        Ok(())
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn per_mille(value: f64) -> u16 {
    (value.clamp(0.0, 1.0) * 1000.0).round() as u16
}

fn rgb_of(color: Color) -> [u8; 3] {
    let rgba = color.to_rgba8();
    [rgba.r, rgba.g, rgba.b]
}

fn color_operands(rgb: [u8; 3]) -> Vec<Object> {
    rgb.iter().map(|c| real(f64::from(*c) / 255.0)).collect()
}

fn text_string(text: &str) -> Object {
    Object::String(win_ansi(text), StringFormat::Literal)
}

fn deflate(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Encode text for the standard fonts' WinAnsi encoding. Characters outside
/// it become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}

mod internal_writer {
    use super::*;

    pub fn write_indirect_object(
        writer: &mut dyn Write,
        id: ObjectId,
        object: &Object,
    ) -> io::Result<()> {
        writeln!(writer, "{} {} obj", id.0, id.1)?;
        write_object(writer, object)?;
        writeln!(writer, "\nendobj")?;
        Ok(())
    }

    pub fn write_object(writer: &mut dyn Write, object: &Object) -> io::Result<()> {
        match object {
            Object::Null => writer.write_all(b"null"),
            Object::Boolean(b) => writer.write_all(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => write!(writer, "{}", i),
            Object::Real(r) => write!(writer, "{:.3}", r),
            Object::Name(n) => {
                writer.write_all(b"/")?;
                writer.write_all(n)
            }
            Object::String(s, format) => match format {
                StringFormat::Literal => {
                    writer.write_all(b"(")?;
                    for &byte in s {
                        if byte == b'(' || byte == b')' || byte == b'\\' {
                            writer.write_all(b"\\")?;
                        }
                        writer.write_all(&[byte])?;
                    }
                    writer.write_all(b")")
                }
                StringFormat::Hexadecimal => {
                    let hex: String = s.iter().map(|b| format!("{:02X}", b)).collect();
                    write!(writer, "<{}>", hex)
                }
            },
            Object::Array(arr) => {
                writer.write_all(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        writer.write_all(b" ")?;
                    }
                    write_object(writer, obj)?;
                }
                writer.write_all(b"]")
            }
            Object::Dictionary(dict) => write_dictionary(writer, dict),
            Object::Stream(stream) => {
                let mut dict = stream.dict.clone();
                dict.set("Length", stream.content.len() as i64);
                write_dictionary(writer, &dict)?;
                writer.write_all(b"\nstream\n")?;
                writer.write_all(&stream.content)?;
                writer.write_all(b"\nendstream")
            }
            Object::Reference(id) => write!(writer, "{} {} R", id.0, id.1),
        }
    }

    pub fn write_dictionary(writer: &mut dyn Write, dict: &Dictionary) -> io::Result<()> {
        writer.write_all(b"<<")?;
        let sorted_keys: BTreeMap<_, _> = dict.iter().collect();
        for (key, value) in sorted_keys {
            writer.write_all(b"/")?;
            writer.write_all(key)?;
            writer.write_all(b" ")?;
            write_object(writer, value)?;
            writer.write_all(b" ")?;
        }
        writer.write_all(b">>")
    }

    /// A single-section table covering object ids `0..size`.
    pub fn write_xref(
        writer: &mut dyn Write,
        offsets: &BTreeMap<u32, u64>,
        size: u32,
    ) -> io::Result<()> {
        writeln!(writer, "xref")?;
        writeln!(writer, "0 {}", size)?;
        writer.write_all(b"0000000000 65535 f \n")?;
        for id in 1..size {
            match offsets.get(&id) {
                Some(offset) => write!(writer, "{:010} 00000 n \n", offset)?,
                None => writer.write_all(b"0000000000 00000 f \n")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::tests::sample_data_url;

    fn operators(content: &PageContent) -> Vec<&str> {
        content.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    fn render_page(draw: impl FnOnce(&mut PdfPage<'_>)) -> PageContent {
        let mut resolver = ImageResolver::default();
        let mut page = PdfPage::new(200.0, 100.0, &RenderConfig::default(), &mut resolver);
        draw(&mut page);
        page.finish()
    }

    #[test]
    fn test_font_mapping() {
        assert_eq!(StandardFont::for_family("Helvetica"), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_family("Times New Roman"), StandardFont::TimesRoman);
        assert_eq!(StandardFont::for_family("serif"), StandardFont::TimesRoman);
        assert_eq!(StandardFont::for_family("sans-serif"), StandardFont::Helvetica);
        assert_eq!(StandardFont::for_family("Courier New"), StandardFont::Courier);
        assert_eq!(StandardFont::for_family("Comic Sans"), StandardFont::Helvetica);
    }

    #[test]
    fn test_win_ansi() {
        assert_eq!(win_ansi("Hi (é) €"), b"Hi (\xE9) \x80".to_vec());
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_page_starts_flipped_with_background() {
        let content = render_page(|_| {});
        assert_eq!(&operators(&content)[..3], &["cm", "rg", "gs"]);
        assert!(operators(&content).contains(&"re"));
    }

    #[test]
    fn test_fill_and_stroke_reuse_state() {
        let content = render_page(|page| {
            page.set_fill_color(Color::from_rgba8(255, 0, 0, 255));
            page.begin_path();
            page.rect(10.0, 10.0, 20.0, 20.0);
            page.fill();
            page.set_line_width(3.0);
            page.stroke();
            page.stroke();
        });
        let ops = operators(&content);
        assert_eq!(ops.iter().filter(|op| **op == "w").count(), 1);
        assert_eq!(ops.iter().filter(|op| **op == "S").count(), 2);
        assert_eq!(ops.iter().filter(|op| **op == "RG").count(), 1);
    }

    #[test]
    fn test_save_restore_resyncs_state() {
        let content = render_page(|page| {
            page.save();
            page.set_global_alpha(0.5);
            page.fill_rect(0.0, 0.0, 1.0, 1.0);
            page.restore();
            page.fill_rect(0.0, 0.0, 1.0, 1.0);
            page.restore();
        });
        let ops = operators(&content);
        assert_eq!(ops.iter().filter(|op| **op == "q").count(), 1);
        assert_eq!(ops.iter().filter(|op| **op == "Q").count(), 1);
        assert!(content.alpha_states.contains_key("GS500_500"));
        assert!(content.alpha_states.contains_key("GS1000_1000"));
    }

    #[test]
    fn test_quad_is_elevated() {
        let content = render_page(|page| {
            page.begin_path();
            page.move_to(0.0, 0.0);
            page.quadratic_curve_to(30.0, 0.0, 30.0, 30.0);
            page.stroke();
        });
        let curve = content
            .operations()
            .iter()
            .find(|op| op.operator == "c")
            .expect("cubic segment");
        assert!((curve.operands[0].as_float().unwrap() - 20.0).abs() < 1e-4);
        assert!((curve.operands[3].as_float().unwrap() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_text_registers_font() {
        let content = render_page(|page| {
            page.fill_text("Hello", 10.0, 20.0, "Courier", 12.0);
        });
        assert!(content.fonts.contains(&StandardFont::Courier));
        assert!(operators(&content).ends_with(&["BT", "Tf", "Tm", "Tj", "ET"]));
    }

    #[test]
    fn test_images_dedupe_and_failures() {
        let url = sample_data_url();
        let content = render_page(|page| {
            page.draw_image(&url, 0.0, 0.0, 10.0, 10.0).unwrap();
            page.draw_image(&url, 20.0, 0.0, 10.0, 10.0).unwrap();
            assert!(page.draw_image("https://example.com/x.png", 0.0, 0.0, 1.0, 1.0).is_err());
        });
        assert_eq!(content.image_count(), 1);
        assert_eq!(content.image_failures(), 1);
        assert_eq!(operators(&content).iter().filter(|op| **op == "Do").count(), 2);
    }

    #[test]
    fn test_document_structure() {
        let mut out = Vec::new();
        let mut renderer = PdfRenderer::new(&mut out, &RenderConfig::default()).unwrap();
        let content = render_page(|page| page.fill_text("x", 1.0, 10.0, "Helvetica", 10.0));
        renderer.add_page(content).unwrap();
        let (_, written) = renderer.finish().unwrap();

        assert_eq!(written, out.len() as u64);
        let text = String::from_utf8_lossy(&out);
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.ends_with("%%EOF"));
        assert!(text.contains("/BaseFont /Helvetica"));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("xref\n0 7\n"));
    }
}

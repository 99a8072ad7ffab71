//! Image resolution and decoding shared by every backend.

use sketchprint_core::ContextError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A decoded raster, split into 8-bit RGB samples and an optional alpha plane.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    /// `None` when every pixel is opaque.
    pub alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ContextError> {
        let decoded =
            ::image::load_from_memory(bytes).map_err(|e| ContextError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = (width as usize) * (height as usize);
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for px in rgba.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        let opaque = alpha.iter().all(|&a| a == u8::MAX);
        Ok(Self {
            width,
            height,
            rgb,
            alpha: (!opaque).then_some(alpha),
        })
    }

    /// Interleaved RGBA8 samples.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rgb.len() / 3 * 4);
        for (i, px) in self.rgb.chunks_exact(3).enumerate() {
            out.extend_from_slice(px);
            out.push(self.alpha.as_ref().map_or(u8::MAX, |a| a[i]));
        }
        out
    }

    /// Image data in the form the scene backend paints.
    pub fn to_image_data(&self) -> peniko::ImageData {
        peniko::ImageData {
            data: peniko::Blob::new(Arc::new(self.to_rgba())),
            format: peniko::ImageFormat::Rgba8,
            width: self.width,
            height: self.height,
            alpha_type: peniko::ImageAlphaType::Alpha,
        }
    }
}

/// Where an image reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// `data:<mime>;base64,<payload>`
    DataUrl(&'a str),
    /// `http://` or `https://`
    Remote(&'a str),
    File(&'a Path),
}

impl<'a> ImageSource<'a> {
    pub fn parse(source: &'a str) -> Self {
        let source = source.trim();
        if let Some(rest) = source.strip_prefix("data:") {
            ImageSource::DataUrl(rest)
        } else if source.starts_with("http://") || source.starts_with("https://") {
            ImageSource::Remote(source)
        } else {
            ImageSource::File(Path::new(source))
        }
    }
}

/// Resolves image references to decoded rasters, caching by reference.
///
/// Remote URLs are never fetched: they resolve to
/// [`ContextError::Unavailable`] and the shape draws its placeholder.
#[derive(Debug, Default)]
pub struct ImageResolver {
    root: Option<PathBuf>,
    cache: HashMap<String, Arc<DecodedImage>>,
}

impl ImageResolver {
    /// Relative file paths are resolved against `root` when given.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, source: &str) -> Result<Arc<DecodedImage>, ContextError> {
        if let Some(cached) = self.cache.get(source) {
            return Ok(Arc::clone(cached));
        }
        let bytes = self.read(source)?;
        let decoded = Arc::new(DecodedImage::decode(&bytes)?);
        log::debug!(
            "Decoded image {} ({}x{})",
            abbreviate(source),
            decoded.width,
            decoded.height
        );
        self.cache.insert(source.to_string(), Arc::clone(&decoded));
        Ok(decoded)
    }

    fn read(&self, source: &str) -> Result<Vec<u8>, ContextError> {
        match ImageSource::parse(source) {
            ImageSource::DataUrl(rest) => decode_data_url(rest),
            ImageSource::Remote(url) => Err(ContextError::Unavailable(format!(
                "remote image {url} is not fetched"
            ))),
            ImageSource::File(path) => {
                let path = match &self.root {
                    Some(root) if path.is_relative() => root.join(path),
                    _ => path.to_path_buf(),
                };
                std::fs::read(&path)
                    .map_err(|e| ContextError::Unavailable(format!("{}: {}", path.display(), e)))
            }
        }
    }
}

fn decode_data_url(rest: &str) -> Result<Vec<u8>, ContextError> {
    use base64::{Engine, engine::general_purpose::STANDARD};

    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ContextError::Decode("malformed data URL".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(ContextError::Decode("data URL is not base64 encoded".to_string()));
    }
    STANDARD
        .decode(payload.trim())
        .map_err(|e| ContextError::Decode(e.to_string()))
}

/// Data URLs can be huge; keep log lines short.
fn abbreviate(source: &str) -> &str {
    match source.char_indices().nth(48) {
        Some((idx, _)) => &source[..idx],
        None => source,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use base64::{Engine, engine::general_purpose::STANDARD};
    use std::io::Cursor;

    /// A 2x1 PNG: one opaque red pixel, one half-transparent blue pixel.
    pub(crate) fn sample_png() -> Vec<u8> {
        let mut img = ::image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, ::image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, ::image::Rgba([0, 0, 255, 128]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ::image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    pub(crate) fn sample_data_url() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(sample_png()))
    }

    #[test]
    fn test_parse_source() {
        assert_eq!(
            ImageSource::parse("data:image/png;base64,AAAA"),
            ImageSource::DataUrl("image/png;base64,AAAA")
        );
        assert_eq!(ImageSource::parse("https://x/y.png"), ImageSource::Remote("https://x/y.png"));
        assert_eq!(ImageSource::parse("a/b.png"), ImageSource::File(Path::new("a/b.png")));
    }

    #[test]
    fn test_decode_splits_alpha() {
        let decoded = DecodedImage::decode(&sample_png()).unwrap();
        assert_eq!((decoded.width, decoded.height), (2, 1));
        assert_eq!(decoded.rgb, vec![255, 0, 0, 0, 0, 255]);
        assert_eq!(decoded.alpha, Some(vec![255, 128]));
        assert_eq!(decoded.to_rgba(), vec![255, 0, 0, 255, 0, 0, 255, 128]);
    }

    #[test]
    fn test_resolve_data_url_and_cache() {
        let mut resolver = ImageResolver::default();
        let url = sample_data_url();
        let first = resolver.resolve(&url).unwrap();
        let second = resolver.resolve(&url).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unavailable_sources() {
        let mut resolver = ImageResolver::default();
        assert!(matches!(
            resolver.resolve("https://example.com/a.png"),
            Err(ContextError::Unavailable(_))
        ));
        assert!(matches!(
            resolver.resolve("/definitely/not/here.png"),
            Err(ContextError::Unavailable(_))
        ));
        assert!(matches!(
            resolver.resolve("data:image/png;base64,!!!"),
            Err(ContextError::Decode(_))
        ));
        assert!(matches!(
            resolver.resolve("data:text/plain,hello"),
            Err(ContextError::Decode(_))
        ));
    }

    #[test]
    fn test_resolve_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pic.png"), sample_png()).unwrap();
        let mut resolver = ImageResolver::new(Some(dir.path().to_path_buf()));
        assert_eq!(resolver.resolve("pic.png").unwrap().width, 2);
    }
}

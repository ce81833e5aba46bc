//! PDF text and page-image extraction using lopdf and pdf-extract.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PageRasterizer, PdfProcessor, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
///
/// Pages are rendered with `pdftoppm` when a renderer is set. Without one,
/// or when it fails, the image embedded in the page is used instead.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    renderer: Option<PathBuf>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            renderer: None,
        }
    }

    /// Render pages with the given `pdftoppm` executable. An empty path
    /// disables rendering.
    pub fn with_renderer(mut self, program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        self.renderer = (!program.as_os_str().is_empty()).then_some(program);
        self
    }

    /// Create an extractor and load `data` into it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("no document loaded".to_string()))
    }

    /// Every decodable image in the document, in object order.
    fn document_images(&self, doc: &Document) -> Vec<DynamicImage> {
        let images: Vec<DynamicImage> = doc
            .objects
            .values()
            .filter_map(|object| decode_image_object(doc, object))
            .collect();

        debug!("Found {} images in document", images.len());
        images
    }

    /// Rasterize one page through `pdftoppm` into a grayscale PNG.
    fn render_with_pdftoppm(&self, program: &Path, page: u32, dpi: u32) -> Result<DynamicImage> {
        let rasterize = |reason: String| PdfError::Rasterize { page, reason };

        let dir = tempfile::Builder::new()
            .prefix("guia-render-")
            .tempdir()
            .map_err(|e| rasterize(format!("cannot create temp dir: {}", e)))?;
        let input = dir.path().join("document.pdf");
        std::fs::write(&input, &self.raw_data).map_err(|e| rasterize(e.to_string()))?;
        let prefix = dir.path().join("page");

        let page_arg = page.to_string();
        let output = Command::new(program)
            .args(["-png", "-gray", "-singlefile"])
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page_arg, "-l", &page_arg])
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|e| rasterize(format!("cannot run {}: {}", program.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(rasterize(format!(
                "{} exited with {}: {}",
                program.display(),
                output.status,
                stderr.trim()
            )));
        }

        // -singlefile writes <prefix>.png
        image::open(prefix.with_extension("png")).map_err(|e| rasterize(e.to_string()))
    }

    /// The page's first embedded image, else the n-th image of the document.
    fn embedded_page_image(&self, page: u32) -> Result<DynamicImage> {
        if let Some(first) = self.extract_images(page)?.into_iter().next() {
            return Ok(first);
        }

        // Some generators hang page images off shared resources.
        let doc = self.document()?;
        let page_idx = page.saturating_sub(1) as usize;
        self.document_images(doc)
            .into_iter()
            .nth(page_idx)
            .ok_or_else(|| PdfError::Rasterize {
                page,
                reason: "no renderer and no decodable page image".to_string(),
            })
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Forms exported by some portals use an empty user password.
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        self.document()?;
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self.document()?;
        if !doc.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }
        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", page, e)))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = page_resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = decode_image_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

impl PageRasterizer for PdfExtractor {
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        if !self.document()?.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }

        if let Some(program) = &self.renderer {
            trace!("Rendering page {} at {} DPI", page, dpi);
            match self.render_with_pdftoppm(program, page, dpi) {
                Ok(image) => return Ok(image),
                Err(e) => warn!("{}; using the embedded page image", e),
            }
        }

        self.embedded_page_image(page)
    }
}

fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter_name.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    raw_to_image(&data, width, height, color_space, bits)
}

fn raw_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = width as usize * height as usize;
    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: colorspace={}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}

/// Resources dictionary for a page, following `Parent` inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    /// One page with a text line and an optional 4x2 gray image.
    pub(crate) fn sample_pdf(text: &str, with_image: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });

        let mut resources = dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        };
        if with_image {
            let image_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => 4,
                    "Height" => 2,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0, 50, 100, 150, 200, 250, 255, 10],
            ));
            resources.set("XObject", dictionary! { "Im1" => image_id });
        }
        let resources_id = doc.add_object(resources);

        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_page_text(1).is_err());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        match PdfExtractor::from_bytes(b"definitely not a pdf") {
            Err(PdfError::Parse(_)) => {}
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_page_text_and_bounds() {
        let extractor = PdfExtractor::from_bytes(&sample_pdf("Registro ANS 419010", false)).unwrap();

        assert_eq!(extractor.page_count(), 1);
        assert!(extractor.extract_page_text(1).unwrap().contains("419010"));
        assert!(matches!(extractor.extract_page_text(2), Err(PdfError::InvalidPage(2))));
    }

    #[test]
    fn test_render_page_uses_embedded_image() {
        let extractor = PdfExtractor::from_bytes(&sample_pdf("scan", true)).unwrap();
        let image = extractor.render_page(1, 300).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
    }

    #[test]
    fn test_missing_renderer_falls_back_to_embedded_image() {
        let extractor = PdfExtractor::from_bytes(&sample_pdf("scan", true))
            .unwrap()
            .with_renderer("/nonexistent/pdftoppm-guia");
        let image = extractor.render_page(1, 150).unwrap();
        assert_eq!((image.width(), image.height()), (4, 2));
    }

    #[test]
    fn test_empty_renderer_path_disables_rendering() {
        let extractor = PdfExtractor::new().with_renderer("");
        assert!(extractor.renderer.is_none());
    }

    #[test]
    fn test_render_page_out_of_range() {
        let extractor = PdfExtractor::from_bytes(&sample_pdf("scan", true)).unwrap();
        assert!(matches!(extractor.render_page(3, 300), Err(PdfError::InvalidPage(3))));
    }

    #[test]
    fn test_render_page_without_image_fails() {
        let extractor = PdfExtractor::from_bytes(&sample_pdf("text only", false)).unwrap();
        assert!(matches!(
            extractor.render_page(1, 300),
            Err(PdfError::Rasterize { page: 1, .. })
        ));
    }
}

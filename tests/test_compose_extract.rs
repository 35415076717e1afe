//! End-to-end tests: compose real images to disk, reopen the file, extract.
//!
//! Covers:
//! - One A4 page per image, in order, at full width with aspect ratio kept
//! - Annotated captions (one collapsed comment per page) and inline captions
//! - All-or-nothing saving when an image cannot be decoded

use pdf_annotator::annotation_types::{AnnotationColor, AnnotationSubtype, TextAnnotationIcon};
use pdf_annotator::composer::{compose_to_file, CaptionMode, ComposeOptions, ImageSource};
use pdf_annotator::document::PdfDocument;
use pdf_annotator::engine::NativeEngine;
use pdf_annotator::extractor::{extract_file, AnnotationKind};
use pdf_annotator::geometry::PageSize;
use pdf_annotator::writer::CaptionFont;
use pdf_annotator::Error;
use std::path::Path;

const SIZES: [(u32, u32); 5] = [(64, 48), (48, 64), (100, 10), (33, 33), (120, 90)];

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb([(x * 4) as u8, (y * 4) as u8, 128]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageOutputFormat::Jpeg(90))
        .expect("Failed to encode JPEG");
    out.into_inner()
}

fn png_with_alpha(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, _| image::Rgba([10, 20, 30, (x * 8) as u8]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("Failed to encode PNG");
    out.into_inner()
}

/// Five JPEG files on disk, in `SIZES` order.
fn write_images(dir: &Path) -> Vec<ImageSource> {
    SIZES
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let path = dir.join(format!("photo{}.jpg", i));
            std::fs::write(&path, jpeg(w, h)).expect("Failed to write image");
            ImageSource::Path(path)
        })
        .collect()
}

fn page_content(doc: &mut PdfDocument, index: usize) -> String {
    let page = doc.page(index).expect("Failed to get page");
    let contents = page.dict["Contents"].clone();
    let stream = doc.resolve(&contents).expect("Failed to resolve contents");
    String::from_utf8(stream.decode_stream_data().expect("Failed to decode contents")).expect("Content is not UTF-8")
}

/// Operands of the first `cm` operator: (width, height, x, y).
fn image_matrix(content: &str) -> (f32, f32, f32, f32) {
    let line = content
        .lines()
        .find(|l| l.ends_with(" cm"))
        .expect("No cm operator in content");
    let nums: Vec<f32> = line
        .split_whitespace()
        .filter_map(|t| t.parse().ok())
        .collect();
    assert_eq!(nums.len(), 6, "unexpected matrix line: {}", line);
    (nums[0], nums[3], nums[4], nums[5])
}

#[test]
fn test_annotated_five_pages() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let images = write_images(dir.path());
    let output = dir.path().join("annotated.pdf");

    let options = ComposeOptions::new("made in India").with_author(Some("Asha".to_string()));
    let report = compose_to_file(&mut NativeEngine::new(), &images, &options, &output).expect("Compose failed");
    assert_eq!(report.pages, 5);
    assert_eq!(report.mode, CaptionMode::Annotated);

    let mut doc = PdfDocument::open(&output).expect("Failed to reopen PDF");
    assert_eq!(doc.page_count().unwrap(), 5);
    let (page_w, page_h) = PageSize::A4.dimensions();

    for index in 0..5 {
        let page = doc.page(index).unwrap();
        let media_box = page.media_box.expect("Missing media box");
        assert!((media_box.width - page_w).abs() < 1e-2);
        assert!((media_box.height - page_h).abs() < 1e-2);

        let annots = doc.get_annotations(index).unwrap();
        assert_eq!(annots.len(), 1, "page {} should carry one comment", index + 1);
        let note = &annots[0];
        assert_eq!(note.subtype_enum, AnnotationSubtype::Text);
        assert_eq!(note.contents.as_deref(), Some("made in India"));
        assert!(!note.open);
        assert_eq!(note.icon, Some(TextAnnotationIcon::Comment));
        assert_eq!(note.color, AnnotationColor::pale_yellow());
        assert!(note.flags.is_printable());
        assert_eq!(note.title.as_deref(), Some("Asha"));
        assert!(note.modified.as_deref().unwrap().starts_with("D:"));
        assert_eq!(note.modified, note.creation_date);

        let rect = note.rect.unwrap();
        assert!((rect.left() - (page_w / 2.0 - 20.0)).abs() < 1e-2);
        assert!((rect.right() - (page_w / 2.0 + 20.0)).abs() < 1e-2);
        assert!((rect.bottom() - (page_h - 30.0)).abs() < 1e-2);
        assert!((rect.top() - (page_h - 10.0)).abs() < 1e-2);

        let content = page_content(&mut doc, index);
        assert!(!content.contains("Tj"), "annotated pages carry no inline text");
    }

    let records = extract_file(&mut NativeEngine::new(), &output).expect("Extract failed");
    assert_eq!(records.len(), 5);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.page_number, i + 1);
        assert_eq!(record.kind, AnnotationKind::PointComment);
        assert_eq!(record.content, "made in India");
        assert_eq!(record.title.as_deref(), Some("Asha"));
        assert!(record.modified_at().is_some());
    }
}

#[test]
fn test_images_fill_page_width_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path());
    let output = dir.path().join("layout.pdf");
    compose_to_file(&mut NativeEngine::new(), &images, &ComposeOptions::new("x"), &output).unwrap();

    let mut doc = PdfDocument::open(&output).unwrap();
    let (page_w, page_h) = PageSize::A4.dimensions();
    for (index, &(w, h)) in SIZES.iter().enumerate() {
        let content = page_content(&mut doc, index);
        assert!(content.contains(&format!("/Im{} Do", index + 1)));

        let (width, height, x, y) = image_matrix(&content);
        let expected_height = h as f32 * page_w / w as f32;
        assert!((width - page_w).abs() < 1e-2);
        assert!((height - expected_height).abs() < 1e-2);
        assert_eq!(x, 0.0);
        assert!((y - (page_h - expected_height - 40.0)).abs() < 1e-2);
    }
}

#[test]
fn test_inline_caption() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path());
    let output = dir.path().join("inline.pdf");
    let options = ComposeOptions::new("made in India")
        .with_mode(CaptionMode::Inline)
        .with_font(CaptionFont::HelveticaBold);
    compose_to_file(&mut NativeEngine::new(), &images, &options, &output).unwrap();

    let mut doc = PdfDocument::open(&output).unwrap();
    for index in 0..5 {
        assert!(doc.get_annotations(index).unwrap().is_empty());
        let content = page_content(&mut doc, index);
        assert!(content.contains("(made in India) Tj"));
        assert!(content.contains("/HelveticaBold 12 Tf"));
    }

    let records = extract_file(&mut NativeEngine::new(), &output).unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_undecodable_image_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut images = write_images(dir.path());
    images[3] = ImageSource::Bytes(b"\xFF\xD8\xFF\xE0 definitely not a jpeg".to_vec());
    let output = dir.path().join("never.pdf");

    let err = compose_to_file(&mut NativeEngine::new(), &images, &ComposeOptions::new("x"), &output).unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "got {:?}", err);
    assert!(!output.exists());
    assert!(!dir.path().join("never.pdf.part").exists());
}

#[test]
fn test_unwritable_output_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path());
    let output = dir.path().join("missing_dir").join("out.pdf");

    let err = compose_to_file(&mut NativeEngine::new(), &images, &ComposeOptions::new("x"), &output).unwrap_err();
    assert_eq!(err.kind(), pdf_annotator::ErrorKind::Io);
}

#[test]
fn test_unicode_caption_round_trips_as_comment() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("unicode.pdf");
    let caption = "\u{092D}\u{093E}\u{0930}\u{0924} \u{092E}\u{0947}\u{0902} \u{092C}\u{0928}\u{093E}";
    let images = vec![ImageSource::Bytes(jpeg(20, 10))];

    compose_to_file(&mut NativeEngine::new(), &images, &ComposeOptions::new(caption), &output).unwrap();
    let records = extract_file(&mut NativeEngine::new(), &output).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content, caption);
}

#[test]
fn test_transparent_png_and_uncompressed_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("png.pdf");
    let images = vec![ImageSource::Bytes(png_with_alpha(16, 8)), ImageSource::Bytes(jpeg(8, 16))];
    let options = ComposeOptions::new("c").with_compress(false);

    compose_to_file(&mut NativeEngine::new(), &images, &options, &output).unwrap();
    let bytes = std::fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/SMask"));
    // Only content streams are left uncompressed; image samples stay filtered.
    assert!(text.contains("/Im1 Do"));
    assert!(text.contains("/FlateDecode"));
    assert!(text.contains("/DCTDecode"));

    let mut doc = PdfDocument::open(&output).unwrap();
    assert_eq!(doc.page_count().unwrap(), 2);
}

#[test]
fn test_extract_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let images = write_images(dir.path());
    let output = dir.path().join("twice.pdf");
    compose_to_file(&mut NativeEngine::new(), &images, &ComposeOptions::new("again"), &output).unwrap();

    let mut engine = NativeEngine::new();
    let first = extract_file(&mut engine, &output).unwrap();
    let second = pdf_annotator::extract(&mut engine).unwrap();
    assert_eq!(first, second);
}

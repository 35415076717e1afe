//! PDF content stream builder.
//!
//! Only the operators a captioned image page needs: graphics state,
//! transformation, XObject painting, fill colour and simple text.

use crate::error::Result;
use std::io::Write;

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Set transformation matrix (cm)
    Transform(f32, f32, f32, f32, f32, f32),
    /// Paint an XObject (Do)
    PaintXObject(String),
    /// Set fill color gray (g)
    SetFillColorGray(f32),
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font resource and size (Tf)
    SetFont(String, f32),
    /// Move text position (Td)
    MoveText(f32, f32),
    /// Show already-encoded text (Tj)
    ShowText(Vec<u8>),
}

/// Builder for PDF content streams.
#[derive(Debug, Default)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    in_text_object: bool,
}

impl ContentStreamBuilder {
    /// Create a new content stream builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Operations added so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Begin a text object unless one is open.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text_object {
            self.op(ContentStreamOp::BeginText);
            self.in_text_object = true;
        }
        self
    }

    /// End the open text object, if any.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text_object {
            self.op(ContentStreamOp::EndText);
            self.in_text_object = false;
        }
        self
    }

    /// Paint image `resource_id` into the rectangle at (`x`, `y`) of the given size.
    pub fn draw_image(&mut self, resource_id: &str, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.end_text();
        self.op(ContentStreamOp::SaveState);
        self.op(ContentStreamOp::Transform(width, 0.0, 0.0, height, x, y));
        self.op(ContentStreamOp::PaintXObject(resource_id.to_string()));
        self.op(ContentStreamOp::RestoreState);
        self
    }

    /// Show `encoded` text with its baseline starting at (`x`, `y`), in black.
    pub fn text(&mut self, font_resource: &str, size: f32, encoded: &[u8], x: f32, y: f32) -> &mut Self {
        self.begin_text();
        self.op(ContentStreamOp::SetFillColorGray(0.0));
        self.op(ContentStreamOp::SetFont(font_resource.to_string(), size));
        self.op(ContentStreamOp::MoveText(x, y));
        self.op(ContentStreamOp::ShowText(encoded.to_vec()));
        self.end_text()
    }

    /// Build the content stream bytes, closing any open text object.
    pub fn build(&mut self) -> Result<Vec<u8>> {
        self.end_text();
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op)?;
            writeln!(buf)?;
        }
        Ok(buf)
    }
}

fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::Transform(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} cm", a, b, c, d, e, f)
        },
        ContentStreamOp::PaintXObject(name) => write!(w, "/{} Do", name),
        ContentStreamOp::SetFillColorGray(g) => write!(w, "{} g", g),
        ContentStreamOp::BeginText => write!(w, "BT"),
        ContentStreamOp::EndText => write!(w, "ET"),
        ContentStreamOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, size),
        ContentStreamOp::MoveText(tx, ty) => write!(w, "{} {} Td", tx, ty),
        ContentStreamOp::ShowText(text) => {
            write!(w, "(")?;
            write_escaped(w, text)?;
            write!(w, ") Tj")
        },
    }
}

fn write_escaped<W: Write>(w: &mut W, text: &[u8]) -> std::io::Result<()> {
    for &byte in text {
        match byte {
            b'(' => write!(w, "\\(")?,
            b')' => write!(w, "\\)")?,
            b'\\' => write!(w, "\\\\")?,
            b'\n' => write!(w, "\\n")?,
            b'\r' => write!(w, "\\r")?,
            _ => w.write_all(&[byte])?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_image() {
        let mut builder = ContentStreamBuilder::new();
        builder.draw_image("Im1", 0.0, 100.5, 595.0, 400.0);
        let content = String::from_utf8(builder.build().unwrap()).unwrap();
        assert_eq!(content, "q\n595 0 0 400 0 100.5 cm\n/Im1 Do\nQ\n");
    }

    #[test]
    fn test_text() {
        let mut builder = ContentStreamBuilder::new();
        builder.text("TimesBold", 12.0, b"made (in) India", 50.0, 811.0);
        let content = String::from_utf8(builder.build().unwrap()).unwrap();

        assert!(content.starts_with("BT\n0 g\n/TimesBold 12 Tf\n50 811 Td\n"));
        assert!(content.contains("(made \\(in\\) India) Tj"));
        assert!(content.ends_with("ET\n"));
    }

    #[test]
    fn test_high_bytes_pass_through() {
        let mut builder = ContentStreamBuilder::new();
        builder.text("F", 10.0, &[0xE9, 0x80], 0.0, 0.0);
        let bytes = builder.build().unwrap();
        assert!(bytes.windows(5).any(|w| w == [b'(', 0xE9, 0x80, b')', b' ']));
    }

    #[test]
    fn test_text_objects_balanced() {
        let mut builder = ContentStreamBuilder::new();
        builder.begin_text().begin_text();
        builder.draw_image("Im1", 0.0, 0.0, 1.0, 1.0);
        let ops = builder.operations();
        assert_eq!(ops.iter().filter(|op| **op == ContentStreamOp::BeginText).count(), 1);
        assert_eq!(ops.iter().filter(|op| **op == ContentStreamOp::EndText).count(), 1);
    }
}

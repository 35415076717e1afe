//! Geometric primitives in PDF user space.
//!
//! PDF coordinates have their origin at the lower-left corner of the page
//! and grow up and to the right, in points (1/72 inch).

/// A rectangle in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// X coordinate of the lower-left corner
    pub x: f32,
    /// Y coordinate of the lower-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from its lower-left corner and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annotator::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points, in any order.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_annotator::geometry::Rect;
    ///
    /// let rect = Rect::from_points(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(rect.x, 10.0);
    /// assert_eq!(rect.y, 20.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Left edge.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y
    }

    /// Top edge.
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// The `[llx lly urx ury]` form used by `/Rect` and `/MediaBox`.
    pub fn to_pdf_array(&self) -> [f32; 4] {
        [self.left(), self.bottom(), self.right(), self.top()]
    }
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum PageSize {
    /// ISO A4 (210mm x 297mm), 595.27563 x 841.8898 pt
    #[default]
    A4,
    /// US Letter (8.5" x 11")
    Letter,
    /// Custom dimensions in points
    Custom(f32, f32),
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.275_6, 841.889_8),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom(w, h) => (*w, *h),
        }
    }

    /// Width in points.
    pub fn width(&self) -> f32 {
        self.dimensions().0
    }

    /// Height in points.
    pub fn height(&self) -> f32 {
        self.dimensions().1
    }

    /// The media box of a page of this size.
    pub fn media_box(&self) -> Rect {
        let (w, h) = self.dimensions();
        Rect::new(0.0, 0.0, w, h)
    }
}

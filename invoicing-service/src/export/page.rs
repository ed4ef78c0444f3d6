//! Page sizing and mapping layout coordinates onto the PDF page.

use serde::Serialize;

use crate::render::layout::Rect;

/// A4 width.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// A4 height; shorter content still gets a full A4 page.
pub const MIN_PAGE_HEIGHT_MM: f32 = 297.0;

const MM_PER_INCH: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    /// Height the bitmap occupies once scaled to the page width.
    pub image_height_mm: f32,
}

impl PageGeometry {
    /// A single page exactly one image wide and at least A4 tall.
    pub fn for_image_height(image_height_mm: f32) -> Self {
        Self {
            width_mm: PAGE_WIDTH_MM,
            height_mm: image_height_mm.max(MIN_PAGE_HEIGHT_MM),
            image_height_mm,
        }
    }

    /// Geometry for a `px_width × px_height` bitmap, aspect ratio preserved.
    pub fn for_bitmap(px_width: u32, px_height: u32) -> Self {
        let image_height_mm = px_height as f32 * PAGE_WIDTH_MM / px_width.max(1) as f32;
        Self::for_image_height(image_height_mm)
    }

    /// DPI at which a `px_width` wide bitmap spans the page width exactly.
    pub fn image_dpi(&self, px_width: u32) -> f32 {
        px_width as f32 * MM_PER_INCH / self.width_mm
    }

    /// Distance from the page's bottom edge to the image's bottom edge. The
    /// image hangs from the top-left corner.
    pub fn image_bottom_mm(&self) -> f32 {
        self.height_mm - self.image_height_mm
    }
}

/// A rectangle on the page in millimetres, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRect {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

impl LinkRect {
    /// `(llx, lly, urx, ury)` in PDF user space, where y grows upwards.
    pub fn pdf_corners(&self, page_height_mm: f32) -> (f32, f32, f32, f32) {
        (
            self.x_mm,
            page_height_mm - self.y_mm - self.height_mm,
            self.x_mm + self.width_mm,
            page_height_mm - self.y_mm,
        )
    }
}

/// Map a box in source layout pixels to page millimetres with a single
/// uniform factor `page_width / source_width`.
pub fn map_affordance(rect: Rect, source_width: f32, page_width_mm: f32) -> LinkRect {
    let s = page_width_mm / source_width;
    LinkRect {
        x_mm: rect.x * s,
        y_mm: rect.y * s,
        width_mm: rect.width * s,
        height_mm: rect.height * s,
    }
}

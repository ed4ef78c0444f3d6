use image::{DynamicImage, RgbImage};
use printpdf::{
    Actions, BorderArray, Image, ImageTransform, LinkAnnotation, Mm, PdfDocument, Rect,
};

use super::page::{LinkRect, PageGeometry};
use super::ExportError;

/// Hyperlink to place over the bitmap.
#[derive(Debug, Clone)]
pub struct PageLink<'a> {
    pub rect: LinkRect,
    pub url: &'a str,
}

/// One page, `geometry` sized, with `bitmap` hung from the top-left corner at
/// exactly page width and an optional invisible link annotation on top.
pub fn assemble_pdf(
    title: &str,
    bitmap: RgbImage,
    geometry: &PageGeometry,
    link: Option<PageLink<'_>>,
) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(
        title,
        Mm(geometry.width_mm),
        Mm(geometry.height_mm),
        "Layer 1",
    );
    let layer = doc.get_page(page).get_layer(layer);

    let dpi = geometry.image_dpi(bitmap.width());
    let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(bitmap));
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(geometry.image_bottom_mm())),
            rotate: None,
            scale_x: None,
            scale_y: None,
            dpi: Some(dpi),
        },
    );

    if let Some(link) = link {
        let (llx, lly, urx, ury) = link.rect.pdf_corners(geometry.height_mm);
        layer.add_link_annotation(LinkAnnotation::new(
            Rect::new(Mm(llx), Mm(lly), Mm(urx), Mm(ury)),
            Some(BorderArray::Solid([0.0, 0.0, 0.0])),
            None,
            Actions::uri(link.url.to_string()),
            None,
        ));
    }

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn writes_a_single_page_with_link() {
        let bitmap = RgbImage::from_pixel(179, 280, image::Rgb([255, 255, 255]));
        let geometry = PageGeometry::for_bitmap(bitmap.width(), bitmap.height());
        let bytes = assemble_pdf(
            "Invoice INV-1",
            bitmap,
            &geometry,
            Some(PageLink {
                rect: LinkRect {
                    x_mm: 10.0,
                    y_mm: 20.0,
                    width_mm: 40.0,
                    height_mm: 4.0,
                },
                url: "https://pay.example.com/",
            }),
        )
        .unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(contains(&bytes, "/URI"));
        assert!(contains(&bytes, "https://pay.example.com/"));
        assert!(contains(&bytes, "/MediaBox"));
    }

    #[test]
    fn link_is_optional() {
        let bitmap = RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255]));
        let geometry = PageGeometry::for_bitmap(10, 10);
        let bytes = assemble_pdf("Invoice", bitmap, &geometry, None).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(!contains(&bytes, "/URI"));
    }
}

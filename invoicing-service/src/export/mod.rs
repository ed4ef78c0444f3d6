//! Rasterize-and-export: invoice → layout → bitmap → single-page PDF with
//! the "pay online" link mapped onto the page.

mod error;
pub mod page;
pub mod pdf;

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::models::Invoice;
use crate::render::assets::{resolve_all, AssetResolver, ResolvedAssets};
use crate::render::layout::{layout_invoice, DocumentLayout, RenderOptions};
use crate::render::raster::rasterize;
use crate::services::metrics;

pub use error::{ExportError, ExportNotice};
pub use page::{map_affordance, LinkRect, PageGeometry, MIN_PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use pdf::{assemble_pdf, PageLink};

/// Lowest oversampling factor that keeps small print legible.
pub const MIN_EXPORT_SCALE: f32 = 2.0;

/// Finished export ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub geometry: PageGeometry,
    pub link: Option<LinkRect>,
}

/// Which invoices currently have an export in flight.
#[derive(Debug, Clone, Default)]
pub struct ExportTracker {
    in_flight: Arc<DashMap<String, usize>>,
}

impl ExportTracker {
    pub fn begin(&self, invoice_id: &str) -> ExportGuard {
        *self.in_flight.entry(invoice_id.to_string()).or_insert(0) += 1;
        ExportGuard {
            tracker: self.clone(),
            invoice_id: invoice_id.to_string(),
        }
    }

    pub fn is_preparing(&self, invoice_id: &str) -> bool {
        self.in_flight.contains_key(invoice_id)
    }

    fn finish(&self, invoice_id: &str) {
        self.in_flight.remove_if_mut(invoice_id, |_, count| {
            *count = count.saturating_sub(1);
            *count == 0
        });
    }
}

/// Clears the "preparing" flag when dropped, on success, error or panic alike.
#[derive(Debug)]
pub struct ExportGuard {
    tracker: ExportTracker,
    invoice_id: String,
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.tracker.finish(&self.invoice_id);
    }
}

#[derive(Clone)]
pub struct Exporter {
    resolver: Arc<dyn AssetResolver>,
    options: RenderOptions,
    scale: f32,
    tracker: ExportTracker,
}

impl Exporter {
    pub fn new(resolver: Arc<dyn AssetResolver>, options: RenderOptions, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale >= MIN_EXPORT_SCALE {
            scale
        } else {
            tracing::warn!(
                requested = scale,
                using = MIN_EXPORT_SCALE,
                "Export scale below minimum, clamping"
            );
            MIN_EXPORT_SCALE
        };
        Self {
            resolver,
            options,
            scale,
            tracker: ExportTracker::default(),
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn tracker(&self) -> &ExportTracker {
        &self.tracker
    }

    pub fn layout(&self, invoice: &Invoice) -> DocumentLayout {
        layout_invoice(invoice, &self.options)
    }

    /// Export `invoice` as a PDF. The invoice is flagged as preparing for the
    /// duration of the call.
    #[tracing::instrument(skip_all, fields(invoice_id = %invoice.id))]
    pub async fn export(&self, invoice: &Invoice) -> Result<ExportArtifact, ExportError> {
        let _guard = self.tracker.begin(&invoice.id);
        let start = Instant::now();

        let result = self.run(invoice).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.outcome_label(),
        };
        metrics::record_export(outcome, start.elapsed().as_secs_f64());
        if let Ok(artifact) = &result {
            tracing::info!(
                file_name = %artifact.file_name,
                bytes = artifact.bytes.len(),
                page_height_mm = artifact.geometry.height_mm,
                "Invoice exported"
            );
        }
        result
    }

    async fn run(&self, invoice: &Invoice) -> Result<ExportArtifact, ExportError> {
        let layout = self.layout(invoice);
        let assets = resolve_all(self.resolver.as_ref(), &layout).await?;

        let title = format!("Invoice {}", invoice.invoice_number);
        let file_name = invoice.file_name();
        let scale = self.scale;

        let (bytes, geometry, link) =
            tokio::task::spawn_blocking(move || render_pdf(&layout, &assets, scale, &title))
                .await??;

        Ok(ExportArtifact {
            file_name,
            bytes,
            geometry,
            link,
        })
    }
}

/// CPU-bound part of the export: rasterize, size the page, place the link.
pub fn render_pdf(
    layout: &DocumentLayout,
    assets: &ResolvedAssets,
    scale: f32,
    title: &str,
) -> Result<(Vec<u8>, PageGeometry, Option<LinkRect>), ExportError> {
    let bitmap = rasterize(layout, assets, scale)?;
    let geometry = PageGeometry::for_bitmap(bitmap.width(), bitmap.height());

    let link = layout.pay_online_link().and_then(|node| {
        let url = node.href.as_deref().filter(|h| !h.trim().is_empty())?;
        Some(PageLink {
            rect: map_affordance(node.rect, layout.width, geometry.width_mm),
            url,
        })
    });
    let link_rect = link.as_ref().map(|l| l.rect);

    let bytes = assemble_pdf(title, bitmap, &geometry, link)?;
    Ok((bytes, geometry, link_rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Amount, InvoiceContent, LineItem};
    use crate::render::assets::MemoryAssetResolver;
    use crate::render::layout::CardIcon;

    fn invoice() -> Invoice {
        Invoice::new(
            "owner".into(),
            InvoiceContent {
                invoice_number: "INV-777".into(),
                items: vec![LineItem::new("Build".into(), Amount::from(2), Amount::parse("10.5"))],
                ..Default::default()
            },
        )
    }

    fn exporter(resolver: MemoryAssetResolver, icons: bool) -> Exporter {
        let options = RenderOptions {
            payment_url: "https://pay.example.com/".into(),
            logo_url: None,
            card_icons: if icons {
                vec![CardIcon {
                    label: "Visa".into(),
                    src: "mem://visa".into(),
                }]
            } else {
                Vec::new()
            },
        };
        Exporter::new(Arc::new(resolver), options, 2.0)
    }

    #[test]
    fn tracker_counts_overlapping_exports() {
        let tracker = ExportTracker::default();
        let first = tracker.begin("a");
        let second = tracker.begin("a");
        assert!(tracker.is_preparing("a"));
        drop(first);
        assert!(tracker.is_preparing("a"));
        drop(second);
        assert!(!tracker.is_preparing("a"));
        assert!(!tracker.is_preparing("b"));
    }

    #[test]
    fn oversized_layout_fails_with_a_dismissable_notice() {
        use axum::response::IntoResponse;

        let layout = DocumentLayout {
            width: crate::render::SOURCE_WIDTH,
            height: 30_000.0,
            nodes: Vec::new(),
        };
        let err = render_pdf(&layout, &ResolvedAssets::default(), 2.0, "Invoice").unwrap_err();
        assert_eq!(err.outcome_label(), "too_large");
        assert_eq!(
            err.into_response().status(),
            axum::http::StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn scale_is_never_below_two() {
        let e = Exporter::new(Arc::new(MemoryAssetResolver::new()), RenderOptions::default(), 1.0);
        assert_eq!(e.scale(), MIN_EXPORT_SCALE);
        let e = Exporter::new(Arc::new(MemoryAssetResolver::new()), RenderOptions::default(), 3.0);
        assert_eq!(e.scale(), 3.0);
    }

    #[tokio::test]
    async fn exports_single_page_pdf_with_mapped_link() {
        let exporter = exporter(MemoryAssetResolver::new(), false);
        let inv = invoice();
        let artifact = exporter.export(&inv).await.unwrap();

        assert_eq!(artifact.file_name, "Invoice-INV-777.pdf");
        assert!(artifact.bytes.starts_with(b"%PDF"));
        assert_eq!(artifact.geometry.width_mm, PAGE_WIDTH_MM);
        assert!(artifact.geometry.height_mm >= MIN_PAGE_HEIGHT_MM);

        let node = exporter.layout(&inv).pay_online_link().unwrap().rect;
        let s = PAGE_WIDTH_MM / crate::render::SOURCE_WIDTH;
        let link = artifact.link.unwrap();
        assert!((link.x_mm - node.x * s).abs() < 1e-4);
        assert!((link.y_mm - node.y * s).abs() < 1e-4);
        assert!((link.width_mm - node.width * s).abs() < 1e-4);
        assert!((link.height_mm - node.height * s).abs() < 1e-4);
        assert!(!exporter.tracker().is_preparing(&inv.id));
    }

    #[tokio::test]
    async fn failed_asset_aborts_and_clears_flag() {
        let exporter = exporter(MemoryAssetResolver::new(), true);
        let inv = invoice();
        let err = exporter.export(&inv).await.unwrap_err();
        assert!(matches!(err, ExportError::Asset { .. }));
        assert!(!exporter.tracker().is_preparing(&inv.id));
    }
}

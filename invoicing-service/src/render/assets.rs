//! Fetching the images a layout references, before anything is drawn.

use async_trait::async_trait;
use base64::Engine;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::time::Duration;

use super::layout::DocumentLayout;
use crate::export::ExportError;

#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>, ExportError>;
}

/// Raw bytes for every image source in a layout, keyed by source.
#[derive(Debug, Default, Clone)]
pub struct ResolvedAssets {
    bytes: HashMap<String, Vec<u8>>,
}

impl ResolvedAssets {
    pub fn insert(&mut self, src: impl Into<String>, bytes: Vec<u8>) {
        self.bytes.insert(src.into(), bytes);
    }

    pub fn get(&self, src: &str) -> Option<&[u8]> {
        self.bytes.get(src).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Fetch every asset concurrently and wait for all of them. The first failure
/// aborts the whole resolution.
pub async fn resolve_all(
    resolver: &dyn AssetResolver,
    layout: &DocumentLayout,
) -> Result<ResolvedAssets, ExportError> {
    let sources = layout.asset_sources();
    let fetched = try_join_all(sources.iter().map(|src| async move {
        let data = resolver.fetch(src).await?;
        Ok::<_, ExportError>((src.clone(), data))
    }))
    .await?;

    tracing::debug!(count = fetched.len(), "Resolved layout assets");
    Ok(ResolvedAssets {
        bytes: fetched.into_iter().collect(),
    })
}

/// Decode a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(src: &str) -> Option<Vec<u8>> {
    let rest = src.trim().strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.to_ascii_lowercase().contains(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()
}

/// Resolves `http(s)://` sources over the network and `data:` URLs inline.
#[derive(Clone)]
pub struct HttpAssetResolver {
    client: reqwest::Client,
}

impl HttpAssetResolver {
    pub fn new(timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build asset HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl AssetResolver for HttpAssetResolver {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>, ExportError> {
        if src.starts_with("data:") {
            return decode_data_url(src).ok_or_else(|| ExportError::Asset {
                src: "data URL".to_string(),
                reason: "malformed base64 data URL".to_string(),
            });
        }

        let asset_error = |reason: String| ExportError::Asset {
            src: src.to_string(),
            reason,
        };

        let response = self
            .client
            .get(src)
            .send()
            .await
            .map_err(|e| asset_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(asset_error(format!("HTTP {}", response.status())));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| asset_error(e.to_string()))?;

        tracing::debug!(src = %src, bytes = body.len(), "Fetched asset");
        Ok(body.to_vec())
    }
}

/// Serves assets from memory; unknown sources fail like a 404 would.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssetResolver {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, src: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.assets.insert(src.into(), bytes);
        self
    }
}

#[async_trait]
impl AssetResolver for MemoryAssetResolver {
    async fn fetch(&self, src: &str) -> Result<Vec<u8>, ExportError> {
        if let Some(bytes) = decode_data_url(src) {
            return Ok(bytes);
        }
        self.assets
            .get(src)
            .cloned()
            .ok_or_else(|| ExportError::Asset {
                src: src.to_string(),
                reason: "not found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Invoice, InvoiceContent};
    use crate::render::layout::{layout_invoice, CardIcon, RenderOptions};

    fn layout_with_assets() -> DocumentLayout {
        let options = RenderOptions {
            payment_url: "https://pay.example.com".into(),
            logo_url: Some("mem://logo".into()),
            card_icons: vec![CardIcon {
                label: "Visa".into(),
                src: "mem://visa".into(),
            }],
        };
        layout_invoice(&Invoice::new("o".into(), InvoiceContent::default()), &options)
    }

    #[test]
    fn decodes_base64_data_urls() {
        assert_eq!(
            decode_data_url("data:image/png;base64,aGVsbG8="),
            Some(b"hello".to_vec())
        );
        assert_eq!(decode_data_url("data:text/plain,hello"), None);
        assert_eq!(decode_data_url("https://example.com/x.png"), None);
    }

    #[tokio::test]
    async fn resolves_every_asset() {
        let resolver = MemoryAssetResolver::new()
            .with_asset("mem://logo", vec![1])
            .with_asset("mem://visa", vec![2]);
        let assets = resolve_all(&resolver, &layout_with_assets()).await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets.get("mem://visa"), Some(&[2u8][..]));
    }

    #[tokio::test]
    async fn one_missing_asset_fails_resolution() {
        let resolver = MemoryAssetResolver::new().with_asset("mem://logo", vec![1]);
        let err = resolve_all(&resolver, &layout_with_assets())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Asset { ref src, .. } if src == "mem://visa"));
    }
}

//! Invoice rendering: one layout tree, painted to HTML or rasterized.

pub mod assets;
pub mod format;
pub mod html;
pub mod layout;
pub mod raster;

pub use assets::{AssetResolver, HttpAssetResolver, MemoryAssetResolver, ResolvedAssets};
pub use format::{format_currency, format_date};
pub use layout::{layout_invoice, CardIcon, DocumentLayout, RenderOptions, SOURCE_WIDTH};

mod common;

use axum::http::{header, StatusCode};
use common::{invoice_body, TestApp, PAYMENT_URL};
use invoicing_service::render::{CardIcon, MemoryAssetResolver, RenderOptions};
use serde_json::json;
use std::io::Cursor;

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

fn png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 10, image::Rgb([20, 60, 200]));
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[tokio::test]
async fn download_returns_a_pdf_with_payment_link() {
    let app = TestApp::with_export(
        MemoryAssetResolver::new().with_asset("https://cdn.test/visa.png", png()),
        RenderOptions {
            payment_url: PAYMENT_URL.to_string(),
            card_icons: vec![CardIcon {
                label: "Visa".into(),
                src: "https://cdn.test/visa.png".into(),
            }],
            ..Default::default()
        },
    );
    let token = app.register("export@example.com").await;
    let created = app
        .create_invoice(
            &token,
            invoice_body("INV-000777", "Globex", "Sent", json!([{ "quantity": 2, "unitPrice": 10.5 }])),
        )
        .await;
    let id = created["_id"].as_str().unwrap();

    let response = app.get(&format!("/api/invoices/{}/download", id), &token).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), Some("application/pdf"));
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        Some(r#"attachment; filename="Invoice-INV-000777.pdf""#)
    );
    assert!(response.body.starts_with(b"%PDF"));
    assert!(contains(&response.body, "/MediaBox"));
    assert!(contains(&response.body, "/URI"));
    assert!(contains(&response.body, PAYMENT_URL));

    let status = app
        .get(&format!("/api/invoices/{}/export-status", id), &token)
        .await
        .json();
    assert_eq!(status["preparing"], false);
}

#[tokio::test]
async fn unreachable_asset_becomes_a_dismissable_notice() {
    let app = TestApp::with_export(
        MemoryAssetResolver::new(),
        RenderOptions {
            payment_url: PAYMENT_URL.to_string(),
            card_icons: vec![CardIcon {
                label: "Visa".into(),
                src: "https://cdn.test/missing.png".into(),
            }],
            ..Default::default()
        },
    );
    let token = app.register("broken@example.com").await;
    let created = app
        .create_invoice(&token, invoice_body("INV-9", "Globex", "Draft", json!([])))
        .await;
    let id = created["_id"].as_str().unwrap();

    let response = app.get(&format!("/api/invoices/{}/download", id), &token).await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    let body = response.json();
    assert_eq!(body["dismissable"], true);
    assert!(body["error"].as_str().unwrap().starts_with("Failed to generate PDF"));

    let status = app
        .get(&format!("/api/invoices/{}/export-status", id), &token)
        .await
        .json();
    assert_eq!(status["preparing"], false);
}

#[tokio::test]
async fn layout_exposes_the_tagged_payment_link() {
    let app = TestApp::new();
    let token = app.register("layout@example.com").await;
    let created = app
        .create_invoice(&token, invoice_body("INV-10", "Globex", "Draft", json!([])))
        .await;
    let id = created["_id"].as_str().unwrap();

    let response = app.get(&format!("/api/invoices/{}/layout", id), &token).await;
    assert_eq!(response.status, StatusCode::OK);

    let layout = response.json();
    assert_eq!(layout["width"].as_f64(), Some(896.0));
    let nodes = layout["nodes"].as_array().unwrap();
    assert!(nodes.iter().any(|n| n["href"] == PAYMENT_URL));
}

#[tokio::test]
async fn export_of_someone_elses_invoice_is_not_found() {
    let app = TestApp::new();
    let owner = app.register("owner@example.com").await;
    let other = app.register("other@example.com").await;
    let created = app
        .create_invoice(&owner, invoice_body("INV-11", "Globex", "Draft", json!([])))
        .await;
    let id = created["_id"].as_str().unwrap();

    let response = app.get(&format!("/api/invoices/{}/download", id), &other).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

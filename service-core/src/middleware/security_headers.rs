use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Routes under this prefix serve rendered HTML documents rather than JSON.
const DOCUMENT_VIEW_PREFIX: &str = "/invoices";

pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_document_view = req.uri().path().starts_with(DOCUMENT_VIEW_PREFIX);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("no-referrer"),
    );

    if is_document_view {
        // Rendered invoices carry inline styles and remote logos/card marks.
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(
                "default-src 'none'; \
                 style-src 'unsafe-inline'; \
                 img-src https: http: data:; \
                 form-action 'self'; \
                 frame-ancestors 'self'",
            ),
        );
        headers.insert(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("SAMEORIGIN"),
        );
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
        headers.insert(
            header::X_FRAME_OPTIONS,
            header::HeaderValue::from_static("DENY"),
        );
    }

    response
}

//! Swagger UI page.
//!
//! A static shell that lazily loads the Swagger UI assets from a CDN and
//! points them at the gateway's own OpenAPI document.

use axum::response::Html;

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>restgate API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => {
            SwaggerUIBundle({
                url: '/openapi.json',
                dom_id: '#swagger-ui',
                deepLinking: true,
                tryItOutEnabled: true,
            });
        };
    </script>
</body>
</html>
"#;

/// `GET /docs`
pub async fn docs_handler() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_docs_page_points_at_openapi() {
        let Html(page) = docs_handler().await;
        assert!(page.contains("/openapi.json"));
        assert!(page.contains("swagger-ui"));
    }
}

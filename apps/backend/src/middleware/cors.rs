use actix_cors::Cors;
use actix_web::http::header;

/// Build CORS middleware from the configured whitelist:
/// - Origins come from `CORS_ORIGINS` (validated at config load)
/// - Only the methods the socket upgrade and health surface use
/// - Localhost fallback when nothing is configured
pub fn cors_middleware(allowed_origins: &[String]) -> Cors {
    let effective: Vec<String> = if allowed_origins.is_empty() {
        vec![
            "http://localhost:3000".to_string(),
            "http://127.0.0.1:3000".to_string(),
        ]
    } else {
        allowed_origins.to_vec()
    };

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
        .max_age(3600);

    for origin in effective {
        cors = cors.allowed_origin(&origin);
    }

    cors
}

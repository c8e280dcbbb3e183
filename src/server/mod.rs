//! HTTP request layer
//!
//! A single resource at `/`: JSON and multipart POSTs are told apart by
//! content type, GET fetches a remote image. Every response, errors
//! included, is a `{"status", "message"}` envelope whose status matches
//! the HTTP status.

pub mod handlers;

use crate::models::ResponseJson;
use actix_multipart::form::MultipartFormConfig;
use actix_multipart::MultipartError;
use actix_web::error::InternalError;
use actix_web::guard::{self, GuardContext};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::error;

const JSON_CONTENT_TYPE: &str = "application/json";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

pub fn respond(response: ResponseJson) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(response)
}

fn content_type_contains(ctx: &GuardContext<'_>, needle: &str) -> bool {
    ctx.head()
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(needle))
}

fn form_error(err: MultipartError, _req: &HttpRequest) -> actix_web::Error {
    error!("Parse form error: {}", err);
    InternalError::from_response(err, respond(ResponseJson::new(400, "Invalid form."))).into()
}

/// Register the routes. Ingestion is expected as `web::Data<dyn IngestService>`.
pub fn configure(cfg: &mut web::ServiceConfig, max_upload_bytes: usize) {
    cfg.app_data(web::PayloadConfig::new(max_upload_bytes))
        .app_data(
            MultipartFormConfig::default()
                .total_limit(max_upload_bytes)
                .error_handler(form_error),
        )
        .service(
            web::resource("/")
                .route(
                    web::post()
                        .guard(guard::fn_guard(|ctx| {
                            content_type_contains(ctx, JSON_CONTENT_TYPE)
                        }))
                        .to(handlers::upload_json),
                )
                .route(
                    web::post()
                        .guard(guard::fn_guard(|ctx| {
                            content_type_contains(ctx, MULTIPART_CONTENT_TYPE)
                        }))
                        .to(handlers::upload_form),
                )
                .route(web::get().to(handlers::fetch_url))
                .default_service(web::to(handlers::fallback)),
        )
        .default_service(web::to(handlers::fallback));
}

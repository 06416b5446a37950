use actix_web::{
    http::header::{ContentDisposition, DispositionParam, DispositionType},
    web, HttpMessage, HttpRequest, HttpResponse, Responder,
};
use log::{debug, error, info};
use mime_guess::mime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BillingRecord, Generator};
use crate::storage::StorageError;
use crate::{AppState, ErrorResponse};

/// Route name used to build download URLs.
pub const DOWNLOAD_ROUTE: &str = "download_invoice";

/// Largest billing record body accepted by `/generate-invoice`.
pub const MAX_RECORD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateInvoiceResponse {
    pub success: bool,
    pub download_url: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// `application/json` or `application/<anything>+json`, ignoring case.
fn is_json(req: &HttpRequest) -> bool {
    let mime = req.content_type().trim().to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[utoipa::path(
    tag = "Invoice Service",
    post,
    path = "/generate-invoice",
    request_body(content = BillingRecord, content_type = "application/json"),
    responses(
        (status = 200, description = "Document generated", body = GenerateInvoiceResponse),
        (status = 400, description = "Body is not JSON", body = ErrorResponse),
        (status = 500, description = "Composition or storage failed", body = ErrorResponse)
    )
)]
pub async fn generate_invoice(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("Executing generate_invoice handler");

    if !is_json(&req) {
        error!("Rejected non-JSON payload ({})", req.content_type());
        return HttpResponse::BadRequest().json(ErrorResponse::bad_request("JSON body required"));
    }

    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            error!("Malformed JSON body: {}", e);
            return HttpResponse::BadRequest()
                .json(ErrorResponse::bad_request(&format!("Malformed JSON: {}", e)));
        }
    };

    let record = match BillingRecord::from_value(value) {
        Ok(record) => record,
        Err(e) => {
            error!("Billing record rejected: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()));
        }
    };

    debug!(
        "Composing document for '{}' with {} line items",
        record.client.name,
        record.line_items.len()
    );
    let composer = data.composer.clone();
    let document = match web::block(move || composer.generate(record)).await {
        Ok(Ok(document)) => document,
        Ok(Err(e)) => {
            error!("Document generation failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()));
        }
        Err(e) => {
            error!("Document generation task failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()));
        }
    };

    let stored = match data.artifacts.store(&document.filename, &document.pdf).await {
        Ok(stored) => stored,
        Err(e) => {
            error!("Failed to store {}: {}", document.filename, e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()));
        }
    };

    let download_url = match req.url_for(DOWNLOAD_ROUTE, [&stored.filename]) {
        Ok(url) => url.to_string(),
        Err(e) => {
            error!("Failed to build download URL: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&e.to_string()));
        }
    };

    info!(
        "Generated {} ({} bytes) at {}",
        stored.filename,
        stored.size,
        stored.path.display()
    );

    HttpResponse::Ok().json(GenerateInvoiceResponse {
        success: true,
        download_url,
        filename: stored.filename,
    })
}

#[utoipa::path(
    tag = "Invoice Service",
    get,
    path = "/download/{filename}",
    params(("filename" = String, Path, description = "Filename returned by /generate-invoice")),
    responses(
        (status = 200, description = "PDF attachment"),
        (status = 404, description = "Artifact not found", body = ErrorResponse),
        (status = 500, description = "Artifact could not be read", body = ErrorResponse)
    )
)]
pub async fn download_invoice(
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let filename = path.into_inner();
    info!("Executing download_invoice handler for filename: {}", &filename);

    match data.artifacts.open(&filename).await {
        Ok(file) => {
            debug!("Streaming {}", file.path().display());
            file.set_content_type(mime::APPLICATION_PDF)
                .set_content_disposition(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(filename)],
                })
                .into_response(&req)
        }
        Err(e @ (StorageError::NotFound(_) | StorageError::InvalidFilename(_))) => {
            error!("Artifact not found for download: {}", e);
            HttpResponse::NotFound().json(ErrorResponse::not_found(&e.to_string()))
        }
        Err(e) => {
            error!("Failed to open artifact '{}': {}", filename, e);
            HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&e.to_string()))
        }
    }
}

#[utoipa::path(
    tag = "Invoice Service",
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Configure invoice routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/generate-invoice")
            .app_data(web::PayloadConfig::new(MAX_RECORD_BYTES))
            .route(web::post().to(generate_invoice)),
    )
    .service(
            web::resource("/download/{filename}")
                .name(DOWNLOAD_ROUTE)
                .route(web::get().to(download_invoice)),
        )
        .service(web::resource("/health").route(web::get().to(health)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::header, test};

    fn request_with(content_type: &str) -> HttpRequest {
        test::TestRequest::post()
            .insert_header((header::CONTENT_TYPE, content_type))
            .to_http_request()
    }

    #[::core::prelude::v1::test]
    fn test_is_json() {
        for accepted in [
            "application/json",
            "Application/JSON",
            "application/json; charset=utf-8",
            "application/vnd.invoice+json",
            "APPLICATION/LD+JSON",
        ] {
            assert!(is_json(&request_with(accepted)), "rejected {accepted}");
        }
        for rejected in ["text/plain", "text/x+json", "image/svg+json", "application/xml"] {
            assert!(!is_json(&request_with(rejected)), "accepted {rejected}");
        }
        assert!(!is_json(&test::TestRequest::post().to_http_request()));
    }
}

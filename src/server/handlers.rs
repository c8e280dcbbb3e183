use super::respond;
use crate::ingest::{IngestService, UploadForm, UploadedFile, IMAGES_FIELD};
use crate::models::{RequestJson, ResponseJson};
use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, MultipartForm)]
pub struct ImagesForm {
    #[multipart(rename = "images")]
    images: Vec<TempFile>,
}

impl ImagesForm {
    fn into_upload_form(self) -> UploadForm {
        let mut form = UploadForm::new();
        for temp in self.images {
            let file_name = temp.file_name.unwrap_or_default();
            form.push(IMAGES_FIELD, UploadedFile::from_temp_file(file_name, temp.file));
        }
        form
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchQuery {
    url: Option<String>,
}

/// POST / with a JSON body of base64 images.
pub async fn upload_json(ingest: web::Data<dyn IngestService>, body: web::Bytes) -> HttpResponse {
    if body.is_empty() {
        return respond(ResponseJson::new(400, "Please send a request body."));
    }

    let request: RequestJson = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            error!("JSON parse error: {}", e);
            return respond(ResponseJson::new(400, "Invalid JSON."));
        }
    };

    info!("Received {} base64 image(s)", request.images.len());

    // Decode every image even if the client goes away halfway through.
    let ingest = ingest.into_inner();
    let all_decoded = actix_web::rt::spawn(async move {
        let mut all_decoded = true;
        for image in &request.images {
            all_decoded &= ingest.decode_from_base64(&image.base64, &image.format).await;
        }
        all_decoded
    })
    .await
    .unwrap_or_else(|e| {
        error!("Base64 upload task failed: {}", e);
        false
    });

    if all_decoded {
        respond(ResponseJson::success())
    } else {
        respond(ResponseJson::new(200, "Decode impossible"))
    }
}

/// POST / with a multipart form of `images` file parts.
pub async fn upload_form(
    ingest: web::Data<dyn IngestService>,
    MultipartForm(form): MultipartForm<ImagesForm>,
) -> HttpResponse {
    let upload = form.into_upload_form();
    info!("Received {} uploaded image(s)", upload.len());

    let (all_succeeded, failed) = ingest.consume_multipart(upload).await;
    if all_succeeded {
        respond(ResponseJson::success())
    } else {
        respond(ResponseJson::new(
            200,
            format!("Images with errors: {}", failed.join(", ")),
        ))
    }
}

/// GET /?url=... to fetch a remote image.
pub async fn fetch_url(
    ingest: web::Data<dyn IngestService>,
    query: web::Query<FetchQuery>,
) -> HttpResponse {
    let Some(url) = query.url.as_deref().filter(|url| !url.is_empty()) else {
        return respond(ResponseJson::new(400, "Parameter missed."));
    };

    if ingest.fetch_from_url(url).await {
        respond(ResponseJson::success())
    } else {
        respond(ResponseJson::new(200, format!("Can't load by url: {}", url)))
    }
}

/// Anything the routes above did not match.
pub async fn fallback(req: HttpRequest) -> HttpResponse {
    if *req.method() != Method::GET && *req.method() != Method::POST {
        respond(ResponseJson::new(405, "Not allowed."))
    } else if req.path() != "/" {
        respond(ResponseJson::new(404, "Not found."))
    } else {
        respond(ResponseJson::new(400, "Invalid Content-Type."))
    }
}

use actix_cors::Cors;
use actix_multipart::{Multipart, MultipartError};
use actix_web::{http::header, web, HttpResponse};
use futures_util::StreamExt;

use crate::error::PredictError;
use crate::models::PredictionResponse;
use crate::state::AppState;

/// Name of the form field carrying the image.
pub const FILE_FIELD: &str = "file";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)));
}

pub fn cors(allowed_origin: &str) -> Cors {
    Cors::default()
        .allowed_origin(allowed_origin)
        .allowed_methods(vec!["POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600)
}

pub async fn predict(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let bytes = read_upload(payload, state.max_upload_bytes).await?;

    let prediction = web::block(move || state.classify(&bytes))
        .await
        .map_err(|_| PredictError::Blocking)??;

    Ok(HttpResponse::Ok().json(PredictionResponse { prediction }))
}

/// Pulls the bytes of the `file` part out of the form, skipping anything else.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Vec<u8>, PredictError> {
    let mut seen_part = false;
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| reject_multipart(e, seen_part))?;
        seen_part = true;

        let disposition = field.content_disposition();
        let is_file_field = disposition.get_name() == Some(FILE_FIELD);
        let filename = disposition.get_filename().map(str::to_owned);

        // A part without a filename is a plain form value, not an upload.
        let filename = match filename {
            Some(filename) if is_file_field => filename,
            _ => {
                drain(&mut field).await?;
                continue;
            }
        };
        if filename.is_empty() {
            return Err(PredictError::EmptyFilename);
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| reject_multipart(e, true))?;
            if data.len() + chunk.len() > limit {
                return Err(PredictError::TooLarge(limit));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(data);
    }

    Err(PredictError::MissingFile)
}

async fn drain(field: &mut actix_multipart::Field) -> Result<(), PredictError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| reject_multipart(e, true))?;
    }
    Ok(())
}

fn reject_multipart(err: MultipartError, seen_part: bool) -> PredictError {
    match err {
        // Not a multipart request at all, so there is no file in it.
        MultipartError::NoContentType | MultipartError::ParseContentType | MultipartError::Boundary => {
            PredictError::MissingFile
        }
        // A form that ends before its first part carries no file either.
        MultipartError::Incomplete if !seen_part => PredictError::MissingFile,
        other => PredictError::Multipart(other.to_string()),
    }
}

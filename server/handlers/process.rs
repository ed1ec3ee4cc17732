use std::io::{Cursor, Read};

use log::{error, info};
use serde::Serialize;
use tiny_http::{Request, Response};

use ferrite_dip::output_filename;
use ferrite_dip::transform::process_bytes;

use crate::error::ApiError;
use crate::routes::json_response;
use crate::state::AppState;
use crate::util::multipart::{extract_boundary, find_file, parse_parts};

const NO_IMAGE: &str = "No image provided";
const PROCESS_FAILED: &str = "Error processing image";
const PROCESSED: &str = "Image processed and saved successfully";

/// Form field the upload must arrive in.
const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize, PartialEq)]
pub struct ProcessedBody {
    pub message: &'static str,
    pub image_path: String,
}

// ---------------------------------------------------------------------------
// POST /processImage
// ---------------------------------------------------------------------------

pub fn handle(request: &mut Request, state: &AppState) -> Response<Cursor<Vec<u8>>> {
    let content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let result = read_body(request, state.max_upload_bytes)
        .and_then(|body| process_upload(state, &content_type, &body));

    match result {
        Ok(body) => json_response(200, &body),
        Err(e) => e.into_response(),
    }
}

/// Reads the request body, refusing anything over `limit` bytes.
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>, ApiError> {
    if request.body_length().is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    read_limited(request.as_reader(), limit)
}

fn read_limited(reader: &mut dyn Read, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| ApiError::processing(PROCESS_FAILED, e))?;
    if body.len() > limit {
        return Err(ApiError::PayloadTooLarge { limit });
    }
    Ok(body)
}

/// Extracts the `image` file part, transforms it and stores the PNG under
/// `{stem}-output.png`. Nothing is written unless the transform succeeds.
pub fn process_upload(state: &AppState, content_type: &str, body: &[u8]) -> Result<ProcessedBody, ApiError> {
    let boundary = extract_boundary(content_type).ok_or(ApiError::Validation(NO_IMAGE))?;
    let parts = parse_parts(body, &boundary);
    let upload = find_file(&parts, IMAGE_FIELD).ok_or(ApiError::Validation(NO_IMAGE))?;
    let filename = upload.filename.as_deref().unwrap_or_default();
    let key = output_filename(filename).ok_or(ApiError::Validation(NO_IMAGE))?;

    let png = process_bytes(state.transform.as_ref(), upload.data).map_err(|e| {
        error!("Processing {:?} with {} failed: {}", filename, state.transform.name(), e);
        ApiError::processing(PROCESS_FAILED, e)
    })?;

    state.store.put(&key, &png).map_err(|e| {
        error!("Saving {} failed: {}", key, e);
        ApiError::processing(PROCESS_FAILED, e)
    })?;

    info!("Processed {:?} -> {} ({} bytes)", filename, key, png.len());
    Ok(ProcessedBody { message: PROCESSED, image_path: key })
}

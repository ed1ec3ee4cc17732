use std::io::Cursor;

use log::{debug, error};
use tiny_http::Response;

use ferrite_dip::{output_filename, StoreError};

use crate::error::ApiError;
use crate::routes::png_response;
use crate::state::AppState;
use crate::util::form::{parse_query, query_get};

const NAME_REQUIRED: &str = "Image name is required";
const NOT_FOUND: &str = "No processed image found";
const RETRIEVE_FAILED: &str = "Error retrieving image";

// ---------------------------------------------------------------------------
// GET /getProcessedImage?imageName=NAME
// ---------------------------------------------------------------------------

pub fn handle(query: &str, state: &AppState) -> Response<Cursor<Vec<u8>>> {
    match lookup(state, query) {
        Ok(bytes) => png_response(bytes),
        Err(e) => e.into_response(),
    }
}

/// Resolves `imageName` to its stored `{stem}-output.png` and returns the
/// file's bytes unchanged.
pub fn lookup(state: &AppState, query: &str) -> Result<Vec<u8>, ApiError> {
    let pairs = parse_query(query);
    let name = query_get(&pairs, "imageName")
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::Validation(NAME_REQUIRED))?;
    let key = output_filename(name).ok_or(ApiError::NotFound(NOT_FOUND))?;
    debug!("Looking up {} for {:?}", key, name);

    match state.store.get(&key) {
        Ok(Some(bytes)) => Ok(bytes),
        Ok(None) | Err(StoreError::InvalidKey(_)) => Err(ApiError::NotFound(NOT_FOUND)),
        Err(e) => {
            error!("Reading {} failed: {}", key, e);
            Err(ApiError::processing(RETRIEVE_FAILED, e))
        }
    }
}

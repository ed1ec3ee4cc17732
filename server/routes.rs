use std::io::Cursor;

use log::{info, warn};
use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::error::ApiError;
use crate::handlers;
use crate::state::SharedState;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Builds a header from ASCII literals.
fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("ASCII header")
}

/// Headers every response carries; any origin may call the API.
fn cors_headers() -> Vec<Header> {
    vec![header("Access-Control-Allow-Origin", "*")]
}

fn bytes_response(status: u16, content_type: &str, bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = bytes.len();
    let mut headers = cors_headers();
    headers.push(header("Content-Type", content_type));
    Response::new(StatusCode(status), headers, Cursor::new(bytes), Some(len), None)
}

pub fn json_response<T: Serialize>(status: u16, body: &T) -> Response<Cursor<Vec<u8>>> {
    let bytes = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    bytes_response(status, "application/json", bytes)
}

pub fn png_response(bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    bytes_response(200, "image/png", bytes)
}

/// `OPTIONS` preflight answer.
pub fn preflight() -> Response<Cursor<Vec<u8>>> {
    let mut headers = cors_headers();
    headers.push(header("Access-Control-Allow-Methods", "GET, POST, OPTIONS"));
    headers.push(header("Access-Control-Allow-Headers", "Content-Type"));
    headers.push(header("Access-Control-Max-Age", "86400"));
    Response::new(StatusCode(204), headers, Cursor::new(Vec::new()), Some(0), None)
}

/// Splits a request URL into path and query string.
pub fn split_url(url: &str) -> (&str, &str) {
    url.split_once('?').unwrap_or((url, ""))
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Routes one request and sends the response.
///
/// Handlers receive `&mut Request` where they need the body; the dispatcher
/// keeps ownership and calls `request.respond(response)` at the end.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url = request.url().to_owned();
    let (path, query) = split_url(&url);
    info!("{} {}", method, path);

    let response = match (&method, path) {
        (Method::Options, _) => preflight(),

        (Method::Post, "/processImage") => handlers::process::handle(&mut request, &state),
        (Method::Get, "/getProcessedImage") => handlers::retrieve::handle(query, &state),
        (Method::Get, "/health") => handlers::health::handle(&state),

        _ => ApiError::NotFound("Not found").into_response(),
    };

    if let Err(e) = request.respond(response) {
        warn!("Failed to send response for {} {}: {}", method, path, e);
    }
}

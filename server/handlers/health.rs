use std::io::Cursor;

use serde::Serialize;
use tiny_http::Response;

use crate::routes::json_response;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    transform: &'static str,
}

/// `GET /health` — liveness plus the active transform.
pub fn handle(state: &AppState) -> Response<Cursor<Vec<u8>>> {
    json_response(200, &HealthBody { status: "ok", transform: state.transform.name() })
}

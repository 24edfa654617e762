//! Axum route handler for the upload relay.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Response,
};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::matcher_client::relay_response;
use crate::state::AppState;
use crate::upload::form::{build_form, read_upload};

/// POST /api/upload
///
/// Decodes `job_description` + `resumes`, forwards them to the matcher as a
/// fresh multipart request, and relays the matcher's status, content type and
/// body unchanged.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Multipart rejected: {}", rejection.body_text());
        AppError::BadRequest("Invalid multipart form".to_string())
    })?;

    let upload = read_upload(multipart).await?;
    info!(
        resumes = upload.resumes.len(),
        job_description_bytes = upload.job_description.len(),
        "Relaying upload to matcher"
    );

    let form = build_form(upload)?;
    let response = state.matcher.submit(form).await?;
    info!(status = %response.status(), "Matcher accepted upload");

    Ok(relay_response(response))
}

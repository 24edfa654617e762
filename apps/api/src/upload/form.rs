//! Multipart decoding of the inbound upload and re-encoding for the matcher.

use anyhow::{Context, Result};
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::errors::AppError;
use crate::upload::models::{ResumeFile, UploadRequest};

pub const JOB_DESCRIPTION_FIELD: &str = "job_description";
pub const RESUMES_FIELD: &str = "resumes";
const DEFAULT_PART_CONTENT_TYPE: &str = "application/octet-stream";

/// Reads the whole inbound form into an `UploadRequest`.
///
/// - `job_description` is kept as raw bytes and defaults to empty when absent;
///   the first occurrence wins if it is repeated.
/// - Every `resumes` part carrying a non-empty filename is kept, in order.
///   Parts without a filename are plain values, not files, and are skipped.
/// - Unknown fields are ignored.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, AppError> {
    let mut job_description: Option<Bytes> = None;
    let mut resumes = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(JOB_DESCRIPTION_FIELD) => {
                let data = field.bytes().await.map_err(multipart_error)?;
                job_description.get_or_insert(data);
            }
            Some(RESUMES_FIELD) => {
                let file_name = match field.file_name() {
                    Some(file_name) if !file_name.is_empty() => file_name.to_string(),
                    _ => continue,
                };
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                resumes.push(ResumeFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    if resumes.is_empty() {
        return Err(AppError::BadRequest("No resume files found".to_string()));
    }

    Ok(UploadRequest {
        job_description: job_description.unwrap_or_default(),
        resumes,
    })
}

fn multipart_error(err: MultipartError) -> AppError {
    debug!("Multipart decode failed: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds size limit".to_string())
    } else {
        AppError::BadRequest("Invalid multipart form".to_string())
    }
}

/// Re-encodes the upload as the multipart form the matcher expects: the job
/// description first, then one `resumes` file part per attachment.
///
/// Filenames are written verbatim (no percent-encoding) so the matcher sees
/// exactly what the browser sent. The boundary and closing delimiter are
/// owned by the returned `Form` and emitted when the request body is written.
pub fn build_form(upload: UploadRequest) -> Result<Form> {
    let jd_length = upload.job_description.len() as u64;
    let mut form = Form::new().percent_encode_noop().part(
        JOB_DESCRIPTION_FIELD,
        Part::stream_with_length(upload.job_description, jd_length),
    );

    for resume in upload.resumes {
        let content_type = resume
            .content_type
            .as_deref()
            .unwrap_or(DEFAULT_PART_CONTENT_TYPE);
        let length = resume.data.len() as u64;
        let part = Part::stream_with_length(resume.data, length)
            .file_name(resume.file_name.clone())
            .mime_str(content_type)
            .with_context(|| {
                format!(
                    "Invalid content type '{content_type}' on resume '{}'",
                    resume.file_name
                )
            })?;
        form = form.part(RESUMES_FIELD, part);
    }

    Ok(form)
}

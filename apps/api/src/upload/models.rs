use bytes::Bytes;

/// A single resume attachment, exactly as the client uploaded it.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub file_name: String,
    /// Content type the client sent for the part, if any.
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Decoded inbound upload. Lives for one request only.
///
/// `resumes` keeps the order the parts arrived in and is never empty once
/// produced by `form::read_upload`.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Raw field bytes; not decoded, so whatever the client sent is forwarded.
    pub job_description: Bytes,
    pub resumes: Vec<ResumeFile>,
}

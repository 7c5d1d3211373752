use std::path::Path;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use chrono::Utc;
use mime::Mime;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::UploadLimits,
    storage::ObjectStore,
    web::{ApiError, AppState, AuthUser, json_error},
};

pub const DEFAULT_FOLDER: &str = "uploads";
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "pdf"];

/// Result type used by the shared upload helpers.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error returned when validating or storing uploaded files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError {
    message: String,
}

impl UploadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UploadError {}

/// A file buffered from the multipart body, not yet validated.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub size: usize,
    pub bytes: Vec<u8>,
    /// The body stream ended mid-file, usually at the request size cap.
    pub truncated: bool,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub folder: String,
    pub files: Vec<IncomingFile>,
}

/// Per-file outcome reported back to the dashboard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub success: bool,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadReport {
    fn stored(file_name: String, url: String) -> Self {
        Self {
            success: true,
            file_name,
            url: Some(url),
            error: None,
        }
    }

    fn rejected(file_name: String, error: impl Into<String>) -> Self {
        Self {
            success: false,
            file_name,
            url: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub results: Vec<UploadReport>,
    pub uploaded: usize,
    pub failed: usize,
}

impl From<Vec<UploadReport>> for UploadResponse {
    fn from(results: Vec<UploadReport>) -> Self {
        let uploaded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - uploaded;
        Self {
            results,
            uploaded,
            failed,
        }
    }
}

pub async fn upload_files(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let multipart = multipart.map_err(|err| json_error(err.status(), err.body_text()))?;
    let limits = state.config().uploads;

    let form = read_upload_form(multipart, limits)
        .await
        .map_err(|err| json_error(StatusCode::BAD_REQUEST, err.message()))?;

    if form.files.is_empty() {
        return Err(json_error(StatusCode::BAD_REQUEST, "No files provided"));
    }
    if form.files.len() > limits.max_files {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            format!("Too many files: at most {} per upload", limits.max_files),
        ));
    }

    let folder = form.folder.clone();
    let results = store_batch(state.storage(), &folder, form.files, limits).await;
    let response = UploadResponse::from(results);
    info!(
        user_id = %user.id,
        folder = %folder,
        uploaded = response.uploaded,
        failed = response.failed,
        "processed upload batch"
    );

    Ok(Json(response))
}

/// Buffers the `files` / `files[]` fields and the `folder` text field.
///
/// Files larger than the limit stop buffering at `max_file_bytes + 1` so the
/// oversize condition is still reported per file.
pub async fn read_upload_form(
    mut multipart: Multipart,
    limits: UploadLimits,
) -> UploadResult<UploadForm> {
    let mut form = UploadForm {
        folder: DEFAULT_FOLDER.to_string(),
        files: Vec::new(),
    };

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            // Skipping the rest of an oversize file can run into the request body cap.
            Err(err) if stream_cut_after_oversize(&form.files, limits) => {
                warn!(%err, "upload body ended while skipping an oversize file");
                break;
            }
            Err(err) => {
                return Err(UploadError::new(format!(
                    "Failed to parse upload form: {err}"
                )));
            }
        };
        let field_name = field.name().unwrap_or("").to_string();

        if field.file_name().is_none() {
            if field_name == "folder" {
                let value = field
                    .text()
                    .await
                    .map_err(|err| UploadError::new(format!("Failed to read folder: {err}")))?;
                form.folder = sanitize_folder(&value);
            }
            continue;
        }

        if field_name != "files" && field_name != "files[]" {
            return Err(UploadError::new(format!(
                "Unsupported file field: `{field_name}`"
            )));
        }

        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let mut bytes = Vec::new();
        let mut size = 0usize;
        let mut truncated = false;
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    size += chunk.len();
                    if size > limits.max_file_bytes {
                        break;
                    }
                    bytes.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(%err, file = %file_name, "upload body ended mid-file");
                    truncated = true;
                    break;
                }
            }
        }

        form.files.push(IncomingFile {
            file_name,
            size,
            bytes,
            truncated,
        });
        if truncated {
            break;
        }
    }

    Ok(form)
}

/// The last file was already over the limit, so a stream error while draining it
/// is reported against that file instead of failing the whole form.
fn stream_cut_after_oversize(files: &[IncomingFile], limits: UploadLimits) -> bool {
    files
        .last()
        .is_some_and(|file| file.size > limits.max_file_bytes)
}

/// Validates and stores each file in order. A failing file never aborts the batch.
pub async fn store_batch<S: ObjectStore>(
    store: &S,
    folder: &str,
    files: Vec<IncomingFile>,
    limits: UploadLimits,
) -> Vec<UploadReport> {
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        if file.truncated {
            reports.push(UploadReport::rejected(
                file.file_name,
                "Upload was cut off before this file finished. Send fewer or smaller files per request",
            ));
            continue;
        }

        let content_type = match validate_file(&file.file_name, file.size, limits) {
            Ok(content_type) => content_type,
            Err(err) => {
                warn!(file = %file.file_name, error = %err, "rejected upload");
                reports.push(UploadReport::rejected(file.file_name, err.message()));
                continue;
            }
        };

        let key = object_key(
            folder,
            &file.file_name,
            Utc::now().timestamp_millis(),
            Uuid::new_v4(),
        );

        match store.put(&key, file.bytes, content_type.as_ref()).await {
            Ok(()) => {
                let url = store.public_url(&key);
                reports.push(UploadReport::stored(file.file_name, url));
            }
            Err(err) => {
                warn!(?err, file = %file.file_name, key = %key, "failed to store upload");
                reports.push(UploadReport::rejected(
                    file.file_name,
                    "Failed to upload file to storage",
                ));
            }
        }
    }

    reports
}

/// Checks size and type, returning the content type to store the file with.
pub fn validate_file(
    file_name: &str,
    size: usize,
    limits: UploadLimits,
) -> UploadResult<Mime> {
    if size == 0 {
        return Err(UploadError::new(format!("File {file_name} is empty")));
    }

    if size > limits.max_file_bytes {
        return Err(UploadError::new(format!(
            "File {file_name} is too large. Maximum size is {}",
            format_size(limits.max_file_bytes)
        )));
    }

    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    content_type_for(&extension).ok_or_else(|| {
        let shown = if extension.is_empty() {
            "(none)".to_string()
        } else {
            format!(".{extension}")
        };
        UploadError::new(format!(
            "File type {shown} is not allowed. Allowed types: {}",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })
}

/// Human-readable byte size: whole megabytes stay whole, smaller limits keep precision.
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        if bytes % MB == 0 {
            format!("{} MB", bytes / MB)
        } else {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        }
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} bytes")
    }
}

fn content_type_for(extension: &str) -> Option<Mime> {
    match extension {
        "jpg" | "jpeg" => Some(mime::IMAGE_JPEG),
        "png" => Some(mime::IMAGE_PNG),
        "gif" => Some(mime::IMAGE_GIF),
        "svg" => Some(mime::IMAGE_SVG),
        "webp" => "image/webp".parse().ok(),
        "pdf" => Some(mime::APPLICATION_PDF),
        _ => None,
    }
}

/// Restricts folder names to `[a-z0-9-_/]`, falling back to the default folder.
pub fn sanitize_folder(raw: &str) -> String {
    let cleaned = raw
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '/'))
        .collect::<String>();

    let folder = cleaned
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if folder.is_empty() {
        DEFAULT_FOLDER.to_string()
    } else {
        folder
    }
}

pub fn object_key(folder: &str, file_name: &str, timestamp_millis: i64, id: Uuid) -> String {
    let mut sanitized = sanitize_filename::sanitize(file_name).replace(' ', "-");
    if sanitized.is_empty() {
        sanitized = "file".to_string();
    }
    let short_id = &id.simple().to_string()[..8];
    format!("{folder}/{timestamp_millis}-{short_id}-{sanitized}")
}

//! Multipart reconstruction relays.
//!
//! # Responsibilities
//! - Decode an inbound `multipart/form-data` body into fields and one file
//! - Validate required fields before any network call
//! - Re-encode with the backend's field names and defaults
//! - Forward once (no redirects) and relay status and body verbatim
//!
//! # Design Decisions
//! - One [`UploadKind`] table per upload type; the relay code is shared
//! - Duplicate text fields: first value wins
//! - The first part with a filename is the file; later ones are ignored
//! - File bytes, filename and MIME type are forwarded unchanged

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use reqwest::multipart::{Form, Part};

use crate::http::response::passthrough;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{copy_credential, RelayError, RelayResult};

/// How an inbound field maps to the backend form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Missing or blank → 400, no outbound call.
    Required,
    /// Missing or blank → this value.
    Default(&'static str),
    /// Missing or blank → not sent.
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub inbound: &'static str,
    pub outbound: &'static str,
    pub requirement: Requirement,
}

/// One upload endpoint: backend path plus field table.
#[derive(Debug, Clone, Copy)]
pub struct UploadKind {
    pub name: &'static str,
    /// Relative to the backend prefix.
    pub backend_path: &'static str,
    /// Backend form name of the file part.
    pub file_field: &'static str,
    pub fields: &'static [FieldRule],
}

pub const CSV_UPLOAD: UploadKind = UploadKind {
    name: "csv",
    backend_path: "documents/upload/csv",
    file_field: "file",
    fields: &[
        FieldRule { inbound: "tenant_id", outbound: "tenant_id", requirement: Requirement::Required },
        FieldRule { inbound: "title_column", outbound: "title_column", requirement: Requirement::Default("title") },
        FieldRule { inbound: "content_column", outbound: "content_column", requirement: Requirement::Default("content") },
        FieldRule { inbound: "metadata_columns", outbound: "metadata_columns", requirement: Requirement::Optional },
    ],
};

pub const TEXT_UPLOAD: UploadKind = UploadKind {
    name: "text",
    backend_path: "documents/upload",
    file_field: "file",
    fields: &[
        FieldRule { inbound: "tenant_id", outbound: "tenant_id", requirement: Requirement::Required },
        FieldRule { inbound: "title", outbound: "document_title", requirement: Requirement::Optional },
        FieldRule { inbound: "chunk_size", outbound: "chunk_size", requirement: Requirement::Default("1000") },
        FieldRule { inbound: "chunk_overlap", outbound: "chunk_overlap", requirement: Requirement::Default("200") },
    ],
};

/// The uploaded file, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Decoded inbound multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundUpload {
    pub fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl InboundUpload {
    /// Non-blank value of `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

fn invalid_form(e: impl std::fmt::Display) -> RelayError {
    tracing::warn!(error = %e, "Undecodable multipart body");
    RelayError::Payload {
        message: "Ungültige Formulardaten".to_string(),
    }
}

/// Read every part of `multipart`.
pub async fn decode_multipart(mut multipart: Multipart) -> RelayResult<InboundUpload> {
    let mut upload = InboundUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_form)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_owned) {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(invalid_form)?;
            if upload.file.is_none() {
                upload.file = Some(UploadedFile {
                    filename,
                    mime_type,
                    bytes,
                });
            } else {
                tracing::debug!(field = %name, "Ignoring additional file part");
            }
        } else {
            let value = field.text().await.map_err(invalid_form)?;
            upload.fields.entry(name).or_insert(value);
        }
    }

    Ok(upload)
}

impl UploadKind {
    /// Validate and remap text fields to `(backend name, value)` pairs.
    ///
    /// Required fields are checked first, then the file.
    pub fn outbound_fields(&self, upload: &InboundUpload) -> RelayResult<Vec<(&'static str, String)>> {
        let mut out = Vec::with_capacity(self.fields.len());
        for rule in self.fields {
            match (upload.field(rule.inbound), rule.requirement) {
                (Some(value), _) => out.push((rule.outbound, value.to_string())),
                (None, Requirement::Required) => return Err(RelayError::missing_field(rule.inbound)),
                (None, Requirement::Default(value)) => out.push((rule.outbound, value.to_string())),
                (None, Requirement::Optional) => {}
            }
        }

        if upload.file.is_none() {
            return Err(RelayError::Payload {
                message: "Keine Datei hochgeladen".to_string(),
            });
        }
        Ok(out)
    }

    /// Build the backend form: remapped fields plus the original file.
    pub fn build_form(&self, upload: InboundUpload) -> RelayResult<Form> {
        let fields = self.outbound_fields(&upload)?;
        let file = upload.file.ok_or_else(|| RelayError::Payload {
            message: "Keine Datei hochgeladen".to_string(),
        })?;

        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.filename)
            .mime_str(&file.mime_type)
            .map_err(|_| RelayError::Payload {
                message: format!("Ungültiger Dateityp: {}", file.mime_type),
            })?;

        let form = fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .part(self.file_field, part);
        Ok(form)
    }
}

/// Decode, validate, re-encode, forward and relay the backend's answer.
pub async fn relay_upload(
    state: &AppState,
    kind: &UploadKind,
    inbound_headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> RelayResult<Response> {
    let multipart = multipart.map_err(invalid_form)?;
    let upload = decode_multipart(multipart).await?;
    let form = kind.build_form(upload)?;

    let url = state.endpoint.url_for(kind.backend_path, None)?;
    let mut headers = HeaderMap::new();
    copy_credential(inbound_headers, &mut headers, &state.credential_header);

    let envelope = state.dispatcher.send_multipart(url, headers, form).await?;
    let status = envelope.status;
    let content_type = envelope.content_type().cloned();
    let body = envelope.bytes().await?;

    if !status.is_success() {
        tracing::warn!(upload = kind.name, status = %status, "Backend rejected upload");
    }
    Ok(passthrough(status, content_type, body))
}

async fn handle(
    state: AppState,
    kind: &UploadKind,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let start_time = Instant::now();
    let response = match relay_upload(&state, kind, &headers, multipart).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(upload = kind.name, kind = e.kind(), error = %e, "Upload relay failed");
            metrics::record_error(e.kind());
            e.into_response()
        }
    };
    metrics::record_request(kind.name, "POST", response.status().as_u16(), start_time);
    response
}

/// `POST /upload/csv`
pub async fn csv_upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    handle(state, &CSV_UPLOAD, headers, multipart).await
}

/// `POST /upload/text`
pub async fn text_upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    handle(state, &TEXT_UPLOAD, headers, multipart).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(fields: &[(&str, &str)], with_file: bool) -> InboundUpload {
        InboundUpload {
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            file: with_file.then(|| UploadedFile {
                filename: "doc.csv".into(),
                mime_type: "text/csv".into(),
                bytes: Bytes::from_static(b"title,content\nA,B\n"),
            }),
        }
    }

    #[test]
    fn test_csv_fields_remapped_with_defaults() {
        let inbound = upload(&[("tenant_id", "t1"), ("title_column", "title")], true);
        let fields = CSV_UPLOAD.outbound_fields(&inbound).unwrap();
        assert_eq!(
            fields,
            vec![
                ("tenant_id", "t1".to_string()),
                ("title_column", "title".to_string()),
                ("content_column", "content".to_string()),
            ]
        );
    }

    #[test]
    fn test_text_fields_use_backend_names() {
        let inbound = upload(&[("tenant_id", "t9"), ("title", "Handbuch"), ("chunk_size", "500")], true);
        let fields = TEXT_UPLOAD.outbound_fields(&inbound).unwrap();
        assert!(fields.contains(&("document_title", "Handbuch".to_string())));
        assert!(fields.contains(&("chunk_size", "500".to_string())));
        assert!(fields.contains(&("chunk_overlap", "200".to_string())));
        assert!(!fields.iter().any(|(name, _)| *name == "title"));
    }

    #[test]
    fn test_missing_tenant_checked_before_file() {
        let err = CSV_UPLOAD.outbound_fields(&upload(&[], false)).unwrap_err();
        assert_eq!(err.to_string(), "tenant_id ist erforderlich");

        let blank = CSV_UPLOAD.outbound_fields(&upload(&[("tenant_id", "  ")], true)).unwrap_err();
        assert_eq!(blank.to_string(), "tenant_id ist erforderlich");
    }

    #[test]
    fn test_missing_file_rejected() {
        let err = CSV_UPLOAD
            .outbound_fields(&upload(&[("tenant_id", "t1")], false))
            .unwrap_err();
        assert_eq!(err.to_string(), "Keine Datei hochgeladen");
    }

    #[test]
    fn test_build_form_rejects_bad_mime() {
        let mut inbound = upload(&[("tenant_id", "t1")], true);
        if let Some(file) = inbound.file.as_mut() {
            file.mime_type = "not a mime".into();
        }
        assert!(CSV_UPLOAD.build_form(inbound).is_err());
    }
}

//! Multipart payload for candidate creation and bulk upload.
//!
//! Callers build the payload with whatever field name they are used to; the
//! wire always carries the resume binary under [`RESUME_FIELD`].

use std::path::Path;

use bytes::Bytes;
use reqwest::multipart::{Form, Part as FormPart};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Canonical multipart field for the resume binary.
pub const RESUME_FIELD: &str = "file";

/// Alternate field names callers use for the resume binary.
pub const RESUME_ALIASES: [&str; 2] = ["resume", "resumeFile"];

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        bytes: Bytes,
    },
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::Text { name, .. } | Part::File { name, .. } => name,
        }
    }

    fn is_file(&self) -> bool {
        matches!(self, Part::File { .. })
    }
}

/// Ordered list of form parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds an in-memory file. The MIME type is guessed from `file_name`.
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        self.parts.push(Part::File {
            name: name.into(),
            file_name,
            mime,
            bytes: bytes.into(),
        });
        self
    }

    /// Reads a file from disk and adds it under `name`.
    pub async fn attach_path(self, name: impl Into<String>, path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::Validation(format!("Not a file path: {}", path.display())))?
            .to_string();
        Ok(self.file(name, file_name, bytes))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(Part::name).collect()
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.parts.iter().any(|p| p.is_file() && p.name() == name)
    }

    /// Moves the resume binary onto [`RESUME_FIELD`].
    ///
    /// If a `file` part already exists, alias file parts are dropped. Otherwise
    /// the first alias file part is renamed and the remaining aliases dropped,
    /// so exactly one resume part goes on the wire.
    pub fn normalize_resume_field(&mut self) {
        let is_alias = |p: &Part| p.is_file() && RESUME_ALIASES.contains(&p.name());

        if !self.has_file(RESUME_FIELD) {
            if let Some(Part::File { name, .. }) = self.parts.iter_mut().find(|p| is_alias(&**p)) {
                *name = RESUME_FIELD.to_string();
            }
        }
        self.parts.retain(|p| !is_alias(p));
    }

    /// Text fields as a JSON object, used to synthesize optimistic records.
    pub fn text_fields(&self) -> Map<String, Value> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { name, value } => Some((name.clone(), Value::String(value.clone()))),
                Part::File { .. } => None,
            })
            .collect()
    }

    pub fn into_form(self) -> Result<Form, AppError> {
        let mut form = Form::new();
        for part in self.parts {
            form = match part {
                Part::Text { name, value } => form.text(name, value),
                Part::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let part = FormPart::bytes(bytes.to_vec())
                        .file_name(file_name)
                        .mime_str(&mime)?;
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text extraction through a cloud vision model.
//
// The extractor is built once at startup from configuration. Without an API
// key it is constructed unavailable and every request fails with
// `ServiceUnavailable`; there is no built-in key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use scandesk_core::config::ExtractionConfig;
use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{ExtractionResult, OutputFormat, extension_of};

use crate::image::ImageProcessor;

/// Instruction sent with every image.
pub const EXTRACTION_PROMPT: &str = "Extract all text from this image. \
Preserve the original layout as closely as possible, including columns, \
headers, footers, lists and tables. Keep special characters, punctuation \
and numbers exactly as shown, and keep the text in its original language. \
Return only the extracted text.";

/// An image returned inline by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// What the model sent back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognitionReply {
    pub text: Option<String>,
    pub image: Option<InlineImage>,
}

/// A vision model that reads text from images.
pub trait RecognitionService: Send + Sync {
    fn recognize(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
        want_image: bool,
    ) -> Result<RecognitionReply>;
}

// -- Gemini -------------------------------------------------------------------

/// `generateContent` client for the Gemini API.
pub struct GeminiClient {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    api_key: String,
    url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, config: &ExtractionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ScanDeskError::ServiceUnavailable(format!("HTTP client: {err}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            runtime,
            api_key: api_key.into(),
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
        })
    }

    async fn post(&self, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| ScanDeskError::ServiceUnavailable(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScanDeskError::ServiceUnavailable(format!(
                "Gemini returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|err| ScanDeskError::ServiceUnavailable(format!("unreadable response: {err}")))
    }
}

impl RecognitionService for GeminiClient {
    fn recognize(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
        want_image: bool,
    ) -> Result<RecognitionReply> {
        let mut body = json!({
            "contents": [{ "parts": [
                { "text": prompt },
                { "inlineData": { "mimeType": mime_type, "data": STANDARD.encode(image) } }
            ]}]
        });
        if want_image {
            body["generationConfig"] = json!({ "responseModalities": ["TEXT", "IMAGE"] });
        }

        debug!(url = %self.url, bytes = image.len(), "Calling Gemini");
        let reply = self.runtime.block_on(self.post(&body))?;
        parse_generate_content(&reply)
    }
}

/// Collect text and the first inline image from a `generateContent` reply.
pub fn parse_generate_content(reply: &Value) -> Result<RecognitionReply> {
    let parts = reply["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| ScanDeskError::ServiceUnavailable("reply contained no candidates".into()))?;

    let mut text = String::new();
    let mut image = None;
    for part in parts {
        if let Some(chunk) = part["text"].as_str() {
            text.push_str(chunk);
        } else if image.is_none() {
            if let Some(data) = part["inlineData"]["data"].as_str() {
                let bytes = STANDARD
                    .decode(data)
                    .map_err(|err| ScanDeskError::ServiceUnavailable(format!("bad inline image: {err}")))?;
                image = Some(InlineImage {
                    mime_type: part["inlineData"]["mimeType"]
                        .as_str()
                        .unwrap_or("image/png")
                        .to_string(),
                    data: bytes,
                });
            }
        }
    }

    Ok(RecognitionReply {
        text: (!text.is_empty()).then_some(text),
        image,
    })
}

// -- Extractor ----------------------------------------------------------------

/// Text extraction with an explicit availability state.
pub struct TextExtractor {
    service: Option<Box<dyn RecognitionService>>,
    unavailable_reason: String,
}

impl TextExtractor {
    /// Build from configuration; unavailable when the key variable is unset
    /// or empty.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let key = std::env::var(&config.api_key_env).unwrap_or_default();
        if key.trim().is_empty() {
            info!(variable = %config.api_key_env, "No API key set; text extraction disabled");
            return Self::unavailable(format!("{} is not set", config.api_key_env));
        }
        match GeminiClient::new(key.trim(), config) {
            Ok(client) => Self::with_service(Box::new(client)),
            Err(err) => {
                warn!(error = %err, "Text extraction client could not be created");
                Self::unavailable(err.to_string())
            }
        }
    }

    pub fn with_service(service: Box<dyn RecognitionService>) -> Self {
        Self {
            service: Some(service),
            unavailable_reason: String::new(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            service: None,
            unavailable_reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.service.is_some()
    }

    /// Read the text in `image_path`. When `want_modified_image` is set and
    /// the model returns an image, it is saved next to the source as
    /// `<stem>_modified.<ext>`.
    #[instrument(skip(self), fields(image = %image_path.display()))]
    pub fn extract(&self, image_path: &Path, want_modified_image: bool) -> Result<ExtractionResult> {
        let service = self
            .service
            .as_ref()
            .ok_or_else(|| ScanDeskError::ServiceUnavailable(self.unavailable_reason.clone()))?;

        if !image_path.exists() {
            return Err(ScanDeskError::FileNotFound(image_path.to_path_buf()));
        }
        let bytes = std::fs::read(image_path)?;
        let mime_type = mime_for(image_path);

        let reply = service.recognize(&bytes, mime_type, EXTRACTION_PROMPT, want_modified_image)?;

        let modified_image_path = match (want_modified_image, reply.image) {
            (true, Some(image)) => Some(save_modified_image(image_path, &image)?),
            _ => None,
        };

        info!(
            chars = reply.text.as_ref().map_or(0, |t| t.len()),
            modified = modified_image_path.is_some(),
            "Text extraction finished"
        );
        Ok(ExtractionResult {
            text: reply.text,
            modified_image_path,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    match extension_of(path).as_str() {
        "gif" => "image/gif",
        "webp" => "image/webp",
        ext => OutputFormat::from_extension(ext)
            .filter(|format| *format != OutputFormat::Pdf)
            .map_or("image/jpeg", |format| format.mime_type()),
    }
}

/// `<dir>/<stem><suffix>` next to `path`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    path.with_file_name(format!("{stem}{suffix}"))
}

/// Path a modified copy of `image_path` is saved under.
pub fn modified_image_path(image_path: &Path) -> PathBuf {
    let ext = image_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    sibling(image_path, &format!("_modified{ext}"))
}

fn save_modified_image(image_path: &Path, image: &InlineImage) -> Result<PathBuf> {
    let target = modified_image_path(image_path);
    // Re-encode so the file content matches the source extension.
    let raster = OutputFormat::from_extension(&extension_of(image_path))
        .filter(|format| *format != OutputFormat::Pdf);
    match raster {
        Some(format) => ImageProcessor::from_bytes(&image.data)?.save_as(&target, format)?,
        None => std::fs::write(&target, &image.data)?,
    }
    debug!(path = %target.display(), mime = %image.mime_type, "Saved modified image");
    Ok(target)
}

/// Write extracted text next to the image as `<stem>_extracted_text.txt`.
pub fn save_extracted_text(image_path: &Path, text: &str) -> Result<PathBuf> {
    let target = sibling(image_path, "_extracted_text.txt");
    std::fs::write(&target, text)?;
    Ok(target)
}

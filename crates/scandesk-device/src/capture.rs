// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan capture.
//
// A scan is transferred losslessly into a private temporary directory, then
// converted into the requested output format. The staging directory is
// removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{info, instrument, warn};

use scandesk_bridge::{PlatformBridge, ScanSetting};
use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{AppConfig, CaptureRequest, CapturedDocument, OutputFormat};
use scandesk_document::FormatConverter;

use crate::inventory::DeviceInventory;

/// File name of the raw transfer inside the staging directory.
const RAW_CAPTURE_NAME: &str = "capture.bmp";

/// Format of the raw transfer.
const RAW_FORMAT: OutputFormat = OutputFormat::Bmp;

/// Drives a scanner and writes finished documents into the scan directory.
pub struct CaptureAdapter {
    bridge: Arc<dyn PlatformBridge>,
    inventory: DeviceInventory,
    converter: FormatConverter,
    scan_dir: PathBuf,
    temp_prefix: String,
}

impl CaptureAdapter {
    pub fn new(
        bridge: Arc<dyn PlatformBridge>,
        scan_dir: impl Into<PathBuf>,
        temp_prefix: impl Into<String>,
    ) -> Self {
        Self {
            inventory: DeviceInventory::new(bridge.clone()),
            bridge,
            converter: FormatConverter::new(),
            scan_dir: scan_dir.into(),
            temp_prefix: temp_prefix.into(),
        }
    }

    pub fn from_config(bridge: Arc<dyn PlatformBridge>, config: &AppConfig) -> Self {
        Self::new(bridge, config.scan_dir.clone(), config.temp_prefix.clone())
    }

    pub fn scan_dir(&self) -> &Path {
        &self.scan_dir
    }

    /// Scan one page.
    ///
    /// When conversion to the requested format fails the raw capture is kept
    /// under the output name with a `.bmp` extension and reported as BMP.
    #[instrument(skip(self, request), fields(device = ?request.device_id, format = %request.output_format))]
    pub fn capture(&self, request: &CaptureRequest) -> Result<CapturedDocument> {
        let request = request.clone().clamped();
        let device = self
            .inventory
            .find_scanner(request.device_id.as_deref())
            .ok_or(ScanDeskError::NoDeviceFound)?;

        let output = match &request.output_path {
            Some(path) => path.clone(),
            None => {
                std::fs::create_dir_all(&self.scan_dir)?;
                next_output_path(&self.scan_dir, Local::now(), request.output_format)
            }
        };

        let staging = tempfile::Builder::new()
            .prefix(&self.temp_prefix)
            .tempdir()?;
        let raw = staging.path().join(RAW_CAPTURE_NAME);

        info!(scanner = %device.display_name, dpi = request.resolution_dpi, "Scanning");
        let settings = ScanSetting::for_request(&request);
        let outcome = self
            .bridge
            .acquire(&device.device_id, &settings, &raw)
            .and_then(|()| self.finish(&raw, &request, &output));

        let staging_path = staging.path().to_path_buf();
        if let Err(err) = staging.close() {
            warn!(path = %staging_path.display(), error = %err, "Could not remove scan staging directory");
        }
        outcome
    }

    /// Scan `pages` pages in sequence.
    ///
    /// `between_pages` is called with the upcoming page number before every
    /// page after the first; returning `false` ends the batch. Failed pages
    /// are logged and skipped.
    pub fn capture_batch<F>(
        &self,
        request: &CaptureRequest,
        pages: usize,
        mut between_pages: F,
    ) -> Vec<CapturedDocument>
    where
        F: FnMut(usize) -> bool,
    {
        let extension = request.output_format.extension();
        let (dir, stem) = match &request.output_path {
            Some(path) => (
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "scan".into()),
            ),
            None => (
                self.scan_dir.clone(),
                timestamp_stem(Local::now()),
            ),
        };
        if let Err(err) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %err, "Could not create batch directory");
            return Vec::new();
        }

        let mut captured = Vec::with_capacity(pages);
        for page in 1..=pages {
            if page > 1 && !between_pages(page) {
                info!(page, "Batch stopped before page");
                break;
            }
            let page_request = CaptureRequest {
                output_path: Some(unique_path(
                    dir.join(format!("{stem}_page{page}.{extension}")),
                )),
                ..request.clone()
            };
            match self.capture(&page_request) {
                Ok(document) => captured.push(document),
                Err(err) => warn!(page, error = %err, "Skipping failed page"),
            }
        }
        info!(requested = pages, captured = captured.len(), "Batch finished");
        captured
    }

    fn finish(&self, raw: &Path, request: &CaptureRequest, output: &Path) -> Result<CapturedDocument> {
        if !raw.exists() {
            return Err(ScanDeskError::TransferFailed(
                "scanner returned no image".into(),
            ));
        }

        match self
            .converter
            .convert(raw, request.output_format, Some(request.page_size), output)
        {
            Ok(file_path) => Ok(CapturedDocument {
                file_path,
                format: request.output_format,
            }),
            Err(err) => {
                let fallback = output.with_extension(RAW_FORMAT.extension());
                warn!(error = %err, fallback = %fallback.display(), "Conversion failed, keeping raw capture");
                if let Some(parent) = fallback.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::copy(raw, &fallback)?;
                Ok(CapturedDocument {
                    file_path: fallback,
                    format: RAW_FORMAT,
                })
            }
        }
    }
}

fn timestamp_stem(now: DateTime<Local>) -> String {
    format!("scan_{}", now.format("%Y%m%d_%H%M%S"))
}

/// `<dir>/scan_<YYYYMMDD_HHMMSS>.<ext>`, suffixed when taken.
fn next_output_path(dir: &Path, now: DateTime<Local>, format: OutputFormat) -> PathBuf {
    unique_path(dir.join(format!("{}.{}", timestamp_stem(now), format.extension())))
}

/// `candidate`, or `<stem>_<n>.<ext>` for the first free `n`.
fn unique_path(candidate: PathBuf) -> PathBuf {
    if !candidate.exists() {
        return candidate;
    }
    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = candidate
        .extension()
        .map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| {
            let name = match &extension {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            candidate.with_file_name(name)
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

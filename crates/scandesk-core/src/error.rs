// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for ScanDesk.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all ScanDesk operations.
#[derive(Debug, Error)]
pub enum ScanDeskError {
    // -- Device errors --
    #[error("no scanner found")]
    NoDeviceFound,

    #[error("scanner busy or disconnected: {0}")]
    DeviceBusyOrDisconnected(String),

    #[error("scan transfer failed: {0}")]
    TransferFailed(String),

    // -- Document errors --
    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("no readable images to combine")]
    NoValidInputs,

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Print errors --
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("printer not found: {0}")]
    PrinterNotFound(String),

    #[error("no print method applies to '{0}'")]
    NoApplicableStrategy(String),

    #[error("all {attempted} applicable print methods failed")]
    AllStrategiesFailed { attempted: usize },

    #[error("print spooler error: {0}")]
    Spooler(String),

    #[error("external tool failed: {0}")]
    ExternalTool(String),

    #[error("required tool not installed: {0}")]
    ToolMissing(String),

    #[error("download failed: {0}")]
    Download(String),

    // -- Text extraction --
    #[error("text extraction service unavailable: {0}")]
    ServiceUnavailable(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanDeskError>;

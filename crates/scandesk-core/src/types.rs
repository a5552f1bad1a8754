// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for ScanDesk: devices, capture requests, print jobs.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScanDeskError;

// -- Devices ------------------------------------------------------------------

/// What kind of device an inventory entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Scanner,
    Printer,
}

/// A scanner or printer as reported by the OS at enumeration time.
///
/// Devices are never cached; `device_id` is the only stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// 1-based position in the enumeration that produced it.
    pub index: usize,
    pub display_name: String,
    pub device_id: String,
    pub kind: DeviceKind,
}

/// Extended printer information for the printer listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDetails {
    pub device: Device,
    pub is_default: bool,
    pub port: String,
    pub driver: String,
    /// Spooler status bitmask (0 = ready).
    pub status: u32,
    /// Spooler attribute bitmask.
    pub attributes: u32,
}

impl PrinterDetails {
    /// Short status label for listings.
    pub fn status_label(&self) -> &'static str {
        // PRINTER_STATUS_* bits from the spooler.
        const PAUSED: u32 = 0x0000_0001;
        const ERROR: u32 = 0x0000_0002;
        const PAPER_JAM: u32 = 0x0000_0008;
        const PAPER_OUT: u32 = 0x0000_0010;
        const OFFLINE: u32 = 0x0000_0080;
        const BUSY: u32 = 0x0000_0200;

        match self.status {
            0 => "Ready",
            s if s & OFFLINE != 0 => "Offline",
            s if s & PAPER_JAM != 0 => "Paper jam",
            s if s & PAPER_OUT != 0 => "Out of paper",
            s if s & ERROR != 0 => "Error",
            s if s & PAUSED != 0 => "Paused",
            s if s & BUSY != 0 => "Busy",
            _ => "Unknown",
        }
    }
}

// -- Capture ------------------------------------------------------------------

/// Colour intent requested from the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    #[default]
    Color,
    Grayscale,
    BlackAndWhite,
}

impl ColorMode {
    /// WIA "Current Intent" property value.
    pub fn wia_intent(&self) -> i32 {
        match self {
            Self::Color => 1,
            Self::Grayscale => 2,
            Self::BlackAndWhite => 4,
        }
    }
}

impl FromStr for ColorMode {
    type Err = ScanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "color" | "colour" => Ok(Self::Color),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(Self::Grayscale),
            "bw" | "b&w" | "blackandwhite" | "black-and-white" | "mono" => {
                Ok(Self::BlackAndWhite)
            }
            other => Err(ScanDeskError::Conversion(format!(
                "unknown colour mode '{other}'"
            ))),
        }
    }
}

/// Output file format for captures and conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    Jpg,
    Png,
    Pdf,
    Tiff,
    Bmp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [Self::Jpg, Self::Png, Self::Pdf, Self::Tiff, Self::Bmp];

    /// Canonical file extension (no dot).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "pdf" => Some(Self::Pdf),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Whether the format can carry an alpha channel. Everything else is
    /// flattened against white before encoding.
    pub fn supports_alpha(&self) -> bool {
        matches!(self, Self::Png | Self::Tiff)
    }

    /// MIME type used when uploading images for text extraction.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Tiff => "image/tiff",
            Self::Bmp => "image/bmp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ScanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim().trim_start_matches('.'))
            .ok_or_else(|| ScanDeskError::Conversion(format!("unsupported output format '{s}'")))
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
    A3,
    A5,
}

impl PaperSize {
    /// (width, height) in PDF points (1/72 inch), portrait.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
            Self::A3 => (842.0, 1191.0),
            Self::A5 => (420.0, 595.0),
        }
    }

    /// DEVMODE `dmPaperSize` code (DMPAPER_*).
    pub fn devmode_code(&self) -> i16 {
        match self {
            Self::Letter => 1,
            Self::Legal => 5,
            Self::A3 => 8,
            Self::A4 => 9,
            Self::A5 => 11,
        }
    }

    /// Keyword accepted by the PDF viewer's `paper=` print setting.
    pub fn viewer_keyword(&self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "letter",
            Self::Legal => "legal",
            Self::A3 => "A3",
            Self::A5 => "A5",
        }
    }
}

impl FromStr for PaperSize {
    type Err = ScanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            other => Err(ScanDeskError::Conversion(format!("unknown paper size '{other}'"))),
        }
    }
}

/// Lowest and highest accepted brightness/contrast adjustment.
pub const ADJUSTMENT_RANGE: (i32, i32) = (-1000, 1000);

/// Parameters for a single scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequest {
    /// Explicit scanner; `None` picks the first enumerated scanner.
    pub device_id: Option<String>,
    pub resolution_dpi: u32,
    pub color_mode: ColorMode,
    pub brightness: i32,
    pub contrast: i32,
    pub output_format: OutputFormat,
    pub page_size: PaperSize,
    /// Overrides the timestamped name in the scan directory.
    pub output_path: Option<PathBuf>,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            device_id: None,
            resolution_dpi: 300,
            color_mode: ColorMode::Color,
            brightness: 0,
            contrast: 0,
            output_format: OutputFormat::Jpg,
            page_size: PaperSize::A4,
            output_path: None,
        }
    }
}

impl CaptureRequest {
    /// Clamp brightness and contrast into [`ADJUSTMENT_RANGE`].
    pub fn clamped(mut self) -> Self {
        let (lo, hi) = ADJUSTMENT_RANGE;
        self.brightness = self.brightness.clamp(lo, hi);
        self.contrast = self.contrast.clamp(lo, hi);
        self
    }
}

/// A finished capture. The caller owns the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDocument {
    pub file_path: PathBuf,
    pub format: OutputFormat,
}

/// Result of a text extraction request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: Option<String>,
    pub modified_image_path: Option<PathBuf>,
}

// -- Printing -----------------------------------------------------------------

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// DEVMODE `dmOrientation` (DMORIENT_*).
    pub fn devmode_code(&self) -> i16 {
        match self {
            Self::Portrait => 1,
            Self::Landscape => 2,
        }
    }
}

/// Duplex printing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplexMode {
    Simplex,
    /// Flip on the long edge.
    Vertical,
    /// Flip on the short edge.
    Horizontal,
}

impl DuplexMode {
    /// DEVMODE `dmDuplex` (DMDUP_*).
    pub fn devmode_code(&self) -> i16 {
        match self {
            Self::Simplex => 1,
            Self::Vertical => 2,
            Self::Horizontal => 3,
        }
    }

    pub fn viewer_keyword(&self) -> &'static str {
        match self {
            Self::Simplex => "simplex",
            Self::Vertical => "duplexlong",
            Self::Horizontal => "duplexshort",
        }
    }
}

impl FromStr for DuplexMode {
    type Err = ScanDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simplex" | "off" | "none" => Ok(Self::Simplex),
            "vertical" | "long" | "duplexlong" => Ok(Self::Vertical),
            "horizontal" | "short" | "duplexshort" => Ok(Self::Horizontal),
            other => Err(ScanDeskError::Conversion(format!("unknown duplex mode '{other}'"))),
        }
    }
}

/// Print quality preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintQuality {
    Draft,
    Low,
    Medium,
    High,
}

impl PrintQuality {
    /// DEVMODE `dmPrintQuality` (DMRES_*, negative by convention).
    pub fn devmode_code(&self) -> i16 {
        match self {
            Self::Draft => -1,
            Self::Low => -2,
            Self::Medium => -3,
            Self::High => -4,
        }
    }
}

/// Device options for a print job. Absent fields keep the device defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSettings {
    pub copies: Option<u16>,
    pub orientation: Option<Orientation>,
    pub duplex: Option<DuplexMode>,
    pub paper_size: Option<PaperSize>,
    pub quality: Option<PrintQuality>,
    /// `Some(false)` requests monochrome output.
    pub color: Option<bool>,
}

impl PrintSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A request to print one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub file_path: PathBuf,
    /// `None` means the system default printer.
    pub printer_name: Option<String>,
    pub settings: PrintSettings,
    /// Allow the silent script-host path in the dialog chain.
    pub silent: bool,
    /// Allow the shell `print` verb in the dialog chain.
    pub use_shell_fallback: bool,
    /// Run the full no-dialog cascade before anything that may show UI.
    pub ultra_silent: bool,
}

impl PrintJob {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            printer_name: None,
            settings: PrintSettings::default(),
            silent: true,
            use_shell_fallback: true,
            ultra_silent: true,
        }
    }

    pub fn with_printer(mut self, printer: impl Into<String>) -> Self {
        self.printer_name = Some(printer.into());
        self
    }

    pub fn with_settings(mut self, settings: PrintSettings) -> Self {
        self.settings = settings;
        self
    }
}

// -- File classes -------------------------------------------------------------

/// Raster image extensions handled by the image print paths.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff"];

/// Plain-text extensions written raw to the spooler.
pub const PLAIN_TEXT_EXTENSIONS: &[&str] = &["txt", "log", "ini"];

/// Document types the third-party viewer can print silently.
pub const VIEWER_EXTENSIONS: &[&str] = &["pdf", "xps", "epub", "mobi", "cbz", "cbr", "djvu"];

/// Lowercased extension of `path`, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

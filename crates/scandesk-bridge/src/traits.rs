// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// Scanners, the print spooler and the desktop shell are OS services. The
// bridge traits let the capture and print layers run against the real
// Windows implementation or against test doubles.

use std::path::Path;

use scandesk_core::error::Result;
use scandesk_core::{CaptureRequest, Device, PrintSettings, PrinterDetails};

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge: ScannerBackend + Spooler + DesktopShell + Send + Sync {
    /// Human-readable platform name (e.g. "Windows").
    fn platform_name(&self) -> &str;
}

/// One scanner property assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanSetting {
    HorizontalResolution(u32),
    VerticalResolution(u32),
    Brightness(i32),
    Contrast(i32),
    /// WIA "Current Intent" value (1 colour, 2 greyscale, 4 black and white).
    ColorIntent(i32),
}

impl ScanSetting {
    /// Settings for a capture request, in the order they are applied.
    pub fn for_request(request: &CaptureRequest) -> Vec<ScanSetting> {
        vec![
            Self::HorizontalResolution(request.resolution_dpi),
            Self::VerticalResolution(request.resolution_dpi),
            Self::Brightness(request.brightness),
            Self::Contrast(request.contrast),
            Self::ColorIntent(request.color_mode.wia_intent()),
        ]
    }

    /// WIA property name.
    pub fn property_name(&self) -> &'static str {
        match self {
            Self::HorizontalResolution(_) => "Horizontal Resolution",
            Self::VerticalResolution(_) => "Vertical Resolution",
            Self::Brightness(_) => "Brightness",
            Self::Contrast(_) => "Contrast",
            Self::ColorIntent(_) => "Current Intent",
        }
    }

    pub fn value(&self) -> i64 {
        match *self {
            Self::HorizontalResolution(v) | Self::VerticalResolution(v) => v as i64,
            Self::Brightness(v) | Self::Contrast(v) | Self::ColorIntent(v) => v as i64,
        }
    }
}

/// Image acquisition from attached scanners.
pub trait ScannerBackend {
    /// Scanners currently known to the OS, in OS order.
    fn enumerate_scanners(&self) -> Result<Vec<Device>>;

    /// Device and first-item properties as (name, value) pairs. Item
    /// properties are prefixed with `Item.`.
    fn scanner_properties(&self, device_id: &str) -> Result<Vec<(String, String)>>;

    /// Apply `settings` (skipping any the device rejects), scan one page and
    /// save it losslessly to `destination`, which must not exist yet.
    fn acquire(&self, device_id: &str, settings: &[ScanSetting], destination: &Path) -> Result<()>;
}

/// The OS print spooler.
pub trait Spooler {
    /// Installed printers, in spooler order.
    fn enumerate_printers(&self) -> Result<Vec<PrinterDetails>>;

    /// Name of the system default printer, if one is set.
    fn default_printer(&self) -> Result<Option<String>>;

    /// Make `name` the system default printer.
    fn set_default_printer(&self, name: &str) -> Result<()>;

    /// Send bytes to the printer as one RAW document of one page.
    fn write_raw(&self, printer: &str, document_name: &str, data: &[u8]) -> Result<()>;

    /// Store the options present in `settings` as the printer's per-user
    /// defaults. Absent options are left untouched.
    fn apply_settings(&self, printer: &str, settings: &PrintSettings) -> Result<()>;
}

/// File associations of the desktop shell.
pub trait DesktopShell {
    /// Invoke `verb` (e.g. `print`) on `file` through its registered
    /// application, with the window hidden.
    fn shell_execute(&self, verb: &str, file: &Path, parameters: Option<&str>) -> Result<()>;
}

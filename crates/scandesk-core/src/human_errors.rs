// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Scanner failures arrive as COM/WIA HRESULTs and are translated into a
// device fault category first.

use crate::error::ScanDeskError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Timeout or busy device; retrying may work.
    Transient,
    /// User must do something (connect the device, load paper, pick a file).
    ActionRequired,
    /// Cannot be fixed by retrying.
    Permanent,
    /// Software must be installed first.
    InstallRequired,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Whether trying again may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `ScanDeskError` into a `HumanError`.
pub fn humanize_error(err: &ScanDeskError) -> HumanError {
    match err {
        // -- Device errors --
        ScanDeskError::NoDeviceFound => HumanError {
            message: "No scanner was found.".into(),
            suggestion: "Make sure the scanner is plugged in, switched on and installed in Windows, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        ScanDeskError::DeviceBusyOrDisconnected(detail) => HumanError {
            message: "The scanner isn't responding.".into(),
            suggestion: format!("Close any other scanning program, check the cable and power, then try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanDeskError::TransferFailed(detail) => HumanError {
            message: "The scan didn't finish.".into(),
            suggestion: format!("Check that a page is on the glass or in the feeder and try again. ({detail})"),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        // -- Document errors --
        ScanDeskError::Conversion(detail) => HumanError {
            message: "The file couldn't be converted.".into(),
            suggestion: format!("Try a different output format. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanDeskError::NoValidInputs => HumanError {
            message: "None of the chosen images could be read.".into(),
            suggestion: "Check the file names and make sure they are JPEG, PNG, TIFF or BMP images.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanDeskError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer to check it works.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanDeskError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Print errors --
        ScanDeskError::FileNotFound(path) => HumanError {
            message: "The file couldn't be found.".into(),
            suggestion: format!("Check the path and try again: {}", path.display()),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanDeskError::PrinterNotFound(name) => HumanError {
            message: "That printer isn't installed.".into(),
            suggestion: format!("Pick a printer from the printer list, or set a default printer in Windows. ({name})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanDeskError::NoApplicableStrategy(_) => HumanError {
            message: "No program on this computer can print this file silently.".into(),
            suggestion: "Install a PDF viewer such as SumatraPDF, or convert the file to PDF first.".into(),
            retriable: false,
            severity: Severity::InstallRequired,
        },

        ScanDeskError::AllStrategiesFailed { .. } => HumanError {
            message: "Every way of printing this file failed.".into(),
            suggestion: "Check that the printer is on and has paper, then try again. Running with RUST_LOG=debug shows each attempt.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanDeskError::Spooler(_) => HumanError {
            message: "Windows couldn't send the job to the printer.".into(),
            suggestion: "Make sure the Print Spooler service is running and the printer is online.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        ScanDeskError::ExternalTool(detail) => humanize_tool_error(detail),

        ScanDeskError::ToolMissing(tool) => HumanError {
            message: format!("{tool} isn't installed."),
            suggestion: "Install it, or add its location to the configuration file.".into(),
            retriable: false,
            severity: Severity::InstallRequired,
        },

        ScanDeskError::Download(_) => HumanError {
            message: "The download didn't complete.".into(),
            suggestion: "Check your internet connection and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Text extraction --
        ScanDeskError::ServiceUnavailable(_) => HumanError {
            message: "Text extraction isn't available.".into(),
            suggestion: "Set the GOOGLE_API_KEY environment variable and check your internet connection.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Storage --
        ScanDeskError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "ScanDesk doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or try a different folder.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        ScanDeskError::Serialization(_) => HumanError {
            message: "The configuration file couldn't be read.".into(),
            suggestion: "Fix or delete the configuration file; defaults will be used.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanDeskError::PlatformUnavailable => HumanError {
            message: "This feature isn't available on this operating system.".into(),
            suggestion: "Scanning and silent printing need Windows.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_tool_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") {
        HumanError {
            message: "A printing helper didn't finish in time.".into(),
            suggestion: "The printer may be busy. Try again in a moment.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "A printing helper program reported an error.".into(),
            suggestion: format!("Try again, or print the file from its own application. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

// -- Scanner HRESULT translation ----------------------------------------------

/// Category of a scanner-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFault {
    Disconnected,
    TimedOut,
    Busy,
    Offline,
    PaperEmpty,
    PaperJam,
}

impl DeviceFault {
    /// Busy, offline and disconnected devices may recover; paper problems
    /// are transfer failures.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Disconnected | Self::TimedOut | Self::Busy | Self::Offline)
    }
}

/// Translate a COM/WIA HRESULT into a fault category and a plain message.
pub fn describe_device_code(code: u32) -> Option<(DeviceFault, &'static str)> {
    let described = match code {
        0x8007_06BA => (
            DeviceFault::Disconnected,
            "RPC server unavailable: the scanner is disconnected or in use by another program",
        ),
        0x8001_0108 => (
            DeviceFault::TimedOut,
            "the scanner call was cancelled or timed out",
        ),
        0x8000_4005 => (
            DeviceFault::Disconnected,
            "unspecified failure: the scanner may be disconnected or powered off",
        ),
        0x8021_0006 => (DeviceFault::Busy, "the scanner is busy"),
        0x8021_0005 => (DeviceFault::Offline, "the scanner is offline"),
        0x8021_000A => (
            DeviceFault::Disconnected,
            "communication with the scanner failed",
        ),
        0x8021_0015 => (DeviceFault::Disconnected, "no scanner is available"),
        0x8021_0003 => (DeviceFault::PaperEmpty, "no document in the feeder"),
        0x8021_0002 => (DeviceFault::PaperJam, "paper jam in the scanner"),
        _ => return None,
    };
    Some(described)
}

/// Find an HRESULT in tool output. Accepts `0x8007...` hex and signed
/// decimal (`-2147023174`) forms.
pub fn parse_hresult(text: &str) -> Option<u32> {
    for token in text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '-')) {
        let lower = token.to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix("0x") {
            if let Ok(code) = u32::from_str_radix(hex, 16) {
                return Some(code);
            }
        } else if lower.starts_with("-2") {
            if let Ok(signed) = lower.parse::<i32>() {
                return Some(signed as u32);
            }
        }
    }
    None
}

/// Build the capture error for a failed scanner operation.
pub fn device_error(detail: &str) -> ScanDeskError {
    match parse_hresult(detail).and_then(describe_device_code) {
        Some((fault, message)) if fault.is_connectivity() => {
            ScanDeskError::DeviceBusyOrDisconnected(message.to_string())
        }
        Some((_, message)) => ScanDeskError::TransferFailed(message.to_string()),
        None => ScanDeskError::TransferFailed(detail.trim().to_string()),
    }
}

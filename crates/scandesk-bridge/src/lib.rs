// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ScanDesk — Native platform bridge abstractions.
//
// Defines the scanner, spooler and shell traits, the external process
// runner, and platform dispatch: the Windows implementation on Windows and a
// stub everywhere else.

pub mod devmode;
pub mod process;
pub mod traits;
pub mod wia;

#[cfg(windows)]
pub mod windows;

#[cfg(not(windows))]
pub mod stub;

use std::sync::Arc;
use std::time::Duration;

pub use process::{ProcessRunner, SystemProcessRunner, ToolCommand, ToolOutput};
pub use traits::{DesktopShell, PlatformBridge, ScanSetting, ScannerBackend, Spooler};

/// Bridge implementation for the target operating system.
///
/// `runner` executes the scanner automation scripts; `scanner_timeout`
/// bounds each scanner operation.
#[cfg_attr(not(windows), allow(unused_variables))]
pub fn platform_bridge(
    runner: Arc<dyn ProcessRunner>,
    scanner_timeout: Duration,
) -> Arc<dyn PlatformBridge> {
    #[cfg(windows)]
    {
        Arc::new(windows::WindowsBridge::new(
            runner,
            std::path::Path::new("powershell.exe"),
            scanner_timeout,
        ))
    }
    #[cfg(not(windows))]
    {
        Arc::new(stub::StubBridge)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Loaded from a JSON file; every field has a default so partial files work.
// Tool locations are glob patterns that may contain `%VAR%` references and a
// leading `~`, expanded at lookup time.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::PaperSize;

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory that receives timestamped scans.
    pub scan_dir: PathBuf,
    /// Default paper size for scans converted to PDF.
    pub default_paper_size: PaperSize,
    /// Default scan resolution.
    pub default_resolution_dpi: u32,
    /// Printer preferred by the viewer print entry point when installed.
    pub preferred_printer: Option<String>,
    /// Viewer `-print-settings` value used when a job carries no options.
    pub viewer_print_settings: String,
    /// Where helper tools are looked for.
    pub tools: ToolSearchPaths,
    /// Viewer download source and destination.
    pub viewer_download: ViewerDownload,
    /// Per-tool time limits.
    pub timeouts: ToolTimeouts,
    /// Prefix for temporary files and directories.
    pub temp_prefix: String,
    /// Cloud text extraction settings.
    pub extraction: ExtractionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan_dir: PathBuf::from("scans"),
            default_paper_size: PaperSize::A4,
            default_resolution_dpi: 300,
            preferred_printer: None,
            viewer_print_settings: "color,duplexshort".into(),
            tools: ToolSearchPaths::default(),
            viewer_download: ViewerDownload::default(),
            timeouts: ToolTimeouts::default(),
            temp_prefix: "scandesk_".into(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read a config file. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Read a config file, falling back to defaults when it is missing or
    /// unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file; using defaults");
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring unreadable configuration");
                Self::default()
            }
        }
    }

    /// Write the configuration as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Search patterns per helper tool, probed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSearchPaths {
    pub photo_viewer: Vec<String>,
    pub ghostscript: Vec<String>,
    pub pdftoppm: Vec<String>,
    pub viewer: Vec<String>,
    pub pdf_reader: Vec<String>,
    pub browser: Vec<String>,
    pub powershell: Vec<String>,
    pub console_script_host: Vec<String>,
    pub gui_script_host: Vec<String>,
}

impl Default for ToolSearchPaths {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            photo_viewer: owned(&[r"%SystemRoot%\System32\rundll32.exe"]),
            ghostscript: owned(&[
                r"C:\Program Files\gs\gs*\bin\gswin64c.exe",
                r"C:\Program Files (x86)\gs\gs*\bin\gswin32c.exe",
            ]),
            pdftoppm: owned(&[
                r"C:\Program Files\poppler*\Library\bin\pdftoppm.exe",
                r"C:\Program Files\poppler*\bin\pdftoppm.exe",
            ]),
            viewer: owned(&[
                r"C:\Program Files\SumatraPDF\SumatraPDF.exe",
                r"C:\Program Files (x86)\SumatraPDF\SumatraPDF.exe",
                r"%LOCALAPPDATA%\SumatraPDF\SumatraPDF.exe",
                r"~\Downloads\SumatraPDF*.exe",
            ]),
            pdf_reader: owned(&[
                r"C:\Program Files\Adobe\Acrobat DC\Acrobat\Acrobat.exe",
                r"C:\Program Files\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe",
                r"C:\Program Files (x86)\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe",
                r"C:\Program Files (x86)\Adobe\Reader *\Reader\AcroRd32.exe",
            ]),
            browser: owned(&[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
                r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
            ]),
            powershell: owned(&[r"%SystemRoot%\System32\WindowsPowerShell\v1.0\powershell.exe"]),
            console_script_host: owned(&[r"%SystemRoot%\System32\cscript.exe"]),
            gui_script_host: owned(&[r"%SystemRoot%\System32\wscript.exe"]),
        }
    }
}

/// Where the third-party viewer comes from when it is not installed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerDownload {
    /// Tried in order; the first successful download wins.
    pub urls: Vec<String>,
    /// Destination for the downloaded binary. `None` uses the data directory.
    pub install_path: Option<PathBuf>,
}

impl Default for ViewerDownload {
    fn default() -> Self {
        Self {
            urls: vec![
                "https://www.sumatrapdfreader.org/dl/rel/3.4.6/SumatraPDF-3.4.6-64.exe".into(),
                "https://www.sumatrapdfreader.org/dl/rel/3.4.6/SumatraPDF-3.4.6.exe".into(),
            ],
            install_path: None,
        }
    }
}

impl ViewerDownload {
    /// Resolved destination for the viewer binary.
    pub fn destination(&self) -> PathBuf {
        self.install_path.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("scandesk")
                .join("tools")
                .join("SumatraPDF.exe")
        })
    }
}

/// Time limits in seconds for external tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolTimeouts {
    pub photo_viewer_secs: u64,
    pub rasterizer_secs: u64,
    pub viewer_secs: u64,
    pub reader_secs: u64,
    pub browser_secs: u64,
    pub script_secs: u64,
    pub scanner_secs: u64,
    pub download_secs: u64,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            photo_viewer_secs: 10,
            rasterizer_secs: 120,
            viewer_secs: 60,
            reader_secs: 30,
            browser_secs: 30,
            script_secs: 60,
            scanner_secs: 120,
            download_secs: 120,
        }
    }
}

/// Cloud vision settings. The key itself is only ever read from the
/// environment variable named here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub api_key_env: String,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key_env: "GOOGLE_API_KEY".into(),
            model: "gemini-1.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_secs: 60,
        }
    }
}

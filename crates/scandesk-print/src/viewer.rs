// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Third-party viewer support: command construction, print option
// translation, and on-demand download of the viewer binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use scandesk_bridge::ToolCommand;
use scandesk_core::config::ViewerDownload;
use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{Orientation, PrintSettings};

/// Translate device options into the viewer's `-print-settings` value.
///
/// Falls back to `default` when no option is present.
pub fn viewer_settings(settings: &PrintSettings, default: &str) -> String {
    if settings.is_empty() {
        return default.to_string();
    }
    let mut parts = Vec::new();
    if let Some(copies) = settings.copies {
        parts.push(format!("{copies}x"));
    }
    if let Some(duplex) = settings.duplex {
        parts.push(duplex.viewer_keyword().to_string());
    }
    if let Some(orientation) = settings.orientation {
        parts.push(
            match orientation {
                Orientation::Portrait => "portrait",
                Orientation::Landscape => "landscape",
            }
            .to_string(),
        );
    }
    if let Some(paper) = settings.paper_size {
        parts.push(format!("paper={}", paper.viewer_keyword()));
    }
    if let Some(color) = settings.color {
        parts.push(if color { "color" } else { "monochrome" }.to_string());
    }
    if parts.is_empty() {
        // Only options the viewer has no keyword for (quality).
        return default.to_string();
    }
    parts.join(",")
}

/// `<viewer> -print-to <printer> -print-settings <s> -silent -exit-when-done <file>`
pub fn viewer_command(
    viewer: &Path,
    printer: &str,
    settings: &str,
    file: &Path,
    timeout: Duration,
) -> ToolCommand {
    ToolCommand::new(viewer, timeout)
        .args(["-print-to", printer, "-print-settings", settings, "-silent", "-exit-when-done"])
        .arg(file)
}

// -- Download -----------------------------------------------------------------

/// Downloads one URL to a destination file.
pub trait ViewerFetcher: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Asks the user before anything is downloaded.
pub trait DownloadConsent: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}

/// Never downloads. Used when nobody is there to ask.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyDownload;

impl DownloadConsent for DenyDownload {
    fn confirm(&self, _question: &str) -> bool {
        false
    }
}

/// HTTPS fetcher writing through a temporary file next to the destination.
pub struct HttpViewerFetcher {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpViewerFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ScanDeskError::Download(format!("HTTP client: {err}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { client, runtime })
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ScanDeskError::Download(format!("{url}: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanDeskError::Download(format!("{url} returned {status}")));
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| ScanDeskError::Download(format!("{url}: {err}")))?;
        Ok(body.to_vec())
    }
}

impl ViewerFetcher for HttpViewerFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        let body = self.runtime.block_on(self.get(url))?;
        if body.is_empty() {
            return Err(ScanDeskError::Download(format!("{url} returned an empty body")));
        }
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        std::io::Write::write_all(&mut staged, &body)?;
        staged
            .persist(destination)
            .map_err(|err| ScanDeskError::Download(format!("saving viewer: {}", err.error)))?;
        Ok(())
    }
}

/// Gets the viewer binary onto disk when it is missing.
#[derive(Clone)]
pub struct ViewerProvisioner {
    fetcher: Arc<dyn ViewerFetcher>,
    consent: Arc<dyn DownloadConsent>,
    urls: Vec<String>,
    destination: PathBuf,
}

impl ViewerProvisioner {
    pub fn new(
        fetcher: Arc<dyn ViewerFetcher>,
        consent: Arc<dyn DownloadConsent>,
        download: &ViewerDownload,
    ) -> Self {
        Self {
            fetcher,
            consent,
            urls: download.urls.clone(),
            destination: download.destination(),
        }
    }

    /// Where the viewer is installed by [`provision`](Self::provision).
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// The previously downloaded viewer, if present.
    pub fn installed(&self) -> Option<PathBuf> {
        self.destination.is_file().then(|| self.destination.clone())
    }

    /// Download the viewer, trying each URL in order.
    pub fn provision(&self) -> Result<PathBuf> {
        if self.urls.is_empty() {
            return Err(ScanDeskError::Download("no download source configured".into()));
        }
        if let Some(parent) = self.destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut last_error = String::new();
        for url in &self.urls {
            info!(url, "Downloading viewer");
            match self.fetcher.fetch(url, &self.destination) {
                Ok(()) => {
                    info!(path = %self.destination.display(), "Viewer installed");
                    return Ok(self.destination.clone());
                }
                Err(err) => {
                    warn!(url, error = %err, "Viewer download failed");
                    last_error = err.to_string();
                }
            }
        }
        Err(ScanDeskError::Download(format!(
            "all download sources failed: {last_error}"
        )))
    }

    /// Download after asking the user; `None` when declined or failed.
    pub fn provision_with_consent(&self) -> Option<PathBuf> {
        let question = format!(
            "SumatraPDF is needed for silent PDF printing. Download it to {}?",
            self.destination.display()
        );
        if !self.consent.confirm(&question) {
            info!("Viewer download declined");
            return None;
        }
        self.provision().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scandesk_core::{DuplexMode, PaperSize, PrintQuality};
    use std::sync::Mutex;

    #[test]
    fn no_options_uses_default_string() {
        assert_eq!(
            viewer_settings(&PrintSettings::default(), "color,duplexshort"),
            "color,duplexshort"
        );
        let quality_only = PrintSettings {
            quality: Some(PrintQuality::High),
            ..PrintSettings::default()
        };
        assert_eq!(viewer_settings(&quality_only, "color"), "color");
    }

    #[test]
    fn options_translate_to_keywords() {
        let settings = PrintSettings {
            copies: Some(3),
            duplex: Some(DuplexMode::Vertical),
            orientation: Some(Orientation::Landscape),
            paper_size: Some(PaperSize::Letter),
            color: Some(false),
            ..PrintSettings::default()
        };
        assert_eq!(
            viewer_settings(&settings, "color"),
            "3x,duplexlong,landscape,paper=letter,monochrome"
        );
    }

    #[test]
    fn command_line_shape() {
        let cmd = viewer_command(
            Path::new("SumatraPDF.exe"),
            "Office",
            "color",
            Path::new("doc.pdf"),
            Duration::from_secs(60),
        );
        let args: Vec<_> = cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["-print-to", "Office", "-print-settings", "color", "-silent", "-exit-when-done", "doc.pdf"]
        );
        assert_eq!(cmd.timeout, Duration::from_secs(60));
    }

    struct FlakyFetcher {
        urls: Mutex<Vec<String>>,
    }

    impl ViewerFetcher for FlakyFetcher {
        fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
            self.urls.lock().unwrap().push(url.to_string());
            if url.contains("-64") {
                return Err(ScanDeskError::Download("404".into()));
            }
            std::fs::write(destination, b"MZ").unwrap();
            Ok(())
        }
    }

    struct Accept;

    impl DownloadConsent for Accept {
        fn confirm(&self, _question: &str) -> bool {
            true
        }
    }

    #[test]
    fn provisioning_falls_back_to_second_url() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FlakyFetcher { urls: Mutex::new(Vec::new()) });
        let download = ViewerDownload {
            install_path: Some(dir.path().join("tools").join("SumatraPDF.exe")),
            ..ViewerDownload::default()
        };
        let provisioner = ViewerProvisioner::new(fetcher.clone(), Arc::new(Accept), &download);

        assert!(provisioner.installed().is_none());
        let path = provisioner.provision_with_consent().unwrap();
        assert_eq!(path, dir.path().join("tools").join("SumatraPDF.exe"));
        assert_eq!(fetcher.urls.lock().unwrap().len(), 2);
        assert!(provisioner.installed().is_some());
    }

    #[test]
    fn declined_download_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FlakyFetcher { urls: Mutex::new(Vec::new()) });
        let download = ViewerDownload {
            install_path: Some(dir.path().join("SumatraPDF.exe")),
            ..ViewerDownload::default()
        };
        let provisioner = ViewerProvisioner::new(fetcher.clone(), Arc::new(DenyDownload), &download);
        assert!(provisioner.provision_with_consent().is_none());
        assert!(fetcher.urls.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_url_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let download = ViewerDownload {
            urls: vec![],
            install_path: Some(dir.path().join("SumatraPDF.exe")),
        };
        let provisioner = ViewerProvisioner::new(
            Arc::new(FlakyFetcher { urls: Mutex::new(Vec::new()) }),
            Arc::new(DenyDownload),
            &download,
        );
        assert!(matches!(provisioner.provision(), Err(ScanDeskError::Download(_))));
    }
}

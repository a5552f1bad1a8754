// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF page rasterization through an external renderer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use scandesk_bridge::{ProcessRunner, ToolCommand};
use scandesk_core::error::{Result, ScanDeskError};

use crate::tools::{Tool, ToolLocator};

/// Resolution pages are rendered at before being printed as images.
pub const RASTER_DPI: u32 = 300;

/// Renders each page of a PDF to an image file.
pub trait PageConverter: Send + Sync {
    /// Write one image per page into `out_dir`, returned in page order.
    fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>>;
}

/// Renders pages with Ghostscript, or pdftoppm when Ghostscript is absent.
pub struct ToolRasterizer {
    runner: Arc<dyn ProcessRunner>,
    tools: ToolLocator,
    timeout: Duration,
}

impl ToolRasterizer {
    pub fn new(runner: Arc<dyn ProcessRunner>, tools: ToolLocator, timeout: Duration) -> Self {
        Self {
            runner,
            tools,
            timeout,
        }
    }
}

impl PageConverter for ToolRasterizer {
    fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> Result<Vec<PathBuf>> {
        let command = if let Some(gs) = self.tools.locate(Tool::Ghostscript) {
            ghostscript_command(&gs, pdf, out_dir, dpi, self.timeout)
        } else if let Some(pdftoppm) = self.tools.locate(Tool::Pdftoppm) {
            pdftoppm_command(&pdftoppm, pdf, out_dir, dpi, self.timeout)
        } else {
            return Err(ScanDeskError::ToolMissing(
                "Ghostscript or pdftoppm".into(),
            ));
        };

        let name = command.display_name();
        self.runner.run(&command)?.into_result(&name)?;
        let pages = collect_pages(out_dir)?;
        info!(pages = pages.len(), tool = %name, "Rasterized PDF");
        Ok(pages)
    }
}

pub fn ghostscript_command(
    gs: &Path,
    pdf: &Path,
    out_dir: &Path,
    dpi: u32,
    timeout: Duration,
) -> ToolCommand {
    let mut output = out_dir.as_os_str().to_os_string();
    output.push(std::path::MAIN_SEPARATOR_STR);
    output.push("page_%03d.png");
    let mut output_arg = std::ffi::OsString::from("-sOutputFile=");
    output_arg.push(output);

    ToolCommand::new(gs, timeout)
        .args(["-dNOPAUSE", "-dBATCH", "-dQUIET", "-sDEVICE=png16m"])
        .arg(format!("-r{dpi}"))
        .arg(output_arg)
        .arg(pdf)
}

pub fn pdftoppm_command(
    pdftoppm: &Path,
    pdf: &Path,
    out_dir: &Path,
    dpi: u32,
    timeout: Duration,
) -> ToolCommand {
    ToolCommand::new(pdftoppm, timeout)
        .arg("-r")
        .arg(dpi.to_string())
        .arg("-png")
        .arg(pdf)
        .arg(out_dir.join("page"))
}

/// PNG files in `dir`, sorted by name.
fn collect_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    pages.sort();
    debug!(count = pages.len(), dir = %dir.display(), "Collected rendered pages");
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scandesk_bridge::ToolOutput;
    use scandesk_core::config::ToolSearchPaths;
    use std::sync::Mutex;

    #[test]
    fn ghostscript_renders_png16m_at_requested_dpi() {
        let cmd = ghostscript_command(
            Path::new("gswin64c.exe"),
            Path::new("in.pdf"),
            Path::new("out"),
            300,
            Duration::from_secs(120),
        );
        let args: Vec<_> = cmd.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert!(args.contains(&"-sDEVICE=png16m".to_string()));
        assert!(args.contains(&"-r300".to_string()));
        let output = format!("-sOutputFile=out{}page_%03d.png", std::path::MAIN_SEPARATOR);
        assert!(args.contains(&output), "{args:?}");
        assert_eq!(args.last().unwrap(), "in.pdf");
    }

    #[test]
    fn pdftoppm_uses_page_prefix() {
        let cmd = pdftoppm_command(
            Path::new("pdftoppm"),
            Path::new("in.pdf"),
            Path::new("out"),
            150,
            Duration::from_secs(5),
        );
        assert_eq!(cmd.args[0], "-r");
        assert_eq!(cmd.args[1], "150");
        assert_eq!(Path::new(&cmd.args[4]), Path::new("out").join("page"));
    }

    struct RenderingRunner {
        calls: Mutex<usize>,
    }

    impl ProcessRunner for RenderingRunner {
        fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
            *self.calls.lock().unwrap() += 1;
            let out_dir = Path::new(command.args.last().unwrap()).parent().unwrap();
            for name in ["page-2.png", "page-1.png", "notes.txt"] {
                std::fs::write(out_dir.join(name), b"").unwrap();
            }
            Ok(ToolOutput {
                status: Some(0),
                ..ToolOutput::default()
            })
        }
    }

    #[test]
    fn pages_come_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let pdftoppm = dir.path().join("pdftoppm");
        std::fs::write(&pdftoppm, b"").unwrap();
        let out = dir.path().join("pages");
        std::fs::create_dir(&out).unwrap();

        let tools = ToolLocator::without_path_lookup(ToolSearchPaths {
            ghostscript: vec![],
            pdftoppm: vec![pdftoppm.display().to_string()],
            ..ToolSearchPaths::default()
        });
        let runner = Arc::new(RenderingRunner { calls: Mutex::new(0) });
        let rasterizer = ToolRasterizer::new(runner.clone(), tools, Duration::from_secs(5));

        let pages = rasterizer
            .rasterize(Path::new("in.pdf"), &out, RASTER_DPI)
            .unwrap();
        assert_eq!(pages, vec![out.join("page-1.png"), out.join("page-2.png")]);
        assert_eq!(*runner.calls.lock().unwrap(), 1);
    }

    #[test]
    fn no_renderer_is_tool_missing() {
        let tools = ToolLocator::without_path_lookup(ToolSearchPaths {
            ghostscript: vec![],
            pdftoppm: vec![],
            ..ToolSearchPaths::default()
        });
        let runner = Arc::new(RenderingRunner { calls: Mutex::new(0) });
        let rasterizer = ToolRasterizer::new(runner.clone(), tools, Duration::from_secs(5));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            rasterizer.rasterize(Path::new("in.pdf"), dir.path(), RASTER_DPI),
            Err(ScanDeskError::ToolMissing(_))
        ));
        assert_eq!(*runner.calls.lock().unwrap(), 0);
    }
}

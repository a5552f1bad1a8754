// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF print paths driven by external programs.

use std::ffi::OsString;

use tracing::{debug, warn};

use scandesk_bridge::ToolCommand;
use scandesk_core::error::{Result, ScanDeskError};

use super::{missing, run_tool, secs};
use crate::default_printer::DefaultPrinterGuard;
use crate::rasterize::RASTER_DPI;
use crate::strategy::{Attempt, ChainContext, ChainRun, PrintStrategy, StrategyOutcome, outcome_of};
use crate::tools::Tool;

const PDF: &[&str] = &["pdf"];

/// Ghostscript rendering straight to a Windows printer (`mswinpr2`).
pub struct VendorRasterizerPrint;

impl PrintStrategy for VendorRasterizerPrint {
    fn name(&self) -> &'static str {
        "VendorRasterizerPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PDF)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_ghostscript(attempt, ctx))
    }
}

fn print_with_ghostscript(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let gs = ctx
        .env
        .tools
        .locate(Tool::Ghostscript)
        .ok_or_else(|| missing(Tool::Ghostscript.label()))?;
    let mut command = ToolCommand::new(gs, secs(ctx.env.timeouts.rasterizer_secs))
        .args(["-dNOPAUSE", "-dBATCH", "-dQUIET", "-sDEVICE=mswinpr2"])
        .arg(format!("-sOutputFile=%printer%{}", attempt.printer));
    if let Some(copies) = attempt.settings.copies {
        command = command.arg(format!("-dNumCopies={copies}"));
    }
    run_tool(ctx, &command.arg(attempt.path))?;
    Ok("Ghostscript mswinpr2".into())
}

/// Installed PDF reader printing to the (temporarily switched) default.
pub struct PdfReaderAppPrint;

impl PrintStrategy for PdfReaderAppPrint {
    fn name(&self) -> &'static str {
        "PdfReaderAppPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PDF)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_reader(attempt, ctx))
    }
}

fn print_with_reader(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let reader = ctx
        .env
        .tools
        .locate(Tool::PdfReader)
        .ok_or_else(|| missing(Tool::PdfReader.label()))?;
    let _default = DefaultPrinterGuard::switch(ctx.env.bridge.as_ref(), attempt.printer)?;
    let command = ToolCommand::new(reader, secs(ctx.env.timeouts.reader_secs))
        .arg("/t")
        .arg(attempt.path)
        .arg(attempt.printer)
        .arg("/h");
    run_tool(ctx, &command)?;
    Ok("PDF reader /t".into())
}

/// Render every page to an image and print the pages one by one.
pub struct RasterizeThenPerPagePrint;

impl PrintStrategy for RasterizeThenPerPagePrint {
    fn name(&self) -> &'static str {
        "RasterizeThenPerPagePrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PDF)
    }

    fn recursive(&self) -> bool {
        true
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        let staging = match ctx.env.temp_builder().tempdir() {
            Ok(dir) => dir,
            Err(err) => return StrategyOutcome::Failed(err.to_string()),
        };
        let pages = match ctx.env.pages.rasterize(attempt.path, staging.path(), RASTER_DPI) {
            Ok(pages) => pages,
            Err(ScanDeskError::ToolMissing(tool)) => {
                return StrategyOutcome::Skipped(format!("{tool} not found"));
            }
            Err(err) => return StrategyOutcome::Failed(err.to_string()),
        };
        if pages.is_empty() {
            return StrategyOutcome::Failed("renderer produced no pages".into());
        }

        let total = pages.len();
        for (index, page) in pages.iter().enumerate() {
            match ctx.reenter(page, attempt.depth + 1) {
                ChainRun::Printed { strategy, .. } => {
                    debug!(page = index + 1, total, strategy, "Page printed");
                }
                ChainRun::Exhausted { .. } => {
                    warn!(page = index + 1, total, "Page could not be printed");
                    return StrategyOutcome::Failed(format!(
                        "page {} of {total} could not be printed",
                        index + 1
                    ));
                }
            }
        }
        StrategyOutcome::Success(format!("{total} page(s) rasterized at {RASTER_DPI} dpi"))
    }
}

/// Chrome or Edge in headless mode.
pub struct BrowserHeadlessPrint;

impl PrintStrategy for BrowserHeadlessPrint {
    fn name(&self) -> &'static str {
        "BrowserHeadlessPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(PDF)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_browser(attempt, ctx))
    }
}

fn print_with_browser(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let browser = ctx
        .env
        .tools
        .locate(Tool::Browser)
        .ok_or_else(|| missing(Tool::Browser.label()))?;
    let _default = DefaultPrinterGuard::switch(ctx.env.bridge.as_ref(), attempt.printer)?;
    let command = ToolCommand::new(browser, secs(ctx.env.timeouts.browser_secs))
        .args(["--headless", "--disable-gpu", "--print-to-pdf-no-header"])
        .arg(format!("--print-to-printer={}", attempt.printer))
        .arg(file_url(attempt.path)?);
    run_tool(ctx, &command)?;
    Ok("headless browser".into())
}

/// `file:///` URL for a local path, with forward slashes.
fn file_url(path: &std::path::Path) -> Result<OsString> {
    let absolute = std::path::absolute(path)?;
    let text = absolute.to_string_lossy().replace('\\', "/");
    Ok(format!("file:///{}", text.trim_start_matches('/')).into())
}

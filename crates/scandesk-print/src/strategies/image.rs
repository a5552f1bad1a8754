// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image print paths.

use scandesk_bridge::ToolCommand;
use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{IMAGE_EXTENSIONS, OutputFormat};
use scandesk_document::{FormatConverter, ImageProcessor};

use super::{document_name, missing, outcome_of_run, run_tool, secs};
use crate::strategy::{Attempt, ChainContext, PrintStrategy, StrategyOutcome, outcome_of};
use crate::tools::Tool;

/// Windows photo viewer `ImageView_PrintTo` through rundll32.
pub struct SpecializedImagePrint;

impl PrintStrategy for SpecializedImagePrint {
    fn name(&self) -> &'static str {
        "SpecializedImagePrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(IMAGE_EXTENSIONS)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_photo_viewer(attempt, ctx))
    }
}

fn print_with_photo_viewer(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let rundll = ctx
        .env
        .tools
        .locate(Tool::PhotoViewer)
        .ok_or_else(|| missing(Tool::PhotoViewer.label()))?;
    let command = ToolCommand::new(rundll, secs(ctx.env.timeouts.photo_viewer_secs))
        .args(["shimgvw.dll,ImageView_PrintTo", "/pt"])
        .arg(attempt.path)
        .arg(attempt.printer);
    run_tool(ctx, &command)?;
    Ok("photo viewer print-to".into())
}

/// Convert the image to a one-page PDF and print that through the cascade.
pub struct ImageToPdfThenRetry;

impl PrintStrategy for ImageToPdfThenRetry {
    fn name(&self) -> &'static str {
        "ImageToPdfThenRetry"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(IMAGE_EXTENSIONS)
    }

    fn recursive(&self) -> bool {
        true
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        let staging = match ctx.env.temp_builder().tempdir() {
            Ok(dir) => dir,
            Err(err) => return StrategyOutcome::Failed(err.to_string()),
        };
        let pdf = match image_to_pdf(attempt, staging.path()) {
            Ok(pdf) => pdf,
            Err(err) => return StrategyOutcome::Failed(err.to_string()),
        };
        let run = ctx.reenter(&pdf, attempt.depth + 1);
        outcome_of_run(run, "converted to PDF")
    }
}

/// Write `<dir>/<stem>.pdf` from the attempt's image, page-fitted to the
/// requested paper (A4 by default).
pub(crate) fn image_to_pdf(attempt: &Attempt<'_>, dir: &std::path::Path) -> Result<std::path::PathBuf> {
    let stem = attempt
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    let output = dir.join(format!("{stem}.pdf"));
    FormatConverter::new().convert(
        attempt.path,
        OutputFormat::Pdf,
        attempt.settings.paper_size,
        &output,
    )
}

/// Decoded RGB pixels written straight to the spooler.
pub struct RawImageSpoolerWrite;

impl PrintStrategy for RawImageSpoolerWrite {
    fn name(&self) -> &'static str {
        "RawImageSpoolerWrite"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(IMAGE_EXTENSIONS)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(write_raw_image(attempt, ctx))
    }
}

fn write_raw_image(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let image = ImageProcessor::open(attempt.path)
        .map_err(|err| ScanDeskError::Conversion(err.to_string()))?;
    let bytes = image.to_rgb_bytes();
    ctx.env
        .bridge
        .write_raw(attempt.printer, &document_name(attempt.path), &bytes)?;
    Ok(format!("{} bytes of raw RGB", bytes.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ChainRun;
    use crate::test_support::{MockBridge, ScriptedRunner, test_env, write_png};
    use scandesk_core::PrintSettings;
    use std::sync::Arc;

    #[test]
    fn photo_viewer_gets_print_to_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::succeeding());
        let mut env = test_env(Arc::new(MockBridge::default()), runner.clone(), dir.path());
        let rundll = dir.path().join("rundll32.exe");
        std::fs::write(&rundll, b"").unwrap();
        env.tools = crate::test_support::tools_with(|paths| {
            paths.photo_viewer = vec![rundll.display().to_string()]
        });

        let image = write_png(dir.path(), "photo.png");
        let settings = PrintSettings::default();
        let chain = super::super::silent_chain();
        let ctx = ChainContext::new(&env, &chain, "Lab", &settings, true, true);
        let run = ctx.run(&[Box::new(SpecializedImagePrint) as Box<dyn PrintStrategy>], &image, 0);

        assert!(matches!(run, ChainRun::Printed { strategy: "SpecializedImagePrint", .. }));
        let call = &runner.calls()[0];
        assert_eq!(call.program, rundll);
        assert_eq!(call.args[0], "shimgvw.dll,ImageView_PrintTo");
        assert_eq!(call.args[3], "Lab");
        assert_eq!(call.timeout, secs(10));
    }

    #[test]
    fn raw_write_sends_rgb_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(MockBridge::default());
        let env = test_env(bridge.clone(), Arc::new(ScriptedRunner::succeeding()), dir.path());
        let image = write_png(dir.path(), "scan.png");
        let settings = PrintSettings::default();
        let chain = super::super::silent_chain();
        let ctx = ChainContext::new(&env, &chain, "Lab", &settings, true, true);

        let run = ctx.run(&[Box::new(RawImageSpoolerWrite) as Box<dyn PrintStrategy>], &image, 1);
        assert!(matches!(run, ChainRun::Printed { .. }));
        let writes = bridge.raw_writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, "Lab");
        assert_eq!(writes[0].1, "scan.png");
        // write_png produces 4x3 pixels.
        assert_eq!(writes[0].2, 4 * 3 * 3);
    }

    #[test]
    fn converted_pdf_goes_back_through_the_cascade() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(MockBridge::default());
        let env = test_env(bridge.clone(), Arc::new(ScriptedRunner::succeeding()), dir.path());
        let image = write_png(dir.path(), "receipt.png");
        let settings = PrintSettings::default();
        let chain = super::super::silent_chain();
        let ctx = ChainContext::new(&env, &chain, "Lab", &settings, true, true);

        let run = ctx.run(&[Box::new(ImageToPdfThenRetry) as Box<dyn PrintStrategy>], &image, 0);
        assert!(matches!(run, ChainRun::Printed { strategy: "ImageToPdfThenRetry", .. }));

        // No tools are installed, so the shell verb picks up the PDF.
        let shell = bridge.shell_calls();
        assert_eq!(shell.len(), 1);
        assert!(shell[0].ends_with("receipt.pdf"));
        assert!(!shell[0].exists(), "temporary PDF must be removed");
        assert!(ctx.records().iter().any(|r| r.strategy == "ShellPrintVerb" && r.depth == 1));
    }
}

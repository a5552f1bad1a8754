// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Concrete print strategies and the two standard chains.

pub mod image;
pub mod pdf;
pub mod script;
pub mod shell;
pub mod spooler;
pub mod viewer;

use std::path::Path;
use std::time::Duration;

use scandesk_bridge::ToolCommand;
use scandesk_core::error::{Result, ScanDeskError};

use crate::strategy::{ChainContext, ChainRun, PrintStrategy, StrategyOutcome};

/// The no-dialog cascade, in priority order.
pub fn silent_chain() -> Vec<Box<dyn PrintStrategy>> {
    vec![
        Box::new(image::SpecializedImagePrint),
        Box::new(pdf::VendorRasterizerPrint),
        Box::new(spooler::RawSpoolerWrite),
        Box::new(viewer::ThirdPartyViewerPrint),
        Box::new(pdf::PdfReaderAppPrint),
        Box::new(script::ScriptedPrint),
        Box::new(shell::ShellPrintVerb::documents_only()),
        Box::new(image::ImageToPdfThenRetry),
        Box::new(image::RawImageSpoolerWrite),
        Box::new(pdf::RasterizeThenPerPagePrint),
        Box::new(pdf::BrowserHeadlessPrint),
        Box::new(script::ScriptedShellExecutePrint),
    ]
}

/// Last-resort chain, tried after the cascade or instead of it. The shell
/// verb may bring up an application window.
pub fn dialog_chain() -> Vec<Box<dyn PrintStrategy>> {
    vec![
        Box::new(script::ScriptHostSilentPrint),
        Box::new(shell::ShellPrintVerb::any_type()),
        Box::new(spooler::DirectSpoolerPrint),
    ]
}

/// Run `command` and turn a non-zero exit into an error.
pub(crate) fn run_tool(ctx: &ChainContext<'_>, command: &ToolCommand) -> Result<String> {
    let name = command.display_name();
    ctx.env.runner.run(command)?.into_result(&name)
}

pub(crate) fn secs(value: u64) -> Duration {
    Duration::from_secs(value)
}

/// File name used as the spooler document name.
pub(crate) fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ScanDesk document".into())
}

/// Write a helper script into a fresh prefixed temp file.
pub(crate) fn temp_script(
    ctx: &ChainContext<'_>,
    suffix: &'static str,
    contents: &str,
) -> Result<tempfile::NamedTempFile> {
    let mut script = ctx.env.temp_builder().suffix(suffix).tempfile()?;
    std::io::Write::write_all(&mut script, contents.as_bytes())?;
    Ok(script)
}

/// Outcome of a strategy that handed a derived file back to the cascade.
pub(crate) fn outcome_of_run(run: ChainRun, what: &str) -> StrategyOutcome {
    match run {
        ChainRun::Printed { strategy, .. } => {
            StrategyOutcome::Success(format!("{what}, printed via {strategy}"))
        }
        ChainRun::Exhausted { .. } => {
            StrategyOutcome::Failed(format!("{what}, but nothing could print the result"))
        }
    }
}

pub(crate) fn missing(label: &str) -> ScanDeskError {
    ScanDeskError::ToolMissing(label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn chains_have_the_documented_order() {
        let names: Vec<_> = silent_chain().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            [
                "SpecializedImagePrint",
                "VendorRasterizerPrint",
                "RawSpoolerWrite",
                "ThirdPartyViewerPrint",
                "PdfReaderAppPrint",
                "ScriptedPrint",
                "ShellPrintVerb",
                "ImageToPdfThenRetry",
                "RawImageSpoolerWrite",
                "RasterizeThenPerPagePrint",
                "BrowserHeadlessPrint",
                "ScriptedShellExecutePrint",
            ]
        );
        let dialog: Vec<_> = dialog_chain().iter().map(|s| s.name()).collect();
        assert_eq!(dialog, ["ScriptHostSilentPrint", "ShellPrintVerb", "DirectSpoolerPrint"]);
    }

    #[test]
    fn only_conversions_recurse() {
        let recursive: HashSet<_> = silent_chain()
            .iter()
            .filter(|s| s.recursive())
            .map(|s| s.name())
            .collect();
        assert_eq!(
            recursive,
            HashSet::from(["ImageToPdfThenRetry", "RasterizeThenPerPagePrint"])
        );
        assert!(dialog_chain().iter().all(|s| !s.recursive()));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Silent printing through the third-party document viewer.

use scandesk_core::VIEWER_EXTENSIONS;
use scandesk_core::error::Result;

use super::{missing, run_tool, secs};
use crate::strategy::{Attempt, ChainContext, PrintStrategy, StrategyOutcome, outcome_of};
use crate::tools::Tool;
use crate::viewer::{viewer_command, viewer_settings};

pub struct ThirdPartyViewerPrint;

impl PrintStrategy for ThirdPartyViewerPrint {
    fn name(&self) -> &'static str {
        "ThirdPartyViewerPrint"
    }

    fn extensions(&self) -> Option<&'static [&'static str]> {
        Some(VIEWER_EXTENSIONS)
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
        outcome_of(print_with_viewer(attempt, ctx))
    }
}

fn print_with_viewer(attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> Result<String> {
    let env = ctx.env;
    let viewer = env
        .find_viewer()
        .or_else(|| env.viewer.provision_with_consent())
        .ok_or_else(|| missing(Tool::Viewer.label()))?;
    let settings = viewer_settings(attempt.settings, &env.viewer_defaults);
    let command = viewer_command(
        &viewer,
        attempt.printer,
        &settings,
        attempt.path,
        secs(env.timeouts.viewer_secs),
    );
    run_tool(ctx, &command)?;
    Ok(format!("viewer -print-settings {settings}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::ChainRun;
    use crate::test_support::{MockBridge, ScriptedRunner, test_env, tools_with};
    use scandesk_core::{DuplexMode, PrintSettings};
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn uses_translated_settings() {
        let dir = tempfile::tempdir().unwrap();
        let viewer = dir.path().join("SumatraPDF.exe");
        std::fs::write(&viewer, b"").unwrap();
        let runner = Arc::new(ScriptedRunner::succeeding());
        let mut env = test_env(Arc::new(MockBridge::default()), runner.clone(), dir.path());
        env.tools = tools_with(|paths| paths.viewer = vec![viewer.display().to_string()]);

        let settings = PrintSettings {
            duplex: Some(DuplexMode::Simplex),
            ..PrintSettings::default()
        };
        let chain = crate::strategies::silent_chain();
        let ctx = ChainContext::new(&env, &chain, "Lab", &settings, true, true);
        let run = ctx.run(
            &[Box::new(ThirdPartyViewerPrint) as Box<dyn PrintStrategy>],
            Path::new("book.epub"),
            0,
        );
        assert!(matches!(run, ChainRun::Printed { .. }));
        let call = &runner.calls()[0];
        assert_eq!(call.program, viewer);
        assert_eq!(call.args[3], "simplex");
        assert_eq!(call.timeout, secs(60));
    }

    #[test]
    fn missing_viewer_without_consent_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::succeeding());
        let env = test_env(Arc::new(MockBridge::default()), runner.clone(), dir.path());
        let settings = PrintSettings::default();
        let chain = crate::strategies::silent_chain();
        let ctx = ChainContext::new(&env, &chain, "Lab", &settings, true, true);

        let run = ctx.run(
            &[Box::new(ThirdPartyViewerPrint) as Box<dyn PrintStrategy>],
            Path::new("doc.pdf"),
            0,
        );
        assert_eq!(run, ChainRun::Exhausted { executed: 0 });
        assert!(runner.calls().is_empty());
    }
}

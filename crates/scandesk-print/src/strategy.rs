// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print strategies and the chain runner.
//
// A chain is an ordered list of strategies. The runner skips strategies that
// do not apply to the file, runs the rest in order, and stops at the first
// success. Strategy failures are recorded and absorbed. Recursive strategies
// re-enter the silent chain for a derived file one level deeper; they only
// run on the original document, and the runner refuses anything deeper than
// `MAX_DEPTH`.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use scandesk_core::{PrintSettings, extension_of};

use crate::env::PrintEnvironment;

/// Deepest re-entry the runner accepts.
pub const MAX_DEPTH: u8 = 2;

/// What one strategy did with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Success(String),
    /// Did not apply, or a precondition such as a missing tool failed.
    Skipped(String),
    Failed(String),
}

impl StrategyOutcome {
    pub fn executed(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(detail) => write!(f, "printed ({detail})"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// The file being printed and how.
#[derive(Debug, Clone)]
pub struct Attempt<'a> {
    pub path: &'a Path,
    /// Lowercased, without the dot.
    pub extension: String,
    pub printer: &'a str,
    pub settings: &'a PrintSettings,
    pub depth: u8,
    pub silent: bool,
    pub use_shell_fallback: bool,
}

pub trait PrintStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extensions this strategy handles; `None` accepts any file.
    fn extensions(&self) -> Option<&'static [&'static str]>;

    /// Whether the strategy re-enters the chain for a derived file.
    fn recursive(&self) -> bool {
        false
    }

    fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome;
}

/// One row of the attempt log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    pub strategy: &'static str,
    pub depth: u8,
    pub outcome: StrategyOutcome,
}

/// Result of running one chain over one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainRun {
    Printed {
        strategy: &'static str,
        detail: String,
    },
    Exhausted {
        /// Strategies that executed rather than being skipped.
        executed: usize,
    },
}

/// Shared state for one print request.
pub struct ChainContext<'a> {
    pub env: &'a PrintEnvironment,
    silent_chain: &'a [Box<dyn PrintStrategy>],
    printer: &'a str,
    settings: &'a PrintSettings,
    silent: bool,
    use_shell_fallback: bool,
    records: RefCell<Vec<AttemptRecord>>,
}

impl<'a> ChainContext<'a> {
    pub fn new(
        env: &'a PrintEnvironment,
        silent_chain: &'a [Box<dyn PrintStrategy>],
        printer: &'a str,
        settings: &'a PrintSettings,
        silent: bool,
        use_shell_fallback: bool,
    ) -> Self {
        Self {
            env,
            silent_chain,
            printer,
            settings,
            silent,
            use_shell_fallback,
            records: RefCell::new(Vec::new()),
        }
    }

    /// Run `chain` over `path` at `depth`.
    pub fn run(&self, chain: &[Box<dyn PrintStrategy>], path: &Path, depth: u8) -> ChainRun {
        if depth > MAX_DEPTH {
            warn!(depth, path = %path.display(), "Refusing to print deeper than the recursion limit");
            return ChainRun::Exhausted { executed: 0 };
        }

        let attempt = Attempt {
            path,
            extension: extension_of(path),
            printer: self.printer,
            settings: self.settings,
            depth,
            silent: self.silent,
            use_shell_fallback: self.use_shell_fallback,
        };

        let mut executed = 0;
        for strategy in chain {
            let outcome = evaluate(strategy.as_ref(), &attempt, self);
            debug!(strategy = strategy.name(), depth, %outcome, "Strategy evaluated");
            if let StrategyOutcome::Failed(reason) = &outcome {
                warn!(strategy = strategy.name(), depth, reason = %reason, "Print strategy failed");
            }
            if outcome.executed() {
                executed += 1;
            }
            let printed = match &outcome {
                StrategyOutcome::Success(detail) => Some(detail.clone()),
                _ => None,
            };
            self.records.borrow_mut().push(AttemptRecord {
                strategy: strategy.name(),
                depth,
                outcome,
            });
            if let Some(detail) = printed {
                info!(strategy = strategy.name(), depth, file = %path.display(), "Printed");
                return ChainRun::Printed {
                    strategy: strategy.name(),
                    detail,
                };
            }
        }
        ChainRun::Exhausted { executed }
    }

    /// Print a derived file through the silent chain at `depth`.
    pub fn reenter(&self, path: &Path, depth: u8) -> ChainRun {
        self.run(self.silent_chain, path, depth)
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records.borrow().clone()
    }

    pub fn into_records(self) -> Vec<AttemptRecord> {
        self.records.into_inner()
    }
}

fn evaluate(strategy: &dyn PrintStrategy, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
    if let Some(extensions) = strategy.extensions() {
        if !extensions.contains(&attempt.extension.as_str()) {
            return StrategyOutcome::Skipped(format!("does not handle .{}", attempt.extension));
        }
    }
    if strategy.recursive() && attempt.depth > 0 {
        return StrategyOutcome::Skipped("only runs on the original document".into());
    }
    strategy.execute(attempt, ctx)
}

/// Fold a fallible strategy body into an outcome.
pub(crate) fn outcome_of(result: scandesk_core::error::Result<String>) -> StrategyOutcome {
    match result {
        Ok(detail) => StrategyOutcome::Success(detail),
        Err(scandesk_core::ScanDeskError::ToolMissing(tool)) => {
            StrategyOutcome::Skipped(format!("{tool} not found"))
        }
        Err(err) => StrategyOutcome::Failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedRunner, test_env};
    use crate::test_support::MockBridge;
    use std::sync::Arc;

    const TXT: &[&str] = &["txt"];

    struct Fixed {
        name: &'static str,
        exts: Option<&'static [&'static str]>,
        outcome: StrategyOutcome,
    }

    impl PrintStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }
        fn extensions(&self) -> Option<&'static [&'static str]> {
            self.exts
        }
        fn execute(&self, _attempt: &Attempt<'_>, _ctx: &ChainContext<'_>) -> StrategyOutcome {
            self.outcome.clone()
        }
    }

    /// Re-enters the chain for the same file at every level.
    struct RecurseForever;

    impl PrintStrategy for RecurseForever {
        fn name(&self) -> &'static str {
            "RecurseForever"
        }
        fn extensions(&self) -> Option<&'static [&'static str]> {
            None
        }
        fn execute(&self, attempt: &Attempt<'_>, ctx: &ChainContext<'_>) -> StrategyOutcome {
            match ctx.reenter(attempt.path, attempt.depth + 1) {
                ChainRun::Printed { .. } => StrategyOutcome::Success("nested".into()),
                ChainRun::Exhausted { .. } => StrategyOutcome::Failed("nested chain exhausted".into()),
            }
        }
    }

    fn boxed(strategies: Vec<Box<dyn PrintStrategy>>) -> Vec<Box<dyn PrintStrategy>> {
        strategies
    }

    #[test]
    fn first_success_stops_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let env = test_env(Arc::new(MockBridge::default()), Arc::new(ScriptedRunner::succeeding()), dir.path());
        let chain = boxed(vec![
            Box::new(Fixed { name: "a", exts: Some(TXT), outcome: StrategyOutcome::Success("x".into()) }),
            Box::new(Fixed { name: "b", exts: None, outcome: StrategyOutcome::Failed("boom".into()) }),
            Box::new(Fixed { name: "c", exts: None, outcome: StrategyOutcome::Success("done".into()) }),
            Box::new(Fixed { name: "d", exts: None, outcome: StrategyOutcome::Success("never".into()) }),
        ]);
        let settings = PrintSettings::default();
        let ctx = ChainContext::new(&env, &chain, "Office", &settings, true, true);

        let run = ctx.run(&chain, Path::new("doc.pdf"), 0);
        assert_eq!(run, ChainRun::Printed { strategy: "c", detail: "done".into() });
        let names: Vec<_> = ctx.records().iter().map(|r| r.strategy).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(matches!(ctx.records()[0].outcome, StrategyOutcome::Skipped(_)));
    }

    #[test]
    fn exhaustion_counts_executed_strategies() {
        let dir = tempfile::tempdir().unwrap();
        let env = test_env(Arc::new(MockBridge::default()), Arc::new(ScriptedRunner::succeeding()), dir.path());
        let chain = boxed(vec![
            Box::new(Fixed { name: "a", exts: None, outcome: StrategyOutcome::Skipped("no tool".into()) }),
            Box::new(Fixed { name: "b", exts: None, outcome: StrategyOutcome::Failed("boom".into()) }),
        ]);
        let settings = PrintSettings::default();
        let ctx = ChainContext::new(&env, &chain, "Office", &settings, true, true);
        assert_eq!(ctx.run(&chain, Path::new("a.pdf"), 0), ChainRun::Exhausted { executed: 1 });
    }

    #[test]
    fn recursion_stops_at_the_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let env = test_env(Arc::new(MockBridge::default()), Arc::new(ScriptedRunner::succeeding()), dir.path());
        let chain = boxed(vec![Box::new(RecurseForever)]);
        let settings = PrintSettings::default();
        let ctx = ChainContext::new(&env, &chain, "Office", &settings, true, true);

        let run = ctx.run(&chain, Path::new("loop.pdf"), 0);
        assert_eq!(run, ChainRun::Exhausted { executed: 1 });
        let depths: Vec<_> = ctx.records().iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![2, 1, 0]);
        assert!(depths.iter().all(|d| *d <= MAX_DEPTH));
    }

    #[test]
    fn recursive_strategies_skip_derived_files() {
        struct Gated;
        impl PrintStrategy for Gated {
            fn name(&self) -> &'static str {
                "Gated"
            }
            fn extensions(&self) -> Option<&'static [&'static str]> {
                None
            }
            fn recursive(&self) -> bool {
                true
            }
            fn execute(&self, _: &Attempt<'_>, _: &ChainContext<'_>) -> StrategyOutcome {
                StrategyOutcome::Success("ran".into())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let env = test_env(Arc::new(MockBridge::default()), Arc::new(ScriptedRunner::succeeding()), dir.path());
        let chain = boxed(vec![Box::new(Gated)]);
        let settings = PrintSettings::default();
        let ctx = ChainContext::new(&env, &chain, "Office", &settings, true, true);
        assert_eq!(ctx.run(&chain, Path::new("a.png"), 1), ChainRun::Exhausted { executed: 0 });
        assert!(matches!(ctx.run(&chain, Path::new("a.png"), 0), ChainRun::Printed { .. }));
    }

    #[test]
    fn missing_tool_is_a_skip() {
        assert!(matches!(
            outcome_of(Err(scandesk_core::ScanDeskError::ToolMissing("Ghostscript".into()))),
            StrategyOutcome::Skipped(reason) if reason == "Ghostscript not found"
        ));
        assert!(outcome_of(Err(scandesk_core::ScanDeskError::ExternalTool("x".into()))).executed());
    }
}

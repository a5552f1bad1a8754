// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ScanDesk Print — silent print resolution.
//
// A print request runs through a prioritised cascade of strategies (helper
// programs, raw spooler writes, format conversions) until one of them prints
// the file. Helper tools are discovered by glob probing, and the third-party
// viewer can be downloaded on demand.

pub mod default_printer;
pub mod env;
pub mod rasterize;
pub mod resolver;
pub mod strategies;
pub mod strategy;
pub mod tools;
pub mod viewer;

#[cfg(test)]
mod test_support;

pub use default_printer::DefaultPrinterGuard;
pub use env::PrintEnvironment;
pub use resolver::{PrintReport, PrintResolver};
pub use strategy::{AttemptRecord, PrintStrategy, StrategyOutcome};
pub use tools::{Tool, ToolLocator};
pub use viewer::{DenyDownload, DownloadConsent, ViewerProvisioner};

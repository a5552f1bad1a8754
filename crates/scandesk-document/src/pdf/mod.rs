// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — inspecting PDFs and creating them from images.

pub mod reader;
pub mod writer;

pub use reader::PdfReader;
pub use writer::{PdfWriter, Placement, fit_to_page};

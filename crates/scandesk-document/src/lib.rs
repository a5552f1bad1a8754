// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scandesk-document — Document handling for ScanDesk.
//
// Converts captured images between raster formats and into page-fitted PDFs,
// combines several images into one PDF, inspects PDFs, and reads text out of
// images through a cloud vision model.

pub mod convert;
pub mod extract;
pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `scandesk_document::PdfReader` etc.
pub use convert::FormatConverter;
pub use extract::{RecognitionService, TextExtractor, save_extracted_text};
pub use self::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect existing PDF documents using the `lopdf` crate.

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use scandesk_core::error::ScanDeskError;
use tracing::{debug, info, instrument};

/// Read-only view of an existing PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanDeskError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            ScanDeskError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanDeskError> {
        let document = Document::load_mem(data).map_err(|err| {
            ScanDeskError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// (width, height) in points of a 1-indexed page, from its MediaBox
    /// (inherited from the page tree when the page has none).
    pub fn page_size(&self, page_number: u32) -> Result<(f32, f32), ScanDeskError> {
        let pages = self.document.get_pages();
        let page_id: ObjectId = *pages.get(&page_number).ok_or_else(|| {
            ScanDeskError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let mut current = Some(page_id);
        while let Some(node_id) = current {
            let node = self.dictionary(node_id)?;
            if let Ok(media_box) = node.get(b"MediaBox") {
                return media_box_size(media_box);
            }
            current = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        Err(ScanDeskError::PdfError(format!(
            "page {} has no MediaBox",
            page_number
        )))
    }

    /// Operands of every `cm` (transformation matrix) operator in a 1-indexed
    /// page's content, in drawing order.
    pub fn transforms(&self, page_number: u32) -> Result<Vec<[f32; 6]>, ScanDeskError> {
        let page_id = *self.document.get_pages().get(&page_number).ok_or_else(|| {
            ScanDeskError::PdfError(format!("page {} out of range", page_number))
        })?;
        let bytes = self
            .document
            .get_page_content(page_id)
            .map_err(|err| ScanDeskError::PdfError(format!("page {} content: {}", page_number, err)))?;
        let content = Content::decode(&bytes)
            .map_err(|err| ScanDeskError::PdfError(format!("page {} content: {}", page_number, err)))?;

        Ok(content
            .operations
            .iter()
            .filter(|op| op.operator == "cm")
            .filter_map(|op| {
                let values = op.operands.iter().map(number).collect::<Option<Vec<f32>>>()?;
                <[f32; 6]>::try_from(values).ok()
            })
            .collect())
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, ScanDeskError> {
        self.document
            .get_dictionary(id)
            .map_err(|err| ScanDeskError::PdfError(format!("bad page tree node {:?}: {}", id, err)))
    }
}

fn number(value: &Object) -> Option<f32> {
    match value {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn media_box_size(media_box: &Object) -> Result<(f32, f32), ScanDeskError> {
    let bad = || ScanDeskError::PdfError("malformed MediaBox".into());
    let values = media_box
        .as_array()
        .map_err(|_| bad())?
        .iter()
        .map(number)
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(bad)?;

    match values.as_slice() {
        [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => Err(bad()),
    }
}

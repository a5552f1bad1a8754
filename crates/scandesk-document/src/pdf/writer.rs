// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — create PDF documents from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectId, XObjectTransform,
};
use scandesk_core::PaperSize;
use scandesk_core::error::ScanDeskError;
use tracing::{debug, info, instrument};

use crate::image::ImageProcessor;

/// Blank border kept on every side of a fitted image.
pub const PAGE_MARGIN_PT: f32 = 20.0;

/// Resolution at which combined scans are laid out, one image per page.
pub const COMBINE_DPI: f32 = 100.0;

/// Where an image lands on a page, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit an image (pixel dimensions taken as points) inside the page margins,
/// preserving aspect ratio, and centre it.
///
/// `scale = min((W - 2m) / w, (H - 2m) / h)`. Small images are scaled up.
pub fn fit_to_page(image_w: u32, image_h: u32, page: (f32, f32)) -> Placement {
    let (page_w, page_h) = page;
    let (w, h) = (image_w.max(1) as f32, image_h.max(1) as f32);
    let scale = ((page_w - 2.0 * PAGE_MARGIN_PT) / w).min((page_h - 2.0 * PAGE_MARGIN_PT) / h);
    let (width, height) = (w * scale, h * scale);
    Placement {
        scale,
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
        width,
        height,
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Creates PDF documents from raster images.
pub struct PdfWriter {
    paper_size: PaperSize,
}

impl PdfWriter {
    /// Create a new writer targeting the given paper size.
    pub fn new(paper_size: PaperSize) -> Self {
        Self { paper_size }
    }

    /// Create a new writer defaulting to A4.
    pub fn a4() -> Self {
        Self::new(PaperSize::A4)
    }

    // -- Single fitted page ---------------------------------------------------

    /// Single-page PDF with the image fitted and centred on the paper size.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn create_from_image(&self, image: &ImageProcessor) -> Result<Vec<u8>, ScanDeskError> {
        let page_pt = self.paper_size.dimensions_pt();
        let placement = fit_to_page(image.width(), image.height(), page_pt);

        info!(paper = ?self.paper_size, scale = placement.scale, "Creating image PDF");

        let mut doc = PdfDocument::new("Scanned Document");
        let xobject_id = doc.add_image(&raw_image(image));

        // At 72 dpi one pixel is one point, so `scale` applies unchanged.
        let ops = vec![place_image(xobject_id, &placement, 72.0)];
        doc.with_pages(vec![PdfPage::new(pt_to_mm(page_pt.0), pt_to_mm(page_pt.1), ops)]);

        debug!(x = placement.x, y = placement.y, "Image placed on page");
        Ok(save(&doc))
    }

    /// Create an image PDF and write it directly to a file.
    pub fn write_image_to_file(
        &self,
        image: &ImageProcessor,
        path: impl AsRef<Path>,
    ) -> Result<(), ScanDeskError> {
        let bytes = self.create_from_image(image)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote image PDF to {}", path.as_ref().display());
        Ok(())
    }

    // -- One page per image ---------------------------------------------------

    /// Multi-page PDF with one page per image, each page sized to its image at
    /// `dpi`. Pages follow the slice order.
    #[instrument(skip(self, images), fields(count = images.len()))]
    pub fn create_from_images(
        &self,
        images: &[ImageProcessor],
        dpi: f32,
    ) -> Result<Vec<u8>, ScanDeskError> {
        if images.is_empty() {
            return Err(ScanDeskError::NoValidInputs);
        }

        let mut doc = PdfDocument::new("Combined Scans");
        let mut pages = Vec::with_capacity(images.len());
        for image in images {
            let xobject_id = doc.add_image(&raw_image(image));
            let page_w = image.width() as f32 * 72.0 / dpi;
            let page_h = image.height() as f32 * 72.0 / dpi;
            let full_page = Placement {
                scale: 1.0,
                x: 0.0,
                y: 0.0,
                width: page_w,
                height: page_h,
            };
            let ops = vec![place_image(xobject_id, &full_page, dpi)];
            pages.push(PdfPage::new(pt_to_mm(page_w), pt_to_mm(page_h), ops));
        }
        doc.with_pages(pages);

        info!(pages = images.len(), dpi, "Created multi-page image PDF");
        Ok(save(&doc))
    }
}

fn raw_image(image: &ImageProcessor) -> RawImage {
    RawImage {
        pixels: RawImageData::U8(image.to_rgb_bytes()),
        width: image.width() as usize,
        height: image.height() as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    }
}

fn place_image(id: XObjectId, placement: &Placement, dpi: f32) -> Op {
    Op::UseXobject {
        id,
        transform: XObjectTransform {
            translate_x: Some(Pt(placement.x)),
            translate_y: Some(Pt(placement.y)),
            scale_x: Some(placement.scale),
            scale_y: Some(placement.scale),
            dpi: Some(dpi),
            rotate: None,
        },
    }
}

fn save(doc: &PdfDocument) -> Vec<u8> {
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        debug!(count = warnings.len(), "PDF serialiser reported warnings");
    }
    output
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Format conversion for captured images.
//
// A capture always lands as a lossless raster first; this module turns it
// into the requested output format, and merges several images into one
// multi-page PDF.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use scandesk_core::error::{Result, ScanDeskError};
use scandesk_core::{OutputFormat, PaperSize};

use crate::image::ImageProcessor;
use crate::pdf::PdfWriter;
use crate::pdf::writer::COMBINE_DPI;

/// Converts raster images between output formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatConverter;

impl FormatConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert `image_path` to `target`, writing `output`.
    ///
    /// PDF output is a single page of `page_size` (A4 when absent) with the
    /// image fitted inside a 20 pt margin. Alpha is flattened against white
    /// for formats that cannot carry it.
    #[instrument(skip(self), fields(image = %image_path.display(), %target))]
    pub fn convert(
        &self,
        image_path: &Path,
        target: OutputFormat,
        page_size: Option<PaperSize>,
        output: &Path,
    ) -> Result<PathBuf> {
        let image = ImageProcessor::open(image_path)
            .map_err(|err| ScanDeskError::Conversion(err.to_string()))?;
        ensure_parent(output)?;

        match target {
            OutputFormat::Pdf => {
                let writer = PdfWriter::new(page_size.unwrap_or_default());
                writer.write_image_to_file(&image.flatten_alpha(), output)?;
            }
            raster => image.save_as(output, raster)?,
        }

        info!(output = %output.display(), "Converted image");
        Ok(output.to_path_buf())
    }

    /// Merge images into one PDF, one page per image in input order.
    ///
    /// Unreadable or missing inputs are skipped with a warning. Returns the
    /// number of pages written; fails with `NoValidInputs` when nothing was
    /// readable.
    #[instrument(skip(self, images), fields(inputs = images.len(), output = %output.display()))]
    pub fn combine(&self, images: &[PathBuf], output: &Path) -> Result<usize> {
        let mut pages = Vec::with_capacity(images.len());
        for path in images {
            if !path.exists() {
                warn!(path = %path.display(), "Skipping missing image");
                continue;
            }
            match ImageProcessor::open(path) {
                Ok(image) => pages.push(image.flatten_alpha()),
                Err(err) => warn!(path = %path.display(), error = %err, "Skipping unreadable image"),
            }
        }

        if pages.is_empty() {
            return Err(ScanDeskError::NoValidInputs);
        }

        ensure_parent(output)?;
        let bytes = PdfWriter::a4().create_from_images(&pages, COMBINE_DPI)?;
        std::fs::write(output, bytes)?;

        info!(pages = pages.len(), "Combined images into PDF");
        Ok(pages.len())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PdfReader;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 200]));
        DynamicImage::ImageRgba8(img).save(&path).unwrap();
        path
    }

    #[test]
    fn converts_to_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "capture.png", 30, 40);
        let converter = FormatConverter::new();

        for format in OutputFormat::ALL {
            let output = dir.path().join("out").join(format!("scan.{}", format.extension()));
            let written = converter
                .convert(&source, format, Some(PaperSize::Letter), &output)
                .unwrap();
            assert_eq!(written, output);
            assert!(std::fs::metadata(&output).unwrap().len() > 0, "{format}");
        }
    }

    #[test]
    fn pdf_output_uses_requested_paper() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_png(dir.path(), "capture.png", 600, 800);
        let output = dir.path().join("scan.pdf");
        FormatConverter::new()
            .convert(&source, OutputFormat::Pdf, Some(PaperSize::A4), &output)
            .unwrap();

        let reader = PdfReader::open(&output).unwrap();
        assert_eq!(reader.page_count(), 1);
        let (w, h) = reader.page_size(1).unwrap();
        assert!((w - 595.0).abs() < 0.5 && (h - 842.0).abs() < 0.5);
    }

    #[test]
    fn unreadable_source_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.png");
        std::fs::write(&source, b"not an image").unwrap();
        let result =
            FormatConverter::new().convert(&source, OutputFormat::Jpg, None, &dir.path().join("x.jpg"));
        assert!(matches!(result, Err(ScanDeskError::Conversion(_))));
    }

    #[test]
    fn combine_keeps_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let wide = write_png(dir.path(), "a.png", 200, 100);
        let tall = write_png(dir.path(), "b.png", 100, 200);
        let output = dir.path().join("combined.pdf");

        let pages = FormatConverter::new().combine(&[wide, tall], &output).unwrap();
        assert_eq!(pages, 2);

        let reader = PdfReader::open(&output).unwrap();
        assert_eq!(reader.page_count(), 2);
        let (w1, h1) = reader.page_size(1).unwrap();
        let (w2, h2) = reader.page_size(2).unwrap();
        assert!(w1 > h1 && w2 < h2);
    }

    #[test]
    fn combine_skips_missing_and_unreadable_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "good.png", 50, 50);
        let broken = dir.path().join("broken.jpg");
        std::fs::write(&broken, b"junk").unwrap();
        let missing = dir.path().join("missing.png");
        let output = dir.path().join("combined.pdf");

        let pages = FormatConverter::new()
            .combine(&[missing, good, broken], &output)
            .unwrap();
        assert_eq!(pages, 1);
    }

    #[test]
    fn combine_of_nothing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("combined.pdf");
        assert!(matches!(
            FormatConverter::new().combine(&[], &output),
            Err(ScanDeskError::NoValidInputs)
        ));
        assert!(!output.exists());
    }
}

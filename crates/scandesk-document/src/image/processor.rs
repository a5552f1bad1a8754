// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, flatten transparency and re-encode raster images
// using the `image` crate.

use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use scandesk_core::OutputFormat;
use scandesk_core::error::ScanDeskError;
use tracing::{debug, info, instrument};

/// JPEG quality used for every JPEG this crate writes.
pub const JPEG_QUALITY: u8 = 95;

/// A single decoded image.
///
/// Transformations consume `self` and return the transformed processor so
/// calls can be chained:
///
/// ```ignore
/// let bytes = ImageProcessor::open("scan.bmp")?
///     .flatten_alpha()
///     .encode(OutputFormat::Jpg)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanDeskError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            ScanDeskError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanDeskError> {
        let img = image::load_from_memory(data).map_err(|err| {
            ScanDeskError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Packed 8-bit RGB pixels, row-major, no padding.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.flattened_rgb().into_raw()
    }

    // -- Transformations ------------------------------------------------------

    /// Composite any alpha channel over white. Opaque images pass through.
    #[instrument(skip(self))]
    pub fn flatten_alpha(self) -> Self {
        if !self.has_alpha() {
            return self;
        }
        info!("Flattening transparency against white");
        let rgb = self.flattened_rgb();
        Self {
            image: DynamicImage::ImageRgb8(rgb),
        }
    }

    fn flattened_rgb(&self) -> RgbImage {
        if !self.has_alpha() {
            return self.image.to_rgb8();
        }
        let rgba = self.image.to_rgba8();
        RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let alpha = a as u32;
            let over_white =
                |channel: u8| ((channel as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
            Rgb([over_white(r), over_white(g), over_white(b)])
        })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as JPEG at [`JPEG_QUALITY`].
    pub fn to_jpeg_bytes(&self) -> Result<Vec<u8>, ScanDeskError> {
        let mut buffer = Vec::new();
        let rgb = self.flattened_rgb();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
        rgb.write_with_encoder(encoder)
            .map_err(|err| ScanDeskError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Encode into a raster output format. Formats without alpha support get
    /// a flattened image. PDF is not a raster format; see `PdfWriter`.
    pub fn encode(&self, format: OutputFormat) -> Result<Vec<u8>, ScanDeskError> {
        let image_format = match format {
            OutputFormat::Jpg => return self.to_jpeg_bytes(),
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Pdf => {
                return Err(ScanDeskError::Conversion(
                    "PDF output must go through the PDF writer".into(),
                ));
            }
        };
        if format.supports_alpha() {
            encode_to_format(&self.image, image_format)
        } else {
            encode_to_format(&DynamicImage::ImageRgb8(self.flattened_rgb()), image_format)
        }
    }

    /// Encode and write to `path`.
    pub fn save_as(&self, path: impl AsRef<Path>, format: OutputFormat) -> Result<(), ScanDeskError> {
        let bytes = self.encode(format)?;
        std::fs::write(path.as_ref(), bytes)?;
        debug!(path = %path.as_ref().display(), %format, "Image written");
        Ok(())
    }
}

fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ScanDeskError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| ScanDeskError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

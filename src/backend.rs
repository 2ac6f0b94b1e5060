//! Bitstream decoding behind a trait.
//!
//! The loader parses the container itself and hands complete still-image
//! streams to a [`BitstreamDecoder`]. The default binds to `image-webp`.

use std::io::Cursor;

use crate::error::LoadError;

/// Tightly packed RGB8 or RGBA8 pixels from a bitstream decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 when true, RGB8 otherwise.
    pub has_alpha: bool,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn channels(&self) -> usize {
        if self.has_alpha { 4 } else { 3 }
    }

    /// Check that the pixel buffer matches the expected dimensions.
    pub(crate) fn validate(&self, width: u32, height: u32) -> Result<(), LoadError> {
        if self.width != width || self.height != height {
            return Err(LoadError::Decode(format!(
                "decoder produced {}x{}, expected {width}x{height}",
                self.width, self.height
            )));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(self.channels()));
        if expected != Some(self.pixels.len()) {
            return Err(LoadError::Decode(format!(
                "decoder produced {} bytes for {width}x{height} with {} channels",
                self.pixels.len(),
                self.channels()
            )));
        }
        Ok(())
    }
}

/// Decodes one complete RIFF/WEBP still image.
pub trait BitstreamDecoder {
    /// Decode `webp` into packed pixels.
    ///
    /// Failures must be reported as [`LoadError::Decode`].
    fn decode(&self, webp: &[u8]) -> Result<DecodedImage, LoadError>;
}

impl<T: BitstreamDecoder + ?Sized> BitstreamDecoder for &T {
    fn decode(&self, webp: &[u8]) -> Result<DecodedImage, LoadError> {
        (**self).decode(webp)
    }
}

/// [`BitstreamDecoder`] backed by the `image-webp` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageWebpDecoder;

impl BitstreamDecoder for ImageWebpDecoder {
    fn decode(&self, webp: &[u8]) -> Result<DecodedImage, LoadError> {
        let decode_err = |e: image_webp::DecodingError| LoadError::Decode(e.to_string());

        let mut decoder = image_webp::WebPDecoder::new(Cursor::new(webp)).map_err(decode_err)?;
        let (width, height) = decoder.dimensions();
        let size = decoder.output_buffer_size().ok_or_else(|| {
            LoadError::Decode(format!("{width}x{height} output does not fit in memory"))
        })?;
        let mut pixels = vec![0u8; size];
        decoder.read_image(&mut pixels).map_err(decode_err)?;
        Ok(DecodedImage {
            width,
            height,
            has_alpha: decoder.has_alpha(),
            pixels,
        })
    }
}

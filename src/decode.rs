#[cfg(feature = "rgb")]
use rgb::AsPixels as _;

use crate::backend::DecodedImage;
use crate::error::LoadError;
use crate::pixel::{PixelLayout, convert_row};

/// Caller-owned output buffer with a row stride and pixel layout.
///
/// The buffer length is its capacity. Decoding only writes the first
/// `width * bytes_per_pixel` bytes of each row it covers; stride padding and
/// rows outside the decoded rectangle are left as they were.
#[derive(Debug)]
pub struct DecodeTarget<'a> {
    buf: &'a mut [u8],
    stride: usize,
    layout: PixelLayout,
}

impl<'a> DecodeTarget<'a> {
    pub fn new(buf: &'a mut [u8], stride: usize, layout: PixelLayout) -> Self {
        Self {
            buf,
            stride,
            layout,
        }
    }

    /// Target with no row padding for an image `width` pixels wide.
    pub fn packed(buf: &'a mut [u8], width: u32, layout: PixelLayout) -> Self {
        let stride = (width as usize).saturating_mul(layout.bytes_per_pixel());
        Self::new(buf, stride, layout)
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Bytes needed to hold `width` x `height` pixels starting at offset 0:
    /// `(height - 1) * stride + width * bpp`.
    pub fn required_len(&self, width: u32, height: u32) -> Option<usize> {
        if width == 0 || height == 0 {
            return Some(0);
        }
        let row = (width as usize).checked_mul(self.layout.bytes_per_pixel())?;
        (height as usize - 1)
            .checked_mul(self.stride)?
            .checked_add(row)
    }

    /// Verify that a `width` x `height` rectangle fits at byte `offset`.
    ///
    /// Must pass before any byte of the rectangle is written.
    pub(crate) fn check_rect(
        &self,
        offset: usize,
        width: u32,
        height: u32,
    ) -> Result<(), LoadError> {
        let row = (width as usize)
            .checked_mul(self.layout.bytes_per_pixel())
            .ok_or_else(|| LoadError::Decode(format!("row of {width} pixels overflows")))?;
        if self.stride < row {
            return Err(LoadError::StrideTooSmall {
                needed: row,
                actual: self.stride,
            });
        }
        let needed = self
            .required_len(width, height)
            .and_then(|len| len.checked_add(offset))
            .ok_or_else(|| LoadError::Decode(format!("{width}x{height} output overflows")))?;
        if needed > self.buf.len() {
            return Err(LoadError::BufferTooSmall {
                needed,
                actual: self.buf.len(),
            });
        }
        Ok(())
    }

    /// Copy `image` into the buffer at byte `offset`, converting to the
    /// target layout. Callers run [`Self::check_rect`] first.
    pub(crate) fn write_image(&mut self, offset: usize, image: &DecodedImage) {
        let src_channels = image.channels();
        let width = image.width as usize;
        let src_row = width * src_channels;
        let dst_row = width * self.layout.bytes_per_pixel();
        if src_row == 0 {
            return;
        }
        for (y, src) in image.pixels.chunks_exact(src_row).enumerate() {
            let start = offset + y * self.stride;
            convert_row(src, src_channels, &mut self.buf[start..start + dst_row], self.layout);
        }
    }
}

/// Decoded pixels owned by the caller, tightly packed.
#[derive(Clone, Debug)]
pub struct DecodeOutput {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
}

impl DecodeOutput {
    /// Access the pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take ownership of the pixel data.
    pub fn into_vec(self) -> Vec<u8> {
        self.pixels
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    pub(crate) fn new(pixels: Vec<u8>, width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            pixels,
            width,
            height,
            layout,
        }
    }

    /// Reinterpret pixel data as typed pixel slice.
    ///
    /// Returns [`LoadError::LayoutMismatch`] if the pixel layout doesn't match `P`.
    #[cfg(feature = "rgb")]
    pub fn as_pixels<P: crate::DecodePixel>(&self) -> Result<&[P], LoadError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        if self.layout != P::layout() {
            return Err(LoadError::LayoutMismatch {
                expected: P::layout(),
                actual: self.layout,
            });
        }
        Ok(self.pixels().as_pixels())
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn as_imgref<P: crate::DecodePixel>(&self) -> Result<imgref::ImgRef<'_, P>, LoadError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgRef::new(
            pixels,
            self.width as usize,
            self.height as usize,
        ))
    }

    /// Convert to an [`imgref::ImgVec`] of typed pixels.
    #[cfg(feature = "imgref")]
    pub fn to_imgvec<P: crate::DecodePixel>(&self) -> Result<imgref::ImgVec<P>, LoadError>
    where
        [u8]: rgb::AsPixels<P>,
    {
        let pixels: &[P] = self.as_pixels()?;
        Ok(imgref::ImgVec::new(
            pixels.to_vec(),
            self.width as usize,
            self.height as usize,
        ))
    }
}

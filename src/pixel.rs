/// Pixel memory layout of decoded output.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// 3 channels, 8-bit RGB.
    Rgb8,
    /// 3 channels, 8-bit BGR.
    Bgr8,
    /// 4 channels, 8-bit RGBA (straight alpha).
    Rgba8,
    /// 4 channels, 8-bit BGRA (straight alpha).
    Bgra8,
}

impl PixelLayout {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba8 | Self::Bgra8)
    }

    /// Whether blue is stored before red.
    pub fn is_bgr(&self) -> bool {
        matches!(self, Self::Bgr8 | Self::Bgra8)
    }
}

/// Convert one row of tightly packed RGB8 (`src_channels == 3`) or RGBA8
/// (`src_channels == 4`) pixels into `dst` using `layout`.
///
/// `dst` must hold exactly as many pixels as `src`. Missing alpha is filled
/// with 255; alpha is dropped for 3-channel layouts.
pub(crate) fn convert_row(src: &[u8], src_channels: usize, dst: &mut [u8], layout: PixelLayout) {
    let dst_bpp = layout.bytes_per_pixel();
    debug_assert_eq!(src.len() / src_channels, dst.len() / dst_bpp);

    if src_channels == dst_bpp && !layout.is_bgr() {
        dst.copy_from_slice(src);
        return;
    }

    for (s, d) in src
        .chunks_exact(src_channels)
        .zip(dst.chunks_exact_mut(dst_bpp))
    {
        let (r, g, b) = (s[0], s[1], s[2]);
        let a = if src_channels == 4 { s[3] } else { 255 };
        if layout.is_bgr() {
            d[0] = b;
            d[1] = g;
            d[2] = r;
        } else {
            d[0] = r;
            d[1] = g;
            d[2] = b;
        }
        if dst_bpp == 4 {
            d[3] = a;
        }
    }
}

/// Pixel types that can be viewed directly over decoded bytes.
#[cfg(feature = "rgb")]
pub trait DecodePixel: Copy + 'static {
    /// The layout whose memory representation matches `Self`.
    fn layout() -> PixelLayout;
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::Rgb<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Rgb8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::Rgba<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Rgba8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::BGR<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Bgr8
    }
}

#[cfg(feature = "rgb")]
impl DecodePixel for rgb::alt::BGRA<u8> {
    fn layout() -> PixelLayout {
        PixelLayout::Bgra8
    }
}

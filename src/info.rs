use crate::error::LoadError;
use crate::webp::demux::{Demuxer, Frame};
use crate::webp::probe::{self, Features};

/// Compression used by the image data.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitstreamFormat {
    /// `VP8 ` lossy bitstream.
    Lossy,
    /// `VP8L` lossless bitstream.
    Lossless,
    /// Animation; each frame carries its own format.
    Mixed,
}

/// Image metadata from the container header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// 1 for still images.
    pub frame_count: u32,
    pub has_alpha: bool,
    pub has_animation: bool,
    pub format: BitstreamFormat,
    /// Animation background color hint, B, G, R, A byte order as stored.
    pub background_color: Option<[u8; 4]>,
    /// Animation loop count; 0 means infinite.
    pub loop_count: Option<u16>,
}

impl ImageInfo {
    /// Probe WebP data without decoding pixels.
    ///
    /// Animated files are also demuxed so the frame count is known.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let features = probe::probe(data)?;
        let demux = if features.has_animation {
            Some(Demuxer::new(data)?)
        } else {
            None
        };
        Ok(Self::new(&features, demux.as_ref()))
    }

    pub(crate) fn new(features: &Features, demux: Option<&Demuxer>) -> Self {
        Self {
            width: features.width,
            height: features.height,
            frame_count: demux.map_or(1, Demuxer::frame_count),
            has_alpha: features.has_alpha,
            has_animation: features.has_animation,
            format: features.format,
            background_color: demux.map(Demuxer::background_color),
            loop_count: demux.map(Demuxer::loop_count),
        }
    }

    /// Bytes of a tightly packed canvas in `layout`, or `None` on overflow.
    pub fn buffer_size(&self, layout: crate::PixelLayout) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(layout.bytes_per_pixel())
    }
}

/// Placement of one frame on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub format: BitstreamFormat,
}

impl FrameInfo {
    pub(crate) fn from_frame(frame: &Frame<'_>) -> Self {
        Self {
            x_offset: frame.x_offset,
            y_offset: frame.y_offset,
            width: frame.width,
            height: frame.height,
            has_alpha: frame.has_alpha,
            format: frame.format,
        }
    }

    /// The single frame of a still image.
    pub(crate) fn whole_canvas(info: &ImageInfo) -> Self {
        Self {
            x_offset: 0,
            y_offset: 0,
            width: info.width,
            height: info.height,
            has_alpha: info.has_alpha,
            format: info.format,
        }
    }
}

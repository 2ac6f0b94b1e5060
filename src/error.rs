use enough::StopReason;

use crate::pixel::PixelLayout;

/// Errors from probing, demuxing, and decoding WebP data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// Not a RIFF/WEBP stream, or the header is too short or corrupt to
    /// read dimensions and the animation flag.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The stream is flagged as animated but its frame table is unusable.
    #[error("demuxer initialization failed: {0}")]
    DemuxInit(String),

    #[error("frame {frame} not found (image has {frame_count} frame(s))")]
    FrameNotFound { frame: usize, frame_count: u32 },

    #[error("decoding failed: {0}")]
    Decode(String),

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("row stride too small: need {needed} bytes, got {actual}")]
    StrideTooSmall { needed: usize, actual: usize },

    /// Fixed-layout reads without a frame number cannot pick a frame of an
    /// animation.
    #[error("{0:?} output without a frame number is not supported for animations")]
    UnsupportedForAnimation(PixelLayout),

    #[error("pixel layout mismatch: expected {expected:?}, got {actual:?}")]
    LayoutMismatch {
        expected: PixelLayout,
        actual: PixelLayout,
    },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl LoadError {
    /// Whether another call on the same loader can succeed.
    ///
    /// True for per-call failures such as a bad frame index or an undersized
    /// buffer. Construction failures and limit violations are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FrameNotFound { .. }
                | Self::Decode(_)
                | Self::BufferTooSmall { .. }
                | Self::StrideTooSmall { .. }
                | Self::UnsupportedForAnimation(_)
                | Self::Cancelled(_)
        )
    }
}

impl From<StopReason> for LoadError {
    fn from(r: StopReason) -> Self {
        LoadError::Cancelled(r)
    }
}

//! WebP container handling (internal): RIFF chunks, feature probe,
//! animation demuxing, and frame fragment extraction.
//!
//! The VP8/VP8L bitstreams themselves are decoded by a
//! [`crate::BitstreamDecoder`].

pub(crate) mod demux;
pub(crate) mod fragment;
pub(crate) mod probe;
pub(crate) mod riff;

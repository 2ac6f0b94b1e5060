//! # zenframes
//!
//! Decode adapter for still and animated WebP images.
//!
//! A [`WebpLoader`] owns the encoded bytes, probes the container once, and
//! for animations builds a frame table. Any frame can then be decoded into a
//! caller-provided buffer in RGB, BGR, RGBA, or BGRA order, with an
//! arbitrary row stride. Animation frames land at their offset on the
//! canvas; pixels outside the frame are never touched.
//!
//! ## Container vs. bitstream
//!
//! RIFF parsing, the feature probe, and demuxing are done here. The VP8 and
//! VP8L bitstreams are decoded by a [`BitstreamDecoder`], by default
//! [`ImageWebpDecoder`] (the `image-webp` crate).
//!
//! ## Non-Goals
//!
//! - Encoding
//! - Animation timing, disposal, and blending (frames are not composited)
//!
//! ## Usage
//!
//! ```no_run
//! use zenframes::{DecodeTarget, PixelLayout, Unstoppable, WebpLoader};
//!
//! let loader = WebpLoader::open("animation.webp")?;
//! println!(
//!     "{}x{}, {} frame(s)",
//!     loader.width(),
//!     loader.height(),
//!     loader.frame_count()
//! );
//!
//! let stride = loader.width() as usize * 4;
//! let mut canvas = vec![0u8; stride * loader.height() as usize];
//! for frame in 0..loader.frame_count() as usize {
//!     let mut target = DecodeTarget::new(&mut canvas, stride, PixelLayout::Bgra8);
//!     loader.decode_into(frame, &mut target, Unstoppable)?;
//! }
//! # Ok::<(), zenframes::LoadError>(())
//! ```

#![forbid(unsafe_code)]

mod backend;
mod decode;
mod error;
mod info;
mod limits;
mod loader;
mod pixel;
mod webp;

// Re-exports
pub use backend::{BitstreamDecoder, DecodedImage, ImageWebpDecoder};
pub use decode::{DecodeOutput, DecodeTarget};
pub use enough::{Stop, Unstoppable};
pub use error::LoadError;
pub use info::{BitstreamFormat, FrameInfo, ImageInfo};
pub use limits::Limits;
pub use loader::{LoadRequest, WebpLoader};
#[cfg(feature = "rgb")]
pub use pixel::DecodePixel;
pub use pixel::PixelLayout;

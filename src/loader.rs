use std::path::Path;

use enough::{Stop, Unstoppable};

use crate::backend::{BitstreamDecoder, DecodedImage, ImageWebpDecoder};
use crate::decode::{DecodeOutput, DecodeTarget};
use crate::error::LoadError;
use crate::info::{FrameInfo, ImageInfo};
use crate::limits::Limits;
use crate::pixel::PixelLayout;
use crate::webp::demux::{Demuxer, Frame};
use crate::webp::fragment::wrap_fragment;
use crate::webp::probe;

/// Builder for a [`WebpLoader`].
///
/// ```no_run
/// use zenframes::{LoadRequest, Limits};
///
/// let limits = Limits {
///     max_pixels: Some(16_000_000),
///     ..Default::default()
/// };
/// let loader = LoadRequest::open("animation.webp")?
///     .with_limits(&limits)
///     .load()?;
/// println!("{} frame(s)", loader.frame_count());
/// # Ok::<(), zenframes::LoadError>(())
/// ```
pub struct LoadRequest<'a, D = ImageWebpDecoder> {
    data: Vec<u8>,
    limits: Option<&'a Limits>,
    decoder: D,
}

impl LoadRequest<'_> {
    /// Take ownership of encoded bytes. Slices are copied.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            limits: None,
            decoder: ImageWebpDecoder,
        }
    }

    /// Read encoded bytes from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Ok(Self::new(std::fs::read(path)?))
    }
}

impl<'a, D: BitstreamDecoder> LoadRequest<'a, D> {
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Use a different bitstream decoder.
    pub fn with_decoder<E: BitstreamDecoder>(self, decoder: E) -> LoadRequest<'a, E> {
        LoadRequest {
            data: self.data,
            limits: self.limits,
            decoder,
        }
    }

    /// Probe the data and, for animations, build the frame table.
    ///
    /// Fails with [`LoadError::InvalidHeader`] for unreadable headers and
    /// [`LoadError::DemuxInit`] for animations whose frame table is broken.
    pub fn load(self) -> Result<WebpLoader<D>, LoadError> {
        let features = probe::probe(&self.data)?;
        let limits = self.limits.cloned().unwrap_or_default();
        limits.check(features.width, features.height)?;

        let demux = if features.has_animation {
            Some(Demuxer::with_limits(&self.data, &limits)?)
        } else {
            None
        };

        let info = ImageInfo::new(&features, demux.as_ref());
        log::debug!(
            "loaded {}x{} webp: {} frame(s), animated={}, alpha={}",
            info.width,
            info.height,
            info.frame_count,
            info.has_animation,
            info.has_alpha
        );
        Ok(WebpLoader {
            data: self.data,
            info,
            demux,
            limits,
            decoder: self.decoder,
        })
    }
}

/// Decode adapter over one encoded WebP file.
///
/// Construction probes the header and, for animations, owns the frame table
/// for the loader's lifetime. Decoding never changes the loader, so a loader
/// can serve any number of decode calls, and failed calls leave it usable.
///
/// ```no_run
/// use zenframes::{PixelLayout, WebpLoader};
///
/// let loader = WebpLoader::open("image.webp")?;
/// let stride = loader.width() as usize * 4;
/// let mut out = vec![0u8; stride * loader.height() as usize];
/// loader.read_rgba(&mut out, stride, 0)?;
/// # Ok::<(), zenframes::LoadError>(())
/// ```
pub struct WebpLoader<D = ImageWebpDecoder> {
    data: Vec<u8>,
    info: ImageInfo,
    demux: Option<Demuxer>,
    limits: Limits,
    decoder: D,
}

impl WebpLoader {
    /// Load from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        LoadRequest::open(path)?.load()
    }

    /// Load from a copy of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, LoadError> {
        LoadRequest::new(data).load()
    }

    /// Load from `data` without copying.
    pub fn from_vec(data: Vec<u8>) -> Result<Self, LoadError> {
        LoadRequest::new(data).load()
    }
}

impl<D: BitstreamDecoder> WebpLoader<D> {
    /// Canvas width in pixels.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Canvas height in pixels.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn frame_count(&self) -> u32 {
        self.info.frame_count
    }

    pub fn is_animated(&self) -> bool {
        self.demux.is_some()
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    /// Background color hint of an animation, B, G, R, A byte order.
    pub fn background_color(&self) -> Option<[u8; 4]> {
        self.info.background_color
    }

    /// The encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Placement of frame `frame` (0-based) on the canvas.
    pub fn frame_info(&self, frame: usize) -> Result<FrameInfo, LoadError> {
        match &self.demux {
            None if frame == 0 => Ok(FrameInfo::whole_canvas(&self.info)),
            None => Err(self.not_found(frame)),
            Some(demux) => Ok(FrameInfo::from_frame(&self.lookup(demux, frame)?)),
        }
    }

    /// Decode into RGB8. Fails with [`LoadError::UnsupportedForAnimation`]
    /// for multi-frame animations; use [`Self::decode_into`] to pick a frame.
    pub fn read_rgb(&self, out: &mut [u8], stride: usize) -> Result<(), LoadError> {
        self.read_fixed(out, stride, PixelLayout::Rgb8)
    }

    /// Decode into BGR8. See [`Self::read_rgb`] for animations.
    pub fn read_bgr(&self, out: &mut [u8], stride: usize) -> Result<(), LoadError> {
        self.read_fixed(out, stride, PixelLayout::Bgr8)
    }

    /// Decode into BGRA8. See [`Self::read_rgb`] for animations.
    pub fn read_bgra(&self, out: &mut [u8], stride: usize) -> Result<(), LoadError> {
        self.read_fixed(out, stride, PixelLayout::Bgra8)
    }

    /// Decode frame `frame` (0-based) into RGBA8.
    ///
    /// For animations, `out` is the whole canvas and only the frame's
    /// rectangle is written.
    pub fn read_rgba(
        &self,
        out: &mut [u8],
        stride: usize,
        frame: usize,
    ) -> Result<(), LoadError> {
        let mut target = DecodeTarget::new(out, stride, PixelLayout::Rgba8);
        self.decode_into(frame, &mut target, Unstoppable)
    }

    fn read_fixed(
        &self,
        out: &mut [u8],
        stride: usize,
        layout: PixelLayout,
    ) -> Result<(), LoadError> {
        if self.frame_count() > 1 {
            return Err(LoadError::UnsupportedForAnimation(layout));
        }
        let mut target = DecodeTarget::new(out, stride, layout);
        self.decode_into(0, &mut target, Unstoppable)
    }

    /// Decode frame `frame` (0-based) into `target`, in any layout.
    ///
    /// Still images decode the whole stream at offset 0. Animation frames are
    /// written at their canvas offset, `x * bpp + y * stride` bytes into the
    /// target; the stride must cover the full canvas width. All size checks
    /// happen before the first write, and a failed bitstream decode writes
    /// nothing.
    pub fn decode_into(
        &self,
        frame: usize,
        target: &mut DecodeTarget<'_>,
        stop: impl Stop,
    ) -> Result<(), LoadError> {
        match &self.demux {
            None => self.decode_still(frame, target, &stop),
            Some(demux) => self.decode_animation_frame(demux, frame, target, &stop),
        }
    }

    /// Decode a still image (or the first animation frame) into a new
    /// tightly packed buffer.
    pub fn decode(&self, layout: PixelLayout, stop: impl Stop) -> Result<DecodeOutput, LoadError> {
        self.decode_frame(0, layout, stop)
    }

    /// Decode frame `frame` into a new canvas-sized buffer.
    ///
    /// Pixels outside the frame rectangle are zero. Earlier frames are not
    /// composited underneath.
    pub fn decode_frame(
        &self,
        frame: usize,
        layout: PixelLayout,
        stop: impl Stop,
    ) -> Result<DecodeOutput, LoadError> {
        let size = self
            .info
            .buffer_size(layout)
            .ok_or(LoadError::DimensionsTooLarge {
                width: self.width(),
                height: self.height(),
            })?;
        self.limits.check_memory(size)?;
        let mut pixels = vec![0u8; size];
        let mut target = DecodeTarget::packed(&mut pixels, self.width(), layout);
        self.decode_into(frame, &mut target, stop)?;
        Ok(DecodeOutput::new(pixels, self.width(), self.height(), layout))
    }

    /// Decode every frame in order, each on its own canvas.
    pub fn frames(
        &self,
        layout: PixelLayout,
    ) -> impl Iterator<Item = Result<DecodeOutput, LoadError>> + '_ {
        (0..self.frame_count() as usize)
            .map(move |frame| self.decode_frame(frame, layout, Unstoppable))
    }

    fn decode_still(
        &self,
        frame: usize,
        target: &mut DecodeTarget<'_>,
        stop: &dyn Stop,
    ) -> Result<(), LoadError> {
        if frame != 0 {
            return Err(self.not_found(frame));
        }
        let (width, height) = (self.width(), self.height());
        target.check_rect(0, width, height)?;
        stop.check()?;
        let image = self.decode_bitstream(&self.data, width, height)?;
        stop.check()?;
        target.write_image(0, &image);
        Ok(())
    }

    fn decode_animation_frame(
        &self,
        demux: &Demuxer,
        frame: usize,
        target: &mut DecodeTarget<'_>,
        stop: &dyn Stop,
    ) -> Result<(), LoadError> {
        let entry = self.lookup(demux, frame)?;
        let bpp = target.layout().bytes_per_pixel();

        let (canvas_width, _) = demux.canvas_size();
        let canvas_row = (canvas_width as usize).saturating_mul(bpp);
        if target.stride() < canvas_row {
            return Err(LoadError::StrideTooSmall {
                needed: canvas_row,
                actual: target.stride(),
            });
        }
        let offset = (entry.y_offset as usize)
            .checked_mul(target.stride())
            .and_then(|y| y.checked_add(entry.x_offset as usize * bpp))
            .ok_or_else(|| LoadError::Decode(format!("frame {frame} offset overflows")))?;
        if offset >= target.capacity() {
            return Err(LoadError::Decode(format!(
                "frame {frame} starts at byte {offset}, outside the {}-byte buffer",
                target.capacity()
            )));
        }
        target.check_rect(offset, entry.width, entry.height)?;
        stop.check()?;

        log::trace!(
            "decoding frame {} ({}x{} at {}, {})",
            entry.number,
            entry.width,
            entry.height,
            entry.x_offset,
            entry.y_offset
        );
        let still = wrap_fragment(entry.fragment, entry.width, entry.height)?;
        let image = self.decode_bitstream(&still, entry.width, entry.height)?;
        stop.check()?;
        target.write_image(offset, &image);
        Ok(())
    }

    /// Resolve 0-based `frame` through the demuxer's 1-based numbering.
    fn lookup<'s>(&'s self, demux: &Demuxer, frame: usize) -> Result<Frame<'s>, LoadError> {
        u32::try_from(frame)
            .ok()
            .and_then(|f| f.checked_add(1))
            .and_then(|number| demux.frame(&self.data, number))
            .ok_or_else(|| self.not_found(frame))
    }

    fn not_found(&self, frame: usize) -> LoadError {
        LoadError::FrameNotFound {
            frame,
            frame_count: self.frame_count(),
        }
    }

    fn decode_bitstream(
        &self,
        webp: &[u8],
        width: u32,
        height: u32,
    ) -> Result<DecodedImage, LoadError> {
        let scratch = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or(LoadError::DimensionsTooLarge { width, height })?;
        self.limits.check_memory(scratch)?;
        let image = self.decoder.decode(webp)?;
        image.validate(width, height)?;
        Ok(image)
    }
}

impl<D> core::fmt::Debug for WebpLoader<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebpLoader")
            .field("info", &self.info)
            .field("data_len", &self.data.len())
            .finish_non_exhaustive()
    }
}

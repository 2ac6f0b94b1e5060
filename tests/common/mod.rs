//! WebP fixtures built at test time.
//!
//! Stills are lossless encodes from `image-webp`; animations reuse their
//! `VP8L` chunks inside hand-assembled `ANMF` frames.

#![allow(dead_code)]

use image_webp::{ColorType, WebPEncoder};

pub const ANIM_BACKGROUND: [u8; 4] = [0x10, 0x20, 0x30, 0xFF];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// RGBA test pattern. Alpha stays in 1..=255 so lossless encoders keep the
/// color channels intact.
pub fn rgba_pattern(width: u32, height: u32, seed: u8) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let (x, y) = (x as u8, y as u8);
            pixels.push(x.wrapping_mul(37).wrapping_add(y.wrapping_mul(11)).wrapping_add(seed));
            pixels.push(x.wrapping_mul(5).wrapping_add(y.wrapping_mul(53)));
            pixels.push((x ^ y).wrapping_mul(29).wrapping_add(seed.wrapping_mul(3)));
            pixels.push(if (x + y) % 3 == 0 { 255 } else { 100 + x.wrapping_add(y) % 100 });
        }
    }
    pixels
}

/// RGB test pattern.
pub fn rgb_pattern(width: u32, height: u32, seed: u8) -> Vec<u8> {
    rgba_pattern(width, height, seed)
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect()
}

pub fn encode_still(pixels: &[u8], width: u32, height: u32, color: ColorType) -> Vec<u8> {
    let mut out = Vec::new();
    WebPEncoder::new(&mut out)
        .encode(pixels, width, height, color)
        .expect("lossless encode");
    out
}

pub fn encode_rgba(width: u32, height: u32, seed: u8) -> (Vec<u8>, Vec<u8>) {
    let pixels = rgba_pattern(width, height, seed);
    let webp = encode_still(&pixels, width, height, ColorType::Rgba8);
    (webp, pixels)
}

pub fn chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

pub fn riff(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend_from_slice(body);
    out
}

/// The complete image chunk (header, payload, padding) of a simple still.
pub fn image_chunk(webp: &[u8]) -> Vec<u8> {
    let mut pos = 12;
    while pos + 8 <= webp.len() {
        let size = u32::from_le_bytes(webp[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let end = pos + 8 + size + size % 2;
        if &webp[pos..pos + 4] == b"VP8L" || &webp[pos..pos + 4] == b"VP8 " {
            return webp[pos..end.min(webp.len())].to_vec();
        }
        pos = end;
    }
    panic!("no image chunk");
}

pub fn vp8x(flags: u8, width: u32, height: u32) -> Vec<u8> {
    let mut p = vec![flags, 0, 0, 0];
    p.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
    p.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
    chunk(b"VP8X", &p)
}

pub struct TestFrame {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Source RGBA pixels.
    pub pixels: Vec<u8>,
    pub image_chunk: Vec<u8>,
}

impl TestFrame {
    /// `x` and `y` must be even.
    pub fn new(x: u32, y: u32, width: u32, height: u32, seed: u8) -> Self {
        let (webp, pixels) = encode_rgba(width, height, seed);
        Self {
            x,
            y,
            width,
            height,
            pixels,
            image_chunk: image_chunk(&webp),
        }
    }

    pub fn anmf(&self) -> Vec<u8> {
        let mut p = Vec::new();
        p.extend_from_slice(&(self.x / 2).to_le_bytes()[..3]);
        p.extend_from_slice(&(self.y / 2).to_le_bytes()[..3]);
        p.extend_from_slice(&(self.width - 1).to_le_bytes()[..3]);
        p.extend_from_slice(&(self.height - 1).to_le_bytes()[..3]);
        p.extend_from_slice(&80u32.to_le_bytes()[..3]);
        p.push(0);
        p.extend_from_slice(&self.image_chunk);
        chunk(b"ANMF", &p)
    }
}

/// Animated file with `frames` on a `width` x `height` canvas.
pub fn animation(width: u32, height: u32, frames: &[TestFrame]) -> Vec<u8> {
    let mut body = vp8x(0x12, width, height);
    let mut anim = ANIM_BACKGROUND.to_vec();
    anim.extend_from_slice(&0u16.to_le_bytes());
    body.extend_from_slice(&chunk(b"ANIM", &anim));
    for frame in frames {
        body.extend_from_slice(&frame.anmf());
    }
    riff(&body)
}

/// Three frames on a 12x10 canvas: full canvas, a corner patch, and an
/// interior patch.
pub fn three_frame_animation() -> (Vec<u8>, Vec<TestFrame>) {
    let frames = vec![
        TestFrame::new(0, 0, 12, 10, 1),
        TestFrame::new(8, 6, 4, 4, 2),
        TestFrame::new(2, 4, 5, 3, 3),
    ];
    (animation(12, 10, &frames), frames)
}

/// Convert tightly packed RGBA to another layout, for expected values.
pub fn rgba_to(pixels: &[u8], layout: zenframes::PixelLayout) -> Vec<u8> {
    use zenframes::PixelLayout;
    pixels
        .chunks_exact(4)
        .flat_map(|p| match layout {
            PixelLayout::Rgba8 => vec![p[0], p[1], p[2], p[3]],
            PixelLayout::Bgra8 => vec![p[2], p[1], p[0], p[3]],
            PixelLayout::Rgb8 => vec![p[0], p[1], p[2]],
            PixelLayout::Bgr8 => vec![p[2], p[1], p[0]],
            _ => unreachable!(),
        })
        .collect()
}

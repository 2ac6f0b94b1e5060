//! Lossy (`VP8 `) streams produced by libwebp at quality 90, checked
//! against libwebp's own RGBA output stored next to each fixture.

mod common;

use common::init_logging;
use zenframes::*;

const LOSSY: &[u8] = include_bytes!("webp-fixtures/lossy.webp");
const LOSSY_RGBA: &[u8] = include_bytes!("webp-fixtures/lossy.rgba");
const LOSSY_ALPHA: &[u8] = include_bytes!("webp-fixtures/lossy_alpha.webp");
const LOSSY_ALPHA_RGBA: &[u8] = include_bytes!("webp-fixtures/lossy_alpha.rgba");
/// 40x30 canvas, three `ANMF` frames, each `ALPH` + `VP8 `.
const ANIM: &[u8] = include_bytes!("webp-fixtures/lossy_alpha_anim.webp");
/// Frame rectangles back to back, RGBA.
const ANIM_RGBA: &[u8] = include_bytes!("webp-fixtures/lossy_alpha_anim.rgba");

/// (x, y, width, height) of each frame of `ANIM`.
const ANIM_RECTS: [(u32, u32, u32, u32); 3] = [(0, 0, 40, 30), (10, 8, 10, 8), (24, 18, 12, 10)];

// Lossy decoders may round chroma upsampling differently.
const COLOR_TOLERANCE: u8 = 2;

const SENTINEL: u8 = 0xEE;

fn assert_close(actual: &[u8], expected: &[u8], what: &str) {
    assert_eq!(actual.len(), expected.len(), "{what}: length");
    for (i, (a, e)) in actual.chunks_exact(4).zip(expected.chunks_exact(4)).enumerate() {
        for c in 0..3 {
            assert!(
                a[c].abs_diff(e[c]) <= COLOR_TOLERANCE,
                "{what}: pixel {i} channel {c}: {} vs {}",
                a[c],
                e[c]
            );
        }
        assert_eq!(a[3], e[3], "{what}: alpha of pixel {i}");
    }
}

fn frame_reference(index: usize) -> &'static [u8] {
    let start: usize = ANIM_RECTS[..index]
        .iter()
        .map(|&(_, _, w, h)| (w * h * 4) as usize)
        .sum();
    let (_, _, w, h) = ANIM_RECTS[index];
    &ANIM_RGBA[start..start + (w * h * 4) as usize]
}

#[test]
fn opaque_still() {
    init_logging();
    let loader = WebpLoader::from_bytes(LOSSY).unwrap();
    assert_eq!((loader.width(), loader.height()), (40, 30));
    let info = loader.info();
    assert_eq!(info.format, BitstreamFormat::Lossy);
    assert!(!info.has_alpha);

    let mut out = vec![0u8; 40 * 30 * 4];
    loader.read_rgba(&mut out, 160, 0).unwrap();
    assert_close(&out, LOSSY_RGBA, "lossy still");
}

#[test]
fn still_with_alpha_chunk() {
    let loader = WebpLoader::from_bytes(LOSSY_ALPHA).unwrap();
    let info = loader.info();
    assert_eq!(info.format, BitstreamFormat::Lossy);
    assert!(info.has_alpha);
    assert!(!info.has_animation);

    let stride = 40 * 4 + 4;
    let mut out = vec![SENTINEL; stride * 30];
    loader.read_rgba(&mut out, stride, 0).unwrap();
    let rows: Vec<u8> = out
        .chunks(stride)
        .flat_map(|row| {
            assert!(row[160..].iter().all(|&b| b == SENTINEL));
            row[..160].iter().copied()
        })
        .collect();
    assert_close(&rows, LOSSY_ALPHA_RGBA, "lossy still with alpha");
    assert!(rows.chunks_exact(4).any(|p| p[3] < 255));
}

#[test]
fn animation_metadata() {
    let loader = WebpLoader::from_bytes(ANIM).unwrap();
    assert_eq!((loader.width(), loader.height()), (40, 30));
    assert_eq!(loader.frame_count(), 3);
    assert_eq!(loader.background_color(), Some([0x60, 0x40, 0x20, 0xFF]));
    assert_eq!(loader.info().loop_count, Some(3));

    for (index, &(x, y, w, h)) in ANIM_RECTS.iter().enumerate() {
        let frame = loader.frame_info(index).unwrap();
        assert_eq!(
            (frame.x_offset, frame.y_offset, frame.width, frame.height),
            (x, y, w, h),
            "frame {index}"
        );
        assert_eq!(frame.format, BitstreamFormat::Lossy);
        assert!(frame.has_alpha, "frame {index}");
    }
}

#[test]
fn animation_frames_keep_alpha_at_their_offset() {
    let loader = WebpLoader::from_bytes(ANIM).unwrap();
    let stride = 40 * 4;
    for (index, &(x, y, w, h)) in ANIM_RECTS.iter().enumerate() {
        let mut out = vec![SENTINEL; stride * 30];
        loader.read_rgba(&mut out, stride, index).unwrap();

        let (x, y, w, h) = (x as usize, y as usize, w as usize, h as usize);
        let mut rect = Vec::with_capacity(w * h * 4);
        for (row_index, row) in out.chunks(stride).enumerate() {
            let inside = row_index >= y && row_index < y + h;
            for (i, &b) in row.iter().enumerate() {
                if !(inside && i >= x * 4 && i < (x + w) * 4) {
                    assert_eq!(b, SENTINEL, "frame {index}: row {row_index} byte {i}");
                }
            }
            if inside {
                rect.extend_from_slice(&row[x * 4..(x + w) * 4]);
            }
        }
        assert_close(&rect, frame_reference(index), &format!("frame {index}"));
        assert!(rect.chunks_exact(4).any(|p| p[3] < 255), "frame {index} lost alpha");
    }
}

#[test]
fn animation_frame_in_bgra() {
    let loader = WebpLoader::from_bytes(ANIM).unwrap();
    let frame = loader.decode_frame(1, PixelLayout::Bgra8, Unstoppable).unwrap();
    let reference = frame_reference(1);
    let mut rect = Vec::new();
    for row in frame.pixels().chunks(frame.stride()).skip(8).take(8) {
        for p in row[10 * 4..20 * 4].chunks_exact(4) {
            rect.extend_from_slice(&[p[2], p[1], p[0], p[3]]);
        }
    }
    assert_close(&rect, reference, "frame 1 as BGRA");
}

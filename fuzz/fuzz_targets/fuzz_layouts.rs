#![no_main]
use enough::Unstoppable;
use libfuzzer_sys::fuzz_target;
use zenframes::{DecodeTarget, Limits, LoadRequest, PixelLayout};

// Every layout of a frame must carry the same pixels as RGBA.
fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1_000_000),
        max_frames: Some(16),
        ..Default::default()
    };
    let Ok(loader) = LoadRequest::new(data).with_limits(&limits).load() else {
        return;
    };
    for frame in 0..loader.frame_count() as usize {
        let Ok(rgba) = loader.decode_frame(frame, PixelLayout::Rgba8, Unstoppable) else {
            continue;
        };
        for layout in [PixelLayout::Rgb8, PixelLayout::Bgr8, PixelLayout::Bgra8] {
            let bpp = layout.bytes_per_pixel();
            let stride = loader.width() as usize * bpp + 3;
            let mut out = vec![0u8; stride * loader.height() as usize];
            let mut target = DecodeTarget::new(&mut out, stride, layout);
            loader
                .decode_into(frame, &mut target, Unstoppable)
                .expect("frame decoded as RGBA");
            for (y, row) in rgba.pixels().chunks_exact(rgba.stride()).enumerate() {
                for (x, px) in row.chunks_exact(4).enumerate() {
                    let got = &out[y * stride + x * bpp..][..bpp];
                    let want = match layout {
                        PixelLayout::Rgb8 => vec![px[0], px[1], px[2]],
                        PixelLayout::Bgr8 => vec![px[2], px[1], px[0]],
                        _ => vec![px[2], px[1], px[0], px[3]],
                    };
                    assert_eq!(got, &want[..], "{layout:?} pixel ({x}, {y}) of frame {frame}");
                }
            }
        }
    }
});

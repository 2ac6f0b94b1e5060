#![no_main]
use libfuzzer_sys::fuzz_target;
use zenframes::{Limits, LoadRequest, PixelLayout};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(4_000_000),
        max_memory_bytes: Some(64 * 1024 * 1024),
        max_frames: Some(64),
        ..Default::default()
    };
    // Probe, demux, and every frame must never panic.
    let Ok(loader) = LoadRequest::new(data).with_limits(&limits).load() else {
        return;
    };
    for frame in loader.frames(PixelLayout::Rgba8) {
        let _ = frame;
    }
    let mut small = [0u8; 64];
    let _ = loader.read_rgba(&mut small, 16, 0);
    let _ = loader.read_rgba(&mut small, 16, loader.frame_count() as usize);
});

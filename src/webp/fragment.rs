//! Standalone still streams from animation frame fragments.
//!
//! A fragment is `[ALPH] VP8 ` or `VP8L` chunk data without a RIFF header.
//! Still-image decoders expect a full file, so the fragment is rewrapped:
//! `VP8L` and bare `VP8 ` need only the RIFF header, while lossy frames
//! with an `ALPH` chunk need a `VP8X` chunk announcing alpha.

use super::probe::VP8X_ALPHA_FLAG;
use super::riff::{Chunks, wrap_riff, write_chunk};
use crate::error::LoadError;

/// Build a RIFF/WEBP still image of `width` x `height` from `fragment`.
///
/// Unknown chunks are dropped.
pub(crate) fn wrap_fragment(
    fragment: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, LoadError> {
    let mut alpha = None;
    let mut image = None;
    for chunk in Chunks::new(fragment, 0, fragment.len()) {
        let chunk = chunk.map_err(|e| LoadError::Decode(format!("frame fragment: {e}")))?;
        match &chunk.fourcc {
            b"ALPH" if alpha.is_none() => alpha = Some(chunk),
            b"VP8 " | b"VP8L" if image.is_none() => image = Some(chunk),
            _ => {}
        }
    }
    let image =
        image.ok_or_else(|| LoadError::Decode("frame fragment has no image chunk".into()))?;

    let mut body = Vec::with_capacity(fragment.len() + 32);
    if let Some(alpha) = alpha.filter(|_| &image.fourcc == b"VP8 ") {
        let mut vp8x = [0u8; 10];
        vp8x[0] = VP8X_ALPHA_FLAG;
        vp8x[4..7].copy_from_slice(&width.saturating_sub(1).to_le_bytes()[..3]);
        vp8x[7..10].copy_from_slice(&height.saturating_sub(1).to_le_bytes()[..3]);
        write_chunk(&mut body, b"VP8X", &vp8x);
        write_chunk(&mut body, b"ALPH", alpha.payload(fragment));
    }
    write_chunk(&mut body, &image.fourcc, image.payload(fragment));
    Ok(wrap_riff(&body))
}

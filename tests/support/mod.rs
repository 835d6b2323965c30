#![allow(dead_code)]

use std::path::PathBuf;

/// One patch of a synthetic GIF: placement, delay in centiseconds, and a solid colour.
pub struct Patch {
    pub rect: (u16, u16, u16, u16),
    pub delay_cs: u16,
    pub rgba: [u8; 4],
}

impl Patch {
    pub fn full(width: u16, height: u16, delay_cs: u16, rgba: [u8; 4]) -> Self {
        Self {
            rect: (0, 0, width, height),
            delay_cs,
            rgba,
        }
    }
}

/// Encode a looping GIF out of solid-colour patches.
pub fn gif_bytes(width: u16, height: u16, patches: &[Patch]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut out, width, height, &[]).unwrap();
        enc.set_repeat(gif::Repeat::Infinite).unwrap();
        for p in patches {
            let (left, top, w, h) = p.rect;
            let mut px = p.rgba.repeat(usize::from(w) * usize::from(h));
            let mut frame = gif::Frame::from_rgba(w, h, &mut px);
            frame.left = left;
            frame.top = top;
            frame.delay = p.delay_cs;
            frame.dispose = gif::DisposalMethod::Keep;
            enc.write_frame(&frame).unwrap();
        }
    }
    out
}

/// Per-test scratch directory under `target/`, emptied on creation.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("it").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

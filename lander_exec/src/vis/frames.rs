//! # Frame saver
//!
//! Saves annotated frames as PNGs, marking the frame centre and the detected target.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use log::{debug, info};
use util::logger::LogHandle;

use super::{Snapshot, VisError, Visualiser};
use crate::follower::FollowerState;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Half size of the markers drawn on frames, in pixels
const MARKER_HALF_SIZE: i64 = 6;

const CENTRE_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct FrameSaver {
    dir: PathBuf,

    save_every_n: u64,

    num_shown: u64,

    num_saved: u64,

    closed: bool,

    log: LogHandle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameSaver {
    /// Create a new saver writing into `dir`, which is created if it doesn't exist.
    pub fn new(dir: PathBuf, save_every_n: u64, log: LogHandle) -> Result<Self, VisError> {
        std::fs::create_dir_all(&dir).map_err(VisError::DirError)?;

        Ok(Self {
            dir,
            save_every_n: save_every_n.max(1),
            num_shown: 0,
            num_saved: 0,
            closed: false,
            log,
        })
    }

    pub fn num_saved(&self) -> u64 {
        self.num_saved
    }
}

impl Visualiser for FrameSaver {
    fn show(&mut self, snapshot: &Snapshot) -> Result<(), VisError> {
        if self.closed {
            return Err(VisError::Closed);
        }

        self.num_shown += 1;
        if (self.num_shown - 1) % self.save_every_n != 0 {
            return Ok(());
        }

        let frame = match snapshot.frame {
            Some(ref f) => f,
            None => return Ok(()),
        };

        let mut img = frame.image.to_rgb8();
        let (cx, cy) = frame.centre_px();

        draw_cross(&mut img, cx as i64, cy as i64, CENTRE_COLOUR);

        if let Some(det) = snapshot.obs.detection() {
            draw_box(
                &mut img,
                (cx + det.error_px[0]) as i64,
                (cy + det.error_px[1]) as i64,
                state_colour(snapshot.state),
            );
        }

        let path = self.dir.join(format!("frame_{:06}.png", snapshot.cycle));
        img.save(&path)?;
        self.num_saved += 1;

        debug!(target: self.log.target(), "Saved {:?}", path);

        Ok(())
    }

    fn close(&mut self) {
        if !self.closed {
            info!(
                target: self.log.target(),
                "Frame saver closed, {} frames saved to {:?}",
                self.num_saved,
                self.dir
            );
        }
        self.closed = true;
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn state_colour(state: FollowerState) -> Rgb<u8> {
    match state {
        FollowerState::Acquiring => Rgb([255, 255, 0]),
        FollowerState::Tracking => Rgb([0, 255, 0]),
        FollowerState::HoverOnLoss => Rgb([255, 128, 0]),
        FollowerState::Landing => Rgb([0, 128, 255]),
        FollowerState::Terminated => Rgb([255, 0, 0]),
    }
}

/// Set a pixel, ignoring coordinates outside the image.
fn put(img: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, colour);
    }
}

fn draw_cross(img: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    for d in -MARKER_HALF_SIZE..=MARKER_HALF_SIZE {
        put(img, x + d, y, colour);
        put(img, x, y + d, colour);
    }
}

fn draw_box(img: &mut RgbImage, x: i64, y: i64, colour: Rgb<u8>) {
    for d in -MARKER_HALF_SIZE..=MARKER_HALF_SIZE {
        put(img, x + d, y - MARKER_HALF_SIZE, colour);
        put(img, x + d, y + MARKER_HALF_SIZE, colour);
        put(img, x - MARKER_HALF_SIZE, y + d, colour);
        put(img, x + MARKER_HALF_SIZE, y + d, colour);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vis::test_snapshot;
    use comms_if::eqpt::cam::CamImage;

    #[test]
    fn test_saves_every_nth_frame() {
        let dir = std::env::temp_dir().join(format!("lander_frames_{}", std::process::id()));
        let mut saver = FrameSaver::new(dir.clone(), 2, LogHandle::detached("frames")).unwrap();

        for i in 0..5 {
            let mut s = test_snapshot(i);
            s.frame = Some(CamImage::blank(64, 48));
            saver.show(&s).unwrap();
        }

        assert_eq!(saver.num_saved(), 3);
        assert!(dir.join("frame_000000.png").exists());
        assert!(dir.join("frame_000002.png").exists());
        assert!(!dir.join("frame_000001.png").exists());

        // Marker drawn at centre
        let img = image::open(dir.join("frame_000000.png")).unwrap().to_rgb8();
        assert_eq!(*img.get_pixel(32, 24), CENTRE_COLOUR);

        saver.close();
        assert!(matches!(saver.show(&test_snapshot(9)), Err(VisError::Closed)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_markers_clipped_at_edges() {
        let mut img = RgbImage::new(8, 8);

        draw_box(&mut img, 0, 0, CENTRE_COLOUR);
        draw_cross(&mut img, 100, -100, CENTRE_COLOUR);

        assert_eq!(*img.get_pixel(6, 0), CENTRE_COLOUR);
    }
}

//! Displays rendered frames in the terminal.
use anyhow::{anyhow, Result};
use image::{DynamicImage, RgbImage};
use log::debug;

/// Prints frames to the terminal with `viuer`.
pub(super) struct Viewer {
    config: viuer::Config,
    n_frames: usize,
}

impl Viewer {
    pub fn new() -> Self {
        debug!("Opening terminal viewer");
        Self {
            config: viuer::Config {
                absolute_offset: false,
                ..Default::default()
            },
            n_frames: 0,
        }
    }

    /// Prints `img` below the cursor.
    pub fn show(&mut self, img: &RgbImage) -> Result<()> {
        let img = DynamicImage::ImageRgb8(img.clone());
        viuer::print(&img, &self.config).map_err(|e| anyhow!("{:?}", e))?;
        self.n_frames += 1;
        Ok(())
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        debug!("Closing terminal viewer after {} frames", self.n_frames);
    }
}

//! Orthographic software rendering of planar scenes.
use anyhow::Result;
use gym_dmc_core::error::GymDmcError;
use image::{Rgb, RgbImage};

const SKY_TOP: Rgb<u8> = Rgb([56, 82, 112]);
const SKY_BOTTOM: Rgb<u8> = Rgb([150, 176, 204]);
const GROUND_DARK: Rgb<u8> = Rgb([48, 66, 84]);
const GROUND_LIGHT: Rgb<u8> = Rgb([76, 100, 124]);

/// Color of the bodies of a model.
pub const SELF_COLOR: Rgb<u8> = Rgb([178, 128, 77]);

/// Color of the bodies when the reward is maximal.
pub const SELF_HIGHLIGHT: Rgb<u8> = Rgb([77, 178, 102]);

/// Color of targets and decorations.
pub const DECOR_COLOR: Rgb<u8> = Rgb([204, 77, 77]);

/// Blends `SELF_COLOR` towards `SELF_HIGHLIGHT` by `highlight`.
pub fn self_color(highlight: Option<f64>) -> Rgb<u8> {
    match highlight {
        None => SELF_COLOR,
        Some(h) => {
            let h = h.clamp(0.0, 1.0);
            let mut c = [0u8; 3];
            for (i, v) in c.iter_mut().enumerate() {
                let a = SELF_COLOR.0[i] as f64;
                let b = SELF_HIGHLIGHT.0[i] as f64;
                *v = (a + (b - a) * h).round() as u8;
            }
            Rgb(c)
        }
    }
}

/// A camera looking at the x-z plane.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// World point at the center of the image.
    pub center: (f64, f64),

    /// Width of the visible region in meters.
    pub view_width: f64,
}

/// An image onto which world-space primitives are drawn.
pub struct Canvas {
    img: RgbImage,
    camera: Camera,
    scale: f64,
}

impl Canvas {
    /// Creates a canvas filled with the sky gradient.
    pub fn new(height: usize, width: usize, camera: Camera) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(GymDmcError::InvalidConfig(format!(
                "cannot render a {}x{} image",
                height, width
            ))
            .into());
        }
        let img = RgbImage::from_fn(width as u32, height as u32, |_, y| {
            let t = y as f64 / height as f64;
            let mut c = [0u8; 3];
            for (i, v) in c.iter_mut().enumerate() {
                let a = SKY_TOP.0[i] as f64;
                let b = SKY_BOTTOM.0[i] as f64;
                *v = (a + (b - a) * t).round() as u8;
            }
            Rgb(c)
        });
        let scale = width as f64 / camera.view_width;

        Ok(Self { img, camera, scale })
    }

    fn to_px(&self, p: (f64, f64)) -> (f64, f64) {
        let (w, h) = (self.img.width() as f64, self.img.height() as f64);
        (
            w / 2.0 + (p.0 - self.camera.center.0) * self.scale,
            h / 2.0 - (p.1 - self.camera.center.1) * self.scale,
        )
    }

    fn to_world(&self, px: f64, py: f64) -> (f64, f64) {
        let (w, h) = (self.img.width() as f64, self.img.height() as f64);
        (
            self.camera.center.0 + (px - w / 2.0) / self.scale,
            self.camera.center.1 - (py - h / 2.0) / self.scale,
        )
    }

    /// Fills everything below height `z` with a checkered floor of `tile`-meter stripes.
    pub fn ground(&mut self, z: f64, tile: f64) {
        let (_, y0) = self.to_px((0.0, z));
        let y0 = y0.max(0.0).ceil() as u32;
        for y in y0..self.img.height() {
            for x in 0..self.img.width() {
                let (wx, _) = self.to_world(x as f64 + 0.5, y as f64 + 0.5);
                let c = if (wx / tile).floor() as i64 % 2 == 0 {
                    GROUND_DARK
                } else {
                    GROUND_LIGHT
                };
                self.img.put_pixel(x, y, c);
            }
        }
    }

    /// Paints pixels whose centers lie within `radius` pixels of the segment `a`-`b` in
    /// pixel space.
    fn stroke_px(&mut self, a: (f64, f64), b: (f64, f64), radius: f64, color: Rgb<u8>) {
        let (w, h) = (self.img.width() as f64, self.img.height() as f64);
        let x0 = (a.0.min(b.0) - radius).floor().max(0.0) as u32;
        let x1 = (a.0.max(b.0) + radius).ceil().min(w) as u32;
        let y0 = (a.1.min(b.1) - radius).floor().max(0.0) as u32;
        let y1 = (a.1.max(b.1) + radius).ceil().min(h) as u32;
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len2 = dx * dx + dy * dy;

        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                let t = if len2 > 0.0 {
                    (((px - a.0) * dx + (py - a.1) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let (qx, qy) = (a.0 + t * dx - px, a.1 + t * dy - py);
                if qx * qx + qy * qy <= radius * radius {
                    self.img.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Draws a capsule of the given thickness between two world points.
    pub fn capsule(&mut self, a: (f64, f64), b: (f64, f64), thickness: f64, color: Rgb<u8>) {
        let radius = (thickness * self.scale / 2.0).max(0.5);
        let (a, b) = (self.to_px(a), self.to_px(b));
        self.stroke_px(a, b, radius, color);
    }

    /// Draws a disk.
    pub fn disk(&mut self, center: (f64, f64), radius: f64, color: Rgb<u8>) {
        let c = self.to_px(center);
        self.stroke_px(c, c, (radius * self.scale).max(0.5), color);
    }

    /// Draws an axis-aligned rectangle spanned by two corners.
    pub fn rect(&mut self, a: (f64, f64), b: (f64, f64), color: Rgb<u8>) {
        let (a, b) = (self.to_px(a), self.to_px(b));
        let (w, h) = (self.img.width() as f64, self.img.height() as f64);
        let x0 = a.0.min(b.0).round().clamp(0.0, w) as u32;
        let x1 = a.0.max(b.0).round().clamp(0.0, w) as u32;
        let y0 = a.1.min(b.1).round().clamp(0.0, h) as u32;
        let y1 = a.1.max(b.1).round().clamp(0.0, h) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.img.put_pixel(x, y, color);
            }
        }
    }

    /// Returns the image.
    pub fn into_image(self) -> RgbImage {
        self.img
    }
}

/// Returns an error for a camera id the model does not define.
pub fn unknown_camera(domain: &str, camera_id: i32, n_cameras: usize) -> anyhow::Error {
    GymDmcError::InvalidConfig(format!(
        "{} has cameras -1..{}, got camera_id {}",
        domain,
        n_cameras as i32 - 1,
        camera_id
    ))
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            center: (0.0, 0.0),
            view_width: 2.0,
        }
    }

    #[test]
    fn test_canvas_size() -> Result<()> {
        let img = Canvas::new(30, 40, camera())?.into_image();
        assert_eq!((img.width(), img.height()), (40, 30));
        Ok(())
    }

    #[test]
    fn test_empty_canvas_is_an_error() {
        assert!(Canvas::new(0, 40, camera()).is_err());
    }

    #[test]
    fn test_disk_at_center() -> Result<()> {
        let mut canvas = Canvas::new(20, 20, camera())?;
        canvas.disk((0.0, 0.0), 0.2, DECOR_COLOR);
        let img = canvas.into_image();
        assert_eq!(*img.get_pixel(10, 10), DECOR_COLOR);
        assert_ne!(*img.get_pixel(0, 0), DECOR_COLOR);
        Ok(())
    }

    #[test]
    fn test_ground_below_horizon() -> Result<()> {
        let mut canvas = Canvas::new(20, 20, camera())?;
        canvas.ground(0.0, 0.5);
        let img = canvas.into_image();
        let c = *img.get_pixel(5, 15);
        assert!(c == GROUND_DARK || c == GROUND_LIGHT);
        let c = *img.get_pixel(5, 5);
        assert!(c != GROUND_DARK && c != GROUND_LIGHT);
        Ok(())
    }

    #[test]
    fn test_highlight_blends() {
        assert_eq!(self_color(None), SELF_COLOR);
        assert_eq!(self_color(Some(1.0)), SELF_HIGHLIGHT);
        assert_eq!(self_color(Some(0.0)), SELF_COLOR);
    }
}

//! Rendering modes and results.
use crate::{error::GymDmcError, Array};
use image::RgbImage;
use std::{fmt, str::FromStr};

/// How a frame is returned by [`Env::render`](crate::Env::render).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// `u8` array of shape `[height, width, 3]`.
    Rgb,

    /// `u8` array of shape `[height, width, 1]`, the mean over color channels.
    Gray,

    /// An image object.
    Human,

    /// Displays the image in the terminal and returns it.
    Notebook,
}

impl RenderMode {
    /// Modes accepted by [`RenderMode::from_str`].
    pub const NAMES: [&'static str; 6] = ["rgb", "rgb_array", "gray", "grey", "human", "notebook"];
}

impl FromStr for RenderMode {
    type Err = GymDmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rgb" | "rgb_array" => Ok(RenderMode::Rgb),
            "gray" | "grey" => Ok(RenderMode::Gray),
            "human" => Ok(RenderMode::Human),
            "notebook" => Ok(RenderMode::Notebook),
            _ => Err(GymDmcError::UnsupportedRenderMode(s.to_string())),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenderMode::Rgb => "rgb_array",
            RenderMode::Gray => "gray",
            RenderMode::Human => "human",
            RenderMode::Notebook => "notebook",
        };
        write!(f, "{}", s)
    }
}

/// Resolution and camera of a frame.
///
/// `None` falls back to the environment's configured value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOpts {
    /// Height in pixels.
    pub height: Option<usize>,

    /// Width in pixels.
    pub width: Option<usize>,

    /// Camera selector.
    pub camera_id: Option<i32>,
}

impl RenderOpts {
    /// Sets the height.
    pub fn height(mut self, v: usize) -> Self {
        self.height = Some(v);
        self
    }

    /// Sets the width.
    pub fn width(mut self, v: usize) -> Self {
        self.width = Some(v);
        self
    }

    /// Sets the camera.
    pub fn camera_id(mut self, v: i32) -> Self {
        self.camera_id = Some(v);
        self
    }
}

/// A rendered frame.
#[derive(Debug, Clone)]
pub enum Rendered {
    /// Pixel array for [`RenderMode::Rgb`] and [`RenderMode::Gray`].
    Array(Array),

    /// Image for [`RenderMode::Human`] and [`RenderMode::Notebook`].
    Image(RgbImage),
}

impl Rendered {
    /// Returns the pixel array, if any.
    pub fn into_array(self) -> Option<Array> {
        match self {
            Rendered::Array(a) => Some(a),
            Rendered::Image(_) => None,
        }
    }

    /// Returns the image, if any.
    pub fn into_image(self) -> Option<RgbImage> {
        match self {
            Rendered::Array(_) => None,
            Rendered::Image(img) => Some(img),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render_mode() {
        assert_eq!("rgb_array".parse::<RenderMode>(), Ok(RenderMode::Rgb));
        assert_eq!("grey".parse::<RenderMode>(), Ok(RenderMode::Gray));
        assert_eq!(
            "depth".parse::<RenderMode>(),
            Err(GymDmcError::UnsupportedRenderMode("depth".to_string()))
        );
        for name in RenderMode::NAMES.iter() {
            assert!(name.parse::<RenderMode>().is_ok());
        }
    }
}

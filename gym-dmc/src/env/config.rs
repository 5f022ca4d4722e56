//! Configuration of [`DmcEnv`](super::DmcEnv).
use anyhow::Result;
use gym_dmc_core::error::GymDmcError;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`DmcEnv`](super::DmcEnv).
///
/// Every field has a default, so a configuration can be deserialized from a
/// partial mapping such as the keyword arguments of a registered environment.
/// Unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DmcEnvConfig {
    /// Domain of the control suite, e.g. `walker`.
    pub domain_name: String,

    /// Task of the domain, e.g. `walk`.
    pub task_name: String,

    /// Seed of the task's random number generator.
    pub task_seed: Option<u64>,

    /// Episode length of the native environment in seconds.
    pub time_limit: Option<f64>,

    /// Number of native steps per call to `step`.
    pub frame_skip: usize,

    /// Adds the rendered frame to the observation under `"pixels"`.
    pub from_pixels: bool,

    /// Converts frames to a single gray channel.
    pub gray_scale: bool,

    /// Lays frames out as `[c, h, w]` instead of `[h, w, c]`.
    pub channels_first: bool,

    /// Frame height in pixels.
    pub height: usize,

    /// Frame width in pixels.
    pub width: usize,

    /// Camera used for frames.
    pub camera_id: i32,

    /// Tints the bodies by the last reward when rendering.
    pub visualize_reward: bool,

    /// Zero-action steps taken after every reset.
    pub skip_start: usize,

    /// Starts each episode from the physics state the previous episode ended in.
    pub warmstart: bool,

    /// Zeroes every body mass.
    pub no_gravity: bool,

    /// Zeroes the velocities before every native step.
    pub non_newtonian: bool,
}

impl Default for DmcEnvConfig {
    fn default() -> Self {
        Self {
            domain_name: "".to_string(),
            task_name: "".to_string(),
            task_seed: None,
            time_limit: None,
            frame_skip: 1,
            from_pixels: false,
            gray_scale: false,
            channels_first: true,
            height: 84,
            width: 84,
            camera_id: 0,
            visualize_reward: false,
            skip_start: 0,
            warmstart: false,
            no_gravity: false,
            non_newtonian: false,
        }
    }
}

fn invalid(msg: String) -> Result<()> {
    Err(GymDmcError::InvalidConfig(msg).into())
}

impl DmcEnvConfig {
    /// Creates a configuration for a task of the suite.
    pub fn new(domain_name: impl Into<String>, task_name: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            task_name: task_name.into(),
            ..Default::default()
        }
    }

    /// Sets the seed of the task.
    pub fn task_seed(mut self, v: u64) -> Self {
        self.task_seed = Some(v);
        self
    }

    /// Sets the episode length of the native environment in seconds.
    pub fn time_limit(mut self, v: f64) -> Self {
        self.time_limit = Some(v);
        self
    }

    /// Sets the number of native steps per call to `step`.
    pub fn frame_skip(mut self, v: usize) -> Self {
        self.frame_skip = v;
        self
    }

    /// Enables pixel observations.
    pub fn from_pixels(mut self, v: bool) -> Self {
        self.from_pixels = v;
        self
    }

    /// Enables gray-scale frames.
    pub fn gray_scale(mut self, v: bool) -> Self {
        self.gray_scale = v;
        self
    }

    /// Sets the frame layout.
    pub fn channels_first(mut self, v: bool) -> Self {
        self.channels_first = v;
        self
    }

    /// Sets the frame size.
    pub fn size(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Sets the camera.
    pub fn camera_id(mut self, v: i32) -> Self {
        self.camera_id = v;
        self
    }

    /// Enables reward tinting of rendered frames.
    pub fn visualize_reward(mut self, v: bool) -> Self {
        self.visualize_reward = v;
        self
    }

    /// Sets the number of zero-action steps after every reset.
    pub fn skip_start(mut self, v: usize) -> Self {
        self.skip_start = v;
        self
    }

    /// Enables warm starts.
    pub fn warmstart(mut self, v: bool) -> Self {
        self.warmstart = v;
        self
    }

    /// Zeroes every body mass.
    pub fn no_gravity(mut self, v: bool) -> Self {
        self.no_gravity = v;
        self
    }

    /// Zeroes the velocities before every native step.
    pub fn non_newtonian(mut self, v: bool) -> Self {
        self.non_newtonian = v;
        self
    }

    /// Checks the values that cannot be represented by the types alone.
    pub fn validate(&self) -> Result<()> {
        if self.frame_skip == 0 {
            return invalid("frame_skip must be at least 1".to_string());
        }
        if self.height == 0 || self.width == 0 {
            return invalid(format!(
                "frame size must be positive, got {}x{}",
                self.height, self.width
            ));
        }
        if let Some(t) = self.time_limit {
            if t.is_nan() || t <= 0.0 {
                return invalid(format!("time_limit must be positive, got {}", t));
            }
        }
        Ok(())
    }

    /// Number of channels of a frame.
    pub fn n_channels(&self) -> usize {
        if self.gray_scale {
            1
        } else {
            3
        }
    }

    /// Shape of a frame in the configured layout.
    pub fn pixel_shape(&self) -> Vec<usize> {
        let c = self.n_channels();
        if self.channels_first {
            vec![c, self.height, self.width]
        } else {
            vec![self.height, self.width, c]
        }
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

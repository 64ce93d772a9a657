use serde::{Deserialize, Serialize};

/// Sample type of a linear PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    #[default]
    S16Le,
    S24Le,
    S32Le,
    F32Le,
}

impl SampleFormat {
    /// Size of one sample in bytes
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16Le => 2,
            Self::S24Le => 3,
            Self::S32Le | Self::F32Le => 4,
        }
    }
}

/// PCM format descriptor for the audio loopback path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u8,
    /// Sample type
    pub sample: SampleFormat,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            sample: SampleFormat::default(),
        }
    }
}

impl PcmFormat {
    /// Size of one interleaved frame in bytes
    pub const fn bytes_per_frame(&self) -> usize {
        self.sample.bytes_per_sample() * self.channels as usize
    }

    /// Validate the format descriptor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError {
                field: "sample_rate".to_string(),
                message: "Sample rate must be non-zero".to_string(),
            });
        }

        if self.channels == 0 || self.channels > 8 {
            return Err(ConfigError {
                field: "channels".to_string(),
                message: "Channel count must be between 1 and 8".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration for the video capture pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Capture device node of the USB capture card, e.g. /dev/video0
    pub device: String,
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    /// Frames per second (1-60)
    pub fps: u8,
    /// Output file for the recording branch; None disables recording
    pub recording_path: Option<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 1920,
            height: 1080,
            fps: 30,
            recording_path: None,
        }
    }
}

impl VideoConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.is_empty() {
            return Err(ConfigError {
                field: "device".to_string(),
                message: "Capture device cannot be empty".to_string(),
            });
        }

        if self.fps == 0 || self.fps > 60 {
            return Err(ConfigError {
                field: "fps".to_string(),
                message: "FPS must be between 1 and 60".to_string(),
            });
        }

        if self.width == 0 || self.height == 0 {
            return Err(ConfigError {
                field: "resolution".to_string(),
                message: "Width and height must be non-zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Validation error for configuration values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

// PulseAudio backend for the loopback worker
//
// Uses the blocking simple API: one Record connection for the capture
// card's audio interface and one Playback connection for the operator's
// output device. Works with both PulseAudio and PipeWire (via
// pipewire-pulse).

use std::io;

use libpulse_binding::sample;
use libpulse_binding::stream::Direction;
use libpulse_simple_binding::Simple;
use tracing::debug;

use super::{AudioBackend, AudioDevice, AudioDirection, AudioError, AudioInput, AudioOutput};
use crate::config::{PcmFormat, SampleFormat};

/// Bytes reported per availability poll; the simple API blocks until the
/// requested bytes arrive, so the worker always has a full block to read.
const READ_BLOCK: usize = 4096;

/// Backend over the PulseAudio simple API
pub struct PulseAudioBackend {
    app_name: String,
}

impl PulseAudioBackend {
    pub fn new() -> Self {
        Self {
            app_name: "openterface-media".to_string(),
        }
    }
}

impl Default for PulseAudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert the PCM descriptor to a PulseAudio sample format
fn to_pa_format(sample: SampleFormat) -> sample::Format {
    match sample {
        SampleFormat::S16Le => sample::Format::S16le,
        SampleFormat::S24Le => sample::Format::S24le,
        SampleFormat::S32Le => sample::Format::S32le,
        SampleFormat::F32Le => sample::Format::F32le,
    }
}

fn spec_for(format: &PcmFormat) -> sample::Spec {
    sample::Spec {
        format: to_pa_format(format.sample),
        channels: format.channels,
        rate: format.sample_rate,
    }
}

/// Map the device descriptor to a PulseAudio device argument
fn device_arg(device: &AudioDevice) -> Option<&str> {
    if device.id.is_empty() || device.id == "default" {
        None
    } else {
        Some(&device.id)
    }
}

impl AudioBackend for PulseAudioBackend {
    fn open_input(
        &self,
        device: &AudioDevice,
        format: &PcmFormat,
    ) -> Result<Box<dyn AudioInput>, AudioError> {
        let spec = spec_for(format);
        let simple = Simple::new(
            None,                // Use default server
            &self.app_name,      // Application name
            Direction::Record,   // Recording direction
            device_arg(device),  // Device, None for default
            "loopback capture",  // Stream description
            &spec,               // Sample spec
            None,                // Default channel map
            None,                // Default buffering attributes
        )
        .map_err(|e| AudioError::OpenFailed {
            device: device.id.clone(),
            direction: AudioDirection::Input,
            reason: e.to_string(),
        })?;

        Ok(Box::new(PulseInput { simple }))
    }

    fn open_output(
        &self,
        device: &AudioDevice,
        format: &PcmFormat,
    ) -> Result<Box<dyn AudioOutput>, AudioError> {
        let spec = spec_for(format);
        let simple = Simple::new(
            None,
            &self.app_name,
            Direction::Playback,
            device_arg(device),
            "loopback playback",
            &spec,
            None,
            None,
        )
        .map_err(|e| AudioError::OpenFailed {
            device: device.id.clone(),
            direction: AudioDirection::Output,
            reason: e.to_string(),
        })?;

        Ok(Box::new(PulseOutput {
            simple,
            sample: format.sample,
            volume: 1.0,
            gain_unsupported_logged: false,
        }))
    }
}

struct PulseInput {
    simple: Simple,
}

impl AudioInput for PulseInput {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(READ_BLOCK)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.simple.read(buf).map_err(to_io)?;
        Ok(buf.len())
    }
}

struct PulseOutput {
    simple: Simple,
    sample: SampleFormat,
    volume: f64,
    gain_unsupported_logged: bool,
}

impl AudioOutput for PulseOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The simple API has no per-stream volume; gain is applied in
        // software before the frames reach the server.
        if (self.volume - 1.0).abs() < f64::EPSILON {
            self.simple.write(buf).map_err(to_io)?;
            return Ok(buf.len());
        }

        match self.sample {
            SampleFormat::S16Le => {
                let scaled: Vec<u8> = buf
                    .chunks_exact(2)
                    .flat_map(|pair| {
                        let sample = i16::from_le_bytes([pair[0], pair[1]]);
                        let scaled = (f64::from(sample) * self.volume) as i16;
                        scaled.to_le_bytes()
                    })
                    .collect();
                self.simple.write(&scaled).map_err(to_io)?;
            }
            SampleFormat::F32Le => {
                let scaled: Vec<u8> = buf
                    .chunks_exact(4)
                    .flat_map(|quad| {
                        let sample = f32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]]);
                        ((sample as f64 * self.volume) as f32).to_le_bytes()
                    })
                    .collect();
                self.simple.write(&scaled).map_err(to_io)?;
            }
            other => {
                if !self.gain_unsupported_logged {
                    debug!(format = ?other, "software gain not implemented for this sample type, writing unscaled");
                    self.gain_unsupported_logged = true;
                }
                self.simple.write(buf).map_err(to_io)?;
            }
        }

        Ok(buf.len())
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }
}

fn to_io(e: libpulse_binding::error::PAErr) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

// Fake audio backend for testing
//
// Scripted input chunks, captured output bytes, and atomic open/close
// counters so tests can assert the release invariants without touching
// real audio hardware.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use super::{AudioBackend, AudioDevice, AudioDirection, AudioError, AudioInput, AudioOutput};
use crate::config::PcmFormat;

/// Configurable fake backend for testing
#[derive(Debug, Clone, Default)]
pub struct FakeAudioBackend {
    shared: Arc<FakeShared>,
}

#[derive(Debug, Default)]
struct FakeShared {
    fail_input_open: AtomicBool,
    fail_output_open: AtomicBool,
    short_writes: AtomicBool,
    input_opens: AtomicU32,
    input_closes: AtomicU32,
    output_opens: AtomicU32,
    output_closes: AtomicU32,
    /// Chunks that become available to the input stream, in order
    script: Mutex<VecDeque<Vec<u8>>>,
    /// Every byte handed out by the input stream, in order
    read_log: Mutex<Vec<u8>>,
    /// Every byte accepted by the output stream, in order
    written: Mutex<Vec<u8>>,
    /// Volume values applied to the output stream, in order
    volumes: Mutex<Vec<f64>>,
}

impl FakeAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose input device fails to open
    pub fn failing_input() -> Self {
        let backend = Self::new();
        backend.shared.fail_input_open.store(true, Ordering::SeqCst);
        backend
    }

    /// Backend whose output device fails to open
    pub fn failing_output() -> Self {
        let backend = Self::new();
        backend.shared.fail_output_open.store(true, Ordering::SeqCst);
        backend
    }

    /// Make the output accept one byte less than offered per write
    pub fn enable_short_writes(&self) {
        self.shared.short_writes.store(true, Ordering::SeqCst);
    }

    /// Queue a chunk of input bytes
    pub fn push_chunk(&self, bytes: &[u8]) {
        self.shared
            .script
            .lock()
            .unwrap()
            .push_back(bytes.to_vec());
    }

    pub fn written(&self) -> Vec<u8> {
        self.shared.written.lock().unwrap().clone()
    }

    pub fn read_log(&self) -> Vec<u8> {
        self.shared.read_log.lock().unwrap().clone()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.shared.volumes.lock().unwrap().clone()
    }

    pub fn input_opens(&self) -> u32 {
        self.shared.input_opens.load(Ordering::SeqCst)
    }

    pub fn input_closes(&self) -> u32 {
        self.shared.input_closes.load(Ordering::SeqCst)
    }

    pub fn output_opens(&self) -> u32 {
        self.shared.output_opens.load(Ordering::SeqCst)
    }

    pub fn output_closes(&self) -> u32 {
        self.shared.output_closes.load(Ordering::SeqCst)
    }
}

impl AudioBackend for FakeAudioBackend {
    fn open_input(
        &self,
        device: &AudioDevice,
        _format: &PcmFormat,
    ) -> Result<Box<dyn AudioInput>, AudioError> {
        if self.shared.fail_input_open.load(Ordering::SeqCst) {
            return Err(AudioError::OpenFailed {
                device: device.id.clone(),
                direction: AudioDirection::Input,
                reason: "simulated input open failure".to_string(),
            });
        }

        self.shared.input_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeInput {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn open_output(
        &self,
        device: &AudioDevice,
        _format: &PcmFormat,
    ) -> Result<Box<dyn AudioOutput>, AudioError> {
        if self.shared.fail_output_open.load(Ordering::SeqCst) {
            return Err(AudioError::OpenFailed {
                device: device.id.clone(),
                direction: AudioDirection::Output,
                reason: "simulated output open failure".to_string(),
            });
        }

        self.shared.output_opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeOutput {
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct FakeInput {
    shared: Arc<FakeShared>,
}

impl AudioInput for FakeInput {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self
            .shared
            .script
            .lock()
            .unwrap()
            .front()
            .map(Vec::len)
            .unwrap_or(0))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut script = self.shared.script.lock().unwrap();
        let Some(front) = script.front_mut() else {
            return Ok(0);
        };

        let n = buf.len().min(front.len());
        buf[..n].copy_from_slice(&front[..n]);
        front.drain(..n);
        if front.is_empty() {
            script.pop_front();
        }
        drop(script);

        self.shared
            .read_log
            .lock()
            .unwrap()
            .extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

impl Drop for FakeInput {
    fn drop(&mut self) {
        self.shared.input_closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeOutput {
    shared: Arc<FakeShared>,
}

impl AudioOutput for FakeOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accept = if self.shared.short_writes.load(Ordering::SeqCst) && buf.len() > 1 {
            buf.len() - 1
        } else {
            buf.len()
        };

        self.shared
            .written
            .lock()
            .unwrap()
            .extend_from_slice(&buf[..accept]);
        Ok(accept)
    }

    fn set_volume(&mut self, volume: f64) {
        self.shared.volumes.lock().unwrap().push(volume);
    }
}

impl Drop for FakeOutput {
    fn drop(&mut self) {
        self.shared.output_closes.fetch_add(1, Ordering::SeqCst);
    }
}

// Audio loopback worker
//
// Shuttles PCM frames from the capture card's audio interface to the
// operator's output device on a dedicated thread. Stop is cooperative:
// the worker checks the running flag at the top of each iteration and
// releases both streams on every exit path before terminating.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use super::{AudioBackend, AudioDevice, AudioError, AudioInput, AudioOutput};
use crate::config::PcmFormat;
use crate::events::LoopbackEvent;
use crate::state::{LoopbackState, LoopbackStateMachine};

/// Bytes moved per loop iteration
const BLOCK_SIZE: usize = 4096;

/// Sleep between polls when the input has no data
const IDLE_POLL: Duration = Duration::from_micros(100);

/// Live audio loopback between one input and one output device
///
/// Construction opens no device handle. `start` launches the worker
/// thread, which opens both streams, shuttles bytes in FIFO order, and
/// emits at most one `Error` and exactly one `Finished` event. Dropping
/// the worker stops and joins it.
pub struct AudioLoopback {
    backend: Arc<dyn AudioBackend>,
    input: AudioDevice,
    output: AudioDevice,
    format: PcmFormat,
    running: Arc<AtomicBool>,
    volume: Arc<Mutex<f64>>,
    state: Arc<Mutex<LoopbackStateMachine>>,
    events_tx: Sender<LoopbackEvent>,
    events_rx: Receiver<LoopbackEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl AudioLoopback {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        input: AudioDevice,
        output: AudioDevice,
        format: PcmFormat,
    ) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            backend,
            input,
            output,
            format,
            running: Arc::new(AtomicBool::new(false)),
            volume: Arc::new(Mutex::new(1.0)),
            state: Arc::new(Mutex::new(LoopbackStateMachine::new())),
            events_tx,
            events_rx,
            worker: None,
        }
    }

    /// Worker event stream; subscribe once at construction
    pub fn events(&self) -> Receiver<LoopbackEvent> {
        self.events_rx.clone()
    }

    /// Current worker state
    pub fn state(&self) -> LoopbackState {
        self.state.lock().unwrap().state()
    }

    /// Current output gain
    pub fn volume(&self) -> f64 {
        *self.volume.lock().unwrap()
    }

    /// Set the output gain, clamped to 0.0..=1.0
    ///
    /// The worker applies the new value to the live output stream at the
    /// top of its next iteration; subsequent `volume()` reads observe the
    /// written value immediately.
    pub fn set_volume(&self, volume: f64) {
        let clamped = volume.clamp(0.0, 1.0);
        *self.volume.lock().unwrap() = clamped;
        debug!(volume = clamped, "loopback volume updated");
    }

    /// Launch the worker thread
    ///
    /// Device-open failures are reported through the event stream, not
    /// this return value; `Err` here means the worker could not be
    /// launched at all.
    pub fn start(&mut self) -> Result<(), AudioError> {
        {
            let mut sm = self.state.lock().unwrap();
            if sm.state() != LoopbackState::Idle {
                return Err(AudioError::AlreadyRunning);
            }
            let _ = sm.begin();
        }

        info!(
            input = %self.input.id,
            output = %self.output.id,
            rate = self.format.sample_rate,
            channels = self.format.channels,
            "starting audio loopback"
        );

        self.running.store(true, Ordering::Release);

        let worker = Worker {
            backend: Arc::clone(&self.backend),
            input: self.input.clone(),
            output: self.output.clone(),
            format: self.format,
            running: Arc::clone(&self.running),
            volume: Arc::clone(&self.volume),
            state: Arc::clone(&self.state),
            events_tx: self.events_tx.clone(),
        };

        match thread::Builder::new()
            .name("audio-loopback".to_string())
            .spawn(move || worker.run())
        {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                let message = format!("failed to spawn loopback worker: {}", e);
                self.state.lock().unwrap().fail(message.as_str());
                Err(AudioError::Backend(message))
            }
        }
    }

    /// Cooperative stop; joins the worker before returning
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        {
            let _ = self.state.lock().unwrap().request_stop();
        }

        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }

        let _ = self.state.lock().unwrap().finish();
    }
}

impl Drop for AudioLoopback {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AudioLoopback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioLoopback")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("format", &self.format)
            .field("state", &self.state.lock().unwrap().state())
            .finish()
    }
}

/// Everything the worker thread owns or shares with the handle
struct Worker {
    backend: Arc<dyn AudioBackend>,
    input: AudioDevice,
    output: AudioDevice,
    format: PcmFormat,
    running: Arc<AtomicBool>,
    volume: Arc<Mutex<f64>>,
    state: Arc<Mutex<LoopbackStateMachine>>,
    events_tx: Sender<LoopbackEvent>,
}

impl Worker {
    fn run(self) {
        debug!(input = %self.input.id, output = %self.output.id, "loopback worker started");

        let mut input = match self.backend.open_input(&self.input, &self.format) {
            Ok(stream) => stream,
            Err(e) => {
                self.fail(e.to_string());
                self.terminate();
                return;
            }
        };

        let mut output = match self.backend.open_output(&self.output, &self.format) {
            Ok(stream) => stream,
            Err(e) => {
                // Release the already-open input before reporting
                drop(input);
                self.fail(e.to_string());
                self.terminate();
                return;
            }
        };

        let outcome = self.shuttle(input.as_mut(), output.as_mut());

        // Release sequence: input side first, then output side
        drop(input);
        drop(output);

        if let Err(message) = outcome {
            self.fail(message);
        }
        self.terminate();
    }

    fn shuttle(&self, input: &mut dyn AudioInput, output: &mut dyn AudioOutput) -> Result<(), String> {
        let mut buf = [0u8; BLOCK_SIZE];
        let mut applied = self.current_volume();
        output.set_volume(applied);

        while self.running.load(Ordering::Acquire) {
            let wanted = self.current_volume();
            if wanted != applied {
                output.set_volume(wanted);
                applied = wanted;
            }

            let available = input
                .bytes_available()
                .map_err(|e| format!("audio input poll failed: {}", e))?;
            if available == 0 {
                thread::sleep(IDLE_POLL);
                continue;
            }

            let want = available.min(BLOCK_SIZE);
            let got = input
                .read(&mut buf[..want])
                .map_err(|e| format!("audio read failed: {}", e))?;
            if got == 0 {
                thread::sleep(IDLE_POLL);
                continue;
            }

            let wrote = output
                .write(&buf[..got])
                .map_err(|e| format!("audio write failed: {}", e))?;
            if wrote != got {
                debug!(requested = got, written = wrote, "short write to audio output");
            }
        }

        Ok(())
    }

    fn current_volume(&self) -> f64 {
        *self.volume.lock().unwrap()
    }

    fn fail(&self, message: String) {
        warn!(error = %message, "audio loopback failed");
        self.state.lock().unwrap().fail(message.as_str());
        let _ = self.events_tx.send(LoopbackEvent::Error(message));
    }

    fn terminate(&self) {
        self.running.store(false, Ordering::Release);
        let _ = self.events_tx.send(LoopbackEvent::Finished);
        debug!("loopback worker terminated");
    }
}

use crate::logging::DeviceLogger;
use crate::transfer::{BusTransfer, TransferError};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::Dispatch;

/// Shared buffer behind a capturing dispatcher.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub(crate) fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.0.lock().unwrap_or_else(|poison| poison.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A device logger whose output lands in memory instead of stderr.
pub(crate) fn capturing_logger(device: &str) -> (DeviceLogger, CapturedLogs) {
    let logs = CapturedLogs::default();
    let sink = logs.0.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || CaptureWriter(sink.clone()))
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    (DeviceLogger::new(device, Dispatch::new(subscriber)), logs)
}

/// Transfer fake that replays canned samples, one per call.
pub(crate) struct ScriptedTransfer {
    pub(crate) samples: Vec<Result<u16, TransferError>>,
    pub(crate) channels: Vec<u8>,
}

impl ScriptedTransfer {
    pub(crate) fn new(samples: Vec<Result<u16, TransferError>>) -> Self {
        Self {
            samples,
            channels: Vec::new(),
        }
    }

    pub(crate) fn always(raw: u16) -> Self {
        Self::new(vec![Ok(raw); 16])
    }
}

impl BusTransfer for ScriptedTransfer {
    fn transfer(&mut self, channel: u8) -> Result<u16, TransferError> {
        self.channels.push(channel);
        if self.samples.is_empty() {
            return Err(TransferError::Other("script exhausted".to_string()));
        }
        self.samples.remove(0)
    }

    fn full_scale(&self) -> u16 {
        1023
    }
}

/// Entry/exit timestamps of one transfer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Window {
    pub(crate) entered: Instant,
    pub(crate) exited: Instant,
}

/// Transfer fake that records the time window of every call.
///
/// Clones share the same log, so several readers driving "the same chip" from
/// different threads record into one timeline.
#[derive(Clone)]
pub(crate) struct RecordingTransfer {
    windows: Arc<Mutex<Vec<Window>>>,
    hold: Duration,
}

impl RecordingTransfer {
    pub(crate) fn new(hold: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Vec::new())),
            hold,
        }
    }

    pub(crate) fn windows(&self) -> Vec<Window> {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone();
        windows.sort_by_key(|w| w.entered);
        windows
    }
}

impl BusTransfer for RecordingTransfer {
    fn transfer(&mut self, channel: u8) -> Result<u16, TransferError> {
        let entered = Instant::now();
        std::thread::sleep(self.hold);
        let exited = Instant::now();
        self.windows
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(Window { entered, exited });
        Ok(u16::from(channel) * 100)
    }

    fn full_scale(&self) -> u16 {
        1023
    }
}

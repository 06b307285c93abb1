//! Test and simulation doubles for meter_core.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use meter_traits::{Adc, BoxError, Canvas, PumpEvent, Radio};

/// A converter that replays scripted raw conversions per channel.
///
/// Channels without a script return a constant level. Scripts cycle when
/// exhausted, so a single period of a waveform is enough for long windows.
pub struct ScriptedAdc {
    default_level: u16,
    scripts: HashMap<u8, Vec<u16>>,
    cursors: HashMap<u8, usize>,
    selected: u8,
    read_counts: HashMap<u8, usize>,
    total_reads: usize,
    /// When set, `read` fails once this many total reads have been served.
    pub fail_after_reads: Option<usize>,
    /// Every `select_channel` call in order, for sequencing assertions.
    pub selection_log: Vec<u8>,
}

impl ScriptedAdc {
    pub fn constant(level: u16) -> Self {
        Self {
            default_level: level,
            scripts: HashMap::new(),
            cursors: HashMap::new(),
            selected: 0,
            read_counts: HashMap::new(),
            total_reads: 0,
            fail_after_reads: None,
            selection_log: Vec::new(),
        }
    }

    /// Attach a sample script to one channel.
    pub fn with_channel(mut self, channel: u8, samples: Vec<u16>) -> Self {
        self.scripts.insert(channel, samples);
        self
    }

    pub fn reads_per_channel(&self, channel: u8) -> usize {
        self.read_counts.get(&channel).copied().unwrap_or(0)
    }
}

impl Adc for ScriptedAdc {
    fn select_channel(&mut self, channel: u8) -> Result<(), BoxError> {
        self.selected = channel;
        self.selection_log.push(channel);
        Ok(())
    }

    fn read(&mut self) -> Result<u16, BoxError> {
        if let Some(limit) = self.fail_after_reads
            && self.total_reads >= limit
        {
            return Err(Box::new(std::io::Error::other("scripted adc fault")));
        }
        self.total_reads += 1;
        *self.read_counts.entry(self.selected).or_default() += 1;
        let sample = match self.scripts.get(&self.selected) {
            Some(script) if !script.is_empty() => {
                let cursor = self.cursors.entry(self.selected).or_default();
                let s = script[*cursor % script.len()];
                *cursor += 1;
                s
            }
            _ => self.default_level,
        };
        Ok(sample)
    }
}

/// A radio session that records traffic and joins after a scripted number of
/// pump rounds.
#[derive(Default)]
pub struct RecordingRadio {
    joined: bool,
    join_after_pumps: u32,
    pumps: u32,
    /// Sent payloads with their priority class, in order.
    pub sent: Vec<(Vec<u8>, u8)>,
    /// Reject every send attempt when set.
    pub fail_sends: bool,
    /// Pending downlink frames `(bytes, port)`.
    pub downlinks: VecDeque<(Vec<u8>, u8)>,
    /// Non-blocking `process` invocations.
    pub process_calls: u32,
}

impl RecordingRadio {
    /// A session that reports joined immediately.
    pub fn joined() -> Self {
        Self {
            joined: true,
            ..Self::default()
        }
    }

    /// A session that joins after `pumps` event-pump rounds.
    pub fn joining_after(pumps: u32) -> Self {
        Self {
            join_after_pumps: pumps,
            ..Self::default()
        }
    }

    pub fn queue_downlink(&mut self, bytes: &[u8], port: u8) {
        self.downlinks.push_back((bytes.to_vec(), port));
    }
}

impl Radio for RecordingRadio {
    fn join(&mut self) -> Result<(), BoxError> {
        if self.join_after_pumps == 0 {
            self.joined = true;
        }
        Ok(())
    }

    fn is_joined(&self) -> bool {
        self.joined
    }

    fn process(&mut self) -> Result<(), BoxError> {
        self.process_calls += 1;
        Ok(())
    }

    fn process_with_timeout(&mut self, _timeout: Duration) -> Result<PumpEvent, BoxError> {
        self.pumps += 1;
        if !self.joined && self.pumps >= self.join_after_pumps {
            self.joined = true;
        }
        if self.downlinks.is_empty() {
            Ok(PumpEvent::Idle)
        } else {
            Ok(PumpEvent::Activity)
        }
    }

    fn send_unconfirmed(&mut self, payload: &[u8], priority: u8) -> Result<(), BoxError> {
        if self.fail_sends {
            return Err(Box::new(std::io::Error::other("duty cycle exceeded")));
        }
        if !self.joined {
            return Err(Box::new(std::io::Error::other("not joined")));
        }
        self.sent.push((payload.to_vec(), priority));
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<(usize, u8)>, BoxError> {
        match self.downlinks.pop_front() {
            Some((bytes, port)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(Some((n, port)))
            }
            None => Ok(None),
        }
    }
}

/// A canvas that records drawn frames.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pending: Vec<String>,
    /// Lines of the most recently flushed frame.
    pub lines: Vec<String>,
    /// Every flushed frame, in order.
    pub frames: Vec<Vec<String>>,
    pub clears: u32,
    pub flushes: u32,
}

impl Canvas for RecordingCanvas {
    fn clear(&mut self) {
        self.clears += 1;
        self.pending.clear();
    }

    fn draw_text(&mut self, text: &str, _x: u8, _y: u8) {
        self.pending.push(text.to_string());
    }

    fn flush(&mut self) -> Result<(), BoxError> {
        self.flushes += 1;
        self.lines = self.pending.clone();
        self.frames.push(self.pending.clone());
        Ok(())
    }
}

//! Mock block device for testing
//!
//! Keeps its contents in memory behind a shared handle so tests can inspect the
//! device after the wipe. Faults are keyed by the 1-based number of the read or
//! write call they apply to, counted over the device's whole lifetime.
use blockwipe::io::BlockDevice;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Fault {
    /// Write call `call` moves `shortfall` fewer bytes than asked
    ShortWrite { call: usize, shortfall: usize },
    /// Read call `call` returns `shortfall` fewer bytes than asked
    ShortRead { call: usize, shortfall: usize },
    WriteError { call: usize },
    ReadError { call: usize },
    FlushError,
    /// Every read covering `offset` returns that byte inverted
    FlipOnRead { offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Rewind,
    SeekForward(u64),
    Write {
        offset: usize,
        len: usize,
        moved: usize,
        /// The single byte value of the buffer, if it held only one
        uniform: Option<u8>,
    },
    Read {
        offset: usize,
        len: usize,
        moved: usize,
    },
    Flush,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub data: Vec<u8>,
    pub pos: usize,
    pub faults: Vec<Fault>,
    pub writes: usize,
    pub reads: usize,
    pub events: Vec<Event>,
}

/// Summary of one traversal between two rewinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTrace {
    pub bytes_written: usize,
    pub bytes_read: usize,
    /// Byte value if every written block held only that value
    pub uniform: Option<u8>,
}

impl PassTrace {
    pub fn is_write(&self) -> bool {
        self.bytes_written > 0
    }
}

#[derive(Clone)]
pub struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    pub fn data(&self) -> Vec<u8> {
        self.state().data.clone()
    }

    pub fn forward_seeks(&self) -> Vec<u64> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::SeekForward(n) => Some(*n),
                _ => None,
            })
            .collect()
    }

    /// Split the event stream at every rewind
    pub fn passes(&self) -> Vec<PassTrace> {
        let state = self.state();
        let mut passes = Vec::new();
        let mut current: Option<PassTrace> = None;
        let mut first_write = true;

        for event in &state.events {
            match event {
                Event::Rewind => {
                    passes.extend(current.take());
                    current = Some(PassTrace {
                        bytes_written: 0,
                        bytes_read: 0,
                        uniform: None,
                    });
                    first_write = true;
                }
                Event::Write { moved, uniform, .. } => {
                    if let Some(pass) = current.as_mut() {
                        pass.bytes_written += moved;
                        pass.uniform = if first_write {
                            *uniform
                        } else if pass.uniform == *uniform {
                            pass.uniform
                        } else {
                            None
                        };
                        first_write = false;
                    }
                }
                Event::Read { moved, .. } => {
                    if let Some(pass) = current.as_mut() {
                        pass.bytes_read += moved;
                    }
                }
                _ => {}
            }
        }
        passes.extend(current);
        passes
    }

    /// Only the passes that wrote
    pub fn write_passes(&self) -> Vec<PassTrace> {
        self.passes().into_iter().filter(|p| p.is_write()).collect()
    }

    pub fn flush_count(&self) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| matches!(e, Event::Flush))
            .count()
    }
}

pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
    name: String,
}

impl MockDevice {
    pub fn new(size: usize, fill: u8) -> (Self, MockHandle) {
        Self::with_faults(size, fill, Vec::new())
    }

    pub fn with_faults(size: usize, fill: u8, faults: Vec<Fault>) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState {
            data: vec![fill; size],
            faults,
            ..Default::default()
        }));
        let device = Self {
            state: Arc::clone(&state),
            name: "mock0".to_string(),
        };
        (device, MockHandle(state))
    }

    #[allow(dead_code)]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl BlockDevice for MockDevice {
    fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
        let mut s = self.state.lock().unwrap();
        s.pos = offset as usize;
        if offset == 0 {
            s.events.push(Event::Rewind);
        }
        Ok(offset)
    }

    fn seek_forward(&mut self, delta: u64) -> io::Result<u64> {
        let mut s = self.state.lock().unwrap();
        s.pos += delta as usize;
        s.events.push(Event::SeekForward(delta));
        Ok(s.pos as u64)
    }

    fn write_block(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut s = self.state.lock().unwrap();
        s.writes += 1;
        let call = s.writes;

        let mut want = buf.len();
        for fault in &s.faults {
            match *fault {
                Fault::WriteError { call: c } if c == call => {
                    return Err(io::Error::other("injected write error"));
                }
                Fault::ShortWrite { call: c, shortfall } if c == call => {
                    want = want.saturating_sub(shortfall);
                }
                _ => {}
            }
        }

        let offset = s.pos.min(s.data.len());
        let end = (offset + want).min(s.data.len());
        let moved = end.saturating_sub(offset);
        s.data[offset..offset + moved].copy_from_slice(&buf[..moved]);
        s.pos += moved;

        let uniform = match buf.first() {
            Some(&b) if buf.iter().all(|&x| x == b) => Some(b),
            _ => None,
        };
        s.events.push(Event::Write {
            offset,
            len: buf.len(),
            moved,
            uniform,
        });
        Ok(moved)
    }

    fn read_block(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut s = self.state.lock().unwrap();
        s.reads += 1;
        let call = s.reads;

        let mut want = buf.len();
        for fault in &s.faults {
            match *fault {
                Fault::ReadError { call: c } if c == call => {
                    return Err(io::Error::other("injected read error"));
                }
                Fault::ShortRead { call: c, shortfall } if c == call => {
                    want = want.saturating_sub(shortfall);
                }
                _ => {}
            }
        }

        let offset = s.pos.min(s.data.len());
        let end = (offset + want).min(s.data.len());
        let moved = end.saturating_sub(offset);
        buf[..moved].copy_from_slice(&s.data[offset..offset + moved]);

        for fault in &s.faults {
            if let Fault::FlipOnRead { offset: flip } = *fault {
                if flip >= offset && flip < offset + moved {
                    buf[flip - offset] ^= 0xFF;
                }
            }
        }

        s.pos += moved;
        s.events.push(Event::Read {
            offset,
            len: buf.len(),
            moved,
        });
        Ok(moved)
    }

    fn flush_to_storage(&mut self) -> io::Result<()> {
        let mut s = self.state.lock().unwrap();
        if s.faults.contains(&Fault::FlushError) {
            return Err(io::Error::other("injected flush error"));
        }
        s.events.push(Event::Flush);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

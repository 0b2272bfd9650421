//! Bounded output capture.

use std::collections::VecDeque;
use std::io;

/// Fixed-capacity byte buffer that keeps the most recent bytes written.
///
/// Once full, each write evicts the oldest bytes, so memory stays bounded no
/// matter how much a child process prints.
#[derive(Debug)]
pub struct RingBuffer {
    data: VecDeque<u8>,
    capacity: usize,
    total_written: u64,
}

impl RingBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    /// Append bytes, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, bytes: &[u8]) {
        self.total_written += bytes.len() as u64;

        if self.capacity == 0 {
            return;
        }

        // Only the tail of an oversized write can survive
        let bytes = if bytes.len() > self.capacity {
            &bytes[bytes.len() - self.capacity..]
        } else {
            bytes
        };

        let overflow = (self.data.len() + bytes.len()).saturating_sub(self.capacity);
        self.data.drain(..overflow);
        self.data.extend(bytes);
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Maximum number of bytes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total bytes ever written, including evicted ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Whether any bytes have been evicted.
    pub fn is_truncated(&self) -> bool {
        self.total_written > self.data.len() as u64
    }

    /// Copy out the held bytes, oldest first.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }

    /// Held bytes as text, never longer than the capacity in bytes.
    ///
    /// A character cut in half by eviction is dropped. Other invalid UTF-8 is
    /// replaced, and the front is trimmed again if replacement grew the text.
    pub fn to_string_lossy(&self) -> String {
        let bytes = self.to_vec();
        let start = if self.is_truncated() {
            bytes
                .iter()
                .take(3)
                .take_while(|&&b| is_continuation(b))
                .count()
        } else {
            0
        };

        let text = String::from_utf8_lossy(&bytes[start..]).into_owned();
        if text.len() <= self.capacity {
            return text;
        }

        let mut cut = text.len() - self.capacity;
        while !text.is_char_boundary(cut) {
            cut += 1;
        }
        text[cut..].to_string()
    }
}

/// Whether `byte` continues a multi-byte UTF-8 sequence.
fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

impl io::Write for RingBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

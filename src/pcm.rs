//! Raw PCM source and sink
//!
//! The audio boundary of the pipeline: interleaved signed 16-bit
//! little-endian samples, moved one window at a time. The reader frames a
//! byte stream into fixed-size windows; the writer flattens decoded blocks
//! back out. No resampling, no format probing.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Reads fixed-size PCM windows from a byte stream.
pub struct PcmReader<R> {
    inner: R,
    /// Interleaved samples per window (all channels)
    window_len: usize,
    /// Reused byte scratch, one window's worth
    byte_buf: Vec<u8>,
}

impl PcmReader<BufReader<File>> {
    /// Open a raw S16LE file.
    pub fn open(path: &Path, window_len: usize) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), window_len))
    }
}

impl<R: Read> PcmReader<R> {
    pub fn new(inner: R, window_len: usize) -> Self {
        Self {
            inner,
            window_len,
            byte_buf: vec![0u8; window_len * 2],
        }
    }

    /// Read the next full window.
    ///
    /// Returns `Ok(None)` at end of stream. A trailing partial window is
    /// discarded; the codec cannot take less than a full window.
    pub fn read_window(&mut self) -> std::io::Result<Option<Vec<i16>>> {
        let mut filled = 0;
        while filled < self.byte_buf.len() {
            match self.inner.read(&mut self.byte_buf[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        tracing::debug!(
                            "Discarding {} trailing bytes (not enough for a full window)",
                            filled
                        );
                    }
                    return Ok(None);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let samples = self
            .byte_buf
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Some(samples))
    }

    /// Interleaved samples per window.
    pub fn window_len(&self) -> usize {
        self.window_len
    }
}

/// Writes PCM blocks to a byte stream.
pub struct PcmWriter<W> {
    inner: W,
    /// Reused byte scratch
    byte_buf: Vec<u8>,
    /// Total samples written
    samples_written: u64,
}

impl PcmWriter<BufWriter<File>> {
    /// Create (or truncate) a raw S16LE file.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> PcmWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            byte_buf: Vec::new(),
            samples_written: 0,
        }
    }

    /// Append one block of interleaved samples.
    pub fn write_block(&mut self, samples: &[i16]) -> std::io::Result<()> {
        self.byte_buf.clear();
        self.byte_buf.reserve(samples.len() * 2);
        for sample in samples {
            self.byte_buf.extend_from_slice(&sample.to_le_bytes());
        }
        self.inner.write_all(&self.byte_buf)?;
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }

    /// Total interleaved samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_whole_windows() {
        let samples: Vec<i16> = (0..8).collect();
        let mut bytes = Vec::new();
        for s in &samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }

        let mut reader = PcmReader::new(Cursor::new(bytes), 4);
        assert_eq!(reader.read_window().unwrap().unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(reader.read_window().unwrap().unwrap(), vec![4, 5, 6, 7]);
        assert!(reader.read_window().unwrap().is_none());
    }

    #[test]
    fn test_discards_partial_tail() {
        // 4-sample windows, 6 samples of input: second window is incomplete
        let mut bytes = Vec::new();
        for s in 0i16..6 {
            bytes.extend_from_slice(&s.to_le_bytes());
        }

        let mut reader = PcmReader::new(Cursor::new(bytes), 4);
        assert_eq!(reader.read_window().unwrap().unwrap(), vec![0, 1, 2, 3]);
        assert!(reader.read_window().unwrap().is_none());
    }

    #[test]
    fn test_writer_roundtrip() {
        let mut writer = PcmWriter::new(Cursor::new(Vec::new()));
        writer.write_block(&[-1, 0, 1, 32767]).unwrap();
        writer.write_block(&[-32768]).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.samples_written(), 5);

        let bytes = writer.inner.into_inner();
        let mut reader = PcmReader::new(Cursor::new(bytes), 5);
        assert_eq!(
            reader.read_window().unwrap().unwrap(),
            vec![-1, 0, 1, 32767, -32768]
        );
    }
}

//! Output stream adapters: byte counting and character-set transcoding

use std::io::{self, Write};

use encoding_rs::{CoderResult, Encoder, Encoding};

/// Counts bytes passed to the wrapped writer
pub struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        CountingWriter { inner, bytes: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.bytes += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Re-encodes a UTF-8 byte stream into another character set
///
/// Writes may split a multi-byte sequence; the incomplete tail is held back
/// until the rest arrives.
pub struct TranscodingWriter<W: Write> {
    inner: W,
    encoder: Encoder,
    pending: Vec<u8>,
    out: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    pub fn new(inner: W, encoding: &'static Encoding) -> Self {
        TranscodingWriter {
            inner,
            encoder: encoding.new_encoder(),
            pending: Vec::new(),
            out: Vec::with_capacity(8192),
        }
    }

    fn encode_pending(&mut self) -> io::Result<()> {
        let valid = match std::str::from_utf8(&self.pending) {
            Ok(s) => s.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        };
        if valid == 0 {
            return Ok(());
        }

        let text = std::str::from_utf8(&self.pending[..valid])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut src = text;
        loop {
            self.out.clear();
            let needed = self
                .encoder
                .max_buffer_length_from_utf8_if_no_unmappables(src.len())
                .unwrap_or(src.len() * 4)
                + 16;
            self.out.reserve(needed);
            let (result, read, _) = self.encoder.encode_from_utf8_to_vec(src, &mut self.out, false);
            self.inner.write_all(&self.out)?;
            src = &src[read..];
            if result == CoderResult::InputEmpty {
                break;
            }
        }
        self.pending.drain(..valid);
        Ok(())
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.encode_pending()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encode_pending()?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::WINDOWS_1250;

    #[test]
    fn test_counting_writer() {
        let mut counter = CountingWriter::new(Vec::new());
        counter.write_all(b"abc").unwrap();
        counter.write_all("ż".as_bytes()).unwrap();
        assert_eq!(counter.bytes_written(), 5);
        assert_eq!(counter.into_inner().len(), 5);
    }

    #[test]
    fn test_transcoding_split_sequence() {
        let mut output = Vec::new();
        {
            let mut writer = TranscodingWriter::new(&mut output, WINDOWS_1250);
            let bytes = "aż".as_bytes();
            writer.write_all(&bytes[..2]).unwrap();
            writer.write_all(&bytes[2..]).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, vec![b'a', 0xBF]);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut writer = TranscodingWriter::new(Vec::new(), WINDOWS_1250);
        assert!(writer.write(&[0xff, b'a']).is_err());
    }
}

//! Buffered XML writer with minimal allocations

use crate::error::Result;
use std::io::Write;

/// Size at which the internal buffer is handed to the underlying writer
const DRAIN_THRESHOLD: usize = 4096;

/// XML writer that batches small writes into one buffer
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(8192), // 8KB buffer
        }
    }

    /// Write raw bytes directly
    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > DRAIN_THRESHOLD {
            self.drain()?;
        }
        Ok(())
    }

    /// Write string data
    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_raw(s.as_bytes())
    }

    /// Write XML element start tag
    #[inline]
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        self.write_raw(b"<")?;
        self.write_str(name)
    }

    /// Write XML element end tag
    #[inline]
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.write_raw(b"</")?;
        self.write_str(name)?;
        self.write_raw(b">")
    }

    /// Write attribute
    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_escaped(value)?;
        self.write_raw(b"\"")
    }

    /// Close start tag
    #[inline]
    pub fn close_start_tag(&mut self) -> Result<()> {
        self.write_raw(b">")
    }

    /// Close an empty element started with `start_element`
    #[inline]
    pub fn close_empty_tag(&mut self) -> Result<()> {
        self.write_raw(b"/>")
    }

    /// Write text content with XML escaping
    ///
    /// Line breaks become character references so they survive attribute and
    /// text normalisation. Characters outside the XML 1.0 `Char` production
    /// (C0 controls other than tab and line breaks, U+FFFE, U+FFFF) and DEL
    /// are dropped.
    pub fn write_escaped(&mut self, text: &str) -> Result<()> {
        let mut utf8 = [0u8; 4];
        for c in text.chars() {
            match c {
                '&' => self.buffer.extend_from_slice(b"&amp;"),
                '<' => self.buffer.extend_from_slice(b"&lt;"),
                '>' => self.buffer.extend_from_slice(b"&gt;"),
                '"' => self.buffer.extend_from_slice(b"&quot;"),
                '\'' => self.buffer.extend_from_slice(b"&apos;"),
                '\n' => self.buffer.extend_from_slice(b"&#10;"),
                '\r' => self.buffer.extend_from_slice(b"&#13;"),
                '\t' => self.buffer.push(b'\t'),
                '\u{0}'..='\u{1f}' | '\u{7f}' | '\u{fffe}' | '\u{ffff}' => {}
                c if c.is_ascii() => self.buffer.push(c as u8),
                c => self
                    .buffer
                    .extend_from_slice(c.encode_utf8(&mut utf8).as_bytes()),
            }
        }
        if self.buffer.len() > DRAIN_THRESHOLD {
            self.drain()?;
        }
        Ok(())
    }

    /// Hand buffered bytes to the underlying writer without flushing it
    pub fn drain(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Flush buffer to underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.writer.flush()?;
        Ok(())
    }
}

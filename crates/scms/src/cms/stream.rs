//! Streaming helpers: digest tees and MAC-accumulating readers.

use std::io::{self, Read, Write};

use scms_crypto::{DigestCtx, MacCtx};

/// A writer that forwards bytes to an inner sink while updating a set of
/// digest contexts. Context order is preserved so callers can match the
/// finished digests back to their signers.
pub struct DigestTee<W: Write> {
    inner: W,
    digests: Vec<DigestCtx>,
}

impl<W: Write> DigestTee<W> {
    pub fn new(inner: W, digests: Vec<DigestCtx>) -> Self {
        Self { inner, digests }
    }

    pub fn into_parts(self) -> (W, Vec<DigestCtx>) {
        (self.inner, self.digests)
    }
}

impl<W: Write> Write for DigestTee<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write_all(buf)?;
        for d in &mut self.digests {
            d.update(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Discards everything written to it. Used for detached signatures where
/// the content is digested but not embedded.
#[derive(Debug, Default)]
pub struct NullSink;

impl Write for NullSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reader that MACs exactly the bytes handed to the caller. The tag
/// becomes available only once the inner reader reports end of stream.
pub struct MacReader<R: Read> {
    inner: R,
    mac: Option<MacCtx>,
    value: Option<Vec<u8>>,
}

impl<R: Read> MacReader<R> {
    pub fn new(inner: R, mac: MacCtx) -> Self {
        Self {
            inner,
            mac: Some(mac),
            value: None,
        }
    }

    /// The MAC over all bytes read, or `None` before end of stream.
    pub fn mac(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }
}

impl<R: Read> Read for MacReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // A zero-length read returns 0 without meaning end of stream; it
        // must not finalize the MAC.
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        if n > 0 {
            if let Some(mac) = &mut self.mac {
                mac.update(&buf[..n]);
            }
        } else if let Some(mac) = self.mac.take() {
            self.value = Some(mac.finish());
        }
        Ok(n)
    }
}

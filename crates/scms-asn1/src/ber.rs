//! Streaming writer for BER indefinite-length containers.
//!
//! Each `open_*` call emits a constructed header with the 0x80 length octet
//! and pushes a frame onto a guard stack; `close` emits the 0x00 0x00
//! end-of-contents marker. Frames must close innermost-first: an
//! out-of-order close would corrupt the byte stream irrecoverably, so it is
//! rejected before anything is written.

use scms_types::Asn1Error;
use std::io::Write;

use crate::tags;

/// Token identifying one open frame. Obtained from `open_*`, surrendered to
/// `close`.
#[derive(Debug, Clone, Copy)]
pub struct BerFrame {
    depth: usize,
}

/// Writer emitting indefinite-length BER containers into a raw sink.
pub struct BerWriter<W: Write> {
    sink: W,
    depth: usize,
}

impl<W: Write> BerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, depth: 0 }
    }

    /// Open a constructed frame with the given tag byte.
    pub fn open(&mut self, tag: u8) -> Result<BerFrame, Asn1Error> {
        self.sink.write_all(&[tag | tags::CONSTRUCTED, 0x80])?;
        let frame = BerFrame { depth: self.depth };
        self.depth += 1;
        Ok(frame)
    }

    /// Open an indefinite-length SEQUENCE.
    pub fn open_sequence(&mut self) -> Result<BerFrame, Asn1Error> {
        self.open(tags::SEQUENCE)
    }

    /// Open an indefinite-length explicit context tag `[n]`.
    pub fn open_explicit(&mut self, tag_num: u8) -> Result<BerFrame, Asn1Error> {
        self.open(tags::CONTEXT_SPECIFIC | (tag_num & 0x1F))
    }

    /// Open an indefinite-length constructed OCTET STRING whose content is
    /// written as primitive segments via [`write_octet_segment`].
    ///
    /// [`write_octet_segment`]: BerWriter::write_octet_segment
    pub fn open_octet_string(&mut self) -> Result<BerFrame, Asn1Error> {
        self.open(tags::OCTET_STRING)
    }

    /// Write pre-encoded DER into the innermost open frame.
    pub fn write_raw(&mut self, data: &[u8]) -> Result<(), Asn1Error> {
        self.sink.write_all(data)?;
        Ok(())
    }

    /// Write one definite-length primitive OCTET STRING segment.
    pub fn write_octet_segment(&mut self, data: &[u8]) -> Result<(), Asn1Error> {
        let mut header = [0u8; 6];
        let n = encode_header(tags::OCTET_STRING, data.len(), &mut header);
        self.sink.write_all(&header[..n])?;
        self.sink.write_all(data)?;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<(), Asn1Error> {
        self.sink.flush()?;
        Ok(())
    }

    /// Close a frame by writing its end-of-contents marker.
    ///
    /// Only the innermost open frame may close; anything else is an
    /// ordering violation.
    pub fn close(&mut self, frame: BerFrame) -> Result<(), Asn1Error> {
        if self.depth == 0 || frame.depth != self.depth - 1 {
            return Err(Asn1Error::OutOfOrderClose);
        }
        self.sink.write_all(&[0x00, 0x00])?;
        self.depth -= 1;
        Ok(())
    }

    /// Finish writing and hand back the sink. All frames must be closed.
    pub fn finish(mut self) -> Result<W, Asn1Error> {
        if self.depth != 0 {
            return Err(Asn1Error::UnclosedFrames);
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    /// Hand back the sink without closing open frames. The output is left
    /// truncated mid-structure and will not parse.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Encode tag + definite length into `buf`, returning the header size.
fn encode_header(tag: u8, len: usize, buf: &mut [u8; 6]) -> usize {
    buf[0] = tag;
    if len < 0x80 {
        buf[1] = len as u8;
        2
    } else if len <= 0xFF {
        buf[1] = 0x81;
        buf[2] = len as u8;
        3
    } else if len <= 0xFFFF {
        buf[1] = 0x82;
        buf[2] = (len >> 8) as u8;
        buf[3] = len as u8;
        4
    } else if len <= 0xFF_FFFF {
        buf[1] = 0x83;
        buf[2] = (len >> 16) as u8;
        buf[3] = (len >> 8) as u8;
        buf[4] = len as u8;
        5
    } else {
        buf[1] = 0x84;
        buf[2] = (len >> 24) as u8;
        buf[3] = (len >> 16) as u8;
        buf[4] = (len >> 8) as u8;
        buf[5] = len as u8;
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Decoder;

    #[test]
    fn sequence_with_raw_content() {
        let mut w = BerWriter::new(Vec::new());
        let seq = w.open_sequence().unwrap();
        w.write_raw(&[0x02, 0x01, 0x07]).unwrap();
        w.close(seq).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(out, vec![0x30, 0x80, 0x02, 0x01, 0x07, 0x00, 0x00]);
    }

    #[test]
    fn octet_segments_decode_back() {
        let mut w = BerWriter::new(Vec::new());
        let seq = w.open_sequence().unwrap();
        let oct = w.open_octet_string().unwrap();
        w.write_octet_segment(b"Hello ").unwrap();
        w.write_octet_segment(b"World!").unwrap();
        w.close(oct).unwrap();
        w.close(seq).unwrap();
        let out = w.finish().unwrap();

        let mut dec = Decoder::new(&out);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_octet_string_ber().unwrap(), b"Hello World!");
    }

    #[test]
    fn out_of_order_close_rejected() {
        let mut w = BerWriter::new(Vec::new());
        let outer = w.open_sequence().unwrap();
        let _inner = w.open_sequence().unwrap();
        assert!(matches!(w.close(outer), Err(Asn1Error::OutOfOrderClose)));
    }

    #[test]
    fn double_close_rejected() {
        let mut w = BerWriter::new(Vec::new());
        let seq = w.open_sequence().unwrap();
        w.close(seq).unwrap();
        assert!(matches!(w.close(seq), Err(Asn1Error::OutOfOrderClose)));
    }

    #[test]
    fn finish_with_open_frame_rejected() {
        let mut w = BerWriter::new(Vec::new());
        let _seq = w.open_sequence().unwrap();
        assert!(matches!(w.finish(), Err(Asn1Error::UnclosedFrames)));
    }

    #[test]
    fn explicit_tag_header() {
        let mut w = BerWriter::new(Vec::new());
        let t = w.open_explicit(0).unwrap();
        w.close(t).unwrap();
        assert_eq!(w.finish().unwrap(), vec![0xA0, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn large_segment_uses_long_length() {
        let mut w = BerWriter::new(Vec::new());
        let oct = w.open_octet_string().unwrap();
        w.write_octet_segment(&vec![0xAB; 300]).unwrap();
        w.close(oct).unwrap();
        let out = w.finish().unwrap();
        assert_eq!(&out[..2], &[0x24, 0x80]);
        assert_eq!(&out[2..6], &[0x04, 0x82, 0x01, 0x2C]);
    }
}

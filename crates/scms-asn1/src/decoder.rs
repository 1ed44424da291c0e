//! ASN.1 BER/DER decoder.
//!
//! Accepts both definite-length DER and the indefinite-length BER forms the
//! streaming generator emits (constructed elements terminated by an
//! end-of-contents marker).

use crate::oid::Oid;
use crate::{Tag, TagClass, Tlv};
use scms_types::Asn1Error;

/// A streaming ASN.1 decoder.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder over the given data.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Parse the next TLV element.
    ///
    /// For an indefinite-length element the returned value spans the content
    /// up to (excluding) the matching end-of-contents marker.
    pub fn read_tlv(&mut self) -> Result<Tlv<'a>, Asn1Error> {
        let (tag, tag_len) = Tag::from_bytes(&self.data[self.pos..])?;
        self.pos += tag_len;

        match self.read_length()? {
            Some(length) => {
                let end = self.pos.checked_add(length).ok_or(Asn1Error::LengthOverflow)?;
                if end > self.data.len() {
                    return Err(Asn1Error::Malformed);
                }
                let value = &self.data[self.pos..end];
                self.pos = end;
                Ok(Tlv { tag, value })
            }
            None => {
                if !tag.constructed {
                    return Err(Asn1Error::PrimitiveIndefinite);
                }
                let start = self.pos;
                loop {
                    if self.pos >= self.data.len() {
                        return Err(Asn1Error::Malformed);
                    }
                    if self.data[self.pos] == 0x00 {
                        // End-of-contents marker: 0x00 0x00
                        if self.pos + 1 >= self.data.len() || self.data[self.pos + 1] != 0x00 {
                            return Err(Asn1Error::Malformed);
                        }
                        let value = &self.data[start..self.pos];
                        self.pos += 2;
                        return Ok(Tlv { tag, value });
                    }
                    // Skip one child element (itself possibly indefinite)
                    self.read_tlv()?;
                }
            }
        }
    }

    /// Parse a length. `None` means indefinite.
    fn read_length(&mut self) -> Result<Option<usize>, Asn1Error> {
        if self.pos >= self.data.len() {
            return Err(Asn1Error::Malformed);
        }

        let first = self.data[self.pos];
        self.pos += 1;

        if first < 0x80 {
            Ok(Some(first as usize))
        } else if first == 0x80 {
            Ok(None)
        } else {
            let num_bytes = (first & 0x7F) as usize;
            if num_bytes > 4 {
                return Err(Asn1Error::LengthOverflow);
            }
            if self.pos + num_bytes > self.data.len() {
                return Err(Asn1Error::Malformed);
            }
            let mut length: usize = 0;
            for i in 0..num_bytes {
                length = (length << 8) | self.data[self.pos + i] as usize;
            }
            self.pos += num_bytes;
            Ok(Some(length))
        }
    }

    /// Read the next element and return its complete encoding, header
    /// included (and, for indefinite lengths, the end-of-contents marker).
    pub fn read_raw_tlv(&mut self) -> Result<&'a [u8], Asn1Error> {
        let start = self.pos;
        self.read_tlv()?;
        Ok(&self.data[start..self.pos])
    }

    /// Read an INTEGER and return its bytes (big-endian, may include leading zero).
    pub fn read_integer(&mut self) -> Result<&'a [u8], Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x02) {
            return Err(Asn1Error::UnexpectedTag);
        }
        Ok(tlv.value)
    }

    /// Read a small non-negative INTEGER (e.g. a version field) as u32.
    pub fn read_small_integer(&mut self) -> Result<u32, Asn1Error> {
        let bytes = self.read_integer()?;
        let bytes = if bytes.first() == Some(&0x00) {
            &bytes[1..]
        } else {
            bytes
        };
        if bytes.len() > 4 {
            return Err(Asn1Error::Malformed);
        }
        let mut v: u32 = 0;
        for b in bytes {
            v = (v << 8) | *b as u32;
        }
        Ok(v)
    }

    /// Read a primitive OCTET STRING.
    pub fn read_octet_string(&mut self) -> Result<&'a [u8], Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x04) || tlv.tag.constructed {
            return Err(Asn1Error::UnexpectedTag);
        }
        Ok(tlv.value)
    }

    /// Read an OCTET STRING in either primitive form or the constructed
    /// BER form made of concatenated primitive segments.
    pub fn read_octet_string_ber(&mut self) -> Result<Vec<u8>, Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x04) {
            return Err(Asn1Error::UnexpectedTag);
        }
        if !tlv.tag.constructed {
            return Ok(tlv.value.to_vec());
        }
        let mut out = Vec::new();
        gather_octet_segments(tlv.value, &mut out)?;
        Ok(out)
    }

    /// Read an OBJECT IDENTIFIER.
    pub fn read_oid(&mut self) -> Result<Oid, Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x06) {
            return Err(Asn1Error::UnexpectedTag);
        }
        Oid::from_der_value(tlv.value)
    }

    /// Read a NULL.
    pub fn read_null(&mut self) -> Result<(), Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x05) || !tlv.value.is_empty() {
            return Err(Asn1Error::UnexpectedTag);
        }
        Ok(())
    }

    /// Read a SEQUENCE, returning a sub-decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder<'a>, Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x10) || !tlv.tag.constructed {
            return Err(Asn1Error::UnexpectedTag);
        }
        Ok(Decoder::new(tlv.value))
    }

    /// Read a SET, returning a sub-decoder over its contents.
    pub fn read_set(&mut self) -> Result<Decoder<'a>, Asn1Error> {
        let tlv = self.read_tlv()?;
        if !tlv.tag.is_universal(0x11) || !tlv.tag.constructed {
            return Err(Asn1Error::UnexpectedTag);
        }
        Ok(Decoder::new(tlv.value))
    }

    /// Peek at the next tag without consuming it.
    pub fn peek_tag(&self) -> Result<Tag, Asn1Error> {
        if self.pos >= self.data.len() {
            return Err(Asn1Error::Malformed);
        }
        let (tag, _) = Tag::from_bytes(&self.data[self.pos..])?;
        Ok(tag)
    }

    /// Read a context-specific tagged value with the expected tag number.
    pub fn read_context_specific(&mut self, tag_num: u32) -> Result<Tlv<'a>, Asn1Error> {
        let tlv = self.read_tlv()?;
        if tlv.tag.class != TagClass::ContextSpecific || tlv.tag.number != tag_num {
            return Err(Asn1Error::UnexpectedTag);
        }
        Ok(tlv)
    }

    /// Try to read a context-specific tagged value. Returns `None` if
    /// the next tag does not match, without consuming any bytes.
    pub fn try_read_context_specific(&mut self, tag_num: u32) -> Result<Option<Tlv<'a>>, Asn1Error> {
        if self.is_empty() {
            return Ok(None);
        }
        let tag = self.peek_tag()?;
        if tag.class == TagClass::ContextSpecific && tag.number == tag_num {
            Ok(Some(self.read_tlv()?))
        } else {
            Ok(None)
        }
    }
}

fn gather_octet_segments(data: &[u8], out: &mut Vec<u8>) -> Result<(), Asn1Error> {
    let mut dec = Decoder::new(data);
    while !dec.is_empty() {
        let seg = dec.read_tlv()?;
        if !seg.tag.is_universal(0x04) {
            return Err(Asn1Error::UnexpectedTag);
        }
        if seg.tag.constructed {
            gather_octet_segments(seg.value, out)?;
        } else {
            out.extend_from_slice(seg.value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_set_of_integer() {
        // SET { INTEGER 42 }
        let data = [0x31, 0x03, 0x02, 0x01, 0x2A];
        let mut dec = Decoder::new(&data);
        let mut set_dec = dec.read_set().unwrap();
        let val = set_dec.read_integer().unwrap();
        assert_eq!(val, &[0x2A]);
        assert!(set_dec.is_empty());
    }

    #[test]
    fn read_indefinite_sequence() {
        // SEQUENCE (indefinite) { INTEGER 5 } 00 00
        let data = [0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00];
        let mut dec = Decoder::new(&data);
        let mut seq = dec.read_sequence().unwrap();
        assert_eq!(seq.read_integer().unwrap(), &[0x05]);
        assert!(seq.is_empty());
        assert!(dec.is_empty());
    }

    #[test]
    fn read_nested_indefinite() {
        // SEQUENCE (indef) { SEQUENCE (indef) { NULL } }
        let data = [0x30, 0x80, 0x30, 0x80, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut dec = Decoder::new(&data);
        let mut outer = dec.read_sequence().unwrap();
        let mut inner = outer.read_sequence().unwrap();
        inner.read_null().unwrap();
        assert!(inner.is_empty());
        assert!(outer.is_empty());
    }

    #[test]
    fn indefinite_primitive_rejected() {
        let data = [0x04, 0x80, 0x00, 0x00];
        let mut dec = Decoder::new(&data);
        assert!(matches!(
            dec.read_tlv(),
            Err(Asn1Error::PrimitiveIndefinite)
        ));
    }

    #[test]
    fn gather_constructed_octet_string() {
        // OCTET STRING (constructed, indefinite) { "He", "llo" } 00 00
        let data = [
            0x24, 0x80, 0x04, 0x02, b'H', b'e', 0x04, 0x03, b'l', b'l', b'o', 0x00, 0x00,
        ];
        let mut dec = Decoder::new(&data);
        assert_eq!(dec.read_octet_string_ber().unwrap(), b"Hello");
    }

    #[test]
    fn raw_tlv_spans_header() {
        let data = [0x02, 0x01, 0x07, 0x05, 0x00];
        let mut dec = Decoder::new(&data);
        assert_eq!(dec.read_raw_tlv().unwrap(), &[0x02, 0x01, 0x07]);
        dec.read_null().unwrap();
    }

    #[test]
    fn small_integer_with_leading_zero() {
        let data = [0x02, 0x02, 0x00, 0xFF];
        let mut dec = Decoder::new(&data);
        assert_eq!(dec.read_small_integer().unwrap(), 255);
    }
}

//! DER composition helpers shared by the cms modules.

use scms_asn1::oid::Oid;
use scms_asn1::{tags, Encoder};

pub(crate) fn enc_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_tlv(tag, content);
    enc.finish()
}

pub(crate) fn enc_seq(parts: &[&[u8]]) -> Vec<u8> {
    let mut content = Vec::new();
    for p in parts {
        content.extend_from_slice(p);
    }
    enc_tlv(tags::SEQUENCE, &content)
}

/// DER SET OF: elements sorted by their encodings.
pub(crate) fn enc_set_sorted(items: Vec<Vec<u8>>) -> Vec<u8> {
    enc_tlv(tags::SET, &set_content_sorted(items))
}

/// Sorted SET OF content without the SET header, for implicit tagging.
pub(crate) fn set_content_sorted(mut items: Vec<Vec<u8>>) -> Vec<u8> {
    items.sort();
    let mut content = Vec::new();
    for item in items {
        content.extend_from_slice(&item);
    }
    content
}

pub(crate) fn enc_oid(oid: &Oid) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_oid(oid);
    enc.finish()
}

pub(crate) fn enc_int(value: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_integer(value);
    enc.finish()
}

pub(crate) fn enc_octet(value: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_octet_string(value);
    enc.finish()
}

pub(crate) fn enc_null() -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_null();
    enc.finish()
}

pub(crate) fn enc_ctx(tag_num: u8, constructed: bool, content: &[u8]) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.write_context_specific(tag_num, constructed, content);
    enc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_sorts_by_encoding() {
        let der = enc_set_sorted(vec![vec![0x04, 0x01, 0xFF], vec![0x02, 0x01, 0x00]]);
        assert_eq!(der, vec![0x31, 0x06, 0x02, 0x01, 0x00, 0x04, 0x01, 0xFF]);
    }

    #[test]
    fn seq_concatenates_parts() {
        let der = enc_seq(&[&enc_null(), &enc_int(&[1])]);
        assert_eq!(der, vec![0x30, 0x05, 0x05, 0x00, 0x02, 0x01, 0x01]);
    }
}

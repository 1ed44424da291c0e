//! CMS (Cryptographic Message Syntax, RFC 5652) structures and engines.

pub mod algs;
pub mod attr;
pub mod decrypt;
pub mod enveloped;
pub mod signed;
pub mod stream;
pub mod verify;

use crate::cert::Certificate;
use crate::encoding::{enc_ctx, enc_int, enc_seq};
use scms_asn1::Decoder;
use scms_types::CmsError;

/// CHOICE between issuer+serial and a subject key identifier, used both as
/// SignerIdentifier and as the key-transport RecipientIdentifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityId {
    IssuerSerial { issuer: Vec<u8>, serial: Vec<u8> },
    SubjectKeyId(Vec<u8>),
}

impl EntityId {
    pub fn issuer_serial_of(cert: &Certificate) -> Self {
        EntityId::IssuerSerial {
            issuer: cert.issuer_raw().to_vec(),
            serial: cert.serial().to_vec(),
        }
    }

    /// Build the subject-key-identifier form; requires the certificate to
    /// carry the extension.
    pub fn subject_key_id_of(cert: &Certificate) -> Option<Self> {
        cert.subject_key_id()
            .map(|id| EntityId::SubjectKeyId(id.to_vec()))
    }

    pub fn matches(&self, cert: &Certificate) -> bool {
        match self {
            EntityId::IssuerSerial { issuer, serial } => {
                issuer == cert.issuer_raw() && trim_int(serial) == trim_int(cert.serial())
            }
            EntityId::SubjectKeyId(id) => cert.subject_key_id() == Some(id.as_slice()),
        }
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        match self {
            EntityId::IssuerSerial { issuer, serial } => enc_seq(&[issuer, &enc_int(serial)]),
            // [0] IMPLICIT OCTET STRING
            EntityId::SubjectKeyId(id) => enc_ctx(0, false, id),
        }
    }

    pub(crate) fn parse(dec: &mut Decoder<'_>) -> Result<Self, CmsError> {
        let tag = dec.peek_tag()?;
        if tag.is_universal(0x10) {
            let mut seq = dec.read_sequence()?;
            let issuer = seq.read_raw_tlv()?.to_vec();
            let serial = seq.read_integer()?.to_vec();
            Ok(EntityId::IssuerSerial { issuer, serial })
        } else if tag.is_context(0) {
            let tlv = dec.read_tlv()?;
            Ok(EntityId::SubjectKeyId(tlv.value.to_vec()))
        } else {
            Err(CmsError::Encoding("unrecognized identifier choice".into()))
        }
    }
}

fn trim_int(mut bytes: &[u8]) -> &[u8] {
    while bytes.len() > 1 && bytes[0] == 0x00 {
        bytes = &bytes[1..];
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_serial_roundtrip() {
        let id = EntityId::IssuerSerial {
            issuer: vec![0x30, 0x00],
            serial: vec![0x01, 0x02],
        };
        let der = id.encode();
        let mut dec = Decoder::new(&der);
        assert_eq!(EntityId::parse(&mut dec).unwrap(), id);
    }

    #[test]
    fn subject_key_id_roundtrip() {
        let id = EntityId::SubjectKeyId(vec![0xAA; 20]);
        let der = id.encode();
        assert_eq!(der[0], 0x80);
        let mut dec = Decoder::new(&der);
        assert_eq!(EntityId::parse(&mut dec).unwrap(), id);
    }
}

//! AlgorithmIdentifier encoding and OID mapping.

use crate::encoding::{enc_null, enc_octet, enc_seq, enc_oid};
use scms_asn1::oid::{known, Oid};
use scms_asn1::Decoder;
use scms_types::{CmsError, ContentEncAlgId, DigestAlgId, KeyWrapAlgId, MacAlgId};

/// An X.509 AlgorithmIdentifier: OID plus raw parameter encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    pub oid: Oid,
    /// Raw TLV of the parameters, `None` when absent.
    pub params: Option<Vec<u8>>,
}

impl AlgorithmIdentifier {
    /// Digest AlgorithmIdentifier with NULL parameters.
    pub fn digest(alg: DigestAlgId) -> Self {
        Self {
            oid: digest_oid(alg),
            params: Some(enc_null()),
        }
    }

    pub fn rsa_encryption() -> Self {
        Self {
            oid: known::rsa_encryption(),
            params: Some(enc_null()),
        }
    }

    pub fn key_wrap(alg: KeyWrapAlgId) -> Self {
        let oid = match alg {
            KeyWrapAlgId::Aes128Wrap => known::aes128_wrap(),
            KeyWrapAlgId::Aes192Wrap => known::aes192_wrap(),
            KeyWrapAlgId::Aes256Wrap => known::aes256_wrap(),
        };
        Self { oid, params: None }
    }

    /// Content-encryption AlgorithmIdentifier carrying the IV parameter.
    pub fn content_encryption(alg: ContentEncAlgId, iv: &[u8]) -> Self {
        let oid = match alg {
            ContentEncAlgId::Aes128Cbc => known::aes128_cbc(),
            ContentEncAlgId::Aes192Cbc => known::aes192_cbc(),
            ContentEncAlgId::Aes256Cbc => known::aes256_cbc(),
            ContentEncAlgId::DesEde3Cbc => known::des_ede3_cbc(),
        };
        Self {
            oid,
            params: Some(enc_octet(iv)),
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        match &self.params {
            Some(p) => enc_seq(&[&enc_oid(&self.oid), p]),
            None => enc_seq(&[&enc_oid(&self.oid)]),
        }
    }

    pub fn parse(dec: &mut Decoder<'_>) -> Result<Self, CmsError> {
        let mut seq = dec.read_sequence()?;
        let oid = seq.read_oid()?;
        let params = if seq.is_empty() {
            None
        } else {
            Some(seq.read_raw_tlv()?.to_vec())
        };
        Ok(Self { oid, params })
    }

    pub fn digest_alg(&self) -> Result<DigestAlgId, CmsError> {
        digest_alg_from_oid(&self.oid).ok_or_else(|| self.unsupported())
    }

    pub fn content_enc_alg(&self) -> Result<ContentEncAlgId, CmsError> {
        let oid = &self.oid;
        let alg = if *oid == known::aes128_cbc() {
            ContentEncAlgId::Aes128Cbc
        } else if *oid == known::aes192_cbc() {
            ContentEncAlgId::Aes192Cbc
        } else if *oid == known::aes256_cbc() {
            ContentEncAlgId::Aes256Cbc
        } else if *oid == known::des_ede3_cbc() {
            ContentEncAlgId::DesEde3Cbc
        } else {
            return Err(self.unsupported());
        };
        Ok(alg)
    }

    pub fn key_wrap_alg(&self) -> Result<KeyWrapAlgId, CmsError> {
        let oid = &self.oid;
        let alg = if *oid == known::aes128_wrap() {
            KeyWrapAlgId::Aes128Wrap
        } else if *oid == known::aes192_wrap() {
            KeyWrapAlgId::Aes192Wrap
        } else if *oid == known::aes256_wrap() {
            KeyWrapAlgId::Aes256Wrap
        } else {
            return Err(self.unsupported());
        };
        Ok(alg)
    }

    pub fn mac_alg(&self) -> Result<MacAlgId, CmsError> {
        let oid = &self.oid;
        let alg = if *oid == known::hmac_sha1() {
            MacAlgId::HmacSha1
        } else if *oid == known::hmac_sha256() {
            MacAlgId::HmacSha256
        } else if *oid == known::hmac_sha384() {
            MacAlgId::HmacSha384
        } else if *oid == known::hmac_sha512() {
            MacAlgId::HmacSha512
        } else {
            return Err(self.unsupported());
        };
        Ok(alg)
    }

    /// Extract an IV parameter: an OCTET STRING, or `None` when parameters
    /// are absent or NULL.
    pub fn iv_params(&self) -> Result<Option<Vec<u8>>, CmsError> {
        let Some(raw) = &self.params else {
            return Ok(None);
        };
        let mut dec = Decoder::new(raw);
        let tag = dec.peek_tag()?;
        if tag.is_universal(0x05) {
            dec.read_null()?;
            Ok(None)
        } else if tag.is_universal(0x04) {
            Ok(Some(dec.read_octet_string()?.to_vec()))
        } else {
            Err(CmsError::Encoding(
                "unexpected content-encryption parameters".into(),
            ))
        }
    }

    fn unsupported(&self) -> CmsError {
        CmsError::UnsupportedAlgorithm(self.oid.to_dot_string())
    }
}

pub(crate) fn digest_oid(alg: DigestAlgId) -> Oid {
    match alg {
        DigestAlgId::Sha1 => known::sha1(),
        DigestAlgId::Sha256 => known::sha256(),
        DigestAlgId::Sha384 => known::sha384(),
        DigestAlgId::Sha512 => known::sha512(),
    }
}

pub(crate) fn digest_alg_from_oid(oid: &Oid) -> Option<DigestAlgId> {
    if *oid == known::sha1() {
        Some(DigestAlgId::Sha1)
    } else if *oid == known::sha256() {
        Some(DigestAlgId::Sha256)
    } else if *oid == known::sha384() {
        Some(DigestAlgId::Sha384)
    } else if *oid == known::sha512() {
        Some(DigestAlgId::Sha512)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_alg_id_roundtrip() {
        let ai = AlgorithmIdentifier::digest(DigestAlgId::Sha256);
        let der = ai.to_der();
        let mut dec = Decoder::new(&der);
        let parsed = AlgorithmIdentifier::parse(&mut dec).unwrap();
        assert_eq!(parsed.digest_alg().unwrap(), DigestAlgId::Sha256);
        assert_eq!(parsed, ai);
    }

    #[test]
    fn unknown_digest_oid_is_unsupported() {
        let ai = AlgorithmIdentifier {
            oid: Oid::from_arcs(&[1, 2, 3, 4]),
            params: None,
        };
        assert!(matches!(
            ai.digest_alg(),
            Err(CmsError::UnsupportedAlgorithm(s)) if s == "1.2.3.4"
        ));
    }

    #[test]
    fn iv_extraction() {
        let ai = AlgorithmIdentifier::content_encryption(ContentEncAlgId::Aes128Cbc, &[7; 16]);
        assert_eq!(ai.iv_params().unwrap().unwrap(), vec![7; 16]);
        assert_eq!(ai.content_enc_alg().unwrap(), ContentEncAlgId::Aes128Cbc);
    }

    #[test]
    fn absent_and_null_params_mean_no_iv() {
        let absent = AlgorithmIdentifier {
            oid: known::des_ede3_cbc(),
            params: None,
        };
        assert!(absent.iv_params().unwrap().is_none());
        let null = AlgorithmIdentifier {
            oid: known::des_ede3_cbc(),
            params: Some(enc_null()),
        };
        assert!(null.iv_params().unwrap().is_none());
    }
}

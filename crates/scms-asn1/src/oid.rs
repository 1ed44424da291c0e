//! OBJECT IDENTIFIER type and the catalog of OIDs the CMS engine uses.

use scms_types::Asn1Error;

/// An ASN.1 OBJECT IDENTIFIER.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: Vec<u32>,
}

impl Oid {
    /// Build an OID from its arc values.
    pub fn from_arcs(arcs: &[u32]) -> Self {
        Self {
            arcs: arcs.to_vec(),
        }
    }

    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Encode the OID content bytes (without tag and length).
    pub fn to_der_value(&self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.arcs.len() >= 2 {
            out.extend_from_slice(&encode_base128(self.arcs[0] * 40 + self.arcs[1]));
            for arc in &self.arcs[2..] {
                out.extend_from_slice(&encode_base128(*arc));
            }
        }
        out
    }

    /// Decode an OID from its content bytes.
    pub fn from_der_value(value: &[u8]) -> Result<Self, Asn1Error> {
        if value.is_empty() {
            return Err(Asn1Error::Malformed);
        }
        let mut arcs = Vec::new();
        let mut iter = value.iter().peekable();
        let first = decode_base128(&mut iter)?;
        if first < 80 {
            arcs.push(first / 40);
            arcs.push(first % 40);
        } else {
            arcs.push(2);
            arcs.push(first - 80);
        }
        while iter.peek().is_some() {
            arcs.push(decode_base128(&mut iter)?);
        }
        Ok(Self { arcs })
    }

    /// Dotted-decimal rendering, e.g. "1.2.840.113549.1.7.1".
    pub fn to_dot_string(&self) -> String {
        self.arcs
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn encode_base128(mut value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        bytes.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    bytes.reverse();
    bytes
}

fn decode_base128(
    iter: &mut std::iter::Peekable<std::slice::Iter<'_, u8>>,
) -> Result<u32, Asn1Error> {
    let mut value: u32 = 0;
    loop {
        let byte = *iter.next().ok_or(Asn1Error::Malformed)?;
        value = value.checked_shl(7).ok_or(Asn1Error::Malformed)? | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Well-known OIDs.
pub mod known {
    use super::Oid;

    // PKCS#7 / CMS content types
    pub fn pkcs7_data() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 7, 1])
    }
    pub fn pkcs7_signed_data() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 7, 2])
    }
    pub fn pkcs7_enveloped_data() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 7, 3])
    }

    // PKCS#9 attributes
    pub fn attr_content_type() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 9, 3])
    }
    pub fn attr_message_digest() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 9, 4])
    }
    pub fn attr_signing_time() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 9, 5])
    }

    // Digests
    pub fn sha1() -> Oid {
        Oid::from_arcs(&[1, 3, 14, 3, 2, 26])
    }
    pub fn sha256() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 2, 1])
    }
    pub fn sha384() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 2, 2])
    }
    pub fn sha512() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 2, 3])
    }

    // RSA signatures / key transport
    pub fn rsa_encryption() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 1, 1])
    }
    pub fn sha1_with_rsa() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 1, 5])
    }
    pub fn sha256_with_rsa() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 1, 11])
    }
    pub fn sha384_with_rsa() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 1, 12])
    }
    pub fn sha512_with_rsa() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 1, 1, 13])
    }

    // Content encryption
    pub fn aes128_cbc() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 1, 2])
    }
    pub fn aes192_cbc() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 1, 22])
    }
    pub fn aes256_cbc() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 1, 42])
    }
    pub fn des_ede3_cbc() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 3, 7])
    }

    // Key wrap
    pub fn aes128_wrap() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 1, 5])
    }
    pub fn aes192_wrap() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 1, 25])
    }
    pub fn aes256_wrap() -> Oid {
        Oid::from_arcs(&[2, 16, 840, 1, 101, 3, 4, 1, 45])
    }

    // HMAC
    pub fn hmac_sha1() -> Oid {
        Oid::from_arcs(&[1, 3, 6, 1, 5, 5, 8, 1, 2])
    }
    pub fn hmac_sha256() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 2, 9])
    }
    pub fn hmac_sha384() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 2, 10])
    }
    pub fn hmac_sha512() -> Oid {
        Oid::from_arcs(&[1, 2, 840, 113549, 2, 11])
    }

    // X.509
    pub fn subject_key_identifier() -> Oid {
        Oid::from_arcs(&[2, 5, 29, 14])
    }
    pub fn common_name() -> Oid {
        Oid::from_arcs(&[2, 5, 4, 3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_value_roundtrip() {
        let oid = known::sha256();
        let der = oid.to_der_value();
        let back = Oid::from_der_value(&der).unwrap();
        assert_eq!(oid, back);
    }

    #[test]
    fn rsa_encryption_encoding() {
        assert_eq!(
            known::rsa_encryption().to_der_value(),
            vec![0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01]
        );
    }

    #[test]
    fn dot_string() {
        assert_eq!(known::pkcs7_data().to_dot_string(), "1.2.840.113549.1.7.1");
    }

    #[test]
    fn two_under_forty_arcs() {
        let oid = Oid::from_arcs(&[2, 5, 29, 14]);
        let back = Oid::from_der_value(&oid.to_der_value()).unwrap();
        assert_eq!(back.arcs(), &[2, 5, 29, 14]);
    }
}

//! Incremental HMAC.

use hmac::{Hmac, Mac};
use scms_types::{CryptoError, MacAlgId};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

enum Inner {
    HmacSha1(Hmac<Sha1>),
    HmacSha256(Hmac<Sha256>),
    HmacSha384(Hmac<Sha384>),
    HmacSha512(Hmac<Sha512>),
}

/// An incremental MAC accumulator.
pub struct MacCtx {
    alg: MacAlgId,
    inner: Inner,
}

impl MacCtx {
    pub fn new(alg: MacAlgId, key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::InvalidKeyLength {
            expected: 1,
            got: key.len(),
        };
        let inner = match alg {
            MacAlgId::HmacSha1 => Inner::HmacSha1(Hmac::new_from_slice(key).map_err(invalid)?),
            MacAlgId::HmacSha256 => Inner::HmacSha256(Hmac::new_from_slice(key).map_err(invalid)?),
            MacAlgId::HmacSha384 => Inner::HmacSha384(Hmac::new_from_slice(key).map_err(invalid)?),
            MacAlgId::HmacSha512 => Inner::HmacSha512(Hmac::new_from_slice(key).map_err(invalid)?),
        };
        Ok(Self { alg, inner })
    }

    pub fn algorithm(&self) -> MacAlgId {
        self.alg
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            Inner::HmacSha1(m) => m.update(data),
            Inner::HmacSha256(m) => m.update(data),
            Inner::HmacSha384(m) => m.update(data),
            Inner::HmacSha512(m) => m.update(data),
        }
    }

    /// Consume the context and return the MAC value.
    pub fn finish(self) -> Vec<u8> {
        match self.inner {
            Inner::HmacSha1(m) => m.finalize().into_bytes().to_vec(),
            Inner::HmacSha256(m) => m.finalize().into_bytes().to_vec(),
            Inner::HmacSha384(m) => m.finalize().into_bytes().to_vec(),
            Inner::HmacSha512(m) => m.finalize().into_bytes().to_vec(),
        }
    }

    /// Constant-time verification against an expected tag.
    pub fn verify(self, tag: &[u8]) -> Result<(), CryptoError> {
        let r = match self.inner {
            Inner::HmacSha1(m) => m.verify_slice(tag),
            Inner::HmacSha256(m) => m.verify_slice(tag),
            Inner::HmacSha384(m) => m.verify_slice(tag),
            Inner::HmacSha512(m) => m.verify_slice(tag),
        };
        r.map_err(|_| CryptoError::VerifyFail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn hmac_sha256_rfc4231_case1() {
        let key = [0x0B; 20];
        let mut ctx = MacCtx::new(MacAlgId::HmacSha256, &key).unwrap();
        ctx.update(b"Hi There");
        assert_eq!(
            ctx.finish(),
            hex!("b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7")
        );
    }

    #[test]
    fn verify_detects_mismatch() {
        let mut ctx = MacCtx::new(MacAlgId::HmacSha256, b"key").unwrap();
        ctx.update(b"payload");
        let mut tag = ctx.finish();
        tag[0] ^= 1;

        let mut ctx = MacCtx::new(MacAlgId::HmacSha256, b"key").unwrap();
        ctx.update(b"payload");
        assert!(matches!(ctx.verify(&tag), Err(CryptoError::VerifyFail)));
    }

    #[test]
    fn output_lengths() {
        for alg in [
            MacAlgId::HmacSha1,
            MacAlgId::HmacSha256,
            MacAlgId::HmacSha384,
            MacAlgId::HmacSha512,
        ] {
            let mut ctx = MacCtx::new(alg, b"k").unwrap();
            ctx.update(b"m");
            assert_eq!(ctx.finish().len(), alg.output_len());
        }
    }
}

//! Incremental message digests.

use scms_types::DigestAlgId;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

enum Inner {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

/// An incremental digest accumulator.
pub struct DigestCtx {
    alg: DigestAlgId,
    inner: Inner,
}

impl DigestCtx {
    pub fn new(alg: DigestAlgId) -> Self {
        let inner = match alg {
            DigestAlgId::Sha1 => Inner::Sha1(Sha1::new()),
            DigestAlgId::Sha256 => Inner::Sha256(Sha256::new()),
            DigestAlgId::Sha384 => Inner::Sha384(Sha384::new()),
            DigestAlgId::Sha512 => Inner::Sha512(Sha512::new()),
        };
        Self { alg, inner }
    }

    pub fn algorithm(&self) -> DigestAlgId {
        self.alg
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            Inner::Sha1(d) => d.update(data),
            Inner::Sha256(d) => d.update(data),
            Inner::Sha384(d) => d.update(data),
            Inner::Sha512(d) => d.update(data),
        }
    }

    /// Consume the context and return the digest value.
    pub fn finish(self) -> Vec<u8> {
        match self.inner {
            Inner::Sha1(d) => d.finalize().to_vec(),
            Inner::Sha256(d) => d.finalize().to_vec(),
            Inner::Sha384(d) => d.finalize().to_vec(),
            Inner::Sha512(d) => d.finalize().to_vec(),
        }
    }
}

/// One-shot digest.
pub fn compute(alg: DigestAlgId, data: &[u8]) -> Vec<u8> {
    let mut ctx = DigestCtx::new(alg);
    ctx.update(data);
    ctx.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn sha256_abc() {
        assert_eq!(
            compute(DigestAlgId::Sha256, b"abc"),
            hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn sha1_abc() {
        assert_eq!(
            compute(DigestAlgId::Sha1, b"abc"),
            hex!("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }

    #[test]
    fn incremental_matches_oneshot() {
        let mut ctx = DigestCtx::new(DigestAlgId::Sha512);
        ctx.update(b"Hello ");
        ctx.update(b"World!");
        assert_eq!(ctx.finish(), compute(DigestAlgId::Sha512, b"Hello World!"));
    }

    #[test]
    fn output_lengths() {
        for alg in [
            DigestAlgId::Sha1,
            DigestAlgId::Sha256,
            DigestAlgId::Sha384,
            DigestAlgId::Sha512,
        ] {
            assert_eq!(compute(alg, b"x").len(), alg.output_len());
        }
    }
}

//! RSA PKCS#1 v1.5 signatures and key transport.

use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use scms_types::{CryptoError, DigestAlgId};
use zeroize::Zeroizing;

fn pkcs1v15_scheme(alg: DigestAlgId) -> Pkcs1v15Sign {
    match alg {
        DigestAlgId::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        DigestAlgId::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        DigestAlgId::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        DigestAlgId::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
    }
}

/// An RSA private key used for signing and key-transport decryption.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    /// Generate a fresh key. Intended for tests and tooling; CMS processing
    /// itself never generates keys.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let inner =
            RsaPrivateKey::new(&mut rand::thread_rng(), bits).map_err(|_| CryptoError::SignFail)?;
        Ok(Self { inner })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: self.inner.to_public_key(),
        }
    }

    /// Sign a precomputed digest value.
    pub fn sign_digest(&self, alg: DigestAlgId, digest: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .sign(pkcs1v15_scheme(alg), digest)
            .map_err(|_| CryptoError::SignFail)
    }

    /// Recover a content-encryption key from its PKCS#1 v1.5 encryption.
    pub fn unwrap_cek(&self, encrypted: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        self.inner
            .decrypt(Pkcs1v15Encrypt, encrypted)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::UnwrapFail)
    }
}

/// An RSA public key used for verification and key-transport encryption.
#[derive(Clone)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parse from a DER-encoded SubjectPublicKeyInfo.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, CryptoError> {
        RsaPublicKey::from_public_key_der(der)
            .map(|inner| Self { inner })
            .map_err(|_| CryptoError::KeyParseFail)
    }

    /// Encode as a DER SubjectPublicKeyInfo.
    pub fn to_spki_der(&self) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|_| CryptoError::KeyParseFail)
    }

    /// Verify a signature over a precomputed digest value.
    pub fn verify_digest(
        &self,
        alg: DigestAlgId,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        self.inner
            .verify(pkcs1v15_scheme(alg), digest, signature)
            .map_err(|_| CryptoError::VerifyFail)
    }

    /// Encrypt a content-encryption key for transport.
    pub fn wrap_cek(&self, cek: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.inner
            .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, cek)
            .map_err(|_| CryptoError::UnwrapFail)
    }
}

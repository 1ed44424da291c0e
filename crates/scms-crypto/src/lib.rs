#![forbid(unsafe_code)]
//! Cryptographic primitives for the scms workspace, addressed by the
//! algorithm identifiers of `scms-types`: digests, HMAC, CBC content
//! ciphers, RFC 3394 key wrap, and RSA PKCS#1 v1.5 signing and key
//! transport.

pub mod cipher;
pub mod digest;
pub mod mac;
pub mod pk;
pub mod rng;
pub mod wrap;

pub use cipher::{CbcDecryptor, CbcEncryptor};
pub use digest::DigestCtx;
pub use mac::MacCtx;
pub use pk::{PrivateKey, PublicKey};
pub use rng::random_bytes;
pub use wrap::{key_unwrap, key_wrap};

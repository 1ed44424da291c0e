//! CBC-mode content ciphers.
//!
//! Encryption is one-shot with PKCS#7 padding (messages are assembled in
//! memory); decryption is block-incremental so the CMS layer can stream
//! ciphertext through and strip padding itself at end of stream.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{generic_array::GenericArray, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;
use scms_types::{ContentEncAlgId, CryptoError};

fn check_lengths(alg: ContentEncAlgId, key: &[u8], iv: &[u8]) -> Result<(), CryptoError> {
    if key.len() != alg.key_len() {
        return Err(CryptoError::InvalidKeyLength {
            expected: alg.key_len(),
            got: key.len(),
        });
    }
    if iv.len() != alg.block_size() {
        return Err(CryptoError::InvalidIvLength {
            expected: alg.block_size(),
            got: iv.len(),
        });
    }
    Ok(())
}

enum DecInner {
    Aes128(cbc::Decryptor<Aes128>),
    Aes192(cbc::Decryptor<Aes192>),
    Aes256(cbc::Decryptor<Aes256>),
    TdesEde3(cbc::Decryptor<TdesEde3>),
}

/// Block-incremental CBC decryptor. Padding is the caller's concern.
pub struct CbcDecryptor {
    alg: ContentEncAlgId,
    inner: DecInner,
}

impl CbcDecryptor {
    pub fn new(alg: ContentEncAlgId, key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        check_lengths(alg, key, iv)?;
        let bad_key = |_| CryptoError::InvalidKeyLength {
            expected: alg.key_len(),
            got: key.len(),
        };
        let inner = match alg {
            ContentEncAlgId::Aes128Cbc => {
                DecInner::Aes128(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
            ContentEncAlgId::Aes192Cbc => {
                DecInner::Aes192(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
            ContentEncAlgId::Aes256Cbc => {
                DecInner::Aes256(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
            ContentEncAlgId::DesEde3Cbc => {
                DecInner::TdesEde3(cbc::Decryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
        };
        Ok(Self { alg, inner })
    }

    pub fn block_size(&self) -> usize {
        self.alg.block_size()
    }

    /// Decrypt a whole number of blocks in place, carrying the CBC chain
    /// across calls.
    pub fn decrypt_blocks(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let bs = self.alg.block_size();
        if data.len() % bs != 0 {
            return Err(CryptoError::PartialBlock);
        }
        match &mut self.inner {
            DecInner::Aes128(c) => {
                for chunk in data.chunks_exact_mut(16) {
                    c.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
                }
            }
            DecInner::Aes192(c) => {
                for chunk in data.chunks_exact_mut(16) {
                    c.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
                }
            }
            DecInner::Aes256(c) => {
                for chunk in data.chunks_exact_mut(16) {
                    c.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
                }
            }
            DecInner::TdesEde3(c) => {
                for chunk in data.chunks_exact_mut(8) {
                    c.decrypt_block_mut(GenericArray::from_mut_slice(chunk));
                }
            }
        }
        Ok(())
    }
}

enum EncInner {
    Aes128(cbc::Encryptor<Aes128>),
    Aes192(cbc::Encryptor<Aes192>),
    Aes256(cbc::Encryptor<Aes256>),
    TdesEde3(cbc::Encryptor<TdesEde3>),
}

/// One-shot CBC encryptor with PKCS#7 padding.
pub struct CbcEncryptor {
    inner: EncInner,
}

impl CbcEncryptor {
    pub fn new(alg: ContentEncAlgId, key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        check_lengths(alg, key, iv)?;
        let bad_key = |_| CryptoError::InvalidKeyLength {
            expected: alg.key_len(),
            got: key.len(),
        };
        let inner = match alg {
            ContentEncAlgId::Aes128Cbc => {
                EncInner::Aes128(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
            ContentEncAlgId::Aes192Cbc => {
                EncInner::Aes192(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
            ContentEncAlgId::Aes256Cbc => {
                EncInner::Aes256(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
            ContentEncAlgId::DesEde3Cbc => {
                EncInner::TdesEde3(cbc::Encryptor::new_from_slices(key, iv).map_err(bad_key)?)
            }
        };
        Ok(Self { inner })
    }

    pub fn encrypt_padded(self, data: &[u8]) -> Vec<u8> {
        match self.inner {
            EncInner::Aes128(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
            EncInner::Aes192(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
            EncInner::Aes256(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
            EncInner::TdesEde3(c) => c.encrypt_padded_vec_mut::<Pkcs7>(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(alg: ContentEncAlgId, msg: &[u8]) {
        let key = vec![0x42; alg.key_len()];
        let iv = vec![0x24; alg.block_size()];
        let ct = CbcEncryptor::new(alg, &key, &iv).unwrap().encrypt_padded(msg);
        assert_eq!(ct.len() % alg.block_size(), 0);

        let mut dec = CbcDecryptor::new(alg, &key, &iv).unwrap();
        let mut buf = ct.clone();
        dec.decrypt_blocks(&mut buf).unwrap();
        let pad = *buf.last().unwrap() as usize;
        assert_eq!(&buf[..buf.len() - pad], msg);
    }

    #[test]
    fn aes256_roundtrip() {
        roundtrip(ContentEncAlgId::Aes256Cbc, b"the quick brown fox");
    }

    #[test]
    fn tdes_roundtrip() {
        roundtrip(ContentEncAlgId::DesEde3Cbc, b"legacy payload");
    }

    #[test]
    fn incremental_decrypt_matches_full() {
        let alg = ContentEncAlgId::Aes128Cbc;
        let key = [0x01; 16];
        let iv = [0x02; 16];
        let msg = vec![0x5A; 100];
        let ct = CbcEncryptor::new(alg, &key, &iv).unwrap().encrypt_padded(&msg);

        let mut full = ct.clone();
        CbcDecryptor::new(alg, &key, &iv)
            .unwrap()
            .decrypt_blocks(&mut full)
            .unwrap();

        let mut piecewise = ct.clone();
        let mut dec = CbcDecryptor::new(alg, &key, &iv).unwrap();
        let (a, b) = piecewise.split_at_mut(32);
        dec.decrypt_blocks(a).unwrap();
        dec.decrypt_blocks(b).unwrap();
        assert_eq!(piecewise, full);
    }

    #[test]
    fn partial_block_rejected() {
        let mut dec = CbcDecryptor::new(ContentEncAlgId::Aes128Cbc, &[0; 16], &[0; 16]).unwrap();
        let mut buf = vec![0u8; 10];
        assert!(matches!(
            dec.decrypt_blocks(&mut buf),
            Err(CryptoError::PartialBlock)
        ));
    }

    #[test]
    fn wrong_key_length_rejected() {
        assert!(matches!(
            CbcDecryptor::new(ContentEncAlgId::Aes256Cbc, &[0; 16], &[0; 16]),
            Err(CryptoError::InvalidKeyLength { expected: 32, .. })
        ));
    }
}

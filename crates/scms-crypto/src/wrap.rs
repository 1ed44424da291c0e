//! AES Key Wrap (RFC 3394).

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use scms_types::CryptoError;
use subtle::ConstantTimeEq;

const IV: [u8; 8] = [0xA6; 8];

enum Kek {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl Kek {
    fn new(kek: &[u8]) -> Result<Self, CryptoError> {
        let bad = |_| CryptoError::InvalidKeyLength {
            expected: 16,
            got: kek.len(),
        };
        match kek.len() {
            16 => Ok(Kek::Aes128(Aes128::new_from_slice(kek).map_err(bad)?)),
            24 => Ok(Kek::Aes192(Aes192::new_from_slice(kek).map_err(bad)?)),
            32 => Ok(Kek::Aes256(Aes256::new_from_slice(kek).map_err(bad)?)),
            got => Err(CryptoError::InvalidKeyLength { expected: 16, got }),
        }
    }

    fn encrypt(&self, block: &mut [u8; 16]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            Kek::Aes128(c) => c.encrypt_block(ga),
            Kek::Aes192(c) => c.encrypt_block(ga),
            Kek::Aes256(c) => c.encrypt_block(ga),
        }
    }

    fn decrypt(&self, block: &mut [u8; 16]) {
        let ga = GenericArray::from_mut_slice(block);
        match self {
            Kek::Aes128(c) => c.decrypt_block(ga),
            Kek::Aes192(c) => c.decrypt_block(ga),
            Kek::Aes256(c) => c.decrypt_block(ga),
        }
    }
}

/// Wrap `key` under `kek`. The key must be a multiple of 8 bytes, 16 or more.
pub fn key_wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Kek::new(kek)?;
    if key.len() % 8 != 0 || key.len() < 16 {
        return Err(CryptoError::InvalidKeyLength {
            expected: 16,
            got: key.len(),
        });
    }

    let n = key.len() / 8;
    let mut a = IV;
    let mut r = vec![[0u8; 8]; n];
    for (i, chunk) in key.chunks_exact(8).enumerate() {
        r[i].copy_from_slice(chunk);
    }

    for j in 0..6u64 {
        for i in 0..n {
            let mut b = [0u8; 16];
            b[..8].copy_from_slice(&a);
            b[8..].copy_from_slice(&r[i]);
            cipher.encrypt(&mut b);
            let t = (n as u64) * j + (i as u64) + 1;
            a.copy_from_slice(&b[..8]);
            for (k, tb) in t.to_be_bytes().iter().enumerate() {
                a[k] ^= tb;
            }
            r[i].copy_from_slice(&b[8..]);
        }
    }

    let mut out = Vec::with_capacity(8 + key.len());
    out.extend_from_slice(&a);
    for block in &r {
        out.extend_from_slice(block);
    }
    Ok(out)
}

/// Unwrap `wrapped` under `kek`. Integrity failure is `UnwrapFail` with no
/// further detail.
pub fn key_unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Kek::new(kek)?;
    if wrapped.len() % 8 != 0 || wrapped.len() < 24 {
        return Err(CryptoError::UnwrapFail);
    }

    let n = wrapped.len() / 8 - 1;
    let mut a = [0u8; 8];
    a.copy_from_slice(&wrapped[..8]);
    let mut r = vec![[0u8; 8]; n];
    for (i, chunk) in wrapped[8..].chunks_exact(8).enumerate() {
        r[i].copy_from_slice(chunk);
    }

    for j in (0..6u64).rev() {
        for i in (0..n).rev() {
            let t = (n as u64) * j + (i as u64) + 1;
            let mut b = [0u8; 16];
            b[..8].copy_from_slice(&a);
            for (k, tb) in t.to_be_bytes().iter().enumerate() {
                b[k] ^= tb;
            }
            b[8..].copy_from_slice(&r[i]);
            cipher.decrypt(&mut b);
            a.copy_from_slice(&b[..8]);
            r[i].copy_from_slice(&b[8..]);
        }
    }

    if !bool::from(a[..].ct_eq(&IV[..])) {
        return Err(CryptoError::UnwrapFail);
    }

    let mut out = Vec::with_capacity(wrapped.len() - 8);
    for block in &r {
        out.extend_from_slice(block);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // Test vectors from RFC 3394 section 4.

    #[test]
    fn wrap_128_under_128() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F");
        let key = hex!("00112233445566778899AABBCCDDEEFF");
        let wrapped = key_wrap(&kek, &key).unwrap();
        assert_eq!(
            wrapped,
            hex!("1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5")
        );
        assert_eq!(key_unwrap(&kek, &wrapped).unwrap(), key);
    }

    #[test]
    fn wrap_128_under_256() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F");
        let key = hex!("00112233445566778899AABBCCDDEEFF");
        let wrapped = key_wrap(&kek, &key).unwrap();
        assert_eq!(
            wrapped,
            hex!("64E8C3F9CE0F5BA263E9777905818A2A93C8191E7D6E8AE7")
        );
    }

    #[test]
    fn wrap_256_under_256() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F");
        let key = hex!("00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F");
        let wrapped = key_wrap(&kek, &key).unwrap();
        assert_eq!(
            wrapped,
            hex!("28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21")
        );
        assert_eq!(key_unwrap(&kek, &wrapped).unwrap(), key);
    }

    #[test]
    fn unwrap_with_wrong_kek_fails() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F");
        let other = hex!("FF0102030405060708090A0B0C0D0E0F");
        let key = hex!("00112233445566778899AABBCCDDEEFF");
        let wrapped = key_wrap(&kek, &key).unwrap();
        assert!(matches!(
            key_unwrap(&other, &wrapped),
            Err(CryptoError::UnwrapFail)
        ));
    }

    #[test]
    fn corrupted_wrap_fails() {
        let kek = hex!("000102030405060708090A0B0C0D0E0F");
        let key = hex!("00112233445566778899AABBCCDDEEFF");
        let mut wrapped = key_wrap(&kek, &key).unwrap();
        wrapped[3] ^= 0x40;
        assert!(matches!(
            key_unwrap(&kek, &wrapped),
            Err(CryptoError::UnwrapFail)
        ));
    }
}

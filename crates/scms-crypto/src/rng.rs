//! CSPRNG bytes.

use scms_types::CryptoError;

/// Fill a fresh buffer with `len` random bytes from the OS.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut buf = vec![0u8; len];
    getrandom::getrandom(&mut buf).map_err(|_| CryptoError::RandomFail)?;
    Ok(buf)
}

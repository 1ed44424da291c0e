//! Streaming content decryption.
//!
//! Ciphertext is decrypted block by block as it is read. The final cipher
//! block is held back until the source reports end of stream, at which
//! point the PKCS#7 padding is stripped and checked. Every decryption
//! failure surfaces as the same error so padding problems are not
//! distinguishable from any other.

use std::io::{self, Read};

use crate::cms::algs::AlgorithmIdentifier;
use crate::cms::enveloped::ContentKey;
use crate::cms::stream::MacReader;
use scms_crypto::{CbcDecryptor, MacCtx};
use scms_types::CmsError;

fn crypto_io_err() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, CmsError::CryptoOperation)
}

/// Block-buffering CBC decrypt reader.
pub struct CbcDecryptReader<R: Read> {
    inner: R,
    cipher: CbcDecryptor,
    /// Ciphertext not yet forming a whole block.
    rawbuf: Vec<u8>,
    /// Last decrypted block, withheld until more data or end of stream.
    carry: Option<Vec<u8>>,
    out: Vec<u8>,
    out_pos: usize,
    eof: bool,
}

impl<R: Read> CbcDecryptReader<R> {
    fn new(inner: R, cipher: CbcDecryptor) -> Self {
        Self {
            inner,
            cipher,
            rawbuf: Vec::new(),
            carry: None,
            out: Vec::new(),
            out_pos: 0,
            eof: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let bs = self.cipher.block_size();
        let mut chunk = [0u8; 4096];
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
            if !self.rawbuf.is_empty() {
                return Err(crypto_io_err());
            }
            let Some(mut last) = self.carry.take() else {
                return Err(crypto_io_err());
            };
            let pad = last[bs - 1] as usize;
            if pad == 0 || pad > bs || !last[bs - pad..].iter().all(|&b| b as usize == pad) {
                return Err(crypto_io_err());
            }
            last.truncate(bs - pad);
            self.out = last;
            self.out_pos = 0;
            return Ok(());
        }

        self.rawbuf.extend_from_slice(&chunk[..n]);
        let full = (self.rawbuf.len() / bs) * bs;
        if full == 0 {
            return Ok(());
        }
        let mut blocks: Vec<u8> = self.rawbuf.drain(..full).collect();
        self.cipher
            .decrypt_blocks(&mut blocks)
            .map_err(|_| crypto_io_err())?;
        let tail = blocks.split_off(blocks.len() - bs);
        let mut out = self.carry.take().unwrap_or_default();
        out.extend_from_slice(&blocks);
        self.carry = Some(tail);
        self.out = out;
        self.out_pos = 0;
        Ok(())
    }
}

impl<R: Read> Read for CbcDecryptReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.out_pos < self.out.len() {
                let n = buf.len().min(self.out.len() - self.out_pos);
                buf[..n].copy_from_slice(&self.out[self.out_pos..self.out_pos + n]);
                self.out_pos += n;
                return Ok(n);
            }
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
        }
    }
}

/// The plaintext channel of a resolved recipient: decryption, MAC
/// accumulation, or both.
pub enum PlaintextReader<R: Read> {
    Cipher(CbcDecryptReader<R>),
    CipherMac(MacReader<CbcDecryptReader<R>>),
    Mac(MacReader<R>),
}

impl<R: Read> PlaintextReader<R> {
    /// The accumulated MAC over the plaintext, available after end of
    /// stream when a MAC was configured.
    pub fn mac(&self) -> Option<&[u8]> {
        match self {
            PlaintextReader::Cipher(_) => None,
            PlaintextReader::CipherMac(m) => m.mac(),
            PlaintextReader::Mac(m) => m.mac(),
        }
    }
}

impl<R: Read> Read for PlaintextReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PlaintextReader::Cipher(r) => r.read(buf),
            PlaintextReader::CipherMac(r) => r.read(buf),
            PlaintextReader::Mac(r) => r.read(buf),
        }
    }
}

/// Build the plaintext reader for a content stream. The cipher pieces must
/// be given together; a MAC may ride on either configuration.
pub fn open_content_stream<R: Read>(
    key: Option<&ContentKey>,
    content_alg: Option<&AlgorithmIdentifier>,
    mac: Option<MacCtx>,
    source: R,
) -> Result<PlaintextReader<R>, CmsError> {
    match (key, content_alg) {
        (Some(key), Some(alg_id)) => {
            let alg = alg_id.content_enc_alg()?;
            if alg != key.algorithm() {
                return Err(CmsError::CryptoOperation);
            }
            let iv = match alg_id.iv_params()? {
                Some(iv) => iv,
                None if alg.zero_iv_default() => vec![0u8; alg.block_size()],
                None => return Err(CmsError::Encoding("missing IV parameter".into())),
            };
            let cipher = CbcDecryptor::new(alg, key.bytes(), &iv)
                .map_err(|_| CmsError::CryptoOperation)?;
            let reader = CbcDecryptReader::new(source, cipher);
            Ok(match mac {
                Some(m) => PlaintextReader::CipherMac(MacReader::new(reader, m)),
                None => PlaintextReader::Cipher(reader),
            })
        }
        (None, None) => match mac {
            Some(m) => Ok(PlaintextReader::Mac(MacReader::new(source, m))),
            None => Err(CmsError::Config("no cipher or MAC configured".into())),
        },
        _ => Err(CmsError::Config(
            "content key and algorithm must be given together".into(),
        )),
    }
}

/// Drain a plaintext reader, translating decryption failures back out of
/// their io wrapping.
pub fn read_to_end_mapped<R: Read>(reader: &mut R) -> Result<Vec<u8>, CmsError> {
    let mut out = Vec::new();
    match reader.read_to_end(&mut out) {
        Ok(_) => Ok(out),
        Err(e) => match e.get_ref() {
            Some(inner) if inner.is::<CmsError>() => Err(CmsError::CryptoOperation),
            _ => Err(CmsError::Io(e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scms_crypto::CbcEncryptor;
    use scms_types::{ContentEncAlgId, MacAlgId};
    use std::io::Cursor;

    fn content_key(alg: ContentEncAlgId, key: &[u8]) -> ContentKey {
        ContentKey::from_raw(alg, key.to_vec()).unwrap()
    }

    fn encrypt(alg: ContentEncAlgId, key: &[u8], iv: &[u8], msg: &[u8]) -> Vec<u8> {
        CbcEncryptor::new(alg, key, iv).unwrap().encrypt_padded(msg)
    }

    #[test]
    fn streaming_decrypt_small_reads() {
        let alg = ContentEncAlgId::Aes128Cbc;
        let key = [0x11; 16];
        let iv = [0x22; 16];
        let msg = b"streaming plaintext that spans multiple cipher blocks";
        let ct = encrypt(alg, &key, &iv, msg);

        let ai = AlgorithmIdentifier::content_encryption(alg, &iv);
        let ck = content_key(alg, &key);
        let mut reader =
            open_content_stream(Some(&ck), Some(&ai), None, Cursor::new(ct)).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, msg);
    }

    #[test]
    fn corrupted_padding_fails_uniformly() {
        let alg = ContentEncAlgId::Aes128Cbc;
        let key = [0x11; 16];
        let iv = [0x22; 16];
        let mut ct = encrypt(alg, &key, &iv, b"payload");
        let last = ct.len() - 1;
        ct[last] ^= 0xFF;

        let ai = AlgorithmIdentifier::content_encryption(alg, &iv);
        let ck = content_key(alg, &key);
        let mut reader =
            open_content_stream(Some(&ck), Some(&ai), None, Cursor::new(ct)).unwrap();
        let err = read_to_end_mapped(&mut reader).unwrap_err();
        assert!(matches!(err, CmsError::CryptoOperation));
        assert_eq!(err.to_string(), "crypto operation failed");
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let alg = ContentEncAlgId::Aes128Cbc;
        let key = [0x11; 16];
        let iv = [0x22; 16];
        let mut ct = encrypt(alg, &key, &iv, b"payload");
        ct.truncate(ct.len() - 5);

        let ai = AlgorithmIdentifier::content_encryption(alg, &iv);
        let ck = content_key(alg, &key);
        let mut reader =
            open_content_stream(Some(&ck), Some(&ai), None, Cursor::new(ct)).unwrap();
        assert!(matches!(
            read_to_end_mapped(&mut reader),
            Err(CmsError::CryptoOperation)
        ));
    }

    #[test]
    fn empty_ciphertext_fails() {
        let alg = ContentEncAlgId::Aes128Cbc;
        let ai = AlgorithmIdentifier::content_encryption(alg, &[0; 16]);
        let ck = content_key(alg, &[0x11; 16]);
        let mut reader =
            open_content_stream(Some(&ck), Some(&ai), None, Cursor::new(Vec::new())).unwrap();
        assert!(matches!(
            read_to_end_mapped(&mut reader),
            Err(CmsError::CryptoOperation)
        ));
    }

    #[test]
    fn mac_rides_on_decryption() {
        let alg = ContentEncAlgId::Aes256Cbc;
        let key = [0x33; 32];
        let iv = [0x44; 16];
        let msg = b"authenticated plaintext";
        let ct = encrypt(alg, &key, &iv, msg);

        let ai = AlgorithmIdentifier::content_encryption(alg, &iv);
        let ck = content_key(alg, &key);
        let mac = MacCtx::new(MacAlgId::HmacSha256, b"mac key").unwrap();
        let mut reader =
            open_content_stream(Some(&ck), Some(&ai), Some(mac), Cursor::new(ct)).unwrap();
        assert!(reader.mac().is_none());
        let out = read_to_end_mapped(&mut reader).unwrap();
        assert_eq!(out, msg);

        let mut expected = MacCtx::new(MacAlgId::HmacSha256, b"mac key").unwrap();
        expected.update(msg);
        assert_eq!(reader.mac().unwrap(), expected.finish());
    }

    #[test]
    fn missing_cipher_and_mac_rejected() {
        assert!(matches!(
            open_content_stream(None, None, None, Cursor::new(Vec::new())),
            Err(CmsError::Config(_))
        ));
    }
}

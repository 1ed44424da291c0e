//! EnvelopedData: recipient infos, key recovery and content encryption.
//!
//! Generation wraps one content-encryption key per recipient, by RSA key
//! transport or by an AES key-encryption key. Resolution walks the parsed
//! recipient infos against a caller-held secret and yields the content key,
//! from which the content is decrypted in one shot or as a stream.

use std::fmt;
use std::io::Cursor;

use zeroize::Zeroizing;

use crate::cert::Certificate;
use crate::cms::algs::AlgorithmIdentifier;
use crate::cms::decrypt::{self, PlaintextReader};
use crate::cms::EntityId;
use crate::encoding::{enc_ctx, enc_int, enc_octet, enc_oid, enc_seq, enc_set_sorted};
use scms_asn1::oid::{known, Oid};
use scms_asn1::Decoder;
use scms_crypto::{key_wrap, random_bytes, CbcEncryptor, PrivateKey, PublicKey};
use scms_types::{CmsError, ContentEncAlgId, KeyWrapAlgId};

/// The encrypted content and the parameters needed to decrypt it.
#[derive(Debug, Clone)]
pub struct EncryptedContentInfo {
    pub content_type: Oid,
    pub content_enc_alg: AlgorithmIdentifier,
    /// Ciphertext, absent when conveyed out of band.
    pub content: Option<Vec<u8>>,
}

/// RecipientInfo for RSA key transport.
#[derive(Debug, Clone)]
pub struct KeyTransRecipientInfo {
    pub version: u32,
    pub rid: EntityId,
    pub key_enc_alg: AlgorithmIdentifier,
    pub encrypted_key: Vec<u8>,
}

/// RecipientInfo for a previously distributed key-encryption key.
#[derive(Debug, Clone)]
pub struct KekRecipientInfo {
    pub version: u32,
    pub key_id: Vec<u8>,
    pub key_enc_alg: AlgorithmIdentifier,
    pub encrypted_key: Vec<u8>,
}

/// The RecipientInfo CHOICE.
#[derive(Debug, Clone)]
pub enum RecipientInfo {
    KeyTrans(KeyTransRecipientInfo),
    Kek(KekRecipientInfo),
}

impl RecipientInfo {
    fn encode(&self) -> Vec<u8> {
        match self {
            RecipientInfo::KeyTrans(kt) => enc_seq(&[
                &enc_int(&[kt.version as u8]),
                &kt.rid.encode(),
                &kt.key_enc_alg.to_der(),
                &enc_octet(&kt.encrypted_key),
            ]),
            RecipientInfo::Kek(kek) => {
                let mut der = enc_seq(&[
                    &enc_int(&[kek.version as u8]),
                    &enc_seq(&[&enc_octet(&kek.key_id)]),
                    &kek.key_enc_alg.to_der(),
                    &enc_octet(&kek.encrypted_key),
                ]);
                // [2] IMPLICIT replaces the SEQUENCE tag
                der[0] = 0xA2;
                der
            }
        }
    }

    fn parse(dec: &mut Decoder<'_>) -> Result<Self, CmsError> {
        let tag = dec.peek_tag()?;
        if tag.is_universal(0x10) {
            let mut seq = dec.read_sequence()?;
            let version = seq.read_small_integer()?;
            let rid = EntityId::parse(&mut seq)?;
            let key_enc_alg = AlgorithmIdentifier::parse(&mut seq)?;
            let encrypted_key = seq.read_octet_string()?.to_vec();
            Ok(RecipientInfo::KeyTrans(KeyTransRecipientInfo {
                version,
                rid,
                key_enc_alg,
                encrypted_key,
            }))
        } else if tag.is_context(2) {
            let tlv = dec.read_tlv()?;
            let mut seq = Decoder::new(tlv.value);
            let version = seq.read_small_integer()?;
            // KEKIdentifier; the optional date and other fields are skipped
            let mut kekid = seq.read_sequence()?;
            let key_id = kekid.read_octet_string()?.to_vec();
            let key_enc_alg = AlgorithmIdentifier::parse(&mut seq)?;
            let encrypted_key = seq.read_octet_string()?.to_vec();
            Ok(RecipientInfo::Kek(KekRecipientInfo {
                version,
                key_id,
                key_enc_alg,
                encrypted_key,
            }))
        } else {
            Err(CmsError::Encoding("unrecognized RecipientInfo choice".into()))
        }
    }
}

/// A recovered content-encryption key bound to its cipher.
pub struct ContentKey {
    alg: ContentEncAlgId,
    key: Zeroizing<Vec<u8>>,
}

// Manual impl: the key bytes must never reach a log or panic message.
impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentKey")
            .field("alg", &self.alg)
            .finish_non_exhaustive()
    }
}

impl ContentKey {
    /// Wrap a key obtained out of band.
    pub fn from_raw(alg: ContentEncAlgId, key: Vec<u8>) -> Result<Self, CmsError> {
        if key.len() != alg.key_len() {
            return Err(CmsError::Config(format!(
                "{} needs a {} byte key",
                alg.as_str(),
                alg.key_len()
            )));
        }
        Ok(Self {
            alg,
            key: Zeroizing::new(key),
        })
    }

    pub fn algorithm(&self) -> ContentEncAlgId {
        self.alg
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.key
    }
}

/// The secret a caller holds for one recipient slot.
pub enum RecipientSecret<'a> {
    /// RSA private key with the matching certificate.
    TransportKey {
        key: &'a PrivateKey,
        cert: &'a Certificate,
    },
    /// A distributed key-encryption key under its identifier.
    PresharedKey { key_id: &'a [u8], key: &'a [u8] },
}

/// One recipient slot of a parsed EnvelopedData.
pub struct RecipientInformation<'a> {
    info: &'a RecipientInfo,
    content_enc_alg: &'a AlgorithmIdentifier,
}

impl RecipientInformation<'_> {
    pub fn info(&self) -> &RecipientInfo {
        self.info
    }

    /// Recover the content-encryption key with the given secret.
    ///
    /// Identifier mismatches and every failure inside key recovery report
    /// the same error so a caller cannot be used as a decryption oracle.
    pub fn resolve(&self, secret: &RecipientSecret<'_>) -> Result<ContentKey, CmsError> {
        let alg = self.content_enc_alg.content_enc_alg()?;
        let cek = match (self.info, secret) {
            (RecipientInfo::KeyTrans(kt), RecipientSecret::TransportKey { key, cert }) => {
                if !kt.rid.matches(cert) {
                    return Err(CmsError::CryptoOperation);
                }
                if kt.key_enc_alg.oid != known::rsa_encryption() {
                    return Err(CmsError::UnsupportedAlgorithm(
                        kt.key_enc_alg.oid.to_dot_string(),
                    ));
                }
                key.unwrap_cek(&kt.encrypted_key)
                    .map_err(|_| CmsError::CryptoOperation)?
            }
            (RecipientInfo::Kek(kek), RecipientSecret::PresharedKey { key_id, key }) => {
                if kek.key_id.as_slice() != *key_id {
                    return Err(CmsError::CryptoOperation);
                }
                let wrap_alg = kek.key_enc_alg.key_wrap_alg()?;
                if key.len() != wrap_alg.kek_len() {
                    return Err(CmsError::CryptoOperation);
                }
                scms_crypto::key_unwrap(key, &kek.encrypted_key)
                    .map(Zeroizing::new)
                    .map_err(|_| CmsError::CryptoOperation)?
            }
            _ => {
                return Err(CmsError::Config(
                    "recipient secret does not match recipient type".into(),
                ))
            }
        };
        if cek.len() != alg.key_len() {
            return Err(CmsError::CryptoOperation);
        }
        Ok(ContentKey { alg, key: cek })
    }
}

/// A parsed EnvelopedData.
pub struct EnvelopedData {
    version: u32,
    recipients: Vec<RecipientInfo>,
    eci: EncryptedContentInfo,
}

impl EnvelopedData {
    /// Parse a ContentInfo holding an EnvelopedData.
    pub fn from_der(data: &[u8]) -> Result<Self, CmsError> {
        let mut dec = Decoder::new(data);
        let mut content_info = dec.read_sequence()?;
        let oid = content_info.read_oid()?;
        if oid != known::pkcs7_enveloped_data() {
            return Err(CmsError::Encoding(format!(
                "not an EnvelopedData: {}",
                oid.to_dot_string()
            )));
        }
        let body = content_info.read_context_specific(0)?;
        let mut dec = Decoder::new(body.value);
        let mut seq = dec.read_sequence()?;

        let version = seq.read_small_integer()?;
        // originatorInfo [0] OPTIONAL
        if let Ok(tag) = seq.peek_tag() {
            if tag.is_context(0) {
                let _ = seq.read_tlv()?;
            }
        }

        let mut recipients = Vec::new();
        let mut set = seq.read_set()?;
        while !set.is_empty() {
            recipients.push(RecipientInfo::parse(&mut set)?);
        }

        let mut eci_seq = seq.read_sequence()?;
        let content_type = eci_seq.read_oid()?;
        let content_enc_alg = AlgorithmIdentifier::parse(&mut eci_seq)?;
        let content = match eci_seq.try_read_context_specific(0)? {
            Some(tlv) if tlv.tag.constructed => {
                let mut inner = Decoder::new(tlv.value);
                let mut out = Vec::new();
                while !inner.is_empty() {
                    out.extend_from_slice(&inner.read_octet_string_ber()?);
                }
                Some(out)
            }
            Some(tlv) => Some(tlv.value.to_vec()),
            None => None,
        };

        Ok(Self {
            version,
            recipients,
            eci: EncryptedContentInfo {
                content_type,
                content_enc_alg,
                content,
            },
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn content_type(&self) -> &Oid {
        &self.eci.content_type
    }

    pub fn content_enc_alg(&self) -> &AlgorithmIdentifier {
        &self.eci.content_enc_alg
    }

    pub fn recipients(&self) -> Vec<RecipientInformation<'_>> {
        self.recipients
            .iter()
            .map(|info| RecipientInformation {
                info,
                content_enc_alg: &self.eci.content_enc_alg,
            })
            .collect()
    }

    /// Stream the plaintext with a recovered content key.
    pub fn content_stream(
        &self,
        key: &ContentKey,
    ) -> Result<PlaintextReader<Cursor<&[u8]>>, CmsError> {
        let data = self
            .eci
            .content
            .as_deref()
            .ok_or_else(|| CmsError::Config("no encrypted content present".into()))?;
        decrypt::open_content_stream(
            Some(key),
            Some(&self.eci.content_enc_alg),
            None,
            Cursor::new(data),
        )
    }

    /// Decrypt the whole content in memory.
    pub fn decrypt(&self, key: &ContentKey) -> Result<Vec<u8>, CmsError> {
        let mut reader = self.content_stream(key)?;
        decrypt::read_to_end_mapped(&mut reader)
    }
}

enum RecipientBuilder {
    KeyTrans {
        rid: EntityId,
        key: PublicKey,
    },
    Kek {
        key_id: Vec<u8>,
        kek: Zeroizing<Vec<u8>>,
        alg: KeyWrapAlgId,
    },
}

/// Builder for an EnvelopedData.
#[derive(Default)]
pub struct EnvelopedDataGenerator {
    recipients: Vec<RecipientBuilder>,
}

impl EnvelopedDataGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an RSA key-transport recipient identified by issuer and serial.
    pub fn add_key_trans_recipient(&mut self, cert: &Certificate) -> Result<(), CmsError> {
        let key = cert.public_key()?;
        self.recipients.push(RecipientBuilder::KeyTrans {
            rid: EntityId::issuer_serial_of(cert),
            key,
        });
        Ok(())
    }

    /// Add an RSA key-transport recipient identified by subject key
    /// identifier.
    pub fn add_key_trans_recipient_ski(&mut self, cert: &Certificate) -> Result<(), CmsError> {
        let rid = EntityId::subject_key_id_of(cert).ok_or_else(|| {
            CmsError::Config("certificate has no subject key identifier".into())
        })?;
        let key = cert.public_key()?;
        self.recipients.push(RecipientBuilder::KeyTrans { rid, key });
        Ok(())
    }

    /// Add a KEK recipient. The wrap algorithm follows the KEK length.
    pub fn add_kek_recipient(&mut self, key_id: Vec<u8>, kek: Vec<u8>) -> Result<(), CmsError> {
        let alg = KeyWrapAlgId::for_kek_len(kek.len()).ok_or_else(|| {
            CmsError::UnsupportedAlgorithm(format!("no key wrap for a {} byte KEK", kek.len()))
        })?;
        self.recipients.push(RecipientBuilder::Kek {
            key_id,
            kek: Zeroizing::new(kek),
            alg,
        });
        Ok(())
    }

    /// Encrypt `plaintext` for all recipients and return the complete
    /// ContentInfo encoding.
    pub fn encrypt(&self, plaintext: &[u8], alg: ContentEncAlgId) -> Result<Vec<u8>, CmsError> {
        if self.recipients.is_empty() {
            return Err(CmsError::Config("no recipients configured".into()));
        }

        let cek = Zeroizing::new(
            random_bytes(alg.key_len()).map_err(|_| CmsError::CryptoOperation)?,
        );
        let iv = random_bytes(alg.block_size()).map_err(|_| CmsError::CryptoOperation)?;
        let ciphertext = CbcEncryptor::new(alg, &cek, &iv)
            .map_err(|_| CmsError::CryptoOperation)?
            .encrypt_padded(plaintext);

        let mut any_kek = false;
        let mut infos = Vec::new();
        for recipient in &self.recipients {
            let info = match recipient {
                RecipientBuilder::KeyTrans { rid, key } => {
                    let encrypted_key =
                        key.wrap_cek(&cek).map_err(|_| CmsError::CryptoOperation)?;
                    let version = match rid {
                        EntityId::IssuerSerial { .. } => 0,
                        EntityId::SubjectKeyId(_) => 2,
                    };
                    RecipientInfo::KeyTrans(KeyTransRecipientInfo {
                        version,
                        rid: rid.clone(),
                        key_enc_alg: AlgorithmIdentifier::rsa_encryption(),
                        encrypted_key,
                    })
                }
                RecipientBuilder::Kek { key_id, kek, alg } => {
                    any_kek = true;
                    let encrypted_key =
                        key_wrap(kek, &cek).map_err(|_| CmsError::CryptoOperation)?;
                    RecipientInfo::Kek(KekRecipientInfo {
                        version: 4,
                        key_id: key_id.clone(),
                        key_enc_alg: AlgorithmIdentifier::key_wrap(*alg),
                        encrypted_key,
                    })
                }
            };
            infos.push(info.encode());
        }

        let version: u8 = if any_kek { 2 } else { 0 };
        let eci = enc_seq(&[
            &enc_oid(&known::pkcs7_data()),
            &AlgorithmIdentifier::content_encryption(alg, &iv).to_der(),
            &enc_ctx(0, false, &ciphertext),
        ]);
        let enveloped = enc_seq(&[&enc_int(&[version]), &enc_set_sorted(infos), &eci]);
        Ok(enc_seq(&[
            &enc_oid(&known::pkcs7_enveloped_data()),
            &enc_ctx(0, true, &enveloped),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_debug_redacts_key_material() {
        let key = ContentKey::from_raw(ContentEncAlgId::Aes128Cbc, vec![0xAB; 16]).unwrap();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("Aes128Cbc"));
        // 0xAB would render as decimal 171 if the bytes leaked
        assert!(!rendered.contains("171"));
    }
}

//! SignedData parsing and signature verification.

use crate::cert::Certificate;
use crate::cms::algs::AlgorithmIdentifier;
use crate::cms::attr::AttributeTable;
use crate::cms::EntityId;
use scms_asn1::oid::{known, Oid};
use scms_asn1::{tags, Decoder};
use scms_crypto::digest;
use scms_types::{CmsError, DigestAlgId};

/// One parsed SignerInfo, retaining its raw encoding for re-embedding.
#[derive(Clone)]
pub struct SignerInformation {
    raw: Vec<u8>,
    version: u32,
    sid: EntityId,
    digest_alg: DigestAlgId,
    /// Parsed table plus the raw SET OF content the signature covers.
    signed: Option<(AttributeTable, Vec<u8>)>,
    signature: Vec<u8>,
    unsigned: Option<AttributeTable>,
}

impl SignerInformation {
    pub fn parse(raw: &[u8]) -> Result<Self, CmsError> {
        let mut dec = Decoder::new(raw);
        let mut seq = dec.read_sequence()?;
        let version = seq.read_small_integer()?;
        let sid = EntityId::parse(&mut seq)?;
        let digest_alg = AlgorithmIdentifier::parse(&mut seq)?.digest_alg()?;
        let signed = match seq.try_read_context_specific(0)? {
            Some(tlv) => Some((
                AttributeTable::parse_set_content(tlv.value)?,
                tlv.value.to_vec(),
            )),
            None => None,
        };
        let _sig_alg = AlgorithmIdentifier::parse(&mut seq)?;
        let signature = seq.read_octet_string()?.to_vec();
        let unsigned = match seq.try_read_context_specific(1)? {
            Some(tlv) => Some(AttributeTable::parse_set_content(tlv.value)?),
            None => None,
        };
        Ok(Self {
            raw: raw.to_vec(),
            version,
            sid,
            digest_alg,
            signed,
            signature,
            unsigned,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn sid(&self) -> &EntityId {
        &self.sid
    }

    pub fn digest_algorithm(&self) -> DigestAlgId {
        self.digest_alg
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn signed_attributes(&self) -> Option<&AttributeTable> {
        self.signed.as_ref().map(|(t, _)| t)
    }

    pub fn unsigned_attributes(&self) -> Option<&AttributeTable> {
        self.unsigned.as_ref()
    }

    /// Value of the message-digest signed attribute, when present.
    pub fn message_digest(&self) -> Option<Vec<u8>> {
        let attr = self.signed_attributes()?.get(&known::attr_message_digest())?;
        let mut dec = Decoder::new(attr.values.first()?);
        dec.read_octet_string().ok().map(<[u8]>::to_vec)
    }

    /// Value of the content-type signed attribute, when present.
    pub fn content_type(&self) -> Option<Oid> {
        let attr = self.signed_attributes()?.get(&known::attr_content_type())?;
        let mut dec = Decoder::new(attr.values.first()?);
        dec.read_oid().ok()
    }

    /// Verify this signer over the given content bytes using the public key
    /// of `cert`. With signed attributes present, the message-digest
    /// attribute is checked against the content and the signature is
    /// verified over the attribute SET; otherwise the signature covers the
    /// content directly.
    pub fn verify(&self, content: &[u8], cert: &Certificate) -> Result<(), CmsError> {
        let key = cert.public_key()?;
        let content_digest = digest::compute(self.digest_alg, content);

        let covered_digest = match &self.signed {
            Some((_, set_content)) => {
                let expected = self.message_digest().ok_or(CmsError::CryptoOperation)?;
                if expected != content_digest {
                    return Err(CmsError::CryptoOperation);
                }
                let mut enc = scms_asn1::Encoder::new();
                enc.write_tlv(tags::SET, set_content);
                digest::compute(self.digest_alg, &enc.finish())
            }
            None => content_digest,
        };

        key.verify_digest(self.digest_alg, &covered_digest, &self.signature)
            .map_err(|_| CmsError::CryptoOperation)
    }
}

/// The signers of one SignedData.
#[derive(Clone, Default)]
pub struct SignerInformationStore {
    signers: Vec<SignerInformation>,
}

impl SignerInformationStore {
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignerInformation> {
        self.signers.iter()
    }
}

/// A parsed SignedData.
pub struct SignedData {
    version: u32,
    digest_algorithms: Vec<AlgorithmIdentifier>,
    content_type: Oid,
    content: Option<Vec<u8>>,
    certificates: Vec<Vec<u8>>,
    crls: Vec<Vec<u8>>,
    signers: SignerInformationStore,
}

impl SignedData {
    /// Parse a ContentInfo holding a SignedData, in definite-length DER or
    /// the indefinite-length BER the streaming generator emits.
    pub fn from_ber(data: &[u8]) -> Result<Self, CmsError> {
        let mut dec = Decoder::new(data);
        let mut content_info = dec.read_sequence()?;
        let oid = content_info.read_oid()?;
        if oid != known::pkcs7_signed_data() {
            return Err(CmsError::Encoding(format!(
                "not a SignedData: {}",
                oid.to_dot_string()
            )));
        }
        let body = content_info.read_context_specific(0)?;
        let mut dec = Decoder::new(body.value);
        let mut seq = dec.read_sequence()?;

        let version = seq.read_small_integer()?;

        let mut digest_algorithms = Vec::new();
        let mut alg_set = seq.read_set()?;
        while !alg_set.is_empty() {
            digest_algorithms.push(AlgorithmIdentifier::parse(&mut alg_set)?);
        }

        let mut encap = seq.read_sequence()?;
        let content_type = encap.read_oid()?;
        let content = match encap.try_read_context_specific(0)? {
            Some(tlv) => {
                let mut inner = Decoder::new(tlv.value);
                Some(inner.read_octet_string_ber()?)
            }
            None => None,
        };

        let mut certificates = Vec::new();
        if let Some(tlv) = seq.try_read_context_specific(0)? {
            let mut certs = Decoder::new(tlv.value);
            while !certs.is_empty() {
                certificates.push(certs.read_raw_tlv()?.to_vec());
            }
        }
        let mut crls = Vec::new();
        if let Some(tlv) = seq.try_read_context_specific(1)? {
            let mut list = Decoder::new(tlv.value);
            while !list.is_empty() {
                crls.push(list.read_raw_tlv()?.to_vec());
            }
        }

        let mut signers = Vec::new();
        let mut info_set = seq.read_set()?;
        while !info_set.is_empty() {
            let raw = info_set.read_raw_tlv()?;
            signers.push(SignerInformation::parse(raw)?);
        }

        Ok(Self {
            version,
            digest_algorithms,
            content_type,
            content,
            certificates,
            crls,
            signers: SignerInformationStore { signers },
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn digest_algorithms(&self) -> &[AlgorithmIdentifier] {
        &self.digest_algorithms
    }

    pub fn content_type(&self) -> &Oid {
        &self.content_type
    }

    /// The encapsulated content, absent for detached signatures.
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Raw encodings of the embedded certificates.
    pub fn certificates_der(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    /// Parse the embedded certificates.
    pub fn certificates(&self) -> Result<Vec<Certificate>, CmsError> {
        self.certificates.iter().map(|d| Certificate::from_der(d)).collect()
    }

    pub fn crls_der(&self) -> &[Vec<u8>] {
        &self.crls
    }

    pub fn signers(&self) -> &SignerInformationStore {
        &self.signers
    }

    /// Find an embedded certificate matching the signer's identifier.
    pub fn find_certificate(&self, signer: &SignerInformation) -> Result<Option<Certificate>, CmsError> {
        for der in &self.certificates {
            let cert = Certificate::from_der(der)?;
            if signer.sid().matches(&cert) {
                return Ok(Some(cert));
            }
        }
        Ok(None)
    }
}

//! Minimal X.509 certificate handling.
//!
//! CMS needs the issuer name, serial number, subject public key, and the
//! subject-key-identifier extension of a certificate. Path validation and
//! everything else stays out of scope; raw encodings are retained for
//! embedding.

use scms_asn1::oid::known;
use scms_asn1::Decoder;
use scms_crypto::PublicKey;
use scms_types::CmsError;

/// A parsed certificate retaining its raw encoding.
#[derive(Debug, Clone)]
pub struct Certificate {
    raw: Vec<u8>,
    serial: Vec<u8>,
    issuer_raw: Vec<u8>,
    subject_raw: Vec<u8>,
    spki_der: Vec<u8>,
    subject_key_id: Option<Vec<u8>>,
}

impl Certificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(data: &[u8]) -> Result<Self, CmsError> {
        let mut dec = Decoder::new(data);
        let mut cert = dec.read_sequence()?;
        let mut tbs = cert.read_sequence()?;

        // version [0] EXPLICIT, default v1
        let _ = tbs.try_read_context_specific(0)?;
        let serial = tbs.read_integer()?.to_vec();
        let _sig_alg = tbs.read_raw_tlv()?;
        let issuer_raw = tbs.read_raw_tlv()?.to_vec();
        let _validity = tbs.read_raw_tlv()?;
        let subject_raw = tbs.read_raw_tlv()?.to_vec();
        let spki_der = tbs.read_raw_tlv()?.to_vec();

        let mut subject_key_id = None;
        while !tbs.is_empty() {
            let tlv = tbs.read_tlv()?;
            if !tlv.tag.is_context(3) {
                // issuerUniqueID / subjectUniqueID
                continue;
            }
            let mut wrapper = Decoder::new(tlv.value);
            let mut exts = wrapper.read_sequence()?;
            while !exts.is_empty() {
                let mut ext = exts.read_sequence()?;
                let oid = ext.read_oid()?;
                // optional critical BOOLEAN
                if let Ok(t) = ext.peek_tag() {
                    if t.is_universal(0x01) {
                        let _ = ext.read_tlv()?;
                    }
                }
                let value = ext.read_octet_string()?;
                if oid == known::subject_key_identifier() {
                    let mut inner = Decoder::new(value);
                    subject_key_id = Some(inner.read_octet_string()?.to_vec());
                }
            }
        }

        Ok(Self {
            raw: data.to_vec(),
            serial,
            issuer_raw,
            subject_raw,
            spki_der,
            subject_key_id,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Serial number content bytes as encoded.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    /// Complete DER encoding of the issuer Name.
    pub fn issuer_raw(&self) -> &[u8] {
        &self.issuer_raw
    }

    /// Complete DER encoding of the subject Name.
    pub fn subject_raw(&self) -> &[u8] {
        &self.subject_raw
    }

    /// DER SubjectPublicKeyInfo.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// Value of the subject-key-identifier extension, when present.
    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    pub fn public_key(&self) -> Result<PublicKey, CmsError> {
        PublicKey::from_spki_der(&self.spki_der)
            .map_err(|_| CmsError::Encoding("unsupported subject public key".into()))
    }
}

/// Raw certificates and CRLs queued for embedding in a SignedData.
#[derive(Debug, Default)]
pub struct CertificateStore {
    certificates: Vec<Vec<u8>>,
    crls: Vec<Vec<u8>>,
}

impl CertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_certificate(&mut self, cert: &Certificate) {
        self.certificates.push(cert.raw().to_vec());
    }

    /// Queue a certificate from its raw encoding without parsing it.
    pub fn add_certificate_der(&mut self, der: Vec<u8>) {
        self.certificates.push(der);
    }

    pub fn add_crl_der(&mut self, der: Vec<u8>) {
        self.crls.push(der);
    }

    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    pub fn crls(&self) -> &[Vec<u8>] {
        &self.crls
    }
}

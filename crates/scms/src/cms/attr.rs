//! CMS attributes and attribute table generators.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::encoding::{enc_octet, enc_oid, enc_seq, enc_set_sorted, set_content_sorted};
use scms_asn1::oid::{known, Oid};
use scms_asn1::{Decoder, Encoder};
use scms_types::{CmsError, DigestAlgId};

/// A single CMS Attribute: an OID with a SET OF values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub oid: Oid,
    /// DER encodings of the attribute values.
    pub values: Vec<Vec<u8>>,
}

impl Attribute {
    /// An attribute with a single value.
    pub fn single(oid: Oid, value: Vec<u8>) -> Self {
        Self {
            oid,
            values: vec![value],
        }
    }

    pub fn to_der(&self) -> Vec<u8> {
        enc_seq(&[&enc_oid(&self.oid), &enc_set_sorted(self.values.clone())])
    }

    pub fn parse(dec: &mut Decoder<'_>) -> Result<Self, CmsError> {
        let mut seq = dec.read_sequence()?;
        let oid = seq.read_oid()?;
        let mut set = seq.read_set()?;
        let mut values = Vec::new();
        while !set.is_empty() {
            values.push(set.read_raw_tlv()?.to_vec());
        }
        Ok(Self { oid, values })
    }
}

/// An ordered collection of attributes keyed by OID.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    attributes: Vec<Attribute>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, attr: Attribute) -> &mut Self {
        self.attributes.push(attr);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// First attribute with the given OID.
    pub fn get(&self, oid: &Oid) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.oid == *oid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Content bytes of the DER SET OF Attribute, sorted, without the
    /// SET header. The caller picks the outer tag (SET for the signature
    /// computation, [0] IMPLICIT inside a SignerInfo).
    pub fn to_set_content(&self) -> Vec<u8> {
        set_content_sorted(self.attributes.iter().map(Attribute::to_der).collect())
    }

    /// Parse the content of a SET OF Attribute.
    pub fn parse_set_content(data: &[u8]) -> Result<Self, CmsError> {
        let mut dec = Decoder::new(data);
        let mut table = Self::new();
        while !dec.is_empty() {
            table.add(Attribute::parse(&mut dec)?);
        }
        Ok(table)
    }
}

/// Inputs available to an attribute generator at signing time.
#[derive(Debug, Clone)]
pub struct AttributeContext {
    pub content_type: Oid,
    pub digest_alg: DigestAlgId,
    /// Digest of the encapsulated content.
    pub message_digest: Vec<u8>,
    /// The computed signature, available to unsigned-attribute generators
    /// only.
    pub signature: Option<Vec<u8>>,
}

/// Produces an attribute table for one signer at assembly time.
pub trait AttributeTableGenerator {
    fn attributes(&self, ctx: &AttributeContext) -> Result<AttributeTable, CmsError>;
}

/// The standard signed-attribute set: content-type, signing-time and
/// message-digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSignedAttributes;

impl AttributeTableGenerator for DefaultSignedAttributes {
    fn attributes(&self, ctx: &AttributeContext) -> Result<AttributeTable, CmsError> {
        let mut table = AttributeTable::new();
        table.add(Attribute::single(
            known::attr_content_type(),
            enc_oid(&ctx.content_type),
        ));
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let mut enc = Encoder::new();
        enc.write_utc_time(now);
        table.add(Attribute::single(known::attr_signing_time(), enc.finish()));
        table.add(Attribute::single(
            known::attr_message_digest(),
            enc_octet(&ctx.message_digest),
        ));
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> AttributeContext {
        AttributeContext {
            content_type: known::pkcs7_data(),
            digest_alg: DigestAlgId::Sha256,
            message_digest: vec![0xAB; 32],
            signature: None,
        }
    }

    #[test]
    fn attribute_roundtrip() {
        let attr = Attribute::single(known::attr_message_digest(), enc_octet(&[1, 2, 3]));
        let der = attr.to_der();
        let mut dec = Decoder::new(&der);
        assert_eq!(Attribute::parse(&mut dec).unwrap(), attr);
    }

    #[test]
    fn default_signed_attributes_content() {
        let table = DefaultSignedAttributes.attributes(&ctx()).unwrap();
        assert_eq!(table.len(), 3);
        let ct = table.get(&known::attr_content_type()).unwrap();
        assert_eq!(ct.values[0], enc_oid(&known::pkcs7_data()));
        let md = table.get(&known::attr_message_digest()).unwrap();
        assert_eq!(md.values[0], enc_octet(&[0xAB; 32]));
        assert!(table.get(&known::attr_signing_time()).is_some());
    }

    #[test]
    fn set_content_is_sorted() {
        let mut table = AttributeTable::new();
        table.add(Attribute::single(
            known::attr_message_digest(),
            enc_octet(&[9; 4]),
        ));
        table.add(Attribute::single(
            known::attr_content_type(),
            enc_oid(&known::pkcs7_data()),
        ));
        let content = table.to_set_content();
        let parsed = AttributeTable::parse_set_content(&content).unwrap();
        assert_eq!(parsed.len(), 2);
        let encodings: Vec<Vec<u8>> = parsed.iter().map(Attribute::to_der).collect();
        let mut sorted = encodings.clone();
        sorted.sort();
        assert_eq!(encodings, sorted);
    }
}

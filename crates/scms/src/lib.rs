#![forbid(unsafe_code)]
//! Streaming CMS (RFC 5652).
//!
//! Two engines over one BER nesting discipline: a streaming SignedData
//! generator that digests and signs content as it passes through, and an
//! EnvelopedData engine that wraps a content-encryption key per recipient
//! and decrypts content as it is read.

pub mod cert;
pub mod cms;
mod encoding;

pub use cert::{Certificate, CertificateStore};
pub use cms::algs::AlgorithmIdentifier;
pub use cms::attr::{
    Attribute, AttributeContext, AttributeTable, AttributeTableGenerator, DefaultSignedAttributes,
};
pub use cms::decrypt::PlaintextReader;
pub use cms::enveloped::{
    ContentKey, EnvelopedData, EnvelopedDataGenerator, RecipientInfo, RecipientInformation,
    RecipientSecret,
};
pub use cms::signed::{SignedDataStreamGenerator, SignedDataWriter};
pub use cms::verify::{SignedData, SignerInformation, SignerInformationStore};
pub use cms::EntityId;

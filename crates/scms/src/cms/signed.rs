//! Streaming SignedData generation.
//!
//! The generator is configured with signers and optional certificates, then
//! opened over a byte sink. Content written to the returned writer is
//! digested once while being forwarded, as indefinite-length OCTET STRING
//! segments when encapsulated or to nowhere for a detached signature. On
//! close the SignerInfos are assembled from the accumulated digests and the
//! trailing structures are emitted.

use std::io::{self, Write};

use crate::cert::{Certificate, CertificateStore};
use crate::cms::algs::AlgorithmIdentifier;
use crate::cms::attr::{
    AttributeContext, AttributeTableGenerator, DefaultSignedAttributes,
};
use crate::cms::stream::{DigestTee, NullSink};
use crate::cms::verify::{SignerInformation, SignerInformationStore};
use crate::cms::EntityId;
use crate::encoding::{enc_ctx, enc_int, enc_octet, enc_seq, enc_set_sorted, enc_tlv};
use scms_asn1::ber::{BerFrame, BerWriter};
use scms_asn1::oid::{known, Oid};
use scms_asn1::{tags, Decoder};
use scms_crypto::{digest, DigestCtx, PrivateKey};
use scms_types::{Asn1Error, CmsError, DigestAlgId};

struct SignerSpec {
    key: PrivateKey,
    sid: EntityId,
    digest_alg: DigestAlgId,
    signed_gen: Box<dyn AttributeTableGenerator>,
    unsigned_gen: Option<Box<dyn AttributeTableGenerator>>,
}

impl SignerSpec {
    /// Assemble the SignerInfo once the content digest is known.
    fn finalize(&self, content_type: &Oid, content_digest: Vec<u8>) -> Result<Vec<u8>, CmsError> {
        let mut ctx = AttributeContext {
            content_type: content_type.clone(),
            digest_alg: self.digest_alg,
            message_digest: content_digest,
            signature: None,
        };

        let signed = self.signed_gen.attributes(&ctx)?;
        if signed.is_empty() {
            return Err(CmsError::Config(
                "signing without signed attributes is not supported".into(),
            ));
        }
        let set_content = signed.to_set_content();

        // The signature covers the attributes re-tagged as a SET, not the
        // [0] IMPLICIT form carried in the SignerInfo.
        let to_sign = enc_tlv(tags::SET, &set_content);
        let tbs_digest = digest::compute(self.digest_alg, &to_sign);
        let signature = self
            .key
            .sign_digest(self.digest_alg, &tbs_digest)
            .map_err(|_| CmsError::CryptoOperation)?;

        let mut parts: Vec<Vec<u8>> = Vec::new();
        let version: u8 = match self.sid {
            EntityId::IssuerSerial { .. } => 1,
            EntityId::SubjectKeyId(_) => 3,
        };
        parts.push(enc_int(&[version]));
        parts.push(self.sid.encode());
        parts.push(AlgorithmIdentifier::digest(self.digest_alg).to_der());
        parts.push(enc_ctx(0, true, &set_content));
        parts.push(AlgorithmIdentifier::rsa_encryption().to_der());
        parts.push(enc_octet(&signature));

        if let Some(gen) = &self.unsigned_gen {
            ctx.signature = Some(signature);
            let unsigned = gen.attributes(&ctx)?;
            if !unsigned.is_empty() {
                parts.push(enc_ctx(1, true, &unsigned.to_set_content()));
            }
        }

        let refs: Vec<&[u8]> = parts.iter().map(Vec::as_slice).collect();
        Ok(enc_seq(&refs))
    }
}

/// Builder for a streaming SignedData.
#[derive(Default)]
pub struct SignedDataStreamGenerator {
    signers: Vec<SignerSpec>,
    precomputed: Vec<SignerInformation>,
    certificates: Vec<Vec<u8>>,
    crls: Vec<Vec<u8>>,
}

impl SignedDataStreamGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signer identified by issuer and serial number, with the
    /// standard signed-attribute set.
    pub fn add_signer(&mut self, key: PrivateKey, cert: &Certificate, digest_alg: DigestAlgId) {
        self.add_signer_with(
            key,
            EntityId::issuer_serial_of(cert),
            digest_alg,
            Box::new(DefaultSignedAttributes),
            None,
        );
    }

    /// Register a signer identified by subject key identifier. Fails when
    /// the certificate does not carry the extension.
    pub fn add_signer_ski(
        &mut self,
        key: PrivateKey,
        cert: &Certificate,
        digest_alg: DigestAlgId,
    ) -> Result<(), CmsError> {
        let sid = EntityId::subject_key_id_of(cert).ok_or_else(|| {
            CmsError::Config("certificate has no subject key identifier".into())
        })?;
        self.add_signer_with(key, sid, digest_alg, Box::new(DefaultSignedAttributes), None);
        Ok(())
    }

    /// Register a signer with custom attribute generators.
    pub fn add_signer_with(
        &mut self,
        key: PrivateKey,
        sid: EntityId,
        digest_alg: DigestAlgId,
        signed_gen: Box<dyn AttributeTableGenerator>,
        unsigned_gen: Option<Box<dyn AttributeTableGenerator>>,
    ) {
        self.signers.push(SignerSpec {
            key,
            sid,
            digest_alg,
            signed_gen,
            unsigned_gen,
        });
    }

    /// Carry over already-assembled SignerInfos, for countersigning or
    /// re-encoding an existing structure. Their encodings are embedded
    /// unchanged.
    pub fn add_signers(&mut self, store: &SignerInformationStore) {
        self.precomputed.extend(store.iter().cloned());
    }

    /// Queue certificates and CRLs for embedding. Each encoding is checked
    /// to be a well-formed element before it is accepted.
    pub fn add_certificates_and_crls(&mut self, store: &CertificateStore) -> Result<(), CmsError> {
        for der in store.certificates() {
            let mut dec = Decoder::new(der);
            dec.read_raw_tlv()?;
            if !dec.is_empty() {
                return Err(CmsError::Encoding("trailing bytes after certificate".into()));
            }
            self.certificates.push(der.clone());
        }
        for der in store.crls() {
            let mut dec = Decoder::new(der);
            dec.read_raw_tlv()?;
            if !dec.is_empty() {
                return Err(CmsError::Encoding("trailing bytes after CRL".into()));
            }
            self.crls.push(der.clone());
        }
        Ok(())
    }

    /// Open the structure over `sink` and return a writer for the content.
    ///
    /// With `encapsulate` the content is embedded as OCTET STRING segments;
    /// without it only the digests see the content (detached signature).
    pub fn open<W: Write>(
        self,
        sink: W,
        content_type: Oid,
        encapsulate: bool,
    ) -> Result<SignedDataWriter<W>, CmsError> {
        let mut ber = BerWriter::new(sink);
        let res = Self::write_preamble(
            &mut ber,
            &content_type,
            encapsulate,
            &self.signers,
            &self.precomputed,
        );
        let frames = match res {
            Ok(frames) => frames,
            Err(e) => return Err(e.into()),
        };

        let digests = self
            .signers
            .iter()
            .map(|s| DigestCtx::new(s.digest_alg))
            .collect();
        let target = if encapsulate {
            ContentTarget::Embedded
        } else {
            ContentTarget::Discard(NullSink)
        };
        let tee = DigestTee::new(ContentSink { ber, target }, digests);

        Ok(SignedDataWriter {
            tee,
            frames,
            content_type,
            signers: self.signers,
            precomputed: self.precomputed,
            certificates: self.certificates,
            crls: self.crls,
        })
    }

    fn write_preamble<W: Write>(
        ber: &mut BerWriter<W>,
        content_type: &Oid,
        encapsulate: bool,
        signers: &[SignerSpec],
        precomputed: &[SignerInformation],
    ) -> Result<Frames, Asn1Error> {
        let content_info = ber.open_sequence()?;
        let mut enc = scms_asn1::Encoder::new();
        enc.write_oid(&known::pkcs7_signed_data());
        ber.write_raw(&enc.finish())?;
        let explicit = ber.open_explicit(0)?;
        let signed_data = ber.open_sequence()?;

        let version: u8 = if *content_type == known::pkcs7_data() {
            1
        } else {
            3
        };
        ber.write_raw(&enc_int(&[version]))?;

        // digestAlgorithms, deduplicated across direct and carried signers
        let mut algs: Vec<DigestAlgId> = Vec::new();
        for alg in signers
            .iter()
            .map(|s| s.digest_alg)
            .chain(precomputed.iter().map(SignerInformation::digest_algorithm))
        {
            if !algs.contains(&alg) {
                algs.push(alg);
            }
        }
        let ais = algs
            .into_iter()
            .map(|a| AlgorithmIdentifier::digest(a).to_der())
            .collect();
        ber.write_raw(&enc_set_sorted(ais))?;

        let encap = ber.open_sequence()?;
        let mut enc = scms_asn1::Encoder::new();
        enc.write_oid(content_type);
        ber.write_raw(&enc.finish())?;

        let content = if encapsulate {
            let explicit_content = ber.open_explicit(0)?;
            let octets = ber.open_octet_string()?;
            Some((explicit_content, octets))
        } else {
            None
        };

        Ok(Frames {
            content_info,
            explicit,
            signed_data,
            encap,
            content,
        })
    }
}

struct Frames {
    content_info: BerFrame,
    explicit: BerFrame,
    signed_data: BerFrame,
    encap: BerFrame,
    content: Option<(BerFrame, BerFrame)>,
}

/// Where the content bytes go after digesting: into the structure as
/// OCTET STRING segments, or nowhere for a detached signature.
enum ContentTarget {
    Embedded,
    Discard(NullSink),
}

struct ContentSink<W: Write> {
    ber: BerWriter<W>,
    target: ContentTarget,
}

fn asn1_io_err(e: Asn1Error) -> io::Error {
    match e {
        Asn1Error::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

impl<W: Write> Write for ContentSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.target {
            ContentTarget::Embedded => {
                if !buf.is_empty() {
                    self.ber.write_octet_segment(buf).map_err(asn1_io_err)?;
                }
                Ok(buf.len())
            }
            ContentTarget::Discard(sink) => sink.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ber.flush().map_err(asn1_io_err)
    }
}

/// The content channel of an opened SignedData. Write the content, then
/// `close` to emit the signatures.
pub struct SignedDataWriter<W: Write> {
    tee: DigestTee<ContentSink<W>>,
    frames: Frames,
    content_type: Oid,
    signers: Vec<SignerSpec>,
    precomputed: Vec<SignerInformation>,
    certificates: Vec<Vec<u8>>,
    crls: Vec<Vec<u8>>,
}

impl<W: Write> SignedDataWriter<W> {
    /// Assemble SignerInfos, close all frames and return the sink.
    pub fn close(self) -> Result<W, CmsError> {
        let (mut sink, digests) = self.tee.into_parts();

        if let Some((explicit_content, octets)) = self.frames.content {
            sink.ber.close(octets)?;
            sink.ber.close(explicit_content)?;
        }
        sink.ber.close(self.frames.encap)?;

        if !self.certificates.is_empty() {
            let content = crate::encoding::set_content_sorted(self.certificates);
            sink.ber.write_raw(&enc_ctx(0, true, &content))?;
        }
        if !self.crls.is_empty() {
            let content = crate::encoding::set_content_sorted(self.crls);
            sink.ber.write_raw(&enc_ctx(1, true, &content))?;
        }

        let mut infos: Vec<Vec<u8>> = self
            .precomputed
            .iter()
            .map(|s| s.raw().to_vec())
            .collect();
        for (signer, ctx) in self.signers.iter().zip(digests) {
            infos.push(signer.finalize(&self.content_type, ctx.finish())?);
        }
        sink.ber.write_raw(&enc_set_sorted(infos))?;

        sink.ber.close(self.frames.signed_data)?;
        sink.ber.close(self.frames.explicit)?;
        sink.ber.close(self.frames.content_info)?;
        Ok(sink.ber.finish()?)
    }

    /// Give up without closing. The sink is returned holding a truncated
    /// structure that will not parse.
    pub fn abandon(self) -> W {
        let (sink, _) = self.tee.into_parts();
        sink.ber.into_inner()
    }
}

impl<W: Write> Write for SignedDataWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tee.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tee.flush()
    }
}

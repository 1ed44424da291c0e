#![allow(dead_code)]
//! Shared fixtures: self-signed RSA certificates for signing and key
//! transport.

use std::sync::OnceLock;

use scms::Certificate;
use scms_asn1::oid::known;
use scms_asn1::Encoder;
use scms_crypto::{digest, PrivateKey};
use scms_types::DigestAlgId;

pub struct TestIdentity {
    pub key: PrivateKey,
    pub cert: Certificate,
}

fn seq(content: &[u8]) -> Vec<u8> {
    let mut e = Encoder::new();
    e.write_sequence(content);
    e.finish()
}

/// Name with a single common-name RDN.
fn name(cn: &str) -> Vec<u8> {
    let mut atv = Encoder::new();
    atv.write_oid(&known::common_name());
    atv.write_utf8_string(cn);
    let atv = seq(&atv.finish());
    let mut rdn = Encoder::new();
    rdn.write_set(&atv);
    seq(&rdn.finish())
}

pub fn self_signed_cert(key: &PrivateKey, serial: &[u8], cn: &str) -> Vec<u8> {
    let spki = key.public_key().to_spki_der().unwrap();
    let ski = digest::compute(DigestAlgId::Sha1, &spki);

    let sig_alg = {
        let mut e = Encoder::new();
        e.write_oid(&known::sha256_with_rsa());
        e.write_null();
        seq(&e.finish())
    };

    let mut tbs = Encoder::new();
    let version = {
        let mut e = Encoder::new();
        e.write_integer(&[2]);
        e.finish()
    };
    tbs.write_context_specific(0, true, &version);
    tbs.write_integer(serial);
    tbs.write_raw(&sig_alg);
    tbs.write_raw(&name(cn));
    let validity = {
        let mut e = Encoder::new();
        e.write_utc_time(1_700_000_000);
        e.write_utc_time(2_000_000_000);
        seq(&e.finish())
    };
    tbs.write_raw(&validity);
    tbs.write_raw(&name(cn));
    tbs.write_raw(&spki);

    let ski_value = {
        let mut e = Encoder::new();
        e.write_octet_string(&ski);
        e.finish()
    };
    let mut ext = Encoder::new();
    ext.write_oid(&known::subject_key_identifier());
    ext.write_octet_string(&ski_value);
    let extensions = seq(&seq(&ext.finish()));
    tbs.write_context_specific(3, true, &extensions);
    let tbs = seq(&tbs.finish());

    let tbs_digest = digest::compute(DigestAlgId::Sha256, &tbs);
    let signature = key.sign_digest(DigestAlgId::Sha256, &tbs_digest).unwrap();

    let mut cert = Encoder::new();
    cert.write_raw(&tbs);
    cert.write_raw(&sig_alg);
    cert.write_bit_string(0, &signature);
    seq(&cert.finish())
}

fn identity(cell: &OnceLock<(PrivateKey, Vec<u8>)>, serial: &[u8], cn: &str) -> TestIdentity {
    let (key, der) = cell.get_or_init(|| {
        let key = PrivateKey::generate(2048).unwrap();
        let der = self_signed_cert(&key, serial, cn);
        (key, der)
    });
    TestIdentity {
        key: key.clone(),
        cert: Certificate::from_der(der).unwrap(),
    }
}

pub fn test_identity() -> TestIdentity {
    static CELL: OnceLock<(PrivateKey, Vec<u8>)> = OnceLock::new();
    identity(&CELL, &[0x01, 0x77], "scms test")
}

pub fn second_identity() -> TestIdentity {
    static CELL: OnceLock<(PrivateKey, Vec<u8>)> = OnceLock::new();
    identity(&CELL, &[0x02, 0x42], "scms second")
}

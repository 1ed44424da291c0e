//! Error types shared across the workspace.

/// Errors from the ASN.1 layer: decoding, DER encoding, and the
/// indefinite-length BER writer.
#[derive(Debug, thiserror::Error)]
pub enum Asn1Error {
    #[error("truncated or malformed ASN.1 element")]
    Malformed,
    #[error("unexpected ASN.1 tag")]
    UnexpectedTag,
    #[error("ASN.1 length overflow")]
    LengthOverflow,
    #[error("indefinite length on a primitive encoding")]
    PrimitiveIndefinite,
    #[error("BER frame closed out of order")]
    OutOfOrderClose,
    #[error("unclosed BER frames remain")]
    UnclosedFrames,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Internal errors of the crypto crate.
///
/// These carry enough detail for debugging primitive misuse; the CMS layer
/// never surfaces them across its decryption boundary.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length: expected {expected}, got {got}")]
    InvalidIvLength { expected: usize, got: usize },
    #[error("input is not a whole number of cipher blocks")]
    PartialBlock,
    #[error("key unwrap failed")]
    UnwrapFail,
    #[error("signature generation failed")]
    SignFail,
    #[error("signature verification failed")]
    VerifyFail,
    #[error("public key parse failed")]
    KeyParseFail,
    #[error("random source failure")]
    RandomFail,
}

/// The public CMS error taxonomy.
///
/// `CryptoOperation` deliberately carries no detail: wrong keys, RSA padding
/// failures, key-unwrap integrity failures, content padding failures, and
/// recipient mismatches all render as the same message so a probing caller
/// cannot distinguish the sub-cause.
#[derive(Debug, thiserror::Error)]
pub enum CmsError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("encoding error: {0}")]
    Encoding(String),
    #[error("crypto operation failed")]
    CryptoOperation,
    #[error("stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Asn1Error> for CmsError {
    fn from(e: Asn1Error) -> Self {
        match e {
            Asn1Error::Io(io) => CmsError::Io(io),
            other => CmsError::Encoding(other.to_string()),
        }
    }
}

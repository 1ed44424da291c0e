//! Algorithm identifiers used across the workspace.

/// Message digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgId {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgId {
    /// Digest output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgId::Sha1 => 20,
            DigestAlgId::Sha256 => 32,
            DigestAlgId::Sha384 => 48,
            DigestAlgId::Sha512 => 64,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgId::Sha1 => "SHA-1",
            DigestAlgId::Sha256 => "SHA-256",
            DigestAlgId::Sha384 => "SHA-384",
            DigestAlgId::Sha512 => "SHA-512",
        }
    }
}

/// Content encryption algorithms (CBC mode, PKCS#7 padding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentEncAlgId {
    Aes128Cbc,
    Aes192Cbc,
    Aes256Cbc,
    DesEde3Cbc,
}

impl ContentEncAlgId {
    pub fn key_len(self) -> usize {
        match self {
            ContentEncAlgId::Aes128Cbc => 16,
            ContentEncAlgId::Aes192Cbc => 24,
            ContentEncAlgId::Aes256Cbc => 32,
            ContentEncAlgId::DesEde3Cbc => 24,
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            ContentEncAlgId::DesEde3Cbc => 8,
            _ => 16,
        }
    }

    /// Legacy algorithms whose CMS encodings may omit the IV parameter;
    /// an absent parameter means an all-zero IV of the block size.
    pub fn zero_iv_default(self) -> bool {
        matches!(self, ContentEncAlgId::DesEde3Cbc)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentEncAlgId::Aes128Cbc => "AES-128-CBC",
            ContentEncAlgId::Aes192Cbc => "AES-192-CBC",
            ContentEncAlgId::Aes256Cbc => "AES-256-CBC",
            ContentEncAlgId::DesEde3Cbc => "DES-EDE3-CBC",
        }
    }
}

/// Key wrap algorithms (RFC 3394).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyWrapAlgId {
    Aes128Wrap,
    Aes192Wrap,
    Aes256Wrap,
}

impl KeyWrapAlgId {
    /// Required key-encryption-key length in bytes.
    pub fn kek_len(self) -> usize {
        match self {
            KeyWrapAlgId::Aes128Wrap => 16,
            KeyWrapAlgId::Aes192Wrap => 24,
            KeyWrapAlgId::Aes256Wrap => 32,
        }
    }

    /// Pick the wrap algorithm matching a KEK length.
    pub fn for_kek_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(KeyWrapAlgId::Aes128Wrap),
            24 => Some(KeyWrapAlgId::Aes192Wrap),
            32 => Some(KeyWrapAlgId::Aes256Wrap),
            _ => None,
        }
    }
}

/// MAC algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacAlgId {
    HmacSha1,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl MacAlgId {
    pub fn output_len(self) -> usize {
        match self {
            MacAlgId::HmacSha1 => 20,
            MacAlgId::HmacSha256 => 32,
            MacAlgId::HmacSha384 => 48,
            MacAlgId::HmacSha512 => 64,
        }
    }
}

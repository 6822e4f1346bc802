//! miIO wire format.
//!
//! Every datagram starts with a 32-byte header, big-endian:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 2 | magic `0x2131` |
//! | 2 | 2 | total packet length |
//! | 4 | 4 | unknown (zero, or `0xFFFFFFFF` in hello) |
//! | 8 | 4 | device id |
//! | 12 | 4 | stamp (seconds since device boot) |
//! | 16 | 16 | MD5 checksum |
//!
//! followed by the AES-128-CBC encrypted JSON body. The cipher key is
//! `MD5(token)` and the IV is `MD5(key ‖ token)`. The checksum is computed
//! over the first 16 header bytes, the token and the encrypted body.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};

use crate::error::MiioError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const MAGIC: u16 = 0x2131;
pub const HEADER_LEN: usize = 32;

/// The 16-byte device secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token([u8; 16]);

impl Token {
    /// Parse a 32-character hex token.
    ///
    /// # Errors
    ///
    /// Returns [`MiioError::InvalidToken`] for anything else.
    pub fn from_hex(value: &str) -> Result<Self, MiioError> {
        let bytes = hex::decode(value.trim()).map_err(|_| MiioError::InvalidToken)?;
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| MiioError::InvalidToken)?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    fn cipher_params(&self) -> ([u8; 16], [u8; 16]) {
        let key = md5_of(&[self.0.as_slice()]);
        let iv = md5_of(&[key.as_slice(), self.0.as_slice()]);
        (key, iv)
    }

    /// Encrypt a plaintext body.
    #[must_use]
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let (key, iv) = self.cipher_params();
        Aes128CbcEnc::new(&key.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypt an encrypted body.
    ///
    /// # Errors
    ///
    /// Returns [`MiioError::Decrypt`] when the padding is invalid, which is
    /// what a wrong token produces.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, MiioError> {
        let (key, iv) = self.cipher_params();
        Aes128CbcDec::new(&key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| MiioError::Decrypt)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(..)")
    }
}

fn md5_of(parts: &[&[u8]]) -> [u8; 16] {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    let mut digest = [0u8; 16];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// Parsed header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub length: u16,
    pub device_id: u32,
    pub stamp: u32,
}

impl Header {
    /// Parse the fixed header of a datagram.
    ///
    /// # Errors
    ///
    /// Returns [`MiioError::Malformed`] for short packets, a wrong magic or a
    /// length field that disagrees with the datagram size.
    pub fn parse(packet: &[u8]) -> Result<Self, MiioError> {
        if packet.len() < HEADER_LEN {
            return Err(MiioError::Malformed("packet shorter than header"));
        }
        if u16::from_be_bytes([packet[0], packet[1]]) != MAGIC {
            return Err(MiioError::Malformed("bad magic"));
        }
        let length = u16::from_be_bytes([packet[2], packet[3]]);
        if usize::from(length) != packet.len() {
            return Err(MiioError::Malformed("length field mismatch"));
        }
        Ok(Self {
            length,
            device_id: u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]]),
            stamp: u32::from_be_bytes([packet[12], packet[13], packet[14], packet[15]]),
        })
    }
}

/// The discovery/handshake packet: a bare header filled with `0xFF`.
#[must_use]
pub fn hello() -> [u8; HEADER_LEN] {
    let mut packet = [0xFF; HEADER_LEN];
    packet[0..2].copy_from_slice(&MAGIC.to_be_bytes());
    packet[2..4].copy_from_slice(&0x0020_u16.to_be_bytes());
    packet
}

/// Build an encrypted request datagram.
///
/// # Errors
///
/// Returns [`MiioError::Malformed`] if the body does not fit the 16-bit
/// length field.
pub fn encode(
    token: &Token,
    device_id: u32,
    stamp: u32,
    payload: &[u8],
) -> Result<Vec<u8>, MiioError> {
    let encrypted = token.encrypt(payload);
    let length = u16::try_from(HEADER_LEN + encrypted.len())
        .map_err(|_| MiioError::Malformed("payload too large"))?;

    let mut packet = Vec::with_capacity(usize::from(length));
    packet.extend_from_slice(&MAGIC.to_be_bytes());
    packet.extend_from_slice(&length.to_be_bytes());
    packet.extend_from_slice(&0_u32.to_be_bytes());
    packet.extend_from_slice(&device_id.to_be_bytes());
    packet.extend_from_slice(&stamp.to_be_bytes());
    let checksum = md5_of(&[&packet[..16], token.as_bytes().as_slice(), encrypted.as_slice()]);
    packet.extend_from_slice(&checksum);
    packet.extend_from_slice(&encrypted);
    Ok(packet)
}

/// Verify and decrypt a reply datagram.
///
/// Returns the header together with the decrypted body, trailing NUL bytes
/// stripped. A bare header (no body) yields an empty body.
///
/// # Errors
///
/// Returns [`MiioError`] when the header is malformed, the checksum does not
/// match or the body cannot be decrypted.
pub fn decode(token: &Token, packet: &[u8]) -> Result<(Header, Vec<u8>), MiioError> {
    let header = Header::parse(packet)?;
    let encrypted = &packet[HEADER_LEN..];
    if encrypted.is_empty() {
        return Ok((header, Vec::new()));
    }

    let checksum = md5_of(&[&packet[..16], token.as_bytes().as_slice(), encrypted]);
    if checksum[..] != packet[16..HEADER_LEN] {
        return Err(MiioError::Checksum);
    }

    let mut body = token.decrypt(encrypted)?;
    while body.last() == Some(&0) {
        body.pop();
    }
    Ok((header, body))
}

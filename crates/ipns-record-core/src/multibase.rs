//! Multibase encodings used by content identifiers and datastore keys.
//!
//! Only the bases that show up in IPNS names are supported:
//! base32 (RFC 4648, no padding), base36, base58btc and hex.

use crate::error::CoreError;

const BASE32_LOWER: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const BASE32_UPPER: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const BASE36_LOWER: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A multibase encoding, identified by its single-character prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// `b`
    Base32Lower,
    /// `B`
    Base32Upper,
    /// `k`
    Base36Lower,
    /// `K`
    Base36Upper,
    /// `z`
    Base58Btc,
    /// `f`
    HexLower,
    /// `F`
    HexUpper,
}

impl Base {
    /// Look up a base by its multibase prefix.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'b' => Some(Self::Base32Lower),
            'B' => Some(Self::Base32Upper),
            'k' => Some(Self::Base36Lower),
            'K' => Some(Self::Base36Upper),
            'z' => Some(Self::Base58Btc),
            'f' => Some(Self::HexLower),
            'F' => Some(Self::HexUpper),
            _ => None,
        }
    }

    /// The multibase prefix character.
    pub fn prefix(self) -> char {
        match self {
            Self::Base32Lower => 'b',
            Self::Base32Upper => 'B',
            Self::Base36Lower => 'k',
            Self::Base36Upper => 'K',
            Self::Base58Btc => 'z',
            Self::HexLower => 'f',
            Self::HexUpper => 'F',
        }
    }

    /// Encode without the prefix.
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::Base32Lower => base32_encode(data, BASE32_LOWER),
            Self::Base32Upper => base32_encode(data, BASE32_UPPER),
            Self::Base36Lower => base36_encode(data),
            Self::Base36Upper => base36_encode(data).to_ascii_uppercase(),
            Self::Base58Btc => bs58::encode(data).into_string(),
            Self::HexLower => hex::encode(data),
            Self::HexUpper => hex::encode_upper(data),
        }
    }

    /// Decode a string without the prefix.
    pub fn decode(self, input: &str) -> Result<Vec<u8>, CoreError> {
        match self {
            Self::Base32Lower => base32_decode(input, BASE32_LOWER),
            Self::Base32Upper => base32_decode(input, BASE32_UPPER),
            Self::Base36Lower => base36_decode(input),
            Self::Base36Upper => base36_decode(&input.to_ascii_lowercase()),
            Self::Base58Btc => bs58::decode(input)
                .into_vec()
                .map_err(|e| CoreError::DecodingError(format!("base58btc: {e}"))),
            Self::HexLower | Self::HexUpper => {
                hex::decode(input).map_err(|e| CoreError::DecodingError(format!("hex: {e}")))
            }
        }
    }
}

/// Encode with the multibase prefix.
pub fn encode(base: Base, data: &[u8]) -> String {
    let mut out = String::new();
    out.push(base.prefix());
    out.push_str(&base.encode(data));
    out
}

/// Decode a prefixed multibase string.
pub fn decode(input: &str) -> Result<(Base, Vec<u8>), CoreError> {
    let mut chars = input.chars();
    let prefix = chars
        .next()
        .ok_or_else(|| CoreError::DecodingError("empty multibase string".into()))?;
    let base = Base::from_prefix(prefix)
        .ok_or_else(|| CoreError::DecodingError(format!("unsupported multibase prefix {prefix:?}")))?;
    let bytes = base.decode(chars.as_str())?;
    Ok((base, bytes))
}

/// RFC 4648 base32, no padding.
fn base32_encode(data: &[u8], alphabet: &[u8; 32]) -> String {
    let mut result = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in data {
        buffer = (buffer << 8) | u64::from(byte);
        bits_in_buffer += 8;

        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let index = ((buffer >> bits_in_buffer) & 0x1f) as usize;
            result.push(alphabet[index] as char);
        }
    }

    if bits_in_buffer > 0 {
        let index = ((buffer << (5 - bits_in_buffer)) & 0x1f) as usize;
        result.push(alphabet[index] as char);
    }

    result
}

fn base32_decode(input: &str, alphabet: &[u8; 32]) -> Result<Vec<u8>, CoreError> {
    let mut result = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for c in input.bytes() {
        let value = alphabet
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| CoreError::DecodingError(format!("invalid base32 character {:?}", c as char)))?;
        buffer = (buffer << 5) | value as u64;
        bits_in_buffer += 5;

        if bits_in_buffer >= 8 {
            bits_in_buffer -= 8;
            result.push((buffer >> bits_in_buffer) as u8);
        }
    }

    // Trailing bits are padding and must be zero.
    if bits_in_buffer >= 5 || buffer & ((1u64 << bits_in_buffer) - 1) != 0 {
        return Err(CoreError::DecodingError("non-canonical base32 padding".into()));
    }

    Ok(result)
}

/// Base36 in the base-x style: big-endian positional, leading zero bytes
/// become leading `0` characters.
fn base36_encode(data: &[u8]) -> String {
    let zeros = data.iter().take_while(|&&b| b == 0).count();

    // Little-endian base-36 digits.
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 2);
    for &byte in &data[zeros..] {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            carry += u32::from(*digit) << 8;
            *digit = (carry % 36) as u8;
            carry /= 36;
        }
        while carry > 0 {
            digits.push((carry % 36) as u8);
            carry /= 36;
        }
    }

    let mut out = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        out.push(BASE36_LOWER[0] as char);
    }
    for &d in digits.iter().rev() {
        out.push(BASE36_LOWER[d as usize] as char);
    }
    out
}

fn base36_decode(input: &str) -> Result<Vec<u8>, CoreError> {
    let zeros = input.bytes().take_while(|&c| c == BASE36_LOWER[0]).count();

    // Little-endian bytes.
    let mut bytes: Vec<u8> = Vec::with_capacity(input.len());
    for c in input.bytes().skip(zeros) {
        let value = BASE36_LOWER
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| CoreError::DecodingError(format!("invalid base36 character {:?}", c as char)))?;
        let mut carry = value as u32;
        for byte in bytes.iter_mut() {
            carry += u32::from(*byte) * 36;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}

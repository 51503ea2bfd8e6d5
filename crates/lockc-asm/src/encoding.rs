//! Constant-pool value encodings shared by the assembler and the loader.
//!
//! Integers are plain 64-bit two's complement, big-endian. Doubles use a
//! custom, non-IEEE754 layout: one sign bit, an 11-bit decimal exponent
//! (how many digits follow the source literal's decimal point) and a
//! 52-bit integer mantissa, so `3.14` round-trips as exactly `314` scaled
//! by `10^-2` instead of through binary floating point. Strings are UTF-8
//! bytes followed by a NUL terminator (the original used `ord()` per
//! `char`, which only ever covered Latin-1 text).

use lockc_util::LocksError;

pub const TAG_INTEGER: u8 = 0x3;
pub const TAG_DOUBLE: u8 = 0x6;
pub const TAG_STRING: u8 = 0x8;

pub fn encode_integer(i: i64) -> [u8; 8] {
    (i as u64).to_be_bytes()
}

pub fn decode_integer(bytes: &[u8]) -> i64 {
    u64::from_be_bytes(bytes.try_into().expect("8 bytes")) as i64
}

/// `text` is the literal as written in source (e.g. `"3.14"` or
/// `"-0.5"`), the same text the lexer preserved for the double literal
/// that was folded into this constant.
pub fn encode_double_literal(text: &str) -> Result<[u8; 8], LocksError> {
    let (sign, digits_text) = match text.strip_prefix('-') {
        Some(rest) => (1u64, rest),
        None => (0u64, text),
    };
    let dot = digits_text
        .find('.')
        .ok_or_else(|| LocksError::invalid_bytecode(format!("double constant '{text}' has no decimal point")))?;
    let exp = (digits_text.len() - dot - 1) as u64;
    let digits: String = digits_text.chars().filter(|c| *c != '.').collect();
    let mantissa: u64 = digits
        .parse()
        .map_err(|_| LocksError::invalid_bytecode(format!("double constant '{text}' is not numeric")))?;
    let bits = (sign << 63) | (exp << 52) | mantissa;
    Ok(bits.to_be_bytes())
}

pub fn decode_double(bytes: &[u8]) -> f64 {
    let sign = (bytes[0] & 0b1000_0000) >> 7;
    let exp = (((bytes[0] as u16) << 8 | bytes[1] as u16) & 0x7ff0) >> 4;
    let mantissa: u64 = ((bytes[1] as u64 & 0x0f) << 48)
        | ((bytes[2] as u64) << 40)
        | ((bytes[3] as u64) << 32)
        | ((bytes[4] as u64) << 24)
        | ((bytes[5] as u64) << 16)
        | ((bytes[6] as u64) << 8)
        | (bytes[7] as u64);
    let d = mantissa as f64 / 10f64.powi(exp as i32);
    if sign == 1 {
        -d
    } else {
        d
    }
}

//! Tryte alphabet and balanced-ternary conversions.
//!
//! A tryte is three balanced trits (`-1`, `0`, `1`), least significant trit
//! first, giving values in `-13..=13`. The alphabet maps index 0 to value 0
//! (`9`), indices 1..=13 to 1..=13 and indices 14..=26 to -13..=-1.

use crate::errors::CodecError;

/// The tryte alphabet, indexed by tryte value modulo 27.
pub const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of trits per tryte.
pub const TRITS_PER_TRYTE: usize = 3;

/// Validate that every byte of `input` belongs to the alphabet.
pub fn validate(input: &str) -> Result<(), CodecError> {
    match input.char_indices().find(|(_, c)| !is_tryte(*c)) {
        Some((position, found)) => Err(CodecError::InvalidTryte { found, position }),
        None => Ok(()),
    }
}

/// Whether `c` is a tryte symbol.
pub fn is_tryte(c: char) -> bool {
    c == '9' || c.is_ascii_uppercase()
}

/// Signed value of a tryte symbol. The caller guarantees `symbol` is valid.
pub fn tryte_value(symbol: u8) -> i8 {
    let index = if symbol == b'9' { 0 } else { symbol - b'A' + 1 };
    if index <= 13 {
        index as i8
    } else {
        index as i8 - 27
    }
}

/// Symbol for a tryte value in `-13..=13`.
pub fn tryte_symbol(value: i8) -> u8 {
    TRYTE_ALPHABET[value.rem_euclid(27) as usize]
}

/// Symbol for an arbitrary byte, reducing it into the alphabet.
pub fn symbol_from_byte(byte: u8) -> u8 {
    TRYTE_ALPHABET[(byte % 27) as usize]
}

/// Expand trytes into balanced trits, least significant first.
pub fn trits(trytes: &[u8]) -> Vec<i8> {
    let mut out = Vec::with_capacity(trytes.len() * TRITS_PER_TRYTE);
    for &symbol in trytes {
        let mut value = tryte_value(symbol);
        for _ in 0..TRITS_PER_TRYTE {
            let mut trit = value.rem_euclid(3);
            if trit == 2 {
                trit = -1;
            }
            out.push(trit);
            value = (value - trit) / 3;
        }
    }
    out
}

/// Encode a signed integer as `width` trytes.
pub fn encode_i64(value: i64, width: usize) -> Vec<u8> {
    let negative = value < 0;
    let mut magnitude = value.unsigned_abs() as u128;
    let mut trits = vec![0i8; width * TRITS_PER_TRYTE];
    for trit in trits.iter_mut() {
        if magnitude == 0 {
            break;
        }
        let mut remainder = (magnitude % 3) as i8;
        magnitude /= 3;
        if remainder == 2 {
            remainder = -1;
            magnitude += 1;
        }
        *trit = if negative { -remainder } else { remainder };
    }
    trits
        .chunks(TRITS_PER_TRYTE)
        .map(|chunk| tryte_symbol(chunk[0] + chunk[1] * 3 + chunk[2] * 9))
        .collect()
}

/// Decode a signed integer from trytes.
pub fn decode_i64(trytes: &[u8], field: &'static str) -> Result<i64, CodecError> {
    let mut acc: i128 = 0;
    for &trit in trits(trytes).iter().rev() {
        acc = acc
            .checked_mul(3)
            .and_then(|v| v.checked_add(trit as i128))
            .ok_or(CodecError::ValueOutOfRange { field })?;
        if acc.unsigned_abs() > i64::MAX as u128 {
            return Err(CodecError::ValueOutOfRange { field });
        }
    }
    Ok(acc as i64)
}

//! Order-preserving text encoding of ranks.
//!
//! SQLite has no arbitrary-precision decimal type, so ranks are stored twice:
//! as canonical decimal text and as a `sort_key` whose byte order matches
//! numeric order. That keeps `ORDER BY sort_key` and `sort_key > ?` range
//! scans on the index correct.
//!
//! Layout:
//!
//! ```text
//! non-negative:  'p' LLL <int digits> ['.' <frac digits>]
//! negative:      'n' (999 - LLL) <9-complement int> '.' <9-complement frac> '~'
//! ```
//!
//! `LLL` is the zero-padded count of integer digits (leading zeros stripped,
//! so zero has no integer digits). Fractional digits never carry trailing
//! zeros. The trailing `~` sorts above every digit, so a shorter negative
//! fraction (smaller magnitude) sorts after a longer one that shares its
//! prefix.

use crate::error::RankError;
use crate::rank::Rank;

const MAX_INTEGER_DIGITS: usize = 999;

/// Encode `rank` so that byte-wise comparison matches numeric comparison.
///
/// # Errors
///
/// Returns [`RankError::InvalidRank`] if the integer part has more than 999
/// digits.
pub fn encode(rank: &Rank) -> Result<String, RankError> {
    let plain = rank.to_plain_string();
    let (negative, magnitude) = plain
        .strip_prefix('-')
        .map_or((false, plain.as_str()), |rest| (true, rest));
    let (int_part, frac_part) = magnitude.split_once('.').unwrap_or((magnitude, ""));
    let int_part = int_part.trim_start_matches('0');

    if int_part.len() > MAX_INTEGER_DIGITS {
        return Err(RankError::InvalidRank(plain));
    }

    let mut key = String::with_capacity(int_part.len() + frac_part.len() + 6);
    if negative {
        key.push('n');
        key.push_str(&format!("{:03}", MAX_INTEGER_DIGITS - int_part.len()));
        key.extend(int_part.chars().map(complement));
        key.push('.');
        key.extend(frac_part.chars().map(complement));
        key.push('~');
    } else {
        key.push('p');
        key.push_str(&format!("{:03}", int_part.len()));
        key.push_str(int_part);
        if !frac_part.is_empty() {
            key.push('.');
            key.push_str(frac_part);
        }
    }
    Ok(key)
}

fn complement(digit: char) -> char {
    match digit {
        '0' => '9',
        '1' => '8',
        '2' => '7',
        '3' => '6',
        '4' => '5',
        '5' => '4',
        '6' => '3',
        '7' => '2',
        '8' => '1',
        '9' => '0',
        other => other,
    }
}

//! Mod-10 (Luhn) check digit validation for order numbers.
//!
//! Order numbers are opaque digit strings of any length. They are never converted to integers, so leading zeros are
//! significant and there is no numeric range limit.

/// Returns true if `number` is a non-empty string of ASCII digits whose Luhn checksum is divisible by 10.
pub fn is_luhn_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    luhn_sum(number.bytes().rev()) == 0
}

/// Calculates the digit that must be appended to `payload` to make it Luhn-valid. Returns `None` if the payload
/// contains anything other than ASCII digits.
pub fn luhn_check_digit(payload: &str) -> Option<char> {
    if !payload.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // A zero placeholder puts the payload digits into the positions they will occupy once the check digit is appended
    let sum = luhn_sum(std::iter::once(b'0').chain(payload.bytes().rev()));
    let digit = (10 - sum) % 10;
    char::from_digit(digit, 10)
}

// Digits must be supplied rightmost first. The result is the checksum modulo 10.
fn luhn_sum<I: Iterator<Item = u8>>(digits_from_right: I) -> u32 {
    digits_from_right.enumerate().fold(0, |acc, (i, b)| {
        let d = u32::from(b - b'0');
        let d = if i % 2 == 1 {
            let doubled = d * 2;
            if doubled > 9 {
                doubled - 9
            } else {
                doubled
            }
        } else {
            d
        };
        (acc + d) % 10
    })
}

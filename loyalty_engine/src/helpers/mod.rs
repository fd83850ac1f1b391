mod luhn;

pub use luhn::{is_luhn_valid, luhn_check_digit};

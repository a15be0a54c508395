//! Phone numbers are compared and stored in one canonical form: digits only,
//! with the Tanzanian country code in front.

pub const COUNTRY_CODE: &str = "255";

/// Normalizes a phone number.
///
/// * everything except digits is dropped (`+`, spaces, dashes)
/// * a leading `0` is replaced with the country code
/// * a number without the country code gets it prepended
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        digits
    } else if digits.starts_with('0') {
        format!("{}{}", COUNTRY_CODE, &digits[1..])
    } else if digits.starts_with(COUNTRY_CODE) {
        digits
    } else {
        format!("{}{}", COUNTRY_CODE, digits)
    }
}

/// Ownership check used by coupon validation
pub fn same_phone(left: &str, right: &str) -> bool {
    normalize_phone(left) == normalize_phone(right)
}

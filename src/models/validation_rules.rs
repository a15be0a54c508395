use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;
use validator::ValidationError;

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    lazy_static! {
        static ref PHONE_VALIDATION_RE: Regex = Regex::new(r"^\+?\d{7}\d*$").unwrap();
    }

    let compact: String = phone.chars().filter(|c| *c != ' ' && *c != '-').collect();

    if PHONE_VALIDATION_RE.is_match(&compact) {
        Ok(())
    } else {
        Err(ValidationError {
            code: Cow::from("phone"),
            message: Some(Cow::from("Incorrect phone format")),
            params: HashMap::new(),
        })
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError {
            code: Cow::from("value"),
            message: Some(Cow::from("Value must not be blank.")),
            params: HashMap::new(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_rules() {
        assert!(validate_phone("0712345678").is_ok());
        assert!(validate_phone("+255 712 345 678").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("07123abc78").is_err());
    }
}

// src/validation.rs

use actix_web::HttpResponse;
use regex::Regex;
use std::sync::OnceLock;
use validator::{ValidationError, ValidationErrors};

fn telefone_regex() -> &'static Regex {
    static TELEFONE_RE: OnceLock<Regex> = OnceLock::new();
    TELEFONE_RE.get_or_init(|| Regex::new(r"^[0-9+\-\s()]+$").expect("telefone regex"))
}

/// Form rule for phone numbers: digits plus the usual punctuation. An empty
/// value is allowed, the field is optional on every form.
pub fn validate_telefone(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || telefone_regex().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("telefone")
            .with_message("Número de telefone inválido.".into()))
    }
}

/// 400 with the per-field messages, the API analog of the form's inline
/// validation errors.
pub fn validation_error_response(errors: ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "errors": errors }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telefone_accepts_digits_and_punctuation() {
        assert!(validate_telefone("+258 84 123 4567").is_ok());
        assert!(validate_telefone("(21) 480-112").is_ok());
        assert!(validate_telefone("").is_ok());
    }

    #[test]
    fn telefone_rejects_letters() {
        assert!(validate_telefone("84 abc 123").is_err());
        assert!(validate_telefone("oitocentos").is_err());
    }
}

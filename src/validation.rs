use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult, FieldError};

/// Treats an explicit JSON `null` like an absent key, so the value still reaches validation.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Collects every failing field before reporting, so callers see them all at once.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    pub fn required(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is required")
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            return self.check(false, field, "is required");
        }
        self.check(is_email(value), field, "must be a valid email address")
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn finish(&mut self) -> AppResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "null_as_default")]
        count: i64,
    }

    #[test]
    fn null_reads_as_the_default() {
        let form: Form = serde_json::from_str(r#"{"name":null,"count":null}"#).expect("form");
        assert_eq!(form.name, "");
        assert_eq!(form.count, 0);

        let form: Form = serde_json::from_str(r#"{"name":"Fern","count":3}"#).expect("form");
        assert_eq!(form.name, "Fern");
        assert_eq!(form.count, 3);

        let form: Form = serde_json::from_str("{}").expect("form");
        assert_eq!(form.name, "");
    }

    #[test]
    fn collects_all_failures() {
        let mut v = Validator::new();
        v.required("name", " ")
            .email("email", "nope")
            .check(false, "total", "must be positive");
        let Err(AppError::Validation(fields)) = v.finish() else {
            panic!("expected validation error");
        };
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["name", "email", "total"]);
    }

    #[test]
    fn passes_when_clean() {
        let mut v = Validator::new();
        v.required("name", "Tomato").email("email", "a@b.co");
        assert!(v.finish().is_ok());
    }

    #[test]
    fn email_shapes() {
        assert!(is_email("grower@example.com"));
        assert!(!is_email("grower@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a@@example.com"));
        assert!(!is_email("a b@example.com"));
        assert_eq!(normalize_email("  Grower@Example.COM "), "grower@example.com");
    }
}

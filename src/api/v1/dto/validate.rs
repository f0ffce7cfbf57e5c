//! Field checks shared by the DTOs. Each returns the user-facing message on failure.

pub(crate) fn required<'a>(value: &'a str, message: &'static str) -> Result<&'a str, &'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(message)
    } else {
        Ok(trimmed)
    }
}

pub(crate) fn optional_non_empty(value: Option<&str>, message: &'static str) -> Result<(), &'static str> {
    match value {
        Some(v) if v.trim().is_empty() => Err(message),
        _ => Ok(()),
    }
}

/// Shape check only: `local@domain.tld`, no whitespace.
pub(crate) fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        }
        None => false,
    }
}

/// At least 8 chars with a lowercase letter, an uppercase letter and a digit.
pub(crate) fn password(value: &str) -> Result<(), &'static str> {
    if value.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    let lower = value.chars().any(|c| c.is_ascii_lowercase());
    let upper = value.chars().any(|c| c.is_ascii_uppercase());
    let digit = value.chars().any(|c| c.is_ascii_digit());
    if !(lower && upper && digit) {
        return Err(
            "Password must contain at least one lowercase letter, one uppercase letter, and one number",
        );
    }
    Ok(())
}

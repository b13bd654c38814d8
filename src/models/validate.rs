//! Field checks done before anything is sent to the database.
use super::Slug;
use crate::error::Error;
use lazy_regex::regex_is_match;

pub fn max_len(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), Error> {
    if value.chars().count() > max {
        Err(Error::invalid(field, format!("at most {max} characters")))
    } else {
        Ok(())
    }
}

pub fn not_blank(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        Err(Error::invalid(field, "may not be blank"))
    } else {
        Ok(())
    }
}

/// A required text field with a length limit.
pub fn text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), Error> {
    not_blank(field, value)?;
    max_len(field, value, max)
}

pub fn slug(field: &'static str, value: &Slug, max: usize) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::invalid(field, "needs a letter or digit"));
    }
    max_len(field, value, max)
}

pub fn email(field: &'static str, value: &str) -> Result<(), Error> {
    max_len(field, value, 254)?;
    if regex_is_match!(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$",
        value
    ) {
        Ok(())
    } else {
        Err(Error::invalid(field, "not a valid email address"))
    }
}

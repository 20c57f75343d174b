//! One validation routine for every operation, driven by the schemas in
//! [`crate::endpoints`]. Runs before anything is signed or sent.

use crate::endpoints::{EndpointDescriptor, ParamSpec, Rule};
use crate::{Error, Result};

/// Check path ids and named parameters against `descriptor`.
pub fn validate(descriptor: &EndpointDescriptor, ids: &[&str], params: &[(&str, &str)]) -> Result<()> {
    if ids.len() != descriptor.path_ids.len() {
        return Err(Error::invalid_parameter(
            "resource ids",
            format!(
                "{} expects {} but got {}",
                descriptor.name,
                descriptor.path_ids.len(),
                ids.len()
            ),
        ));
    }
    for (spec, value) in descriptor.path_ids.iter().zip(ids) {
        check(spec, value)?;
    }
    for (name, value) in params {
        let spec = descriptor.param(name).ok_or_else(|| {
            Error::invalid_parameter(*name, format!("is not accepted by {}", descriptor.name))
        })?;
        check(spec, value)?;
    }
    if let Some(missing) = descriptor
        .params
        .iter()
        .find(|spec| spec.required && !params.iter().any(|(name, _)| *name == spec.name))
    {
        return Err(Error::invalid_parameter(
            missing.name,
            "cannot be None or empty",
        ));
    }
    Ok(())
}

fn check(spec: &ParamSpec, value: &str) -> Result<()> {
    let invalid = |reason: String| -> Result<()> { Err(Error::invalid_parameter(spec.name, reason)) };
    if value.is_empty() {
        return invalid("cannot be None or empty".into());
    }
    match spec.rule {
        Rule::Identifier => match parse_integer(value) {
            Some(n) if n > 0 => Ok(()),
            Some(n) if n < 0 => invalid("cannot be negative".into()),
            Some(_) => invalid("must be a positive integer".into()),
            None => invalid(format!("must be a positive integer, got {:?}", value)),
        },
        Rule::NonNegative => non_negative(spec, value),
        Rule::OneOf(allowed) => {
            if allowed.contains(&value) {
                Ok(())
            } else {
                invalid(format!("must be one of {}, got {:?}", allowed.join(", "), value))
            }
        }
        Rule::SubsetOf(allowed) => match value.split('|').find(|item| !allowed.contains(item)) {
            None => Ok(()),
            Some(item) => invalid(format!(
                "must be {} joined by '|', got {:?}",
                allowed.join(", "),
                item
            )),
        },
        Rule::IdList(separator) => value
            .split(separator)
            .try_for_each(|item| non_negative(spec, item)),
        Rule::Text => Ok(()),
    }
}

fn non_negative(spec: &ParamSpec, value: &str) -> Result<()> {
    match parse_integer(value) {
        Some(n) if n >= 0 => Ok(()),
        Some(_) => Err(Error::invalid_parameter(spec.name, "cannot be negative")),
        None => Err(Error::invalid_parameter(
            spec.name,
            format!("must be a non-negative integer, got {:?}", value),
        )),
    }
}

/// Plain decimal only: an optional `-` then ASCII digits. The value is put
/// into urls verbatim, so anything `str::parse` would normalise is refused.
fn parse_integer(value: &str) -> Option<i128> {
    let digits = value.strip_prefix('-').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<i128>().ok()
}

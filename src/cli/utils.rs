use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::filter::{FilterCriterion, FilterValue};

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            print_json(&response)?;
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            print_json(&response)?;
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => print_json(&json!({ collection_name: [] })),
        OutputFormat::Text => {
            println!("{}", message);
            Ok(())
        }
    }
}

/// Parse `ID=value`, `ID=from..to`, `ID=from..` or `ID=..to` into a criterion
pub fn parse_filter_spec(spec: &str) -> Result<FilterCriterion, String> {
    let (id, rest) = spec
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got '{}'", spec))?;
    let filter_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| format!("filter id must be an integer, got '{}'", id))?;

    let value = match rest.split_once("..") {
        Some((from, to)) => {
            let (from, to) = (non_empty(from), non_empty(to));
            if from.is_none() && to.is_none() {
                return Err(format!("range for filter {} needs at least one bound", filter_id));
            }
            FilterValue::range(from, to)
        }
        None => {
            let value = non_empty(rest).ok_or_else(|| format!("empty value for filter {}", filter_id))?;
            FilterValue::exact(value)
        }
    };

    Ok(FilterCriterion { filter_id, value })
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s.trim()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_spec() {
        assert_eq!(parse_filter_spec("2=north").unwrap(), FilterCriterion::exact(2, "north"));
    }

    #[test]
    fn range_specs() {
        assert_eq!(parse_filter_spec("1=18..25").unwrap(), FilterCriterion::range(1, Some("18"), Some("25")));
        assert_eq!(parse_filter_spec("1=18..").unwrap(), FilterCriterion::range(1, Some("18"), None));
        assert_eq!(
            parse_filter_spec("3=..2020-01-01").unwrap(),
            FilterCriterion::range(3, None, Some("2020-01-01"))
        );
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(parse_filter_spec("north").is_err());
        assert!(parse_filter_spec("x=north").is_err());
        assert!(parse_filter_spec("1=").is_err());
        assert!(parse_filter_spec("1=..").is_err());
    }
}

//! Transform application logic

use crate::import::reader::{Cell, Row};
use crate::import::types::{Fallback, LookupRef, Transform, Value};

/// Apply a transform to a source row
///
/// Never fails: unparsable cells fall back to the transform's default and
/// unknown labels to the value map's fallback.
pub fn apply_transform(transform: &Transform, row: &Row) -> Value {
    match transform {
        Transform::Copy { column } => row.text(column).map_or(Value::Null, Value::String),

        Transform::Constant { value } => value.clone(),

        Transform::Number { column, default } => {
            Value::Float(parse_number(row.get(column)).unwrap_or(*default))
        }

        Transform::Integer { column, default } => {
            Value::Int(parse_integer(row.get(column)).unwrap_or(*default))
        }

        Transform::Boolean { column, default } => {
            Value::Bool(parse_bool(row.get(column)).unwrap_or(*default))
        }

        Transform::ValueMap {
            column,
            mappings,
            fallback,
        } => {
            let source = row.text(column);
            if let Some(text) = &source {
                if let Some(entry) = mappings.iter().find(|m| m.from.trim().eq_ignore_ascii_case(text)) {
                    return entry.to.clone();
                }
                log::debug!("No mapping for '{}' in column '{}', using {}", text, column, fallback);
            }
            apply_fallback(fallback, source)
        }

        Transform::Lookup {
            column,
            lookup,
            required,
        } => match row.text(column) {
            Some(name) => Value::Lookup(LookupRef {
                lookup: lookup.clone(),
                name,
                required: *required,
            }),
            None => Value::Null,
        },
    }
}

/// Apply fallback behavior when no value map entry matches
fn apply_fallback(fallback: &Fallback, source: Option<String>) -> Value {
    match fallback {
        Fallback::Default { value } => value.clone(),
        Fallback::PassThrough => source.map_or(Value::Null, Value::String),
        Fallback::Null => Value::Null,
    }
}

fn parse_number(cell: Option<&Cell>) -> Option<f64> {
    match cell? {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn parse_integer(cell: Option<&Cell>) -> Option<i64> {
    match cell? {
        Cell::Text(s) if s.trim().parse::<i64>().is_ok() => s.trim().parse().ok(),
        other => parse_number(Some(other))
            .filter(|n| n.fract() == 0.0)
            .map(|n| n as i64),
    }
}

fn parse_bool(cell: Option<&Cell>) -> Option<bool> {
    match cell? {
        Cell::Bool(b) => Some(*b),
        Cell::Number(n) => Some(*n != 0.0),
        Cell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "x" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        Cell::Empty => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(1, pairs)
    }

    #[test]
    fn test_apply_copy_trims_and_nulls_blank() {
        let r = row(&[("Name", "  Widget "), ("Code", "  ")]);
        assert_eq!(apply_transform(&Transform::copy("Name"), &r), Value::String("Widget".into()));
        assert_eq!(apply_transform(&Transform::copy("Code"), &r), Value::Null);
        assert_eq!(apply_transform(&Transform::copy("Missing"), &r), Value::Null);
    }

    #[test]
    fn test_malformed_number_is_zero() {
        let r = row(&[("Cost", "twelve"), ("Price", ""), ("Qty", "3.5")]);
        assert_eq!(apply_transform(&Transform::number("Cost"), &r), Value::Float(0.0));
        assert_eq!(apply_transform(&Transform::number("Price"), &r), Value::Float(0.0));
        assert_eq!(apply_transform(&Transform::number("Qty"), &r), Value::Float(3.5));
    }

    #[test]
    fn test_integer_default() {
        let r = row(&[("Lead", "abc"), ("Days", "7"), ("Float", "4.0")]);
        let lead = Transform::Integer {
            column: "Lead".into(),
            default: 1,
        };
        let days = Transform::Integer {
            column: "Days".into(),
            default: 1,
        };
        let float = Transform::Integer {
            column: "Float".into(),
            default: 1,
        };
        assert_eq!(apply_transform(&lead, &r), Value::Int(1));
        assert_eq!(apply_transform(&days, &r), Value::Int(7));
        assert_eq!(apply_transform(&float, &r), Value::Int(4));
    }

    #[test]
    fn test_boolean() {
        let r = row(&[("Buy", "TRUE"), ("Sell", "false"), ("Other", "maybe")]);
        let flag = |column: &str| Transform::Boolean {
            column: column.into(),
            default: true,
        };
        assert_eq!(apply_transform(&flag("Buy"), &r), Value::Bool(true));
        assert_eq!(apply_transform(&flag("Sell"), &r), Value::Bool(false));
        assert_eq!(apply_transform(&flag("Other"), &r), Value::Bool(true));
        assert_eq!(apply_transform(&flag("Missing"), &r), Value::Bool(true));
    }

    #[test]
    fn test_value_map_match_is_case_insensitive() {
        let transform = Transform::value_map(
            "Product Type",
            &[("Storable Product", "product"), ("Consumable", "consu")],
            Fallback::Default {
                value: Value::from("product"),
            },
        );
        let r = row(&[("Product Type", "consumable")]);
        assert_eq!(apply_transform(&transform, &r), Value::from("consu"));
    }

    #[test]
    fn test_value_map_fallbacks() {
        let r = row(&[("Tracking", "By Pallet")]);
        let with = |fallback| Transform::value_map("Tracking", &[("By Lots", "lot")], fallback);

        assert_eq!(
            apply_transform(
                &with(Fallback::Default {
                    value: Value::from("none")
                }),
                &r
            ),
            Value::from("none")
        );
        assert_eq!(apply_transform(&with(Fallback::PassThrough), &r), Value::from("By Pallet"));
        assert_eq!(apply_transform(&with(Fallback::Null), &r), Value::Null);
    }

    #[test]
    fn test_lookup_reference() {
        let r = row(&[("Vendor", "Acme Industrial")]);
        let value = apply_transform(&Transform::lookup("Vendor", "partner", true), &r);
        let lookup = value.as_lookup().unwrap();
        assert_eq!(lookup.name, "Acme Industrial");
        assert!(lookup.required);

        let blank = row(&[("Vendor", "")]);
        assert!(apply_transform(&Transform::lookup("Vendor", "partner", true), &blank).is_null());
    }

    #[test]
    fn test_spreadsheet_cells() {
        let r = Row::new(
            1,
            vec![
                ("Cost".into(), Cell::Number(2.25)),
                ("Buy".into(), Cell::Bool(false)),
            ],
        );
        assert_eq!(apply_transform(&Transform::number("Cost"), &r), Value::Float(2.25));
        let buy = Transform::Boolean {
            column: "Buy".into(),
            default: true,
        };
        assert_eq!(apply_transform(&buy, &r), Value::Bool(false));
    }
}

//! Value typing for `name = value` lines.
//!
//! Param files carry no type information, so the JSON type is inferred from
//! the text: a number, then a three-component vector, and a string when
//! neither fits.

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use serde_json::Value;
use tracing::trace;

use super::Dialect;

/// A field value after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A whole number, held as its rendered literal
    Integer(String),
    /// Any other number
    Float(f64),
    /// Exactly three numeric components, held as their literals
    Vector([String; 3]),
    /// Untyped fallback
    Text(String),
}

type Attempt = fn(&str, Dialect) -> Option<ParamValue>;

/// Inference attempts in priority order; the first success wins.
const ATTEMPTS: &[Attempt] = &[as_number, as_vector];

impl ParamValue {
    /// Infer the type of the raw text to the right of `=`.
    pub fn infer(raw: &str, dialect: Dialect) -> Self {
        let text = raw.trim();
        let value = ATTEMPTS
            .iter()
            .find_map(|attempt| attempt(text, dialect))
            .unwrap_or_else(|| ParamValue::Text(text.to_string()));
        trace!("{:?} typed as {}", text, value.kind());
        value
    }

    /// Render the value as it appears after the field name.
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            ParamValue::Integer(literal) => literal.clone(),
            ParamValue::Float(value) => match dialect {
                Dialect::Strict => format!("{}", value),
                Dialect::Legacy => python_float(*value),
            },
            ParamValue::Vector([x, y, z]) => format!("[{}, {}, {} ]", x, y, z),
            ParamValue::Text(text) => match dialect {
                Dialect::Strict => Value::from(text.as_str()).to_string(),
                Dialect::Legacy => format!("\"{}\"", text),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Integer(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Vector(_) => "vector",
            ParamValue::Text(_) => "string",
        }
    }
}

fn parse_number(text: &str, dialect: Dialect) -> Option<f64> {
    let value = text.parse::<f64>().ok()?;
    // inf and nan parse, but have no JSON spelling
    if dialect == Dialect::Strict && !value.is_finite() {
        return None;
    }
    Some(value)
}

fn as_number(text: &str, dialect: Dialect) -> Option<ParamValue> {
    let value = parse_number(text, dialect)?;
    Some(number_value(value))
}

fn number_value(value: f64) -> ParamValue {
    if value.is_finite() && value.fract() == 0.0 {
        // exact binary value: 1e23 is 99999999999999991611392, -0.0 is 0
        let literal = BigInt::from_f64(value)
            .map_or_else(|| format!("{}", value), |whole| whole.to_string());
        ParamValue::Integer(literal)
    } else {
        ParamValue::Float(value)
    }
}

fn as_vector(text: &str, dialect: Dialect) -> Option<ParamValue> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [x, y, z] = tokens.as_slice() else {
        return None;
    };
    Some(ParamValue::Vector([
        component(x, dialect)?,
        component(y, dialect)?,
        component(z, dialect)?,
    ]))
}

/// Components keep their source spelling unless strict output needs a valid
/// JSON number literal instead (`1.`, `+2`, `.5`).
fn component(token: &str, dialect: Dialect) -> Option<String> {
    let value = parse_number(token, dialect)?;
    if dialect == Dialect::Legacy || is_json_number(token) {
        return Some(token.to_string());
    }
    Some(number_value(value).render(dialect))
}

fn is_json_number(token: &str) -> bool {
    serde_json::from_str::<serde_json::Number>(token).is_ok()
}

/// Shortest round-trip digits, switching to exponent form outside
/// `1e-4 <= |value| < 1e16` with at least two exponent digits (`1.5e-07`).
fn python_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let scientific = format!("{:e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&exponent) {
        format!("{}", value)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("3", "3")]
    #[case(" 10 ", "10")]
    #[case("3.5", "3.5")]
    #[case("1e3", "1000")]
    #[case("2.50", "2.5")]
    #[case("-0", "0")]
    #[case("-4", "-4")]
    #[case("0.001", "0.001")]
    #[case("1e23", "99999999999999991611392")]
    #[case("1 2 3", "[1, 2, 3 ]")]
    #[case("0.0 0.0 0.0", "[0.0, 0.0, 0.0 ]")]
    #[case("-1e-3 2 3.25", "[-1e-3, 2, 3.25 ]")]
    #[case("hello world", "\"hello world\"")]
    #[case("1 2", "\"1 2\"")]
    #[case("1 2 3 4", "\"1 2 3 4\"")]
    #[case("1 two 3", "\"1 two 3\"")]
    #[case("", "\"\"")]
    fn test_inference_matches_in_both_dialects(#[case] raw: &str, #[case] expected: &str) {
        for dialect in [Dialect::Strict, Dialect::Legacy] {
            assert_eq!(ParamValue::infer(raw, dialect).render(dialect), expected);
        }
    }

    #[rstest]
    #[case("1e-10", "1e-10")]
    #[case("1.5e-7", "1.5e-07")]
    #[case("-2.5e-5", "-2.5e-05")]
    #[case("0.00012", "0.00012")]
    #[case("123.456", "123.456")]
    fn test_legacy_floats_use_exponent_form(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(ParamValue::infer(raw, Dialect::Legacy).render(Dialect::Legacy), expected);
    }

    #[test]
    fn test_strict_floats_use_plain_digits() {
        assert_eq!(
            ParamValue::infer("1.5e-7", Dialect::Strict).render(Dialect::Strict),
            "0.00000015"
        );
    }

    #[rstest]
    #[case("3", "integer")]
    #[case("3.5", "float")]
    #[case("1 2 3", "vector")]
    #[case("ensight/out", "string")]
    fn test_kind(#[case] raw: &str, #[case] kind: &str) {
        assert_eq!(ParamValue::infer(raw, Dialect::Strict).kind(), kind);
    }

    #[test]
    fn test_non_finite_numbers_are_strings_in_strict_output() {
        assert_eq!(
            ParamValue::infer("inf", Dialect::Strict),
            ParamValue::Text("inf".to_string())
        );
        assert_eq!(ParamValue::infer("nan", Dialect::Strict).render(Dialect::Strict), "\"nan\"");
        assert_eq!(ParamValue::infer("inf", Dialect::Legacy).render(Dialect::Legacy), "inf");
        assert_eq!(ParamValue::infer("nan", Dialect::Legacy).render(Dialect::Legacy), "nan");
    }

    #[test]
    fn test_vector_components_become_valid_json_in_strict_output() {
        let value = ParamValue::infer("1. +2 .5", Dialect::Strict);
        assert_eq!(value.render(Dialect::Strict), "[1, 2, 0.5 ]");

        let value = ParamValue::infer("1. +2 .5", Dialect::Legacy);
        assert_eq!(value.render(Dialect::Legacy), "[1., +2, .5 ]");
    }

    #[test]
    fn test_embedded_quotes_are_escaped_only_in_strict_output() {
        let value = ParamValue::infer("say \"hi\"", Dialect::Strict);
        assert_eq!(value.render(Dialect::Strict), r#""say \"hi\"""#);
        assert_eq!(value.render(Dialect::Legacy), r#""say "hi"""#);
    }
}

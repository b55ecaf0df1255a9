//! JSON parameter parsing.

use eyre::{eyre, WrapErr};
use serde_json::{Number, Value as Json};
use sqlkit_db::{Param, Params};

/// Maps a JSON value onto the dynamic host value it stands for.
///
/// Integer literals keep their exact value so that out-of-range integers are
/// reported instead of rounded to a float.
///
/// # Errors
///
/// Fails for an integer literal too wide to be represented at all.
pub fn to_param(value: Json) -> eyre::Result<Param> {
    Ok(match value {
        Json::Null => Param::Null,
        Json::Bool(v) => Param::Bool(v),
        Json::Number(n) => number(&n)?,
        Json::String(s) => Param::Text(s),
        Json::Array(items) => {
            Param::List(items.into_iter().map(to_param).collect::<eyre::Result<_>>()?)
        }
        Json::Object(map) => Param::Map(
            map.into_iter()
                .map(|(k, v)| to_param(v).map(|p| (k, p)))
                .collect::<eyre::Result<_>>()?,
        ),
    })
}

/// Reads a number from its literal text (`arbitrary_precision` keeps it).
fn number(n: &Number) -> eyre::Result<Param> {
    let text = n.to_string();
    let digits = text.strip_prefix('-').unwrap_or(&text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return text
            .parse::<i128>()
            .map(Param::Integer)
            .wrap_err_with(|| format!("integer {text} does not fit in a 64-bit signed integer"));
    }
    n.as_f64()
        .map(Param::Real)
        .ok_or_else(|| eyre!("number {text} is not a finite float"))
}

/// Builds [`Params`] from repeated `--param` values or a `--batch` array.
pub fn parse_params(params: &[String], batch: Option<&str>) -> eyre::Result<Params> {
    if let Some(batch) = batch {
        let value: Json = serde_json::from_str(batch).wrap_err("--batch is not valid JSON")?;
        return Ok(Params::from_host(to_param(value)?)?);
    }
    if params.is_empty() {
        return Ok(Params::None);
    }
    let values = params
        .iter()
        .map(|raw| {
            let value: Json = serde_json::from_str(raw)
                .wrap_err_with(|| format!("--param {raw:?} is not valid JSON"))?;
            to_param(value)
        })
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok(Params::Single(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_param_numbers() {
        assert_eq!(to_param(json!(-3)).expect("int"), Param::Integer(-3));
        assert_eq!(
            to_param(json!(u64::MAX)).expect("u64"),
            Param::Integer(i128::from(u64::MAX))
        );
        assert_eq!(to_param(json!(2.5)).expect("float"), Param::Real(2.5));
    }

    #[test]
    fn test_to_param_compound() {
        assert_eq!(
            to_param(json!([1, "a", null, true])).expect("list"),
            Param::List(vec![
                Param::Integer(1),
                Param::Text("a".into()),
                Param::Null,
                Param::Bool(true),
            ])
        );
        assert!(matches!(to_param(json!({"k": 1})), Ok(Param::Map(ref m)) if m.len() == 1));
    }

    #[test]
    fn test_parse_params() {
        let single = parse_params(&["1".into(), "\"x\"".into()], None).expect("single");
        assert_eq!(
            single,
            Params::Single(vec![Param::Integer(1), Param::Text("x".into())])
        );

        let batch = parse_params(&[], Some("[[1], [2]]")).expect("batch");
        assert_eq!(
            batch,
            Params::Batch(vec![vec![Param::Integer(1)], vec![Param::Integer(2)]])
        );

        assert_eq!(parse_params(&[], None).expect("none"), Params::None);
        assert!(parse_params(&["not json".into()], None).is_err());
        assert!(parse_params(&[], Some("3")).is_err());
    }

    #[test]
    fn test_integers_beyond_u64_stay_integers() {
        let params = parse_params(&["18446744073709551616".into()], None).expect("parse");
        assert_eq!(
            params,
            Params::Single(vec![Param::Integer(i128::from(u64::MAX) + 1)])
        );
        assert_eq!(
            parse_params(&["-9223372036854775809".into()], None).expect("parse"),
            Params::Single(vec![Param::Integer(i128::from(i64::MIN) - 1)])
        );

        let wide = "1".repeat(40);
        let err = parse_params(&[wide], None).expect_err("wider than i128");
        assert!(err.to_string().contains("does not fit"), "{err}");
    }
}

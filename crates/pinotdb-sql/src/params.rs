use pinotdb_core::{PinotError, Result};
use std::collections::HashMap;

/// Named query parameters, referenced from a template as `%(name)s`.
pub type Params = HashMap<String, Param>;

/// A typed parameter value prior to escaping.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<Param>),
}

/// Build a [`Params`] map: `params! { "city" => "NYC", "limit" => 10 }`.
#[macro_export]
macro_rules! params {
    () => {
        $crate::params::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut params = $crate::params::Params::new();
        $(params.insert(($name).to_string(), $crate::params::Param::from($value));)+
        params
    }};
}

/// Render a parameter as a literal query-text fragment.
///
/// Text is single-quoted with embedded quotes doubled and nothing else
/// touched; a bare `*` is passed through as the column wildcard. Lists are
/// rendered element-wise and comma separated for `IN (...)` templates.
pub fn escape(value: &Param) -> Result<String> {
    match value {
        Param::Text(s) if s == "*" => Ok(s.clone()),
        Param::Text(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        Param::Number(n) => Ok(n.to_string()),
        Param::Bool(true) => Ok("TRUE".to_string()),
        Param::Bool(false) => Ok("FALSE".to_string()),
        Param::List(items) => {
            let escaped = items.iter().map(escape).collect::<Result<Vec<_>>>()?;
            Ok(escaped.join(", "))
        }
        Param::Null => Err(PinotError::Templating(
            "unsupported parameter type: null".into(),
        )),
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(v)
    }
}

impl From<&String> for Param {
    fn from(v: &String) -> Self {
        Param::Text(v.clone())
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

macro_rules! param_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Param {
            fn from(v: $ty) -> Self {
                Param::Number(serde_json::Number::from(v))
            }
        })*
    };
}

param_from_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Param {
    /// Non-finite floats have no literal form and become `Null`.
    fn from(v: f64) -> Self {
        serde_json::Number::from_f64(v)
            .map(Param::Number)
            .unwrap_or(Param::Null)
    }
}

impl From<f32> for Param {
    fn from(v: f32) -> Self {
        Param::from(f64::from(v))
    }
}

impl<T: Into<Param>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Param::Null)
    }
}

impl<T: Into<Param>> From<Vec<T>> for Param {
    fn from(v: Vec<T>) -> Self {
        Param::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Param> + Clone> From<&[T]> for Param {
    fn from(v: &[T]) -> Self {
        Param::List(v.iter().cloned().map(Into::into).collect())
    }
}

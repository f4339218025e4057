use crate::params::{escape, Params};
use pinotdb_core::{PinotError, Result};

/// Substitute `%(name)s` placeholders in `template` with escaped parameters.
///
/// Follows printf-style mapping interpolation: `%%` is a literal percent
/// sign, every other `%` must start a named `s` conversion. Parameters the
/// template never mentions are ignored.
pub fn apply_parameters(template: &str, params: &Params) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices();
    while let Some((pos, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, '%')) => out.push('%'),
            Some((_, '(')) => {
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ')' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(PinotError::Templating(format!(
                        "incomplete format key at index {pos}"
                    )));
                }
                match chars.next() {
                    Some((_, 's')) => {}
                    Some((idx, other)) => {
                        return Err(PinotError::Templating(format!(
                            "unsupported format character '{other}' at index {idx}"
                        )))
                    }
                    None => return Err(PinotError::Templating("incomplete format".into())),
                }
                let param = params.get(&name).ok_or_else(|| {
                    PinotError::Templating(format!("missing parameter `{name}`"))
                })?;
                out.push_str(&escape(param)?);
            }
            Some((idx, other)) => {
                return Err(PinotError::Templating(format!(
                    "unsupported format character '{other}' at index {idx}"
                )))
            }
            None => return Err(PinotError::Templating("incomplete format".into())),
        }
    }
    Ok(out)
}

//! Command composition: positional `%s` substitution into command templates.
//!
//! Templates use printf-style markers. `%s` (or `%v`) consumes the next
//! value, `%%` is a literal percent sign. Flags and widths are not
//! supported: in `%-5s` the `-` is read as an unknown verb. Anything that cannot be resolved
//! is rendered as a `%!` error marker so the failure is visible in the
//! resulting text:
//!
//! - `%!s(MISSING)` for a marker with no value left
//! - `%!(EXTRA string=...)` for values left over after the last marker
//! - `%!x(string=...)` for an unsupported verb `x`
//! - `%!(NOVERB)` for a `%` at the end of the template
//!
//! Any such marker fails composition with [`Error::Interpolation`]. Values
//! are spliced verbatim unless [`Quoting::Shell`] is requested.

use crate::binder;
use crate::error::{Error, Result};
use crate::types::{Arguments, CommandSpec, Operation, Quoting};

/// Prefix of every error marker left by a failed substitution.
pub const ERROR_MARKER: &str = "%!";

/// Text produced by substitution, and how many markers it contains.
struct Rendered {
    text: String,
    faults: usize,
}

fn render(template: &str, values: &[String]) -> Rendered {
    let mut text = String::with_capacity(template.len());
    let mut faults = 0;
    let mut next = 0;
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            text.push(c);
            continue;
        }

        match chars.next() {
            Some('%') => text.push('%'),
            Some(verb) => {
                let supported = matches!(verb, 's' | 'v');
                match values.get(next) {
                    Some(value) if supported => text.push_str(value),
                    Some(value) => {
                        faults += 1;
                        text.push_str(&format!("{ERROR_MARKER}{verb}(string={value})"));
                    }
                    None => {
                        faults += 1;
                        text.push_str(&format!("{ERROR_MARKER}{verb}(MISSING)"));
                    }
                }
                next += 1;
            }
            None => {
                faults += 1;
                text.push_str(ERROR_MARKER);
                text.push_str("(NOVERB)");
            }
        }
    }

    if next < values.len() {
        faults += 1;
        let extra: Vec<String> = values[next..]
            .iter()
            .map(|v| format!("string={v}"))
            .collect();
        text.push_str(&format!("{ERROR_MARKER}(EXTRA {})", extra.join(", ")));
    }

    Rendered { text, faults }
}

/// Substitute `values` into `template`, in order.
///
/// The number of values must equal the number of markers; any mismatch or
/// malformed marker fails with [`Error::Interpolation`].
pub fn interpolate(operation: Operation, template: &str, values: &[String]) -> Result<String> {
    let rendered = render(template, values);

    if rendered.faults > 0 {
        return Err(Error::Interpolation {
            operation,
            template: template.to_string(),
            rendered: rendered.text,
            values: values.to_vec(),
        });
    }

    Ok(rendered.text)
}

/// Bind the command's parameters against `arguments` and substitute them.
///
/// A command without declared parameters is returned verbatim, markers and
/// all: there is no substitution step to run.
pub fn compose(
    operation: Operation,
    spec: &CommandSpec,
    arguments: &Arguments,
    quoting: Quoting,
) -> Result<String> {
    if spec.parameters.is_empty() {
        return Ok(spec.template.clone());
    }

    let values = binder::bind(operation, &spec.template, &spec.parameters, arguments)?;
    let values = match quoting {
        Quoting::None => values,
        Quoting::Shell => values.iter().map(|v| quote(v)).collect::<Vec<_>>(),
    };

    interpolate(operation, &spec.template, &values)
}

/// Count the value-consuming markers in a template.
///
/// Returns a description of the first malformed marker instead, if any.
pub fn count_markers(template: &str) -> std::result::Result<usize, String> {
    let mut count = 0;
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        match chars.next() {
            Some('%') => {}
            Some('s' | 'v') => count += 1,
            Some(verb) => return Err(format!("unsupported substitution verb '%{verb}'")),
            None => return Err("dangling '%' at end of template".to_string()),
        }
    }

    Ok(count)
}

/// Quote a value for the platform shell.
pub fn quote(value: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

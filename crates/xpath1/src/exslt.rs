//! The EXSLT regular expression functions, bound to
//! `http://exslt.org/regular-expressions`.
//!
//! Flags: `i` matches case-insensitively, `g` makes `replace` rewrite every
//! match instead of only the first. Other flag characters are ignored.

use crate::error::{EvalError, XPathError};
use crate::functions::check_arity;
use crate::value::XPathValue;
use regex::{NoExpand, Regex};

pub(crate) fn evaluate_function<'t>(
    name: &str,
    args: Vec<XPathValue<'t>>,
) -> Result<XPathValue<'t>, XPathError> {
    match name {
        "test" => func_test(args),
        "replace" => func_replace(args),
        _ => Err(EvalError::UnknownFunction(format!(
            "{{{}}}{}",
            crate::namespaces::EXSLT_REGEXP_NAMESPACE,
            name
        ))
        .into()),
    }
}

fn build_regex(function: &str, pattern: &str, flags: &str) -> Result<Regex, XPathError> {
    let mut regex_pattern = String::new();
    if flags.contains('i') {
        regex_pattern.push_str("(?i)");
    }
    regex_pattern.push_str(pattern);

    Regex::new(&regex_pattern).map_err(|e| {
        EvalError::function(function, format!("Invalid regex pattern: {}", e)).into()
    })
}

/// `re:test(string, pattern, flags?)`
fn func_test(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("re:test", &args, 2, 3)?;
    let flags = if args.len() == 3 {
        args.remove(2).to_string()
    } else {
        String::new()
    };
    let pattern = args.remove(1).to_string();
    let input = args.remove(0).to_string();

    let regex = build_regex("re:test", &pattern, &flags)?;
    Ok(XPathValue::Boolean(regex.is_match(&input)))
}

/// `re:replace(string, pattern, flags, replacement)`. The replacement is
/// inserted literally.
fn func_replace(mut args: Vec<XPathValue<'_>>) -> Result<XPathValue<'_>, XPathError> {
    check_arity("re:replace", &args, 4, 4)?;
    let replacement = args.remove(3).to_string();
    let flags = args.remove(2).to_string();
    let pattern = args.remove(1).to_string();
    let input = args.remove(0).to_string();

    let regex = build_regex("re:replace", &pattern, &flags)?;
    let limit = if flags.contains('g') { 0 } else { 1 };
    let result = regex.replacen(&input, limit, NoExpand(&replacement));
    Ok(XPathValue::String(result.into_owned()))
}

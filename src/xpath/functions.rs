//! Core function library.

use super::engine::{Context, XPathValue, parse_number};
use crate::error::EvalError;

const ANY: usize = usize::MAX;

/// Functions accepted when a query is compiled, with their minimum and
/// maximum argument counts.
pub const FUNCTIONS: &[(&str, usize, usize)] = &[
    ("string", 0, 1),
    ("concat", 2, ANY),
    ("contains", 2, 2),
    ("starts-with", 2, 2),
    ("substring-before", 2, 2),
    ("substring-after", 2, 2),
    ("substring", 2, 3),
    ("string-length", 0, 1),
    ("normalize-space", 0, 1),
    ("translate", 3, 3),
    ("lower-case", 1, 1),
    ("not", 1, 1),
    ("true", 0, 0),
    ("false", 0, 0),
    ("boolean", 1, 1),
    ("number", 0, 1),
    ("count", 1, 1),
    ("position", 0, 0),
    ("last", 0, 0),
    ("name", 0, 1),
    ("local-name", 0, 1),
    ("sum", 1, 1),
    ("floor", 1, 1),
    ("ceiling", 1, 1),
    ("round", 1, 1),
];

pub fn is_known(name: &str) -> bool {
    arity(name).is_some()
}

/// `(min, max)` argument counts of a known function.
pub fn arity(name: &str) -> Option<(usize, usize)> {
    FUNCTIONS
        .iter()
        .find(|(known, _, _)| *known == name)
        .map(|&(_, min, max)| (min, max))
}

/// `Err` with the accepted counts when `got` arguments do not fit `name`.
/// Unknown names pass; they are reported separately.
pub fn check_arity(name: &str, got: usize) -> Result<(), String> {
    match arity(name) {
        Some((min, max)) if got < min || got > max => Err(if min == max {
            min.to_string()
        } else if max == ANY {
            format!("at least {}", min)
        } else {
            format!("{} to {}", min, max)
        }),
        _ => Ok(()),
    }
}

fn check_args(name: &str, args: &[XPathValue<'_>]) -> Result<(), EvalError> {
    check_arity(name, args.len()).map_err(|expected| EvalError::Function {
        function: name.to_string(),
        message: format!("expected {} arguments, got {}", expected, args.len()),
    })
}

/// The string argument at `index`, or the context node's string-value when
/// the argument is omitted.
fn string_arg(args: &[XPathValue<'_>], index: usize, ctx: &Context<'_>) -> String {
    args.get(index)
        .map(|arg| arg.string())
        .unwrap_or_else(|| ctx.node.string_value())
}

pub fn call<'a>(
    name: &str,
    args: Vec<XPathValue<'a>>,
    ctx: &Context<'a>,
) -> Result<XPathValue<'a>, EvalError> {
    use XPathValue::*;

    match name {
        "string" => {
            check_args(name, &args)?;
            Ok(String(string_arg(&args, 0, ctx)))
        }
        "concat" => {
            check_args(name, &args)?;
            Ok(String(args.iter().map(|arg| arg.string()).collect()))
        }
        "contains" => {
            check_args(name, &args)?;
            Ok(Boolean(args[0].string().contains(&args[1].string())))
        }
        "starts-with" => {
            check_args(name, &args)?;
            Ok(Boolean(args[0].string().starts_with(&args[1].string())))
        }
        "substring-before" => {
            check_args(name, &args)?;
            let haystack = args[0].string();
            let needle = args[1].string();
            Ok(String(
                haystack
                    .find(&needle)
                    .map(|at| haystack[..at].to_string())
                    .unwrap_or_default(),
            ))
        }
        "substring-after" => {
            check_args(name, &args)?;
            let haystack = args[0].string();
            let needle = args[1].string();
            Ok(String(
                haystack
                    .find(&needle)
                    .map(|at| haystack[at + needle.len()..].to_string())
                    .unwrap_or_default(),
            ))
        }
        "substring" => {
            check_args(name, &args)?;
            let s = args[0].string();
            let start = round(args[1].number());
            let end = args.get(2).map(|len| start + round(len.number()));
            // positions are 1-based; NaN bounds select nothing
            Ok(String(
                s.chars()
                    .enumerate()
                    .filter(|(i, _)| {
                        let position = (*i + 1) as f64;
                        position >= start && end.map_or(true, |end| position < end)
                    })
                    .map(|(_, c)| c)
                    .collect(),
            ))
        }
        "string-length" => {
            check_args(name, &args)?;
            Ok(Number(string_arg(&args, 0, ctx).chars().count() as f64))
        }
        "normalize-space" => {
            check_args(name, &args)?;
            let s = string_arg(&args, 0, ctx);
            Ok(String(s.split_whitespace().collect::<Vec<_>>().join(" ")))
        }
        "translate" => {
            check_args(name, &args)?;
            let from: Vec<char> = args[1].string().chars().collect();
            let to: Vec<char> = args[2].string().chars().collect();
            Ok(String(
                args[0]
                    .string()
                    .chars()
                    .filter_map(|c| match from.iter().position(|&f| f == c) {
                        Some(index) => to.get(index).copied(),
                        None => Some(c),
                    })
                    .collect(),
            ))
        }
        "lower-case" => {
            check_args(name, &args)?;
            Ok(String(args[0].string().to_lowercase()))
        }
        "not" => {
            check_args(name, &args)?;
            Ok(Boolean(!args[0].boolean()))
        }
        "true" => {
            check_args(name, &args)?;
            Ok(Boolean(true))
        }
        "false" => {
            check_args(name, &args)?;
            Ok(Boolean(false))
        }
        "boolean" => {
            check_args(name, &args)?;
            Ok(Boolean(args[0].boolean()))
        }
        "number" => {
            check_args(name, &args)?;
            Ok(Number(match args.first() {
                Some(arg) => arg.number(),
                None => parse_number(&ctx.node.string_value()),
            }))
        }
        "count" => {
            check_args(name, &args)?;
            let nodes = args.into_iter().next().map(XPathValue::into_nodes);
            Ok(Number(nodes.unwrap_or(Ok(vec![]))?.len() as f64))
        }
        "position" => {
            check_args(name, &args)?;
            Ok(Number(ctx.position as f64))
        }
        "last" => {
            check_args(name, &args)?;
            Ok(Number(ctx.size as f64))
        }
        "name" | "local-name" => {
            check_args(name, &args)?;
            let node = match args.into_iter().next() {
                Some(arg) => arg.into_nodes()?.first().copied(),
                None => Some(ctx.node),
            };
            Ok(String(
                node.map(|node| node.name().to_string()).unwrap_or_default(),
            ))
        }
        "sum" => {
            check_args(name, &args)?;
            let nodes = args.into_iter().next().map(XPathValue::into_nodes);
            Ok(Number(
                nodes
                    .unwrap_or(Ok(vec![]))?
                    .iter()
                    .map(|node| parse_number(&node.string_value()))
                    .sum(),
            ))
        }
        "floor" => {
            check_args(name, &args)?;
            Ok(Number(args[0].number().floor()))
        }
        "ceiling" => {
            check_args(name, &args)?;
            Ok(Number(args[0].number().ceil()))
        }
        "round" => {
            check_args(name, &args)?;
            Ok(Number(round(args[0].number())))
        }
        _ => Err(EvalError::Function {
            function: name.to_string(),
            message: "unknown function".to_string(),
        }),
    }
}

/// XPath rounding: halves go towards positive infinity.
fn round(n: f64) -> f64 {
    if n.is_finite() { (n + 0.5).floor() } else { n }
}

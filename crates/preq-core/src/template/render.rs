//! Evaluation of parsed templates against a value.

use std::borrow::Cow;

use serde_json::Value;

use super::parse::{Command, Func, Node, Operand, Pipeline};
use crate::record::{self, kind_name};

/// Render failure without template context; the caller attaches name and line.
pub(super) struct EvalError(pub String);

type Eval<'a> = Result<Cow<'a, Value>, EvalError>;

/// Render `nodes` with `dot` as the current value, appending to `out`.
///
/// Returns the byte offset of the failing action on error.
pub(super) fn render(
    nodes: &[Node],
    dot: &Value,
    out: &mut String,
) -> Result<(), (usize, EvalError)> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Action { pipeline, offset } => {
                let value = pipeline_value(pipeline, dot).map_err(|e| (*offset, e))?;
                print_value(&value, out);
            }
        }
    }
    Ok(())
}

/// Append the printed form of `value`: nothing for null, strings verbatim,
/// floats in shortest `%g` form, everything else as compact JSON.
fn print_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => out.push_str(&format_float(f)),
            None => out.push_str(&n.to_string()),
        },
        other => out.push_str(&other.to_string()),
    }
}

/// Shortest round-trip digits, in exponent form when the decimal exponent is
/// below -4 or at least 6 (`1e+06`, `1.5e-05`), plain otherwise (`1`, `1.5`).
fn format_float(f: f64) -> String {
    let sci = format!("{f:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return f.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return f.to_string();
    };
    if (-4..6).contains(&exp) {
        return f.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

fn pipeline_value<'a>(pipeline: &Pipeline, dot: &'a Value) -> Eval<'a> {
    let mut piped: Option<Cow<'a, Value>> = None;
    for command in &pipeline.commands {
        piped = Some(command_value(command, dot, piped)?);
    }
    Ok(piped.unwrap_or(Cow::Owned(Value::Null)))
}

fn command_value<'a>(command: &Command, dot: &'a Value, piped: Option<Cow<'a, Value>>) -> Eval<'a> {
    match command {
        Command::Operand(operand) => operand_value(operand, dot),
        Command::Call { func, args } => {
            let mut values = args
                .iter()
                .map(|arg| operand_value(arg, dot))
                .collect::<Result<Vec<_>, _>>()?;
            values.extend(piped);
            call(*func, values)
        }
    }
}

fn operand_value<'a>(operand: &Operand, dot: &'a Value) -> Eval<'a> {
    match operand {
        Operand::Dot => Ok(Cow::Borrowed(dot)),
        Operand::Chain(names) => chain_value(names, dot),
        Operand::Literal(value) => Ok(Cow::Owned(value.clone())),
        Operand::Sub(pipeline) => pipeline_value(pipeline, dot),
    }
}

/// Walk `.a.b.c` from `dot`. Missing keys and nulls yield null; stepping
/// into any other non-object is an error.
fn chain_value<'a>(names: &[String], dot: &'a Value) -> Eval<'a> {
    let mut current = Some(dot);
    for name in names {
        current = match current {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => map.get(name),
            Some(other) => {
                return Err(EvalError(format!(
                    "can't evaluate field {name} in type {}",
                    kind_name(other)
                )))
            }
        };
    }
    Ok(current.map_or(Cow::Owned(Value::Null), Cow::Borrowed))
}

fn call<'a>(func: Func, args: Vec<Cow<'a, Value>>) -> Eval<'a> {
    match func {
        Func::Field => {
            let mut args = args.into_iter();
            let (Some(obj), Some(name), None) = (args.next(), args.next(), args.next()) else {
                return Err(EvalError(format!(
                    "wrong number of args for {}",
                    func.name()
                )));
            };
            let Value::String(name) = name.as_ref() else {
                return Err(EvalError(format!(
                    "error calling field: name must be a string, got {}",
                    kind_name(&name)
                )));
            };

            let found = match obj {
                Cow::Borrowed(value) => record::field(value, name).map(Cow::Borrowed),
                Cow::Owned(value) => record::field(&value, name).cloned().map(Cow::Owned),
            };
            if found.is_none() {
                tracing::trace!(field = %name, "field: no such field");
            }
            Ok(found.unwrap_or(Cow::Owned(Value::Null)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::parse::parse;
    use serde_json::json;

    fn render_str(src: &str, dot: &Value) -> Result<String, String> {
        let nodes = parse("test", src).map_err(|e| e.to_string())?;
        let mut out = String::new();
        render(&nodes, dot, &mut out).map_err(|(_, e)| e.0)?;
        Ok(out)
    }

    #[test]
    fn test_print_values() {
        let dot = json!({
            "s": "text",
            "i": 3,
            "f": 1.5,
            "b": true,
            "n": null,
            "a": [1, "x"],
            "o": {"k": "v"}
        });
        assert_eq!(render_str("{{ .s }}", &dot).unwrap(), "text");
        assert_eq!(render_str("{{ .i }}", &dot).unwrap(), "3");
        assert_eq!(render_str("{{ .f }}", &dot).unwrap(), "1.5");
        assert_eq!(render_str("{{ .b }}", &dot).unwrap(), "true");
        assert_eq!(render_str("{{ .n }}", &dot).unwrap(), "");
        assert_eq!(render_str("{{ .a }}", &dot).unwrap(), r#"[1,"x"]"#);
        assert_eq!(render_str("{{ .o }}", &dot).unwrap(), r#"{"k":"v"}"#);
    }

    #[test]
    fn test_literals() {
        let dot = json!({});
        assert_eq!(render_str(r#"{{ "lit" }}-{{ 7 }}-{{ nil }}"#, &dot).unwrap(), "lit-7-");
    }

    #[test]
    fn test_chain_through_missing_and_null() {
        let dot = json!({"cre": null});
        assert_eq!(render_str("[{{ .missing.deeper }}]", &dot).unwrap(), "[]");
        assert_eq!(render_str("[{{ .cre.id }}]", &dot).unwrap(), "[]");
    }

    #[test]
    fn test_chain_through_scalar_fails() {
        let dot = json!({"Reason": "disk full"});
        let err = render_str("{{ .Reason.Code }}", &dot).unwrap_err();
        assert_eq!(err, "can't evaluate field Code in type string");
    }

    #[test]
    fn test_field_function() {
        let dot = json!({"cre": {"id": "CRE-1"}, "Reason": "disk full"});
        assert_eq!(render_str(r#"{{ field . "Reason" }}"#, &dot).unwrap(), "disk full");
        assert_eq!(render_str(r#"{{ field .cre "id" }}"#, &dot).unwrap(), "CRE-1");
        assert_eq!(render_str(r#"{{ "id" | field .cre }}"#, &dot).unwrap(), "CRE-1");
        assert_eq!(
            render_str(r#"{{ field (field . "cre") "id" }}"#, &dot).unwrap(),
            "CRE-1"
        );
    }

    #[test]
    fn test_field_on_non_object_is_empty() {
        let dot = json!({"Reason": "disk full"});
        assert_eq!(render_str(r#"[{{ field .Reason "x" }}]"#, &dot).unwrap(), "[]");
        assert_eq!(render_str(r#"[{{ field nil "x" }}]"#, &dot).unwrap(), "[]");
        assert_eq!(render_str(r#"[{{ field . "nope" }}]"#, &dot).unwrap(), "[]");
    }

    #[test]
    fn test_field_on_literal_object() {
        let dot = json!({"o": {"k": "v"}});
        assert_eq!(render_str(r#"{{ field (.o) "k" }}"#, &dot).unwrap(), "v");
    }

    #[test]
    fn test_piped_value_is_final_argument() {
        let dot = json!({"cre": {"id": "CRE-1"}});
        let err = render_str(r#"{{ .cre | field "id" }}"#, &dot).unwrap_err();
        assert_eq!(err, "error calling field: name must be a string, got object");
    }

    #[test]
    fn test_float_printing() {
        let dot = json!({"whole": 1.0, "half": 1.5, "tiny": 0.00001, "big": 1000000.0, "n": 42, "neg": -2.50});
        assert_eq!(
            render_str("{{ .whole }} {{ .half }} {{ .n }} {{ .neg }}", &dot).unwrap(),
            "1 1.5 42 -2.5"
        );
        assert_eq!(render_str("{{ .tiny }} {{ .big }}", &dot).unwrap(), "1e-05 1e+06");
        assert_eq!(render_str("{{ 123456.0 }} {{ 0.0001 }}", &dot).unwrap(), "123456 0.0001");
    }

    #[test]
    fn test_field_name_must_be_string() {
        let dot = json!({"n": 1});
        let err = render_str("{{ field . .n }}", &dot).unwrap_err();
        assert_eq!(err, "error calling field: name must be a string, got number");
    }
}

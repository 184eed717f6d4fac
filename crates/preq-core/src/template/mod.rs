//! Text templates for runbook payloads.
//!
//! Templates use the `{{ ... }}` action syntax runbook authors already write:
//!
//! ```text
//! Reason: {{ .Reason }}
//! CRE: {{ field .cre "id" }}
//! Also: {{ "id" | field .cre }}
//! ```
//!
//! The record is the current value `.`; `.A.B` walks nested objects and
//! `field <value> <name>` reads a field from any value. Missing fields render
//! as the empty string. Supported: trim markers (`{{-`, `-}}`), comments
//! (`{{/* */}}`), string, number, `true`/`false`/`nil` literals, parenthesised
//! sub-expressions and `|` pipelines.
//!
//! A [`Template`] is compiled once and is immutable afterwards, so it can be
//! rendered from any number of tasks.

mod lex;
mod parse;
mod render;

use thiserror::Error;

use crate::record::EventRecord;
use parse::{line_of, Node};

/// Template compilation and rendering errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template: {name}:{line}: {message}")]
    Parse {
        name: String,
        line: usize,
        message: String,
    },

    #[error("template: {name}: function {function:?} not defined")]
    UnknownFunction { name: String, function: String },

    #[error("template: {name}: wrong number of args for {function}: want {want} got {got}")]
    Arity {
        name: String,
        function: String,
        want: usize,
        got: usize,
    },

    #[error("template: {name}:{line}: executing: {message}")]
    Render {
        name: String,
        line: usize,
        message: String,
    },
}

/// A compiled template.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    /// Compile `source`. `name` identifies the template in error messages.
    pub fn compile(name: impl Into<String>, source: &str) -> Result<Self, TemplateError> {
        let name = name.into();
        let nodes = parse::parse(&name, source)?;
        Ok(Self {
            name,
            source: source.to_string(),
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render against one event record.
    pub fn render(&self, record: &EventRecord) -> Result<String, TemplateError> {
        let mut out = String::new();
        render::render(&self.nodes, record.as_value(), &mut out).map_err(
            |(offset, err)| TemplateError::Render {
                name: self.name.clone(),
                line: line_of(&self.source, offset),
                message: err.0,
            },
        )?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> EventRecord {
        EventRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_field_accessor_renders_exact_value() {
        let tmpl = Template::compile("t", r#"{{ field . "X" }}"#).unwrap();
        assert_eq!(tmpl.render(&record(json!({"X": "X"}))).unwrap(), "X");
    }

    #[test]
    fn test_missing_field_renders_empty() {
        let tmpl = Template::compile("t", r#"{{ field . "X" }}"#).unwrap();
        assert_eq!(tmpl.render(&record(json!({"Y": "y"}))).unwrap(), "");
    }

    #[test]
    fn test_slack_style_message() {
        let tmpl = Template::compile("slack", r#"Reason: {{ field . "Reason" }}"#).unwrap();
        let out = tmpl.render(&record(json!({"Reason": "disk full"}))).unwrap();
        assert_eq!(out, "Reason: disk full");
    }

    #[test]
    fn test_multiline_template() {
        let src = "*Build failed!*\nReason: {{ .Reason }}\nCommit: {{ .Commit }}\n";
        let tmpl = Template::compile("slack", src).unwrap();
        let out = tmpl
            .render(&record(json!({"Reason": "oom", "Commit": "abc123"})))
            .unwrap();
        assert_eq!(out, "*Build failed!*\nReason: oom\nCommit: abc123\n");
    }

    #[test]
    fn test_empty_template_renders_empty() {
        let tmpl = Template::compile("jira-desc", "").unwrap();
        assert_eq!(tmpl.render(&record(json!({"a": 1}))).unwrap(), "");
    }

    #[test]
    fn test_render_is_repeatable() {
        let tmpl = Template::compile("t", "{{ .n }}").unwrap();
        for n in 0..3 {
            assert_eq!(tmpl.render(&record(json!({"n": n}))).unwrap(), n.to_string());
        }
    }

    #[test]
    fn test_render_error_carries_name_and_line() {
        let tmpl = Template::compile("jira-summary", "first\n{{ .Reason.Code }}").unwrap();
        let err = tmpl.render(&record(json!({"Reason": "x"}))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "template: jira-summary:2: executing: can't evaluate field Code in type string"
        );
    }

    #[test]
    fn test_compile_error_display() {
        let err = Template::compile("slack", "{{ .Reason").unwrap_err();
        assert_eq!(err.to_string(), "template: slack:1: unclosed action");

        let err = Template::compile("slack", "{{ upper .Reason }}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "template: slack: function \"upper\" not defined"
        );

        let err = Template::compile("slack", "{{ field . }}").unwrap_err();
        assert_eq!(
            err.to_string(),
            "template: slack: wrong number of args for field: want 2 got 1"
        );
    }

    #[test]
    fn test_unicode_field_names() {
        let tmpl = Template::compile("slack", "Motivo: {{ .Razón }}").unwrap();
        assert_eq!(tmpl.name(), "slack");
        let out = tmpl.render(&record(json!({"Razón": "disco lleno"}))).unwrap();
        assert_eq!(out, "Motivo: disco lleno");
    }

    #[test]
    fn test_template_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Template>();
    }
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! FQDN templates rendered against a Service.
//!
//! Templates use a small subset of Go template syntax, enough to build DNS
//! names from a Service's identity:
//!
//! - `{{.Name}}`, `{{.Namespace}}`
//! - `{{.Labels.app}}`, `{{.Annotations.team}}`
//! - `{{index .Labels "app.kubernetes.io/name"}}`
//! - `{{trimPrefix .Name "svc-"}}`, `{{trimSuffix .Name "-v2"}}`,
//!   `{{replace "-" "." .Name}}`, `{{toLower .Name}}`
//! - `{{-` and `-}}` trim surrounding whitespace
//!
//! Rendered text is split on commas so one template may produce several
//! hostnames. Missing map keys render as the empty string.
//!
//! # Example
//!
//! ```
//! use svcdns::template::{FqdnTemplate, TemplateView};
//! use std::collections::BTreeMap;
//!
//! let tmpl = FqdnTemplate::parse("{{.Name}}.{{.Namespace}}.example.com").unwrap();
//! let labels = BTreeMap::new();
//! let annotations = BTreeMap::new();
//! let view = TemplateView {
//!     name: "web",
//!     namespace: "prod",
//!     labels: &labels,
//!     annotations: &annotations,
//! };
//! assert_eq!(tmpl.render(&view), vec!["web.prod.example.com"]);
//! ```

use crate::errors::{Result, SourceError};
use std::collections::BTreeMap;

/// The fields of a Service a template may reference.
#[derive(Clone, Copy, Debug)]
pub struct TemplateView<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub labels: &'a BTreeMap<String, String>,
    pub annotations: &'a BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Operand {
    Name,
    Namespace,
    Labels,
    Annotations,
    Label(String),
    Annotation(String),
    Literal(String),
}

impl Operand {
    fn is_map(&self) -> bool {
        matches!(self, Operand::Labels | Operand::Annotations)
    }

    fn map<'a>(&self, view: &TemplateView<'a>) -> &'a BTreeMap<String, String> {
        match self {
            Operand::Labels => view.labels,
            _ => view.annotations,
        }
    }

    fn text(&self, view: &TemplateView<'_>) -> String {
        match self {
            Operand::Name => view.name.to_string(),
            Operand::Namespace => view.namespace.to_string(),
            Operand::Label(key) => view.labels.get(key).cloned().unwrap_or_default(),
            Operand::Annotation(key) => view.annotations.get(key).cloned().unwrap_or_default(),
            Operand::Literal(s) => s.clone(),
            // Rejected at parse time.
            Operand::Labels | Operand::Annotations => String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Function {
    Index,
    TrimPrefix,
    TrimSuffix,
    Replace,
    ToLower,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "index" => Some(Function::Index),
            "trimPrefix" => Some(Function::TrimPrefix),
            "trimSuffix" => Some(Function::TrimSuffix),
            "replace" => Some(Function::Replace),
            "toLower" => Some(Function::ToLower),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Function::ToLower => 1,
            Function::Index | Function::TrimPrefix | Function::TrimSuffix => 2,
            Function::Replace => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Action {
    Operand(Operand),
    Call(Function, Vec<Operand>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Text(String),
    Action(Action),
}

/// A parsed FQDN template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FqdnTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FqdnTemplate {
    /// Parse template text.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::InvalidTemplate`] for unclosed actions, unknown
    /// fields or functions, wrong argument counts, and map values used where
    /// text is expected.
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: String| SourceError::InvalidTemplate {
            template: source.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut rest = source;
        let mut trim_next_text = false;

        while let Some(open) = rest.find("{{") {
            let mut text = &rest[..open];
            if text.contains("}}") {
                return Err(invalid("unexpected '}}'".to_string()));
            }
            if trim_next_text {
                text = text.trim_start();
            }
            let after_open = &rest[open + 2..];
            let close = after_open
                .find("}}")
                .ok_or_else(|| invalid("unclosed action".to_string()))?;
            let mut body = &after_open[..close];

            if let Some(stripped) = body.strip_prefix('-') {
                text = text.trim_end();
                body = stripped;
            }
            trim_next_text = false;
            if let Some(stripped) = body.strip_suffix('-') {
                trim_next_text = true;
                body = stripped;
            }

            if !text.is_empty() {
                segments.push(Segment::Text(text.to_string()));
            }
            segments.push(Segment::Action(parse_action(body).map_err(invalid)?));
            rest = &after_open[close + 2..];
        }

        let tail = if trim_next_text { rest.trim_start() } else { rest };
        if tail.contains("}}") {
            return Err(invalid("unexpected '}}'".to_string()));
        }
        if !tail.is_empty() {
            segments.push(Segment::Text(tail.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template text as configured.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render against `view` and split into hostnames.
    #[must_use]
    pub fn render(&self, view: &TemplateView<'_>) -> Vec<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Action(action) => out.push_str(&evaluate(action, view)),
            }
        }

        out.split(',')
            .map(|h| h.trim().trim_end_matches('.').to_string())
            .filter(|h| !h.is_empty())
            .collect()
    }
}

fn evaluate(action: &Action, view: &TemplateView<'_>) -> String {
    match action {
        Action::Operand(operand) => operand.text(view),
        Action::Call(function, args) => match function {
            Function::Index => args[0]
                .map(view)
                .get(&args[1].text(view))
                .cloned()
                .unwrap_or_default(),
            Function::TrimPrefix => {
                let s = args[0].text(view);
                let prefix = args[1].text(view);
                s.strip_prefix(prefix.as_str()).unwrap_or(&s).to_string()
            }
            Function::TrimSuffix => {
                let s = args[0].text(view);
                let suffix = args[1].text(view);
                s.strip_suffix(suffix.as_str()).unwrap_or(&s).to_string()
            }
            Function::Replace => args[2]
                .text(view)
                .replace(&args[0].text(view), &args[1].text(view)),
            Function::ToLower => args[0].text(view).to_lowercase(),
        },
    }
}

fn parse_action(body: &str) -> std::result::Result<Action, String> {
    let tokens = tokenize(body)?;
    let Some((head, args)) = tokens.split_first() else {
        return Err("empty action".to_string());
    };

    if head.starts_with('.') || head.starts_with('"') {
        if !args.is_empty() {
            return Err(format!("unexpected arguments after '{head}'"));
        }
        let operand = parse_operand(head)?;
        if operand.is_map() {
            return Err(format!("'{head}' is a map, not text"));
        }
        return Ok(Action::Operand(operand));
    }

    let function = Function::lookup(head).ok_or_else(|| format!("unknown function '{head}'"))?;
    if args.len() != function.arity() {
        return Err(format!(
            "'{head}' takes {} arguments, got {}",
            function.arity(),
            args.len()
        ));
    }
    let operands = args
        .iter()
        .map(|a| parse_operand(a))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (position, operand) in operands.iter().enumerate() {
        let wants_map = function == Function::Index && position == 0;
        if operand.is_map() != wants_map {
            return Err(if wants_map {
                format!("'{head}' expects .Labels or .Annotations first")
            } else {
                format!("'{head}' argument {} must be text", position + 1)
            });
        }
    }

    Ok(Action::Call(function, operands))
}

fn parse_operand(token: &str) -> std::result::Result<Operand, String> {
    if let Some(literal) = token.strip_prefix('"') {
        return Ok(Operand::Literal(literal.to_string()));
    }
    match token {
        ".Name" => return Ok(Operand::Name),
        ".Namespace" => return Ok(Operand::Namespace),
        ".Labels" => return Ok(Operand::Labels),
        ".Annotations" => return Ok(Operand::Annotations),
        _ => {}
    }
    if let Some(key) = token.strip_prefix(".Labels.").filter(|k| !k.is_empty()) {
        return Ok(Operand::Label(key.to_string()));
    }
    if let Some(key) = token.strip_prefix(".Annotations.").filter(|k| !k.is_empty()) {
        return Ok(Operand::Annotation(key.to_string()));
    }
    Err(format!("unknown field '{token}'"))
}

/// Split an action body into words. Quoted strings become one token that
/// keeps its opening quote as a marker.
fn tokenize(body: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = body.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '"' {
            chars.next();
            let mut literal = String::from("\"");
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => {
                        let escaped = chars
                            .next()
                            .ok_or_else(|| "unterminated string".to_string())?;
                        literal.push(escaped);
                    }
                    _ => literal.push(c),
                }
            }
            if !closed {
                return Err("unterminated string".to_string());
            }
            tokens.push(literal);
            continue;
        }
        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_whitespace() || c == '"' {
                break;
            }
            word.push(c);
            chars.next();
        }
        tokens.push(word);
    }
    Ok(tokens)
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod template_tests;

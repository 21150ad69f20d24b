//! Parsing and normalization of model artifacts.
//!
//! Model output is duck-shaped: it may arrive wrapped in a markdown code
//! fence, and schema properties may come back as bare name strings or as
//! full `{name, type}` objects. This module absorbs all of that into the
//! canonical types with a typed error, so the rest of the pipeline never
//! sees raw model text.

use crate::{GeneratedQuery, GraphSchema, Node, Edge, Property};
use serde::Deserialize;
use thiserror::Error;

/// A model artifact that could not be coerced into its expected shape.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON in model output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Strip an optional surrounding markdown code fence, including a leading
/// `json` language tag. Text without a fence passes through untouched; an
/// unterminated fence yields everything after the opening line.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    body.trim()
}

// ============================================================================
// Schema normalization
// ============================================================================

/// A property as the model may emit it: a bare name or a full object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PropertyRepr {
    Full(Property),
    Named(String),
}

impl From<PropertyRepr> for Property {
    fn from(repr: PropertyRepr) -> Self {
        match repr {
            PropertyRepr::Full(p) => p,
            // Bare names carry no type information; default to "string".
            PropertyRepr::Named(name) => Property::new(name, "string"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawNode {
    label: String,
    #[serde(default)]
    properties: Option<Vec<PropertyRepr>>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    label: String,
    from: String,
    to: String,
    #[serde(default)]
    properties: Option<Vec<PropertyRepr>>,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    nodes: Vec<RawNode>,
    edges: Vec<RawEdge>,
}

fn normalize_props(props: Option<Vec<PropertyRepr>>) -> Option<Vec<Property>> {
    props.map(|ps| ps.into_iter().map(Property::from).collect())
}

/// Parse a (possibly fenced) schema artifact into a canonical
/// [`GraphSchema`], coalescing heterogeneous property representations.
pub fn parse_schema(raw: &str) -> Result<GraphSchema, ParseError> {
    let raw: RawSchema = serde_json::from_str(strip_code_fence(raw))?;
    Ok(GraphSchema {
        nodes: raw
            .nodes
            .into_iter()
            .map(|n| Node {
                label: n.label,
                properties: normalize_props(n.properties),
            })
            .collect(),
        edges: raw
            .edges
            .into_iter()
            .map(|e| Edge {
                label: e.label,
                from: e.from,
                to: e.to,
                properties: normalize_props(e.properties),
            })
            .collect(),
    })
}

// ============================================================================
// Query / answer envelopes
// ============================================================================

/// Extract the query string from a `{"query": ...}` envelope. Embedded
/// newlines are collapsed to single spaces: the query engine consumes one
/// wire line per query. All other whitespace passes through untouched, so
/// spacing inside quoted literals is preserved.
pub fn parse_query(raw: &str) -> Result<String, ParseError> {
    let envelope: GeneratedQuery = serde_json::from_str(strip_code_fence(raw))?;
    Ok(single_line(&envelope.query))
}

#[derive(Debug, Deserialize)]
struct AnswerEnvelope {
    response: String,
}

/// Extract the answer text from a `{"response": ...}` envelope.
pub fn parse_answer(raw: &str) -> Result<String, ParseError> {
    let envelope: AnswerEnvelope = serde_json::from_str(strip_code_fence(raw))?;
    Ok(envelope.response)
}

// Only line breaks (and the whitespace hugging them) are rewritten; a
// blanket collapse would alter runs of spaces inside quoted literals.
fn single_line(query: &str) -> String {
    if !query.contains(['\n', '\r']) {
        return query.to_string();
    }
    query
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

//! System prompts and user-prompt builders for the three generation calls.

use crate::FailureAttempt;

pub const PRUNE_SYSTEM_PROMPT: &str = r#"
Understand the given labelled property graph schema and the given user question. Your task
is to return ONLY the subset of the schema (node labels, edge labels and properties) that is
relevant to the question.
    - The schema is a list of nodes and edges in a property graph.
    - The nodes are the entities in the graph.
    - The edges are the relationships between the nodes.
    - Properties of nodes and edges are their attributes, which help answer the question.

Return a JSON object with 'nodes' and 'edges' arrays matching the input schema structure.
"#;

pub const QUERY_SYSTEM_PROMPT: &str = r#"
Translate the question into a valid Cypher query that respects the graph schema.

<SYNTAX>
- Use short, concise alphanumeric strings as names of variable bindings (e.g., `a1`, `r1`).
- Always strive to respect the relationship direction (FROM/TO) using the schema information.
- When comparing string properties, ALWAYS do the following:
    - Lowercase the property values before comparison
    - Use the WHERE clause
    - Use the CONTAINS operator to check for presence of one substring in the other
- Use only node labels, relationship types and properties present in the schema.
</SYNTAX>

<RETURN_RESULTS>
- If the result is an integer, return it as an integer (not a string).
- When returning results, return property values rather than the entire node or relationship.
- Do not attempt to coerce data types to number formats in your results.
- NO query keywords should be returned by your query.
</RETURN_RESULTS>

Return a JSON object with a 'query' field containing the query as a single line string.
"#;

pub const ANSWER_SYSTEM_PROMPT: &str = r#"
- Use the provided question, the generated query and the context to answer the question.
- Ground the answer only in the given context; do not use outside knowledge.
- When dealing with dates, mention the month in full.

Return a JSON object with a 'response' field containing your answer.
"#;

/// Prompt for the schema pruning call.
pub fn prune_prompt(question: &str, full_schema_json: &str) -> String {
    format!("Question: {question}\n\nInput Schema: {full_schema_json}")
}

/// Prompt for the query generation call. Always carries question + pruned
/// schema; when `history` is non-empty, each prior attempt's query and error
/// is appended in order, followed by an instruction to correct all noted
/// issues.
pub fn query_prompt(question: &str, pruned_schema_json: &str, history: &[FailureAttempt]) -> String {
    let mut prompt = format!("Question: {question}\n\nInput Schema: {pruned_schema_json}");

    if !history.is_empty() {
        prompt.push_str("\n\n### Previous Failed Attempts ###");
        for (i, attempt) in history.iter().enumerate() {
            prompt.push_str(&format!("\n\nAttempt {i}:"));
            prompt.push_str(&format!("\nGenerated Query: {}", attempt.query));
            prompt.push_str(&format!("\nError/Issue: {}", attempt.error));
        }
        prompt.push_str(
            "\n\nPlease learn from these failures and generate a corrected query that addresses all the issues above.",
        );
    }

    prompt
}

/// Prompt for the answer generation call.
pub fn answer_prompt(question: &str, query: &str, context: &str) -> String {
    format!("Question: {question}\n\nQuery: {query}\n\nContext: {context}")
}

//! Minimal HTML templating over `serde_json::Value`.
//! Supports `{{path}}` substitution, `{{#if path}}...{{/if}}` blocks and
//! `{{#each path}}...{{/each}}` loops. Inside a loop the current element is
//! bound to `this` while the enclosing context's fields stay visible.

use serde_json::Value;

const IF_OPEN: &str = "{{#if ";
const IF_CLOSE: &str = "{{/if}}";
const EACH_OPEN: &str = "{{#each ";
const EACH_CLOSE: &str = "{{/each}}";

/// Render `template` against `data`. Unknown paths render as empty text;
/// malformed block tags are emitted verbatim rather than failing the run.
pub fn render(template: &str, data: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find("{{") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let consumed = if tail.starts_with(IF_OPEN) {
            render_block(tail, IF_OPEN, IF_CLOSE, data, &mut out)
        } else if tail.starts_with(EACH_OPEN) {
            render_block(tail, EACH_OPEN, EACH_CLOSE, data, &mut out)
        } else {
            render_var(tail, data, &mut out)
        };

        match consumed {
            Some(n) => rest = &tail[n..],
            None => {
                // No closing tag anywhere ahead; keep the raw text.
                out.push_str(tail);
                return out;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Handle one `{{path}}` tag at the start of `tail`; returns bytes consumed.
fn render_var(tail: &str, data: &Value, out: &mut String) -> Option<usize> {
    let end = tail.find("}}")?;
    let path = tail[2..end].trim();
    if let Some(value) = resolve(data, path) {
        out.push_str(&value_text(value));
    }
    Some(end + 2)
}

/// Handle one `{{#if ...}}` / `{{#each ...}}` block at the start of `tail`;
/// returns bytes consumed through the matching close tag.
fn render_block(
    tail: &str,
    open: &str,
    close: &str,
    data: &Value,
    out: &mut String,
) -> Option<usize> {
    let header_end = tail.find("}}")? + 2;
    let path = tail[open.len()..header_end - 2].trim();
    let after_header = &tail[header_end..];
    let body_end = find_close(after_header, open, close)?;
    let body = &after_header[..body_end];

    if open == IF_OPEN {
        if resolve(data, path).is_some_and(truthy) {
            out.push_str(&render(body, data));
        }
    } else if let Some(Value::Array(items)) = resolve(data, path) {
        for item in items {
            out.push_str(&render(body, &child_context(data, item)));
        }
    }

    Some(header_end + body_end + close.len())
}

/// Byte offset of the close tag matching an already-consumed open tag,
/// counting nested blocks of the same kind.
fn find_close(s: &str, open: &str, close: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut idx = 0;
    while let Some(found) = s[idx..].find("{{") {
        let at = idx + found;
        let tail = &s[at..];
        if tail.starts_with(open) {
            depth += 1;
            idx = at + open.len();
        } else if tail.starts_with(close) {
            depth -= 1;
            if depth == 0 {
                return Some(at);
            }
            idx = at + close.len();
        } else {
            idx = at + 2;
        }
    }
    None
}

/// Loop context: the parent object's fields plus `this` for the element.
fn child_context(parent: &Value, item: &Value) -> Value {
    let mut map = match parent {
        Value::Object(fields) => fields.clone(),
        _ => serde_json::Map::new(),
    };
    map.insert("this".to_string(), item.clone());
    Value::Object(map)
}

/// Walk a dotted path through nested objects.
fn resolve<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for key in path.split('.') {
        current = current.get(key)?;
    }
    Some(current)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

use rmcp::model::{CallToolResult, Content};

// Both tools answer on the success channel; failures live in the payload text.

/// One text item per entry, plus `{"result": [...]}` for structured consumers.
pub(crate) fn list_result(items: Vec<String>) -> CallToolResult {
    let mut r = CallToolResult::structured(serde_json::json!({ "result": &items }));
    r.content = items.into_iter().map(Content::text).collect();
    r
}

/// A single text item, plus `{"result": "..."}` for structured consumers.
pub(crate) fn text_result(text: String) -> CallToolResult {
    let mut r = CallToolResult::structured(serde_json::json!({ "result": &text }));
    r.content = vec![Content::text(text)];
    r
}

#[cfg(test)]
pub(crate) fn texts_of(r: &CallToolResult) -> Vec<String> {
    r.content
        .iter()
        .filter_map(|c| c.as_text())
        .map(|t| t.text.clone())
        .collect()
}

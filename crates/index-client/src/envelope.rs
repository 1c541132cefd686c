use reconcile_core::{ReconcileError, Result};
use serde_json::Value;

/// One validated page of lookup results: the server-reported total and the
/// identifier values of the returned documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPage {
    pub total: u64,
    pub ids: Vec<u64>,
}

/// Validate a raw response body as a result envelope and project out the
/// identifier field.
///
/// A body without the result-count field is a fatal communication error:
/// counts from a response that does not parse must never be turned into a
/// "missing" inference.
pub fn parse_result_page(body: &str, id_field: &str) -> Result<ResultPage> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ReconcileError::MalformedResponse(format!("body is not JSON: {e}"))
    })?;

    let response = value
        .get("response")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("missing 'response' object"))?;

    let total = response
        .get("num_found")
        .and_then(Value::as_u64)
        .ok_or_else(|| malformed("missing 'response.num_found'"))?;

    let mut ids = Vec::new();
    if let Some(docs) = response.get("docs") {
        let docs = docs
            .as_array()
            .ok_or_else(|| malformed("'response.docs' is not an array"))?;
        for doc in docs {
            match doc.get(id_field) {
                Some(Value::Number(n)) => {
                    let id = n
                        .as_u64()
                        .ok_or_else(|| malformed(&format!("non-integer {id_field}: {n}")))?;
                    ids.push(id);
                }
                // Some index versions stringify identifier fields.
                Some(Value::String(s)) => {
                    let id = s
                        .parse::<u64>()
                        .map_err(|_| malformed(&format!("non-integer {id_field}: {s:?}")))?;
                    ids.push(id);
                }
                Some(other) => {
                    return Err(malformed(&format!("unexpected {id_field} value: {other}")))
                }
                None => {
                    log::warn!("result document without field '{id_field}' ignored");
                }
            }
        }
    }

    Ok(ResultPage { total, ids })
}

fn malformed(detail: &str) -> ReconcileError {
    ReconcileError::MalformedResponse(detail.to_string())
}

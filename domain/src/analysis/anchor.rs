//! Stable markdown anchors for documents and questions.

use super::entities::DocumentRecord;
use std::collections::HashMap;

const MAX_SLUG_LEN: usize = 48;

/// Lowercase ASCII slug: alphanumerics kept, everything else collapsed to `-`.
pub fn slug(text: &str) -> String {
    slug_within(text, MAX_SLUG_LEN)
}

/// File names are never cut: exhibits often differ only in their last word.
fn file_slug(filename: &str) -> String {
    slug_within(filename, usize::MAX)
}

fn slug_within(text: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max_len));
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
            if out.len() >= max_len {
                break;
            }
        } else {
            pending_dash = true;
        }
    }

    if out.is_empty() {
        out.push_str("section");
    }
    out
}

/// Anchor of a document heading
pub fn document_anchor(filename: &str) -> String {
    format!("doc-{}", file_slug(filename))
}

/// Anchors for every answer of a document, in answer order.
///
/// Repeated questions within one document get `-2`, `-3`, ... suffixes.
pub fn question_anchors(record: &DocumentRecord) -> Vec<String> {
    let prefix = file_slug(&record.filename);
    let mut seen: HashMap<String, usize> = HashMap::new();

    record
        .answers
        .iter()
        .map(|pair| {
            let base = format!("{}--{}", prefix, slug(&pair.question));
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}-{}", base, count)
            }
        })
        .collect()
}

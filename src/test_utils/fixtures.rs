//! Upstream payload fixtures shared by unit and integration tests.

use serde_json::{Value, json};

/// A search API document with every field the fetcher asks for.
#[must_use]
pub fn plos_doc(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "abstract_primary_display": [format!("Abstract of {title}.")],
        "journal": "PLOS ONE",
        "author": ["A. Author", "B. Author"],
        "publication_date": "2020-05-01T00:00:00Z",
    })
}

/// The search API envelope around `docs`, encoded as JSON bytes.
#[must_use]
pub fn plos_response(num_found: u64, start: usize, docs: &[Value]) -> Vec<u8> {
    json!({
        "response": {
            "numFound": num_found,
            "start": start,
            "docs": docs,
        }
    })
    .to_string()
    .into_bytes()
}

/// `count` numbered documents.
#[must_use]
pub fn plos_docs(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            plos_doc(
                &format!("10.1371/journal.pone.{i:07}"),
                &format!("Result number {i}"),
            )
        })
        .collect()
}

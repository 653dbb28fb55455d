//! Query expansion through a [`TextGenerator`].
//!
//! The original query is always variant 0. Any provider failure, or a
//! reply with no usable `{"variations": [...]}` object, yields just the
//! original query.

use std::sync::Arc;

use serde::Deserialize;

use super::client::TextGenerator;

/// Default number of variants handed to retrieval, original included.
pub const DEFAULT_MAX_VARIANTS: usize = 3;

#[derive(Debug, Deserialize)]
struct Expansion {
    #[serde(default)]
    variations: Vec<String>,
}

/// Produces alternate phrasings of a search query.
pub struct QueryExpander {
    generator: Arc<dyn TextGenerator>,
    max_variants: usize,
}

impl QueryExpander {
    pub fn new(generator: Arc<dyn TextGenerator>, max_variants: usize) -> Self {
        Self {
            generator,
            max_variants: max_variants.max(1),
        }
    }

    /// Whether the backing generator can be called.
    pub fn is_enabled(&self) -> bool {
        self.generator.is_enabled()
    }

    /// Ordered variants of `query`, original first, at most `max_variants`.
    pub async fn expand(&self, query: &str) -> Vec<String> {
        if !self.generator.is_enabled() {
            return vec![query.to_owned()];
        }

        let reply = match self.generator.generate(&expansion_prompt(query)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "query expansion failed; using original query");
                return vec![query.to_owned()];
            }
        };

        let Some(variations) = parse_variations(&reply) else {
            tracing::warn!("query expansion reply had no variations object");
            return vec![query.to_owned()];
        };

        let variants = merge_variants(query, variations, self.max_variants);
        tracing::debug!(count = variants.len(), "query expanded");
        variants
    }
}

fn expansion_prompt(query: &str) -> String {
    format!(
        "Rewrite this torrent search term to find more matching releases: \"{query}\"\n\n\
         Give 3 to 5 variations covering alternate spellings, alternate titles \
         and release-specific forms where relevant.\n\n\
         Reply ONLY with JSON:\n\
         {{\n  \"variations\": [\"variation1\", \"variation2\", \"variation3\"]\n}}"
    )
}

/// The `variations` list of the first embedded JSON object that has one.
fn parse_variations(reply: &str) -> Option<Vec<String>> {
    let mut rest = reply;
    while let Some(offset) = rest.find('{') {
        let candidate = &rest[offset..];
        if let Some(object) = extract_json_object(candidate) {
            if let Ok(parsed) = serde_json::from_str::<Expansion>(object) {
                return Some(parsed.variations);
            }
        }
        rest = &candidate[1..];
    }
    None
}

/// Original first, then non-blank variations that differ from everything
/// already kept (case-insensitive), capped at `max`.
fn merge_variants(query: &str, variations: Vec<String>, max: usize) -> Vec<String> {
    let mut out = vec![query.to_owned()];
    for variation in variations {
        if out.len() >= max {
            break;
        }
        let variation = variation.trim();
        if variation.is_empty() {
            continue;
        }
        let lowered = variation.to_lowercase();
        if out.iter().any(|kept| kept.trim().to_lowercase() == lowered) {
            continue;
        }
        out.push(variation.to_owned());
    }
    out
}

/// The `{...}` object starting at the first `{` of `text`, honouring nested
/// braces and quoted strings. `None` if the braces never balance.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

// 🔎 Search - Live text filter over a stock list
//
// A query is split on whitespace. An entry matches when its display name
// contains every word (case-insensitive). Matches are ranked by where the
// earliest word hit occurs in the name; ties keep input order.

use crate::resource::StockEntry;

/// Parsed search text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    text: String,
    words: Vec<String>,
}

impl SearchQuery {
    pub fn new(text: &str) -> Self {
        SearchQuery {
            text: text.to_string(),
            words: tokenize(text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// False when the query has no words (filtering is off).
    pub fn is_active(&self) -> bool {
        !self.words.is_empty()
    }

    /// Best (lowest) character position of any word in `name`, or `None`
    /// if some word does not occur at all.
    pub fn match_position(&self, name: &str) -> Option<usize> {
        // Lowercasing can expand a char ("İ" becomes two), so keep the
        // index of the original char behind each lowercased one.
        let mut haystack = String::with_capacity(name.len());
        let mut origin: Vec<usize> = Vec::with_capacity(name.len());
        for (i, c) in name.chars().enumerate() {
            for lower in c.to_lowercase() {
                haystack.push(lower);
                origin.push(i);
            }
        }

        let mut best: Option<usize> = None;
        for word in &self.words {
            let byte_pos = haystack.find(word.as_str())?;
            let pos = origin.get(haystack[..byte_pos].chars().count()).copied()?;
            best = Some(best.map_or(pos, |b| b.min(pos)));
        }

        best
    }

    pub fn matches(&self, name: &str) -> bool {
        !self.is_active() || self.match_position(name).is_some()
    }

    /// Apply the query to `entries`. An inactive query returns them unchanged.
    pub fn apply(&self, entries: &[StockEntry]) -> Vec<StockEntry> {
        if !self.is_active() {
            return entries.to_vec();
        }

        let mut ranked: Vec<(usize, &StockEntry)> = entries
            .iter()
            .filter_map(|entry| self.match_position(entry.name()).map(|pos| (pos, entry)))
            .collect();

        // sort_by_key is stable
        ranked.sort_by_key(|(pos, _)| *pos);
        ranked.into_iter().map(|(_, entry)| entry.clone()).collect()
    }
}

/// Lower-cased, non-empty words of `query`.
pub fn tokenize(query: &str) -> Vec<String> {
    query.split_whitespace().map(|word| word.to_lowercase()).collect()
}

/// Filter `entries` by `query` (see [`SearchQuery::apply`]).
pub fn filter(entries: &[StockEntry], query: &str) -> Vec<StockEntry> {
    SearchQuery::new(query).apply(entries)
}

// ============================================================================
// TESTS
// ============================================================================

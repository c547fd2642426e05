//! Approximate title matching.

/// Edit-distance ratio in `[0, 1]`; `1.0` means identical.
///
/// Distance counts single-character inserts, deletes, substitutions and
/// adjacent transpositions, each as one edit. Lengths are in chars.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let distance = strsim::osa_distance(a, b);
    (longest - distance.min(longest)) as f64 / longest as f64
}

/// Strictly above `threshold`; a ratio equal to it is not similar.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) > threshold
}

/// A title already present in the catalog, keyed by its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTitle {
    pub id: String,
    pub normalized: String,
}

/// Normalized titles of matchable catalog entries, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    titles: Vec<IndexedTitle>,
}

impl TitleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, normalized: impl Into<String>) {
        self.titles.push(IndexedTitle {
            id: id.into(),
            normalized: normalized.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn find_exact(&self, normalized: &str) -> Option<&IndexedTitle> {
        self.titles.iter().find(|t| t.normalized == normalized)
    }

    /// Closest title strictly above `threshold`; the earliest one wins ties.
    pub fn find_similar(&self, normalized: &str, threshold: f64) -> Option<(&IndexedTitle, f64)> {
        let mut best: Option<(&IndexedTitle, f64)> = None;
        for title in &self.titles {
            let ratio = similarity(normalized, &title.normalized);
            if ratio > threshold && best.is_none_or(|(_, r)| ratio > r) {
                best = Some((title, ratio));
            }
        }
        best
    }
}

// ── Fieldmind: Term Vectorizer ─────────────────────────────────────────────
//
// From-scratch TF-IDF over a conversational corpus. No external ML crate:
// the corpus is small (hundreds of exchanges) and a dense Vec<f32> per
// document is cheaper than any model dependency.
//
// idf = ln(N / df) + 1, so a term present in every document still carries
// weight 1 rather than vanishing. Rows are L2-normalized; an empty or fully
// out-of-vocabulary document transforms to the zero vector, never an error.

use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::tokenizer::alnum_tokens;
use log::debug;
use std::collections::HashMap;

pub struct TermVectorizer {
    /// Minimum document frequency (absolute count) for a term to survive.
    min_df: usize,
    /// Maximum document frequency as a fraction of the corpus.
    max_df: f64,
    /// Optional cap on vocabulary size, keeping the highest-df terms.
    max_features: Option<usize>,

    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    fitted: bool,
}

impl Default for TermVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TermVectorizer {
    pub fn new() -> Self {
        Self {
            min_df: 1,
            max_df: 1.0,
            max_features: None,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            fitted: false,
        }
    }

    pub fn with_params(min_df: usize, max_df: f64, max_features: Option<usize>) -> Self {
        Self {
            min_df: min_df.max(1),
            max_df: max_df.clamp(0.0, 1.0),
            max_features,
            ..Self::new()
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Learn the vocabulary and IDF weights from a corpus. An empty corpus
    /// fits an empty vocabulary (fit_transform then yields zero rows).
    pub fn fit(&mut self, documents: &[String]) {
        self.vocabulary.clear();
        self.idf.clear();

        let n_docs = documents.len();
        let mut df: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let mut seen: Vec<String> = alnum_tokens(doc);
            seen.sort();
            seen.dedup();
            for token in seen {
                *df.entry(token).or_insert(0) += 1;
            }
        }

        let mut terms: Vec<(String, usize)> = df
            .into_iter()
            .filter(|(_, count)| {
                *count >= self.min_df && (*count as f64) <= self.max_df * n_docs as f64
            })
            .collect();

        if let Some(cap) = self.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(cap);
        }
        // Alphabetical index assignment keeps vector layout deterministic.
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        self.idf = terms
            .iter()
            .map(|(_, count)| ((n_docs as f32 / *count as f32).ln() + 1.0))
            .collect();
        self.vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, (term, _))| (term, i))
            .collect();
        self.fitted = true;
        debug!(
            "[vectorizer] Fitted: {} docs, {} terms",
            n_docs,
            self.vocabulary.len()
        );
    }

    /// Transform documents into L2-normalized TF-IDF rows. Unknown tokens are
    /// ignored; a document with no known tokens becomes the zero vector.
    pub fn transform(&self, documents: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        if !self.fitted {
            return Err(EngineError::Data(
                "vectorizer used before fit".to_string(),
            ));
        }
        let dim = self.vocabulary.len();
        let mut rows = Vec::with_capacity(documents.len());
        for doc in documents {
            let mut row = vec![0.0f32; dim];
            for token in alnum_tokens(doc) {
                if let Some(&idx) = self.vocabulary.get(&token) {
                    row[idx] += self.idf[idx];
                }
            }
            l2_normalize(&mut row);
            rows.push(row);
        }
        Ok(rows)
    }

    pub fn fit_transform(&mut self, documents: &[String]) -> EngineResult<Vec<Vec<f32>>> {
        self.fit(documents);
        self.transform(documents)
    }
}

fn l2_normalize(row: &mut [f32]) {
    let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in row.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity clamped to [0, 1]. Either operand being the zero vector
/// yields 0.0. Length mismatch is a caller bug but answers 0.0 rather than
/// panicking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot as f64 / (norm_a as f64 * norm_b as f64)).clamp(0.0, 1.0)
}

/// Linear scan for the `k` rows most similar to `query`. Returns (row index,
/// similarity) pairs sorted by descending similarity.
pub fn find_nearest_neighbors(query: &[f32], rows: &[Vec<f32>], k: usize) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64)> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query, row)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(k);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_corpus_yields_zero_rows() {
        let mut v = TermVectorizer::new();
        let rows = v.fit_transform(&[]).unwrap();
        assert!(rows.is_empty());
        assert_eq!(v.vocabulary_size(), 0);
    }

    #[test]
    fn test_unseen_tokens_transform_to_zero_vector() {
        let mut v = TermVectorizer::new();
        v.fit(&docs(&["cats eat fish", "dogs eat meat"]));

        let rows = v.transform(&docs(&["quantum entanglement"])).unwrap();
        assert!(rows[0].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_transform_before_fit_is_an_error() {
        let v = TermVectorizer::new();
        assert!(v.transform(&docs(&["anything"])).is_err());
    }

    #[test]
    fn test_rows_are_l2_normalized() {
        let mut v = TermVectorizer::new();
        let rows = v
            .fit_transform(&docs(&["alpha beta gamma", "alpha delta"]))
            .unwrap();
        for row in &rows {
            let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_rare_term_outweighs_common_term() {
        let mut v = TermVectorizer::new();
        v.fit(&docs(&["shared rare", "shared other", "shared thing"]));

        let rows = v.transform(&docs(&["shared rare"])).unwrap();
        let rare_idx = v.vocabulary["rare"];
        let shared_idx = v.vocabulary["shared"];
        assert!(rows[0][rare_idx] > rows[0][shared_idx]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = TermVectorizer::with_params(1, 1.0, Some(1));
        v.fit(&docs(&["common unique1", "common unique2"]));
        assert_eq!(v.vocabulary_size(), 1);
        assert!(v.vocabulary.contains_key("common"));
    }

    #[test]
    fn test_min_df_filters_rare_terms() {
        let mut v = TermVectorizer::with_params(2, 1.0, None);
        v.fit(&docs(&["common unique1", "common unique2"]));
        assert_eq!(v.vocabulary_size(), 1);
        assert!(v.vocabulary.contains_key("common"));
    }

    #[test]
    fn test_cosine_identity_and_zero() {
        let v = vec![0.5f32, 0.5, 0.2];
        let zero = vec![0.0f32, 0.0, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&v, &[0.1, 0.2]), 0.0);
    }

    #[test]
    fn test_nearest_neighbors_orders_by_similarity() {
        let mut v = TermVectorizer::new();
        let rows = v
            .fit_transform(&docs(&[
                "cats like fish",
                "dogs like meat",
                "stock markets fell today",
            ]))
            .unwrap();
        let query = v.transform(&docs(&["cats like fish a lot"])).unwrap();

        let neighbors = find_nearest_neighbors(&query[0], &rows, 2);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].0, 0);
        assert!(neighbors[0].1 > neighbors[1].1);
    }
}

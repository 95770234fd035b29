// ── Fieldmind: Tokenization ────────────────────────────────────────────────
//
// Single source of truth for text → token handling across the engine.
// Two deliberately different tokenizations coexist:
//
//   - `extract_words`: the memory/index tokenization. Lowercases, strips
//     sentence punctuation, splits on whitespace and drops tokens of length
//     ≤ 2. Short function words carry no retrieval signal at this scale.
//   - `alnum_tokens`: the vectorizer tokenization. Lowercased alphanumeric
//     runs, no length filter — TF-IDF does its own frequency filtering.
//
// All n-gram keys are produced here so the index and the tests agree on the
// exact key format.

/// Memory tokenization: lowercase, strip `.,!?;:"`, drop tokens of length ≤ 2.
pub fn extract_words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| !matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '"' | '(' | ')'))
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// Vectorizer tokenization: lowercased alphanumeric runs.
pub fn alnum_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Plain whitespace split, lowercased. Used by the metrics suite, which
/// keeps every token (entropy over "a a a" must see three tokens).
pub fn whitespace_tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// Adjacent bigram keys: `["a","b","c"]` → `["a b", "b c"]`.
pub fn bigram_keys(words: &[String]) -> Vec<String> {
    words.windows(2).map(|w| w.join(" ")).collect()
}

/// Adjacent trigram keys: `["a","b","c","d"]` → `["a b c", "b c d"]`.
pub fn trigram_keys(words: &[String]) -> Vec<String> {
    words.windows(3).map(|w| w.join(" ")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_words_filters_short_tokens() {
        let words = extract_words("I am at the big house");
        assert_eq!(words, vec!["the", "big", "house"]);
    }

    #[test]
    fn test_extract_words_strips_punctuation() {
        let words = extract_words("Hello, world! What's up?");
        assert_eq!(words, vec!["hello", "world", "what's"]);
    }

    #[test]
    fn test_extract_words_empty() {
        assert!(extract_words("").is_empty());
        assert!(extract_words("a b c").is_empty());
    }

    #[test]
    fn test_alnum_tokens_keeps_short_tokens() {
        let tokens = alnum_tokens("A b-c, d2!");
        assert_eq!(tokens, vec!["a", "b", "c", "d2"]);
    }

    #[test]
    fn test_ngram_keys() {
        let words: Vec<String> = ["cats", "like", "fish"].iter().map(|s| s.to_string()).collect();
        assert_eq!(bigram_keys(&words), vec!["cats like", "like fish"]);
        assert_eq!(trigram_keys(&words), vec!["cats like fish"]);
        assert!(trigram_keys(&words[..2]).is_empty());
    }

    #[test]
    fn test_whitespace_tokens_keeps_repeats() {
        assert_eq!(whitespace_tokens("a a A"), vec!["a", "a", "a"]);
    }
}

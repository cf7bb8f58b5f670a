//! Token extraction shared by query building and candidate scoring.

use crate::CatalogEntry;

/// Minimum token length kept by [`tokenize`]; shorter tokens are noise
/// ("of", "ml", "a") for tag matching.
const MIN_TOKEN_LEN: usize = 3;

/// Split free text into lowercase alphanumeric tokens longer than two
/// characters, de-duplicated in first-seen order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.chars().count() < MIN_TOKEN_LEN {
            continue;
        }
        let token = raw.to_lowercase();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Tokens derived from an entry's name, brand and category.
pub fn entry_tokens(entry: &CatalogEntry) -> Vec<String> {
    let mut tokens = Vec::new();
    for field in [&entry.name, &entry.brand, &entry.category]
        .into_iter()
        .flatten()
    {
        for token in tokenize(field) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_drops_short_words() {
        assert_eq!(
            tokenize("Argan Oil Shampoo, 250ml & more"),
            vec!["argan", "oil", "shampoo", "250ml", "more"]
        );
    }

    #[test]
    fn tokenize_strips_punctuation_and_dedups() {
        assert_eq!(tokenize("shampoo-bottle/Shampoo!"), vec!["shampoo", "bottle"]);
    }

    #[test]
    fn tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("a b c").is_empty());
    }

    #[test]
    fn entry_tokens_combines_fields() {
        let entry = CatalogEntry {
            name: Some("Argan Shampoo".into()),
            brand: Some("Acme".into()),
            category: Some("shampoo".into()),
            ..CatalogEntry::new("p001")
        };
        assert_eq!(entry_tokens(&entry), vec!["argan", "shampoo", "acme"]);
    }
}

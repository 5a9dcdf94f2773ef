/// Splits raw queries into lexicon lookup terms.
///
/// Terms are separated by whitespace and passed through unchanged: lexicon
/// lookups are case-sensitive and normalization belongs to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn terms<'a>(&self, query: &'a str) -> Vec<&'a str> {
        query.split_whitespace().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms() {
        let tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.terms("  cat\tDog  fish\n"), vec!["cat", "Dog", "fish"]);
        assert!(tokenizer.terms("   ").is_empty());
    }
}

//! Fuzzy ranking shared by completion and oracle lookups, via [`nucleo_matcher`].

use itertools::Itertools;
use nucleo_matcher::{
    pattern::{CaseMatching, Normalization, Pattern},
    Matcher, Utf32Str,
};

pub trait Matchable {
    fn match_string(&self) -> &str;
}

/// A parsed query that scores candidate strings against itself.
pub struct Similarity {
    matcher: Matcher,
    pattern: Pattern,
    buf: Vec<char>,
}

impl Similarity {
    pub fn new(query: &str) -> Similarity {
        Similarity {
            matcher: Matcher::new(nucleo_matcher::Config::DEFAULT),
            pattern: Pattern::parse(query, CaseMatching::Smart, Normalization::Smart),
            buf: Vec::new(),
        }
    }

    /// Match score of `haystack`; 0 when it does not match at all.
    pub fn score(&mut self, haystack: &str) -> u32 {
        self.pattern
            .score(Utf32Str::new(haystack, &mut self.buf), &mut self.matcher)
            .unwrap_or_default()
    }
}

/// Items matching `query`, best first. Equal scores keep their input order.
pub fn fuzzy_match<T: Matchable>(query: &str, items: impl IntoIterator<Item = T>) -> Vec<(T, u32)> {
    let mut similarity = Similarity::new(query);

    items
        .into_iter()
        .map(|item| {
            let score = similarity.score(item.match_string());
            (item, score)
        })
        // Remove all items with no matches
        .filter(|(_, score)| *score > 0)
        // sorted_by is stable
        .sorted_by(|(_, a), (_, b)| Ord::cmp(b, a))
        .collect_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Matchable for &str {
        fn match_string(&self) -> &str {
            self
        }
    }

    #[test]
    fn test_exact_match_scores_above_partial() {
        let mut similarity = Similarity::new("Dict.map");
        assert!(similarity.score("Dict.map") > 0);
        assert_eq!(similarity.score("List.map"), 0);
    }

    #[test]
    fn test_fuzzy_match_drops_non_matches() {
        let ranked = fuzzy_match("fold", ["List.foldl", "List.map", "Dict.foldr"]);
        let names = ranked.into_iter().map(|(name, _)| name).collect_vec();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"List.foldl"));
        assert!(names.contains(&"Dict.foldr"));
    }
}

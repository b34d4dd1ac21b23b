//! Completions from the inference cache of one file.
//!
//! Candidates are the records the oracle reported for the file, fuzzy-ranked
//! against the prefix before the cursor.

use itertools::Itertools;

use crate::{
    indexer::{IndexCacheEntry, InferenceRecord},
    matcher::{fuzzy_match, Matchable},
};

pub mod snippet;

/// One completion as handed to the editor shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// `fullName : signature`
    pub display_label: String,
    /// Snippet with one tab stop per argument
    pub insert_text: String,
    pub documentation: String,
}

impl Completion {
    pub fn from_record(record: &InferenceRecord) -> Completion {
        Completion {
            display_label: record.render(),
            insert_text: snippet::snippet(&record.name, &record.signature),
            documentation: record.comment.clone(),
        }
    }

    pub fn into_pair(self) -> (String, String) {
        (self.display_label, self.insert_text)
    }
}

impl Matchable for &InferenceRecord {
    fn match_string(&self) -> &str {
        &self.full_name
    }
}

/// At most `limit` completions for `prefix`, best first.
///
/// An empty prefix lists the records in the order the oracle reported them.
/// Records with the same full name are offered once.
pub fn completions_for_prefix(
    records: &[InferenceRecord],
    prefix: &str,
    limit: usize,
) -> Vec<Completion> {
    let ranked = match prefix.trim() {
        "" => records.iter().collect_vec(),
        prefix => fuzzy_match(prefix, records.iter())
            .into_iter()
            .map(|(record, _)| record)
            .collect_vec(),
    };

    ranked
        .into_iter()
        .unique_by(|&record| &record.full_name)
        .take(limit)
        .map(Completion::from_record)
        .collect()
}

/// Completions from a cache snapshot; no snapshot means no completions.
pub fn completions_from_entry(
    entry: Option<&IndexCacheEntry>,
    prefix: &str,
    limit: usize,
) -> Vec<Completion> {
    entry
        .map(|entry| completions_for_prefix(&entry.declarations, prefix, limit))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{indexer::parse_inference_output, test_utils::DICT_ORACLE_OUTPUT};

    fn records() -> Vec<InferenceRecord> {
        parse_inference_output(DICT_ORACLE_OUTPUT).unwrap()
    }

    #[test]
    fn test_prefix_ranks_and_renders() {
        let completions = completions_for_prefix(&records(), "List.fo", 10);

        assert_eq!(
            completions[0].clone().into_pair(),
            (
                "List.foldl : (a -> b -> b) -> b -> List a -> b".to_string(),
                "foldl ${1:function} ${2:b} ${3:list}".to_string()
            )
        );
        assert!(completions
            .iter()
            .all(|completion| completion.display_label.starts_with("List.")));
    }

    #[test]
    fn test_limit_applies_after_ranking() {
        assert_eq!(completions_for_prefix(&records(), "map", 1).len(), 1);
        assert_eq!(completions_for_prefix(&records(), "", 3).len(), 3);
        assert!(completions_for_prefix(&records(), "zzz", 10).is_empty());
    }

    #[test]
    fn test_duplicate_full_names_are_offered_once() {
        let mut records = records();
        records.push(records[0].clone());
        assert_eq!(completions_for_prefix(&records, "", 50).len(), 4);
    }

    #[test]
    fn test_no_snapshot_means_nothing() {
        assert!(completions_from_entry(None, "map", 10).is_empty());
    }
}

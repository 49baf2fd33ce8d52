use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::labels::Labels;

/// An unordered, deduplicated set of `key:value` style tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns a copy of this set with `tag` added.
    pub fn with(&self, tag: impl Into<String>) -> Tags {
        let mut tags = self.clone();
        tags.insert(tag);
        tags
    }

    /// Adds a `name:value` tag for every non-reserved label.
    pub fn extend_from_labels(&mut self, labels: &Labels) {
        self.0.extend(labels.public().map(|l| l.to_tag()));
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Tags(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for Tags {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let mut tags: Tags = ["env:prod", "team:db"].into_iter().collect();
        assert!(!tags.insert("env:prod"));
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.to_string(), "env:prod,team:db");
    }

    #[test]
    fn extend_from_labels_ignores_reserved() {
        let labels: Labels = [("__metrics_path__", "/m"), ("region", "us-east")]
            .into_iter()
            .collect();
        let mut tags = Tags::new();
        tags.extend_from_labels(&labels);
        assert_eq!(tags.into_vec(), vec!["region:us-east".to_string()]);
    }

    #[test]
    fn with_leaves_the_original_untouched() {
        let base: Tags = ["a:1"].into_iter().collect();
        let extended = base.with("b:2");
        assert_eq!(base.len(), 1);
        assert!(extended.contains("b:2"));
    }
}

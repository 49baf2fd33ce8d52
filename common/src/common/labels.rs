use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Labels starting with this prefix are consumed internally and never become tags.
pub const RESERVED_LABEL_PREFIX: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.name.starts_with(RESERVED_LABEL_PREFIX)
    }

    /// Renders the label in `name:value` tag form.
    pub fn to_tag(&self) -> String {
        format!("{}:{}", self.name, self.value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=\"{}\"", self.name, self.value)
    }
}

/// A label set kept sorted by name, with at most one value per name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Labels(Vec<Label>);

impl Labels {
    pub fn new(labels: Vec<Label>) -> Self {
        let mut set = Labels(Vec::with_capacity(labels.len()));
        for label in labels {
            set.set(label.name, label.value);
        }
        set
    }

    pub fn from_map(map: BTreeMap<String, String>) -> Labels {
        // BTreeMap iteration is already sorted and unique.
        Labels(
            map.into_iter()
                .map(|(name, value)| Label::new(name, value))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|l| l.name.as_str().cmp(name))
            .ok()
            .map(|i| self.0[i].value.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.binary_search_by(|l| l.name.cmp(&name)) {
            Ok(i) => self.0[i].value = value,
            Err(i) => self.0.insert(i, Label { name, value }),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    /// Labels that are safe to expose, i.e. everything but the reserved `__*` ones.
    pub fn public(&self) -> impl Iterator<Item = &Label> {
        self.0.iter().filter(|l| !l.is_reserved())
    }

    /// Yields `(name without prefix, value)` for every label whose name starts with `prefix`.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.0.iter().filter_map(move |l| {
            l.name
                .strip_prefix(prefix)
                .map(|name| (name, l.value.as_str()))
        })
    }
}

impl From<BTreeMap<String, String>> for Labels {
    fn from(map: BTreeMap<String, String>) -> Self {
        Labels::from_map(map)
    }
}

impl From<Labels> for BTreeMap<String, String> {
    fn from(labels: Labels) -> Self {
        labels.0.into_iter().map(|l| (l.name, l.value)).collect()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Labels {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Labels::new(iter.into_iter().map(|(n, v)| Label::new(n, v)).collect())
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", label)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_names_sorted_and_unique() {
        let mut labels = Labels::default();
        labels.set("region", "us-east");
        labels.set("env", "prod");
        labels.set("region", "eu-west");

        let names: Vec<_> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["env", "region"]);
        assert_eq!(labels.get("region"), Some("eu-west"));
        assert_eq!(labels.get("missing"), None);
    }

    #[test]
    fn public_skips_reserved_labels() {
        let labels: Labels = [
            ("__metrics_path__", "/status"),
            ("__param_format", "text"),
            ("env", "prod"),
        ]
        .into_iter()
        .collect();

        let public: Vec<_> = labels.public().map(Label::to_tag).collect();
        assert_eq!(public, vec!["env:prod"]);
    }

    #[test]
    fn with_prefix_strips_the_prefix() {
        let labels: Labels = [("__param_a", "1"), ("__param_b", "2"), ("b", "3")]
            .into_iter()
            .collect();

        let params: Vec<_> = labels.with_prefix("__param_").collect();
        assert_eq!(params, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn deserializes_from_a_json_object() {
        let labels: Labels =
            serde_json::from_str(r#"{"region": "us-east", "__metrics_path__": "status"}"#)
                .unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels.get("__metrics_path__"), Some("status"));
        assert_eq!(
            labels.to_string(),
            r#"{__metrics_path__="status", region="us-east"}"#
        );
    }
}

/// Sample identifiers and per-sample collections
use std::collections::btree_map::{self, BTreeMap};
use log::warn;
use crate::config::defs::PipelineError;

/// Sample id of a file: its first two underscore-separated tokens.
///
/// When the name has no more than two tokens the extension of the last one
/// is dropped, so `X1_S1.bam` and `X1_S1_markdup.bam` both give `X1_S1`.
pub fn sample_id(file_name: &str) -> String {
    let parts: Vec<&str> = file_name.splitn(3, '_').collect();
    match parts.as_slice() {
        [first, second, _rest] => format!("{}_{}", first, second),
        [first, second] => format!("{}_{}", first, strip_extensions(second)),
        _ => strip_extensions(file_name).to_string(),
    }
}

fn strip_extensions(name: &str) -> &str {
    match name.find('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Ordered mapping from sample id to a value.
///
/// Lookups never create entries: `get` returns None and `require` errors for
/// unknown samples. Entries are only created by `insert` or, explicitly,
/// by `get_or_insert_default`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMap<V> {
    inner: BTreeMap<String, V>,
}

impl<V> Default for SampleMap<V> {
    fn default() -> Self {
        SampleMap { inner: BTreeMap::new() }
    }
}

impl<V> SampleMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing (and warning about) any earlier one.
    pub fn insert(&mut self, sample: impl Into<String>, value: V) -> Option<V> {
        let sample = sample.into();
        let previous = self.inner.insert(sample.clone(), value);
        if previous.is_some() {
            warn!("Duplicate entry for sample {}; keeping the last one", sample);
        }
        previous
    }

    pub fn get(&self, sample: &str) -> Option<&V> {
        self.inner.get(sample)
    }

    pub fn require(&self, sample: &str, what: &str) -> Result<&V, PipelineError> {
        self.inner.get(sample).ok_or_else(|| PipelineError::MissingSample {
            sample: sample.to_string(),
            what: what.to_string(),
        })
    }

    pub fn remove(&mut self, sample: &str) -> Option<V> {
        self.inner.remove(sample)
    }

    pub fn contains(&self, sample: &str) -> bool {
        self.inner.contains_key(sample)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, V> {
        self.inner.iter()
    }

    pub fn values(&self) -> btree_map::Values<'_, String, V> {
        self.inner.values()
    }

    /// Keeps only the samples in `allowed`, values untouched.
    pub fn retain_samples<S: AsRef<str>>(mut self, allowed: &[S]) -> Self {
        self.inner
            .retain(|sample, _| allowed.iter().any(|a| a.as_ref() == sample));
        self
    }
}

impl<V: Default> SampleMap<V> {
    pub fn get_or_insert_default(&mut self, sample: &str) -> &mut V {
        self.inner.entry(sample.to_string()).or_default()
    }
}

impl<V> IntoIterator for SampleMap<V> {
    type Item = (String, V);
    type IntoIter = btree_map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a SampleMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = btree_map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<V> FromIterator<(String, V)> for SampleMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        SampleMap { inner: iter.into_iter().collect() }
    }
}

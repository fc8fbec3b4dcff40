//! Declared tags and their last-read snapshot

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::TagValue;
use crate::error::ConfigError;
use crate::source::{SourceError, TagSource};

/// A named data point read from the controller every cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Controller-side identifier
    pub name: String,
    /// Column label used in output records
    pub description: String,
    #[serde(skip)]
    value: Option<TagValue>,
    #[serde(skip)]
    valid: bool,
}

impl Tag {
    /// Create a tag that has not been read yet
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: None,
            valid: false,
        }
    }

    /// Value from the last read, if any
    pub fn value(&self) -> Option<&TagValue> {
        self.value.as_ref()
    }

    /// Whether the last read succeeded with a non-null value
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether `other` declares the same data point (name and description)
    pub fn is_same_point(&self, other: &Tag) -> bool {
        self.name == other.name && self.description == other.description
    }

    /// Read the tag from `source`.
    ///
    /// A null value is a soft failure: the call succeeds but the tag is
    /// marked invalid. Errors also mark the tag invalid and are returned.
    pub async fn update<S: TagSource>(&mut self, source: &mut S) -> Result<(), SourceError> {
        match source.read(&self.name).await {
            Ok(value) => {
                self.valid = value.is_some();
                self.value = value;
                Ok(())
            }
            Err(e) => {
                self.valid = false;
                self.value = None;
                Err(e)
            }
        }
    }
}

/// A non-fatal read failure for one tag
#[derive(Debug)]
pub struct TagReadFailure {
    /// Name of the tag that failed
    pub tag: String,
    /// What went wrong
    pub error: SourceError,
}

/// Outcome of updating every tag once
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Tags whose read failed outright
    pub failures: Vec<TagReadFailure>,
    /// Tags that were read but returned no value
    pub null_reads: Vec<String>,
}

impl CycleReport {
    /// Whether every tag was read with a value
    pub fn all_valid(&self) -> bool {
        self.failures.is_empty() && self.null_reads.is_empty()
    }
}

/// Ordered set of declared tags, unique by name
#[derive(Debug, Clone)]
pub struct TagRegistry {
    tags: Vec<Tag>,
}

impl TagRegistry {
    /// Build a registry, keeping declaration order
    pub fn new(tags: Vec<Tag>) -> Result<Self, ConfigError> {
        if tags.is_empty() {
            return Err(ConfigError::EmptyTags);
        }

        let mut seen = HashSet::new();
        for tag in &tags {
            if !seen.insert(tag.name.as_str()) {
                return Err(ConfigError::DuplicateTag(tag.name.clone()));
            }
        }

        Ok(Self { tags })
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate tags in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    /// Find a tag by controller name
    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Tag at a declaration index
    pub fn get_index(&self, index: usize) -> Option<&Tag> {
        self.tags.get(index)
    }

    /// Declaration index of the tag declaring the same point as `tag`
    pub fn position_of(&self, tag: &Tag) -> Option<usize> {
        self.tags.iter().position(|t| t.is_same_point(tag))
    }

    /// Check whether `tag` is one of the declared tags
    pub fn contains(&self, tag: &Tag) -> bool {
        self.position_of(tag).is_some()
    }

    /// Column labels in declaration order
    pub fn descriptions(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.description.clone()).collect()
    }

    /// Names of tags whose last read was not valid
    pub fn invalid_tags(&self) -> Vec<String> {
        self.tags
            .iter()
            .filter(|t| !t.valid)
            .map(|t| t.name.clone())
            .collect()
    }

    /// Update every tag once.
    ///
    /// Per-tag failures are collected and do not stop the remaining reads.
    /// A fatal source error aborts the pass and is returned.
    pub async fn update_all<S: TagSource>(
        &mut self,
        source: &mut S,
    ) -> Result<CycleReport, SourceError> {
        let mut report = CycleReport::default();

        for tag in &mut self.tags {
            match tag.update(source).await {
                Ok(()) if tag.valid => {}
                Ok(()) => report.null_reads.push(tag.name.clone()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.failures.push(TagReadFailure {
                    tag: tag.name.clone(),
                    error: e,
                }),
            }
        }

        Ok(report)
    }

    /// Read every tag once and report whether all of them are valid.
    ///
    /// Each unreadable tag is logged by name.
    pub async fn validate_all<S: TagSource>(&mut self, source: &mut S) -> bool {
        tracing::info!("Validating {} tags.", self.tags.len());
        let mut all_valid = true;

        for tag in &mut self.tags {
            match tag.update(source).await {
                Ok(()) if tag.valid => {}
                Ok(()) => {
                    all_valid = false;
                    tracing::warn!(tag = %tag.name, "Tag returned no value from the controller.");
                }
                Err(e) => {
                    all_valid = false;
                    tracing::warn!(
                        tag = %tag.name,
                        error = %e,
                        "Tag could not be read from the controller."
                    );
                }
            }
        }

        if all_valid {
            tracing::info!("All tags valid.");
        }
        all_valid
    }
}

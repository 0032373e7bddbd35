//! Class-id to label-name mapping (`coco.names` style files).

use crate::error::{Result, SeesayError};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Loads one label per line; line N names class N.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SeesayError::LabelsNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SeesayError::Io(e)
            }
        })?;
        Ok(Self::parse(&contents))
    }

    /// Leading and trailing blank lines are dropped. Blank lines in between
    /// keep their position so later class ids still line up.
    pub fn parse(contents: &str) -> Self {
        let contents = contents.trim();
        if contents.is_empty() {
            return Self::default();
        }
        Self {
            labels: contents.lines().map(|line| line.trim().to_string()).collect(),
        }
    }

    pub fn from_labels<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// `None` for ids past the end and for blank entries.
    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.labels
            .get(class_id)
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    /// Label for `class_id`, or `"class <id>"` when the file has no entry.
    pub fn name(&self, class_id: usize) -> String {
        self.get(class_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("class {class_id}"))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

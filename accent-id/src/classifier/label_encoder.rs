//! Label set of a pretrained accent classifier
//!
//! Parses the `label_encoder.txt` file shipped with SpeechBrain checkpoints:
//!
//! ```text
//! 'us' => 0
//! 'england' => 1
//! ================
//! 'starting_index' => 0
//! ```
//!
//! Entries are kept in file order. The position of an entry in that order and
//! the integer stored beside it are distinct values; see [`LabelEncoder::position_of`].

use accent_common::{Error, Result};
use std::path::Path;

/// Ordered mapping from label name to stored index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEncoder {
    entries: Vec<(String, usize)>,
}

impl LabelEncoder {
    /// Build an encoder from `(label, index)` pairs, preserving their order
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(l, i)| (l.into(), i)).collect(),
        }
    }

    /// Build an encoder whose stored indices equal positions
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_entries(labels.into_iter().enumerate().map(|(i, l)| (l, i)))
    }

    /// Read a SpeechBrain `label_encoder.txt`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Model(format!("Failed to read label encoder {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse SpeechBrain label encoder text
    ///
    /// Lines after the `=====` separator carry encoder metadata and are ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("=====") {
                break;
            }

            let (label, index) = line.rsplit_once("=>").ok_or_else(|| {
                Error::Model(format!("label encoder line {}: missing '=>'", line_no + 1))
            })?;
            let label = unquote(label.trim());
            let index = index.trim().parse::<usize>().map_err(|e| {
                Error::Model(format!("label encoder line {}: bad index: {}", line_no + 1, e))
            })?;
            entries.push((label.to_string(), index));
        }

        if entries.is_empty() {
            return Err(Error::Model("label encoder has no labels".to_string()));
        }

        Ok(Self { entries })
    }

    /// Label names in iteration order
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    /// `(label, stored index)` pairs in iteration order
    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the first entry named `label` in iteration order
    ///
    /// This is the index used into a probability distribution. It is not the
    /// stored index, which only coincides when the file lists labels in
    /// encoding order.
    pub fn position_of(&self, label: &str) -> Option<usize> {
        self.labels().position(|l| l == label)
    }

    /// Label whose stored index equals `index`
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, i)| *i == index)
            .map(|(l, _)| l.as_str())
    }

    /// True when every stored index equals its position
    pub fn is_position_aligned(&self) -> bool {
        self.entries.iter().enumerate().all(|(pos, (_, i))| pos == *i)
    }
}

fn unquote(s: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|s| s.strip_suffix(quote)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "'england' => 0\n\
                          'us' => 1\n\
                          'canada' => 2\n\
                          \n\
                          ================\n\
                          'starting_index' => 0\n";

    #[test]
    fn test_parse_speechbrain_format() {
        let encoder = LabelEncoder::parse(SAMPLE).unwrap();
        assert_eq!(encoder.len(), 3);
        assert_eq!(
            encoder.labels().collect::<Vec<_>>(),
            vec!["england", "us", "canada"]
        );
        assert!(encoder.is_position_aligned());
    }

    #[test]
    fn test_metadata_after_separator_is_ignored() {
        let encoder = LabelEncoder::parse(SAMPLE).unwrap();
        assert_eq!(encoder.position_of("starting_index"), None);
    }

    #[test]
    fn test_position_differs_from_stored_index() {
        let encoder = LabelEncoder::parse("'us' => 5\n'england' => 0\n").unwrap();
        assert_eq!(encoder.position_of("us"), Some(0));
        assert_eq!(encoder.decode(5), Some("us"));
        assert!(!encoder.is_position_aligned());
    }

    #[test]
    fn test_first_match_wins() {
        let encoder = LabelEncoder::from_entries([("a", 0), ("us", 1), ("us", 2)]);
        assert_eq!(encoder.position_of("us"), Some(1));
    }

    #[test]
    fn test_double_quoted_and_bare_labels() {
        let encoder = LabelEncoder::parse("\"us\" => 0\nindian => 1\n").unwrap();
        assert_eq!(encoder.labels().collect::<Vec<_>>(), vec!["us", "indian"]);
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(LabelEncoder::parse("'us' 0\n").is_err());
        assert!(LabelEncoder::parse("'us' => zero\n").is_err());
        assert!(LabelEncoder::parse("================\n'starting_index' => 0\n").is_err());
    }
}

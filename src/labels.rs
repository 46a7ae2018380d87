//! Class-id → label tables read from CSV-like text.

use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read labels {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("label table is empty")]
    Empty,
    #[error("{labels} labels for a model with {classes} classes")]
    ClassCount { labels: usize, classes: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// First column of every non-blank line. A leading UTF-8 BOM and
    /// double quotes around the field are stripped.
    pub fn parse(text: &str) -> Result<Self, LabelError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let labels: Vec<String> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(first_field)
            .collect();
        if labels.is_empty() {
            return Err(LabelError::Empty);
        }
        Ok(Self { labels })
    }

    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let text = fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Every class the model can emit must have a label.
    pub fn ensure_covers(&self, classes: usize) -> Result<(), LabelError> {
        if self.labels.len() < classes {
            return Err(LabelError::ClassCount {
                labels: self.labels.len(),
                classes,
            });
        }
        Ok(())
    }
}

fn first_field(line: &str) -> String {
    let line = line.trim_end_matches('\r');
    if let Some(rest) = line.strip_prefix('"') {
        // quoted: "" is an escaped quote, a lone " closes the field
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    out.push('"');
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        return out;
    }
    line.split(',').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_column() {
        let t = LabelTable::parse("\u{feff}Open\nClose,extra\n\nPointer\r\nOK\n").unwrap();
        assert_eq!(t.iter().collect::<Vec<_>>(), vec!["Open", "Close", "Pointer", "OK"]);
        assert_eq!(t.get(2), Some("Pointer"));
        assert_eq!(t.get(9), None);
    }

    #[test]
    fn quoted_fields() {
        let t = LabelTable::parse("\"Stop, please\",x\n\"say \"\"hi\"\"\"\n").unwrap();
        assert_eq!(t.get(0), Some("Stop, please"));
        assert_eq!(t.get(1), Some("say \"hi\""));
    }

    #[test]
    fn empty_table_rejected() {
        assert!(matches!(LabelTable::parse("\n\n"), Err(LabelError::Empty)));
    }

    #[test]
    fn coverage_check() {
        let t = LabelTable::parse("a\nb\n").unwrap();
        assert!(t.ensure_covers(2).is_ok());
        assert!(matches!(
            t.ensure_covers(3),
            Err(LabelError::ClassCount {
                labels: 2,
                classes: 3
            })
        ));
    }
}

use std::path::Path;

use crate::error::SourceError;

/// The text corpus handed out to workers, one line per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    lines: Vec<String>,
}

impl Corpus {
    /// Builds a corpus from in-memory text. Line endings (`\n` or `\r\n`) are stripped.
    pub fn from_text(text: &str) -> Self {
        Corpus {
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Corpus {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Reads a corpus file from disk.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let corpus = Corpus::from_text(&text);
        log::debug!("Loaded corpus {} ({} lines)", path.display(), corpus.len());
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// An endless cursor over the corpus.
    pub fn cursor(self) -> CorpusCursor {
        CorpusCursor { corpus: self, next: 0 }
    }
}

/// Cycles through a [`Corpus`], wrapping back to the first line after the last.
#[derive(Debug, Clone)]
pub struct CorpusCursor {
    corpus: Corpus,
    next: usize,
}

impl CorpusCursor {
    /// Returns the next line, or `None` if the corpus has no lines at all.
    pub fn next_line(&mut self) -> Option<&str> {
        if self.corpus.is_empty() {
            return None;
        }
        if self.next >= self.corpus.len() {
            log::debug!("Corpus exhausted, rewinding to the first line");
            self.next = 0;
        }
        let idx = self.next;
        self.next += 1;
        Some(self.corpus.lines[idx].as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }
}

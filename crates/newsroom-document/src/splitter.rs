use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::{Chunk, Document};

/// How text is cut into chunks. Sizes are counted in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Fixed-width sliding window.
    #[default]
    Characters,
    /// Whole sentences packed up to the size limit.
    Sentences,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SplitterConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default)]
    pub mode: SplitMode,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            mode: SplitMode::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.content;
        if text.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size.max(1);
        let pieces = match self.config.mode {
            SplitMode::Characters => split_chars(text, size, self.config.chunk_overlap),
            SplitMode::Sentences => {
                merge_sentences(&split_sentences(text), size, self.config.chunk_overlap)
            }
        };

        let metadata = Arc::new(document.metadata.clone());
        pieces
            .into_iter()
            .enumerate()
            .map(|(i, content)| Chunk {
                content,
                metadata: Arc::clone(&metadata),
                chunk_index: i,
            })
            .collect()
    }

    /// Split every document in order, concatenating their chunks.
    #[must_use]
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }
}

/// Cut after `.`, `?` or `!` followed by a space, and after a blank line.
/// Delimiters stay attached to the preceding piece.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let cut = match (c, chars.peek().map(|&(_, next)| next)) {
            ('\n', Some('\n')) => {
                chars.next();
                Some(pos + 2)
            }
            ('.' | '?' | '!', Some(' ')) => Some(pos + 1),
            _ => None,
        };
        if let Some(end) = cut
            && !text[start..end].trim().is_empty()
        {
            sentences.push(text[start..end].to_owned());
            start = end;
        }
    }

    if !text[start..].trim().is_empty() {
        sentences.push(text[start..].to_owned());
    }
    sentences
}

/// Merge sentences into chunks of at most `chunk_size` characters, seeding each
/// new chunk with trailing sentences of the previous one.
fn merge_sentences(sentences: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    // Sentences longer than a chunk are cut into windows first.
    let pieces: Vec<(String, usize)> = sentences
        .iter()
        .flat_map(|s| {
            if s.chars().count() > chunk_size {
                split_chars(s, chunk_size, 0)
            } else {
                vec![s.clone()]
            }
        })
        .map(|s| {
            let len = s.chars().count();
            (s, len)
        })
        .collect();

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    let mut window_start = 0;

    for (idx, (piece, piece_len)) in pieces.iter().enumerate() {
        if current_len > 0 && current_len + piece_len > chunk_size {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;

            let budget = chunk_overlap.min(chunk_size - piece_len);
            let mut overlap_len = 0;
            let mut overlap_start = idx;
            for i in (window_start..idx).rev() {
                if overlap_len + pieces[i].1 > budget {
                    break;
                }
                overlap_len += pieces[i].1;
                overlap_start = i;
            }
            for (s, len) in &pieces[overlap_start..idx] {
                current.push_str(s);
                current_len += len;
            }
            window_start = overlap_start;
        }

        current.push_str(piece);
        current_len += piece_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

fn split_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

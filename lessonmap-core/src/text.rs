//! Text normalization and chunking.
//!
//! Every string that reaches the embedding model goes through [`normalize`]
//! first, so taxonomy entries and lesson titles live in the same space:
//! diacritics stripped, lowercased, punctuation collapsed to spaces and
//! whitespace squashed.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize text for embedding and pattern matching.
///
/// ```
/// use lessonmap_core::text::normalize;
///
/// assert_eq!(normalize("Aula 01: Apresentação  do Curso!"), "aula 01 apresentacao do curso");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        if c.is_alphanumeric() {
            out.push(c);
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into overlapping word windows.
///
/// Text with at most `max_words` words comes back as a single chunk. Longer
/// text is cut into windows of `max_words` words where consecutive windows
/// share `overlap` (a fraction in `[0, 1)`) of their words. The last window
/// is anchored to the end of the text so it is never shorter than the rest.
pub fn chunk_words(text: &str, max_words: usize, overlap: f32) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let max_words = max_words.max(1);
    if words.len() <= max_words {
        return vec![words.join(" ")];
    }

    let overlap = overlap.clamp(0.0, 0.95);
    let shared = ((max_words as f32) * overlap).round() as usize;
    let step = max_words.saturating_sub(shared).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + max_words).min(words.len());
        let begin = end.saturating_sub(max_words);
        chunks.push(words[begin..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

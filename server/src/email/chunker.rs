//! Character-bounded chunking for email analysis

/// Maximum characters of an email that are analysed; the rest is dropped.
pub const MAX_CONTENT_LENGTH: usize = 12_000;

/// Maximum characters sent to the model in one request.
pub const CHUNK_SIZE: usize = 8_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub text: &'a str,
}

/// Returns the first `max_chars` characters of `text`.
pub fn truncate_content(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Splits `text` into consecutive chunks of `chunk_size` characters; the last
/// chunk may be shorter. Empty input yields no chunks.
pub fn split_into_chunks(text: &str, chunk_size: usize) -> Vec<Chunk<'_>> {
    debug_assert!(chunk_size > 0, "chunk_size must be positive");

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chars_in_chunk = 0;

    for (byte_idx, _) in text.char_indices() {
        if chars_in_chunk == chunk_size {
            chunks.push(Chunk {
                index: chunks.len(),
                text: &text[start..byte_idx],
            });
            start = byte_idx;
            chars_in_chunk = 0;
        }
        chars_in_chunk += 1;
    }

    if start < text.len() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: &text[start..],
        });
    }

    chunks
}

/// Truncate to [`MAX_CONTENT_LENGTH`], then split into [`CHUNK_SIZE`] chunks.
pub fn chunk_email_content(text: &str) -> Vec<Chunk<'_>> {
    split_into_chunks(truncate_content(text, MAX_CONTENT_LENGTH), CHUNK_SIZE)
}

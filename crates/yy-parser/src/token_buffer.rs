//! Chunked token storage.
//!
//! Tokens live in chunks of 64, 128, 256, ... entries. A chunk is never
//! reallocated once created, so growth never moves tokens already handed
//! out. Logical index `i` maps to a chunk by subtracting chunk sizes from the
//! smallest up.

use crate::error::Error;
use crate::token::Token;

/// Number of tokens in the first chunk.
pub const INITIAL_CHUNK: usize = 64;

/// Append-only, chunked token store.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    chunks: Vec<Vec<Token>>,
    len: usize,
}

impl TokenBuffer {
    /// Create an empty buffer. No memory is reserved until the first push.
    pub const fn new() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }

    /// Number of tokens stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of slots across all chunks.
    pub fn capacity(&self) -> usize {
        self.chunks.iter().map(Vec::capacity).sum()
    }

    /// Map a logical index to `(chunk, offset)`.
    pub fn locate(index: usize) -> (usize, usize) {
        let mut remaining = index;
        let mut size = INITIAL_CHUNK;
        let mut chunk = 0;
        while remaining >= size {
            remaining -= size;
            size <<= 1;
            chunk += 1;
        }

        (chunk, remaining)
    }

    /// Get the token at `index`.
    pub fn get(&self, index: usize) -> Option<&Token> {
        if index >= self.len {
            return None;
        }

        let (chunk, offset) = Self::locate(index);
        self.chunks.get(chunk)?.get(offset)
    }

    /// Append a token, returning its index.
    pub fn push(&mut self, token: Token) -> Result<usize, Error> {
        let (chunk, _) = Self::locate(self.len);
        if chunk == self.chunks.len() {
            let size = INITIAL_CHUNK << chunk;
            let mut storage = Vec::new();
            storage.try_reserve_exact(size)?;
            self.chunks.try_reserve(1)?;
            self.chunks.push(storage);
        }

        let storage = self
            .chunks
            .get_mut(chunk)
            .ok_or(Error::InsufficientResources)?;
        storage.push(token);
        let index = self.len;
        self.len += 1;
        Ok(index)
    }

    /// Iterate over the tokens in order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> + '_ {
        self.chunks.iter().flatten()
    }

    /// Drop every token and release the chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
    }
}

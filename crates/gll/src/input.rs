//! Parser input as a sequence of Unicode scalar values.
//!
//! All positions handed around by the parser are codepoint offsets into an
//! [`Input`]. Reading past the end yields the [`EOF`] sentinel, which is what
//! prediction and follow tests see at the end of the input.

use std::fmt;

/// Lookahead value returned for positions at or beyond the end of input.
pub const EOF: i32 = -1;

/// An immutable input string, indexed by codepoint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Input {
    chars: Box<[char]>,
}

impl Input {
    /// Create an input from a string slice.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }

    /// Number of codepoints in the input.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The lookahead symbol at `pos`: the codepoint, or [`EOF`] past the end.
    #[must_use]
    pub fn char_at(&self, pos: usize) -> i32 {
        self.chars.get(pos).map_or(EOF, |&c| c as i32)
    }

    /// The character at `pos`, if any.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    /// All characters of the input.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Text of the span `[start, end)`, clamped to the input.
    #[must_use]
    pub fn text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// Whether `pos` is at the start of a line.
    #[must_use]
    pub fn is_start_of_line(&self, pos: usize) -> bool {
        pos == 0 || self.get(pos - 1) == Some('\n')
    }

    /// Whether `pos` is at the end of a line (before `\n`, `\r\n`, or EOF).
    #[must_use]
    pub fn is_end_of_line(&self, pos: usize) -> bool {
        match self.get(pos) {
            None | Some('\n') => true,
            Some('\r') => matches!(self.get(pos + 1), None | Some('\n')),
            Some(_) => false,
        }
    }

    #[must_use]
    pub fn is_end_of_file(&self, pos: usize) -> bool {
        pos >= self.chars.len()
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = self.chars.iter().collect();
        f.debug_tuple("Input").field(&text).finish()
    }
}

use std::fmt;

/// A set of characters stored as sorted, non-overlapping inclusive ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharSet {
    ranges: Vec<(char, char)>,
}

impl CharSet {
    /// Create a character set from arbitrary (possibly overlapping) ranges.
    ///
    /// Ranges with `start > end` are dropped.
    #[must_use]
    pub fn new(ranges: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut ranges: Vec<(char, char)> = ranges.into_iter().filter(|(s, e)| s <= e).collect();
        ranges.sort_unstable();
        let mut merged: Vec<(char, char)> = Vec::with_capacity(ranges.len());
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, last_end)) if (*last_end as u32).saturating_add(1) >= start as u32 => {
                    if end > *last_end {
                        *last_end = end;
                    }
                }
                _ => merged.push((start, end)),
            }
        }
        Self { ranges: merged }
    }

    #[must_use]
    pub fn single(c: char) -> Self {
        Self { ranges: vec![(c, c)] }
    }

    #[must_use]
    pub fn digits() -> Self {
        Self::new([('0', '9')])
    }

    #[must_use]
    pub fn whitespace() -> Self {
        Self::new([(' ', ' '), ('\t', '\t'), ('\r', '\r'), ('\n', '\n')])
    }

    #[must_use]
    pub fn letters() -> Self {
        Self::new([('a', 'z'), ('A', 'Z')])
    }

    /// Every Unicode scalar value.
    #[must_use]
    pub fn any() -> Self {
        Self::new([('\u{0}', '\u{D7FF}'), ('\u{E000}', '\u{10FFFF}')])
    }

    /// The complement of this set within the Unicode scalar values.
    #[must_use]
    pub fn negate(&self) -> Self {
        let mut result = Vec::new();
        let mut next = 0u32;
        for &(start, end) in &self.ranges {
            if (start as u32) > next {
                push_scalar_range(&mut result, next, start as u32 - 1);
            }
            next = end as u32 + 1;
        }
        if next <= 0x10FFFF {
            push_scalar_range(&mut result, next, 0x10FFFF);
        }
        Self::new(result)
    }

    #[must_use]
    pub fn matches(&self, c: char) -> bool {
        self.ranges
            .binary_search_by(|&(start, end)| {
                if c < start {
                    std::cmp::Ordering::Greater
                } else if c > end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    #[must_use]
    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

// Pushes [lo, hi] minus the surrogate gap.
fn push_scalar_range(out: &mut Vec<(char, char)>, lo: u32, hi: u32) {
    let mut add = |lo: u32, hi: u32| {
        if let (Some(s), Some(e)) = (char::from_u32(lo), char::from_u32(hi)) {
            out.push((s, e));
        }
    };
    if hi < 0xD800 || lo > 0xDFFF {
        add(lo, hi);
        return;
    }
    if lo < 0xD800 {
        add(lo, 0xD7FF);
    }
    if hi > 0xDFFF {
        add(0xE000, hi);
    }
}

/// A regular pattern over characters.
///
/// Patterns describe terminals and the operands of context conditions. They
/// are compiled to DFAs by [`super::DfaMatcher`] and, for `precede`
/// conditions, to reversed DFAs by [`super::BackwardsMatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// The empty string.
    Epsilon,
    Char(char),
    Class(CharSet),
    Seq(Vec<Pattern>),
    Alt(Vec<Pattern>),
    Star(Box<Pattern>),
    Plus(Box<Pattern>),
    Opt(Box<Pattern>),
}

impl Pattern {
    /// A pattern matching exactly `text`.
    #[must_use]
    pub fn literal(text: &str) -> Self {
        let mut chars: Vec<Self> = text.chars().map(Self::Char).collect();
        match chars.len() {
            0 => Self::Epsilon,
            1 => chars.remove(0),
            _ => Self::Seq(chars),
        }
    }

    #[must_use]
    pub fn range(start: char, end: char) -> Self {
        Self::Class(CharSet::new([(start, end)]))
    }

    #[must_use]
    pub fn class(ranges: &[(char, char)]) -> Self {
        Self::Class(CharSet::new(ranges.iter().copied()))
    }

    #[must_use]
    pub fn any() -> Self {
        Self::Class(CharSet::any())
    }

    #[must_use]
    pub fn seq(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Seq(items.into_iter().collect())
    }

    #[must_use]
    pub fn alt(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Alt(items.into_iter().collect())
    }

    #[must_use]
    pub fn star(self) -> Self {
        Self::Star(Box::new(self))
    }

    #[must_use]
    pub fn plus(self) -> Self {
        Self::Plus(Box::new(self))
    }

    #[must_use]
    pub fn opt(self) -> Self {
        Self::Opt(Box::new(self))
    }

    /// Whether the pattern accepts the empty string.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Epsilon | Self::Star(_) | Self::Opt(_) => true,
            Self::Char(_) | Self::Class(_) => false,
            Self::Seq(items) => items.iter().all(Self::is_nullable),
            Self::Alt(items) => items.iter().any(Self::is_nullable),
            Self::Plus(inner) => inner.is_nullable(),
        }
    }

    /// Characters that can start a non-empty match.
    #[must_use]
    pub fn first_set(&self) -> CharSet {
        let mut ranges = Vec::new();
        self.collect_first(&mut ranges);
        CharSet::new(ranges)
    }

    fn collect_first(&self, out: &mut Vec<(char, char)>) {
        match self {
            Self::Epsilon => {}
            Self::Char(c) => out.push((*c, *c)),
            Self::Class(set) => out.extend_from_slice(set.ranges()),
            Self::Seq(items) => {
                for item in items {
                    item.collect_first(out);
                    if !item.is_nullable() {
                        break;
                    }
                }
            }
            Self::Alt(items) => items.iter().for_each(|item| item.collect_first(out)),
            Self::Star(inner) | Self::Plus(inner) | Self::Opt(inner) => inner.collect_first(out),
        }
    }

    /// The pattern accepting the reversal of every string this one accepts.
    #[must_use]
    pub fn reverse(&self) -> Self {
        match self {
            Self::Seq(items) => Self::Seq(items.iter().rev().map(Self::reverse).collect()),
            Self::Alt(items) => Self::Alt(items.iter().map(Self::reverse).collect()),
            Self::Star(inner) => Self::Star(Box::new(inner.reverse())),
            Self::Plus(inner) => Self::Plus(Box::new(inner.reverse())),
            Self::Opt(inner) => Self::Opt(Box::new(inner.reverse())),
            Self::Epsilon | Self::Char(_) | Self::Class(_) => self.clone(),
        }
    }

    /// False if some character class is empty and can never match.
    pub(crate) fn is_well_formed(&self) -> bool {
        match self {
            Self::Epsilon | Self::Char(_) => true,
            Self::Class(set) => !set.is_empty(),
            Self::Seq(items) | Self::Alt(items) => items.iter().all(Self::is_well_formed),
            Self::Star(inner) | Self::Plus(inner) | Self::Opt(inner) => inner.is_well_formed(),
        }
    }

    fn as_literal(&self) -> Option<String> {
        match self {
            Self::Char(c) => Some(c.to_string()),
            Self::Seq(items) => items
                .iter()
                .map(|item| match item {
                    Self::Char(c) => Some(*c),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.as_literal() {
            return write!(f, "'{}'", text.escape_default());
        }
        match self {
            Self::Epsilon => write!(f, "ε"),
            Self::Class(set) => {
                write!(f, "[")?;
                for &(start, end) in set.ranges() {
                    if start == end {
                        write!(f, "{}", start.escape_default())?;
                    } else {
                        write!(f, "{}-{}", start.escape_default(), end.escape_default())?;
                    }
                }
                write!(f, "]")
            }
            Self::Seq(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Self::Alt(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Self::Star(inner) => write!(f, "{inner}*"),
            Self::Plus(inner) => write!(f, "{inner}+"),
            Self::Opt(inner) => write!(f, "{inner}?"),
            Self::Char(c) => write!(f, "'{}'", c.escape_default()),
        }
    }
}

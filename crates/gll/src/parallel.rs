//! # Batch Parsing
//!
//! A single parse is a sequential fixpoint computation. Independent inputs,
//! however, share nothing but the immutable grammar, so a batch of them can
//! be parsed concurrently. With the `parallel` feature the batch is spread
//! over the rayon thread pool; without it the same API parses sequentially.

use crate::error::GllError;
use crate::input::Input;
use crate::parser::GllParser;
use crate::result::ParseResult;
use compact_str::CompactString;
use std::time::{Duration, Instant};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One input of a batch.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Caller-chosen identifier, e.g. a file path
    pub id: String,
    pub input: Input,
    /// Start nonterminal
    pub start: CompactString,
}

/// A batch of inputs to parse
#[derive(Debug, Clone, Default)]
pub struct ParseBatch {
    pub items: Vec<BatchItem>,
}

impl ParseBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input to the batch
    pub fn add(&mut self, id: impl Into<String>, text: &str, start: &str) {
        self.items.push(BatchItem {
            id: id.into(),
            input: Input::new(text),
            start: start.into(),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Outcome of parsing one batch item
#[derive(Debug)]
pub struct BatchResult {
    pub id: String,
    pub result: Result<ParseResult, GllError>,
    pub duration: Duration,
}

impl BatchResult {
    /// Whether the item parsed without error and was recognized
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_ok_and(ParseResult::is_success)
    }
}

/// Progress callback: `(completed, total)`
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

fn parse_item(parser: &GllParser, item: &BatchItem) -> BatchResult {
    let start = Instant::now();
    let result = parser.parse(&item.input, &item.start);
    BatchResult {
        id: item.id.clone(),
        result,
        duration: start.elapsed(),
    }
}

impl GllParser {
    /// Parse every item of `batch`, returning results in batch order.
    #[must_use]
    pub fn parse_batch(&self, batch: &ParseBatch) -> Vec<BatchResult> {
        #[cfg(feature = "parallel")]
        {
            batch
                .items
                .par_iter()
                .map(|item| parse_item(self, item))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            batch.items.iter().map(|item| parse_item(self, item)).collect()
        }
    }

    /// Parse a batch, calling `progress` after each completed item
    #[must_use]
    pub fn parse_batch_with_progress(
        &self,
        batch: &ParseBatch,
        progress: &ProgressCallback,
    ) -> Vec<BatchResult> {
        let total = batch.len();
        let completed = std::sync::atomic::AtomicUsize::new(0);
        let run = |item: &BatchItem| {
            let result = parse_item(self, item);
            let done = completed.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
            progress(done, total);
            result
        };

        #[cfg(feature = "parallel")]
        {
            batch.items.par_iter().map(run).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            batch.items.iter().map(run).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarBuilder, Symbol};
    use crate::regex::Pattern;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn parser() -> GllParser {
        let grammar = GrammarBuilder::new()
            .rule("List", [Symbol::nt("List"), Symbol::char(','), Symbol::nt("Item")])
            .rule("List", [Symbol::nt("Item")])
            .rule("Item", [Symbol::terminal(Pattern::range('0', '9').plus())])
            .build()
            .unwrap();
        GllParser::new(grammar)
    }

    #[test]
    fn test_batch_results_keep_order() {
        let mut batch = ParseBatch::new();
        batch.add("ok-1", "1,22,333", "List");
        batch.add("bad", "1,,2", "List");
        batch.add("ok-2", "7", "List");
        batch.add("unknown-start", "7", "Nope");

        let results = parser().parse_batch(&batch);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["ok-1", "bad", "ok-2", "unknown-start"]);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert!(results[1].result.is_ok());
        assert!(results[2].is_success());
        assert!(results[3].result.is_err());
    }

    #[test]
    fn test_batch_progress_reaches_total() {
        let mut batch = ParseBatch::new();
        for i in 0..8 {
            batch.add(format!("item-{i}"), "1,2,3", "List");
        }
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let progress: ProgressCallback = Box::new(move |_, total| {
            assert_eq!(total, 8);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let results = parser().parse_batch_with_progress(&batch, &progress);
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(BatchResult::is_success));
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }
}

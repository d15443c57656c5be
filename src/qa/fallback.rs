//! Keyword fallback answering
//!
//! Used when no model is reachable. Questions are routed through an ordered
//! table of (predicate, handler) rules; the first matching rule answers.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackCategory {
    Revenue,
    Profit,
    Expense,
    Assets,
    General,
}

type Predicate = fn(&str) -> bool;
type Handler = fn(&str, &str) -> String;

struct FallbackRule {
    category: FallbackCategory,
    applies: Predicate,
    answer: Handler,
}

/// Evaluated top to bottom against the lower-cased question
const RULES: &[FallbackRule] = &[
    FallbackRule {
        category: FallbackCategory::Revenue,
        applies: |q| contains_any(q, &["revenue", "sales", "income"]),
        answer: |_, doc| find_revenue(doc),
    },
    FallbackRule {
        category: FallbackCategory::Profit,
        applies: |q| contains_any(q, &["profit", "net income"]),
        answer: |_, doc| find_profit(doc),
    },
    FallbackRule {
        category: FallbackCategory::Expense,
        applies: |q| contains_any(q, &["expense", "cost"]),
        answer: |_, doc| find_expense(doc),
    },
    FallbackRule {
        category: FallbackCategory::Assets,
        applies: |q| q.contains("assets"),
        answer: |_, doc| find_assets(doc),
    },
    FallbackRule {
        category: FallbackCategory::General,
        applies: |_| true,
        answer: general_search,
    },
];

lazy_static! {
    static ref REVENUE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"revenue[:\s]+\$?([\d,]+)").expect("static pattern"),
        Regex::new(r"sales[:\s]+\$?([\d,]+)").expect("static pattern"),
    ];
    static ref PROFIT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"profit[:\s]+\$?([\d,]+)").expect("static pattern"),
        Regex::new(r"net income[:\s]+\$?([\d,]+)").expect("static pattern"),
    ];
}

fn contains_any(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

fn first_amount(patterns: &[Regex], doc: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(doc))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn find_revenue(doc: &str) -> String {
    if let Some(amount) = first_amount(&REVENUE_PATTERNS, doc) {
        return format!("💰 Found revenue: ${}", amount);
    }
    if doc.contains("revenue") {
        return "📊 Revenue information found in the document. Please check the income statement."
            .to_string();
    }
    "❓ No specific revenue information found.".to_string()
}

fn find_profit(doc: &str) -> String {
    match first_amount(&PROFIT_PATTERNS, doc) {
        Some(amount) => format!("💵 Found profit: ${}", amount),
        None => "❓ No specific profit information found.".to_string(),
    }
}

fn find_expense(doc: &str) -> String {
    if doc.contains("expense") {
        "💸 Expense information found in the document.".to_string()
    } else {
        "❓ No expense information found.".to_string()
    }
}

fn find_assets(doc: &str) -> String {
    if doc.contains("assets") {
        "🏢 Assets information found in the document.".to_string()
    } else {
        "❓ No assets information found.".to_string()
    }
}

/// Echo question words longer than three characters that occur in the text
fn general_search(question: &str, doc: &str) -> String {
    let found: Vec<&str> = question
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .filter(|w| doc.contains(*w))
        .collect();

    if found.is_empty() {
        "❓ No specific information found for your question.".to_string()
    } else {
        format!("🔍 Found references to: {}", found.join(", "))
    }
}

/// Keyword answerer over one document's text
pub struct FallbackAnswerer {
    document_text: String,
}

impl FallbackAnswerer {
    pub fn new(document_text: &str) -> Self {
        Self {
            document_text: document_text.to_lowercase(),
        }
    }

    pub fn categorize(question: &str) -> FallbackCategory {
        let question = question.to_lowercase();
        Self::rule_for(&question).category
    }

    fn rule_for(question: &str) -> &'static FallbackRule {
        RULES
            .iter()
            .find(|rule| (rule.applies)(question))
            .unwrap_or(&RULES[RULES.len() - 1])
    }

    pub fn answer(&self, question: &str) -> String {
        let question = question.to_lowercase();
        let rule = Self::rule_for(&question);
        (rule.answer)(&question, &self.document_text)
    }
}

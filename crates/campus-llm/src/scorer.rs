//! Complexity scorer
//!
//! Additive heuristic over the newest message of a [`ConversationWindow`].
//! The result feeds the route selector; it is not bounded above.

use crate::window::ConversationWindow;
use lazy_static::lazy_static;
use regex::Regex;

/// Points per matched signal
const SIGNAL_POINTS: u32 = 2;

/// Latest-message length above which the first length bonus applies
pub const LONG_MESSAGE_CHARS: usize = 400;
/// Latest-message length above which the second length bonus applies
pub const VERY_LONG_MESSAGE_CHARS: usize = 900;
/// Window size (system message included) above which history counts
pub const LONG_HISTORY_MESSAGES: usize = 8;

lazy_static! {
    static ref TECHNICAL_TERMS: Regex = Regex::new(concat!(
        r"(?i)(?-u:\b)(?:architecture|optimi[sz]e|benchmark|latency|throughput",
        r"|complexity|algorithm|debug|refactor)(?-u:\b)"
    ))
    .expect("technical terms pattern");
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```.*```").expect("code fence pattern");
    static ref TECHNOLOGY_NAMES: Regex = Regex::new(
        r"(?i)(?-u:\b)(?:rust|python|typescript|docker|kubernetes|sql|regex|api|stream)(?-u:\b)"
    )
    .expect("technology names pattern");
    static ref EVALUATION_INTENT: Regex =
        Regex::new(r"(?i)(?-u:\b)(?:compare|trade[- ]?off|analy[sz]e|evaluate)(?-u:\b)")
            .expect("evaluation intent pattern");
}

/// Per-signal breakdown of a complexity score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplexityBreakdown {
    /// Points from latest-message length (0, 2 or 4)
    pub length: u32,
    /// Points from conversation length (0 or 2)
    pub history: u32,
    /// Technical/analytical vocabulary matched
    pub technical_terms: bool,
    /// A fenced code block is present
    pub code_block: bool,
    /// A technology name is mentioned
    pub technology_names: bool,
    /// Comparison or evaluation intent
    pub evaluation_intent: bool,
}

impl ComplexityBreakdown {
    /// Total additive score
    #[must_use]
    pub fn total(&self) -> u32 {
        let signals = [
            self.technical_terms,
            self.code_block,
            self.technology_names,
            self.evaluation_intent,
        ]
        .iter()
        .filter(|hit| **hit)
        .count() as u32;

        self.length + self.history + signals * SIGNAL_POINTS
    }
}

/// Break down the complexity of a window's newest message.
#[must_use]
pub fn analyze(window: &ConversationWindow) -> ComplexityBreakdown {
    analyze_parts(window.latest_content(), window.len())
}

/// Score a window. Same as `analyze(window).total()`.
#[must_use]
pub fn score(window: &ConversationWindow) -> u32 {
    analyze(window).total()
}

fn analyze_parts(latest: &str, history_count: usize) -> ComplexityBreakdown {
    let chars = latest.chars().count();

    let mut length = 0;
    if chars > LONG_MESSAGE_CHARS {
        length += SIGNAL_POINTS;
    }
    if chars > VERY_LONG_MESSAGE_CHARS {
        length += SIGNAL_POINTS;
    }

    ComplexityBreakdown {
        length,
        history: if history_count > LONG_HISTORY_MESSAGES {
            SIGNAL_POINTS
        } else {
            0
        },
        technical_terms: TECHNICAL_TERMS.is_match(latest),
        code_block: CODE_FENCE.is_match(latest),
        technology_names: TECHNOLOGY_NAMES.is_match(latest),
        evaluation_intent: EVALUATION_INTENT.is_match(latest),
    }
}

//! Keyword routing between the fast path and the agent.
//!
//! Matching is case-folded substring containment only; "top suppliers" goes to
//! the agent and "top sku price" goes to the fast path.

use std::fmt;

/// Words that must all appear for the fast path to answer
pub const FAST_PATH_KEYWORDS: [&str; 2] = ["top", "sku"];

/// Any of these in an agent question also draws a line chart of the dataset
pub const CHART_KEYWORDS: [&str; 5] = ["trend", "top", "chart", "plot", "over time"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    FastPath,
    Agent,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::FastPath => write!(f, "fast path"),
            Route::Agent => write!(f, "agent"),
        }
    }
}

pub fn route(query: &str) -> Route {
    let query = query.to_lowercase();
    if FAST_PATH_KEYWORDS.iter().all(|kw| query.contains(kw)) {
        Route::FastPath
    } else {
        Route::Agent
    }
}

pub fn wants_chart(query: &str) -> bool {
    let query = query.to_lowercase();
    CHART_KEYWORDS.iter().any(|kw| query.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_sku_question_takes_fast_path() {
        assert_eq!(
            route("What are the top 5 SKUs by units sold?"),
            Route::FastPath
        );
    }

    #[test]
    fn test_other_questions_go_to_agent() {
        assert_eq!(route("What is the average price?"), Route::Agent);
        assert_eq!(route("top 5 suppliers"), Route::Agent);
        assert_eq!(route("which sku is cheapest"), Route::Agent);
    }

    #[test]
    fn test_substring_match_is_not_intent_aware() {
        assert_eq!(route("top sku price"), Route::FastPath);
        assert_eq!(route("STOPPED SKUS"), Route::FastPath);
    }

    #[test]
    fn test_wants_chart() {
        assert!(wants_chart("Show the sales TREND"));
        assert!(wants_chart("units sold over time"));
        assert!(wants_chart("plot it"));
        assert!(!wants_chart("What is the average price?"));
        assert!(!wants_chart("over the time"));
    }
}

//! Fixed scoring criteria: weights, keyword lists and phrase tables

use super::models::Dimension;

/// Words that mark a technical answer to a technical question
pub const TECHNICAL_INDICATORS: &[&str] =
    &["algorithm", "implement", "optimize", "design", "architecture"];

/// STAR-format markers for behavioral answers
pub const STAR_INDICATORS: &[&str] =
    &["situation", "task", "action", "result", "when", "what", "how"];

/// Minimum STAR markers for the structured-answer bonus
pub const STAR_THRESHOLD: usize = 3;

pub const CONFIDENT_PHRASES: &[&str] =
    &["i think", "probably", "maybe", "not sure", "i believe"];

pub const UNCERTAIN_PHRASES: &[&str] = &["i don't know", "not familiar", "haven't used"];

pub const EXAMPLE_MARKERS: &[&str] = &["for example", "for instance", "such as", "e.g."];

impl Dimension {
    /// Weight of this dimension in the overall score. Weights sum to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            Dimension::TechnicalKnowledge => 0.25,
            Dimension::CommunicationSkills => 0.20,
            Dimension::ProblemSolving => 0.25,
            Dimension::DepthOfThinking => 0.15,
            Dimension::Relevance => 0.10,
            Dimension::Clarity => 0.05,
        }
    }

    /// Lowercase keywords counted by substring match
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Dimension::TechnicalKnowledge => &[
                "algorithm",
                "architecture",
                "optimization",
                "design pattern",
                "scalability",
            ],
            Dimension::CommunicationSkills => {
                &["explain", "clarify", "understand", "communicate", "present"]
            }
            Dimension::ProblemSolving => {
                &["approach", "solution", "alternative", "trade-off", "consider"]
            }
            Dimension::DepthOfThinking => {
                &["because", "therefore", "however", "consider", "impact"]
            }
            Dimension::Relevance => &[],
            Dimension::Clarity => &["first", "second", "then", "finally", "specifically"],
        }
    }
}

/// Number of keywords from `keywords` present in already-lowercased text
pub fn count_hits(lower: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| lower.contains(*k)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = Dimension::ALL.iter().map(|d| d.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_has_no_keywords() {
        assert!(Dimension::Relevance.keywords().is_empty());
    }

    #[test]
    fn test_count_hits_is_per_keyword() {
        let text = "my approach, and another approach, weighed each trade-off";
        assert_eq!(count_hits(text, Dimension::ProblemSolving.keywords()), 2);
        assert_eq!(count_hits(text, &["approach"]), 1);
    }
}

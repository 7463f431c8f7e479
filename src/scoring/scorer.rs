//! Heuristic response scorer and running candidate profile

use super::criteria::{
    count_hits, CONFIDENT_PHRASES, EXAMPLE_MARKERS, STAR_INDICATORS,
    STAR_THRESHOLD, TECHNICAL_INDICATORS, UNCERTAIN_PHRASES,
};
use super::models::*;
use crate::coordinator::shared_context::{ContextWrite, ContextWriter, PerformanceState};
use crate::error::Result;
use crate::metrics::METRICS;
use crate::planner::models::TopicCategory;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const BASE_SCORE: f64 = 5.0;
const MIN_SCORE: f64 = 1.0;
const MAX_SCORE: f64 = 10.0;

/// Section selection for [`ResponseScorer::detailed_feedback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackFocus {
    Overall,
    Strengths,
    Improvements,
    Patterns,
}

/// Scores responses and accumulates the candidate profile
pub struct ResponseScorer {
    profile: CandidateProfile,
    context: Option<ContextWriter>,
}

impl ResponseScorer {
    pub fn new(candidate_name: impl Into<String>) -> Self {
        Self {
            profile: CandidateProfile::new(candidate_name),
            context: None,
        }
    }

    /// Publish performance state through `writer`
    pub fn with_context(mut self, writer: ContextWriter) -> Self {
        self.context = Some(writer);
        self
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    /// Replace the performance key group with the current insights
    pub async fn publish_insights(&self, latest_feedback: Option<String>) -> Result<()> {
        let Some(ref writer) = self.context else {
            return Ok(());
        };
        let state = PerformanceState {
            insights: self.performance_insights(),
            latest_feedback,
            evaluation_count: self.profile.history.len(),
        };
        writer.write(ContextWrite::Performance(state)).await?;
        Ok(())
    }

    /// Surface statistics of a response
    pub fn analyze_response(response: &str) -> ResponseAnalysis {
        let lower = response.to_lowercase();
        ResponseAnalysis {
            word_count: word_count(response),
            sentence_count: response
                .split(['.', '!', '?'])
                .filter(|s| !s.trim().is_empty())
                .count(),
            has_examples: EXAMPLE_MARKERS.iter().any(|m| lower.contains(m)),
            has_technical_terms: TECHNICAL_INDICATORS.iter().any(|t| lower.contains(t)),
            question_marks: response.matches('?').count(),
        }
    }

    /// Score one dimension of a response, returning the score in [1, 10] and
    /// the triggered heuristic notes.
    pub fn score(
        &self,
        response: &str,
        question: &str,
        dimension: Dimension,
        category: TopicCategory,
    ) -> (f64, String) {
        let lower = response.to_lowercase();
        let words = word_count(response);
        let mut score = BASE_SCORE;
        let mut notes: Vec<String> = Vec::new();

        let hits = count_hits(&lower, dimension.keywords());
        if hits > 0 {
            score += (hits as f64 * 0.5).min(2.0);
            notes.push(format!("Used relevant terminology ({} keywords)", hits));
        }

        match dimension {
            Dimension::DepthOfThinking => {
                if words > 100 {
                    score += 1.0;
                    notes.push("Comprehensive response showing depth".to_string());
                } else if words < 30 {
                    score -= 1.0;
                    notes.push("Response could be more detailed".to_string());
                }
            }
            Dimension::Clarity => {
                if (50..=150).contains(&words) {
                    score += 1.0;
                    notes.push("Well-balanced response length".to_string());
                } else if words > 200 {
                    score -= 0.5;
                    notes.push("Response could be more concise".to_string());
                }
            }
            _ => {}
        }

        if dimension == Dimension::TechnicalKnowledge
            && category == TopicCategory::Technical
            && TECHNICAL_INDICATORS.iter().any(|t| lower.contains(t))
        {
            score += 1.0;
            notes.push("Demonstrated technical thinking".to_string());
        }

        if dimension == Dimension::CommunicationSkills
            && category == TopicCategory::Behavioral
            && count_hits(&lower, STAR_INDICATORS) >= STAR_THRESHOLD
        {
            score += 1.5;
            notes.push("Used structured response format".to_string());
        }

        let score = score.clamp(MIN_SCORE, MAX_SCORE);
        debug!(
            "Scored {} = {:.1} for question of {} chars",
            dimension,
            score,
            question.len()
        );

        let feedback = if notes.is_empty() {
            "Standard response".to_string()
        } else {
            notes.join("; ")
        };

        (score, feedback)
    }

    /// Evaluate a response on every dimension and fold it into the profile
    pub fn evaluate(
        &mut self,
        response: &str,
        question: &str,
        topic: &str,
        category: TopicCategory,
    ) -> Evaluation {
        let analysis = Self::analyze_response(response);

        let mut scores = IndexMap::new();
        let mut dimension_feedback = IndexMap::new();
        for dimension in Dimension::ALL {
            let (score, feedback) = self.score(response, question, dimension, category);
            scores.insert(dimension, score);
            dimension_feedback.insert(dimension, feedback);
        }

        let overall_score: f64 = scores.iter().map(|(d, s)| d.weight() * s).sum();
        let values: Vec<f64> = scores.values().copied().collect();
        let mean_score = mean(&values);

        let confidence = if mean_score >= 7.0 && analysis.word_count >= 50 {
            Level::High
        } else if mean_score >= 5.0 && analysis.word_count >= 30 {
            Level::Medium
        } else {
            Level::Low
        };

        let strengths: Vec<String> = scores
            .iter()
            .filter(|(_, s)| **s >= 7.0)
            .map(|(d, _)| d.title().to_string())
            .take(3)
            .collect();

        let improvement_areas: Vec<String> = scores
            .iter()
            .filter(|(_, s)| **s < 6.0)
            .map(|(d, _)| d.title().to_string())
            .take(3)
            .collect();

        let band = if mean_score >= 8.0 {
            "Excellent response demonstrating strong capabilities"
        } else if mean_score >= 6.0 {
            "Good response with solid understanding"
        } else if mean_score >= 4.0 {
            "Adequate response with room for improvement"
        } else {
            "Response needs significant development"
        };
        let key_areas: Vec<&str> = dimension_feedback.values().map(String::as_str).take(2).collect();
        let feedback = format!("{}. Key areas: {}", band, key_areas.join("; "));

        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            question: question.to_string(),
            question_category: category,
            response: response.to_string(),
            timestamp: Utc::now(),
            scores,
            dimension_feedback,
            overall_score,
            confidence,
            feedback,
            strengths,
            improvement_areas,
            analysis,
        };

        self.update_profile(&evaluation);
        METRICS.record_evaluation(overall_score);
        debug!(
            "Evaluated response on '{}': overall {:.2}, confidence {}",
            topic,
            overall_score,
            confidence.as_str()
        );

        evaluation
    }

    /// Fold an evaluation into the running profile
    pub fn update_profile(&mut self, evaluation: &Evaluation) {
        for (dimension, score) in &evaluation.scores {
            self.profile
                .dimension_scores
                .entry(*dimension)
                .or_default()
                .push(*score);
        }

        self.profile.topic_scores.insert(
            evaluation.topic.clone(),
            TopicSnapshot {
                overall_score: evaluation.overall_score,
                scores: evaluation.scores.clone(),
                timestamp: evaluation.timestamp,
            },
        );

        for strength in &evaluation.strengths {
            self.profile.strengths.insert(strength.clone());
        }
        for area in &evaluation.improvement_areas {
            self.profile.improvement_areas.insert(area.clone());
        }

        self.profile.history.push(evaluation.clone());
        self.profile.patterns = analyze_patterns(&self.profile.history);
    }

    /// Recent-window trend over the evaluations so far
    pub fn trend(&self) -> Trend {
        Trend::recent_window(&self.profile.overall_scores())
    }

    fn mean_of_means(&self) -> f64 {
        let means: Vec<f64> = self.profile.dimension_means().values().copied().collect();
        if means.is_empty() {
            BASE_SCORE
        } else {
            mean(&means)
        }
    }

    /// Ordered guidance for the rest of the interview
    pub fn recommend(&self) -> Vec<String> {
        let overall = self.mean_of_means();
        let means = self.profile.dimension_means();
        let mut recommendations = Vec::new();

        if overall >= 8.0 {
            recommendations
                .push("Increase question difficulty - candidate showing strong performance".to_string());
        } else if overall <= 4.0 {
            recommendations.push("Consider easier questions - candidate may be struggling".to_string());
        } else {
            recommendations.push("Maintain current difficulty level".to_string());
        }

        let weak: Vec<&str> = means
            .iter()
            .filter(|(_, s)| **s < 6.0)
            .map(|(d, _)| d.title())
            .take(2)
            .collect();
        if !weak.is_empty() {
            recommendations.push(format!("Focus more on: {}", weak.join(", ")));
        }

        let strong: Vec<&str> = means
            .iter()
            .filter(|(_, s)| **s >= 8.0)
            .map(|(d, _)| d.title())
            .take(2)
            .collect();
        if !strong.is_empty() {
            recommendations.push(format!("Can reduce focus on: {}", strong.join(", ")));
        }

        if overall >= 7.0 {
            recommendations
                .push("Candidate showing good potential - continue with standard interview".to_string());
        } else if overall <= 3.0 {
            recommendations
                .push("Consider early conclusion - candidate may not meet requirements".to_string());
        } else {
            recommendations.push("Continue interview - need more data points".to_string());
        }

        recommendations
    }

    /// Standing of the candidate so far
    pub fn current_assessment(&self) -> Assessment {
        let overall = if self.profile.history.is_empty() {
            0.0
        } else {
            self.mean_of_means()
        };

        let recommendation = if self.profile.history.is_empty() {
            "Continue with standard interview approach"
        } else if overall >= 7.0 {
            "Strong candidate - consider advanced questions"
        } else if overall <= 4.0 {
            "Candidate struggling - consider supportive questioning"
        } else {
            "Continue with current interview approach"
        };

        Assessment {
            overall_score: overall,
            dimension_scores: self.profile.dimension_means(),
            strengths: self.profile.strengths.iter().take(3).cloned().collect(),
            improvement_areas: self.profile.improvement_areas.iter().take(3).cloned().collect(),
            evaluation_count: self.profile.history.len(),
            performance_trend: self.trend(),
            recommendation: recommendation.to_string(),
        }
    }

    /// Signals for question selection. Neutral until the first evaluation.
    pub fn performance_insights(&self) -> PerformanceInsights {
        let Some(latest) = self.profile.history.last() else {
            return PerformanceInsights::default();
        };

        let overall = self.mean_of_means();
        let level = |high: f64, low: f64| {
            if overall >= high {
                Level::High
            } else if overall <= low {
                Level::Low
            } else {
                Level::Medium
            }
        };

        let means = self.profile.dimension_means();
        PerformanceInsights {
            overall_score: overall,
            performance_level: if overall >= 7.0 {
                Level::High
            } else if overall >= 5.0 {
                Level::Medium
            } else {
                Level::Low
            },
            strong_areas: means
                .iter()
                .filter(|(_, s)| **s >= 7.0)
                .map(|(d, _)| d.title().to_string())
                .collect(),
            weak_areas: means
                .iter()
                .filter(|(_, s)| **s < 6.0)
                .map(|(d, _)| d.title().to_string())
                .collect(),
            suggested_difficulty: level(7.0, 4.0),
            trend: self.trend(),
            needs_follow_up: latest.analysis.word_count < 30,
        }
    }

    /// Feedback sections for the candidate, joined with " | "
    pub fn detailed_feedback(&self, focus: FeedbackFocus) -> String {
        let mut sections = Vec::new();
        let all = focus == FeedbackFocus::Overall;

        if all || focus == FeedbackFocus::Strengths {
            let text = if self.profile.strengths.is_empty() {
                "Strengths still being assessed".to_string()
            } else {
                let top: Vec<&str> = self.profile.strengths.iter().map(String::as_str).take(3).collect();
                format!("Demonstrating strong {}", top.join(", ").to_lowercase())
            };
            sections.push(format!("Strengths: {}", text));
        }

        if all || focus == FeedbackFocus::Improvements {
            let text = if self.profile.improvement_areas.is_empty() {
                "No significant improvement areas identified".to_string()
            } else {
                let top: Vec<&str> = self
                    .profile
                    .improvement_areas
                    .iter()
                    .map(String::as_str)
                    .take(2)
                    .collect();
                format!("Could strengthen {}", top.join(", ").to_lowercase())
            };
            sections.push(format!("Areas for Development: {}", text));
        }

        if all || focus == FeedbackFocus::Patterns {
            sections.push(format!(
                "Response Patterns: {}",
                self.profile.patterns.summary.join("; ")
            ));
        }

        if all {
            sections.push(format!(
                "Interview Recommendations: {}",
                self.current_assessment().recommendation
            ));
        }

        sections.join(" | ")
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Recompute response-pattern aggregates from the full history
fn analyze_patterns(history: &[Evaluation]) -> ResponsePatterns {
    let n = history.len().max(1) as f64;

    let average_length = history.iter().map(|e| e.analysis.word_count as f64).sum::<f64>() / n;

    let keyword_usage = history
        .iter()
        .map(|e| {
            let lower = e.response.to_lowercase();
            Dimension::ALL
                .iter()
                .map(|d| count_hits(&lower, d.keywords()))
                .sum::<usize>() as f64
        })
        .sum::<f64>()
        / n;

    let confidence_language = history
        .iter()
        .map(|e| {
            let lower = e.response.to_lowercase();
            let confident = count_hits(&lower, CONFIDENT_PHRASES) as f64;
            let uncertain = count_hits(&lower, UNCERTAIN_PHRASES) as f64;
            (confident - 2.0 * uncertain).max(0.0)
        })
        .sum::<f64>()
        / n;

    let question_frequency =
        history.iter().map(|e| e.analysis.question_marks as f64).sum::<f64>() / n;

    let mut summary = Vec::new();
    if average_length > 80.0 {
        summary.push("provides detailed responses".to_string());
    } else if average_length < 30.0 {
        summary.push("responses could be more detailed".to_string());
    }
    if keyword_usage > 2.0 {
        summary.push("uses appropriate technical terminology".to_string());
    }
    if confidence_language > 0.0 {
        summary.push("shows confidence in responses".to_string());
    }
    if summary.is_empty() {
        summary.push("Standard response patterns".to_string());
    }

    ResponsePatterns {
        average_length,
        keyword_usage,
        confidence_language,
        question_frequency,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_empty_response_gets_base_scores() {
        let mut scorer = ResponseScorer::new("Ada");
        let evaluation = scorer.evaluate("", "Tell me about caching", "Caching", TopicCategory::Technical);

        assert_eq!(evaluation.score(Dimension::TechnicalKnowledge), 5.0);
        assert_eq!(evaluation.score(Dimension::DepthOfThinking), 4.0);
        assert_eq!(evaluation.confidence, Level::Low);
        assert_eq!(scorer.profile().history.len(), 1);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let scorer = ResponseScorer::new("Ada");
        let heavy = format!(
            "{} algorithm architecture optimization design pattern scalability implement",
            words(250)
        );
        for text in ["", "no", heavy.as_str()] {
            for dimension in Dimension::ALL {
                for category in [TopicCategory::Technical, TopicCategory::Behavioral] {
                    let (score, _) = scorer.score(text, "q", dimension, category);
                    assert!((1.0..=10.0).contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_problem_solving_with_keywords_beats_base() {
        let scorer = ResponseScorer::new("Ada");
        let text = format!(
            "My approach was to compare each solution and pick an alternative. {}",
            words(110)
        );
        let (score, feedback) =
            scorer.score(&text, "How would you fix it?", Dimension::ProblemSolving, TopicCategory::Technical);
        assert_eq!(score, 6.5);
        assert!(feedback.contains("3 keywords"));
    }

    #[test]
    fn test_keyword_bonus_is_capped() {
        let scorer = ResponseScorer::new("Ada");
        let text = "approach solution alternative trade-off consider";
        let (score, _) = scorer.score(text, "q", Dimension::ProblemSolving, TopicCategory::Situational);
        assert_eq!(score, 7.0);
    }

    #[test]
    fn test_star_bonus_only_for_behavioral() {
        let scorer = ResponseScorer::new("Ada");
        let text = "The situation was tense, my task was clear, the action was quick and the result good";
        let (behavioral, feedback) =
            scorer.score(text, "q", Dimension::CommunicationSkills, TopicCategory::Behavioral);
        let (technical, _) =
            scorer.score(text, "q", Dimension::CommunicationSkills, TopicCategory::Technical);
        assert_eq!(behavioral, technical + 1.5);
        assert!(feedback.contains("Used structured response format"));
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let mut scorer = ResponseScorer::new("Ada");
        let evaluation = scorer.evaluate(
            "First I would design the architecture because scalability matters, then optimize.",
            "Design a cache",
            "Caching",
            TopicCategory::Technical,
        );
        let expected: f64 = evaluation.scores.iter().map(|(d, s)| d.weight() * s).sum();
        assert!((evaluation.overall_score - expected).abs() < 1e-9);
        assert!(evaluation.feedback.contains(". Key areas: "));
    }

    #[test]
    fn test_profile_sets_deduplicate() {
        let mut scorer = ResponseScorer::new("Ada");
        scorer.evaluate("short", "q1", "A", TopicCategory::Technical);
        scorer.evaluate("short again", "q2", "A", TopicCategory::Technical);

        let profile = scorer.profile();
        let areas: Vec<&String> = profile.improvement_areas.iter().collect();
        let unique: std::collections::HashSet<&String> = areas.iter().copied().collect();
        assert_eq!(areas.len(), unique.len());
        assert_eq!(profile.topic_scores.len(), 1);
        assert_eq!(profile.dimension_scores[&Dimension::Clarity].len(), 2);
    }

    #[test]
    fn test_trend_from_history() {
        let mut scorer = ResponseScorer::new("Ada");
        assert_eq!(scorer.trend(), Trend::InsufficientData);

        scorer.evaluate("", "q", "A", TopicCategory::Technical);
        let strong = format!(
            "First, because scalability matters, I would explain the architecture and algorithm. \
             My approach weighs each alternative solution and trade-off; therefore I consider the impact. {}",
            words(60)
        );
        scorer.evaluate(&strong, "q", "A", TopicCategory::Technical);
        assert_eq!(scorer.trend(), Trend::Improving);
    }

    #[test]
    fn test_recommend_neutral_without_data() {
        let scorer = ResponseScorer::new("Ada");
        assert_eq!(
            scorer.recommend(),
            vec![
                "Maintain current difficulty level".to_string(),
                "Continue interview - need more data points".to_string(),
            ]
        );
        assert_eq!(scorer.performance_insights(), PerformanceInsights::default());
    }

    #[test]
    fn test_recommend_flags_weak_dimensions() {
        let mut scorer = ResponseScorer::new("Ada");
        scorer.evaluate("I don't know", "q", "A", TopicCategory::Technical);
        let recommendations = scorer.recommend();
        assert!(recommendations
            .iter()
            .any(|r| r.starts_with("Focus more on: Technical Knowledge")));

        let insights = scorer.performance_insights();
        assert_eq!(insights.performance_level, Level::Low);
        assert!(insights.needs_follow_up);
    }

    #[test]
    fn test_patterns_track_uncertainty() {
        let mut scorer = ResponseScorer::new("Ada");
        scorer.evaluate("I think it works? I believe so", "q", "A", TopicCategory::Technical);
        let patterns = &scorer.profile().patterns;
        assert_eq!(patterns.confidence_language, 2.0);
        assert_eq!(patterns.question_frequency, 1.0);
        assert!(patterns.summary.contains(&"shows confidence in responses".to_string()));

        let feedback = scorer.detailed_feedback(FeedbackFocus::Patterns);
        assert!(feedback.starts_with("Response Patterns: "));
    }

    #[test]
    fn test_confidence_language_counts_each_phrase_once() {
        let mut scorer = ResponseScorer::new("Ada");
        scorer.evaluate(
            "I think so. I think it scales. I think we shipped it, I believe, but I don't know when.",
            "q",
            "A",
            TopicCategory::Technical,
        );
        // two confident phrases against one uncertain phrase
        assert_eq!(scorer.profile().patterns.confidence_language, 0.0);

        let mut scorer = ResponseScorer::new("Ada");
        scorer.evaluate("I think, I think, I think.", "q", "A", TopicCategory::Technical);
        assert_eq!(scorer.profile().patterns.confidence_language, 1.0);
    }

    #[tokio::test]
    async fn test_publish_insights_reaches_context() {
        use crate::coordinator::shared_context::{ContextBus, Owner};

        let (context, _bus) = ContextBus::spawn();
        let mut scorer = ResponseScorer::new("Ada").with_context(context.writer(Owner::Scorer));
        let evaluation = scorer.evaluate(&words(20), "q", "Caching", TopicCategory::Technical);
        scorer
            .publish_insights(Some(evaluation.feedback.clone()))
            .await
            .unwrap();

        let snapshot = context.snapshot().await.unwrap();
        assert_eq!(snapshot.performance.evaluation_count, 1);
        assert_eq!(
            snapshot.performance.latest_feedback.as_deref(),
            Some(evaluation.feedback.as_str())
        );
        assert_eq!(snapshot.performance.insights, scorer.performance_insights());
    }
}

//! Question selection and generation
//!
//! Picks a template bucket from topic depth and candidate performance, builds
//! the prompt, and asks the text generator for the final wording. Streamed
//! fragments are only committed once the stream has finished; any failure
//! falls back to one plain completion and then to a placeholder question.

use super::generator::{GenerationError, TextGenerator, QUESTION_SHAPE_PREFIX};
use super::templates::{self, Bucket, FollowUpBand};
use crate::documents::models::{JobPosting, ResumeProfile};
use crate::error::Result;
use crate::planner::models::{Depth, TopicCategory};
use crate::scoring::models::Level;
use crate::session::models::QuestionKind;
use crate::session::store::SessionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const STREAM_BUFFER: usize = 64;

/// Document facts included in every prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    pub role_title: Option<String>,
    pub key_requirements: Vec<String>,
    pub candidate_name: Option<String>,
    pub key_skills: Vec<String>,
}

impl PromptContext {
    pub fn from_documents(job: Option<&JobPosting>, resume: Option<&ResumeProfile>) -> Self {
        Self {
            role_title: job.map(|j| j.title.clone()).filter(|t| !t.is_empty()),
            key_requirements: job
                .map(|j| j.requirements.iter().take(3).map(|r| r.text.clone()).collect())
                .unwrap_or_default(),
            candidate_name: resume.map(|r| r.name.clone()).filter(|n| !n.is_empty()),
            key_skills: resume
                .map(|r| r.skills.iter().take(5).cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionRequest {
    pub category: TopicCategory,
    pub topic: Option<String>,
    pub depth: Depth,
    pub difficulty: Level,
    /// Prefix a transition phrase for a newly started topic
    pub transition: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    Streamed,
    Completed,
    Placeholder,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub text: String,
    pub kind: QuestionKind,
    pub topic: Option<String>,
    pub bucket: Option<Bucket>,
    pub source: QuestionSource,
}

/// Adjustments derived from evaluator feedback and the latest response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyAdjustment {
    pub difficulty: Option<Level>,
    pub notes: Vec<String>,
}

pub struct QuestionStrategist {
    generator: Arc<dyn TextGenerator>,
    store: Arc<SessionStore>,
    temperature: f32,
    streaming: bool,
}

impl QuestionStrategist {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        store: Arc<SessionStore>,
        temperature: f32,
        streaming: bool,
    ) -> Self {
        Self {
            generator,
            store,
            temperature,
            streaming,
        }
    }

    pub fn select_bucket(depth: Depth, difficulty: Level) -> Bucket {
        if difficulty == Level::Low || depth == Depth::Surface {
            Bucket::Open
        } else if difficulty == Level::High || depth == Depth::Deep {
            Bucket::Elaborate
        } else {
            Bucket::Balanced
        }
    }

    pub fn follow_up_band(previous_response: &str) -> FollowUpBand {
        let lower = previous_response.to_lowercase();
        if templates::TECHNICAL_FOLLOW_UP_KEYWORDS
            .iter()
            .any(|kw| lower.contains(kw))
        {
            return FollowUpBand::Technical;
        }

        match previous_response.split_whitespace().count() {
            0..=19 => FollowUpBand::Elaborate,
            20..=49 => FollowUpBand::Probe,
            _ => FollowUpBand::Reflect,
        }
    }

    pub fn build_prompt(
        context: &PromptContext,
        request: &QuestionRequest,
        topic: &str,
        shape: &str,
    ) -> String {
        let mut parts = vec![
            format!(
                "You are an experienced technical interviewer asking a {} interview question.",
                request.category
            ),
            "Generate ONE high-quality, specific interview question.".to_string(),
        ];

        if let Some(ref title) = context.role_title {
            parts.push(format!("Job Role: {}", title));
        }
        if !context.key_requirements.is_empty() {
            parts.push(format!("Key Requirements: {}", context.key_requirements.join(", ")));
        }
        if let Some(ref name) = context.candidate_name {
            parts.push(format!("Candidate: {}", name));
        }
        if !context.key_skills.is_empty() {
            parts.push(format!("Key Skills: {}", context.key_skills.join(", ")));
        }

        parts.push(format!("Focus Topic: {}", topic));
        parts.push(format!(
            "Question Style: {}",
            templates::style_instruction(request.category)
        ));
        parts.push(format!("{}{}", QUESTION_SHAPE_PREFIX, shape));
        parts.push(format!(
            "Difficulty: {} (depth: {})",
            request.difficulty.as_str(),
            request.depth.as_str()
        ));
        parts.push("Generate only the question - no additional text, explanations, or formatting.".to_string());

        parts.join("\n")
    }

    /// Collect a streamed completion. Partial text is dropped on error.
    async fn stream_text(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let (tx, mut rx) = mpsc::channel::<String>(STREAM_BUFFER);

        let producer = self.generator.stream_complete(prompt, self.temperature, tx);
        let consumer = async move {
            let mut text = String::new();
            while let Some(fragment) = rx.recv().await {
                text.push_str(&fragment);
            }
            text
        };

        let (outcome, text) = tokio::join!(producer, consumer);
        outcome?;
        Ok(text)
    }

    async fn generate_text(&self, prompt: &str) -> Option<(String, QuestionSource)> {
        let mut plain_attempts = 2;

        if self.streaming {
            plain_attempts = 1;
            match self.stream_text(prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Some((text.trim().to_string(), QuestionSource::Streamed));
                }
                Ok(_) => warn!("Streamed question was empty, retrying without streaming"),
                Err(GenerationError::StreamingUnsupported) => {
                    debug!("Generator {} does not stream", self.generator.name());
                }
                Err(e) => warn!("Streaming failed, retrying without streaming: {}", e),
            }
        }

        for attempt in 0..plain_attempts {
            match self.generator.complete(prompt, self.temperature).await {
                Ok(text) if !text.trim().is_empty() => {
                    return Some((text.trim().to_string(), QuestionSource::Completed));
                }
                Ok(_) => warn!("Generator returned an empty question on attempt {}", attempt),
                Err(e) => warn!("Question generation attempt {} failed: {}", attempt, e),
            }
        }

        None
    }

    /// Generate, record and return the next question
    pub async fn generate_question(
        &self,
        context: &PromptContext,
        request: &QuestionRequest,
    ) -> Result<GeneratedQuestion> {
        let topic = request
            .topic
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| templates::default_topic(request.category).to_string());

        let bucket = Self::select_bucket(request.depth, request.difficulty);
        let shape = templates::render(
            templates::pick(templates::question_shapes(request.category, bucket)),
            &topic,
        );
        let prompt = Self::build_prompt(context, request, &topic, &shape);

        let (mut text, source) = match self.generate_text(&prompt).await {
            Some(generated) => generated,
            None => {
                error!("Falling back to placeholder question for '{}'", topic);
                (
                    format!("Could you tell me more about your experience with {}?", topic),
                    QuestionSource::Placeholder,
                )
            }
        };

        if request.transition {
            let phrase = templates::render(templates::pick(templates::TRANSITION_PHRASES), &topic);
            text = format!("{} {}", phrase, text);
        }

        let kind = QuestionKind::from(request.category);
        self.store.record_question(&text, kind).await?;
        debug!("Generated {:?} question on '{}' from {:?}", bucket, topic, source);

        Ok(GeneratedQuestion {
            text,
            kind,
            topic: Some(topic),
            bucket: Some(bucket),
            source,
        })
    }

    /// Opening question, recorded as `introduction`
    pub async fn opening_question(&self) -> Result<GeneratedQuestion> {
        self.template_question(templates::OPENING_QUESTIONS, QuestionKind::Introduction)
            .await
    }

    /// Closing question, recorded as `closing`
    pub async fn closing_question(&self) -> Result<GeneratedQuestion> {
        self.template_question(templates::CLOSING_QUESTIONS, QuestionKind::Closing)
            .await
    }

    async fn template_question(
        &self,
        options: &'static [&'static str],
        kind: QuestionKind,
    ) -> Result<GeneratedQuestion> {
        let text = templates::pick(options).to_string();
        self.store.record_question(&text, kind).await?;
        info!("Asked scripted {} question", kind.as_str());

        Ok(GeneratedQuestion {
            text,
            kind,
            topic: None,
            bucket: None,
            source: QuestionSource::Template,
        })
    }

    /// Follow-up chosen from the previous response, recorded as `follow-up`
    pub async fn generate_follow_up(&self, previous_response: &str) -> Result<GeneratedQuestion> {
        let band = Self::follow_up_band(previous_response);
        let text = templates::pick(templates::follow_ups(band)).to_string();
        self.store.record_question(&text, QuestionKind::FollowUp).await?;
        debug!("Selected {:?} follow-up question", band);

        Ok(GeneratedQuestion {
            text,
            kind: QuestionKind::FollowUp,
            topic: None,
            bucket: None,
            source: QuestionSource::Template,
        })
    }

    /// Keyword reading of evaluator feedback, topic guidance and the
    /// latest response
    pub fn adapt_strategy(feedback: &str, guidance: &str, response: &str) -> StrategyAdjustment {
        let mut adjustment = StrategyAdjustment::default();
        let feedback = feedback.to_lowercase();
        let guidance = guidance.to_lowercase();

        if feedback.contains("strong") || feedback.contains("excellent") {
            adjustment.difficulty = Some(Level::High);
            adjustment
                .notes
                .push("Increase question difficulty - candidate performing well".to_string());
        } else if feedback.contains("weak") || feedback.contains("struggling") {
            adjustment.difficulty = Some(Level::Low);
            adjustment
                .notes
                .push("Reduce question difficulty - provide more support".to_string());
        }

        if guidance.contains("transition") {
            adjustment.notes.push("Prepare for topic transition".to_string());
        } else if guidance.contains("deeper") {
            adjustment
                .notes
                .push("Ask more detailed follow-up questions".to_string());
        }

        if !response.trim().is_empty() {
            let words = response.split_whitespace().count();
            if words < 20 {
                adjustment.notes.push("Encourage more detailed responses".to_string());
            } else if words > 150 {
                adjustment.notes.push("Guide toward more concise responses".to_string());
            }

            let lower = response.to_lowercase();
            if templates::UNCERTAINTY_PHRASES.iter().any(|p| lower.contains(p)) {
                adjustment
                    .notes
                    .push("Provide supportive follow-up questions".to_string());
            }
        }

        adjustment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::strategist::generator::TemplateGenerator;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct InterruptedStream;

    #[async_trait]
    impl TextGenerator for InterruptedStream {
        async fn complete(&self, _prompt: &str, _t: f32) -> std::result::Result<String, GenerationError> {
            Ok("What did you learn from it?".to_string())
        }

        async fn stream_complete(
            &self,
            _prompt: &str,
            _t: f32,
            tx: mpsc::Sender<String>,
        ) -> std::result::Result<(), GenerationError> {
            let _ = tx.send("What did you ".to_string()).await;
            Err(GenerationError::StreamInterrupted("connection reset".into()))
        }

        fn name(&self) -> &str {
            "interrupted"
        }
    }

    struct Unavailable;

    #[async_trait]
    impl TextGenerator for Unavailable {
        async fn complete(&self, _prompt: &str, _t: f32) -> std::result::Result<String, GenerationError> {
            Err(GenerationError::Network("quota exceeded".into()))
        }

        fn name(&self) -> &str {
            "unavailable"
        }
    }

    async fn store_in(dir: &TempDir) -> Arc<SessionStore> {
        let store = Arc::new(SessionStore::new(SessionConfig {
            data_dir: dir.path().to_path_buf(),
            ..SessionConfig::default()
        }));
        store.create("Ada", "Backend Engineer").await.unwrap();
        store
    }

    fn request(category: TopicCategory, depth: Depth) -> QuestionRequest {
        QuestionRequest {
            category,
            topic: Some("Rust".to_string()),
            depth,
            difficulty: Level::Medium,
            transition: false,
        }
    }

    #[test]
    fn test_bucket_selection() {
        assert_eq!(QuestionStrategist::select_bucket(Depth::Surface, Level::High), Bucket::Open);
        assert_eq!(QuestionStrategist::select_bucket(Depth::Deep, Level::Low), Bucket::Open);
        assert_eq!(QuestionStrategist::select_bucket(Depth::Medium, Level::High), Bucket::Elaborate);
        assert_eq!(QuestionStrategist::select_bucket(Depth::Deep, Level::Medium), Bucket::Elaborate);
        assert_eq!(QuestionStrategist::select_bucket(Depth::Medium, Level::Medium), Bucket::Balanced);
    }

    #[test]
    fn test_follow_up_bands() {
        assert_eq!(QuestionStrategist::follow_up_band("Short answer."), FollowUpBand::Elaborate);
        let medium = "word ".repeat(30);
        assert_eq!(QuestionStrategist::follow_up_band(&medium), FollowUpBand::Probe);
        let long = "word ".repeat(60);
        assert_eq!(QuestionStrategist::follow_up_band(&long), FollowUpBand::Reflect);
        assert_eq!(
            QuestionStrategist::follow_up_band("I built the API"),
            FollowUpBand::Technical
        );
    }

    #[test]
    fn test_prompt_includes_context() {
        let context = PromptContext {
            role_title: Some("Backend Engineer".to_string()),
            key_requirements: vec!["Rust".to_string(), "SQL".to_string()],
            candidate_name: Some("Ada".to_string()),
            key_skills: vec!["Rust".to_string()],
        };
        let prompt = QuestionStrategist::build_prompt(
            &context,
            &request(TopicCategory::Technical, Depth::Medium),
            "Rust",
            "How do you use Rust?",
        );
        assert!(prompt.contains("Job Role: Backend Engineer"));
        assert!(prompt.contains("Key Requirements: Rust, SQL"));
        assert!(prompt.contains("Question shape: How do you use Rust?"));
        assert!(prompt.ends_with("formatting."));
    }

    #[tokio::test]
    async fn test_streamed_question_is_recorded() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let strategist = QuestionStrategist::new(Arc::new(TemplateGenerator), store.clone(), 0.8, true);

        let question = strategist
            .generate_question(&PromptContext::default(), &request(TopicCategory::Technical, Depth::Surface))
            .await
            .unwrap();

        assert_eq!(question.source, QuestionSource::Streamed);
        assert!(question.text.contains("Rust"));
        let session = store.snapshot().await.unwrap();
        assert_eq!(session.questions.last().unwrap().question, question.text);
        assert_eq!(session.questions.last().unwrap().kind, QuestionKind::Technical);
    }

    #[tokio::test]
    async fn test_interrupted_stream_is_not_recorded() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let strategist = QuestionStrategist::new(Arc::new(InterruptedStream), store.clone(), 0.8, true);

        let question = strategist
            .generate_question(&PromptContext::default(), &request(TopicCategory::Behavioral, Depth::Medium))
            .await
            .unwrap();

        assert_eq!(question.source, QuestionSource::Completed);
        assert_eq!(question.text, "What did you learn from it?");
        let session = store.snapshot().await.unwrap();
        assert_eq!(session.questions.len(), 1);
        assert_eq!(session.questions[0].question, "What did you learn from it?");
    }

    #[tokio::test]
    async fn test_unavailable_generator_yields_placeholder() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let strategist = QuestionStrategist::new(Arc::new(Unavailable), store.clone(), 0.8, false);

        let mut req = request(TopicCategory::Technical, Depth::Medium);
        req.transition = true;
        let question = strategist
            .generate_question(&PromptContext::default(), &req)
            .await
            .unwrap();

        assert_eq!(question.source, QuestionSource::Placeholder);
        assert!(question
            .text
            .ends_with("Could you tell me more about your experience with Rust?"));
    }

    #[tokio::test]
    async fn test_scripted_questions_record_kind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).await;
        let strategist = QuestionStrategist::new(Arc::new(TemplateGenerator), store.clone(), 0.8, true);

        strategist.opening_question().await.unwrap();
        strategist.generate_follow_up("yes").await.unwrap();
        strategist.closing_question().await.unwrap();

        let kinds: Vec<QuestionKind> = store
            .snapshot()
            .await
            .unwrap()
            .questions
            .iter()
            .map(|q| q.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![QuestionKind::Introduction, QuestionKind::FollowUp, QuestionKind::Closing]
        );
    }

    #[test]
    fn test_adapt_strategy() {
        let adjustment = QuestionStrategist::adapt_strategy(
            "Excellent response demonstrating strong capabilities",
            "",
            "Maybe, I'm not sure.",
        );
        assert_eq!(adjustment.difficulty, Some(Level::High));
        assert!(adjustment.notes.contains(&"Encourage more detailed responses".to_string()));
        assert!(adjustment
            .notes
            .contains(&"Provide supportive follow-up questions".to_string()));

        let adjustment = QuestionStrategist::adapt_strategy("Response is weak", "go deeper", "");
        assert_eq!(adjustment.difficulty, Some(Level::Low));
        assert_eq!(adjustment.notes.len(), 2);
    }
}

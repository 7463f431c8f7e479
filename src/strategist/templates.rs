//! Question shapes, follow-ups and conversational phrases

use crate::planner::models::TopicCategory;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Structural bucket for a generated question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Simplest, most open framing
    Open,
    Balanced,
    /// Multi-constraint framing
    Elaborate,
}

/// Follow-up band picked from the previous response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpBand {
    Elaborate,
    Probe,
    Reflect,
    Technical,
}

/// Keywords that switch follow-ups to the technical band
pub const TECHNICAL_FOLLOW_UP_KEYWORDS: &[&str] = &[
    "python",
    "aws",
    "system",
    "design",
    "architecture",
    "database",
    "api",
];

pub const UNCERTAINTY_PHRASES: &[&str] = &["not sure", "i think", "maybe", "probably"];

/// Question shapes keyed by category and bucket. `{topic}` is substituted.
pub fn question_shapes(category: TopicCategory, bucket: Bucket) -> &'static [&'static str] {
    match (category, bucket) {
        (TopicCategory::Technical, Bucket::Open) => &[
            "Can you tell me about your experience with {topic}?",
            "How familiar are you with {topic}?",
            "Have you worked with {topic} in any of your projects?",
            "What do you know about {topic}?",
        ],
        (TopicCategory::Technical, Bucket::Balanced) => &[
            "Can you describe your hands-on experience with {topic} and any challenges you've overcome?",
            "How have you used {topic} in your recent projects, and what results did you achieve?",
            "What aspects of {topic} do you find most challenging, and how do you address them?",
            "Can you walk me through a specific example where you implemented {topic} and the decisions you made?",
        ],
        (TopicCategory::Technical, Bucket::Elaborate) => &[
            "Can you explain the internal architecture and optimization strategies you'd use when implementing {topic} at scale?",
            "How would you debug performance issues in a {topic}-based system under high load?",
            "What trade-offs and design patterns would you consider when architecting a system around {topic}?",
            "How would you migrate a legacy system to {topic} while keeping zero downtime?",
        ],
        (TopicCategory::Behavioral, Bucket::Open) => &[
            "Can you tell me about a time that shows your {topic}?",
            "What does {topic} look like in your day-to-day work?",
        ],
        (TopicCategory::Behavioral, Bucket::Balanced) => &[
            "Tell me about a situation that tested your {topic}. What was the situation, what did you do, and what was the outcome?",
            "Describe a recent example of your {topic}. What was your role and what result did it have?",
        ],
        (TopicCategory::Behavioral, Bucket::Elaborate) => &[
            "Tell me about a time that tested your {topic}. I'm interested in your thought process, the alternatives you considered, how you measured success, and what you still apply today.",
        ],
        (TopicCategory::Situational, Bucket::Open) => &[
            "How would you handle a situation involving {topic}?",
        ],
        (TopicCategory::Situational, Bucket::Balanced) => &[
            "Imagine a project where {topic} becomes a problem. How would you handle it, and what factors would you weigh?",
        ],
        (TopicCategory::Situational, Bucket::Elaborate) => &[
            "Imagine {topic} becomes critical on a live project. Walk me through stakeholder communication, risk assessment, implementation, monitoring, and how you'd handle complications.",
        ],
        (TopicCategory::SystemDesign, Bucket::Open) => &[
            "How would you approach designing a system around {topic}? What are the main components?",
        ],
        (TopicCategory::SystemDesign, Bucket::Balanced) => &[
            "How would you design a system for {topic}? Cover scalability, reliability and performance, and explain your trade-offs.",
        ],
        (TopicCategory::SystemDesign, Bucket::Elaborate) => &[
            "Design a system for {topic} serving 100M+ users. Address scalability, reliability, security, monitoring, disaster recovery, cost, and data consistency across regions.",
        ],
    }
}

pub fn follow_ups(band: FollowUpBand) -> &'static [&'static str] {
    match band {
        FollowUpBand::Elaborate => &[
            "Can you elaborate on that?",
            "What else can you tell me about this?",
            "Are there any other aspects to consider?",
        ],
        FollowUpBand::Probe => &[
            "What challenges did you encounter in that situation?",
            "How did you decide on that approach?",
            "What would you do differently next time?",
            "What was the outcome of that decision?",
        ],
        FollowUpBand::Reflect => &[
            "Can you walk me through your thought process step by step?",
            "What alternative approaches did you consider and why did you choose this one?",
            "How did you measure the success of your approach?",
            "What lessons did you learn that you apply in similar situations now?",
        ],
        FollowUpBand::Technical => &[
            "What technologies would you choose differently today?",
            "How would you scale this solution?",
            "What performance considerations did you keep in mind?",
        ],
    }
}

/// Style line appended to every prompt
pub fn style_instruction(category: TopicCategory) -> &'static str {
    match category {
        TopicCategory::Technical => {
            "Ask about specific technical experience, implementation details, or problem-solving approaches. Be specific and practical."
        }
        TopicCategory::Behavioral => {
            "Ask about past experiences using the STAR format (Situation, Task, Action, Result)."
        }
        TopicCategory::Situational => {
            "Present a realistic workplace scenario and ask how they would handle it."
        }
        TopicCategory::SystemDesign => {
            "Ask them to design a system or architecture, including scalability, reliability, and performance considerations."
        }
    }
}

/// Topic used when guidance names none
pub fn default_topic(category: TopicCategory) -> &'static str {
    match category {
        TopicCategory::Technical => "your technical background",
        TopicCategory::Behavioral => "teamwork under pressure",
        TopicCategory::Situational => "a slow-performing system",
        TopicCategory::SystemDesign => "a notification service",
    }
}

pub const TRANSITION_PHRASES: &[&str] = &[
    "Great! Now let's move on to discuss {topic}.",
    "Thank you for that insight. I'd like to explore {topic} next.",
    "That's very helpful. Let's shift our focus to {topic}.",
    "Excellent. Now I'm curious about your experience with {topic}.",
];

pub const OPENING_QUESTIONS: &[&str] = &[
    "Let's start with a brief introduction. Can you tell me about your current role and what drew you to apply for this position?",
    "I'd love to learn more about your background. Can you walk me through your professional journey and what interests you about this opportunity?",
    "To begin, could you share what you're currently working on and what aspects of this role excite you the most?",
];

pub const CLOSING_QUESTIONS: &[&str] = &[
    "We're nearly at the end. Is there anything about your experience we haven't covered that you'd like to share?",
    "Before we wrap up, what questions do you have for us about the role or the team?",
];

pub fn render(template: &str, topic: &str) -> String {
    template.replace("{topic}", topic)
}

/// Random entry from a non-empty table
pub fn pick(options: &'static [&'static str]) -> &'static str {
    options.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_bucket_has_shapes() {
        let categories = [
            TopicCategory::Technical,
            TopicCategory::Behavioral,
            TopicCategory::Situational,
            TopicCategory::SystemDesign,
        ];
        for category in categories {
            for bucket in [Bucket::Open, Bucket::Balanced, Bucket::Elaborate] {
                let shapes = question_shapes(category, bucket);
                assert!(!shapes.is_empty());
                assert!(shapes.iter().all(|s| s.contains("{topic}")));
            }
        }
    }

    #[test]
    fn test_render_substitutes_topic() {
        let text = render(pick(TRANSITION_PHRASES), "Kubernetes");
        assert!(text.contains("Kubernetes"));
        assert!(!text.contains("{topic}"));
    }
}

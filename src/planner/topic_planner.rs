//! Time-boxed topic sequencing with per-topic depth tracking

use super::models::*;
use crate::config::PlannerConfig;
use crate::documents::models::{Importance, Requirement};
use crate::error::{InterviewError, Result};
use crate::scoring::models::Level;
use indexmap::IndexMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Behavioral topics planned for every interview
pub const BEHAVIORAL_TOPICS: [&str; 4] = [
    "Leadership Experience",
    "Team Collaboration",
    "Problem Solving Approach",
    "Professional Growth",
];

/// Plans the topic sequence and tracks coverage and depth per topic
pub struct TopicPlanner {
    config: PlannerConfig,
    topics: IndexMap<String, TopicNode>,
    flow: Option<TopicFlow>,
    current_topic: Option<String>,
    remaining_minutes: u32,
    topic_started: Option<Instant>,
}

impl TopicPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        let remaining_minutes = config.default_remaining_minutes;
        Self {
            config,
            topics: IndexMap::new(),
            flow: None,
            current_topic: None,
            remaining_minutes,
            topic_started: None,
        }
    }

    pub fn topics(&self) -> &IndexMap<String, TopicNode> {
        &self.topics
    }

    pub fn topic(&self, name: &str) -> Option<&TopicNode> {
        self.topics.get(name)
    }

    pub fn flow(&self) -> Option<&TopicFlow> {
        self.flow.as_ref()
    }

    pub fn current_topic(&self) -> Option<&str> {
        self.current_topic.as_deref()
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.remaining_minutes
    }

    /// Update the session time left, in minutes
    pub fn set_time_remaining(&mut self, minutes: u32) {
        self.remaining_minutes = minutes;
    }

    /// Build the topic set from requirements and order it into a plan that
    /// fits `duration_minutes`. High-importance topics are always kept, with
    /// their time clipped to whatever budget is left.
    pub fn plan_sequence(&mut self, requirements: &[Requirement], duration_minutes: u32) -> Vec<TopicNode> {
        self.topics.clear();

        for requirement in requirements {
            if requirement.importance == Importance::Low {
                continue;
            }
            let Some(category) = TopicCategory::from_requirement(requirement.category) else {
                continue;
            };
            if !self.topics.contains_key(&requirement.text) {
                self.topics.insert(
                    requirement.text.clone(),
                    TopicNode::new(requirement.text.clone(), category, requirement.importance),
                );
            }
        }

        for name in BEHAVIORAL_TOPICS {
            if !self.topics.contains_key(name) {
                self.topics.insert(
                    name.to_string(),
                    TopicNode::new(name, TopicCategory::Behavioral, Importance::Medium),
                );
            }
        }

        let mut ordered: Vec<String> = self.topics.keys().cloned().collect();
        ordered.sort_by(|a, b| {
            let (a, b) = (&self.topics[a], &self.topics[b]);
            (b.importance.rank(), b.category.rank()).cmp(&(a.importance.rank(), a.category.rank()))
        });

        let budget = duration_minutes as i64;
        let mut used: i64 = 0;
        let mut sequence = Vec::new();

        for name in ordered {
            let Some(node) = self.topics.get_mut(&name) else {
                continue;
            };
            let estimate = node.estimated_time as i64;

            if used + estimate <= budget {
                used += estimate;
                sequence.push(name);
            } else if node.importance == Importance::High {
                let clipped = estimate.min(budget - used).max(0);
                warn!(
                    "Topic '{}' exceeds the time budget, keeping it with {} of {} minutes",
                    name, clipped, estimate
                );
                node.estimated_time = clipped as u32;
                node.time_critical = true;
                used += clipped;
                sequence.push(name);
            }
        }

        let total_estimated_minutes = sequence.iter().map(|n| self.topics[n].estimated_time).sum();
        info!(
            "Planned {} topics over {} minutes (estimated {} minutes)",
            sequence.len(),
            duration_minutes,
            total_estimated_minutes
        );

        self.current_topic = sequence.first().cloned();
        self.topic_started = self.current_topic.as_ref().map(|_| Instant::now());
        let planned = sequence.iter().map(|n| self.topics[n].clone()).collect();

        self.flow = Some(TopicFlow {
            sequence,
            cursor: 0,
            total_estimated_minutes,
            elapsed_minutes: 0.0,
            coverage_score: 0.0,
        });

        planned
    }

    fn ensure_planned(&self) -> Result<&TopicFlow> {
        self.flow.as_ref().ok_or(InterviewError::NotPlanned)
    }

    /// Decide whether the topic goes one level deeper after a response.
    ///
    /// Always counts the question against the topic. Time pressure overrides
    /// every reason to advance.
    pub fn evaluate_depth(&mut self, topic: &str, quality: Level, word_count: usize) -> Result<DepthDecision> {
        self.ensure_planned()?;
        let threshold = self.config.depth_progression_threshold;
        let pressure = self.remaining_minutes < self.config.time_pressure_minutes;
        let remaining = self.remaining_minutes;

        let node = self
            .topics
            .get_mut(topic)
            .ok_or_else(|| InterviewError::UnknownTopic(topic.to_string()))?;

        let mut advance = false;
        let mut reasons = Vec::new();

        if quality == Level::High && word_count > 50 {
            advance = true;
            reasons.push("candidate showing strong expertise".to_string());
        }
        if node.importance == Importance::High && node.questions_asked < 3 {
            advance = true;
            reasons.push("high importance topic needs more coverage".to_string());
        }
        if node.current_depth == Depth::Surface && node.questions_asked >= threshold {
            advance = true;
            reasons.push("ready to progress to deeper level".to_string());
        }
        if pressure {
            advance = false;
            reasons.push(format!("time constraints ({} minutes remaining)", remaining));
        }

        if advance {
            node.current_depth = node.current_depth.next();
        }
        node.questions_asked += 1;

        debug!(
            "Depth for '{}': advance={} depth={} questions={}",
            topic,
            advance,
            node.current_depth.as_str(),
            node.questions_asked
        );

        Ok(DepthDecision {
            topic: topic.to_string(),
            advance,
            new_depth: node.current_depth,
            questions_asked: node.questions_asked,
            reasons,
        })
    }

    /// Pick the topic to move to, marking the outgoing one covered when its
    /// status is complete or partial.
    pub fn suggest_next_topic(&mut self, current: Option<&str>, status: CoverageStatus) -> Result<NextTopic> {
        self.ensure_planned()?;

        if let Some(current) = current {
            if matches!(status, CoverageStatus::Complete | CoverageStatus::Partial) {
                self.mark_covered(current);
            }
        }

        let next = self.next_in_sequence().or_else(|| {
            [Importance::High, Importance::Medium].iter().find_map(|importance| {
                self.topics
                    .values()
                    .find(|n| !n.covered && n.importance == *importance)
                    .map(|n| n.name.clone())
            })
        });

        let Some(next) = next else {
            info!("All planned topics covered");
            self.current_topic = None;
            self.topic_started = None;
            return Ok(NextTopic::Exhausted);
        };

        if let Some(flow) = self.flow.as_mut() {
            match flow.sequence.iter().position(|n| *n == next) {
                Some(index) => flow.cursor = index,
                None => {
                    flow.sequence.push(next.clone());
                    flow.cursor = flow.sequence.len() - 1;
                }
            }
        }

        info!("Next topic: {}", next);
        self.current_topic = Some(next.clone());
        self.topic_started = Some(Instant::now());
        Ok(NextTopic::Topic(next))
    }

    fn next_in_sequence(&self) -> Option<String> {
        let flow = self.flow.as_ref()?;
        flow.sequence
            .iter()
            .skip(flow.cursor)
            .find(|name| self.topics.get(*name).map_or(false, |n| !n.covered))
            .cloned()
    }

    fn mark_covered(&mut self, topic: &str) {
        if let Some(node) = self.topics.get_mut(topic) {
            node.covered = true;
        }
        let covered = self.topics.values().filter(|n| n.covered).count();
        let total = self.topics.len();
        if let Some(flow) = self.flow.as_mut() {
            flow.coverage_score = if total == 0 { 0.0 } else { covered as f64 / total as f64 };
        }
    }

    /// Coverage snapshot. Pure read.
    pub fn analyze_coverage(&self) -> Result<CoverageReport> {
        let flow = self.ensure_planned()?;

        let total_count = self.topics.len();
        let covered_count = self.topics.values().filter(|n| n.covered).count();
        let high_priority_total = self
            .topics
            .values()
            .filter(|n| n.importance == Importance::High)
            .count();
        let high_priority_covered = self
            .topics
            .values()
            .filter(|n| n.covered && n.importance == Importance::High)
            .count();

        let uncovered = |importance: Importance| {
            self.topics
                .values()
                .filter(move |n| !n.covered && n.importance == importance)
                .map(|n| n.name.clone())
        };

        Ok(CoverageReport {
            coverage_score: if total_count == 0 {
                0.0
            } else {
                covered_count as f64 / total_count as f64
            },
            covered_count,
            total_count,
            high_priority_covered,
            high_priority_total,
            uncovered_high: uncovered(Importance::High).collect(),
            uncovered_medium: uncovered(Importance::Medium).take(3).collect(),
            time_utilization: if flow.total_estimated_minutes == 0 {
                0.0
            } else {
                flow.elapsed_minutes / flow.total_estimated_minutes as f64
            },
        })
    }

    pub fn time_status(&self) -> Result<TimeStatus> {
        self.ensure_planned()?;
        let uncovered_count = self.topics.values().filter(|n| !n.covered).count();
        Ok(TimeStatus {
            remaining_minutes: self.remaining_minutes,
            uncovered_count,
            avg_minutes_per_remaining_topic: self.remaining_minutes as f64 / uncovered_count.max(1) as f64,
        })
    }

    /// Steering for the next question on the current topic
    pub fn guidance(&self) -> Result<TopicGuidance> {
        self.ensure_planned()?;

        let time_status = if self.remaining_minutes < self.config.time_pressure_minutes {
            TimePressure::TimeCritical
        } else {
            TimePressure::OnTrack
        };

        let node = self.current_topic.as_deref().and_then(|t| self.topics.get(t));
        let Some(node) = node else {
            return Ok(TopicGuidance {
                current_topic: self.current_topic.clone(),
                suggested_depth: Depth::Medium,
                transition: TransitionAdvice::Continue,
                time_status,
                category: None,
                importance: None,
                current_depth: None,
                questions_asked: 0,
            });
        };

        let transition = if node.questions_asked >= max_questions(node.importance) {
            TransitionAdvice::Transition
        } else {
            TransitionAdvice::Continue
        };

        Ok(TopicGuidance {
            current_topic: Some(node.name.clone()),
            suggested_depth: self.suggest_next_depth(node),
            transition,
            time_status,
            category: Some(node.category),
            importance: Some(node.importance),
            current_depth: Some(node.current_depth),
            questions_asked: node.questions_asked,
        })
    }

    fn suggest_next_depth(&self, node: &TopicNode) -> Depth {
        if node.questions_asked < self.config.depth_progression_threshold {
            node.current_depth
        } else if node.current_depth == Depth::Surface {
            Depth::Medium
        } else if node.current_depth == Depth::Medium && node.importance == Importance::High {
            Depth::Deep
        } else {
            node.current_depth
        }
    }

    /// Time bookkeeping across topics
    pub fn manage_time(&mut self, action: TimeAction) -> Result<TimeReport> {
        self.ensure_planned()?;

        match action {
            TimeAction::StartTopic(topic) => {
                self.topic_started = Some(Instant::now());
                Ok(TimeReport::Started { topic })
            }
            TimeAction::EndTopic(topic) => {
                let Some(started) = self.topic_started.take() else {
                    return Ok(TimeReport::NotStarted { topic });
                };
                let minutes = started.elapsed().as_secs_f64() / 60.0;
                if let Some(flow) = self.flow.as_mut() {
                    flow.elapsed_minutes += minutes;
                }
                self.mark_covered(&topic);
                Ok(TimeReport::Ended { topic, minutes })
            }
            TimeAction::CheckTime => Ok(TimeReport::Status(self.time_status()?)),
            TimeAction::AdjustPlan => Ok(TimeReport::Plan {
                advice: self.adjust_plan(),
            }),
        }
    }

    fn adjust_plan(&self) -> String {
        let uncovered: Vec<&TopicNode> = self.topics.values().filter(|n| !n.covered).collect();
        if uncovered.is_empty() {
            return "All topics covered".to_string();
        }

        let high = uncovered.iter().filter(|n| n.importance == Importance::High).count();
        if (self.remaining_minutes as usize) < high * 3 {
            format!("Time critical: Focus only on {} high-priority topics", high)
        } else {
            "Time sufficient: Continue with planned sequence".to_string()
        }
    }
}

//! Metrics collection for interview observability

use prometheus::{
    Counter, CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Session metrics
    pub questions_asked: CounterVec,
    pub responses_recorded: Counter,
    pub session_saves: CounterVec,
    pub phase_transitions: CounterVec,
    pub topic_transitions: Counter,

    // Scoring metrics
    pub evaluations: Counter,
    pub evaluation_scores: Histogram,

    // Text generation metrics
    pub generation_requests: CounterVec,
    pub generation_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let questions_asked = register_counter_vec_with_registry!(
            Opts::new("interview_questions_total", "Total questions recorded"),
            &["kind"],
            registry
        )?;

        let responses_recorded = register_counter_with_registry!(
            Opts::new("interview_responses_total", "Total responses recorded"),
            registry
        )?;

        let session_saves = register_counter_vec_with_registry!(
            Opts::new("interview_session_saves_total", "Total session snapshot writes"),
            &["status"],
            registry
        )?;

        let phase_transitions = register_counter_vec_with_registry!(
            Opts::new("interview_phase_transitions_total", "Phase transitions by target phase"),
            &["phase"],
            registry
        )?;

        let topic_transitions = register_counter_with_registry!(
            Opts::new("interview_topic_transitions_total", "Total topic transitions"),
            registry
        )?;

        let evaluations = register_counter_with_registry!(
            Opts::new("interview_evaluations_total", "Total response evaluations"),
            registry
        )?;

        let evaluation_scores = register_histogram_with_registry!(
            HistogramOpts::new("interview_evaluation_score", "Weighted overall score per evaluation")
                .buckets(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]),
            registry
        )?;

        let generation_requests = register_counter_vec_with_registry!(
            Opts::new("interview_generation_requests_total", "Text generation requests"),
            &["mode", "status"],
            registry
        )?;

        let generation_duration = register_histogram_vec_with_registry!(
            "interview_generation_duration_seconds",
            "Text generation latency in seconds",
            &["mode"],
            registry
        )?;

        Ok(Self {
            registry,
            questions_asked,
            responses_recorded,
            session_saves,
            phase_transitions,
            topic_transitions,
            evaluations,
            evaluation_scores,
            generation_requests,
            generation_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a question of the given kind
    pub fn record_question(&self, kind: &str) {
        self.questions_asked.with_label_values(&[kind]).inc();
    }

    pub fn record_response(&self) {
        self.responses_recorded.inc();
    }

    /// Record a session snapshot write
    pub fn record_save(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.session_saves.with_label_values(&[status]).inc();
    }

    pub fn record_phase(&self, phase: &str) {
        self.phase_transitions.with_label_values(&[phase]).inc();
    }

    pub fn record_topic_transition(&self) {
        self.topic_transitions.inc();
    }

    /// Record a completed evaluation and its overall score
    pub fn record_evaluation(&self, overall: f64) {
        self.evaluations.inc();
        self.evaluation_scores.observe(overall);
    }

    /// Record a text generation attempt
    pub fn record_generation(&self, mode: &str, success: bool, seconds: f64) {
        let status = if success { "success" } else { "error" };
        self.generation_requests.with_label_values(&[mode, status]).inc();
        self.generation_duration.with_label_values(&[mode]).observe(seconds);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use interview_coordinator::coordinator::{Command, CommandOutcome, InterviewCoordinator};
use interview_coordinator::logging::init_tracing;
use interview_coordinator::metrics::METRICS;
use interview_coordinator::session::{EvaluationReport, WarningEvent};
use interview_coordinator::strategist::{OpenAiClient, TemplateGenerator, TextGenerator};
use interview_coordinator::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

const WARNING_BUFFER: usize = 8;

#[derive(Parser)]
#[command(name = "interview")]
#[command(about = "Simulated technical interview driven by a job posting and a resume", long_about = None)]
struct Cli {
    /// Job posting text file
    job: PathBuf,

    /// Candidate resume text file
    resume: PathBuf,

    /// Optional configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Planned interview length in minutes
    #[arg(short, long)]
    duration: Option<u32>,

    /// Directory for sessions, transcripts and evaluations
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(duration) = cli.duration {
        config.planner.duration_minutes = duration;
    }
    if let Some(dir) = cli.data_dir {
        config.session.data_dir = dir;
    }
    init_tracing(&config.logging);

    let generator: Arc<dyn TextGenerator> = match config.generation.api_key() {
        Some(_) => {
            info!("Using chat completions backend with model {}", config.generation.model);
            Arc::new(OpenAiClient::new(config.generation.clone())?)
        }
        None => {
            warn!(
                "{} is not set, questions come from built-in templates",
                config.generation.api_key_env
            );
            Arc::new(TemplateGenerator)
        }
    };

    let (warning_tx, mut warning_rx) = mpsc::channel::<WarningEvent>(WARNING_BUFFER);
    let mut coordinator = InterviewCoordinator::new(config, generator).with_warnings(warning_tx);

    let opening = coordinator
        .start(&cli.job, &cli.resume)
        .await
        .context("failed to start interview")?;
    println!("Type 'help' for commands.\n");
    println!("Interviewer: {}\n", opening.text);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = warning_rx.recv() => {
                println!("\n[{}] ({}s left)\n", event.warning.message(), event.remaining_secs);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match coordinator.dispatch(Command::parse(&line)).await {
                    Ok(outcome) => {
                        if print_outcome(outcome) {
                            break;
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
    }

    // stdin closed mid-interview
    if coordinator.store().is_active().await {
        if let Some(report) = coordinator.end_interview().await? {
            print_report(&report);
        }
    }

    if cli.metrics {
        eprintln!("{}", METRICS.export_prometheus());
    }
    Ok(())
}

/// Print one command outcome; returns true once the interview is over
fn print_outcome(outcome: CommandOutcome) -> bool {
    match outcome {
        CommandOutcome::Turn(turn) => {
            if turn.timed_out {
                println!("\nThe session timed out.");
            }
            if let Some(evaluation) = turn.evaluation {
                println!("  (score {:.1}/10)", evaluation.overall_score);
            }
            match turn.question {
                Some(question) => {
                    println!("\nInterviewer: {}\n", question.text);
                    false
                }
                None => {
                    println!("\nThank you, the interview is complete.");
                    if let Some(report) = turn.report {
                        print_report(&report);
                    }
                    true
                }
            }
        }
        CommandOutcome::Status(summary) => {
            println!(
                "Session {} | phase {} | topic {} | {} questions | {}s left",
                summary.session_id,
                summary.current_phase,
                summary.current_topic.as_deref().unwrap_or("-"),
                summary.questions_asked,
                summary.time_remaining
            );
            false
        }
        CommandOutcome::Saved => {
            println!("Session saved.");
            false
        }
        CommandOutcome::Help(text) => {
            println!("{}", text);
            false
        }
        CommandOutcome::Ended(report) => {
            if let Some(report) = report {
                print_report(&report);
            }
            true
        }
        CommandOutcome::Transitioned { question, .. } => {
            if let Some(question) = question {
                println!("\nInterviewer: {}\n", question.text);
            }
            false
        }
        CommandOutcome::PhaseAdvanced(phase) => {
            println!("Phase: {}", phase);
            false
        }
        CommandOutcome::Coverage(coverage) => {
            println!(
                "Covered {}/{} topics ({} of {} high priority), score {:.2}",
                coverage.covered_count,
                coverage.total_count,
                coverage.high_priority_covered,
                coverage.high_priority_total,
                coverage.coverage_score
            );
            if !coverage.uncovered_high.is_empty() {
                println!("Uncovered high priority: {}", coverage.uncovered_high.join(", "));
            }
            false
        }
    }
}

fn print_report(report: &EvaluationReport) {
    println!("\n=== Evaluation: {} ===", report.candidate_name);
    for (name, score) in &report.scores {
        println!("  {:<22} {:.1}", name, score);
    }
    println!(
        "  {} questions, {} responses, trend {:?}",
        report.total_questions, report.total_responses, report.performance_trend
    );
    println!("  {}", report.detailed_feedback.recommendation);
}

//! Typed interview commands

use crate::planner::models::CoverageStatus;

pub const HELP_TEXT: &str = "\
Answer each question in your own words and press Enter.

Commands:
  help                 show this help
  status               show session progress
  save                 save the session now
  exit | quit | end    finish the interview and write the report
  /next [complete|partial|incomplete]
                       move on to the next topic
  /phase               advance to the next interview phase
  /coverage            show topic coverage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Candidate answer to the pending question
    Respond(String),
    Status,
    Save,
    Help,
    End,
    Transition(CoverageStatus),
    AdvancePhase,
    Coverage,
}

impl Command {
    /// Map one line of input to a command. Anything that is not a reserved
    /// token is a response.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();

        match trimmed.to_lowercase().as_str() {
            "help" => return Command::Help,
            "status" => return Command::Status,
            "save" => return Command::Save,
            "exit" | "quit" | "end" => return Command::End,
            "/phase" => return Command::AdvancePhase,
            "/coverage" => return Command::Coverage,
            _ => {}
        }

        let mut words = trimmed.split_whitespace();
        if words.next().map(str::to_lowercase).as_deref() == Some("/next") {
            let status = match words.next().map(str::to_lowercase).as_deref() {
                Some("complete") => Some(CoverageStatus::Complete),
                Some("incomplete") => Some(CoverageStatus::Incomplete),
                Some("partial") | None => Some(CoverageStatus::Partial),
                Some(_) => None,
            };
            if let (Some(status), None) = (status, words.next()) {
                return Command::Transition(status);
            }
        }

        Command::Respond(trimmed.to_string())
    }
}

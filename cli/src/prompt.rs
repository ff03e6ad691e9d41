//! Interactive header resolution on the console.

use colored::Colorize;
use dialoguer::Input;
use indicatif::ProgressBar;

use docsheet::mapping::{Decision, HeaderResolver, Prompt, ResolverFeedback};

/// Asks the operator to map each unresolved header.
///
/// Accepted answers: Enter for the top suggestion, a candidate number,
/// `0` or `s` to leave the header unmapped, `u` to undo the previous answer.
pub struct ConsoleResolver {
    progress: ProgressBar,
}

impl ConsoleResolver {
    /// Create a resolver that hides `progress` while prompting.
    pub fn new(progress: ProgressBar) -> Self {
        Self { progress }
    }

    fn ask(prompt: &Prompt<'_>) -> Result<Decision, dialoguer::Error> {
        println!();
        println!(
            "{} [{}/{}] {}",
            "Header".cyan().bold(),
            prompt.position,
            prompt.total,
            prompt.header.bold()
        );
        for (idx, candidate) in prompt.candidates.iter().enumerate() {
            println!(
                "  {:>2}. {} {}",
                idx + 1,
                candidate.column,
                format!("({:.2})", candidate.score).dimmed()
            );
        }
        println!("  {:>2}. {}", 0, "leave unmapped".dimmed());

        let hint = if prompt.can_undo {
            "Choice [Enter = 1, s = skip, u = undo]"
        } else {
            "Choice [Enter = 1, s = skip]"
        };

        loop {
            let answer: String = Input::new()
                .with_prompt(hint)
                .allow_empty(true)
                .interact_text()?;
            match parse_answer(&answer) {
                Some(decision) => return Ok(decision),
                None => println!("{} '{}'", "Unrecognized answer".yellow(), answer.trim()),
            }
        }
    }
}

impl HeaderResolver for ConsoleResolver {
    fn resolve(&mut self, prompt: &Prompt<'_>) -> docsheet::Result<Decision> {
        self.progress
            .suspend(|| Self::ask(prompt))
            .map_err(|e| docsheet::Error::Other(format!("prompt failed: {}", e)))
    }

    fn feedback(&mut self, feedback: &ResolverFeedback) {
        let line = match feedback {
            ResolverFeedback::Undone { .. } => feedback.to_string().green(),
            _ => feedback.to_string().yellow(),
        };
        self.progress.suspend(|| println!("{}", line));
    }
}

fn parse_answer(answer: &str) -> Option<Decision> {
    let answer = answer.trim().to_lowercase();
    match answer.as_str() {
        "" => Some(Decision::AcceptTop),
        "u" | "undo" => Some(Decision::Undo),
        "s" | "skip" | "-" => Some(Decision::LeaveUnmapped),
        n => n.parse::<usize>().ok().map(Decision::Pick),
    }
}

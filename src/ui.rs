use std::io::{self, IsTerminal};

use crate::app::{HydrateReport, StatusView};
use crate::domain::{Difficulty, Progress, Question, Sheet};
use crate::hydration::HydrationState;
use crate::listing::SheetListFilter;

const BAR_WIDTH: usize = 20;

pub fn print_sheet(sheet: &Sheet, filter: &SheetListFilter) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Sheet"));
    if let Some(summary) = filter_summary(filter) {
        println!("{}", palette.dim(&format!("filters: {summary}")));
    }

    if sheet.is_empty() {
        println!("{}", palette.dim("no questions matched"));
        return;
    }

    for topic in &sheet.topics {
        println!(
            "{} {} {}",
            palette.id(&topic.id),
            palette.bold(&topic.title),
            palette.progress(topic.progress())
        );
        for sub in &topic.sub_topics {
            println!(
                "  {} {} {}",
                palette.id(&sub.id),
                sub.title,
                palette.progress(sub.progress())
            );
            for question in &sub.questions {
                println!("{}", format_question_row(question, &palette));
            }
        }
    }
    let progress = sheet.progress();
    println!(
        "{}",
        palette.dim(&format!(
            "{} question(s), {} solved",
            progress.total, progress.solved
        ))
    );
}

pub fn print_progress(sheet: &Sheet) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Progress"));
    for topic in &sheet.topics {
        let progress = topic.progress();
        println!(
            "{} {:>3}% {} {}",
            progress_bar(progress),
            progress.percent(),
            topic.title,
            palette.progress(progress)
        );
    }
    let overall = sheet.progress();
    println!(
        "{}",
        palette.bold(&format!(
            "{} {:>3}% overall {}/{}",
            progress_bar(overall),
            overall.percent(),
            overall.solved,
            overall.total
        ))
    );
}

pub fn print_hydrate_report(report: &HydrateReport) {
    let palette = Palette::auto();
    match report.outcome.as_str() {
        "installed" => {
            println!(
                "hydrated {} topic(s), {} question(s) from {}",
                report.topics, report.questions, report.source
            );
            if report.skipped_records > 0 {
                println!(
                    "{}",
                    palette.warn(&format!(
                        "skipped {} malformed record(s)",
                        report.skipped_records
                    ))
                );
            }
        }
        "skipped_non_empty" => println!(
            "{}",
            palette.dim("sheet already has data; run `qsheet reset --yes` to hydrate again")
        ),
        "failed" => println!(
            "{}",
            palette.warn(&format!(
                "hydration failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            ))
        ),
        other => println!("{}", palette.dim(&format!("hydration {other}"))),
    }
}

pub fn print_status(status: &StatusView) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Status"));
    println!("db: {}", status.db_path);
    println!("key: {}", status.storage_key);
    if let Some(version) = status.schema_version.as_deref() {
        println!("schema: v{version}");
    }
    println!(
        "sheet: {} topic(s), {} question(s), {}/{} solved",
        status.topics, status.questions, status.progress.solved, status.progress.total
    );
    println!(
        "saved: {}",
        status.saved_at.as_deref().unwrap_or("never")
    );
    if let HydrationState::Failed { message } = &status.hydration {
        println!("{}", palette.warn(&format!("hydration error: {message}")));
    }
    match &status.last_hydration {
        Some(run) => {
            let mut line = format!(
                "last hydration: {} {} at {}",
                run.status, run.source, run.ran_at
            );
            if let Some(error) = run.last_error.as_deref() {
                line.push_str(&format!(" ({error})"));
            }
            println!("{line}");
        }
        None => println!("{}", palette.dim("last hydration: never")),
    }
}

fn format_question_row(question: &Question, palette: &Palette) -> String {
    let check = if question.solved { "[x]" } else { "[ ]" };
    let mut line = format!(
        "    {} {} {} {}",
        palette.check(check, question.solved),
        palette.id(&question.id),
        palette.difficulty(question.difficulty),
        question.title
    );
    if question.starred {
        line.push(' ');
        line.push_str(&palette.star("*"));
    }
    line
}

fn progress_bar(progress: Progress) -> String {
    let filled = if progress.total == 0 {
        0
    } else {
        (progress.solved * BAR_WIDTH) / progress.total
    };
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH.saturating_sub(filled))
    )
}

fn filter_summary(filter: &SheetListFilter) -> Option<String> {
    let mut parts = Vec::new();
    if filter.unsolved {
        parts.push("unsolved");
    }
    if filter.starred {
        parts.push("starred");
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn warn(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn progress(&self, progress: Progress) -> String {
        let code = if progress.is_complete() { "32" } else { "90" };
        self.paint(code, &format!("({}/{})", progress.solved, progress.total))
    }

    fn check(&self, text: &str, solved: bool) -> String {
        self.paint(if solved { "32" } else { "37" }, text)
    }

    fn difficulty(&self, difficulty: Difficulty) -> String {
        self.paint(
            difficulty_color_code(difficulty),
            &format!("[{}]", difficulty.as_str().to_ascii_uppercase()),
        )
    }

    fn star(&self, text: &str) -> String {
        self.paint("1;33", text)
    }
}

fn difficulty_color_code(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "32",
        Difficulty::Medium => "33",
        Difficulty::Hard => "31",
    }
}

use std::io::{self, Write};

use serde::Serialize;

use crate::analysis::{AnalysisReport, ProgressEvent, ProgressSink};
use crate::archetype::{ArchetypeScore, ArchetypeTable};
use crate::domain::Profile;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Json,
    Summary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassifyResult {
    pub genres: Vec<String>,
    pub archetype: String,
    pub scores: Vec<ArchetypeScore>,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_profile(profile: &Profile) -> io::Result<()> {
        Self::print_json(profile)
    }

    pub fn print_classify(result: &ClassifyResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Forwards pipeline progress to the log.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => tracing::info!("{}", event.message),
        }
    }
}

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

pub fn print_report_summary(report: &AnalysisReport) {
    let profile = &report.profile;
    println!("{CYAN}listening profile ({}){RESET}", report.source);
    println!("{GREEN}archetype: {}{RESET}", profile.archetype);
    println!("top genres:");
    for (rank, genre) in profile.top_genres.iter().enumerate() {
        println!("  {}. {genre}", rank + 1);
    }
    println!("top artists:");
    for (rank, artist) in profile.top_artists.iter().enumerate() {
        println!("  {}. {artist}", rank + 1);
    }
    println!(
        "{CYAN}{} tracks walked, {} artist records{RESET}",
        report.items_walked, report.artists_fetched
    );
    if let Some(reason) = &report.primary_failure {
        println!("{YELLOW}fell back to saved tracks: {reason}{RESET}");
    }
}

pub fn print_classify_summary(result: &ClassifyResult) {
    println!("{GREEN}archetype: {}{RESET}", result.archetype);
    for score in &result.scores {
        println!("  {:<16} {}", score.name, score.score);
    }
}

pub fn print_table(table: &ArchetypeTable) {
    for entry in table.entries() {
        let genres = entry.genres.iter().cloned().collect::<Vec<_>>().join(", ");
        println!("{CYAN}{:<16}{RESET} {genres}", entry.name);
    }
    println!("{YELLOW}{:<16}{RESET} (fallback)", table.fallback());
}

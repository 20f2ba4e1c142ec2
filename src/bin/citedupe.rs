//! Interactive cleaner for duplicate BibTeX entries.
//!
//! Walks the bibliography/document corpus, proposes likely-duplicate groups
//! at the prompt, and rewrites confirmed duplicates' citation keys in place.

use citedupe::dedupe::Deduplicator;
use citedupe::refine::{GroupReviewer, Refiner, ReviewDecision};
use citedupe::{DuplicateGroup, Result, bibtex, tex};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "citedupe",
    version,
    about = "Find duplicate BibTeX entries and unify their citation keys across LaTeX sources",
    long_about = "citedupe compares entry titles across one or more .bib files, proposes
groups of likely duplicates for confirmation, and rewrites every \\cite of a
discarded key to the key you choose to keep. Files not given on the command
line are prompted for interactively."
)]
struct Cli {
    /// Paths to the .bib files, comma-separated.
    #[arg(long, value_delimiter = ',')]
    bib: Vec<PathBuf>,

    /// Paths to the .tex files, comma-separated.
    #[arg(long, value_delimiter = ',')]
    tex: Vec<PathBuf>,
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    println!("Welcome to the BibTeX duplicate cleaner!");

    let bib_files = resolve_paths(
        cli.bib,
        "Enter the paths to the .bib files, separated by commas: ",
    )?;
    let tex_files = resolve_paths(
        cli.tex,
        "Enter the paths to the .tex files, separated by commas: ",
    )?;

    let entries = bibtex::read_bibtex_files(&bib_files)?;
    log::info!("loaded {} entries from {} file(s)", entries.len(), bib_files.len());

    // Entries never cited cannot contribute to a worthwhile unification.
    let mut cited = Vec::new();
    for entry in entries {
        if tex::is_cited(&tex_files, &entry.key)? {
            cited.push(entry);
        }
    }
    log::info!("{} entries are cited at least once", cited.len());

    let groups = Deduplicator::new().find_potential_duplicates(&cited);
    let groups = tex::filter_cited_groups(groups, &tex_files)?;

    let mut reviewer = StdinReviewer;
    let outcome = Refiner::new().resolve(groups, &tex_files, &mut reviewer)?;

    for decision in &outcome.decisions {
        for old in &decision.discard {
            for path in &tex_files {
                let replaced = tex::replace_key_in_file(path, old, &decision.keep)?;
                println!(
                    "All occurrences of '{}' in {} have been replaced with '{}' ({} citation(s)).",
                    old,
                    path.display(),
                    decision.keep,
                    replaced
                );
            }
        }
    }

    if !outcome.stalled.is_empty() {
        println!("\nThe following groups could not be split further and were left untouched:");
        for group in &outcome.stalled {
            println!(
                "  '{}' ({} entries: {})",
                group.title,
                group.members.len(),
                group.keys().collect::<Vec<_>>().join(", ")
            );
        }
    }

    println!("Done cleaning duplicates!");
    Ok(())
}

/// Uses the given paths, or prompts for a comma-separated list when none
/// were passed on the command line.
fn resolve_paths(paths: Vec<PathBuf>, prompt_text: &str) -> Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths);
    }
    let line = prompt(prompt_text)?;
    Ok(line
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect())
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Reviews groups at the terminal, line by line.
struct StdinReviewer;

impl GroupReviewer for StdinReviewer {
    fn review(&mut self, group: &DuplicateGroup) -> Result<ReviewDecision> {
        println!("\nPotential duplicates for '{}':", group.title);
        for (i, entry) in group.members.iter().enumerate() {
            println!(
                "{}: {} (key: {}) (occur: {})",
                i + 1,
                entry.title().unwrap_or("No title"),
                entry.key,
                entry.occurrences
            );
        }

        let confirm = prompt("Treat these as duplicates? (yes/no) ")?;
        if !confirm.eq_ignore_ascii_case("yes") {
            return Ok(ReviewDecision::Rejected);
        }

        // Re-ask until the answer is a number in range.
        loop {
            let answer = prompt("Enter the number of the key to keep: ")?;
            match answer.parse::<usize>() {
                Ok(n) if n >= 1 && n <= group.members.len() => {
                    return Ok(ReviewDecision::Confirmed { keep: n - 1 });
                }
                _ => println!("Invalid number!"),
            }
        }
    }
}

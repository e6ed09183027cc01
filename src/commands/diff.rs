use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use std::path::Path;

use crate::cli::DiffArgs;
use crate::document::Document;
use crate::document_diff::{self, ChangeAction, ChangeType};
use crate::paths;
use crate::ui;

pub fn run(args: DiffArgs) -> Result<()> {
    let actions = compare_files(&args.existing, &args.new)?;

    if args.json {
        let json = serde_json::to_string_pretty(&actions).context("Failed to serialize changes")?;
        println!("{json}");
        return Ok(());
    }

    ui::header("Document Diff");
    if actions.is_empty() {
        println!();
        ui::success("No changes");
        return Ok(());
    }

    println!();
    for action in &actions {
        print_action(action);
    }
    println!();
    ui::dim(&format!("{} changes", actions.len()));
    Ok(())
}

fn compare_files(existing: &Path, new: &Path) -> Result<Vec<ChangeAction>> {
    let existing = Document::load(&paths::expand(&existing.to_string_lossy()))?;
    let new = Document::load(&paths::expand(&new.to_string_lossy()))?;
    Ok(document_diff::diff(&existing, &new))
}

fn print_action(action: &ChangeAction) {
    let symbol = match action.action {
        ChangeType::Create => "+".green(),
        ChangeType::Update => "~".yellow(),
        ChangeType::Remove => "-".red(),
    };
    let facet = action
        .facet
        .map(|f| format!(" ({f})"))
        .unwrap_or_default();
    println!(
        "  {} {}{} {}",
        symbol,
        action.target.bold(),
        facet.dimmed(),
        action.details.dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tests::sample;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, document: &Document) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, serde_json::to_string(document).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_compare_identical_files() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.json", &sample());
        let b = write(&dir, "b.json", &sample());

        assert!(compare_files(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_compare_removed_channel() {
        let dir = TempDir::new().unwrap();
        let mut smaller = sample();
        smaller.channels.remove("orders/cancelled");

        let a = write(&dir, "a.json", &sample());
        let b = write(&dir, "b.json", &smaller);
        let actions = compare_files(&a, &b).unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, ChangeType::Remove);
        assert_eq!(actions[0].target, "orders/cancelled");
    }

    #[test]
    fn test_compare_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.json", &sample());
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();

        let err = compare_files(&a, &broken).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}

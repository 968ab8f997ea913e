// Pipeline status: which artifacts exist, how big they are, and when each
// was last written.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Local};
use colored::Colorize;

use crate::config::Config;
use crate::download::{embedding_files_present, sentiment_files_present};
use crate::pipeline::Stage;
use crate::store::{Artifact, DataDir};

/// Print the state of the data directory and models.
pub fn show(config: &Config) -> Result<()> {
    let data = DataDir::new(&config.data_dir);

    println!("Data directory: {}", config.data_dir.display());
    if !config.data_dir.exists() {
        println!("  not created yet; put the scraper output at raw_data.csv");
        return Ok(());
    }

    for artifact in Artifact::ALL {
        let path = data.path(artifact);
        if data.exists(artifact) {
            println!(
                "  {} {:<18} {:>9}  {}",
                "+".green(),
                artifact.file_name(),
                file_size(&path),
                modified(&path).dimmed()
            );
        } else {
            println!("  {} {:<18}", "-".dimmed(), artifact.file_name().dimmed());
        }
    }

    if data.lock_path().exists() {
        println!(
            "\n  {} a pipeline run holds {}",
            "!".yellow(),
            data.lock_path().display()
        );
    }

    match next_stage(&data) {
        Some(stage) => println!("\nNext stage: {}", stage.name().bold()),
        None if !data.exists(Artifact::Raw) => println!("\nAdd raw_data.csv to start."),
        None => println!("\nAll stages complete."),
    }

    println!("\nModels: {}", config.model_dir.display());
    println!(
        "  embedding: {}",
        present(embedding_files_present(&config.model_dir))
    );
    println!(
        "  sentiment: {}",
        present(sentiment_files_present(&config.model_dir))
    );

    Ok(())
}

/// The first stage whose outputs are missing and whose inputs are present.
pub fn next_stage(data: &DataDir) -> Option<Stage> {
    Stage::ALL.into_iter().find(|stage| {
        stage.requires().iter().all(|a| data.exists(*a))
            && stage.produces().iter().any(|a| !data.exists(*a))
    })
}

fn present(yes: bool) -> colored::ColoredString {
    if yes {
        "downloaded".green()
    } else {
        "not downloaded (builtin fallback)".dimmed()
    }
}

fn modified(path: &Path) -> String {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| {
            DateTime::<Local>::from(t)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_default()
}

fn file_size(path: &Path) -> String {
    let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_stage_follows_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let data = DataDir::new(dir.path());
        assert_eq!(next_stage(&data), None);

        std::fs::write(data.path(Artifact::Raw), "1,hola,ana,t\n").unwrap();
        assert_eq!(next_stage(&data), Some(Stage::Clean));

        std::fs::write(data.path(Artifact::Cleaned), "").unwrap();
        std::fs::write(data.path(Artifact::Mentions), "{}").unwrap();
        assert_eq!(next_stage(&data), Some(Stage::Embed));
    }

    #[test]
    fn test_file_size_units() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        assert_eq!(file_size(&path), "2.0 KB");
    }
}

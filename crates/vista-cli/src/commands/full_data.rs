//! Full data command - create or regenerate the full data layout of a snapshot.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use tracing::info;
use vista::{
    ExamConfig, ExamSession, ExamSnapshot, FullDataOutcome, MemoryStore, RegenerateOutcome,
};

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Snapshot file not found: {}", file.display()).into());
    }

    let snapshot = ExamSnapshot::load(&file)?;
    let exam_id = snapshot
        .exam_id
        .ok_or_else(|| format!("Snapshot has no exam id: {}", file.display()))?;
    let output_path = output.unwrap_or_else(|| file.clone());

    let runtime = tokio::runtime::Runtime::new()?;
    let updated = runtime.block_on(async {
        let store = Arc::new(MemoryStore::from_snapshot(&snapshot));
        let mut session = ExamSession::open(
            ExamConfig::default(),
            exam_id,
            snapshot.instances.clone(),
            store.clone(),
            store.clone(),
        );

        let existing = session.full_data_instance().map(|instance| instance.id);
        match existing {
            Some(id) => match session.regenerate_full_data(id).await? {
                RegenerateOutcome::Updated { cards, added } => println!(
                    "{} full data instance {} ({} cards, {} new)",
                    "Regenerated".green().bold(),
                    id,
                    cards,
                    added
                ),
                RegenerateOutcome::NothingToUpdate => {
                    println!("{}", "Full data layout is already up to date".yellow())
                }
                RegenerateOutcome::NoData => {
                    println!("{}", "No recorded data to show".yellow())
                }
            },
            None => match session.create_full_data().await? {
                FullDataOutcome::Created { instance, cards } => println!(
                    "{} full data instance {} ({} cards)",
                    "Created".green().bold(),
                    instance,
                    cards
                ),
                FullDataOutcome::NoData => {
                    println!("{}", "No recorded data to show".yellow())
                }
            },
        }

        let report = session.save().await?;
        for (temporary, persisted) in &report.remapped {
            println!("  {} -> {}", temporary, persisted);
        }

        vista::Result::Ok(store.snapshot(Some(exam_id)).await)
    })?;

    updated.save(&output_path)?;
    info!(path = %output_path.display(), "Wrote exam snapshot");
    println!(
        "Wrote {} records to {}",
        updated.record_count().to_string().white().bold(),
        output_path.display()
    );

    Ok(())
}

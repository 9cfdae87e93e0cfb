//! Status command - summarize an exam snapshot.

use std::path::PathBuf;

use colored::Colorize;
use vista::{ExamSnapshot, LayoutInstance};

fn kind(instance: &LayoutInstance) -> &'static str {
    if instance.is_full_data() {
        "full data"
    } else {
        "layout"
    }
}

pub fn run(
    file: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Snapshot file not found: {}", file.display()).into());
    }

    let snapshot = ExamSnapshot::load(&file)?;
    let record_count = |instance: &LayoutInstance| {
        snapshot
            .bucket(instance.id)
            .map(|bucket| bucket.len())
            .unwrap_or(0)
    };

    if json_output {
        let instances: Vec<_> = snapshot
            .instances
            .iter()
            .map(|instance| {
                serde_json::json!({
                    "id": instance.id,
                    "kind": kind(instance),
                    "layout_id": instance.layout_id,
                    "active": instance.is_active,
                    "order": instance.order,
                    "cards": instance.layout_data.card_count(),
                    "records": record_count(instance),
                })
            })
            .collect();
        let status = serde_json::json!({
            "file": file.display().to_string(),
            "exam_id": snapshot.exam_id,
            "saved_at": snapshot.saved_at,
            "instances": instances,
            "total_records": snapshot.record_count(),
            "has_full_data": snapshot.instances.iter().any(|i| i.is_full_data()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let exam = snapshot
        .exam_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "unsaved".to_string());
    println!(
        "{} {} ({})",
        "Exam".cyan().bold(),
        exam.white().bold(),
        file.display()
    );
    println!(
        "Saved at: {}",
        snapshot.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    println!("{}", "Layout instances:".yellow().bold());
    for instance in &snapshot.instances {
        let marker = if instance.is_active { "*".green().bold() } else { " ".normal() };
        let label = if instance.is_full_data() {
            kind(instance).magenta()
        } else {
            kind(instance).normal()
        };
        println!(
            "  {} {:>6}  {:10} {:>3} cards {:>3} records",
            marker,
            instance.id.to_string().white(),
            label,
            instance.layout_data.card_count(),
            record_count(instance)
        );

        if verbose {
            for card in instance.layout_data.cards() {
                println!("           {} {}", card.component.slug().dimmed(), card.id);
            }
        }
    }
    println!();

    println!(
        "Total records: {}",
        snapshot.record_count().to_string().white().bold()
    );
    if !snapshot.instances.iter().any(|i| i.is_full_data()) {
        println!(
            "Run {} to build the full data layout.",
            format!("vista full-data {}", file.display()).cyan().bold()
        );
    }

    Ok(())
}

//! Catalog command - list component types and their schemas.

use colored::Colorize;
use vista::ComponentType;

pub fn run(json_output: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json_output {
        let types: Vec<_> = ComponentType::ALL
            .iter()
            .map(|component| {
                serde_json::json!({
                    "type": component.slug(),
                    "label": component.label(),
                    "fields": component.fields(),
                    "repeatable": component.is_repeatable(),
                    "supports_title": component.supports_title(),
                    "compatible_targets": component
                        .compatible_targets()
                        .iter()
                        .map(|t| t.slug())
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Component types:".cyan().bold(),
        ComponentType::ALL.len().to_string().white()
    );
    println!();

    for component in ComponentType::ALL.iter() {
        let mut flags = Vec::new();
        if component.is_repeatable() {
            flags.push("repeatable".magenta().to_string());
        }
        if component.supports_title() {
            flags.push("titled".blue().to_string());
        }

        println!(
            "  {:30} {:32} {:>3} fields {}",
            component.slug().white().bold(),
            component.label(),
            component.fields().len(),
            flags.join(" ")
        );

        if verbose {
            println!("      {}", component.fields().join(", ").dimmed());
            let targets: Vec<&str> = component
                .compatible_targets()
                .iter()
                .map(|t| t.slug())
                .collect();
            if !targets.is_empty() {
                println!("      {} {}", "copies into:".yellow(), targets.join(", "));
            }
        }
    }

    Ok(())
}

//! Mapping command - show the field mapping between two component types.

use colored::Colorize;
use vista::mapping::mapping;
use vista::ComponentType;

pub fn run(
    source: &str,
    target: &str,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_type = ComponentType::from_slug(source)
        .ok_or_else(|| format!("Unknown component type: {}", source))?;
    let target_type = ComponentType::from_slug(target)
        .ok_or_else(|| format!("Unknown component type: {}", target))?;

    let field_mapping = mapping(source_type, target_type);

    if json_output {
        let output = serde_json::json!({
            "source": source_type.slug(),
            "target": target_type.slug(),
            "compatible": !field_mapping.is_empty(),
            "fields": field_mapping,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} {} {}",
        "Mapping".cyan().bold(),
        source_type.slug().white().bold(),
        "->".cyan(),
        target_type.slug().white().bold()
    );
    println!();

    if field_mapping.is_empty() {
        println!(
            "{}",
            format!("{} cannot be copied into {}", source_type.label(), target_type.label())
                .red()
        );
        return Ok(());
    }

    for (from, to) in field_mapping.iter() {
        match to {
            Some(to) if to == from => println!("  {:20} {}", from, to.green()),
            Some(to) => println!("  {:20} {}", from, to.yellow()),
            None => println!("  {:20} {}", from, "dropped".dimmed()),
        }
    }

    println!();
    println!(
        "{} of {} fields transferred",
        field_mapping.transfers().count().to_string().green().bold(),
        source_type.fields().len()
    );

    Ok(())
}

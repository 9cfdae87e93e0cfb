//! Example: Compose an exam from two layouts and build its full data view.
//!
//! Usage:
//!   cargo run --example full_data

use std::sync::Arc;

use vista::layout::{CardKey, LayoutData};
use vista::{
    ComponentType, ExamConfig, ExamId, ExamSession, FullDataOutcome, LayoutId, MemoryStore,
};

const REFRACTION: &str = r#"[
    {"id": "r1", "cards": [
        {"id": "obj", "type": "objective"},
        {"id": "subj", "type": "subjective"},
        {"id": "kera", "type": "keratometer"}
    ]}
]"#;

const CONTACT_LENS: &str = r#"[
    {"id": "r1", "cards": [
        {"id": "kcl", "type": "keratometer-contact-lens"},
        {"id": "plan", "type": "notes", "title": "Plan"}
    ]}
]"#;

#[tokio::main(flavor = "current_thread")]
async fn main() -> vista::Result<()> {
    let store = Arc::new(MemoryStore::new().with_next_instance_id(100));
    let mut session = ExamSession::new(ExamConfig::default(), store.clone(), store.clone());

    let refraction = session
        .attach_layout(Some(LayoutId(1)), LayoutData::from_json(REFRACTION)?)
        .await?;
    let contact_lens = session
        .attach_layout(Some(LayoutId(2)), LayoutData::from_json(CONTACT_LENS)?)
        .await?;

    let objective = CardKey::Singleton(ComponentType::Objective);
    session.edit_field(refraction, objective.clone(), "r_sph", -1.25)?;
    session.edit_field(refraction, objective, "l_sph", -1.0)?;
    session.edit_card_field(contact_lens, "plan", "note", "Trial daily lenses")?;

    let separator = "=".repeat(60);
    println!("{}", separator);

    match session.create_full_data().await? {
        FullDataOutcome::Created { instance, cards } => {
            println!("Full data instance {} with {} cards", instance, cards);
            if let Some(full) = session.instance(instance) {
                for card in full.layout_data.cards() {
                    println!("  {:12} {}", card.id, card.component.label());
                }
            }
        }
        FullDataOutcome::NoData => println!("Nothing recorded yet"),
    }

    session.assign_exam(ExamId(1));
    let report = session.save().await?;

    println!("{}", separator);
    for (temporary, persisted) in &report.remapped {
        println!("  {} -> {}", temporary, persisted);
    }
    println!("Saved {} instances", report.saved.len());

    Ok(())
}

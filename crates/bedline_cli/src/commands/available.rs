//! Available command implementation.

use crate::shelter::Shelter;
use bedline_core::OccupantQuery;
use bedline_model::Sex;

/// Runs the available command.
pub fn run(
    shelter: &Shelter,
    sex: Option<Sex>,
    text: Option<String>,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = OccupantQuery { sex, text };
    let occupants = shelter
        .engine()
        .report()
        .available_occupants(&query, limit)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&occupants)?),
        _ => {
            if occupants.is_empty() {
                println!("Nobody is waiting for a bed");
            }
            for occupant in &occupants {
                println!(
                    "{:<8} {:<4} {:<32} {}",
                    occupant.id.as_u64(),
                    occupant.sex.code(),
                    occupant.display_name(),
                    occupant.document.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

//! Generate command implementation.

use crate::shelter::Shelter;
use bedline_model::RoomId;

/// Runs the generate command.
pub fn run(shelter: &Shelter, room: u32, bunks: u32) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = shelter.engine().generate_capacity(RoomId::new(room), bunks)?;
    shelter.save()?;

    let skipped = outcome.requested - outcome.created;
    println!(
        "Created {} slots in {} ({} already existed)",
        outcome.created, outcome.room_id, skipped
    );
    Ok(())
}

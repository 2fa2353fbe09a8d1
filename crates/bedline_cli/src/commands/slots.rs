//! Slot listing commands.

use crate::shelter::Shelter;
use bedline_core::{BunkSummary, SlotView};
use bedline_model::{AssignmentRecord, OccupantId, RoomId, SlotId, SlotState};

/// Runs the slots command.
pub fn list(shelter: &Shelter, room: u32, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let slots = shelter.engine().report().slots_for_room(RoomId::new(room))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&slots)?),
        _ => {
            if slots.is_empty() {
                println!("No slots; run `generate` first");
            }
            for slot in &slots {
                print_slot_line(slot);
            }
        }
    }
    Ok(())
}

/// Runs the bunks command.
pub fn bunks(shelter: &Shelter, room: u32, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bunks = shelter.engine().report().bunk_summaries(RoomId::new(room))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&bunks)?),
        _ => print_bunks(&bunks),
    }
    Ok(())
}

/// Runs the history command.
pub fn history(shelter: &Shelter, slot: u64, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let records = shelter
        .engine()
        .report()
        .assignment_history(SlotId::new(slot))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&records)?),
        _ => print_history(&records),
    }
    Ok(())
}

/// Runs the locate command.
pub fn locate(shelter: &Shelter, occupant: u64) -> Result<(), Box<dyn std::error::Error>> {
    let occupant = OccupantId::new(occupant);
    match shelter.engine().report().slot_for_occupant(occupant)? {
        Some(slot) => println!("{occupant} holds {} ({})", slot.code, slot.slot_id),
        None => println!("{occupant} holds no bed"),
    }
    Ok(())
}

fn print_slot_line(slot: &SlotView) {
    let holder = match &slot.occupant {
        Some(o) => {
            let document = o.document.as_deref().unwrap_or("-");
            format!("{} [{}] {}", o.name, document, o.id)
        }
        None => String::new(),
    };
    println!(
        "{:<8} {:<16} {:<9} {holder}",
        slot.slot_id.as_u64(),
        slot.code,
        state_label(slot.state)
    );
}

fn print_bunks(bunks: &[BunkSummary]) {
    if bunks.is_empty() {
        println!("No bunks; run `generate` first");
        return;
    }
    for bunk in bunks {
        println!(
            "Bunk {}: {} free, {} occupied",
            bunk.bunk, bunk.free, bunk.occupied
        );
        for slot in &bunk.slots {
            print!("  ");
            print_slot_line(slot);
        }
    }
}

fn print_history(records: &[AssignmentRecord]) {
    if records.is_empty() {
        println!("No assignments");
        return;
    }
    for record in records {
        let ended = record
            .ended_at
            .map_or_else(|| "active".to_string(), |t| t.to_rfc3339());
        println!(
            "{}  {}  {} -> {}  by {} / {}",
            record.id,
            record.occupant_id,
            record.started_at.to_rfc3339(),
            ended,
            record.assigned_by.as_deref().unwrap_or("system"),
            record.released_by.as_deref().unwrap_or("-"),
        );
    }
}

fn state_label(state: SlotState) -> &'static str {
    match state {
        SlotState::Free => "FREE",
        SlotState::Occupied => "OCCUPIED",
    }
}

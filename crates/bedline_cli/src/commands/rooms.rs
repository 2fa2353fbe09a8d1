//! Room registry commands.

use crate::shelter::Shelter;
use bedline_core::RoomSummary;
use bedline_model::{RoomId, RoomSpec, Sex};
use bedline_store::RoomFilter;

/// Runs the create-room command.
pub fn create(
    shelter: &Shelter,
    code: &str,
    sex: Sex,
    floor: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let room = shelter
        .engine()
        .create_room(RoomSpec::new(code, sex, floor))?;
    shelter.save()?;
    println!("Created {} ({}, sex {})", room.id, room.code, room.sex);
    Ok(())
}

/// Runs the set-active command.
pub fn set_active(
    shelter: &Shelter,
    room: u32,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let room = shelter.engine().set_room_active(RoomId::new(room), active)?;
    shelter.save()?;
    let state = if room.active { "active" } else { "inactive" };
    println!("{} ({}) is now {state}", room.id, room.code);
    Ok(())
}

/// Runs the set-sex command.
pub fn set_sex(shelter: &Shelter, room: u32, sex: Sex) -> Result<(), Box<dyn std::error::Error>> {
    let room = shelter.engine().change_room_sex(RoomId::new(room), sex)?;
    shelter.save()?;
    println!("{} ({}) is now restricted to sex {}", room.id, room.code, room.sex);
    Ok(())
}

/// Runs the rooms command.
pub fn list(
    shelter: &Shelter,
    sex: Option<Sex>,
    include_inactive: bool,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = RoomFilter {
        sex,
        include_inactive,
    };
    let rooms = shelter.engine().report().room_summaries(&filter)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&rooms)?);
        }
        _ => {
            print_text_output(&rooms);
        }
    }

    Ok(())
}

fn print_text_output(rooms: &[RoomSummary]) {
    if rooms.is_empty() {
        println!("No rooms");
        return;
    }

    println!(
        "{:<6} {:<12} {:<4} {:>5} {:>6} {:>6} {:>9} {:>5}",
        "ID", "CODE", "SEX", "FLOOR", "BUNKS", "TOTAL", "OCCUPIED", "FREE"
    );
    for room in rooms {
        let floor = room.floor.map_or_else(|| "-".to_string(), |f| f.to_string());
        let marker = if room.active { "" } else { " (inactive)" };
        println!(
            "{:<6} {:<12} {:<4} {:>5} {:>6} {:>6} {:>9} {:>5}{marker}",
            room.room_id.as_u32(),
            room.code,
            room.sex.code(),
            floor,
            room.bunk_capacity,
            room.total,
            room.occupied,
            room.free
        );
    }

    let (total, occupied) = rooms
        .iter()
        .fold((0, 0), |(t, o), r| (t + r.total, o + r.occupied));
    println!();
    println!("Totals: {occupied}/{total} occupied, {} free", total - occupied);
}

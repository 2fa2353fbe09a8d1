//! Assign, release and auto-assign commands.

use crate::shelter::Shelter;
use bedline_model::{OccupantId, Slot, SlotId};

/// Runs the assign command.
pub fn assign(shelter: &Shelter, slot: u64, occupant: u64) -> Result<(), Box<dyn std::error::Error>> {
    let slot = shelter.engine().assign(
        shelter.caller(),
        SlotId::new(slot),
        OccupantId::new(occupant),
    )?;
    shelter.save()?;
    print_assigned(&slot);
    Ok(())
}

/// Runs the release command.
pub fn release(shelter: &Shelter, slot: u64) -> Result<(), Box<dyn std::error::Error>> {
    let slot = shelter
        .engine()
        .release(shelter.caller(), SlotId::new(slot))?;
    shelter.save()?;
    println!("Released {} ({})", slot.code, slot.id);
    Ok(())
}

/// Runs the auto-assign command.
pub fn auto_assign(shelter: &Shelter, occupant: u64) -> Result<(), Box<dyn std::error::Error>> {
    let slot = shelter
        .engine()
        .auto_assign(shelter.caller(), OccupantId::new(occupant))?;
    shelter.save()?;
    print_assigned(&slot);
    Ok(())
}

fn print_assigned(slot: &Slot) {
    if let Some(occupant) = slot.occupant_id() {
        println!("Assigned {occupant} to {} ({})", slot.code, slot.id);
    }
}

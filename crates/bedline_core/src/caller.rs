//! Caller identity for audit stamping.

use std::fmt;

/// Who is asking the engine to change occupancy.
///
/// The engine does not check permissions; the identity is only recorded on
/// assignment records as `assigned_by` / `released_by`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Caller {
    name: Option<String>,
}

impl Caller {
    /// An anonymous system caller. Records carry no actor.
    #[must_use]
    pub const fn system() -> Self {
        Self { name: None }
    }

    /// A named staff member. Blank names are treated as [`Caller::system`].
    pub fn staff(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = name.trim();
        Self {
            name: (!name.is_empty()).then(|| name.to_string()),
        }
    }

    /// The name recorded on assignment records.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_deref().unwrap_or("system"))
    }
}

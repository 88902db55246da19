use serde::{Deserialize, Serialize};

/// Defines the contact state of an integration point
///
/// The state is re-evaluated at every iteration from the current projection and gap;
/// there is no hysteresis, thus a point may toggle between active and inactive.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum ContactStatus {
    /// No valid projection onto the opposing surface has been found
    Unprojected,

    /// Projected onto the opposing surface but without (compressive) traction
    Inactive,

    /// Projected and in compressive contact (normal traction > 0)
    Active,
}

impl ContactStatus {
    /// Returns true if the point has a valid projection
    pub fn projected(&self) -> bool {
        match self {
            ContactStatus::Unprojected => false,
            _ => true,
        }
    }

    /// Returns true if the point carries a compressive traction
    pub fn active(&self) -> bool {
        *self == ContactStatus::Active
    }
}

/// Identifies one of the two surfaces of a contact interface
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Side {
    /// Surface A (tracked in the first pass)
    A,

    /// Surface B (tracked in the second pass, if two-pass is enabled)
    B,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ContactStatus, Side};

    #[test]
    fn derive_works() {
        let status = ContactStatus::Active;
        let clone = status.clone();
        assert_eq!(format!("{:?}", clone), "Active");
        let side = Side::B;
        assert_eq!(format!("{:?}", side), "B");
        let json = serde_json::to_string(&status).unwrap();
        let from_json: ContactStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(from_json, status);
    }

    #[test]
    fn status_queries_work() {
        assert!(!ContactStatus::Unprojected.projected());
        assert!(ContactStatus::Inactive.projected());
        assert!(ContactStatus::Active.projected());
        assert!(!ContactStatus::Inactive.active());
        assert!(ContactStatus::Active.active());
    }
}

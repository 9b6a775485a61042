//! Read-only static configuration shared across all sessions.
//!
//! The rosters here are never mutated at runtime, so they can be shared
//! without locking.

/// One attending physician from the clinic roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Physician {
    pub name: &'static str,
    pub avatar: &'static str,
}

/// The fixed physician roster patients pick from.
pub const PHYSICIANS: &[Physician] = &[
    Physician {
        name: "John Green",
        avatar: "/assets/images/dr-green.png",
    },
    Physician {
        name: "Leila Cameron",
        avatar: "/assets/images/dr-cameron.png",
    },
    Physician {
        name: "David Livingston",
        avatar: "/assets/images/dr-livingston.png",
    },
    Physician {
        name: "Evan Peter",
        avatar: "/assets/images/dr-peter.png",
    },
    Physician {
        name: "Jane Powell",
        avatar: "/assets/images/dr-powell.png",
    },
    Physician {
        name: "Alex Ramirez",
        avatar: "/assets/images/dr-ramirez.png",
    },
    Physician {
        name: "Jasmine Lee",
        avatar: "/assets/images/dr-lee.png",
    },
    Physician {
        name: "Alyana Cruz",
        avatar: "/assets/images/dr-cruz.png",
    },
    Physician {
        name: "Hardik Sharma",
        avatar: "/assets/images/dr-sharma.png",
    },
];

/// Looks up a roster physician by exact name.
pub fn physician_by_name(name: &str) -> Option<&'static Physician> {
    PHYSICIANS.iter().find(|physician| physician.name == name)
}

/// Accepted identification document types for registration.
pub const IDENTIFICATION_TYPES: &[&str] = &[
    "Birth Certificate",
    "Driver's License",
    "Medical Insurance Card/Policy",
    "Military ID Card",
    "National Identity Card",
    "Passport",
    "Resident Alien Card (Green Card)",
    "Social Security Card",
    "State ID Card",
    "Student ID Card",
    "Voter ID Card",
];

/// Gender options offered by the registration radio group.
pub const GENDER_OPTIONS: &[&str] = &["male", "female", "other"];

/// Persistence collection names.
pub const USERS_COLLECTION: &str = "users";
pub const PATIENTS_COLLECTION: &str = "patients";
pub const APPOINTMENTS_COLLECTION: &str = "appointments";

/// Bucket holding uploaded identification documents.
pub const IDENTIFICATION_BUCKET: &str = "identification";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_lookup_is_exact() {
        assert!(physician_by_name("Leila Cameron").is_some());
        assert!(physician_by_name("leila cameron").is_none());
        assert!(physician_by_name("Dr. Leila Cameron").is_none());
    }
}

//! Deterministic customer identity generation: display names, contact
//! emails and street addresses for the synthetic roster.
//!
//! All generation draws from the caller's stream (same seed = same roster).

use crate::{record::Gender, rng::StreamRng, types::CustomerId};

pub struct NameGenerator;

impl NameGenerator {
    /// First + last name. The first-name list follows `gender`;
    /// `Unspecified` draws from both lists.
    pub fn full_name(rng: &mut StreamRng, gender: Gender) -> String {
        let first = Self::first_name(rng, gender);
        let last = rng.pick(LAST_NAMES);
        format!("{first} {last}")
    }

    pub fn first_name(rng: &mut StreamRng, gender: Gender) -> &'static str {
        match gender {
            Gender::Male => *rng.pick(MALE_FIRST_NAMES),
            Gender::Female => *rng.pick(FEMALE_FIRST_NAMES),
            Gender::Unspecified => {
                if rng.chance(0.5) {
                    *rng.pick(MALE_FIRST_NAMES)
                } else {
                    *rng.pick(FEMALE_FIRST_NAMES)
                }
            }
        }
    }

    /// `first.last<id>@example.com`, lowercased, spaces stripped.
    pub fn email(full_name: &str, id: CustomerId) -> String {
        let local: String = full_name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(".")
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
            .collect();
        format!("{local}{id}@example.com")
    }

    pub fn address(rng: &mut StreamRng) -> String {
        let number = rng.int_between(1, 250);
        let street = rng.pick(STREETS);
        let city = rng.pick(CITIES);
        format!("{number} {street}, {city}")
    }
}

const MALE_FIRST_NAMES: &[&str] = &[
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph",
    "Thomas", "Daniel", "Matthew", "Anthony", "Mark", "Paul", "Andrew", "Kevin",
    "Brian", "George", "Edward", "Ryan", "Jacob", "Eric", "Samuel", "Henry",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
    "Mary", "Patricia", "Jennifer", "Linda", "Elizabeth", "Susan", "Jessica", "Sarah",
    "Karen", "Lisa", "Nancy", "Margaret", "Emily", "Michelle", "Laura", "Amy",
    "Anna", "Emma", "Rachel", "Maria", "Olivia", "Grace", "Sophia", "Hannah",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Martinez", "Wilson", "Anderson", "Taylor", "Moore", "Jackson", "Martin", "Lee",
    "Thompson", "White", "Harris", "Clark", "Lewis", "Walker", "Young", "King",
    "Wright", "Hill", "Green", "Adams", "Baker", "Nelson", "Carter", "Mitchell",
];

const STREETS: &[&str] = &[
    "Oak Street", "Maple Avenue", "Cedar Lane", "Elm Road", "Pine Court",
    "Harbor Way", "Station Road", "Mill Lane", "Park Drive", "Church Street",
];

const CITIES: &[&str] = &[
    "Springfield", "Riverton", "Lakeside", "Fairview", "Greenville", "Bristol",
    "Clinton", "Madison", "Franklin", "Georgetown",
];

//! Deterministic bank-accounts dataset
//!
//! Mirrors the shape of the Elasticsearch getting-started `accounts.json`
//! data so the walkthrough queries can run without a live cluster.

use crate::executor::{InMemoryExecutor, StoredDocument};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

/// Index the sample data is stored under
pub const SAMPLE_INDEX: &str = "bank";

const SEED: u64 = 0x5EA2_C4B1;

const FIRST_NAMES: &[&str] = &[
    "Amber", "Hattie", "Nanette", "Dale", "Elinor", "Virginia", "Dillard", "Mcgee", "Aurelia",
    "Fulton", "Burton", "Josie", "Hughes", "Hall", "Deidre", "Bradshaw", "Estelle", "Rodriquez",
    "Opal", "Lydia",
];

const LAST_NAMES: &[&str] = &[
    "Duke", "Bond", "Bates", "Adams", "Ratliff", "Ayala", "Mcpherson", "Mooney", "Harding",
    "Holt", "Meadows", "Hardin", "Moran", "Gomez", "Clay", "Walker", "Fry", "Kirby",
];

const STREETS: &[&str] = &[
    "Holmes", "Bristol", "Madison", "Hutchinson", "Kings", "Mill", "Lane", "Bay", "Fulton",
    "Court", "Harbor", "Ocean",
];

const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Place", "Court", "Lane", "Road"];

const EMPLOYERS: &[&str] = &[
    "Pyrami", "Netagy", "Quility", "Boink", "Scentric", "Filodyne", "Comtext", "Xleen",
    "Zillan", "Comvey",
];

const CITIES: &[&str] = &[
    "Brogan", "Dante", "Nogal", "Orick", "Belvoir", "Veguita", "Yardville", "Ribera", "Lopezo",
    "Jacksonburg", "Hobucken", "Bonanza",
];

const STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Generate `n` accounts with ids and `account_number`s `0..n`, in that order
pub fn accounts(n: usize) -> Vec<StoredDocument> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..n).map(|i| account(&mut rng, i)).collect()
}

fn account(rng: &mut StdRng, number: usize) -> StoredDocument {
    let firstname = pick(rng, FIRST_NAMES);
    let lastname = pick(rng, LAST_NAMES);
    let employer = pick(rng, EMPLOYERS);

    let fields = [
        ("account_number", json!(number)),
        ("balance", json!(rng.gen_range(1_000..50_000))),
        ("firstname", json!(firstname)),
        ("lastname", json!(lastname)),
        ("age", json!(rng.gen_range(20..=40))),
        ("gender", json!(if rng.gen_bool(0.5) { "M" } else { "F" })),
        (
            "address",
            json!(format!(
                "{} {} {}",
                rng.gen_range(1..1000),
                pick(rng, STREETS),
                pick(rng, STREET_SUFFIXES)
            )),
        ),
        ("employer", json!(employer)),
        (
            "email",
            json!(format!(
                "{}{}@{}.com",
                firstname.to_lowercase(),
                lastname.to_lowercase(),
                employer.to_lowercase()
            )),
        ),
        ("city", json!(pick(rng, CITIES))),
        ("state", json!(pick(rng, STATES))),
    ];

    let source: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    StoredDocument::new(number.to_string(), source)
}

/// In-memory executor holding `n` sample accounts under [`SAMPLE_INDEX`]
pub fn executor(n: usize) -> InMemoryExecutor {
    InMemoryExecutor::new().with_index(SAMPLE_INDEX, accounts(n))
}

//! Synthetic row generation: one UUIDv4 and one plausible email per row.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use uuid::Builder;

const FIRST_NAMES: &[&str] = &[
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy",
    "mallory", "niaj", "olivia", "peggy", "rupert", "sybil", "trent", "victor", "walter",
];

const LAST_NAMES: &[&str] = &[
    "smith", "jones", "taylor", "brown", "williams", "wilson", "johnson", "davies", "robinson",
    "wright", "thompson", "evans", "walker", "white", "roberts", "green", "hall", "wood",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

/// A row of the `example_users` table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataRow {
    pub uid: String,
    pub email: String,
}

/// Generates [`DataRow`]s on demand.
pub struct Faker {
    rng: StdRng,
}

impl Faker {
    /// Create new generator with optional seed
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn uuid4(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.gen();
        Builder::from_random_bytes(bytes).into_uuid().to_string()
    }

    pub fn email(&mut self) -> String {
        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("user");
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("name");
        let domain = DOMAINS.choose(&mut self.rng).copied().unwrap_or("example.com");
        let n: u16 = self.rng.gen_range(0..1000);
        match self.rng.gen_range(0..3) {
            0 => format!("{first}.{last}@{domain}"),
            1 => format!("{first}{n}@{domain}"),
            _ => format!("{}{last}{n}@{domain}", &first[..1]),
        }
    }

    pub fn row(&mut self) -> DataRow {
        DataRow {
            uid: self.uuid4(),
            email: self.email(),
        }
    }
}

//! Random identifier and comment generation.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

const ADJECTIVES: &[&str] = &[
    "brisk", "calm", "deft", "eager", "fuzzy", "grand", "humble", "iron", "jolly", "keen",
    "lucid", "mellow", "noble", "quiet", "rustic", "sly", "tidy", "vivid", "wry", "zesty",
];

const NOUNS: &[&str] = &[
    "falcon", "harbor", "kettle", "lantern", "meadow", "nugget", "orchard", "pebble", "quill",
    "raven", "saddle", "thicket", "violet", "walnut", "zephyr", "badger", "cinder", "drum",
];

const VERBS: &[&str] = &[
    "adjusts", "balances", "carries", "drifts", "echoes", "folds", "gathers", "hums", "idles",
    "tunes",
];

const FULL_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const FULL_LENGTH: usize = 10;

/// How much randomness the generated strings carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Randomness {
    /// Readable word-salad strings.
    Pseudo,
    /// Fully random alphanumeric strings.
    Full,
}

/// Generator for random identifiers and comment bodies.
///
/// Stateless apart from the mode; every draw goes through the calling
/// policy's private random stream, keeping determinism in one place.
#[derive(Debug, Clone, Copy)]
pub struct NameFactory {
    mode: Randomness,
}

impl NameFactory {
    pub fn new(mode: Randomness) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Randomness {
        self.mode
    }

    /// A fresh identifier, always starting with a letter.
    pub fn identifier(&self, rng: &mut StdRng) -> String {
        match self.mode {
            Randomness::Pseudo => {
                let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
                let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
                let mut name = String::with_capacity(adjective.len() + noun.len());
                name.push_str(adjective);
                let mut chars = noun.chars();
                if let Some(first) = chars.next() {
                    name.extend(first.to_uppercase());
                    name.push_str(chars.as_str());
                }
                name
            }
            Randomness::Full => {
                let mut name = String::with_capacity(FULL_LENGTH);
                // First character stays alphabetic.
                name.push(FULL_CHARS[rng.gen_range(0..26)] as char);
                for _ in 1..FULL_LENGTH {
                    name.push(FULL_CHARS[rng.gen_range(0..FULL_CHARS.len())] as char);
                }
                name
            }
        }
    }

    /// A fresh comment body.
    pub fn comment(&self, rng: &mut StdRng) -> String {
        match self.mode {
            Randomness::Pseudo => {
                let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
                let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
                let verb = VERBS[rng.gen_range(0..VERBS.len())];
                let object = NOUNS[rng.gen_range(0..NOUNS.len())];
                format!("the {adjective} {noun} {verb} the {object}")
            }
            Randomness::Full => {
                let mut body = String::with_capacity(2 * FULL_LENGTH + 1);
                for index in 0..2 {
                    if index > 0 {
                        body.push(' ');
                    }
                    for _ in 0..FULL_LENGTH {
                        body.push(FULL_CHARS[rng.gen_range(0..FULL_CHARS.len())] as char);
                    }
                }
                body
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn same_seed_same_names() {
        let factory = NameFactory::new(Randomness::Pseudo);
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            assert_eq!(factory.identifier(&mut a), factory.identifier(&mut b));
        }
    }

    #[test]
    fn full_identifiers_start_with_a_letter() {
        let factory = NameFactory::new(Randomness::Full);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let name = factory.identifier(&mut rng);
            assert_eq!(name.len(), FULL_LENGTH);
            assert!(name.chars().next().unwrap().is_ascii_alphabetic());
        }
    }

    #[test]
    fn pseudo_comments_are_word_salad() {
        let factory = NameFactory::new(Randomness::Pseudo);
        let mut rng = StdRng::seed_from_u64(3);
        let comment = factory.comment(&mut rng);
        assert!(comment.starts_with("the "));
        assert!(comment.split_whitespace().count() >= 5);
    }
}

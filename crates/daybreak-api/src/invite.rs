//! Invite-code generation: `adjective_color_animal`, e.g.
//! `brave_red_dinosaur`. Codes are shared out-of-band between partners, so
//! they have to be easy to read aloud and type.

use anyhow::{Result, anyhow};
use rand::Rng;

use daybreak_db::Database;

const ADJECTIVES: [&str; 20] = [
    "brave", "clever", "swift", "mighty", "gentle", "wild", "fierce", "loyal", "playful", "wise",
    "mysterious", "ancient", "radiant", "shadowy", "vibrant", "ethereal", "noble", "savage",
    "serene", "thunderous",
];

const COLORS: [&str; 20] = [
    "red", "blue", "green", "yellow", "purple", "orange", "pink", "brown", "black", "white",
    "grey", "cyan", "magenta", "lime", "teal", "indigo", "violet", "gold", "silver", "bronze",
];

const ANIMALS: [&str; 48] = [
    "dog", "cat", "bird", "fish", "rabbit", "lion", "tiger", "elephant", "giraffe", "zebra",
    "monkey", "bear", "wolf", "fox", "deer", "horse", "cow", "pig", "sheep", "goat", "chicken",
    "duck", "goose", "turkey", "eagle", "hawk", "owl", "parrot", "penguin", "dolphin", "shark",
    "whale", "octopus", "spider", "bee", "butterfly", "ant", "fly", "snake", "lizard", "frog",
    "turtle", "crocodile", "hamster", "dinosaur", "dragon", "unicorn", "phoenix",
];

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    format!(
        "{}_{}_{}",
        ADJECTIVES[rng.random_range(0..ADJECTIVES.len())],
        COLORS[rng.random_range(0..COLORS.len())],
        ANIMALS[rng.random_range(0..ANIMALS.len())],
    )
}

/// Generate a code that is free in the database. The word lists give
/// 19200 combinations, so collisions stay rare; after a run of bad luck we
/// widen the space with a numeric suffix. The UNIQUE column is the final
/// backstop either way.
pub fn generate_unique_code(db: &Database) -> Result<String> {
    for _ in 0..8 {
        let code = generate_code();
        if !db.invite_code_exists(&code)? {
            return Ok(code);
        }
    }

    for _ in 0..8 {
        let code = format!("{}_{}", generate_code(), rand::rng().random_range(1000..10000));
        if !db.invite_code_exists(&code)? {
            return Ok(code);
        }
    }

    Err(anyhow!("could not find a free invite code"))
}

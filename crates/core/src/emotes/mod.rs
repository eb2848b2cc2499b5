mod catalog;
pub mod trends;

pub use catalog::{BuiltinCatalog, CatalogError, EmoteCatalog, HttpCatalog};

/// Last-resort emotes when a channel has nothing usable.
pub const DEFAULT_EMOTES: &[&str] = &["Kappa", "LUL", "PogChamp", "KEKW", "4Head", "BibleThump"];

/// Twitch global emotes, known in every channel.
pub const TWITCH_GLOBALS: &[&str] = &[
    "Kappa", "KappaPride", "LUL", "LULW", "OMEGALUL", "Pog", "PogU", "PogChamp", "Poggers",
    "KEKW", "monkaS", "monkaW", "PepeHands", "Sadge", "FeelsGoodMan", "FeelsBadMan",
    "FeelsWeirdMan", "WeirdChamp", "AYAYA", "Clap", "PauseChamp", "ResidentSleeper",
    "BibleThump", "SourPls", "NotLikeThis", "TriHard", "Jebaited", "WutFace", "4Head",
    "DansGame", "SwiftRage", "FailFish", "VoHiYo", "PJSalt", "CoolCat", "MrDestructoid",
    "gachiHYPER", "peepoClown", "Aware", "Clueless", "GIGACHAD", "Chatting", "Copege",
    "Madge", "BatChest",
];

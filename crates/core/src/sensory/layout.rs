use std::collections::HashSet;

/// QWERTY key to the Cyrillic letter on the same key of a ЙЦУКЕН layout.
const QWERTY_TO_JCUKEN: &[(char, char)] = &[
    ('q', 'й'), ('w', 'ц'), ('e', 'у'), ('r', 'к'), ('t', 'е'), ('y', 'н'), ('u', 'г'),
    ('i', 'ш'), ('o', 'щ'), ('p', 'з'), ('[', 'х'), (']', 'ъ'), ('a', 'ф'), ('s', 'ы'),
    ('d', 'в'), ('f', 'а'), ('g', 'п'), ('h', 'р'), ('j', 'о'), ('k', 'л'), ('l', 'д'),
    (';', 'ж'), ('\'', 'э'), ('z', 'я'), ('x', 'ч'), ('c', 'с'), ('v', 'м'), ('b', 'и'),
    ('n', 'т'), ('m', 'ь'), (',', 'б'), ('.', 'ю'), ('`', 'ё'),
];

/// Share of layout keys above which a word is treated as mistyped.
const LAYOUT_SHARE: f64 = 0.7;

fn lookup(c: char) -> Option<char> {
    QWERTY_TO_JCUKEN.iter().find(|(k, _)| *k == c).map(|(_, v)| *v)
}

/// Rewrite words typed on the wrong keyboard layout. Mentions and known
/// emotes are left alone.
pub fn repair(text: &str, known_emotes: &HashSet<String>) -> String {
    text.split_whitespace()
        .map(|word| {
            if word.starts_with('@') || known_emotes.contains(word) {
                return word.to_owned();
            }
            let lower: Vec<char> = word.to_lowercase().chars().collect();
            let hits = lower.iter().filter(|c| lookup(**c).is_some()).count();
            if lower.len() > 2 && hits as f64 / lower.len() as f64 > LAYOUT_SHARE {
                lower.iter().map(|c| lookup(*c).unwrap_or(*c)).collect()
            } else {
                word.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

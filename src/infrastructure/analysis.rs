//! Text analysis used by the embedded repository for `text` fields.
//!
//! Tokens follow the engine's standard analyzer closely enough for the
//! fields we index: runs of letters and digits, lowercased. An apostrophe
//! or period joins two alphanumeric runs into one token (`don't`, `u.s`,
//! `3.14`), and a comma joins two digit runs (`1,000`). Other punctuation,
//! hyphens included, separates tokens. Full Unicode word-break rules and
//! stop words are not modelled.

/// Lowercased tokens, in order, duplicates kept.
pub fn analyze(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
            continue;
        }
        let prev = i.checked_sub(1).and_then(|p| chars.get(p)).copied();
        let next = chars.get(i + 1).copied();
        if !current.is_empty() && joins(c, prev, next) {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

// Whether `c` sits inside a word rather than between two words.
fn joins(c: char, prev: Option<char>, next: Option<char>) -> bool {
    let (Some(prev), Some(next)) = (prev, next) else {
        return false;
    };
    match c {
        '\'' | '\u{2019}' | '.' => prev.is_alphanumeric() && next.is_alphanumeric(),
        ',' => prev.is_numeric() && next.is_numeric(),
        _ => false,
    }
}

/// Maximum edits the engine's `AUTO` fuzziness allows for a term.
pub fn auto_fuzziness(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

/// Optimal string alignment distance: insertions, deletions, substitutions
/// and swaps of two adjacent characters each cost one edit, as the engine's
/// `fuzzy` query counts them with `transpositions` enabled.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let width = b.len() + 1;
    let mut table = vec![0; (a.len() + 1) * width];

    for i in 0..=a.len() {
        table[i * width] = i;
    }
    for (j, cell) in table.iter_mut().take(width).enumerate() {
        *cell = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (table[(i - 1) * width + j - 1] + cost)
                .min(table[(i - 1) * width + j] + 1)
                .min(table[i * width + j - 1] + 1);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(table[(i - 2) * width + j - 2] + 1);
            }
            table[i * width + j] = best;
        }
    }
    table[a.len() * width + b.len()]
}

pub fn is_fuzzy_match(term: &str, candidate: &str) -> bool {
    edit_distance(term, candidate) <= auto_fuzziness(term)
}

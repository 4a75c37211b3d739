//! Username candidates derived from display names.
//!
//! Candidates are lowercase ASCII letters and digits separated by single
//! hyphens, never longer than [`MAX_USERNAME_LENGTH`]. Uniqueness is not
//! decided here; callers claim candidates against the store and move on to
//! the next one when a claim conflicts.

pub const MAX_USERNAME_LENGTH: usize = 30;
pub const FALLBACK_USERNAME: &str = "member";

/// Path words under `/users/` that must never resolve to a member.
pub const RESERVED_USERNAMES: &[&str] = &["me", "username-suggestion"];

/// Longest suffix `with_suffix` can produce: a hyphen and a full `u32`.
const MAX_SUFFIX_LENGTH: usize = 11;

/// Slug-like base handle for `display_name`.
pub fn base_candidate(display_name: &str) -> String {
    let slugged = slug::slugify(display_name);

    let mut base = String::with_capacity(slugged.len());
    for c in slugged.chars() {
        match c {
            'a'..='z' | '0'..='9' => base.push(c),
            _ if !base.is_empty() && !base.ends_with('-') => base.push('-'),
            _ => {}
        }
    }

    let base = truncate(&base, MAX_USERNAME_LENGTH);
    if base.is_empty() {
        FALLBACK_USERNAME.to_string()
    } else {
        base
    }
}

/// `base` with a numeric suffix, shortened so the result still fits.
pub fn with_suffix(base: &str, suffix: u32) -> String {
    let suffix = format!("-{suffix}");
    let room = MAX_USERNAME_LENGTH.saturating_sub(suffix.len());
    let mut stem = truncate(base, room);
    if stem.is_empty() {
        stem = truncate(FALLBACK_USERNAME, room);
    }
    format!("{stem}{suffix}")
}

/// Prefix shared by every `with_suffix(base, n)`, whatever the size of `n`.
pub fn numbering_stem(base: &str) -> String {
    truncate(base, MAX_USERNAME_LENGTH - MAX_SUFFIX_LENGTH)
}

/// Largest `n` such that `with_suffix(base, n)` is among `taken`.
pub fn highest_suffix<'a>(base: &str, taken: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    taken
        .into_iter()
        .filter_map(|name| {
            let (_, digits) = name.rsplit_once('-')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let n: u32 = digits.parse().ok()?;
            (with_suffix(base, n) == name).then_some(n)
        })
        .max()
}

/// Numbered candidates for `base`, counting up from the first suffix after
/// `highest_taken` (never below 2).
pub fn numbered_candidates(base: &str, highest_taken: Option<u32>) -> impl Iterator<Item = String> {
    let base = base.to_string();
    let first = highest_taken.map_or(2, |n| n.saturating_add(1)).max(2);

    (first..=u32::MAX).map(move |n| with_suffix(&base, n))
}

pub fn is_reserved(candidate: &str) -> bool {
    RESERVED_USERNAMES.contains(&candidate)
}

pub fn is_valid_username(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_USERNAME_LENGTH
        && !candidate.starts_with('-')
        && !candidate.ends_with('-')
        && !candidate.contains("--")
        && !is_reserved(candidate)
        && candidate.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn truncate(value: &str, max: usize) -> String {
    let cut: String = value.chars().take(max).collect();
    cut.trim_end_matches('-').to_string()
}

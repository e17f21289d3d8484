//! Field length limits from spec.md §3, collected in one place so stores and
//! services validate against the same constants.

/// Maximum length of a project name.
pub const PROJECT_NAME_MAX: usize = 128;
/// Maximum length of a project description.
pub const PROJECT_DESCRIPTION_MAX: usize = 400;
/// Maximum length of a node name.
pub const NODE_NAME_MAX: usize = 255;
/// Maximum length of a dictionary term.
pub const DICTIONARY_TERM_MAX: usize = 255;

/// `true` if `s` is within `max` chars (counted as Unicode scalar values,
/// matching the "N chars" phrasing in the data model rather than byte
/// length).
#[must_use]
pub fn within(s: &str, max: usize) -> bool {
    s.chars().count() <= max
}

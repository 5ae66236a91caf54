//! Text normalization for extracted names
//!
//! PDF text extraction leaves reflowed whitespace and stray spaces in front
//! of punctuation. Every candidate passes through [`normalize`] before it is
//! returned, then [`trim_list_markers`] removes bullet debris at the edges.

/// Characters stripped from both ends of a candidate name
pub const LIST_MARKERS: &[char] = &[' ', '\t', '\r', '\n', '-', '•', ':', ';'];

/// Collapse whitespace runs to one space, trim, and close up " ." / " ,"
///
/// Total over any input; the empty string maps to itself.
pub fn normalize(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace(" .", ".").replace(" ,", ",")
}

/// Strip list-marker punctuation and whitespace from both ends
pub fn trim_list_markers(text: &str) -> &str {
    text.trim_matches(LIST_MARKERS)
}

/// Normalize then strip list markers, producing a presentable name
pub fn clean_candidate(text: &str) -> String {
    trim_list_markers(&normalize(text)).to_string()
}

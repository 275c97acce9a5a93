//! Project-name sanitization, lifted from the teacher's index-naming helper
//! and reused here for the store file name written by `init`.

pub fn sanitize_project_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| match c {
            ' ' | '\t' | '\n' | '\r' => '_',
            c if c.is_alphanumeric() || c == '_' || c == '-' => c,
            _ => '_',
        })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[test]
fn sanitizes_spaces_and_punctuation() {
    assert_eq!(sanitize_project_name("My Project!"), "my_project");
}

#[test]
fn collapses_repeated_separators() {
    assert_eq!(sanitize_project_name("a__b  c"), "a_b_c");
}

//! Default prompt templates bundled at compile time.
//!
//! Placeholders are written `{{name}}` and filled by [`render`].

/// Research - market scan and concept
pub const RESEARCH: &str = include_str!("defaults/research.md");

/// Planning - PRD, context, sitemap, schema
pub const PLANNING: &str = include_str!("defaults/planning.md");

/// Coding - source and documents
pub const CODING: &str = include_str!("defaults/coding.md");

/// Audit - structural quality gate
pub const AUDIT: &str = include_str!("defaults/audit.md");

/// All default prompts with their slugs
pub fn all_defaults() -> Vec<(&'static str, &'static str)> {
    vec![
        ("research", RESEARCH),
        ("planning", PLANNING),
        ("coding", CODING),
        ("audit", AUDIT),
    ]
}

/// Substitute `{{key}}` placeholders in a single pass. Substituted text is
/// never scanned again, so values may safely contain placeholder syntax.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };
        match values.iter().find(|(key, _)| *key == &after[..end]) {
            Some((_, value)) => {
                out.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// Shared prompt constants.
// Each module that issues completions defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt sent with every completion.
pub const KEYWORD_ANALYST_SYSTEM: &str = "You are a precise recruiting analyst who knows \
    how Applicant Tracking Systems match resumes against job descriptions. \
    Follow the output format you are given exactly. \
    Do NOT include apologies or commentary about your own limitations.";

/// Shared by the clustering and refinement stages: keywords are regrouped, never removed.
pub const KEEP_EVERY_KEYWORD_INSTRUCTION: &str = "\
    Instead of eliminating a keyword, merge keywords with the same meaning into the same list. \
    If and only if a keyword has a meaning distinct from all the other keywords, \
    it can be alone in its list.";

/// Fills `{name}` placeholders in one left-to-right pass. Inserted values are
/// never rescanned, so a role or a model answer that happens to contain
/// `{description}` stays literal. Braces that do not name a variable are kept.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = vars
            .iter()
            .copied()
            .find(|&(name, _)| tail.starts_with(name) && tail[name.len()..].starts_with('}'));
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

//! Tolerant HTML scanning for the careers site.
//!
//! Case-insensitive tag detection, local scanning inside known blocks, and tag
//! stripping into plain text. Not a general HTML parser.

use std::sync::OnceLock;

use regex::{Captures, Regex};

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern is valid"))
}

fn anchor_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<a\b([^>]*)>(.*?)</a\s*>")
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"(?i)\bclass\s*=\s*["']([^"']*)["']"#)
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#)
}

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?is)<(script|style)\b.*?</(script|style)\s*>")
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?i)<br\s*/?>|</?(p|div|tr|td|th|li|ul|ol|h[1-6]|table)\b[^>]*>")
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"<[^>]*>")
}

fn numeric_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"&#([xX]?)([0-9a-fA-F]+);")
}

/// An anchor found in a page: visible text and raw `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// True if the attribute string carries `class` among its class names.
pub fn has_class(attrs: &str, class: &str) -> bool {
    class_re()
        .captures(attrs)
        .map(|c| c[1].split_whitespace().any(|name| name == class))
        .unwrap_or(false)
}

/// Inner HTML of the first `<tag class="...">` element carrying `class`,
/// matching nested elements of the same tag.
pub fn find_block<'a>(html: &'a str, tag: &str, class: &str) -> Option<&'a str> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag.to_ascii_lowercase());
    let close = format!("</{}>", tag.to_ascii_lowercase());

    let mut from = 0;
    while let Some(start) = find_open_tag(&lower, &open, from) {
        let tag_end = start + lower[start..].find('>')?;
        if !has_class(&html[start..tag_end], class) {
            from = tag_end + 1;
            continue;
        }

        let content_start = tag_end + 1;
        let mut depth = 1usize;
        let mut pos = content_start;
        loop {
            let next_close = pos + lower[pos..].find(&close)?;
            match find_open_tag(&lower, &open, pos) {
                Some(next_open) if next_open < next_close => {
                    depth += 1;
                    pos = next_open + open.len();
                }
                _ => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&html[content_start..next_close]);
                    }
                    pos = next_close + close.len();
                }
            }
        }
    }
    None
}

/// `<tag` followed by whitespace, `>` or `/`, so `<td` never matches `<tdata`.
fn find_open_tag(lower: &str, open: &str, from: usize) -> Option<usize> {
    let mut from = from;
    while let Some(rel) = lower[from..].find(open) {
        let start = from + rel;
        let boundary = lower[start + open.len()..].chars().next();
        if matches!(boundary, Some(c) if c.is_whitespace() || c == '>' || c == '/') {
            return Some(start);
        }
        from = start + open.len();
    }
    None
}

/// Anchors whose class list contains `class`, in document order.
pub fn links_with_class(html: &str, class: &str) -> Vec<Link> {
    anchor_re()
        .captures_iter(html)
        .filter(|c| has_class(&c[1], class))
        .filter_map(|c| {
            let href = href_re().captures(&c[1])?[1].to_string();
            let text = to_text(&c[2]);
            (!text.is_empty()).then_some(Link { text, href })
        })
        .collect()
}

/// Strips markup into plain text: one trimmed line per block, entities decoded.
pub fn to_text(html: &str) -> String {
    let without_scripts = script_re().replace_all(html, "");
    let with_breaks = line_break_re().replace_all(&without_scripts, "\n");
    let bare = tag_re().replace_all(&with_breaks, "");
    let decoded = decode_entities(&bare);

    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_entities(text: &str) -> String {
    let numeric = numeric_entity_re().replace_all(text, |c: &Captures| {
        let radix = if c[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&c[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| c[0].to_string())
    });

    numeric
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_PAGE: &str = r#"
        <html><body>
        <a class="list-link" href="/nav.html">Menu</a>
        <TABLE><TR>
          <TD class="box_table wide">
            <table><tr><td>
              <a href="/careers/actors/summary.html?id=27-2011.00" class="list-link">Actors</a>
            </td></tr></table>
            <a class='list-link other' href='/careers/bakers/summary.html'>Bakers &amp; Pastry Chefs</a>
            <a class="footer" href="/about.html">About</a>
          </TD>
        </TR></TABLE>
        </body></html>
    "#;

    #[test]
    fn test_find_block_handles_nesting_and_case() {
        let block = find_block(INDEX_PAGE, "td", "box_table").unwrap();
        assert!(block.contains("Actors"));
        assert!(block.contains("Bakers"));
        assert!(!block.contains("Menu"));
        assert!(block.trim_end().ends_with("About</a>"));
    }

    #[test]
    fn test_find_block_missing_class() {
        assert!(find_block(INDEX_PAGE, "td", "sidebar").is_none());
    }

    #[test]
    fn test_links_with_class_in_block() {
        let block = find_block(INDEX_PAGE, "td", "box_table").unwrap();
        let links = links_with_class(block, "list-link");
        assert_eq!(
            links,
            vec![
                Link {
                    text: "Actors".to_string(),
                    href: "/careers/actors/summary.html?id=27-2011.00".to_string(),
                },
                Link {
                    text: "Bakers & Pastry Chefs".to_string(),
                    href: "/careers/bakers/summary.html".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_find_open_tag_respects_boundary() {
        let lower = "<tdata><td>";
        assert_eq!(find_open_tag(lower, "<td", 0), Some(7));
    }

    #[test]
    fn test_to_text_strips_markup() {
        let html = "<script>var x = 1;</script><p>Plan &amp; <b>build</b></p><br/>Use &#39;SQL&#39;&nbsp;daily<ul><li>One</li><li>Two</li></ul>";
        assert_eq!(to_text(html), "Plan & build\nUse 'SQL' daily\nOne\nTwo");
    }
}

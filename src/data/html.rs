//! Low-level HTML helpers for the search and detail pages.
//!
//! These are deliberately naive but tailored to the Goodreads markup: we slice
//! the result table, walk `<tr>` blocks, and pick elements by class. Tag and
//! attribute names are matched case-insensitively.

use std::sync::LazyLock;

use regex::Regex;

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>").expect("valid open-tag regex"));
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>").expect("valid script regex")
});
static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("valid entity regex"));

/// An element matched by tag + class: its raw attribute text and inner HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    pub attrs: &'a str,
    pub inner: &'a str,
}

impl Element<'_> {
    pub fn attr(&self, name: &str) -> Option<String> {
        attr_value(self.attrs, name)
    }

    pub fn text(&self) -> String {
        strip_tags(self.inner)
    }
}

/// Return the HTML *inside* the first element opened by `open_pat` and closed by `close_pat`.
///
/// Example: `slice_between_ci(html, "<table class=\"tableList", "</table>")`.
pub fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = s.to_ascii_lowercase();
    let open_idx = lc.find(&open_pat.to_ascii_lowercase())?;
    let after_open = s[open_idx..].find('>')? + open_idx + 1;
    let close_rel = lc[after_open..].find(&close_pat.to_ascii_lowercase())?;
    Some(&s[after_open..after_open + close_rel])
}

/// Every `<tag ...> ... </tag>` block in `s`, in document order (non-nested).
pub fn tag_blocks_ci<'a>(s: &'a str, tag: &str) -> Vec<&'a str> {
    let lc = s.to_ascii_lowercase();
    let open = format!("<{}", tag.to_ascii_lowercase());
    let close = format!("</{}>", tag.to_ascii_lowercase());

    let mut out = Vec::new();
    let mut from = 0;
    while let Some(rel) = lc[from..].find(&open) {
        let start = from + rel;
        // `<tr` must not match `<track`.
        let next = lc.as_bytes().get(start + open.len()).copied();
        if next.is_some_and(|b| b.is_ascii_alphanumeric()) {
            from = start + open.len();
            continue;
        }
        let Some(end_rel) = lc[start..].find(&close) else {
            break;
        };
        let end = start + end_rel + close.len();
        out.push(&s[start..end]);
        from = end;
    }
    out
}

/// First `<tag>` in `block` whose `class` attribute contains `class` as a token.
///
/// The inner HTML runs to the first matching close tag, so this is only
/// suitable for elements that do not nest themselves (e.g. `<a>`).
pub fn find_by_class<'a>(block: &'a str, tag: &str, class: &str) -> Option<Element<'a>> {
    let start = find_open_tag(block, tag, class)?;
    let (attrs, inner_start) = start;
    let close = format!("</{}", tag.to_ascii_lowercase());
    let rest = &block[inner_start..];
    let end = rest.to_ascii_lowercase().find(&close).unwrap_or(rest.len());
    Some(Element {
        attrs,
        inner: &rest[..end],
    })
}

/// Plain text from the opening tag of the first `tag.class` to the end of `block`.
///
/// Used where the element nests children of its own kind (rating spans).
pub fn text_from_class(block: &str, tag: &str, class: &str) -> Option<String> {
    let (_, inner_start) = find_open_tag(block, tag, class)?;
    Some(strip_tags(&block[inner_start..]))
}

fn find_open_tag<'a>(block: &'a str, tag: &str, class: &str) -> Option<(&'a str, usize)> {
    OPEN_TAG_RE.captures_iter(block).find_map(|caps| {
        let name = caps.get(1)?;
        let attrs = caps.get(2)?;
        if !name.as_str().eq_ignore_ascii_case(tag) {
            return None;
        }
        let classes = attr_value(attrs.as_str(), "class")?;
        if !classes.split_whitespace().any(|c| c == class) {
            return None;
        }
        let whole = caps.get(0)?;
        Some((attrs.as_str(), whole.end()))
    })
}

/// Read an attribute value (double-, single-, or un-quoted), entity-decoded.
pub fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!(
        r#"(?i)(?:^|\s){}\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(attrs)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    Some(decode_entities(raw.as_str()))
}

/// Drop scripts/styles and tags, decode entities, and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, " ");
    let without_tags = ANY_TAG_RE.replace_all(&without_scripts, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of named entities the pages use, plus numeric ones.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let numeric = NUMERIC_ENTITY_RE.replace_all(s, |caps: &regex::Captures<'_>| {
        let body = &caps[1];
        let code = match body.strip_prefix('x').or_else(|| body.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => body.parse::<u32>().ok(),
        };
        code.and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_default()
    });
    numeric
        .replace("&nbsp;", " ")
        .replace("&mdash;", "—")
        .replace("&ndash;", "–")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"<tr itemscope>
        <td><a class="bookTitle" itemprop="url" href="/book/show/1.Dune?from_search=true&amp;rank=1">
            <span itemprop='name'>Dune &amp; Sand</span></a></td>
        <td><a class='authorName' href="/author/1"><span itemprop="name">Frank Herbert</span></a></td>
    </tr><tr><td>second</td></tr>"#;

    #[test]
    fn finds_elements_by_class_token() {
        let title = find_by_class(ROW, "a", "bookTitle").unwrap();
        assert_eq!(title.text(), "Dune & Sand");
        assert_eq!(
            title.attr("href").as_deref(),
            Some("/book/show/1.Dune?from_search=true&rank=1")
        );

        let author = find_by_class(ROW, "a", "authorName").unwrap();
        assert_eq!(author.text(), "Frank Herbert");

        assert!(find_by_class(ROW, "a", "book").is_none());
    }

    #[test]
    fn splits_rows_without_matching_longer_tags() {
        let html = "<track></track><tr><td>a</td></tr><TR class=x><td>b</td></TR>";
        let rows = tag_blocks_ci(html, "tr");
        assert_eq!(rows.len(), 2);
        assert_eq!(strip_tags(rows[1]), "b");
        assert_eq!(tag_blocks_ci(ROW, "tr").len(), 2);
    }

    #[test]
    fn slices_the_result_table() {
        let html = r#"<div><table class="tableList"><tr><td>x</td></tr></table></div>"#;
        assert_eq!(
            slice_between_ci(html, r#"<table class="tableList"#, "</table>"),
            Some("<tr><td>x</td></tr>")
        );
    }

    #[test]
    fn strips_scripts_and_decodes_entities() {
        let html = "<p>4.12 avg rating &mdash; 5,241&nbsp;ratings<script>var x = '<b>';</script>&#39;ok&#x21;</p>";
        assert_eq!(strip_tags(html), "4.12 avg rating — 5,241 ratings 'ok!");
    }
}

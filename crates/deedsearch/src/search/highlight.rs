//! Span-based highlighting of search terms in result text.

use regex::RegexBuilder;

/// A slice of highlighted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Text split into alternating plain and matched spans.
///
/// Matches of all terms are merged before splitting, so overlapping or
/// repeated terms never produce nested marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted<'a> {
    spans: Vec<Span<'a>>,
}

impl<'a> Highlighted<'a> {
    pub fn spans(&self) -> &[Span<'a>] {
        &self.spans
    }

    pub fn matched(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.spans.iter().filter(|s| s.matched).map(|s| s.text)
    }

    pub fn has_matches(&self) -> bool {
        self.spans.iter().any(|s| s.matched)
    }

    /// Renders escaped HTML with matches wrapped in `<mark>`.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        for span in &self.spans {
            if span.matched {
                html.push_str("<mark>");
                push_escaped(&mut html, span.text);
                html.push_str("</mark>");
            } else {
                push_escaped(&mut html, span.text);
            }
        }
        html
    }
}

impl std::fmt::Display for Highlighted<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for span in &self.spans {
            f.write_str(span.text)?;
        }
        Ok(())
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}

/// Splits `text` into spans, marking case-insensitive occurrences of any term.
/// Blank terms are ignored; terms are matched literally.
pub fn highlight<'a, S: AsRef<str>>(text: &'a str, terms: &[S]) -> Highlighted<'a> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();

    for term in terms {
        let term = term.as_ref().trim();
        if term.is_empty() {
            continue;
        }
        let Ok(re) = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        ranges.extend(re.find_iter(text).map(|m| (m.start(), m.end())));
    }

    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    let mut spans = Vec::with_capacity(merged.len() * 2 + 1);
    let mut cursor = 0;
    for (start, end) in merged {
        if start > cursor {
            spans.push(Span {
                text: &text[cursor..start],
                matched: false,
            });
        }
        spans.push(Span {
            text: &text[start..end],
            matched: true,
        });
        cursor = end;
    }
    if cursor < text.len() {
        spans.push(Span {
            text: &text[cursor..],
            matched: false,
        });
    }

    Highlighted { spans }
}

//! Lexical highlighting for source text.
//!
//! Classifies substrings of arbitrary text into a small closed set of
//! [`TokenCategory`] values. Classification is pattern based: a single
//! combined regex built from a priority-ordered rule table is scanned over
//! the full text, and the gaps between matches are emitted as unclassified
//! spans so the result always tiles the whole input.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Reserved words highlighted as [`TokenCategory::Keyword`].
pub const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte",
    "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else",
    "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import",
    "instanceof", "int", "interface", "long", "native",
    "new", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super",
    "switch", "synchronized", "this", "throw", "throws",
    "transient", "try", "void", "volatile", "while",
];

/// Category patterns in priority order. The keyword rule is generated
/// from [`KEYWORDS`] and always comes first.
const RULES: &[(TokenCategory, &str)] = &[
    (TokenCategory::Paren, r"\(|\)"),
    (TokenCategory::Brace, r"\{|\}"),
    (TokenCategory::Bracket, r"\[|\]"),
    (TokenCategory::Semicolon, r";"),
    (TokenCategory::String, r#""(?:[^"\\]|\\.)*""#),
    (TokenCategory::Comment, r"//[^\n]*|(?s:/\*.*?\*/)"),
];

/// Lexical category of a highlighted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Keyword,
    Paren,
    Brace,
    Bracket,
    Semicolon,
    String,
    Comment,
}

impl TokenCategory {
    /// All categories, in match priority order.
    pub const ALL: [Self; 7] = [
        Self::Keyword,
        Self::Paren,
        Self::Brace,
        Self::Bracket,
        Self::Semicolon,
        Self::String,
        Self::Comment,
    ];

    /// Style class name used by the host surface.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Paren => "paren",
            Self::Brace => "brace",
            Self::Bracket => "bracket",
            Self::Semicolon => "semicolon",
            Self::String => "string",
            Self::Comment => "comment",
        }
    }
}

impl std::fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified region of text, in UTF-8 byte offsets.
///
/// `category` is `None` for plain text between recognized tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleSpan {
    pub start: usize,
    pub len: usize,
    pub category: Option<TokenCategory>,
}

impl StyleSpan {
    pub const fn new(start: usize, len: usize, category: Option<TokenCategory>) -> Self {
        Self {
            start,
            len,
            category,
        }
    }

    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    pub const fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Ordered, gap-free, non-overlapping spans covering a whole text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleSpans(Vec<StyleSpan>);

impl StyleSpans {
    pub fn iter(&self) -> std::slice::Iter<'_, StyleSpan> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all span lengths; equals the length of the highlighted text.
    pub fn total_len(&self) -> usize {
        self.0.iter().map(|span| span.len).sum()
    }

    /// Spans with a non-zero length.
    pub fn visible(&self) -> impl Iterator<Item = &StyleSpan> {
        self.0.iter().filter(|span| !span.is_empty())
    }

    /// Spans that carry a category.
    pub fn categorized(&self) -> impl Iterator<Item = &StyleSpan> {
        self.0.iter().filter(|span| span.category.is_some())
    }

    pub fn as_slice(&self) -> &[StyleSpan] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a StyleSpans {
    type Item = &'a StyleSpan;
    type IntoIter = std::slice::Iter<'a, StyleSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds spans left to right, filling the gaps with unclassified spans.
struct SpansBuilder {
    spans: Vec<StyleSpan>,
    cursor: usize,
}

impl SpansBuilder {
    const fn new() -> Self {
        Self {
            spans: Vec::new(),
            cursor: 0,
        }
    }

    fn push_token(&mut self, range: Range<usize>, category: TokenCategory) {
        self.spans
            .push(StyleSpan::new(self.cursor, range.start - self.cursor, None));
        self.spans
            .push(StyleSpan::new(range.start, range.len(), Some(category)));
        self.cursor = range.end;
    }

    fn finish(mut self, text_len: usize) -> StyleSpans {
        self.spans
            .push(StyleSpan::new(self.cursor, text_len - self.cursor, None));
        StyleSpans(self.spans)
    }
}

fn named_group(category: TokenCategory, rule: &str) -> String {
    format!("(?P<{}>{rule})", category.as_str())
}

/// Compiled rule table.
#[derive(Debug, Clone)]
pub struct Highlighter {
    pattern: Regex,
}

impl Highlighter {
    /// Compile the combined pattern from [`KEYWORDS`] and the rule table.
    ///
    /// # Errors
    /// Returns an error if the combined pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        let keyword_rule = format!(r"\b(?:{})\b", KEYWORDS.join("|"));
        let mut alternatives = vec![named_group(TokenCategory::Keyword, &keyword_rule)];
        alternatives.extend(RULES.iter().map(|(category, rule)| named_group(*category, rule)));
        let pattern = Regex::new(&alternatives.join("|"))?;
        Ok(Self { pattern })
    }

    /// The process-wide rule table, compiled on first use.
    pub fn shared() -> &'static Self {
        static HIGHLIGHTER: OnceLock<Highlighter> = OnceLock::new();
        HIGHLIGHTER.get_or_init(|| Self::new().expect("built-in highlight rules compile"))
    }

    /// Classify `text` into spans that tile it exactly.
    pub fn compute_spans(&self, text: &str) -> StyleSpans {
        let mut builder = SpansBuilder::new();
        for caps in self.pattern.captures_iter(text) {
            let Some((category, m)) = TokenCategory::ALL
                .iter()
                .find_map(|category| caps.name(category.as_str()).map(|m| (*category, m)))
            else {
                continue;
            };
            builder.push_token(m.range(), category);
        }
        builder.finish(text.len())
    }
}

/// Classify `text` with the shared rule table.
pub fn compute_spans(text: &str) -> StyleSpans {
    Highlighter::shared().compute_spans(text)
}

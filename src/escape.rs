use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

/// Characters Telegram MarkdownV2 treats as markup outside of code entities.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Formatting dialect of the chat transport. The two are mutually exclusive;
/// one is picked per run and applied to every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeDialect {
    #[default]
    MarkdownV2,
    Html,
}

impl EscapeDialect {
    /// Value of Telegram's `parse_mode` field.
    pub fn parse_mode(&self) -> &'static str {
        match self {
            EscapeDialect::MarkdownV2 => "MarkdownV2",
            EscapeDialect::Html => "HTML",
        }
    }

    /// Escape free text (titles, labels, error messages).
    pub fn escape_text(&self, text: &str) -> String {
        match self {
            EscapeDialect::MarkdownV2 => backslash_escape(text, MARKDOWN_V2_SPECIAL),
            EscapeDialect::Html => html_escape(text),
        }
    }

    /// Escape text placed inside a pre-formatted block.
    pub fn escape_code(&self, text: &str) -> String {
        match self {
            EscapeDialect::MarkdownV2 => backslash_escape(text, &['`', '\\']),
            EscapeDialect::Html => html_escape(text),
        }
    }

    pub fn bold(&self, escaped: &str) -> String {
        match self {
            EscapeDialect::MarkdownV2 => format!("*{}*", escaped),
            EscapeDialect::Html => format!("<b>{}</b>", escaped),
        }
    }

    pub fn pre(&self, escaped: &str) -> String {
        match self {
            EscapeDialect::MarkdownV2 => format!("```\n{}\n```", escaped),
            EscapeDialect::Html => format!("<pre>{}</pre>", escaped),
        }
    }
}

impl FromStr for EscapeDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown_v2" | "markdownv2" | "markdown" => Ok(EscapeDialect::MarkdownV2),
            "html" => Ok(EscapeDialect::Html),
            other => Err(anyhow!("unknown escape dialect '{}'", other)),
        }
    }
}

impl fmt::Display for EscapeDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.parse_mode())
    }
}

fn backslash_escape(text: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

use std::fmt::Write;

const HEADING_EMOJI: [&str; 7] = ["⚠️", "✅", "🌟", "💡", "⚡", "💪", "🎉"];
const BULLET: char = '•';
const NESTED_BULLET: &str = "   •";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Text(String),
    Bold(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Spacer,
    Heading(Vec<Span>),
    Bullet(Vec<Span>),
    NestedBullet(Vec<Span>),
    Rule,
    Paragraph(Vec<Span>),
}

pub fn parse(text: &str) -> Vec<Block> {
    text.replace("\\n", "\n")
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .map(parse_line)
        .collect()
}

fn parse_line(raw: &str) -> Block {
    if let Some(rest) = raw.strip_prefix(NESTED_BULLET) {
        return Block::NestedBullet(spans(rest.trim()));
    }

    let line = raw.trim();
    if line.is_empty() {
        return Block::Spacer;
    }
    if HEADING_EMOJI.iter().any(|emoji| line.starts_with(emoji)) {
        return Block::Heading(spans(line));
    }
    if let Some(rest) = line.strip_prefix(BULLET) {
        return Block::Bullet(spans(rest.trim()));
    }
    if line == "---" {
        return Block::Rule;
    }
    Block::Paragraph(spans(line))
}

/// Splits `**bold**` runs out of a line. An unclosed `**` stays literal.
fn spans(line: &str) -> Vec<Span> {
    let mut out = Vec::new();
    let mut rest = line;

    while let Some(open) = rest.find("**") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("**") else {
            break;
        };
        if open > 0 {
            out.push(Span::Text(rest[..open].to_string()));
        }
        out.push(Span::Bold(after[..close].to_string()));
        rest = &after[close + 2..];
    }

    if !rest.is_empty() {
        out.push(Span::Text(rest.to_string()));
    }
    out
}

pub fn to_html(blocks: &[Block]) -> String {
    let mut html = String::new();
    for block in blocks {
        let _ = match block {
            Block::Spacer => write!(html, "<div class=\"spacer\"></div>"),
            Block::Heading(spans) => write!(html, "<h6>{}</h6>", spans_html(spans)),
            Block::Bullet(spans) => {
                write!(html, "<div class=\"bullet\">• {}</div>", spans_html(spans))
            }
            Block::NestedBullet(spans) => write!(
                html,
                "<div class=\"bullet nested\">→ {}</div>",
                spans_html(spans)
            ),
            Block::Rule => write!(html, "<hr>"),
            Block::Paragraph(spans) => write!(html, "<p>{}</p>", spans_html(spans)),
        };
    }
    html
}

fn spans_html(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => escape_html(text),
            Span::Bold(text) => format!("<strong>{}</strong>", escape_html(text)),
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn to_plain(blocks: &[Block]) -> String {
    let mut text = String::new();
    for block in blocks {
        let _ = match block {
            Block::Spacer => writeln!(text),
            Block::Heading(spans) => writeln!(text, "{}", spans_plain(spans).to_uppercase()),
            Block::Bullet(spans) => writeln!(text, "  • {}", spans_plain(spans)),
            Block::NestedBullet(spans) => writeln!(text, "      → {}", spans_plain(spans)),
            Block::Rule => writeln!(text, "{}", "─".repeat(40)),
            Block::Paragraph(spans) => writeln!(text, "{}", spans_plain(spans)),
        };
    }
    text
}

fn spans_plain(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => text.clone(),
            Span::Bold(text) => format!("*{text}*"),
        })
        .collect()
}

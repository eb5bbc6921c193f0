use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*(.*?)\*\*").expect("Invalid BOLD regex pattern");
    static ref ITALIC: Regex = Regex::new(r"\*(.*?)\*").expect("Invalid ITALIC regex pattern");
    static ref CODE: Regex = Regex::new(r"`(.*?)`").expect("Invalid CODE regex pattern");
}

/// One structural unit of the line scan. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(u8, String),
    Blockquote(String),
    ListItem(String),
    Paragraph(String),
    CodeBlock(Vec<String>),
    Blank,
}

/// Render a note to an HTML fragment.
///
/// Pure and total: any input produces well-formed output, because every piece
/// of user content is escaped before structural tags are added.
pub fn to_html(src: &str) -> String {
    let mut html = String::new();
    for block in scan_blocks(src) {
        match block {
            Block::Heading(level, text) => {
                html.push_str(&format!(
                    "<h{level}>{content}</h{level}>",
                    level = level,
                    content = inline(&text)
                ));
            }
            Block::Blockquote(text) => {
                html.push_str(&format!("<blockquote>{}</blockquote>", inline(&text)));
            }
            Block::ListItem(text) => {
                // Each item gets its own container on purpose; consecutive
                // items are not merged.
                html.push_str(&format!("<ul><li>{}</li></ul>", inline(&text)));
            }
            Block::Paragraph(text) => {
                html.push_str(&format!("<p>{}</p>", inline(&text)));
            }
            Block::CodeBlock(lines) => {
                html.push_str(&format!(
                    "<pre><code>{}</code></pre>",
                    escape_html(&lines.join("\n"))
                ));
            }
            Block::Blank => html.push_str("<br>"),
        }
    }
    html
}

/// Split a note into blocks, one pass, line by line.
///
/// A line whose trimmed form starts with three backticks toggles the fenced
/// state; the fence lines themselves are dropped. Lines accumulated by a
/// fence that is never closed are dropped as well.
pub fn scan_blocks(src: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut in_code_block = false;
    let mut code_lines: Vec<String> = Vec::new();

    for line in src.split('\n') {
        if line.trim().starts_with("```") {
            if in_code_block {
                blocks.push(Block::CodeBlock(std::mem::take(&mut code_lines)));
                in_code_block = false;
            } else {
                in_code_block = true;
            }
            continue;
        }

        if in_code_block {
            code_lines.push(line.to_string());
            continue;
        }

        if let Some(rest) = line.strip_prefix("### ") {
            blocks.push(Block::Heading(3, rest.to_string()));
        } else if let Some(rest) = line.strip_prefix("## ") {
            blocks.push(Block::Heading(2, rest.to_string()));
        } else if let Some(rest) = line.strip_prefix("# ") {
            blocks.push(Block::Heading(1, rest.to_string()));
        } else if let Some(rest) = line.strip_prefix("> ") {
            blocks.push(Block::Blockquote(rest.to_string()));
        } else if line.trim().starts_with("- ") || line.trim().starts_with("* ") {
            blocks.push(Block::ListItem(line.trim()[2..].to_string()));
        } else if !line.trim().is_empty() {
            blocks.push(Block::Paragraph(line.to_string()));
        } else {
            blocks.push(Block::Blank);
        }
    }

    blocks
}

/// Escape first so literal markup is neutralized, then substitute the spans.
/// Order matters: bold before italic so `**` is not consumed as two `*`.
fn inline(text: &str) -> String {
    let escaped = escape_html(text);
    let bold = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>$1</em>");
    CODE.replace_all(&italic, "<code>$1</code>").into_owned()
}

pub fn escape_html(text: &str) -> String {
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

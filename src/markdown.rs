//! Minimal Markdown to HTML conversion for generated posts.
//!
//! Only ATX headings and fenced code blocks are handled. Emphasis, links,
//! lists and nested structures pass through untouched, and nothing is
//! escaped. This is not a general Markdown parser.

const FENCE: &str = "```";

/// A recognised line, in rule order.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    /// ```` ```sql ````
    SqlFence,
    /// ```` ``` ```` optionally followed by an info string other than `sql`.
    Fence,
    Heading { level: usize, text: &'a str },
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let fence = line.trim_end();
    if fence == "```sql" {
        return Line::SqlFence;
    }
    if fence.starts_with(FENCE) {
        return Line::Fence;
    }
    for level in (1..=6).rev() {
        if let Some(text) = heading_text(line, level) {
            return Line::Heading { level, text };
        }
    }
    Line::Text(line)
}

/// ```` ``` ```` alone on a line, trailing whitespace allowed.
fn is_closing_fence(line: &str) -> bool {
    line.trim_end() == FENCE
}

/// Text after exactly `level` hashes and at least one space or tab.
fn heading_text(line: &str, level: usize) -> Option<&str> {
    let rest = line.strip_prefix(&"#".repeat(level))?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

/// Converts headings and fenced code blocks to HTML.
///
/// ```
/// use orapost::markdown::to_html;
///
/// assert_eq!(to_html("# Title"), "<h1>Title</h1>");
/// assert_eq!(
///     to_html("```sql\nSELECT 1;\n```"),
///     "<pre><code class=\"sql\">SELECT 1;\n</code></pre>",
/// );
/// ```
pub fn to_html(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        match classify(lines[i]) {
            fence @ (Line::SqlFence | Line::Fence) => {
                let Some(close) = lines[i + 1..].iter().position(|l| is_closing_fence(l)) else {
                    // Unterminated: the opening line stays as text.
                    out.push(lines[i].to_string());
                    i += 1;
                    continue;
                };
                let body: String = lines[i + 1..i + 1 + close]
                    .iter()
                    .map(|l| format!("{}\n", l))
                    .collect();
                let open = if fence == Line::SqlFence {
                    "<pre><code class=\"sql\">"
                } else {
                    "<pre><code>"
                };
                out.push(format!("{}{}</code></pre>", open, body));
                i += close + 2;
            }
            Line::Heading { level, text } => {
                out.push(format!("<h{level}>{text}</h{level}>"));
                i += 1;
            }
            Line::Text(text) => {
                out.push(text.to_string());
                i += 1;
            }
        }
    }

    let mut html = out.join("\n");
    if markdown.ends_with('\n') {
        html.push('\n');
    }
    html
}

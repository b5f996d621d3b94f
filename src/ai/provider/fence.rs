//! Markdown fence unwrapping
//!
//! Models sometimes wrap an entire answer in a single ```` ```markdown ````
//! block. When nothing but that block is present, the fences are removed.
//! Stripping repeats until the text is no longer wrapped, so the function is
//! idempotent.

const FENCE: &str = "```";

/// Strip an enclosing markdown fence, if the whole text is one fenced block
pub fn unwrap_markdown_block(text: &str) -> String {
    let mut current = match strip_once(text) {
        Some(inner) => inner,
        None => return text.to_string(),
    };
    while let Some(inner) = strip_once(&current) {
        current = inner;
    }
    current
}

fn strip_once(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.trim().lines().collect();
    if lines.len() < 2 {
        return None;
    }

    let opening = lines[0].trim();
    let closing = lines[lines.len() - 1].trim();
    if closing != FENCE || !is_opening_fence(opening) {
        return None;
    }

    let inner = &lines[1..lines.len() - 1];
    if !fences_balanced(inner) {
        return None;
    }
    Some(inner.join("\n"))
}

fn is_opening_fence(line: &str) -> bool {
    match line.strip_prefix(FENCE) {
        Some(tag) => {
            let tag = tag.trim();
            tag.is_empty() || tag.eq_ignore_ascii_case("markdown") || tag.eq_ignore_ascii_case("md")
        }
        None => false,
    }
}

/// Nested code blocks are fine; a bare closing fence that would end the
/// outer block early means there is text outside it.
fn fences_balanced(lines: &[&str]) -> bool {
    let mut open = false;
    for line in lines {
        let trimmed = line.trim();
        if !trimmed.starts_with(FENCE) {
            continue;
        }
        if open {
            if trimmed == FENCE {
                open = false;
            }
        } else if trimmed == FENCE {
            return false;
        } else {
            open = true;
        }
    }
    !open
}

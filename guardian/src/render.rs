//! Flicker-free terminal rendering of streamed markdown.
//!
//! The markdown subset here is line-based (headings, bullets, inline
//! emphasis, fenced code), so a line can be styled the moment it is
//! complete and never revisited. Only the trailing partial line is
//! provisional: it is shown raw and rewritten in place with a
//! carriage-return plus clear-line, throttled so a chatty stream does not
//! spam the terminal. Because completed lines are styled exactly once, the
//! final on-screen text is identical no matter how the stream was split
//! into fragments.

use std::io::{self, Write};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::as_24_bit_terminal_escaped;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const FENCE_THEME: &str = "base16-ocean.dark";

/// How often the provisional tail line may be redrawn.
pub const TAIL_THROTTLE: Duration = Duration::from_millis(50);

const RESET: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\r\x1b[2K";

/// Incremental renderer over any writer.
///
/// In plain mode every fragment passes through verbatim, suitable for
/// pipes and log capture. In styled mode completed lines get ANSI styling
/// and fenced code is syntax highlighted.
pub struct LiveRenderer<W: Write> {
    out: W,
    styled: bool,
    tail: String,
    tail_visible: bool,
    fence: Option<HighlightLines<'static>>,
    throttle: Duration,
    last_tail_draw: Instant,
}

impl<W: Write> LiveRenderer<W> {
    pub fn new(out: W, styled: bool) -> Self {
        Self {
            out,
            styled,
            tail: String::new(),
            tail_visible: false,
            fence: None,
            throttle: TAIL_THROTTLE,
            last_tail_draw: Instant::now(),
        }
    }

    /// Overrides the tail redraw throttle. `Duration::MAX` disables tail
    /// redraws entirely, leaving only the once-per-line styled output.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Feeds one stream fragment. Fragment boundaries carry no meaning;
    /// lines may span any number of fragments.
    pub fn push(&mut self, fragment: &str) -> io::Result<()> {
        if !self.styled {
            self.out.write_all(fragment.as_bytes())?;
            return self.out.flush();
        }

        self.tail.push_str(fragment);
        while let Some(pos) = self.tail.find('\n') {
            let mut line: String = self.tail.drain(..=pos).collect();
            line.pop();
            self.clear_tail()?;
            self.render_line(&line)?;
        }
        self.draw_tail()
    }

    /// Flushes the final partial line, styled, and ends the stream.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.styled && !self.tail.is_empty() {
            self.clear_tail()?;
            let line = std::mem::take(&mut self.tail);
            self.render_line(&line)?;
        }
        self.out.flush()
    }

    fn clear_tail(&mut self) -> io::Result<()> {
        if self.tail_visible {
            self.out.write_all(CLEAR_LINE.as_bytes())?;
            self.tail_visible = false;
        }
        Ok(())
    }

    fn draw_tail(&mut self) -> io::Result<()> {
        if self.tail.is_empty() {
            return self.clear_tail();
        }
        if self.last_tail_draw.elapsed() < self.throttle {
            return Ok(());
        }
        write!(self.out, "{CLEAR_LINE}{}", self.tail)?;
        self.out.flush()?;
        self.tail_visible = true;
        self.last_tail_draw = Instant::now();
        Ok(())
    }

    /// Styles one complete line (no trailing newline in `line`) and writes
    /// it followed by a newline.
    fn render_line(&mut self, line: &str) -> io::Result<()> {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            if self.fence.is_some() {
                self.fence = None;
            } else {
                let lang = trimmed[3..].trim();
                let syntax = PS
                    .find_syntax_by_token(lang)
                    .unwrap_or_else(|| PS.find_syntax_plain_text());
                self.fence = Some(HighlightLines::new(syntax, &TS.themes[FENCE_THEME]));
            }
            return writeln!(self.out, "\x1b[2m{line}{RESET}");
        }

        if let Some(h) = self.fence.as_mut() {
            // Inside a fence markdown syntax is inert; only highlight.
            let with_nl = format!("{line}\n");
            return match h.highlight_line(&with_nl, &PS) {
                Ok(ranges) => {
                    write!(self.out, "{}{RESET}", as_24_bit_terminal_escaped(&ranges, false))
                }
                Err(_) => writeln!(self.out, "{line}"),
            };
        }

        if trimmed.starts_with('#') {
            return writeln!(self.out, "\x1b[1;36m{line}{RESET}");
        }

        if let Some(rest) = bullet_rest(line) {
            let indent = &line[..line.len() - trimmed.len()];
            return writeln!(self.out, "{indent}• {}", style_inline(rest));
        }

        writeln!(self.out, "{}", style_inline(line))
    }
}

/// Returns the text after a `* ` or `- ` bullet marker, if `line` is a
/// bullet item.
fn bullet_rest(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed.strip_prefix("* ").or_else(|| trimmed.strip_prefix("- "))
}

/// Renders `**bold**` and `*italic*` spans as ANSI styling. Asterisk
/// markers toggle; an unclosed marker is closed implicitly at end of line.
fn style_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut bold = false;
    let mut italic = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '*' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'*') {
            chars.next();
            bold = !bold;
            out.push_str(if bold { "\x1b[1m" } else { RESET });
        } else {
            italic = !italic;
            out.push_str(if italic { "\x1b[3m" } else { RESET });
        }
        // Reapply the other style after a reset so nesting survives.
        if !bold && italic && !out.ends_with("\x1b[3m") {
            out.push_str("\x1b[3m");
        }
        if !italic && bold && !out.ends_with("\x1b[1m") {
            out.push_str("\x1b[1m");
        }
    }
    if bold || italic {
        out.push_str(RESET);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Removes `ESC [ ... m` style sequences. Syntect emits a color span per
    /// token, so text assertions must run on the unstyled characters.
    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for d in chars.by_ref() {
                    if d == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    fn render_all(document: &str, styled: bool, chunked: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut r = LiveRenderer::new(&mut buf, styled).with_throttle(Duration::MAX);
            if chunked {
                // One UTF-8 character at a time, the worst-case split.
                let mut s = String::new();
                for c in document.chars() {
                    s.clear();
                    s.push(c);
                    r.push(&s).unwrap();
                }
            } else {
                r.push(document).unwrap();
            }
            r.finish().unwrap();
        }
        buf
    }

    #[test]
    fn plain_mode_passes_text_through_verbatim() {
        let doc = "## Heading\n\n* **[Issue]:** raw markdown stays raw\n";
        let out = render_all(doc, false, false);
        assert_eq!(out, doc.as_bytes());
    }

    #[test]
    fn output_is_invariant_under_fragment_splits() {
        let doc = "## Bugs & Security\n\n* **[Issue]:** café race\nplain tail";
        let whole = render_all(doc, true, false);
        let split = render_all(doc, true, true);
        assert_eq!(whole, split);
    }

    #[test]
    fn headings_and_bullets_are_styled() {
        let out = String::from_utf8(render_all("# Title\n* item\n", true, false)).unwrap();
        assert!(out.contains("\x1b[1;36m# Title"));
        assert!(out.contains("• item"));
    }

    #[test]
    fn inline_emphasis_consumes_markers() {
        let out = String::from_utf8(render_all("**bold** and *slant*\n", true, false)).unwrap();
        assert!(out.contains("\x1b[1mbold\x1b[0m"));
        assert!(out.contains("\x1b[3mslant\x1b[0m"));
        assert!(!out.contains('*'));
    }

    #[test]
    fn fenced_code_suppresses_markdown_styling() {
        let doc = "```python\nx = \"**bold**\"\n```\n";
        let out = String::from_utf8(render_all(doc, true, false)).unwrap();
        // Markers survive untouched inside the fence.
        assert!(strip_ansi(&out).contains("**bold**"));
        assert!(out.contains("\x1b[2m```python"));
    }

    #[test]
    fn unterminated_fence_keeps_highlighting_to_the_end() {
        let doc = "```python\ndef f():\n    return 1\n";
        let out = String::from_utf8(render_all(doc, true, false)).unwrap();
        // No heading styling leaks in and the code text is present.
        assert!(strip_ansi(&out).contains("return 1"));
        assert!(!out.contains("\x1b[1;36m"));
    }
}

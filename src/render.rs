use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Color, Print, SetAttribute, SetForegroundColor},
};

/// Shown in place of a mistyped space and for every overtyped character
pub const PLACEHOLDER: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharStyle {
    Normal,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledChar {
    pub ch: char,
    pub style: CharStyle,
}

impl StyledChar {
    fn normal(ch: char) -> Self {
        Self {
            ch,
            style: CharStyle::Normal,
        }
    }

    fn error(ch: char) -> Self {
        Self {
            ch,
            style: CharStyle::Error,
        }
    }
}

/// Overlay `typed` on `target`.
///
/// The output always shows target characters, never what was typed: a
/// mismatch keeps the expected character but marks it as an error, and a
/// mismatched space becomes [`PLACEHOLDER`] so it stays visible. Overtype
/// past the end of the target shows up as error placeholders.
pub fn render(target: &[char], typed: &[char]) -> Vec<StyledChar> {
    let shared = target.len().min(typed.len());
    let mut out = Vec::with_capacity(target.len().max(typed.len()));

    out.extend(target.iter().zip(typed).map(|(&expected, &got)| {
        if expected == got {
            StyledChar::normal(expected)
        } else if expected == ' ' {
            StyledChar::error(PLACEHOLDER)
        } else {
            StyledChar::error(expected)
        }
    }));

    if target.len() > shared {
        out.extend(target[shared..].iter().copied().map(StyledChar::normal));
    } else if typed.len() > shared {
        out.extend((shared..typed.len()).map(|_| StyledChar::error(PLACEHOLDER)));
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paint {
    Correct,
    Wrong,
    Pending,
}

impl Paint {
    fn of(idx: usize, styled: &StyledChar, typed_len: usize) -> Self {
        match styled.style {
            CharStyle::Error => Paint::Wrong,
            CharStyle::Normal if idx < typed_len => Paint::Correct,
            CharStyle::Normal => Paint::Pending,
        }
    }

    fn queue_on<W: Write>(self, out: &mut W) -> io::Result<()> {
        match self {
            Paint::Correct => queue!(
                out,
                SetAttribute(Attribute::Bold),
                SetForegroundColor(Color::Green)
            ),
            Paint::Wrong => queue!(
                out,
                SetAttribute(Attribute::Bold),
                SetForegroundColor(Color::Red)
            ),
            Paint::Pending => queue!(out, SetAttribute(Attribute::Reset)),
        }
    }
}

/// Queue the styled characters on `out`: typed-and-correct in bold green,
/// errors in bold red, the untyped rest in the terminal default.
///
/// Leaves the terminal with attributes reset.
pub fn write_styled<W: Write>(
    out: &mut W,
    chars: &[StyledChar],
    typed_len: usize,
) -> io::Result<()> {
    let mut current: Option<Paint> = None;
    let mut run = String::new();

    for (idx, styled) in chars.iter().enumerate() {
        let paint = Paint::of(idx, styled, typed_len);
        if current != Some(paint) {
            if !run.is_empty() {
                queue!(out, Print(&run))?;
                run.clear();
            }
            paint.queue_on(out)?;
            current = Some(paint);
        }
        run.push(styled.ch);
    }

    if !run.is_empty() {
        queue!(out, Print(&run))?;
    }
    queue!(out, SetAttribute(Attribute::Reset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn text_of(styled: &[StyledChar]) -> String {
        styled.iter().map(|s| s.ch).collect()
    }

    #[test]
    fn test_render_nothing_typed() {
        let out = render(&chars("abc"), &[]);
        assert_eq!(text_of(&out), "abc");
        assert!(out.iter().all(|s| s.style == CharStyle::Normal));
    }

    #[test]
    fn test_render_mismatch_keeps_target_char() {
        let out = render(&chars("ab"), &chars("ax"));
        assert_eq!(
            out,
            vec![StyledChar::normal('a'), StyledChar::error('b')]
        );
    }

    #[test]
    fn test_render_mismatched_letter_after_space() {
        let out = render(&chars("a b"), &chars("a c"));
        assert_eq!(out[1], StyledChar::normal(' '));
        assert_eq!(out[2], StyledChar::error('b'));
    }

    #[test]
    fn test_render_mismatched_space_uses_placeholder() {
        let out = render(&chars("a b"), &chars("aXb"));
        assert_eq!(out[0], StyledChar::normal('a'));
        assert_eq!(out[1], StyledChar::error(PLACEHOLDER));
        assert_eq!(out[2], StyledChar::normal('b'));
    }

    #[test]
    fn test_render_remainder_is_normal() {
        let out = render(&chars("hello"), &chars("he"));
        assert_eq!(text_of(&out), "hello");
        assert!(out.iter().all(|s| s.style == CharStyle::Normal));
    }

    #[test]
    fn test_render_overtype_appends_placeholders() {
        let out = render(&chars("ab"), &chars("abcd"));
        assert_eq!(out.len(), 4);
        assert_eq!(text_of(&out), "ab__");
        assert_eq!(out[2].style, CharStyle::Error);
        assert_eq!(out[3].style, CharStyle::Error);
    }

    #[test]
    fn test_render_prefix_matches_target_where_typed_matches() {
        let target = chars("the quick brown fox");
        let typed_full = chars("thx quick-brewn fox");
        for len in 0..=typed_full.len() {
            let typed = &typed_full[..len];
            let out = render(&target, typed);
            assert_eq!(out.len(), target.len());
            for i in 0..len {
                let matches = typed[i] == target[i];
                assert_eq!(out[i].ch == target[i] && out[i].style == CharStyle::Normal, matches);
            }
        }
    }

    #[test]
    fn test_write_styled_groups_runs() {
        let target = chars("abcd");
        let typed = chars("ab");
        let mut buf = Vec::new();
        write_styled(&mut buf, &render(&target, &typed), typed.len()).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.contains("ab"));
        assert!(out.contains("cd"));
        assert!(out.ends_with("\x1b[0m"));
    }

    #[test]
    fn test_write_styled_marks_errors_differently() {
        let mut ok = Vec::new();
        write_styled(&mut ok, &render(&chars("a"), &chars("a")), 1).unwrap();
        let mut bad = Vec::new();
        write_styled(&mut bad, &render(&chars("a"), &chars("b")), 1).unwrap();

        assert_ne!(ok, bad);
    }
}

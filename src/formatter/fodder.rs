//! Operations on fodder that keep its layout invariants intact: a paragraph
//! always starts on a fresh line and two line ends never need merging by the
//! printer.

use crate::ast::{Fodder, FodderElement, FodderKind};

/// True when the fodder ends with a line break rather than an inline comment.
pub fn has_clean_endline(fodder: &Fodder) -> bool {
    fodder
        .last()
        .is_some_and(|last| last.kind != FodderKind::Interstitial)
}

pub fn count_newlines(fodder: &Fodder) -> usize {
    fodder.iter().map(FodderElement::count_newlines).sum()
}

/// True when printing the fodder moves to a new line.
pub fn contains_newline(fodder: &Fodder) -> bool {
    fodder.iter().any(|f| f.kind != FodderKind::Interstitial)
}

pub fn append(fodder: &mut Fodder, elem: FodderElement) {
    if has_clean_endline(fodder) && elem.kind == FodderKind::LineEnd {
        if !elem.comment.is_empty() {
            // A trailing comment cannot follow a line break; it becomes its
            // own paragraph.
            fodder.push(FodderElement::new(
                FodderKind::Paragraph,
                elem.blanks,
                elem.indent,
                elem.comment,
            ));
        } else if let Some(back) = fodder.last_mut() {
            back.indent = elem.indent;
            back.blanks += elem.blanks;
        }
    } else {
        if !has_clean_endline(fodder) && elem.kind == FodderKind::Paragraph {
            fodder.push(FodderElement::new(FodderKind::LineEnd, 0, elem.indent, Vec::new()));
        }
        fodder.push(elem);
    }
}

pub fn concat(mut a: Fodder, b: Fodder) -> Fodder {
    if a.is_empty() {
        return b;
    }
    let mut rest = b.into_iter();
    if let Some(first) = rest.next() {
        append(&mut a, first);
    }
    a.extend(rest);
    a
}

/// Moves all of `b` in front of `a`, leaving `b` empty.
pub fn move_front(a: &mut Fodder, b: &mut Fodder) {
    let front = std::mem::take(b);
    let back = std::mem::take(a);
    *a = concat(front, back);
}

pub fn ensure_clean_newline(fodder: &mut Fodder) {
    if !has_clean_endline(fodder) {
        append(fodder, FodderElement::line_end());
    }
}

/// Splits fodder into the part that belongs to the previous token (up to and
/// including the first line break) and the part that leads into the next one.
pub fn split(fodder: Fodder) -> (Fodder, Fodder) {
    let mut after_prev = Fodder::new();
    let mut before_next = Fodder::new();
    let mut in_second_part = false;
    for elem in fodder {
        if in_second_part {
            append(&mut before_next, elem);
            continue;
        }
        let breaks_line = elem.kind != FodderKind::Interstitial;
        let blanks = elem.blanks;
        let indent = elem.indent;
        after_prev.push(elem);
        if breaks_line {
            in_second_part = true;
            if blanks > 0 {
                if let Some(last) = after_prev.last_mut() {
                    last.blanks = 0;
                }
                before_next.push(FodderElement::new(
                    FodderKind::LineEnd,
                    blanks - 1,
                    indent,
                    Vec::new(),
                ));
            }
        }
    }
    (after_prev, before_next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(kind: FodderKind, text: &str) -> FodderElement {
        FodderElement::new(kind, 0, 0, vec![text.to_string()])
    }

    #[test]
    fn line_ends_merge() {
        let mut fodder = vec![FodderElement::new(FodderKind::LineEnd, 1, 2, Vec::new())];
        append(&mut fodder, FodderElement::new(FodderKind::LineEnd, 1, 4, Vec::new()));
        assert_eq!(fodder, vec![FodderElement::new(FodderKind::LineEnd, 2, 4, Vec::new())]);
    }

    #[test]
    fn line_end_comment_after_break_becomes_paragraph() {
        let mut fodder = vec![FodderElement::line_end()];
        append(&mut fodder, comment(FodderKind::LineEnd, "// x"));
        assert_eq!(fodder[1].kind, FodderKind::Paragraph);
    }

    #[test]
    fn paragraph_after_interstitial_gets_a_break() {
        let mut fodder = vec![comment(FodderKind::Interstitial, "/* a */")];
        append(&mut fodder, comment(FodderKind::Paragraph, "// b"));
        let kinds: Vec<_> = fodder.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            [FodderKind::Interstitial, FodderKind::LineEnd, FodderKind::Paragraph]
        );
    }

    #[test]
    fn ensure_clean_newline_is_idempotent() {
        let mut fodder = Fodder::new();
        ensure_clean_newline(&mut fodder);
        ensure_clean_newline(&mut fodder);
        assert_eq!(fodder, vec![FodderElement::line_end()]);
        assert_eq!(count_newlines(&fodder), 1);
    }

    #[test]
    fn split_moves_blank_lines_forward() {
        let fodder = vec![
            FodderElement::new(FodderKind::LineEnd, 2, 0, vec!["// same line".into()]),
            comment(FodderKind::Paragraph, "// next"),
        ];
        let (adjacent, next) = split(fodder);
        assert_eq!(adjacent.len(), 1);
        assert_eq!(adjacent[0].blanks, 0);
        assert_eq!(next[0], FodderElement::new(FodderKind::LineEnd, 1, 0, Vec::new()));
        assert_eq!(next[1].comment, vec!["// next"]);
    }
}

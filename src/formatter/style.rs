//! The small normalisation passes. Each one rewrites a single aspect of the
//! tree and leaves the rest alone.

use super::fodder::{concat, contains_newline, move_front};
use super::pass::{walk, walk_field, Pass};
use super::strings::{escape, unescape};
use super::{CommentStyle, StringStyle, Strip};
use crate::ast::*;
use crate::error::FormatError;
use crate::utils::is_identifier;

/// Drops comments and/or line breaks.
pub(crate) struct StripFodder(pub Strip);

impl Pass for StripFodder {
    fn fodder(&mut self, fodder: &mut Fodder) {
        match self.0 {
            Strip::Nothing => {}
            Strip::Everything => fodder.clear(),
            Strip::Comments => {
                fodder.retain(|f| f.kind == FodderKind::LineEnd);
                for f in fodder.iter_mut() {
                    f.comment.clear();
                }
            }
            Strip::AllButComments => {
                let mut kept = Fodder::new();
                for f in fodder.drain(..) {
                    match f.kind {
                        FodderKind::Paragraph => {
                            kept.push(FodderElement::new(FodderKind::Paragraph, 0, 0, f.comment));
                        }
                        FodderKind::Interstitial => {
                            kept.push(f);
                            kept.push(FodderElement::line_end());
                        }
                        FodderKind::LineEnd => {}
                    }
                }
                *fodder = kept;
            }
        }
    }
}

/// Rewrites `#` comments as `//` or the other way round. A `#!` line at the
/// very top of the file is left alone.
pub(crate) struct EnforceCommentStyle {
    pub style: CommentStyle,
    pub seen_first: bool,
}

impl Pass for EnforceCommentStyle {
    fn fodder(&mut self, fodder: &mut Fodder) {
        for f in fodder.iter_mut() {
            let first = !self.seen_first;
            self.seen_first = true;
            if f.kind == FodderKind::Interstitial || f.comment.len() != 1 {
                continue;
            }
            let comment = &mut f.comment[0];
            match self.style {
                CommentStyle::Hash => {
                    if let Some(rest) = comment.strip_prefix("//") {
                        *comment = format!("#{rest}");
                    }
                }
                CommentStyle::Slash => {
                    if first && comment.starts_with("#!") {
                        continue;
                    }
                    if let Some(rest) = comment.strip_prefix('#') {
                        *comment = format!("//{rest}");
                    }
                }
                CommentStyle::Leave => {}
            }
        }
    }
}

pub(crate) struct EnforceMaxBlankLines(pub usize);

impl Pass for EnforceMaxBlankLines {
    fn fodder(&mut self, fodder: &mut Fodder) {
        for f in fodder.iter_mut() {
            if f.kind != FodderKind::Interstitial && f.blanks > self.0 {
                f.blanks = self.0;
            }
        }
    }
}

/// Switches quoted strings to the preferred quote unless that would need
/// more escaping.
pub(crate) struct EnforceStringStyle(pub StringStyle);

impl Pass for EnforceStringStyle {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        if let NodeKind::LiteralString(lit) = &mut node.kind {
            if matches!(lit.kind, LiteralStringKind::Single | LiteralStringKind::Double) {
                let canonical =
                    unescape(&lit.value).map_err(|message| FormatError::new("string literal", message))?;
                let has_single = canonical.contains('\'');
                let has_double = canonical.contains('"');
                if !(has_single && has_double) {
                    let single = if has_single {
                        false
                    } else if has_double {
                        true
                    } else {
                        self.0 == StringStyle::Single
                    };
                    lit.value = escape(&canonical, single);
                    lit.kind = if single {
                        LiteralStringKind::Single
                    } else {
                        LiteralStringKind::Double
                    };
                }
            }
        }
        walk(self, node)
    }
}

/// `x['foo']` becomes `x.foo` and `{ ['foo']: 1 }` becomes `{ foo: 1 }`
/// whenever the string is a plain identifier.
pub(crate) struct PrettyFieldNames;

impl Pass for PrettyFieldNames {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        if let NodeKind::Index(index) = &mut node.kind {
            let id = match index.index.as_deref() {
                Some(Node {
                    kind: NodeKind::LiteralString(lit),
                    ..
                }) if is_identifier(&lit.value) => Some(lit.value.clone()),
                _ => None,
            };
            if let Some(id) = id {
                if let Some(lit) = index.index.take() {
                    let right = std::mem::take(&mut index.right_bracket_fodder);
                    index.right_bracket_fodder = concat(lit.base.fodder, right);
                }
                index.id = Some(id);
            }
        }
        walk(self, node)
    }

    fn field(&mut self, field: &mut ObjectField) -> Result<(), FormatError> {
        let literal_key = |field: &ObjectField| match field.expr1.as_deref() {
            Some(Node {
                kind: NodeKind::LiteralString(lit),
                ..
            }) => Some(lit.value.clone()),
            _ => None,
        };

        if field.kind == ObjectFieldKind::FieldExpr && literal_key(field).is_some() {
            field.kind = ObjectFieldKind::FieldStr;
            if let Some(expr1) = &mut field.expr1 {
                move_front(&mut expr1.base.fodder, &mut field.fodder1);
            }
            if !field.fodder2.is_empty() {
                move_front(&mut field.op_fodder, &mut field.fodder2);
            }
        }

        if field.kind == ObjectFieldKind::FieldStr {
            if let Some(key) = literal_key(field).filter(|k| is_identifier(k)) {
                if let Some(expr1) = field.expr1.take() {
                    field.fodder1 = expr1.base.fodder;
                }
                field.kind = ObjectFieldKind::FieldId;
                field.id = Some(key);
            }
        }
        walk_field(self, field)
    }
}

/// `a[1:2:]` becomes `a[1:2]`.
pub(crate) struct NoRedundantSliceColon;

impl Pass for NoRedundantSliceColon {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        if let NodeKind::Slice(slice) = &mut node.kind {
            if slice.step.is_none() && !slice.step_colon_fodder.is_empty() {
                move_front(&mut slice.right_bracket_fodder, &mut slice.step_colon_fodder);
            }
        }
        walk(self, node)
    }
}

/// `a + { ... }` becomes `a { ... }` when `a` is a variable or a field access.
pub(crate) struct FixPlusObject;

impl Pass for FixPlusObject {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        let applies = matches!(
            &node.kind,
            NodeKind::Binary(Binary { op: BinaryOp::Plus, left, right, .. })
                if matches!(left.kind, NodeKind::Var(_) | NodeKind::Index(_))
                    && matches!(right.kind, NodeKind::Object(_))
        );
        if applies {
            let kind = std::mem::replace(&mut node.kind, NodeKind::LiteralNull);
            if let NodeKind::Binary(binary) = kind {
                let Binary {
                    left,
                    mut op_fodder,
                    mut right,
                    ..
                } = binary;
                move_front(&mut right.base.fodder, &mut op_fodder);
                node.kind = NodeKind::ApplyBrace(ApplyBrace { left, right });
            }
        }
        walk(self, node)
    }
}

/// `((e))` becomes `(e)`.
pub(crate) struct FixParens;

impl Pass for FixParens {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        if let NodeKind::Parens(parens) = &mut node.kind {
            while matches!(parens.inner.kind, NodeKind::Parens(_)) {
                let inner = std::mem::replace(&mut *parens.inner, Node::bare(NodeKind::LiteralNull));
                if let Node {
                    kind: NodeKind::Parens(mut inner_parens),
                    base,
                } = inner
                {
                    let mut open = base.fodder;
                    move_front(inner_parens.inner.open_fodder_mut(), &mut open);
                    move_front(&mut parens.close_fodder, &mut inner_parens.close_fodder);
                    parens.inner = inner_parens.inner;
                }
            }
        }
        walk(self, node)
    }
}

/// Multi-line lists end with a comma, single-line lists and comprehensions
/// do not.
pub(crate) struct FixTrailingCommas;

impl FixTrailingCommas {
    fn fix_comma(last_comma_fodder: &mut Fodder, trailing_comma: &mut bool, close_fodder: &mut Fodder) {
        let need_comma = contains_newline(close_fodder) || contains_newline(last_comma_fodder);
        if *trailing_comma {
            if !need_comma {
                *trailing_comma = false;
                move_front(close_fodder, last_comma_fodder);
            } else if contains_newline(last_comma_fodder) {
                move_front(close_fodder, last_comma_fodder);
            }
        } else if need_comma {
            move_front(close_fodder, last_comma_fodder);
            *trailing_comma = true;
        }
    }
}

impl Pass for FixTrailingCommas {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        match &mut node.kind {
            NodeKind::Array(array) => {
                if let Some(last) = array.elements.last_mut() {
                    Self::fix_comma(&mut last.comma_fodder, &mut array.trailing_comma, &mut array.close_fodder);
                }
            }
            NodeKind::Object(object) => {
                if let Some(last) = object.fields.last_mut() {
                    Self::fix_comma(&mut last.comma_fodder, &mut object.trailing_comma, &mut object.close_fodder);
                }
            }
            NodeKind::ArrayComp(comp) if comp.trailing_comma => {
                comp.trailing_comma = false;
                prepend_to_first_clause(&mut comp.spec, &mut comp.trailing_comma_fodder);
            }
            NodeKind::ObjectComp(comp) if comp.trailing_comma => {
                comp.trailing_comma = false;
                prepend_to_first_clause(&mut comp.spec, &mut comp.trailing_comma_fodder);
            }
            _ => {}
        }
        walk(self, node)
    }
}

/// Moves `fodder` in front of the clause written first, which sits at the end
/// of the `outer` chain.
fn prepend_to_first_clause(spec: &mut ForSpec, fodder: &mut Fodder) {
    match &mut spec.outer {
        Some(outer) => prepend_to_first_clause(outer, fodder),
        None => move_front(&mut spec.for_fodder, fodder),
    }
}

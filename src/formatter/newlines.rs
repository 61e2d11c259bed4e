//! Lists are either fully expanded, with a line break before every element
//! and before the closing delimiter, or kept on one line. A single line break
//! anywhere in those positions expands the whole list.
//!
//! Only the direct positions count, so `[{\n a: 1,\n}]` stays unexpanded.

use super::fodder::{count_newlines, ensure_clean_newline};
use super::pass::{for_each_spec_mut, walk, walk_arguments, walk_params, Pass};
use crate::ast::*;
use crate::error::FormatError;

pub(crate) struct FixNewlines;

fn specs_have_newlines(spec: &ForSpec) -> bool {
    spec.chain().iter().any(|s| {
        count_newlines(&s.for_fodder) > 0 || s.conditions.iter().any(|c| count_newlines(&c.if_fodder) > 0)
    })
}

fn expand_specs(spec: &mut ForSpec) {
    for_each_spec_mut(spec, &mut |s| {
        ensure_clean_newline(&mut s.for_fodder);
        for cond in &mut s.conditions {
            ensure_clean_newline(&mut cond.if_fodder);
        }
    });
}

fn fields_have_newlines(fields: &[ObjectField]) -> bool {
    fields.iter().any(|f| count_newlines(f.open_fodder()) > 0)
}

impl Pass for FixNewlines {
    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        match &mut node.kind {
            NodeKind::Array(array) => {
                let expand = array.elements.iter().any(|e| count_newlines(e.expr.open_fodder()) > 0)
                    || count_newlines(&array.close_fodder) > 0;
                if expand {
                    for element in &mut array.elements {
                        ensure_clean_newline(element.expr.open_fodder_mut());
                    }
                    ensure_clean_newline(&mut array.close_fodder);
                }
            }
            NodeKind::Object(object) => {
                let expand =
                    fields_have_newlines(&object.fields) || count_newlines(&object.close_fodder) > 0;
                if expand {
                    for field in &mut object.fields {
                        ensure_clean_newline(field.open_fodder_mut());
                    }
                    ensure_clean_newline(&mut object.close_fodder);
                }
            }
            NodeKind::Local(local) => {
                if local.binds.iter().any(|b| count_newlines(&b.var_fodder) > 0) {
                    for bind in local.binds.iter_mut().skip(1) {
                        ensure_clean_newline(&mut bind.var_fodder);
                    }
                }
            }
            NodeKind::ArrayComp(comp) => {
                let expand = count_newlines(comp.body.open_fodder()) > 0
                    || specs_have_newlines(&comp.spec)
                    || count_newlines(&comp.close_fodder) > 0;
                if expand {
                    ensure_clean_newline(comp.body.open_fodder_mut());
                    expand_specs(&mut comp.spec);
                    ensure_clean_newline(&mut comp.close_fodder);
                }
            }
            NodeKind::ObjectComp(comp) => {
                let expand = fields_have_newlines(&comp.fields)
                    || specs_have_newlines(&comp.spec)
                    || count_newlines(&comp.close_fodder) > 0;
                if expand {
                    for field in &mut comp.fields {
                        ensure_clean_newline(field.open_fodder_mut());
                    }
                    expand_specs(&mut comp.spec);
                    ensure_clean_newline(&mut comp.close_fodder);
                }
            }
            NodeKind::Parens(parens) => {
                let expand = count_newlines(parens.inner.open_fodder()) > 0
                    || count_newlines(&parens.close_fodder) > 0;
                if expand {
                    ensure_clean_newline(parens.inner.open_fodder_mut());
                    ensure_clean_newline(&mut parens.close_fodder);
                }
            }
            _ => {}
        }
        walk(self, node)
    }

    /// A break before the first parameter or before `)` puts both parens on
    /// their own lines; a break between parameters puts each on its own line.
    ///
    /// ```text
    /// f(a, b,        f(a,
    ///   c)     ==>     b,
    ///                  c)
    /// ```
    fn params(&mut self, params: &mut Params) -> Result<(), FormatError> {
        let mut between = false;
        let mut near_parens = count_newlines(&params.paren_right_fodder) > 0;
        for (i, param) in params.parameters.iter().enumerate() {
            if count_newlines(&param.name_fodder) > 0 {
                if i == 0 {
                    near_parens = true;
                } else {
                    between = true;
                }
            }
        }
        for (i, param) in params.parameters.iter_mut().enumerate() {
            if (i == 0 && near_parens) || (i > 0 && between) {
                ensure_clean_newline(&mut param.name_fodder);
            }
        }
        if near_parens {
            ensure_clean_newline(&mut params.paren_right_fodder);
        }
        walk_params(self, params)
    }

    fn arguments(&mut self, arguments: &mut Arguments, close: &mut Fodder) -> Result<(), FormatError> {
        let mut between = false;
        let mut near_parens = count_newlines(close) > 0;
        let opening = arguments
            .positional
            .iter()
            .map(|a| a.expr.open_fodder())
            .chain(arguments.named.iter().map(|a| &a.name_fodder));
        for (i, fodder) in opening.enumerate() {
            if count_newlines(fodder) > 0 {
                if i == 0 {
                    near_parens = true;
                } else {
                    between = true;
                }
            }
        }

        let opening = arguments
            .positional
            .iter_mut()
            .map(|a| a.expr.open_fodder_mut())
            .chain(arguments.named.iter_mut().map(|a| &mut a.name_fodder));
        for (i, fodder) in opening.enumerate() {
            if (i == 0 && near_parens) || (i > 0 && between) {
                ensure_clean_newline(fodder);
            }
        }
        if near_parens {
            ensure_clean_newline(close);
        }
        walk_arguments(self, arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_snippet;

    fn run(source: &str) -> Node {
        let (mut node, mut fodder) = parse_snippet("t.jsonnet", source).unwrap();
        FixNewlines.file(&mut node, &mut fodder).unwrap();
        node
    }

    #[test]
    fn one_break_expands_the_array() {
        let NodeKind::Array(array) = run("[1, 2,\n3]").kind else { panic!("not an array") };
        for element in &array.elements {
            assert_eq!(count_newlines(element.expr.open_fodder()), 1);
        }
        assert_eq!(count_newlines(&array.close_fodder), 1);
    }

    #[test]
    fn single_line_array_is_untouched() {
        let NodeKind::Array(array) = run("[1, 2, 3]").kind else { panic!("not an array") };
        assert!(array.close_fodder.is_empty());
    }

    #[test]
    fn nested_breaks_do_not_expand_outer() {
        let NodeKind::Array(array) = run("[{\na: 1}]").kind else { panic!("not an array") };
        assert!(array.close_fodder.is_empty());
        let NodeKind::Object(object) = &array.elements[0].expr.kind else { panic!("not an object") };
        assert_eq!(count_newlines(&object.close_fodder), 1);
    }

    #[test]
    fn break_between_arguments_expands_between() {
        let NodeKind::Apply(apply) = run("f(1, 2,\n3)").kind else { panic!("not apply") };
        let breaks: Vec<_> = apply
            .arguments
            .positional
            .iter()
            .map(|a| count_newlines(a.expr.open_fodder()))
            .collect();
        assert_eq!(breaks, [0, 1, 1]);
        assert!(apply.fodder_right.is_empty());
    }
}

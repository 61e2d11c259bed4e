//! Rewrites the indentation stored in every line-breaking fodder element so it
//! follows the nesting of the code.
//!
//! The pass mirrors the unparser: it tracks the column the printer would be
//! at, so that continuation lines can line up with the first sub-expression
//! when that one sits on the opening line.

use super::fodder::contains_newline;
use super::Options;
use crate::ast::*;
use crate::utils::with_stack;

/// `line_up` is the column continuation lines align to; `base` is where a
/// deeper level of nesting starts counting from. In
///
/// ```text
/// ____foobar(1,
/// ___________2)
/// ```
///
/// the `2` is visited with `base == 4` and `line_up == 11`.
#[derive(Debug, Clone, Copy)]
struct Indent {
    base: usize,
    line_up: usize,
}

pub(crate) struct FixIndentation {
    column: usize,
    indent: usize,
    pad_arrays: bool,
    pad_objects: bool,
}

/// Gives every line break but the last `all_but_last`, and the last `last`.
fn set_indents(fodder: &mut Fodder, all_but_last: usize, last: usize) {
    let count = fodder.iter().filter(|f| f.kind != FodderKind::Interstitial).count();
    for (i, f) in fodder
        .iter_mut()
        .filter(|f| f.kind != FodderKind::Interstitial)
        .enumerate()
    {
        f.indent = if i + 1 < count { all_but_last } else { last };
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

impl FixIndentation {
    pub fn new(options: &Options) -> Self {
        Self {
            column: 0,
            indent: options.indent,
            pad_arrays: options.pad_arrays,
            pad_objects: options.pad_objects,
        }
    }

    pub fn file(&mut self, root: &mut Node, final_fodder: &mut Fodder) {
        self.expression(root, Indent { base: 0, line_up: 0 }, false);
        set_indents(final_fodder, 0, 0);
    }

    /// Sets indents, then advances the column as the unparser would.
    fn fill_last(
        &mut self,
        fodder: &mut Fodder,
        mut crowded: bool,
        separate_token: bool,
        all_but_last: usize,
        last: usize,
    ) {
        set_indents(fodder, all_but_last, last);
        for f in fodder.iter() {
            match f.kind {
                FodderKind::Paragraph | FodderKind::LineEnd => {
                    self.column = f.indent;
                    crowded = false;
                }
                FodderKind::Interstitial => {
                    if crowded {
                        self.column += 1;
                    }
                    self.column += f.comment.first().map_or(0, |c| width(c));
                    crowded = true;
                }
            }
        }
        if separate_token && crowded {
            self.column += 1;
        }
    }

    fn fill(&mut self, fodder: &mut Fodder, crowded: bool, separate_token: bool, indent: usize) {
        self.fill_last(fodder, crowded, separate_token, indent, indent);
    }

    /// Sub-expressions line up with the first one if it stays on the opening
    /// line, otherwise they go one level deeper on the following lines.
    fn new_indent(&self, first: &Fodder, old: Indent, line_up: usize) -> Indent {
        if first.first().map_or(true, |f| f.kind == FodderKind::Interstitial) {
            Indent {
                base: old.base,
                line_up,
            }
        } else {
            Indent {
                base: old.base + self.indent,
                line_up: old.base + self.indent,
            }
        }
    }

    /// Like [`Self::new_indent`], but deeper nesting also counts from the
    /// lined-up column.
    fn new_indent_strong(&self, first: &Fodder, old: Indent, line_up: usize) -> Indent {
        if first.first().map_or(true, |f| f.kind == FodderKind::Interstitial) {
            Indent {
                base: line_up,
                line_up,
            }
        } else {
            Indent {
                base: old.base + self.indent,
                line_up: old.base + self.indent,
            }
        }
    }

    fn specs(&mut self, spec: &mut ForSpec, indent: Indent) {
        if let Some(outer) = &mut spec.outer {
            self.specs(outer, indent);
        }
        self.fill(&mut spec.for_fodder, true, true, indent.line_up);
        self.column += 3; // for
        self.fill(&mut spec.var_fodder, true, true, indent.line_up);
        self.column += width(&spec.var_name);
        self.fill(&mut spec.in_fodder, true, true, indent.line_up);
        self.column += 2; // in
        let expr_indent = self.new_indent(spec.expr.open_fodder(), indent, self.column);
        self.expression(&mut spec.expr, expr_indent, true);
        for cond in &mut spec.conditions {
            self.fill(&mut cond.if_fodder, true, true, indent.line_up);
            self.column += 2; // if
            let cond_indent = self.new_indent(cond.expr.open_fodder(), indent, self.column);
            self.expression(&mut cond.expr, cond_indent, true);
        }
    }

    fn params(&mut self, params: &mut Params, indent: Indent) {
        self.fill(&mut params.paren_left_fodder, false, false, indent.line_up);
        self.column += 1; // (
        let first_inside = params
            .parameters
            .first()
            .map_or(&params.paren_right_fodder, |p| &p.name_fodder);
        let new_indent = self.new_indent(first_inside, indent, self.column);
        for (i, param) in params.parameters.iter_mut().enumerate() {
            if i > 0 {
                self.column += 1; // ,
            }
            self.fill(&mut param.name_fodder, i > 0, true, new_indent.line_up);
            self.column += width(&param.name);
            if let Some(default_arg) = &mut param.default_arg {
                self.fill(&mut param.eq_fodder, false, false, new_indent.line_up);
                self.column += 1; // =
                self.expression(default_arg, new_indent, false);
            }
            self.fill(&mut param.comma_fodder, false, false, new_indent.line_up);
        }
        if params.trailing_comma {
            self.column += 1;
        }
        self.fill_last(
            &mut params.paren_right_fodder,
            false,
            false,
            new_indent.line_up,
            indent.line_up,
        );
        self.column += 1; // )
    }

    fn fields(&mut self, fields: &mut [ObjectField], indent: Indent, space_before: bool) {
        let line_up = indent.line_up;
        for (i, field) in fields.iter_mut().enumerate() {
            let crowded = i > 0 || space_before;
            if i > 0 {
                self.column += 1; // ,
            }
            match field.kind {
                ObjectFieldKind::Local => {
                    self.fill(&mut field.fodder1, crowded, true, line_up);
                    self.column += 5; // local
                    self.fill(&mut field.fodder2, true, true, line_up);
                    self.column += field.id.as_deref().map_or(0, width);
                    if let Some(method) = &mut field.method {
                        self.params(method, indent);
                    }
                    self.fill(&mut field.op_fodder, true, true, line_up);
                    self.column += 1; // =
                    let body_indent = self.new_indent(field.expr2.open_fodder(), indent, self.column + 1);
                    self.expression(&mut field.expr2, body_indent, true);
                }
                ObjectFieldKind::FieldId | ObjectFieldKind::FieldStr | ObjectFieldKind::FieldExpr => {
                    match field.kind {
                        ObjectFieldKind::FieldId => {
                            self.fill(&mut field.fodder1, crowded, true, line_up);
                            self.column += field.id.as_deref().map_or(0, width);
                        }
                        ObjectFieldKind::FieldStr => {
                            if let Some(key) = &mut field.expr1 {
                                self.expression(key, indent, crowded);
                            }
                        }
                        _ => {
                            self.fill(&mut field.fodder1, crowded, true, line_up);
                            self.column += 1; // [
                            if let Some(key) = &mut field.expr1 {
                                self.expression(key, indent, false);
                            }
                            self.fill(&mut field.fodder2, false, false, line_up);
                            self.column += 1; // ]
                        }
                    }
                    if let Some(method) = &mut field.method {
                        self.params(method, indent);
                    }
                    self.fill(&mut field.op_fodder, false, false, line_up);
                    if field.super_sugar {
                        self.column += 1;
                    }
                    self.column += field.hide.as_str().len();
                    let body_indent = self.new_indent(field.expr2.open_fodder(), indent, self.column + 1);
                    self.expression(&mut field.expr2, body_indent, true);
                }
                ObjectFieldKind::Assert => {
                    self.fill(&mut field.fodder1, crowded, true, line_up);
                    self.column += 6; // assert
                    let message_indent = self.new_indent(field.expr2.open_fodder(), indent, self.column + 1);
                    self.expression(&mut field.expr2, indent, true);
                    if let Some(message) = &mut field.expr3 {
                        self.fill(&mut field.op_fodder, true, true, message_indent.line_up);
                        self.column += 1; // :
                        self.expression(message, message_indent, true);
                    }
                }
            }
            self.fill(&mut field.comma_fodder, false, false, line_up);
        }
    }

    fn import(&mut self, keyword_width: usize, file: &mut Node, indent: Indent) {
        self.column += keyword_width;
        let new_indent = self.new_indent(file.open_fodder(), indent, self.column + 1);
        self.expression(file, new_indent, true);
    }

    /// `crowded` tells whether the previous token would touch this one.
    fn expression(&mut self, node: &mut Node, indent: Indent, crowded: bool) {
        with_stack(|| self.layout(node, indent, crowded));
    }

    fn layout(&mut self, node: &mut Node, indent: Indent, crowded: bool) {
        if node.left_recursive().is_none() {
            self.fill(&mut node.base.fodder, crowded, true, indent.line_up);
        }

        match &mut node.kind {
            NodeKind::Apply(apply) => {
                self.expression(&mut apply.target, indent, crowded);
                self.fill(&mut apply.fodder_left, false, false, indent.line_up);
                self.column += 1; // (
                let arguments = &apply.arguments;
                let mut opening = arguments
                    .positional
                    .iter()
                    .map(|a| a.expr.open_fodder())
                    .chain(arguments.named.iter().map(|a| &a.name_fodder));
                let first_fodder = opening.next().unwrap_or(&apply.fodder_right);
                // A break before any argument but the first anchors nesting
                // at the argument column.
                let strong = opening.any(contains_newline);
                let arg_indent = if strong {
                    self.new_indent_strong(first_fodder, indent, self.column)
                } else {
                    self.new_indent(first_fodder, indent, self.column)
                };

                let mut first = true;
                for arg in &mut apply.arguments.positional {
                    if !first {
                        self.column += 1; // ,
                    }
                    self.expression(&mut arg.expr, arg_indent, !first);
                    self.fill(&mut arg.comma_fodder, false, false, arg_indent.line_up);
                    first = false;
                }
                for arg in &mut apply.arguments.named {
                    if !first {
                        self.column += 1; // ,
                    }
                    self.fill(&mut arg.name_fodder, !first, true, arg_indent.line_up);
                    self.column += width(&arg.name);
                    self.fill(&mut arg.eq_fodder, false, false, arg_indent.line_up);
                    self.column += 1; // =
                    self.expression(&mut arg.arg, arg_indent, false);
                    self.fill(&mut arg.comma_fodder, false, false, arg_indent.line_up);
                    first = false;
                }
                if apply.trailing_comma {
                    self.column += 1;
                }
                self.fill_last(
                    &mut apply.fodder_right,
                    false,
                    false,
                    arg_indent.line_up,
                    indent.base,
                );
                self.column += 1; // )
                if apply.tail_strict {
                    self.fill(&mut apply.tail_strict_fodder, true, true, indent.base);
                    self.column += 10; // tailstrict
                }
            }
            NodeKind::ApplyBrace(apply) => {
                self.expression(&mut apply.left, indent, crowded);
                self.expression(&mut apply.right, indent, true);
            }
            NodeKind::Array(array) => {
                self.column += 1; // [
                let first_fodder = array
                    .elements
                    .first()
                    .map_or(&array.close_fodder, |e| e.expr.open_fodder());
                let new_column = self.column + usize::from(self.pad_arrays);
                let strong = array
                    .elements
                    .iter()
                    .skip(1)
                    .any(|e| contains_newline(e.expr.open_fodder()));
                let new_indent = if strong {
                    self.new_indent_strong(first_fodder, indent, new_column)
                } else {
                    self.new_indent(first_fodder, indent, new_column)
                };
                for (i, element) in array.elements.iter_mut().enumerate() {
                    if i > 0 {
                        self.column += 1; // ,
                    }
                    self.expression(&mut element.expr, new_indent, i > 0 || self.pad_arrays);
                    self.fill(&mut element.comma_fodder, false, false, new_indent.line_up);
                }
                if array.trailing_comma {
                    self.column += 1;
                }
                let crowded = !array.elements.is_empty();
                self.fill_last(
                    &mut array.close_fodder,
                    crowded,
                    self.pad_arrays,
                    new_indent.line_up,
                    indent.base,
                );
                self.column += 1; // ]
            }
            NodeKind::ArrayComp(comp) => {
                self.column += 1; // [
                let new_column = self.column + usize::from(self.pad_arrays);
                let new_indent = self.new_indent(comp.body.open_fodder(), indent, new_column);
                self.expression(&mut comp.body, new_indent, self.pad_arrays);
                self.fill(&mut comp.trailing_comma_fodder, false, false, new_indent.line_up);
                if comp.trailing_comma {
                    self.column += 1;
                }
                self.specs(&mut comp.spec, new_indent);
                self.fill_last(
                    &mut comp.close_fodder,
                    true,
                    self.pad_arrays,
                    new_indent.line_up,
                    indent.base,
                );
                self.column += 1; // ]
            }
            NodeKind::Assert(assert) => {
                self.column += 6; // assert
                let new_indent = self.new_indent(assert.cond.open_fodder(), indent, self.column + 1);
                self.expression(&mut assert.cond, new_indent, true);
                if let Some(message) = &mut assert.message {
                    self.fill(&mut assert.colon_fodder, true, true, new_indent.line_up);
                    self.column += 1; // :
                    self.expression(message, new_indent, true);
                }
                self.fill(&mut assert.semicolon_fodder, false, false, new_indent.line_up);
                self.column += 1; // ;
                self.expression(&mut assert.rest, indent, true);
            }
            NodeKind::Binary(binary) => {
                self.expression(&mut binary.left, indent, crowded);
                self.fill(&mut binary.op_fodder, true, true, indent.line_up);
                self.column += binary.op.as_str().len();
                // Chains like `a &&\nb &&\nc` keep one indentation level.
                self.expression(&mut binary.right, indent, true);
            }
            NodeKind::Conditional(cond) => {
                self.column += 2; // if
                let cond_indent = self.new_indent(cond.cond.open_fodder(), indent, self.column + 1);
                self.expression(&mut cond.cond, cond_indent, true);
                self.fill(&mut cond.then_fodder, true, true, indent.base);
                self.column += 4; // then
                let true_indent = self.new_indent(cond.branch_true.open_fodder(), indent, self.column + 1);
                self.expression(&mut cond.branch_true, true_indent, true);
                if let Some(branch_false) = &mut cond.branch_false {
                    self.fill(&mut cond.else_fodder, true, true, indent.base);
                    self.column += 4; // else
                    let false_indent = self.new_indent(branch_false.open_fodder(), indent, self.column + 1);
                    self.expression(branch_false, false_indent, true);
                }
            }
            NodeKind::Dollar => self.column += 1,
            NodeKind::Error(expr) => {
                self.column += 5; // error
                let new_indent = self.new_indent(expr.open_fodder(), indent, self.column + 1);
                self.expression(expr, new_indent, true);
            }
            NodeKind::Function(function) => {
                self.column += 8; // function
                self.params(&mut function.params, indent);
                let new_indent = self.new_indent(function.body.open_fodder(), indent, self.column + 1);
                self.expression(&mut function.body, new_indent, true);
            }
            NodeKind::Import(file) => self.import(6, file, indent),
            NodeKind::ImportStr(file) | NodeKind::ImportBin(file) => self.import(9, file, indent),
            NodeKind::InSuper(in_super) => {
                self.expression(&mut in_super.index, indent, crowded);
                self.fill(&mut in_super.in_fodder, true, true, indent.line_up);
                self.column += 2; // in
                self.fill(&mut in_super.super_fodder, true, true, indent.line_up);
                self.column += 5; // super
            }
            NodeKind::Index(index) => {
                self.expression(&mut index.target, indent, crowded);
                self.fill(&mut index.left_bracket_fodder, false, false, indent.line_up);
                if let Some(id) = &index.id {
                    let id_width = width(id);
                    let new_indent = self.new_indent(&index.right_bracket_fodder, indent, self.column);
                    self.column += 1; // .
                    self.fill(&mut index.right_bracket_fodder, false, false, new_indent.line_up);
                    self.column += id_width;
                } else {
                    self.column += 1; // [
                    if let Some(expr) = &mut index.index {
                        let new_indent = self.new_indent(expr.open_fodder(), indent, self.column);
                        self.expression(expr, new_indent, false);
                        self.fill_last(
                            &mut index.right_bracket_fodder,
                            false,
                            false,
                            new_indent.line_up,
                            indent.base,
                        );
                    }
                    self.column += 1; // ]
                }
            }
            NodeKind::LiteralBoolean(value) => self.column += if *value { 4 } else { 5 },
            NodeKind::LiteralNull | NodeKind::SelfObject => self.column += 4,
            NodeKind::LiteralNumber(text) => self.column += width(text),
            NodeKind::LiteralString(lit) => match lit.kind {
                LiteralStringKind::Single | LiteralStringKind::Double => {
                    self.column += 2 + width(&lit.value);
                }
                LiteralStringKind::Block => {
                    lit.block_indent = " ".repeat(indent.base + self.indent);
                    lit.block_term_indent = " ".repeat(indent.base);
                    self.column = indent.base + 3; // |||
                }
                LiteralStringKind::VerbatimSingle | LiteralStringKind::VerbatimDouble => {
                    let quote = if lit.kind == LiteralStringKind::VerbatimSingle { '\'' } else { '"' };
                    self.column += 3 + lit.value.chars().map(|c| if c == quote { 2 } else { 1 }).sum::<usize>();
                }
            },
            NodeKind::Local(local) => {
                self.column += 5; // local
                let empty = Fodder::new();
                let first = local.binds.first().map_or(&empty, |b| &b.var_fodder);
                let new_indent = self.new_indent(first, indent, self.column + 1);
                for (i, bind) in local.binds.iter_mut().enumerate() {
                    if i > 0 {
                        self.column += 1; // ,
                    }
                    self.fill(&mut bind.var_fodder, true, true, new_indent.line_up);
                    self.column += width(&bind.variable);
                    if let Some(fun) = &mut bind.fun {
                        self.params(fun, new_indent);
                    }
                    self.fill(&mut bind.eq_fodder, true, true, new_indent.line_up);
                    self.column += 1; // =
                    let body_indent = self.new_indent(bind.body.open_fodder(), new_indent, self.column + 1);
                    self.expression(&mut bind.body, body_indent, true);
                    self.fill_last(
                        &mut bind.close_fodder,
                        false,
                        false,
                        body_indent.line_up,
                        indent.base,
                    );
                }
                self.column += 1; // ;
                self.expression(&mut local.body, indent, true);
            }
            NodeKind::Object(object) => {
                let first_fodder = object
                    .fields
                    .first()
                    .map_or(&object.close_fodder, |f| f.open_fodder());
                self.column += 1; // {
                let new_column = self.column + usize::from(self.pad_objects);
                let new_indent = self.new_indent(first_fodder, indent, new_column);
                self.fields(&mut object.fields, new_indent, self.pad_objects);
                if object.trailing_comma {
                    self.column += 1;
                }
                let crowded = !object.fields.is_empty();
                self.fill_last(
                    &mut object.close_fodder,
                    crowded,
                    self.pad_objects,
                    new_indent.line_up,
                    indent.base,
                );
                self.column += 1; // }
            }
            NodeKind::ObjectComp(comp) => {
                let first_fodder = comp
                    .fields
                    .first()
                    .map_or(&comp.close_fodder, |f| f.open_fodder());
                self.column += 1; // {
                let new_column = self.column + usize::from(self.pad_objects);
                let new_indent = self.new_indent(first_fodder, indent, new_column);
                self.fields(&mut comp.fields, new_indent, self.pad_objects);
                self.fill(&mut comp.trailing_comma_fodder, false, false, new_indent.line_up);
                if comp.trailing_comma {
                    self.column += 1;
                }
                self.specs(&mut comp.spec, new_indent);
                self.fill_last(
                    &mut comp.close_fodder,
                    true,
                    self.pad_objects,
                    new_indent.line_up,
                    indent.base,
                );
                self.column += 1; // }
            }
            NodeKind::Parens(parens) => {
                self.column += 1; // (
                let new_indent = self.new_indent_strong(parens.inner.open_fodder(), indent, self.column);
                self.expression(&mut parens.inner, new_indent, false);
                self.fill_last(
                    &mut parens.close_fodder,
                    false,
                    false,
                    new_indent.line_up,
                    indent.base,
                );
                self.column += 1; // )
            }
            NodeKind::Slice(slice) => {
                self.expression(&mut slice.target, indent, crowded);
                self.fill(&mut slice.left_bracket_fodder, false, false, indent.line_up);
                self.column += 1; // [
                let first_fodder = slice
                    .begin_index
                    .as_deref()
                    .map_or(&slice.end_colon_fodder, |b| b.open_fodder());
                let new_indent = self.new_indent(first_fodder, indent, self.column);
                if let Some(begin) = &mut slice.begin_index {
                    self.expression(begin, new_indent, false);
                }
                self.fill(&mut slice.end_colon_fodder, false, false, new_indent.line_up);
                self.column += 1; // :
                if let Some(end) = &mut slice.end_index {
                    self.expression(end, new_indent, false);
                }
                if slice.step.is_some() || !slice.step_colon_fodder.is_empty() {
                    self.fill(&mut slice.step_colon_fodder, false, false, new_indent.line_up);
                    self.column += 1; // :
                    if let Some(step) = &mut slice.step {
                        self.expression(step, new_indent, false);
                    }
                }
                self.fill_last(
                    &mut slice.right_bracket_fodder,
                    false,
                    false,
                    new_indent.line_up,
                    indent.base,
                );
                self.column += 1; // ]
            }
            NodeKind::SuperIndex(super_index) => {
                self.column += 5; // super
                self.fill(&mut super_index.dot_fodder, false, false, indent.line_up);
                if let Some(id) = &super_index.id {
                    let id_width = width(id);
                    self.column += 1; // .
                    let new_indent = self.new_indent(&super_index.id_fodder, indent, self.column);
                    self.fill(&mut super_index.id_fodder, false, false, new_indent.line_up);
                    self.column += id_width;
                } else {
                    self.column += 1; // [
                    if let Some(index) = &mut super_index.index {
                        let new_indent = self.new_indent(index.open_fodder(), indent, self.column);
                        self.expression(index, new_indent, false);
                        self.fill_last(
                            &mut super_index.id_fodder,
                            false,
                            false,
                            new_indent.line_up,
                            indent.base,
                        );
                    }
                    self.column += 1; // ]
                }
            }
            NodeKind::Unary(unary) => {
                self.column += unary.op.as_str().len();
                let new_indent = self.new_indent(unary.expr.open_fodder(), indent, self.column);
                self.expression(&mut unary.expr, new_indent, false);
            }
            NodeKind::Var(id) => self.column += width(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_snippet;

    fn indents(source: &str) -> Node {
        let (mut node, mut fodder) = parse_snippet("t.jsonnet", source).unwrap();
        FixIndentation::new(&Options::default()).file(&mut node, &mut fodder);
        node
    }

    #[test]
    fn expanded_object_indents_fields_and_closes_at_base() {
        let NodeKind::Object(object) = indents("{\n      a: 1,\n         b: 2,\n   }").kind else {
            panic!("not an object")
        };
        assert_eq!(object.fields[0].fodder1[0].indent, 2);
        assert_eq!(object.fields[1].fodder1[0].indent, 2);
        assert_eq!(object.close_fodder[0].indent, 0);
    }

    #[test]
    fn arguments_line_up_after_the_paren() {
        let NodeKind::Apply(apply) = indents("foobar(1,\n2)").kind else { panic!("not apply") };
        let second = &apply.arguments.positional[1].expr;
        assert_eq!(second.base.fodder[0].indent, 7);
    }

    #[test]
    fn nested_object_goes_one_level_deeper() {
        let NodeKind::Object(outer) = indents("{\na: {\nb: 1\n}\n}").kind else { panic!("not an object") };
        let NodeKind::Object(inner) = &outer.fields[0].expr2.kind else { panic!("not an object") };
        assert_eq!(inner.fields[0].fodder1[0].indent, 4);
        assert_eq!(inner.close_fodder[0].indent, 2);
    }

    #[test]
    fn block_string_indent_follows_nesting() {
        let NodeKind::Object(object) = indents("{\na: |||\n  text\n|||\n}").kind else { panic!("not an object") };
        let NodeKind::LiteralString(lit) = &object.fields[0].expr2.kind else { panic!("not a string") };
        assert_eq!(lit.block_indent, "    ");
        assert_eq!(lit.block_term_indent, "  ");
    }
}

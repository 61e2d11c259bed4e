//! Tree walking shared by the formatter passes. A pass overrides the hooks it
//! cares about and calls back into the matching `walk_*` function to keep
//! descending. Everything is visited in source order.

use crate::ast::*;
use crate::error::FormatError;
use crate::utils::with_stack;

pub(crate) trait Pass {
    fn fodder(&mut self, _fodder: &mut Fodder) {}

    fn visit(&mut self, node: &mut Node) -> Result<(), FormatError> {
        walk(self, node)
    }

    fn params(&mut self, params: &mut Params) -> Result<(), FormatError> {
        walk_params(self, params)
    }

    /// `close` is the fodder in front of the closing parenthesis.
    fn arguments(&mut self, arguments: &mut Arguments, _close: &mut Fodder) -> Result<(), FormatError> {
        walk_arguments(self, arguments)
    }

    fn field(&mut self, field: &mut ObjectField) -> Result<(), FormatError> {
        walk_field(self, field)
    }

    fn file(&mut self, root: &mut Node, final_fodder: &mut Fodder) -> Result<(), FormatError> {
        self.visit(root)?;
        self.fodder(final_fodder);
        Ok(())
    }
}

pub(crate) fn walk<P: Pass + ?Sized>(pass: &mut P, node: &mut Node) -> Result<(), FormatError> {
    with_stack(|| walk_node(pass, node))
}

fn walk_node<P: Pass + ?Sized>(pass: &mut P, node: &mut Node) -> Result<(), FormatError> {
    pass.fodder(&mut node.base.fodder);
    match &mut node.kind {
        NodeKind::Apply(apply) => {
            pass.visit(&mut apply.target)?;
            pass.fodder(&mut apply.fodder_left);
            pass.arguments(&mut apply.arguments, &mut apply.fodder_right)?;
            pass.fodder(&mut apply.fodder_right);
            pass.fodder(&mut apply.tail_strict_fodder);
        }
        NodeKind::ApplyBrace(apply) => {
            pass.visit(&mut apply.left)?;
            pass.visit(&mut apply.right)?;
        }
        NodeKind::Array(array) => {
            for element in &mut array.elements {
                pass.visit(&mut element.expr)?;
                pass.fodder(&mut element.comma_fodder);
            }
            pass.fodder(&mut array.close_fodder);
        }
        NodeKind::ArrayComp(comp) => {
            pass.visit(&mut comp.body)?;
            pass.fodder(&mut comp.trailing_comma_fodder);
            walk_spec(pass, &mut comp.spec)?;
            pass.fodder(&mut comp.close_fodder);
        }
        NodeKind::Assert(assert) => {
            pass.visit(&mut assert.cond)?;
            pass.fodder(&mut assert.colon_fodder);
            if let Some(message) = &mut assert.message {
                pass.visit(message)?;
            }
            pass.fodder(&mut assert.semicolon_fodder);
            pass.visit(&mut assert.rest)?;
        }
        NodeKind::Binary(binary) => {
            pass.visit(&mut binary.left)?;
            pass.fodder(&mut binary.op_fodder);
            pass.visit(&mut binary.right)?;
        }
        NodeKind::Conditional(cond) => {
            pass.visit(&mut cond.cond)?;
            pass.fodder(&mut cond.then_fodder);
            pass.visit(&mut cond.branch_true)?;
            pass.fodder(&mut cond.else_fodder);
            if let Some(branch_false) = &mut cond.branch_false {
                pass.visit(branch_false)?;
            }
        }
        NodeKind::Error(expr)
        | NodeKind::Import(expr)
        | NodeKind::ImportBin(expr)
        | NodeKind::ImportStr(expr) => pass.visit(expr)?,
        NodeKind::Function(function) => {
            pass.params(&mut function.params)?;
            pass.visit(&mut function.body)?;
        }
        NodeKind::InSuper(in_super) => {
            pass.visit(&mut in_super.index)?;
            pass.fodder(&mut in_super.in_fodder);
            pass.fodder(&mut in_super.super_fodder);
        }
        NodeKind::Index(index) => {
            pass.visit(&mut index.target)?;
            pass.fodder(&mut index.left_bracket_fodder);
            if let Some(expr) = &mut index.index {
                pass.visit(expr)?;
            }
            pass.fodder(&mut index.right_bracket_fodder);
        }
        NodeKind::Local(local) => {
            for bind in &mut local.binds {
                pass.fodder(&mut bind.var_fodder);
                if let Some(fun) = &mut bind.fun {
                    pass.params(fun)?;
                }
                pass.fodder(&mut bind.eq_fodder);
                pass.visit(&mut bind.body)?;
                pass.fodder(&mut bind.close_fodder);
            }
            pass.visit(&mut local.body)?;
        }
        NodeKind::Object(object) => {
            for field in &mut object.fields {
                pass.field(field)?;
            }
            pass.fodder(&mut object.close_fodder);
        }
        NodeKind::ObjectComp(comp) => {
            for field in &mut comp.fields {
                pass.field(field)?;
            }
            pass.fodder(&mut comp.trailing_comma_fodder);
            walk_spec(pass, &mut comp.spec)?;
            pass.fodder(&mut comp.close_fodder);
        }
        NodeKind::Parens(parens) => {
            pass.visit(&mut parens.inner)?;
            pass.fodder(&mut parens.close_fodder);
        }
        NodeKind::Slice(slice) => {
            pass.visit(&mut slice.target)?;
            pass.fodder(&mut slice.left_bracket_fodder);
            if let Some(begin) = &mut slice.begin_index {
                pass.visit(begin)?;
            }
            pass.fodder(&mut slice.end_colon_fodder);
            if let Some(end) = &mut slice.end_index {
                pass.visit(end)?;
            }
            pass.fodder(&mut slice.step_colon_fodder);
            if let Some(step) = &mut slice.step {
                pass.visit(step)?;
            }
            pass.fodder(&mut slice.right_bracket_fodder);
        }
        NodeKind::SuperIndex(super_index) => {
            pass.fodder(&mut super_index.dot_fodder);
            if let Some(index) = &mut super_index.index {
                pass.visit(index)?;
            }
            pass.fodder(&mut super_index.id_fodder);
        }
        NodeKind::Unary(unary) => pass.visit(&mut unary.expr)?,
        NodeKind::Dollar
        | NodeKind::LiteralBoolean(_)
        | NodeKind::LiteralNull
        | NodeKind::LiteralNumber(_)
        | NodeKind::LiteralString(_)
        | NodeKind::SelfObject
        | NodeKind::Var(_) => {}
    }
    Ok(())
}

pub(crate) fn walk_params<P: Pass + ?Sized>(pass: &mut P, params: &mut Params) -> Result<(), FormatError> {
    pass.fodder(&mut params.paren_left_fodder);
    for param in &mut params.parameters {
        pass.fodder(&mut param.name_fodder);
        pass.fodder(&mut param.eq_fodder);
        if let Some(default_arg) = &mut param.default_arg {
            pass.visit(default_arg)?;
        }
        pass.fodder(&mut param.comma_fodder);
    }
    pass.fodder(&mut params.paren_right_fodder);
    Ok(())
}

pub(crate) fn walk_arguments<P: Pass + ?Sized>(
    pass: &mut P,
    arguments: &mut Arguments,
) -> Result<(), FormatError> {
    for arg in &mut arguments.positional {
        pass.visit(&mut arg.expr)?;
        pass.fodder(&mut arg.comma_fodder);
    }
    for arg in &mut arguments.named {
        pass.fodder(&mut arg.name_fodder);
        pass.fodder(&mut arg.eq_fodder);
        pass.visit(&mut arg.arg)?;
        pass.fodder(&mut arg.comma_fodder);
    }
    Ok(())
}

pub(crate) fn walk_field<P: Pass + ?Sized>(pass: &mut P, field: &mut ObjectField) -> Result<(), FormatError> {
    pass.fodder(&mut field.fodder1);
    if field.kind == ObjectFieldKind::Assert {
        pass.visit(&mut field.expr2)?;
        pass.fodder(&mut field.op_fodder);
        if let Some(message) = &mut field.expr3 {
            pass.visit(message)?;
        }
    } else {
        if let Some(expr1) = &mut field.expr1 {
            pass.visit(expr1)?;
        }
        pass.fodder(&mut field.fodder2);
        if let Some(method) = &mut field.method {
            pass.params(method)?;
        }
        pass.fodder(&mut field.op_fodder);
        pass.visit(&mut field.expr2)?;
    }
    pass.fodder(&mut field.comma_fodder);
    Ok(())
}

/// Visits the clauses outermost first.
pub(crate) fn walk_spec<P: Pass + ?Sized>(pass: &mut P, spec: &mut ForSpec) -> Result<(), FormatError> {
    if let Some(outer) = &mut spec.outer {
        walk_spec(pass, outer)?;
    }
    pass.fodder(&mut spec.for_fodder);
    pass.fodder(&mut spec.var_fodder);
    pass.fodder(&mut spec.in_fodder);
    pass.visit(&mut spec.expr)?;
    for cond in &mut spec.conditions {
        pass.fodder(&mut cond.if_fodder);
        pass.visit(&mut cond.expr)?;
    }
    Ok(())
}

/// Applies `f` to every clause of a comprehension, outermost first.
pub(crate) fn for_each_spec_mut(spec: &mut ForSpec, f: &mut impl FnMut(&mut ForSpec)) {
    if let Some(outer) = &mut spec.outer {
        for_each_spec_mut(outer, f);
    }
    f(spec);
}

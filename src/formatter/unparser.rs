//! Prints a syntax tree back to Jsonnet text. All layout decisions live in
//! the fodder; the printer only decides where single spaces go.

use super::Options;
use crate::ast::*;
use crate::error::FormatError;
use crate::utils::with_stack;

pub(crate) struct Unparser<'o> {
    buf: String,
    options: &'o Options,
}

type Result<T = ()> = std::result::Result<T, FormatError>;

impl<'o> Unparser<'o> {
    pub fn new(options: &'o Options) -> Self {
        Self {
            buf: String::new(),
            options,
        }
    }

    pub fn finish(mut self) -> String {
        if !self.buf.ends_with('\n') {
            self.buf.push('\n');
        }
        self.buf
    }

    fn write(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    fn spaces(&mut self, count: usize) {
        self.buf.extend(std::iter::repeat(' ').take(count));
    }

    fn fill(&mut self, fodder: &Fodder, crowded: bool, separate_token: bool) -> Result {
        self.fill_final(fodder, crowded, separate_token, false)
    }

    /// Prints fodder. `crowded` means the previous token would touch the next
    /// thing printed, `separate_token` that the following token must not
    /// touch this fodder. At the end of the file the trailing indentation of
    /// the last element is dropped.
    pub fn fill_final(
        &mut self,
        fodder: &Fodder,
        mut crowded: bool,
        separate_token: bool,
        is_final: bool,
    ) -> Result {
        let mut last_indent = 0;
        for (i, f) in fodder.iter().enumerate() {
            let skip_trailing = is_final && i + 1 == fodder.len();
            match f.kind {
                FodderKind::Paragraph => {
                    for (j, line) in f.comment.iter().enumerate() {
                        if !line.is_empty() {
                            if j > 0 {
                                self.spaces(last_indent);
                            }
                            self.write(line);
                        }
                        self.write("\n");
                    }
                    if !skip_trailing {
                        self.write(&"\n".repeat(f.blanks));
                        self.spaces(f.indent);
                    }
                    last_indent = f.indent;
                    crowded = false;
                }
                FodderKind::LineEnd => {
                    if let Some(comment) = f.comment.first() {
                        self.write("  ");
                        self.write(comment);
                    }
                    self.write("\n");
                    if !skip_trailing {
                        self.write(&"\n".repeat(f.blanks));
                        self.spaces(f.indent);
                    }
                    last_indent = f.indent;
                    crowded = false;
                }
                FodderKind::Interstitial => {
                    let comment = f
                        .comment
                        .first()
                        .ok_or_else(|| FormatError::new("fodder", "interstitial without a comment"))?;
                    if crowded {
                        self.write(" ");
                    }
                    self.write(comment);
                    crowded = true;
                }
            }
        }
        if separate_token && crowded {
            self.write(" ");
        }
        Ok(())
    }

    fn params(&mut self, params: &Params) -> Result {
        self.fill(&params.paren_left_fodder, false, false)?;
        self.write("(");
        for (i, param) in params.parameters.iter().enumerate() {
            if i > 0 {
                self.write(",");
            }
            self.fill(&param.name_fodder, i > 0, true)?;
            self.write(&param.name);
            if let Some(default_arg) = &param.default_arg {
                self.fill(&param.eq_fodder, false, false)?;
                self.write("=");
                self.unparse(default_arg, false)?;
            }
            self.fill(&param.comma_fodder, false, false)?;
        }
        if params.trailing_comma {
            self.write(",");
        }
        self.fill(&params.paren_right_fodder, false, false)?;
        self.write(")");
        Ok(())
    }

    fn fields(&mut self, fields: &[ObjectField], crowded: bool) -> Result {
        for (i, field) in fields.iter().enumerate() {
            let space = i > 0 || crowded;
            if i > 0 {
                self.write(",");
            }
            match field.kind {
                ObjectFieldKind::Local => {
                    self.fill(&field.fodder1, space, true)?;
                    self.write("local");
                    self.fill(&field.fodder2, true, true)?;
                    self.write(field_id(field)?);
                    if let Some(method) = &field.method {
                        self.params(method)?;
                    }
                    self.fill(&field.op_fodder, true, true)?;
                    self.write("=");
                    self.unparse(&field.expr2, true)?;
                }
                ObjectFieldKind::FieldId | ObjectFieldKind::FieldStr | ObjectFieldKind::FieldExpr => {
                    match field.kind {
                        ObjectFieldKind::FieldId => {
                            self.fill(&field.fodder1, space, true)?;
                            self.write(field_id(field)?);
                        }
                        ObjectFieldKind::FieldStr => self.unparse(field_key(field)?, space)?,
                        _ => {
                            self.fill(&field.fodder1, space, true)?;
                            self.write("[");
                            self.unparse(field_key(field)?, false)?;
                            self.fill(&field.fodder2, false, false)?;
                            self.write("]");
                        }
                    }
                    if let Some(method) = &field.method {
                        self.params(method)?;
                    }
                    self.fill(&field.op_fodder, false, false)?;
                    if field.super_sugar {
                        self.write("+");
                    }
                    self.write(field.hide.as_str());
                    self.unparse(&field.expr2, true)?;
                }
                ObjectFieldKind::Assert => {
                    self.fill(&field.fodder1, space, true)?;
                    self.write("assert");
                    self.unparse(&field.expr2, true)?;
                    if let Some(message) = &field.expr3 {
                        self.fill(&field.op_fodder, true, true)?;
                        self.write(":");
                        self.unparse(message, true)?;
                    }
                }
            }
            self.fill(&field.comma_fodder, false, false)?;
        }
        Ok(())
    }

    fn specs(&mut self, spec: &ForSpec) -> Result {
        if let Some(outer) = &spec.outer {
            self.specs(outer)?;
        }
        self.fill(&spec.for_fodder, true, true)?;
        self.write("for");
        self.fill(&spec.var_fodder, true, true)?;
        self.write(&spec.var_name);
        self.fill(&spec.in_fodder, true, true)?;
        self.write("in");
        self.unparse(&spec.expr, true)?;
        for cond in &spec.conditions {
            self.fill(&cond.if_fodder, true, true)?;
            self.write("if");
            self.unparse(&cond.expr, true)?;
        }
        Ok(())
    }

    fn string(&mut self, lit: &LiteralString) -> Result {
        match lit.kind {
            LiteralStringKind::Double => {
                // Quoted values still hold their escapes.
                self.write("\"");
                self.write(&lit.value);
                self.write("\"");
            }
            LiteralStringKind::Single => {
                self.write("'");
                self.write(&lit.value);
                self.write("'");
            }
            LiteralStringKind::Block => {
                let value = &lit.value;
                if value.is_empty() {
                    return Err(FormatError::new("block string", "text block with no content"));
                }
                let chomped = !value.ends_with('\n');
                self.write("|||");
                if chomped {
                    self.write("-");
                }
                self.write("\n");
                if !value.starts_with('\n') {
                    self.write(&lit.block_indent);
                }
                let mut chars = value.chars().peekable();
                while let Some(c) = chars.next() {
                    // Output is always unix style.
                    if c == '\r' {
                        continue;
                    }
                    self.buf.push(c);
                    if c == '\n' && chars.peek().is_some_and(|next| *next != '\n') {
                        self.write(&lit.block_indent);
                    }
                }
                if chomped {
                    self.write("\n");
                }
                self.write(&lit.block_term_indent);
                self.write("|||");
            }
            LiteralStringKind::VerbatimDouble => {
                self.write("@\"");
                self.write(&lit.value.replace('"', "\"\""));
                self.write("\"");
            }
            LiteralStringKind::VerbatimSingle => {
                self.write("@'");
                self.write(&lit.value.replace('\'', "''"));
                self.write("'");
            }
        }
        Ok(())
    }

    pub fn unparse(&mut self, node: &Node, crowded: bool) -> Result {
        with_stack(|| self.print(node, crowded))
    }

    fn print(&mut self, node: &Node, crowded: bool) -> Result {
        if node.left_recursive().is_none() {
            self.fill(&node.base.fodder, crowded, true)?;
        }

        match &node.kind {
            NodeKind::Apply(apply) => {
                self.unparse(&apply.target, crowded)?;
                self.fill(&apply.fodder_left, false, false)?;
                self.write("(");
                let mut first = true;
                for arg in &apply.arguments.positional {
                    if !first {
                        self.write(",");
                    }
                    self.unparse(&arg.expr, !first)?;
                    self.fill(&arg.comma_fodder, false, false)?;
                    first = false;
                }
                for arg in &apply.arguments.named {
                    if !first {
                        self.write(",");
                    }
                    self.fill(&arg.name_fodder, !first, true)?;
                    self.write(&arg.name);
                    self.fill(&arg.eq_fodder, false, false)?;
                    self.write("=");
                    self.unparse(&arg.arg, false)?;
                    self.fill(&arg.comma_fodder, false, false)?;
                    first = false;
                }
                if apply.trailing_comma {
                    self.write(",");
                }
                self.fill(&apply.fodder_right, false, false)?;
                self.write(")");
                if apply.tail_strict {
                    self.fill(&apply.tail_strict_fodder, true, true)?;
                    self.write("tailstrict");
                }
            }
            NodeKind::ApplyBrace(apply) => {
                self.unparse(&apply.left, crowded)?;
                self.unparse(&apply.right, true)?;
            }
            NodeKind::Array(array) => {
                self.write("[");
                for (i, element) in array.elements.iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                    }
                    self.unparse(&element.expr, i > 0 || self.options.pad_arrays)?;
                    self.fill(&element.comma_fodder, false, false)?;
                }
                if array.trailing_comma {
                    self.write(",");
                }
                self.fill(&array.close_fodder, !array.elements.is_empty(), self.options.pad_arrays)?;
                self.write("]");
            }
            NodeKind::ArrayComp(comp) => {
                self.write("[");
                self.unparse(&comp.body, self.options.pad_arrays)?;
                self.fill(&comp.trailing_comma_fodder, false, false)?;
                if comp.trailing_comma {
                    self.write(",");
                }
                self.specs(&comp.spec)?;
                self.fill(&comp.close_fodder, true, self.options.pad_arrays)?;
                self.write("]");
            }
            NodeKind::Assert(assert) => {
                self.write("assert");
                self.unparse(&assert.cond, true)?;
                if let Some(message) = &assert.message {
                    self.fill(&assert.colon_fodder, true, true)?;
                    self.write(":");
                    self.unparse(message, true)?;
                }
                self.fill(&assert.semicolon_fodder, false, false)?;
                self.write(";");
                self.unparse(&assert.rest, true)?;
            }
            NodeKind::Binary(binary) => {
                self.unparse(&binary.left, crowded)?;
                self.fill(&binary.op_fodder, true, true)?;
                self.write(binary.op.as_str());
                self.unparse(&binary.right, true)?;
            }
            NodeKind::Conditional(cond) => {
                self.write("if");
                self.unparse(&cond.cond, true)?;
                self.fill(&cond.then_fodder, true, true)?;
                self.write("then");
                self.unparse(&cond.branch_true, true)?;
                if let Some(branch_false) = &cond.branch_false {
                    self.fill(&cond.else_fodder, true, true)?;
                    self.write("else");
                    self.unparse(branch_false, true)?;
                }
            }
            NodeKind::Dollar => self.write("$"),
            NodeKind::Error(expr) => {
                self.write("error");
                self.unparse(expr, true)?;
            }
            NodeKind::Function(function) => {
                self.write("function");
                self.params(&function.params)?;
                self.unparse(&function.body, true)?;
            }
            NodeKind::Import(file) => {
                self.write("import");
                self.unparse(file, true)?;
            }
            NodeKind::ImportStr(file) => {
                self.write("importstr");
                self.unparse(file, true)?;
            }
            NodeKind::ImportBin(file) => {
                self.write("importbin");
                self.unparse(file, true)?;
            }
            NodeKind::InSuper(in_super) => {
                self.unparse(&in_super.index, crowded)?;
                self.fill(&in_super.in_fodder, true, true)?;
                self.write("in");
                self.fill(&in_super.super_fodder, true, true)?;
                self.write("super");
            }
            NodeKind::Index(index) => {
                self.unparse(&index.target, crowded)?;
                self.fill(&index.left_bracket_fodder, false, false)?;
                match (&index.id, &index.index) {
                    (Some(id), _) => {
                        self.write(".");
                        self.fill(&index.right_bracket_fodder, false, false)?;
                        self.write(id);
                    }
                    (None, Some(expr)) => {
                        self.write("[");
                        self.unparse(expr, false)?;
                        self.fill(&index.right_bracket_fodder, false, false)?;
                        self.write("]");
                    }
                    (None, None) => {
                        return Err(FormatError::new("index", "neither an id nor an index expression"));
                    }
                }
            }
            NodeKind::LiteralBoolean(value) => self.write(if *value { "true" } else { "false" }),
            NodeKind::LiteralNull => self.write("null"),
            NodeKind::LiteralNumber(text) => self.write(text),
            NodeKind::LiteralString(lit) => self.string(lit)?,
            NodeKind::Local(local) => {
                if local.binds.is_empty() {
                    return Err(FormatError::new("local", "no bindings"));
                }
                self.write("local");
                for (i, bind) in local.binds.iter().enumerate() {
                    if i > 0 {
                        self.write(",");
                    }
                    self.fill(&bind.var_fodder, true, true)?;
                    self.write(&bind.variable);
                    if let Some(fun) = &bind.fun {
                        self.params(fun)?;
                    }
                    self.fill(&bind.eq_fodder, true, true)?;
                    self.write("=");
                    self.unparse(&bind.body, true)?;
                    self.fill(&bind.close_fodder, false, false)?;
                }
                self.write(";");
                self.unparse(&local.body, true)?;
            }
            NodeKind::Object(object) => {
                self.write("{");
                self.fields(&object.fields, self.options.pad_objects)?;
                if object.trailing_comma {
                    self.write(",");
                }
                self.fill(&object.close_fodder, !object.fields.is_empty(), self.options.pad_objects)?;
                self.write("}");
            }
            NodeKind::ObjectComp(comp) => {
                self.write("{");
                self.fields(&comp.fields, self.options.pad_objects)?;
                self.fill(&comp.trailing_comma_fodder, false, false)?;
                if comp.trailing_comma {
                    self.write(",");
                }
                self.specs(&comp.spec)?;
                self.fill(&comp.close_fodder, true, self.options.pad_objects)?;
                self.write("}");
            }
            NodeKind::Parens(parens) => {
                self.write("(");
                self.unparse(&parens.inner, false)?;
                self.fill(&parens.close_fodder, false, false)?;
                self.write(")");
            }
            NodeKind::SelfObject => self.write("self"),
            NodeKind::Slice(slice) => {
                self.unparse(&slice.target, crowded)?;
                self.fill(&slice.left_bracket_fodder, false, false)?;
                self.write("[");
                if let Some(begin) = &slice.begin_index {
                    self.unparse(begin, false)?;
                }
                self.fill(&slice.end_colon_fodder, false, false)?;
                self.write(":");
                if let Some(end) = &slice.end_index {
                    self.unparse(end, false)?;
                }
                if slice.step.is_some() || !slice.step_colon_fodder.is_empty() {
                    self.fill(&slice.step_colon_fodder, false, false)?;
                    self.write(":");
                    if let Some(step) = &slice.step {
                        self.unparse(step, false)?;
                    }
                }
                self.fill(&slice.right_bracket_fodder, false, false)?;
                self.write("]");
            }
            NodeKind::SuperIndex(super_index) => {
                self.write("super");
                self.fill(&super_index.dot_fodder, false, false)?;
                match (&super_index.id, &super_index.index) {
                    (Some(id), _) => {
                        self.write(".");
                        self.fill(&super_index.id_fodder, false, false)?;
                        self.write(id);
                    }
                    (None, Some(index)) => {
                        self.write("[");
                        self.unparse(index, false)?;
                        self.fill(&super_index.id_fodder, false, false)?;
                        self.write("]");
                    }
                    (None, None) => {
                        return Err(FormatError::new("super index", "neither an id nor an index expression"));
                    }
                }
            }
            NodeKind::Unary(unary) => {
                self.write(unary.op.as_str());
                self.unparse(&unary.expr, false)?;
            }
            NodeKind::Var(id) => self.write(id),
        }
        Ok(())
    }
}

fn field_id(field: &ObjectField) -> Result<&str> {
    field
        .id
        .as_deref()
        .ok_or_else(|| FormatError::new("object field", "field has no id"))
}

fn field_key(field: &ObjectField) -> Result<&Node> {
    field
        .expr1
        .as_deref()
        .ok_or_else(|| FormatError::new("object field", "field has no key expression"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_snippet;

    fn print(source: &str) -> String {
        let (node, fodder) = parse_snippet("t.jsonnet", source).unwrap();
        let options = Options::default();
        let mut unparser = Unparser::new(&options);
        unparser.unparse(&node, false).unwrap();
        unparser.fill_final(&fodder, true, false, true).unwrap();
        unparser.finish()
    }

    #[test]
    fn prints_the_source_layout() {
        assert_eq!(print("local a = { b: 1 }; a.b"), "local a = { b: 1 }; a.b\n");
        assert_eq!(print("f(1, b=2) tailstrict"), "f(1, b=2) tailstrict\n");
        assert_eq!(print("x[1:2:3]"), "x[1:2:3]\n");
        assert_eq!(print("{ a+:: 1 }"), "{ a+:: 1 }\n");
    }

    #[test]
    fn block_string_is_reindented() {
        let mut lit = LiteralString::new("a\n\nb\n", LiteralStringKind::Block);
        lit.block_indent = "  ".into();
        let options = Options::default();
        let mut unparser = Unparser::new(&options);
        unparser.string(&lit).unwrap();
        assert_eq!(unparser.buf, "|||\n  a\n\n  b\n|||");
    }

    #[test]
    fn chomped_block_string_gets_a_dash() {
        let lit = LiteralString::new("a", LiteralStringKind::Block);
        let options = Options::default();
        let mut unparser = Unparser::new(&options);
        unparser.string(&lit).unwrap();
        assert_eq!(unparser.buf, "|||-\na\n|||");
    }

    #[test]
    fn verbatim_quotes_are_doubled() {
        let lit = LiteralString::new("it's", LiteralStringKind::VerbatimSingle);
        let options = Options::default();
        let mut unparser = Unparser::new(&options);
        unparser.string(&lit).unwrap();
        assert_eq!(unparser.buf, "@'it''s'");
    }

    #[test]
    fn unrenderable_trees_are_errors() {
        let local = Node::bare(NodeKind::Local(Local {
            binds: Vec::new(),
            body: Box::new(Node::bare(NodeKind::LiteralNull)),
        }));
        let options = Options::default();
        let err = Unparser::new(&options).unparse(&local, false).unwrap_err();
        assert_eq!(err.to_string(), "cannot format local: no bindings");

        let empty_block = LiteralString::new("", LiteralStringKind::Block);
        assert!(Unparser::new(&options).string(&empty_block).is_err());
    }
}

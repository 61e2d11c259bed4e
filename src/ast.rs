use crate::utils::with_stack;
use std::sync::Arc;

pub type Identifier = String;

// --- Trivia ---

/// The role a fodder element plays in the source layout.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FodderKind {
    /// Ends the current line, optionally with a trailing `//` or `#` comment.
    LineEnd,
    /// A `/* */` comment sitting between two tokens on the same line.
    Interstitial,
    /// One or more comment lines that start on a fresh line.
    Paragraph,
}

/// A single unit of trivia: a comment, a line break, or both.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FodderElement {
    pub kind: FodderKind,
    /// Number of blank lines after the element.
    pub blanks: usize,
    /// Indentation of the line that follows the element.
    pub indent: usize,
    pub comment: Vec<String>,
}

impl FodderElement {
    pub fn new(kind: FodderKind, blanks: usize, indent: usize, comment: Vec<String>) -> Self {
        Self {
            kind,
            blanks,
            indent,
            comment,
        }
    }

    pub fn line_end() -> Self {
        Self::new(FodderKind::LineEnd, 0, 0, Vec::new())
    }

    /// Number of newline characters this element stands for when printed.
    pub fn count_newlines(&self) -> usize {
        match self.kind {
            FodderKind::Interstitial => 0,
            FodderKind::LineEnd => 1,
            FodderKind::Paragraph => self.comment.len() + self.blanks,
        }
    }
}

/// Trivia attached in front of a token, in source order.
pub type Fodder = Vec<FodderElement>;

// --- Locations ---

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// The full text of a parsed file, kept for diagnostics only.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Source {
    pub diagnostic_file_name: String,
    pub lines: Vec<String>,
}

impl Source {
    pub fn new(diagnostic_file_name: &str, text: &str) -> Self {
        Self {
            diagnostic_file_name: diagnostic_file_name.to_string(),
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct LocationRange {
    pub file_name: String,
    pub file: Option<Arc<Source>>,
    pub begin: Location,
    pub end: Location,
}

// --- Nodes ---

/// Fields every node carries regardless of its kind.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct NodeBase {
    /// Trivia in front of the node's first token.
    pub fodder: Fodder,
    pub context: Option<String>,
    pub free_vars: Vec<Identifier>,
    pub loc_range: LocationRange,
}

#[derive(Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub base: NodeBase,
}

impl Clone for Node {
    fn clone(&self) -> Self {
        with_stack(|| Self {
            kind: self.kind.clone(),
            base: self.base.clone(),
        })
    }
}

impl Node {
    pub fn new(kind: NodeKind, fodder: Fodder, loc_range: LocationRange) -> Self {
        Self {
            kind,
            base: NodeBase {
                fodder,
                loc_range,
                ..NodeBase::default()
            },
        }
    }

    /// A node with an empty base, handy for building trees by hand.
    pub fn bare(kind: NodeKind) -> Self {
        Self {
            kind,
            base: NodeBase::default(),
        }
    }

    /// The sub-expression printed first, for nodes whose syntax starts with one.
    pub fn left_recursive(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Apply(apply) => Some(&apply.target),
            NodeKind::ApplyBrace(apply) => Some(&apply.left),
            NodeKind::Binary(binary) => Some(&binary.left),
            NodeKind::Index(index) => Some(&index.target),
            NodeKind::InSuper(in_super) => Some(&in_super.index),
            NodeKind::Slice(slice) => Some(&slice.target),
            _ => None,
        }
    }

    /// The fodder in front of the leftmost token of this expression.
    pub fn open_fodder(&self) -> &Fodder {
        let mut node = self;
        while let Some(left) = node.left_recursive() {
            node = left;
        }
        &node.base.fodder
    }

    pub fn open_fodder_mut(&mut self) -> &mut Fodder {
        let mut node = self;
        loop {
            node = match &mut node.kind {
                NodeKind::Apply(apply) => &mut *apply.target,
                NodeKind::ApplyBrace(apply) => &mut *apply.left,
                NodeKind::Binary(binary) => &mut *binary.left,
                NodeKind::Index(index) => &mut *index.target,
                NodeKind::InSuper(in_super) => &mut *in_super.index,
                NodeKind::Slice(slice) => &mut *slice.target,
                _ => return &mut node.base.fodder,
            };
        }
    }
}

/// Drops a tree without recursing along its chains. Operator chains, postfix
/// chains and `local` sequences grow one level per term, and a derived drop
/// spends a stack frame on each level.
pub fn dismantle(root: Node) {
    let mut pending = vec![root];
    while let Some(mut node) = pending.pop() {
        let spine: [Option<&mut Box<Node>>; 2] = match &mut node.kind {
            NodeKind::Apply(apply) => [Some(&mut apply.target), None],
            NodeKind::ApplyBrace(apply) => [Some(&mut apply.left), Some(&mut apply.right)],
            NodeKind::Assert(assert) => [Some(&mut assert.rest), None],
            NodeKind::Binary(binary) => [Some(&mut binary.left), Some(&mut binary.right)],
            NodeKind::Conditional(cond) => [cond.branch_false.as_mut(), None],
            NodeKind::Index(index) => [Some(&mut index.target), None],
            NodeKind::InSuper(in_super) => [Some(&mut in_super.index), None],
            NodeKind::Local(local) => [Some(&mut local.body), None],
            NodeKind::Slice(slice) => [Some(&mut slice.target), None],
            _ => [None, None],
        };
        for slot in spine.into_iter().flatten() {
            pending.push(std::mem::replace(&mut **slot, Node::bare(NodeKind::Dollar)));
        }
    }
}

/// The closed set of Jsonnet syntax forms.
#[derive(Debug, PartialEq, Clone)]
pub enum NodeKind {
    Apply(Apply),
    ApplyBrace(ApplyBrace),
    Array(Array),
    ArrayComp(ArrayComp),
    Assert(Assert),
    Binary(Binary),
    Conditional(Conditional),
    Dollar,
    Error(Box<Node>),
    Function(Function),
    Import(Box<Node>),
    ImportBin(Box<Node>),
    ImportStr(Box<Node>),
    InSuper(InSuper),
    Index(Index),
    LiteralBoolean(bool),
    LiteralNull,
    /// The number exactly as written in the source.
    LiteralNumber(String),
    LiteralString(LiteralString),
    Local(Local),
    Object(Object),
    ObjectComp(ObjectComp),
    Parens(Parens),
    SelfObject,
    Slice(Slice),
    SuperIndex(SuperIndex),
    Unary(Unary),
    Var(Identifier),
}

impl NodeKind {
    /// Wire names of every kind, in declaration order.
    pub const ALL_NAMES: [&'static str; 28] = [
        "Apply",
        "ApplyBrace",
        "Array",
        "ArrayComp",
        "Assert",
        "Binary",
        "Conditional",
        "Dollar",
        "Error",
        "Function",
        "Import",
        "ImportBin",
        "ImportStr",
        "InSuper",
        "Index",
        "LiteralBoolean",
        "LiteralNull",
        "LiteralNumber",
        "LiteralString",
        "Local",
        "Object",
        "ObjectComp",
        "Parens",
        "Self",
        "Slice",
        "SuperIndex",
        "Unary",
        "Var",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Apply(_) => "Apply",
            NodeKind::ApplyBrace(_) => "ApplyBrace",
            NodeKind::Array(_) => "Array",
            NodeKind::ArrayComp(_) => "ArrayComp",
            NodeKind::Assert(_) => "Assert",
            NodeKind::Binary(_) => "Binary",
            NodeKind::Conditional(_) => "Conditional",
            NodeKind::Dollar => "Dollar",
            NodeKind::Error(_) => "Error",
            NodeKind::Function(_) => "Function",
            NodeKind::Import(_) => "Import",
            NodeKind::ImportBin(_) => "ImportBin",
            NodeKind::ImportStr(_) => "ImportStr",
            NodeKind::InSuper(_) => "InSuper",
            NodeKind::Index(_) => "Index",
            NodeKind::LiteralBoolean(_) => "LiteralBoolean",
            NodeKind::LiteralNull => "LiteralNull",
            NodeKind::LiteralNumber(_) => "LiteralNumber",
            NodeKind::LiteralString(_) => "LiteralString",
            NodeKind::Local(_) => "Local",
            NodeKind::Object(_) => "Object",
            NodeKind::ObjectComp(_) => "ObjectComp",
            NodeKind::Parens(_) => "Parens",
            NodeKind::SelfObject => "Self",
            NodeKind::Slice(_) => "Slice",
            NodeKind::SuperIndex(_) => "SuperIndex",
            NodeKind::Unary(_) => "Unary",
            NodeKind::Var(_) => "Var",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Apply {
    pub target: Box<Node>,
    pub fodder_left: Fodder,
    pub arguments: Arguments,
    pub trailing_comma: bool,
    pub fodder_right: Fodder,
    pub tail_strict: bool,
    pub tail_strict_fodder: Fodder,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Arguments {
    pub positional: Vec<CommaSeparatedExpr>,
    pub named: Vec<NamedArgument>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommaSeparatedExpr {
    pub expr: Node,
    /// Fodder in front of the comma that follows the expression.
    pub comma_fodder: Fodder,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NamedArgument {
    pub name_fodder: Fodder,
    pub name: Identifier,
    pub eq_fodder: Fodder,
    pub arg: Node,
    pub comma_fodder: Fodder,
}

/// `left { ... }`, the implicit `+` between an expression and an object.
#[derive(Debug, PartialEq, Clone)]
pub struct ApplyBrace {
    pub left: Box<Node>,
    pub right: Box<Node>,
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Array {
    pub elements: Vec<CommaSeparatedExpr>,
    pub trailing_comma: bool,
    pub close_fodder: Fodder,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ArrayComp {
    pub body: Box<Node>,
    pub trailing_comma_fodder: Fodder,
    pub trailing_comma: bool,
    pub spec: ForSpec,
    pub close_fodder: Fodder,
}

/// One `for x in e if c ...` clause. Nested clauses link to the clause written
/// before them through `outer`.
#[derive(Debug, PartialEq, Clone)]
pub struct ForSpec {
    pub for_fodder: Fodder,
    pub var_fodder: Fodder,
    pub var_name: Identifier,
    pub in_fodder: Fodder,
    pub expr: Box<Node>,
    pub conditions: Vec<IfSpec>,
    pub outer: Option<Box<ForSpec>>,
}

impl ForSpec {
    /// The clauses from the outermost to this one, in source order.
    pub fn chain(&self) -> Vec<&ForSpec> {
        let mut specs = Vec::new();
        let mut current = Some(self);
        while let Some(spec) = current {
            specs.push(spec);
            current = spec.outer.as_deref();
        }
        specs.reverse();
        specs
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct IfSpec {
    pub if_fodder: Fodder,
    pub expr: Node,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Assert {
    pub cond: Box<Node>,
    pub colon_fodder: Fodder,
    pub message: Option<Box<Node>>,
    pub semicolon_fodder: Fodder,
    pub rest: Box<Node>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Mult,
    Div,
    Percent,
    Plus,
    Minus,
    ShiftL,
    ShiftR,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    In,
    ManifestEqual,
    ManifestUnequal,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Mult => "*",
            BinaryOp::Div => "/",
            BinaryOp::Percent => "%",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::ShiftL => "<<",
            BinaryOp::ShiftR => ">>",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::In => "in",
            BinaryOp::ManifestEqual => "==",
            BinaryOp::ManifestUnequal => "!=",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "*" => BinaryOp::Mult,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Percent,
            "+" => BinaryOp::Plus,
            "-" => BinaryOp::Minus,
            "<<" => BinaryOp::ShiftL,
            ">>" => BinaryOp::ShiftR,
            ">" => BinaryOp::Greater,
            ">=" => BinaryOp::GreaterEq,
            "<" => BinaryOp::Less,
            "<=" => BinaryOp::LessEq,
            "in" => BinaryOp::In,
            "==" => BinaryOp::ManifestEqual,
            "!=" => BinaryOp::ManifestUnequal,
            "&" => BinaryOp::BitwiseAnd,
            "^" => BinaryOp::BitwiseXor,
            "|" => BinaryOp::BitwiseOr,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Binding strength; lower binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mult | BinaryOp::Div | BinaryOp::Percent => 5,
            BinaryOp::Plus | BinaryOp::Minus => 6,
            BinaryOp::ShiftL | BinaryOp::ShiftR => 7,
            BinaryOp::Greater
            | BinaryOp::GreaterEq
            | BinaryOp::Less
            | BinaryOp::LessEq
            | BinaryOp::In => 8,
            BinaryOp::ManifestEqual | BinaryOp::ManifestUnequal => 9,
            BinaryOp::BitwiseAnd => 10,
            BinaryOp::BitwiseXor => 11,
            BinaryOp::BitwiseOr => 12,
            BinaryOp::And => 13,
            BinaryOp::Or => 14,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Binary {
    pub left: Box<Node>,
    pub op_fodder: Fodder,
    pub op: BinaryOp,
    pub right: Box<Node>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Conditional {
    pub cond: Box<Node>,
    pub then_fodder: Fodder,
    pub branch_true: Box<Node>,
    pub else_fodder: Fodder,
    pub branch_false: Option<Box<Node>>,
}

/// A parenthesised parameter list, shared by `function`, `local f(x) = ...`
/// and method fields.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Params {
    pub paren_left_fodder: Fodder,
    pub parameters: Vec<Parameter>,
    pub trailing_comma: bool,
    pub paren_right_fodder: Fodder,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Function {
    pub params: Params,
    pub body: Box<Node>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parameter {
    pub name_fodder: Fodder,
    pub name: Identifier,
    pub eq_fodder: Fodder,
    pub default_arg: Option<Box<Node>>,
    pub comma_fodder: Fodder,
    pub loc_range: LocationRange,
}

/// `e in super`
#[derive(Debug, PartialEq, Clone)]
pub struct InSuper {
    pub index: Box<Node>,
    pub in_fodder: Fodder,
    pub super_fodder: Fodder,
}

/// `target.id` or `target[index]`. Exactly one of `id` and `index` is set.
#[derive(Debug, PartialEq, Clone)]
pub struct Index {
    pub target: Box<Node>,
    /// Fodder before `[`, or before `.` for the id form.
    pub left_bracket_fodder: Fodder,
    pub index: Option<Box<Node>>,
    /// Fodder before `]`, or before the id for the id form.
    pub right_bracket_fodder: Fodder,
    pub id: Option<Identifier>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LiteralStringKind {
    Single,
    Double,
    Block,
    VerbatimDouble,
    VerbatimSingle,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LiteralString {
    /// For quoted strings the escape sequences are kept as written.
    pub value: String,
    pub kind: LiteralStringKind,
    pub block_indent: String,
    pub block_term_indent: String,
}

impl LiteralString {
    pub fn new(value: impl Into<String>, kind: LiteralStringKind) -> Self {
        Self {
            value: value.into(),
            kind,
            block_indent: String::new(),
            block_term_indent: String::new(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Local {
    pub binds: Vec<LocalBind>,
    pub body: Box<Node>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LocalBind {
    pub var_fodder: Fodder,
    pub variable: Identifier,
    /// Set for the `local f(x) = body` sugar.
    pub fun: Option<Params>,
    pub eq_fodder: Fodder,
    pub body: Node,
    /// Fodder in front of the `,` or `;` that closes the bind.
    pub close_fodder: Fodder,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ObjectFieldKind {
    Assert,
    FieldId,
    FieldExpr,
    FieldStr,
    Local,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ObjectFieldHide {
    /// `::`
    Hidden,
    /// `:`
    Inherit,
    /// `:::`
    Visible,
}

impl ObjectFieldHide {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectFieldHide::Hidden => "::",
            ObjectFieldHide::Inherit => ":",
            ObjectFieldHide::Visible => ":::",
        }
    }
}

/// A member of an object literal. Which expressions are meaningful depends on
/// `kind`:
///
/// * `FieldId`: `fodder1 id [method] op_fodder : expr2`
/// * `FieldStr`: `expr1 [method] op_fodder : expr2`
/// * `FieldExpr`: `fodder1 [ expr1 fodder2 ] [method] op_fodder : expr2`
/// * `Local`: `fodder1 local fodder2 id [method] op_fodder = expr2`
/// * `Assert`: `fodder1 assert expr2 [op_fodder : expr3]`
#[derive(Debug, PartialEq, Clone)]
pub struct ObjectField {
    pub kind: ObjectFieldKind,
    pub hide: ObjectFieldHide,
    /// `+:` instead of `:`.
    pub super_sugar: bool,
    pub method: Option<Params>,
    pub fodder1: Fodder,
    pub id: Option<Identifier>,
    pub expr1: Option<Box<Node>>,
    pub fodder2: Fodder,
    pub op_fodder: Fodder,
    pub expr2: Box<Node>,
    pub expr3: Option<Box<Node>>,
    pub comma_fodder: Fodder,
    pub loc_range: LocationRange,
}

impl ObjectField {
    /// The fodder in front of the field's first token.
    pub fn open_fodder(&self) -> &Fodder {
        match (&self.kind, &self.expr1) {
            (ObjectFieldKind::FieldStr, Some(expr1)) => expr1.open_fodder(),
            _ => &self.fodder1,
        }
    }

    pub fn open_fodder_mut(&mut self) -> &mut Fodder {
        match (&self.kind, &mut self.expr1) {
            (ObjectFieldKind::FieldStr, Some(expr1)) => expr1.open_fodder_mut(),
            _ => &mut self.fodder1,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct Object {
    pub fields: Vec<ObjectField>,
    pub trailing_comma: bool,
    pub close_fodder: Fodder,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ObjectComp {
    pub fields: Vec<ObjectField>,
    pub trailing_comma_fodder: Fodder,
    pub trailing_comma: bool,
    pub spec: ForSpec,
    pub close_fodder: Fodder,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Parens {
    pub inner: Box<Node>,
    pub close_fodder: Fodder,
}

/// `target[begin:end:step]`
#[derive(Debug, PartialEq, Clone)]
pub struct Slice {
    pub target: Box<Node>,
    pub left_bracket_fodder: Fodder,
    pub begin_index: Option<Box<Node>>,
    pub end_colon_fodder: Fodder,
    pub end_index: Option<Box<Node>>,
    pub step_colon_fodder: Fodder,
    pub step: Option<Box<Node>>,
    pub right_bracket_fodder: Fodder,
}

/// `super.id` or `super[index]`.
#[derive(Debug, PartialEq, Clone)]
pub struct SuperIndex {
    pub dot_fodder: Fodder,
    pub index: Option<Box<Node>>,
    /// Fodder before the id, or before `]` for the bracket form.
    pub id_fodder: Fodder,
    pub id: Option<Identifier>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Not,
    BitwiseNot,
    Plus,
    Minus,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "!" => Some(UnaryOp::Not),
            "~" => Some(UnaryOp::BitwiseNot),
            "+" => Some(UnaryOp::Plus),
            "-" => Some(UnaryOp::Minus),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Unary {
    pub op: UnaryOp,
    pub expr: Box<Node>,
}

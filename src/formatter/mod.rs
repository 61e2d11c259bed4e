//! Canonical Jsonnet formatting.
//!
//! A tree is normalised by a fixed sequence of passes, each rewriting fodder
//! or node shapes in place, and is then printed by the unparser. Every
//! layout decision ends up in the fodder, so the printer itself stays simple.

mod fodder;
mod imports;
mod indent;
mod newlines;
mod pass;
pub(crate) mod strings;
mod style;
mod unparser;

use crate::ast::{dismantle, Fodder, Node, NodeKind};
use crate::error::FormatError;
use log::trace;
use pass::Pass;
use serde::{Deserialize, Serialize};

/// Preferred quote for string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringStyle {
    Double,
    Single,
    Leave,
}

/// Preferred marker for line comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentStyle {
    Hash,
    Slash,
    Leave,
}

/// Which trivia to throw away before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strip {
    #[default]
    Nothing,
    Comments,
    Everything,
    AllButComments,
}

/// Formatter settings. The defaults are the canonical style that manifested
/// trees are printed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Spaces per nesting level. Zero keeps the indentation found in the tree.
    pub indent: usize,
    pub max_blank_lines: usize,
    pub string_style: StringStyle,
    pub comment_style: CommentStyle,
    pub pretty_field_names: bool,
    pub pad_arrays: bool,
    pub pad_objects: bool,
    pub sort_imports: bool,
    /// Rewrite `a + { ... }` as `a { ... }`.
    pub implicit_plus: bool,
    pub strip: Strip,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            indent: 2,
            max_blank_lines: 2,
            string_style: StringStyle::Single,
            comment_style: CommentStyle::Slash,
            pretty_field_names: true,
            pad_arrays: false,
            pad_objects: true,
            sort_imports: true,
            implicit_plus: true,
            strip: Strip::Nothing,
        }
    }
}

fn run(name: &str, pass: &mut impl Pass, root: &mut Node, final_fodder: &mut Fodder) -> Result<(), FormatError> {
    trace!("formatter pass: {name}");
    pass.file(root, final_fodder)
}

/// Formats a tree. `final_fodder` is the trivia after the last token of the
/// file. The input is left untouched.
pub fn format_node(node: &Node, final_fodder: &Fodder, options: &Options) -> Result<String, FormatError> {
    let mut root = node.clone();
    let formatted = run_passes(&mut root, final_fodder, options);
    dismantle(root);
    formatted
}

fn run_passes(root: &mut Node, final_fodder: &Fodder, options: &Options) -> Result<String, FormatError> {
    let mut final_fodder = final_fodder.clone();

    if options.strip != Strip::Nothing {
        run("strip", &mut style::StripFodder(options.strip), root, &mut final_fodder)?;
    }
    if options.sort_imports {
        trace!("formatter pass: sort imports");
        *root = imports::sort_imports(std::mem::replace(root, Node::bare(NodeKind::Dollar)));
    }
    run("fix newlines", &mut newlines::FixNewlines, root, &mut final_fodder)?;
    run("fix trailing commas", &mut style::FixTrailingCommas, root, &mut final_fodder)?;
    run("fix parens", &mut style::FixParens, root, &mut final_fodder)?;
    if options.implicit_plus {
        run("fix plus object", &mut style::FixPlusObject, root, &mut final_fodder)?;
    }
    run(
        "no redundant slice colon",
        &mut style::NoRedundantSliceColon,
        root,
        &mut final_fodder,
    )?;
    if options.string_style != StringStyle::Leave {
        run(
            "string style",
            &mut style::EnforceStringStyle(options.string_style),
            root,
            &mut final_fodder,
        )?;
    }
    if options.comment_style != CommentStyle::Leave {
        let mut pass = style::EnforceCommentStyle {
            style: options.comment_style,
            seen_first: false,
        };
        run("comment style", &mut pass, root, &mut final_fodder)?;
    }
    if options.indent > 0 {
        trace!("formatter pass: fix indentation");
        indent::FixIndentation::new(options).file(root, &mut final_fodder);
    }
    run(
        "max blank lines",
        &mut style::EnforceMaxBlankLines(options.max_blank_lines),
        root,
        &mut final_fodder,
    )?;
    if options.pretty_field_names {
        run("pretty field names", &mut style::PrettyFieldNames, root, &mut final_fodder)?;
    }

    let mut unparser = unparser::Unparser::new(options);
    unparser.unparse(root, false)?;
    unparser.fill_final(&final_fodder, true, false, true)?;
    Ok(unparser.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_snippet;

    fn format_with(source: &str, options: &Options) -> String {
        let (node, fodder) = parse_snippet("t.jsonnet", source).unwrap();
        format_node(&node, &fodder, options).unwrap()
    }

    fn format(source: &str) -> String {
        format_with(source, &Options::default())
    }

    #[test]
    fn canonical_text_is_a_fixed_point() {
        for source in [
            "{ a: 'foo', b: { c: $.a } }",
            "local a = 1; local foo(a, b) = a + b; foo(a, b=1)",
            "{ [a]: a + 1 for a in ['1', '2', '3'] if a == '2' }",
            "[a + b for a in [1, 2, 3] for b in [4, 5, 6]]",
            "if 1 > 0 then 1 else 0",
        ] {
            assert_eq!(format(source), format!("{source}\n"));
        }
    }

    #[test]
    fn expanded_object_gets_trailing_comma_and_indent() {
        assert_eq!(
            format("{a: 1,  // b is equal to two\n  b: 2}"),
            "{\n  a: 1,  // b is equal to two\n  b: 2,\n}\n"
        );
    }

    #[test]
    fn expanded_array() {
        assert_eq!(format("[1, // add two to array\n2]"), "[\n  1,  // add two to array\n  2,\n]\n");
    }

    #[test]
    fn quotes_and_field_names_are_normalised() {
        assert_eq!(format("{ \"a\": \"x\" }"), "{ a: 'x' }\n");
        assert_eq!(format("x[\"y\"]"), "x.y\n");
    }

    #[test]
    fn leave_keeps_the_string_style() {
        let options = Options {
            string_style: StringStyle::Leave,
            pretty_field_names: false,
            ..Options::default()
        };
        assert_eq!(format_with("{ \"a\": \"x\" }", &options), "{ \"a\": \"x\" }\n");
    }

    #[test]
    fn imports_are_sorted() {
        assert_eq!(
            format("local b = import 'b.libsonnet';\nlocal a = import 'a.libsonnet';\na + b"),
            "local a = import 'a.libsonnet';\nlocal b = import 'b.libsonnet';\na + b\n"
        );
    }

    #[test]
    fn strip_comments() {
        let options = Options {
            strip: Strip::Comments,
            ..Options::default()
        };
        assert_eq!(format_with("// gone\n1", &options), "1\n");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: Options = serde_json::from_value(serde_json::json!({
            "indent": 4,
            "stringStyle": "double"
        }))
        .unwrap();
        assert_eq!(options.indent, 4);
        assert_eq!(options.string_style, StringStyle::Double);
        assert!(options.pad_objects);
    }
}

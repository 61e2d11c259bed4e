//! Sorts runs of `local x = import '...';` at the top of the file by import
//! path. A run ends at a blank line, a comment on its own line, or anything
//! that is not a plain import bind. Comments trailing an import on the same
//! line move with it.

use super::fodder::{ensure_clean_newline, move_front, split};
use crate::ast::*;
use crate::utils::with_stack;
use std::collections::HashSet;

struct ImportElem {
    key: String,
    /// Fodder after the bind, up to and including its line break.
    adjacent: Fodder,
    bind: LocalBind,
}

fn is_import_local(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Local(local) => !local.binds.is_empty() && local
            .binds
            .iter()
            .all(|b| b.fun.is_none() && matches!(b.body.kind, NodeKind::Import(_))),
        _ => false,
    }
}

fn import_path(bind: &LocalBind) -> String {
    match &bind.body.kind {
        NodeKind::Import(file) => match &file.kind {
            NodeKind::LiteralString(path) => path.value.clone(),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn extract(mut binds: Vec<LocalBind>, after: Fodder, out: &mut Vec<ImportElem>) {
    let mut adjacents = Vec::with_capacity(binds.len());
    for bind in binds.iter_mut().skip(1) {
        let (adjacent, before_next) = split(std::mem::take(&mut bind.var_fodder));
        bind.var_fodder = before_next;
        adjacents.push(adjacent);
    }
    adjacents.push(after);
    for (bind, mut adjacent) in binds.into_iter().zip(adjacents) {
        ensure_clean_newline(&mut adjacent);
        out.push(ImportElem {
            key: import_path(&bind),
            adjacent,
            bind,
        });
    }
}

pub(crate) fn sort_imports(mut node: Node) -> Node {
    if !is_import_local(&node) {
        return node;
    }
    let group_fodder = std::mem::take(&mut node.base.fodder);
    let mut imports = Vec::new();
    let mut current = node;
    let rest = loop {
        let local = match current.kind {
            NodeKind::Local(local) => local,
            other => {
                current.kind = other;
                break current;
            }
        };
        let Local { binds, body } = local;
        let mut body = *body;
        let (adjacent, before_next) = split(std::mem::take(body.open_fodder_mut()));
        extract(binds, adjacent, &mut imports);
        *body.open_fodder_mut() = before_next;
        if is_import_local(&body) && body.base.fodder.is_empty() {
            current = body;
        } else {
            break body;
        }
    };

    let mut names = HashSet::new();
    if imports.iter().all(|elem| names.insert(elem.bind.variable.clone())) {
        imports.sort_by(|a, b| a.key.cmp(&b.key));
    }

    let mut body = with_stack(|| sort_imports(rest));
    if let Some(last) = imports.last_mut() {
        move_front(body.open_fodder_mut(), &mut last.adjacent);
    }
    let mut fodders: Vec<Fodder> = Vec::with_capacity(imports.len());
    fodders.push(group_fodder);
    for elem in imports.iter_mut() {
        fodders.push(std::mem::take(&mut elem.adjacent));
    }
    fodders.truncate(imports.len());
    for (elem, fodder) in imports.into_iter().zip(fodders).rev() {
        let kind = NodeKind::Local(Local {
            binds: vec![elem.bind],
            body: Box::new(body),
        });
        body = Node::new(kind, fodder, LocationRange::default());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_snippet;

    fn order(node: &Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = node;
        while let NodeKind::Local(local) = &current.kind {
            names.extend(local.binds.iter().map(|b| b.variable.clone()));
            current = &local.body;
        }
        names
    }

    fn sorted(source: &str) -> Node {
        let (node, _) = parse_snippet("t.jsonnet", source).unwrap();
        sort_imports(node)
    }

    #[test]
    fn sorts_by_import_path() {
        let node = sorted("local b = import 'b';\nlocal a = import 'a';\na + b");
        assert_eq!(order(&node), ["a", "b"]);
    }

    #[test]
    fn blank_line_separates_groups() {
        let node = sorted("local d = import 'd';\nlocal c = import 'c';\n\nlocal b = import 'b';\nlocal a = import 'a';\na");
        assert_eq!(order(&node), ["c", "d", "a", "b"]);
    }

    #[test]
    fn multi_bind_local_is_split() {
        let node = sorted("local b = import 'b', a = import 'a';\na");
        let NodeKind::Local(first) = &node.kind else { panic!("not a local") };
        assert_eq!(first.binds.len(), 1);
        assert_eq!(order(&node), ["a", "b"]);
    }

    #[test]
    fn duplicate_names_keep_their_order() {
        let node = sorted("local a = import 'z';\nlocal a = import 'y';\na");
        let paths: Vec<_> = {
            let mut paths = Vec::new();
            let mut current = &node;
            while let NodeKind::Local(local) = &current.kind {
                paths.push(import_path(&local.binds[0]));
                current = &local.body;
            }
            paths
        };
        assert_eq!(paths, ["z", "y"]);
    }

    #[test]
    fn non_import_locals_are_untouched() {
        let node = sorted("local b = 1;\nlocal a = import 'a';\na");
        assert_eq!(order(&node), ["b", "a"]);
    }
}

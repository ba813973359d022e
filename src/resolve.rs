//! Dependency closure over template invocation nodes.

use crate::error::Error;
use crate::template::{Node, ParsedTemplate, Tree};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

/// Breadth-first walk from `root_name` over every invocation node, in
/// first-discovery order with the root first.
///
/// The returned list is the closure of all templates that will execute when
/// the root renders, and is exactly the key set the asset collector reads.
/// A name that resolves to no tree in `template` is a hard error: silently
/// skipping it would also silently drop the CSS/JS/hooks registered
/// against it.
pub fn resolve(template: &ParsedTemplate, root_name: &str) -> Result<Vec<String>, Error> {
    let root = template
        .tree(root_name)
        .ok_or_else(|| Error::TemplateNotFound {
            referenced_name: root_name.to_string(),
            referenced_from: None,
        })?;

    let mut order = vec![root_name.to_string()];
    let mut seen: FxHashSet<String> = FxHashSet::default();
    seen.insert(root_name.to_string());

    let mut queue: VecDeque<&Tree> = VecDeque::new();
    queue.push_back(root);
    while let Some(tree) = queue.pop_front() {
        let mut found = Vec::new();
        collect_invocations(&tree.root, &mut found);
        for name in found {
            if !seen.insert(name.clone()) {
                continue;
            }
            match template.tree(&name) {
                Some(dep) => queue.push_back(dep),
                None => {
                    return Err(Error::TemplateNotFound {
                        referenced_name: name,
                        referenced_from: Some(tree.name.clone()),
                    });
                }
            }
            order.push(name);
        }
    }
    Ok(order)
}

/// Append every invoked name under `nodes` in document order, descending
/// into conditional and loop bodies.
fn collect_invocations(nodes: &[Node], out: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Invoke(name) => out.push(name.clone()),
            Node::If { then, otherwise, .. } => {
                collect_invocations(then, out);
                collect_invocations(otherwise, out);
            }
            Node::Range { body, .. } => collect_invocations(body, out),
            _ => {}
        }
    }
}

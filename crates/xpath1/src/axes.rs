//! Contains pure functions for collecting nodes along each XPath axis.
//!
//! Every collector appends in axis order: document order for forward axes,
//! reverse document order for `ancestor`, `ancestor-or-self`, `preceding`
//! and `preceding-sibling`.

use arbor_tree::Node;

fn has_siblings(node: Node<'_>) -> bool {
    !(node.is_attribute() || node.is_namespace())
}

pub fn collect_self_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.push(node);
}

pub fn collect_child_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.attributes());
}

pub fn collect_namespace_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.namespaces());
}

pub fn collect_descendant_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.descendants());
}

pub fn collect_descendant_or_self_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.push(node);
    results.extend(node.descendants());
}

pub fn collect_parent_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.parent());
}

pub fn collect_ancestor_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.ancestors());
}

pub fn collect_ancestor_or_self_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.push(node);
    results.extend(node.ancestors());
}

pub fn collect_following_sibling_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    if has_siblings(node) {
        results.extend(std::iter::successors(node.next_sibling(), |n| {
            n.next_sibling()
        }));
    }
}

pub fn collect_preceding_sibling_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    if has_siblings(node) {
        results.extend(std::iter::successors(node.prev_sibling(), |n| {
            n.prev_sibling()
        }));
    }
}

pub fn collect_following_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.following());
}

pub fn collect_preceding_nodes<'t>(node: Node<'t>, results: &mut Vec<Node<'t>>) {
    results.extend(node.preceding());
}

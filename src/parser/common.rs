use tree_sitter::Node;

/// Extract text from a node
pub fn node_text<'a>(node: Node<'a>, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// 1-indexed line of a node, shifted by an offset for embedded snippets
pub fn node_line(node: Node, offset: usize) -> usize {
    node.start_position().row + 1 + offset
}

/// Find child node by field name
pub fn child_by_field<'a>(node: Node<'a>, field: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field)
}

/// All named children of a node
pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// All children of a specific kind
pub fn children_of_kind<'a>(node: Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect()
}

/// Literal value of a Python string node, ignoring interpolations
pub fn string_value(node: Node, source: &str) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut value = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string_content" {
            value.push_str(node_text(child, source));
        }
    }
    Some(value)
}

/// Value of a string node or the text of a bare identifier
pub fn string_or_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => string_value(node, source),
        "identifier" => Some(node_text(node, source).to_string()),
        _ => None,
    }
}

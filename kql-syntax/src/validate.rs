use crate::{
    ast::{Ast, Node},
    error::{Error, Result},
};

/// Checks the structural rules the grammar cannot express.
///
/// The root sequence and every group must not open with AND/OR, and inside a
/// keyed group no descendant may carry a key of its own. Unkeyed groups nested
/// in a keyed group inherit its key.
pub fn validate_query(ast: &Ast) -> Result<()> {
    validate_nodes(&ast.nodes, false)
}

fn validate_nodes(nodes: &[Node], keyed: bool) -> Result<()> {
    if let Some(Node::Operator(op)) = nodes.first() {
        if op.value.is_binary() {
            return Err(Error::StartsWithBinaryOperator { node: op.clone() });
        }
    }

    for node in nodes {
        if keyed && !node.key().is_empty() {
            return Err(Error::NamedGroupInvalidNodes { node: node.clone() });
        }
        if let Node::Group(group) = node {
            validate_nodes(&group.nodes, keyed || !group.key.is_empty())?;
        }
    }
    Ok(())
}

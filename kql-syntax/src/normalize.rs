use crate::{
    ast::{Ast, BoolOp, Location, Node, OperatorNode},
    error::{Error, Result},
};

/// Makes every connection between operands explicit.
///
/// - A run of operators between two operands collapses to one binary
///   connector plus at most one NOT (an even number of NOTs cancels out).
/// - Without an explicit AND/OR the connector is OR when both operands
///   restrict the same property (case-insensitive) and AND otherwise; a
///   negated right-hand operand always gets AND.
/// - Trailing operators are dropped and groups are normalized recursively.
///
/// Applying the pass to its own output returns the same tree.
pub fn normalize_query(mut ast: Ast) -> Result<Ast> {
    ast.nodes = normalize_nodes(std::mem::take(&mut ast.nodes))?;
    Ok(ast)
}

pub fn normalize_nodes(nodes: Vec<Node>) -> Result<Vec<Node>> {
    let mut connected = Vec::with_capacity(nodes.len() * 2);
    let mut pending: Vec<OperatorNode> = Vec::new();
    let mut previous_key: Option<String> = None;

    for node in nodes {
        let mut operand = match node {
            Node::Operator(op) => {
                pending.push(op);
                continue;
            }
            operand => operand,
        };
        if let Node::Group(group) = &mut operand {
            group.nodes = normalize_nodes(std::mem::take(&mut group.nodes))?;
            if group.nodes.is_empty() {
                continue;
            }
        }

        let key = operand.key().to_ascii_lowercase();
        let run = std::mem::take(&mut pending);
        match &previous_key {
            None => connected.extend(leading_operators(run)?),
            Some(previous) => {
                let at = operand.loc().start;
                connected.extend(connect(previous, &key, run, at));
            }
        }
        previous_key = Some(key);
        connected.push(operand);
    }

    if previous_key.is_none() {
        // operators only: a binary one can never be valid here
        leading_operators(pending)?;
    }
    Ok(connected)
}

/// Operators in front of the first operand: NOT is allowed, AND/OR is not.
fn leading_operators(run: Vec<OperatorNode>) -> Result<Vec<Node>> {
    if let Some(binary) = run.iter().find(|op| op.value.is_binary()) {
        return Err(Error::StartsWithBinaryOperator {
            node: binary.clone(),
        });
    }
    Ok(negation(run))
}

fn connect(previous: &str, key: &str, run: Vec<OperatorNode>, at: usize) -> Vec<Node> {
    let mut binary = None;
    let mut negations = Vec::new();
    for op in run {
        match op.value {
            BoolOp::Not => negations.push(op),
            // only the first AND/OR in front of any NOT is kept
            BoolOp::And | BoolOp::Or if binary.is_none() && negations.is_empty() => {
                binary = Some(op)
            }
            BoolOp::And | BoolOp::Or => {}
        }
    }

    let connector = binary.unwrap_or_else(|| {
        let value = if negations.is_empty() && !key.is_empty() && previous == key {
            BoolOp::Or
        } else {
            BoolOp::And
        };
        OperatorNode {
            value,
            loc: Location::implicit(at),
        }
    });

    let mut nodes = vec![Node::Operator(connector)];
    nodes.extend(negation(negations));
    nodes
}

fn negation(mut negations: Vec<OperatorNode>) -> Vec<Node> {
    if negations.len() % 2 == 1 {
        negations.truncate(1);
        negations.into_iter().map(Node::Operator).collect()
    } else {
        Vec::new()
    }
}

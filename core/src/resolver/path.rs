use common::policy::{CategoryNode, ClassTree, PolicyBucket, PolicyRecord, PolicyTree};
use log::{debug, error};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;
use serde_json::Value;

/// Characters escaped in one logical path segment
const SEGMENT: &AsciiSet = &CONTROLS.add(b'/').add(b'%');

/// Escape a category name or policy key for use as a path segment
pub(crate) fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

pub(crate) fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().to_string()
}

/// Position reached while walking a logical path through the aggregated tree
#[derive(Debug, Clone)]
pub(crate) enum TreeNode<'a> {
    Root(&'a PolicyTree),
    ClassTree(&'a ClassTree),
    CategoryList(&'a [CategoryNode]),
    Category(&'a CategoryNode),
    Bucket(&'a PolicyBucket),
    Policy(&'a PolicyRecord),
    /// Anything below a policy record, or the meta block
    Value(Value),
}

impl<'a> TreeNode<'a> {
    /// Move one segment down. `rest` holds the raw segments after this one
    fn descend(self, segment: &str, rest: &[&str]) -> Option<(TreeNode<'a>, bool)> {
        let next = match self {
            TreeNode::Root(tree) => match segment {
                "meta" => TreeNode::Value(to_json(&tree.meta)?),
                "Machine" => TreeNode::ClassTree(&tree.machine),
                "User" => TreeNode::ClassTree(&tree.user),
                _ => return None,
            },
            TreeNode::ClassTree(class) => match segment {
                "categories" => TreeNode::CategoryList(&class.categories),
                "uncategorizedPolicies" => TreeNode::Bucket(&class.uncategorized_policies),
                _ => TreeNode::Category(find_category(&class.categories, segment)?),
            },
            TreeNode::CategoryList(nodes) => TreeNode::Category(find_category(nodes, segment)?),
            TreeNode::Category(node) => match segment {
                "category" => TreeNode::Value(Value::String(node.category.clone())),
                "inherited" => TreeNode::CategoryList(&node.inherited),
                "policies" => {
                    // Everything after `policies` is one policy key
                    if rest.is_empty() {
                        return Some((TreeNode::Bucket(&node.policies), true));
                    }
                    let key = decode_segment(&rest.join("/"));
                    return Some((TreeNode::Policy(node.policies.get(&key)?), true));
                }
                _ => TreeNode::Category(find_category(&node.inherited, segment)?),
            },
            TreeNode::Bucket(bucket) => TreeNode::Policy(bucket.get(segment)?),
            TreeNode::Policy(record) => TreeNode::Value(to_json(record)?).descend(segment, rest)?.0,
            TreeNode::Value(value) => TreeNode::Value(descend_value(&value, segment)?),
        };
        Some((next, false))
    }

    /// JSON form of the node
    pub(crate) fn to_value(&self) -> Option<Value> {
        match self {
            TreeNode::Root(tree) => to_json(tree),
            TreeNode::ClassTree(class) => to_json(class),
            TreeNode::CategoryList(nodes) => to_json(nodes),
            TreeNode::Category(node) => to_json(node),
            TreeNode::Bucket(bucket) => to_json(bucket),
            TreeNode::Policy(record) => to_json(record),
            TreeNode::Value(value) => Some(value.clone()),
        }
    }

    /// Names that can follow this node in a path
    pub(crate) fn children(&self) -> Vec<String> {
        match self {
            TreeNode::Root(_) => vec![
                String::from("meta"),
                String::from("Machine"),
                String::from("User"),
            ],
            TreeNode::ClassTree(_) => vec![
                String::from("categories"),
                String::from("uncategorizedPolicies"),
            ],
            TreeNode::CategoryList(nodes) => {
                nodes.iter().map(|node| node.category.clone()).collect()
            }
            TreeNode::Category(_) => vec![
                String::from("category"),
                String::from("policies"),
                String::from("inherited"),
            ],
            TreeNode::Bucket(bucket) => bucket.keys().map(str::to_string).collect(),
            TreeNode::Policy(record) => match to_json(record) {
                Some(value) => value_children(&value),
                None => Vec::new(),
            },
            TreeNode::Value(value) => value_children(value),
        }
    }
}

fn find_category<'a>(nodes: &'a [CategoryNode], name: &str) -> Option<&'a CategoryNode> {
    nodes.iter().find(|node| node.category == name)
}

fn descend_value(value: &Value, segment: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get(segment).cloned(),
        Value::Array(items) => items
            .iter()
            .find(|item| item.get("category").and_then(Value::as_str) == Some(segment))
            .cloned(),
        _ => None,
    }
}

fn value_children(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("category").and_then(Value::as_str))
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn to_json<T: Serialize + ?Sized>(data: &T) -> Option<Value> {
    match serde_json::to_value(data) {
        Ok(result) => Some(result),
        Err(err) => {
            error!("[resolver] Could not serialize tree node: {err:?}");
            None
        }
    }
}

/// Walk a `/` delimited logical path. Empty or `/` is the root
pub(crate) fn resolve_node<'a>(tree: &'a PolicyTree, path: &str) -> Option<TreeNode<'a>> {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    let mut node = TreeNode::Root(tree);

    for (index, raw) in segments.iter().enumerate() {
        let segment = decode_segment(raw);
        let (next, terminal) = match node.descend(&segment, &segments[index + 1..]) {
            Some(result) => result,
            None => {
                debug!("[resolver] Path not found: {path} (at segment {segment})");
                return None;
            }
        };
        node = next;
        if terminal {
            break;
        }
    }
    Some(node)
}

/// Get the JSON value at a logical path
pub(crate) fn get_path(tree: &PolicyTree, path: &str) -> Option<Value> {
    resolve_node(tree, path)?.to_value()
}

/// List the names below a logical path. Unknown paths have no children
pub(crate) fn list_path_children(tree: &PolicyTree, path: &str) -> Vec<String> {
    match resolve_node(tree, path) {
        Some(node) => node.children(),
        None => Vec::new(),
    }
}

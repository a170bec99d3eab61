//! Radix tree for parameterized route matching.
//!
//! Paths are split into `/`-separated segments and stored one node per
//! segment. Each node holds its children in three priority slots: a vector
//! of static children (insertion order), at most one parameter child and at
//! most one catch-all child. Matching walks the tree depth-first in that
//! priority order and backtracks, so a static prefix never shadows a
//! parameter sibling that leads to the only full match.

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::debug;

use crate::handler::HandlerWrapper;

/// Captured path parameters for one lookup. Stack-allocated for the common
/// case; route depth rarely yields more than a handful of captures.
pub type ParamVec = SmallVec<[(String, String); 4]>;

/// Node priority class. Lower value matches first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeKind {
    Static = 0,
    Param = 1,
    CatchAll = 2,
}

pub(crate) struct RadixNode {
    /// The raw segment as written at registration, kept for route dumps.
    segment: String,
    kind: NodeKind,
    /// Parameter name; empty for static nodes and anonymous catch-alls.
    param_name: String,
    static_children: Vec<RadixNode>,
    param_child: Option<Box<RadixNode>>,
    catch_all_child: Option<Box<RadixNode>>,
    handlers: HashMap<Method, HandlerWrapper>,
}

impl RadixNode {
    fn new(segment: &str, kind: NodeKind, param_name: &str) -> Self {
        Self {
            segment: segment.to_string(),
            kind,
            param_name: param_name.to_string(),
            static_children: Vec::new(),
            param_child: None,
            catch_all_child: None,
            handlers: HashMap::new(),
        }
    }

    /// A node is a leaf iff it has at least one registered handler.
    pub(crate) fn is_leaf(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub(crate) fn handler(&self, method: &Method) -> Option<&HandlerWrapper> {
        self.handlers.get(method)
    }

    fn find_static_child(&self, segment: &str) -> Option<&RadixNode> {
        self.static_children.iter().find(|c| c.segment == segment)
    }
}

/// Result of a successful tree lookup.
pub(crate) struct RadixMatch<'a> {
    pub node: &'a RadixNode,
    pub params: ParamVec,
}

pub(crate) struct RadixTree {
    root: RadixNode,
}

/// Splits a request or registration path into non-empty segments. Leading
/// and trailing slashes and `//` runs collapse; the root path yields an
/// empty list.
fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Classifies a registration segment: `:name` binds one segment, `*` or
/// `*name` absorbs the remainder, anything else matches literally.
fn parse_segment(segment: &str) -> (NodeKind, &str) {
    if let Some(name) = segment.strip_prefix(':') {
        (NodeKind::Param, name)
    } else if let Some(name) = segment.strip_prefix('*') {
        (NodeKind::CatchAll, name)
    } else {
        (NodeKind::Static, "")
    }
}

impl RadixTree {
    pub(crate) fn new() -> Self {
        Self {
            root: RadixNode::new("", NodeKind::Static, ""),
        }
    }

    /// Inserts a route, creating intermediate nodes as needed.
    ///
    /// Parameter and catch-all slots are unique per node: a second
    /// registration through the same slot reuses it and overwrites the
    /// parameter name, so the last writer wins. Re-registering the same
    /// (path, method) pair replaces the handler.
    pub(crate) fn insert(&mut self, method: Method, path: &str, handler: HandlerWrapper) {
        debug!(method = %method, path = %path, "radix insert");

        let mut current = &mut self.root;
        for segment in split_path(path) {
            let (kind, param_name) = parse_segment(segment);
            current = match kind {
                NodeKind::Static => {
                    let idx = match current
                        .static_children
                        .iter()
                        .position(|c| c.segment == segment)
                    {
                        Some(idx) => idx,
                        None => {
                            current
                                .static_children
                                .push(RadixNode::new(segment, kind, ""));
                            current.static_children.len() - 1
                        }
                    };
                    &mut current.static_children[idx]
                }
                NodeKind::Param => {
                    let child = current.param_child.get_or_insert_with(|| {
                        Box::new(RadixNode::new(segment, kind, param_name))
                    });
                    child.segment = segment.to_string();
                    child.param_name = param_name.to_string();
                    &mut **child
                }
                NodeKind::CatchAll => {
                    let child = current.catch_all_child.get_or_insert_with(|| {
                        Box::new(RadixNode::new(segment, kind, param_name))
                    });
                    child.segment = segment.to_string();
                    child.param_name = param_name.to_string();
                    &mut **child
                }
            };
        }
        current.handlers.insert(method, handler);
    }

    /// Priority-ordered lookup with backtracking.
    ///
    /// Request segments are literals; `:` and `*` carry no meaning here.
    /// Bindings are committed only along the successful recursion, so a
    /// failed subtree leaks nothing into the result.
    pub(crate) fn find(&self, path: &str) -> Option<RadixMatch<'_>> {
        let segments = split_path(path);
        let mut params = ParamVec::new();
        let node = Self::match_recursive(&self.root, &segments, 0, &mut params)?;
        Some(RadixMatch { node, params })
    }

    fn match_recursive<'a>(
        node: &'a RadixNode,
        segments: &[&str],
        index: usize,
        params: &mut ParamVec,
    ) -> Option<&'a RadixNode> {
        if index >= segments.len() {
            if node.is_leaf() {
                return Some(node);
            }
            // An exhausted path can still land on a catch-all leaf with an
            // empty remainder, e.g. `/files/*rest` matching `/files/`.
            if let Some(catch_all) = &node.catch_all_child {
                if catch_all.is_leaf() {
                    if !catch_all.param_name.is_empty() {
                        params.push((catch_all.param_name.clone(), String::new()));
                    }
                    return Some(catch_all);
                }
            }
            return None;
        }

        let segment = segments[index];

        if let Some(child) = node.find_static_child(segment) {
            if let Some(found) = Self::match_recursive(child, segments, index + 1, params) {
                return Some(found);
            }
        }

        if let Some(child) = &node.param_child {
            if let Some(found) = Self::match_recursive(child, segments, index + 1, params) {
                params.push((child.param_name.clone(), segment.to_string()));
                return Some(found);
            }
        }

        if let Some(catch_all) = &node.catch_all_child {
            if catch_all.is_leaf() {
                if !catch_all.param_name.is_empty() {
                    params.push((catch_all.param_name.clone(), segments[index..].join("/")));
                }
                return Some(catch_all);
            }
        }

        None
    }

    /// Collects every registered (method, pattern) pair for route dumps.
    pub(crate) fn routes(&self) -> Vec<(Method, String)> {
        let mut out = Vec::new();
        Self::collect(&self.root, String::new(), &mut out);
        out
    }

    fn collect(node: &RadixNode, prefix: String, out: &mut Vec<(Method, String)>) {
        let pattern = if node.segment.is_empty() {
            "/".to_string()
        } else {
            format!("{}/{}", prefix, node.segment)
        };
        for method in node.handlers.keys() {
            out.push((method.clone(), pattern.clone()));
        }
        let child_prefix = if node.segment.is_empty() {
            String::new()
        } else {
            pattern
        };
        for child in &node.static_children {
            Self::collect(child, child_prefix.clone(), out);
        }
        if let Some(child) = &node.param_child {
            Self::collect(child, child_prefix.clone(), out);
        }
        if let Some(child) = &node.catch_all_child {
            Self::collect(child, child_prefix, out);
        }
    }
}

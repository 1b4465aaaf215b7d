use super::{DEFAULT_KEY, DecisionNode, DecisionTree, NodeDefinition, NodeId, TreeDefinition};
use crate::error::{TreeError, display_path};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::VecDeque;

/// A link option whose target is looked up once every owned node exists.
struct PendingLink {
    parent: NodeId,
    key: String,
    site: Vec<String>,
    target: Vec<String>,
}

/// Turns a `TreeDefinition` into a validated arena-backed `DecisionTree`.
pub(super) struct TreeCompiler {
    nodes: Vec<DecisionNode>,
    pending_links: Vec<PendingLink>,
}

impl TreeCompiler {
    pub(super) fn compile(definition: TreeDefinition) -> Result<DecisionTree, TreeError> {
        if definition.root.link.is_some() {
            return Err(TreeError::InvalidLink {
                node: display_path::<String>(&[]),
                message: "the root node cannot be a link".to_string(),
            });
        }

        let mut compiler = Self {
            nodes: Vec::new(),
            pending_links: Vec::new(),
        };
        compiler.allocate(definition.root, Vec::new())?;
        compiler.resolve_links()?;

        let names = verify_arena(&compiler.nodes)?;
        warn_suspicious_nodes(&compiler.nodes, &names);

        tracing::debug!(
            nodes = compiler.nodes.len(),
            "Decision tree compiled and validated"
        );
        Ok(DecisionTree {
            nodes: compiler.nodes,
        })
    }

    /// Allocates `definition` and its owned subtree, depth first.
    fn allocate(
        &mut self,
        definition: NodeDefinition,
        path: Vec<String>,
    ) -> Result<NodeId, TreeError> {
        let id = NodeId::from_index(self.nodes.len());

        let mut seen = AHashSet::new();
        for (key, _) in &definition.options {
            if key.is_empty() {
                return Err(TreeError::EmptyKey {
                    node: display_path(&path),
                });
            }
            if !seen.insert(key.as_str()) {
                return Err(TreeError::DuplicateKey {
                    node: display_path(&path),
                    key: key.clone(),
                });
            }
        }

        let default_child = definition
            .default
            .or_else(|| seen.contains(DEFAULT_KEY).then(|| DEFAULT_KEY.to_string()));
        if let Some(key) = &default_child {
            if !seen.contains(key.as_str()) {
                return Err(TreeError::DanglingDefault {
                    node: display_path(&path),
                    key: key.clone(),
                });
            }
            if key != DEFAULT_KEY && seen.contains(DEFAULT_KEY) {
                return Err(TreeError::ShadowedDefaultKey {
                    node: display_path(&path),
                    default: key.clone(),
                });
            }
        }

        self.nodes.push(DecisionNode {
            label: definition.label,
            children: AHashMap::with_capacity(definition.options.len()),
            profile: definition.profile.filter(|profile| !profile.is_empty()),
            default_child,
            required_inputs: definition.required_inputs,
            optional_inputs: definition.optional_inputs,
        });

        for (key, child) in definition.options {
            let mut child_path = path.clone();
            child_path.push(key.clone());

            if let Some(target) = &child.link {
                if !child.is_bare_link() {
                    return Err(TreeError::InvalidLink {
                        node: display_path(&child_path),
                        message: "a link cannot declare options, a profile, inputs or a label"
                            .to_string(),
                    });
                }
                self.pending_links.push(PendingLink {
                    parent: id,
                    key,
                    site: child_path,
                    target: target.clone(),
                });
                continue;
            }

            let child_id = self.allocate(child, child_path)?;
            self.nodes[id.index()].children.insert(key, child_id);
        }

        Ok(id)
    }

    /// Resolves links until every one points at a node. Links may target nodes that
    /// are themselves reached through other links, so this repeats while progress is made.
    fn resolve_links(&mut self) -> Result<(), TreeError> {
        let mut pending = std::mem::take(&mut self.pending_links);
        while !pending.is_empty() {
            let before = pending.len();
            let mut unresolved = Vec::new();
            for link in pending {
                match self.lookup(&link.target) {
                    Some(target) => {
                        self.nodes[link.parent.index()]
                            .children
                            .insert(link.key, target);
                    }
                    None => unresolved.push(link),
                }
            }
            if unresolved.len() == before {
                let link = &unresolved[0];
                return Err(TreeError::UnresolvedLink {
                    node: display_path(&link.site),
                    target: display_path(&link.target),
                });
            }
            pending = unresolved;
        }
        Ok(())
    }

    fn lookup(&self, path: &[String]) -> Option<NodeId> {
        path.iter().try_fold(NodeId::ROOT, |current, step| {
            self.nodes[current.index()].children.get(step).copied()
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Checks the structural invariants of an arena and returns a display name for each
/// node (its shortest path from the root).
///
/// Used both after compilation and after loading a compiled cache, which may have
/// been produced by another build or tampered with.
pub(super) fn verify_arena(nodes: &[DecisionNode]) -> Result<Vec<String>, TreeError> {
    if nodes.is_empty() {
        return Err(TreeError::Cache("tree has no root node".to_string()));
    }

    for (index, node) in nodes.iter().enumerate() {
        if let Some(bad) = node.children.values().find(|child| child.index() >= nodes.len()) {
            return Err(TreeError::Cache(format!(
                "node #{} points to missing node #{}",
                index,
                bad.index()
            )));
        }
    }

    let names = node_names(nodes);

    for (index, node) in nodes.iter().enumerate() {
        if let Some(key) = &node.default_child {
            if !node.children.contains_key(key) {
                return Err(TreeError::DanglingDefault {
                    node: names[index].clone(),
                    key: key.clone(),
                });
            }
        }
        // A `_DEFAULT` child is only reachable as the default continuation.
        if node.children.contains_key(DEFAULT_KEY)
            && node.default_child.as_deref() != Some(DEFAULT_KEY)
        {
            return Err(TreeError::ShadowedDefaultKey {
                node: names[index].clone(),
                default: node.default_child.clone().unwrap_or_default(),
            });
        }
    }

    // Default chains first, so a loop made only of default continuations gets the
    // more specific error.
    for start in 0..nodes.len() {
        let mut visited = AHashSet::new();
        let mut current = start;
        while let Some(next) = nodes[current]
            .default_child
            .as_ref()
            .and_then(|key| nodes[current].children.get(key))
        {
            if !visited.insert(current) {
                return Err(TreeError::DefaultCycle {
                    node: names[start].clone(),
                });
            }
            current = next.index();
        }
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    for start in 0..nodes.len() {
        if marks[start] == Mark::Unvisited {
            visit(nodes, start, &mut marks, &names)?;
        }
    }

    Ok(names)
}

fn visit(
    nodes: &[DecisionNode],
    index: usize,
    marks: &mut [Mark],
    names: &[String],
) -> Result<(), TreeError> {
    marks[index] = Mark::InProgress;
    for (key, child) in nodes[index].children.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        match marks[child.index()] {
            Mark::InProgress => {
                return Err(TreeError::CyclicLink {
                    node: names[index].clone(),
                    key: key.clone(),
                });
            }
            Mark::Unvisited => visit(nodes, child.index(), marks, names)?,
            Mark::Done => {}
        }
    }
    marks[index] = Mark::Done;
    Ok(())
}

fn node_names(nodes: &[DecisionNode]) -> Vec<String> {
    let mut names: Vec<Option<String>> = vec![None; nodes.len()];
    let mut queue = VecDeque::from([(NodeId::ROOT, Vec::<String>::new())]);
    while let Some((id, path)) = queue.pop_front() {
        if names[id.index()].is_some() {
            continue;
        }
        names[id.index()] = Some(display_path(&path));
        for key in nodes[id.index()].keys() {
            if let Some(child) = nodes[id.index()].child(key) {
                let mut child_path = path.clone();
                child_path.push(key.to_string());
                queue.push_back((child, child_path));
            }
        }
    }
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| name.unwrap_or_else(|| format!("#{}", index)))
        .collect()
}

fn warn_suspicious_nodes(nodes: &[DecisionNode], names: &[String]) {
    for (node, name) in nodes.iter().zip(names) {
        if node.profile.is_none() && node.children.is_empty() {
            tracing::warn!(
                node = %name,
                "Node has neither a profile nor options; sessions reaching it cannot complete"
            );
        }
        if node.default_child.is_some() && !node.visible_keys().is_empty() {
            tracing::warn!(
                node = %name,
                "Node has a default continuation next to visible options; the options are skipped once the default is chased"
            );
        }
    }
}

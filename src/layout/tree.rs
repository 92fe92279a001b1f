//! Environment tree
//!
//! Turns the flat list of runtime environments in a [`Snapshot`] into a single
//! rooted tree of drawable nodes. Which environments get a node of their own is
//! decided by a [`FramePolicy`]:
//!
//! - empty block environments are skipped, their children hang off the nearest
//!   kept ancestor;
//! - an environment holding only pre-declared (unassigned) names with exactly one
//!   kept child is folded into that child, whose frame then lists those names
//!   first.
//!
//! Every environment id, skipped or not, resolves to the node that stands for it,
//! so closures defined in a skipped environment still find a frame to point at.

use super::FrameId;
use crate::errors::LayoutWarning;
use crate::snapshot::{EnvId, RuntimeEnv, Snapshot};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Index of a node in an [`EnvTree`]
pub type NodeId = usize;

/// Which environments are drawn as frames of their own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePolicy {
    pub skip_empty: bool,
    pub merge_predeclared: bool,
}

impl FramePolicy {
    /// Conventions of interpreters that push a frame for hoisted names and one
    /// per block
    pub const PEDAGOGICAL: FramePolicy = FramePolicy {
        skip_empty: true,
        merge_predeclared: true,
    };

    /// Draw every environment as it is
    pub const NEVER: FramePolicy = FramePolicy {
        skip_empty: false,
        merge_predeclared: false,
    };
}

/// A node of the environment tree
#[derive(Debug, Clone)]
pub struct EnvTreeNode {
    /// `None` only for a global node synthesized for a snapshot without one
    pub env: Option<EnvId>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub level: usize,
    /// Pre-declared environments folded into this node, outermost first
    pub merged: Vec<EnvId>,
    /// Every name is declared but unassigned
    pub predeclared_only: bool,
    pub frame: Option<FrameId>,
}

impl EnvTreeNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Rooted tree of drawable environments
#[derive(Debug, Clone, Default)]
pub struct EnvTree {
    nodes: Vec<EnvTreeNode>,
    by_env: FxHashMap<EnvId, NodeId>,
}

impl EnvTree {
    /// Build the tree for a snapshot. Problems with the parent links are pushed to
    /// `warnings` and repaired by attaching the offender to the global node.
    pub fn build(
        snapshot: &Snapshot,
        policy: FramePolicy,
        warnings: &mut Vec<LayoutWarning>,
    ) -> EnvTree {
        let _span = tracing::info_span!("env_tree", step = snapshot.step).entered();

        // Index environments, first occurrence wins
        let mut index: FxHashMap<EnvId, usize> = FxHashMap::default();
        let mut envs: Vec<&RuntimeEnv> = Vec::new();
        for env in &snapshot.envs {
            if index.contains_key(&env.id) {
                warnings.push(LayoutWarning::DuplicateEnv { env: env.id });
                continue;
            }
            index.insert(env.id, envs.len());
            envs.push(env);
        }

        // The global environment is where the walk outward from the current
        // environment ends; failing that, the first one without a parent
        let root = snapshot
            .current_chain()
            .last()
            .and_then(|id| index.get(id).copied())
            .filter(|&i| envs[i].parent.is_none())
            .or_else(|| envs.iter().position(|env| env.parent.is_none()));
        if root.is_none() {
            warnings.push(LayoutWarning::MissingGlobal);
        }

        // parent[i] == None means "child of the global node"
        let mut parent: Vec<Option<usize>> = envs
            .iter()
            .enumerate()
            .map(|(i, env)| {
                if Some(i) == root {
                    return None;
                }
                match env.parent {
                    None => {
                        warnings.push(LayoutWarning::ExtraRoot { env: env.id });
                        None
                    }
                    Some(p) => match index.get(&p) {
                        Some(&pi) => Some(pi).filter(|&pi| Some(pi) != root),
                        None => {
                            warnings.push(LayoutWarning::DanglingParent {
                                env: env.id,
                                parent: p,
                            });
                            None
                        }
                    },
                }
            })
            .collect();
        cut_parent_cycles(&mut parent, &envs, warnings);

        let is_root = |i: usize| Some(i) == root;

        // Skip empty environments
        let kept: Vec<bool> = envs
            .iter()
            .enumerate()
            .map(|(i, env)| is_root(i) || !(policy.skip_empty && env.bindings.is_empty()))
            .collect();
        let kept_parent = |mut i: usize, parent: &[Option<usize>]| -> Option<usize> {
            loop {
                match parent[i] {
                    Some(p) if kept[p] => return Some(p),
                    Some(p) => i = p,
                    None => return None,
                }
            }
        };
        let mut tree_parent: Vec<Option<usize>> =
            (0..envs.len()).map(|i| kept_parent(i, &parent)).collect();

        // Fold pre-declared environments into their single child, outermost first
        let mut merged_into: Vec<Option<usize>> = vec![None; envs.len()];
        let mut merged: Vec<Vec<EnvId>> = vec![Vec::new(); envs.len()];
        if policy.merge_predeclared {
            let depth = |mut i: usize, tree_parent: &[Option<usize>]| {
                let mut d = 0;
                while let Some(p) = tree_parent[i] {
                    d += 1;
                    i = p;
                }
                d
            };
            let mut order: Vec<usize> = (0..envs.len())
                .filter(|&i| kept[i] && !is_root(i) && envs[i].is_predeclared_only())
                .collect();
            order.sort_by_key(|&i| depth(i, &tree_parent));
            for i in order {
                let children: Vec<usize> = (0..envs.len())
                    .filter(|&c| kept[c] && merged_into[c].is_none() && tree_parent[c] == Some(i))
                    .collect();
                if let [child] = *children.as_slice() {
                    merged_into[i] = Some(child);
                    tree_parent[child] = tree_parent[i];
                    let mut names = std::mem::take(&mut merged[i]);
                    names.push(envs[i].id);
                    names.append(&mut merged[child]);
                    merged[child] = names;
                }
            }
        }

        // Breadth-first node creation, siblings in creation order
        let mut tree = EnvTree::default();
        let mut node_of: Vec<Option<NodeId>> = vec![None; envs.len()];
        let root_node = tree.push_node(root.map(|r| envs[r].id), None, 0);
        if let Some(r) = root {
            tree.nodes[root_node].predeclared_only = envs[r].is_predeclared_only();
            node_of[r] = Some(root_node);
        }
        let mut queue: VecDeque<(Option<usize>, NodeId)> = VecDeque::from([(None, root_node)]);
        while let Some((env, node)) = queue.pop_front() {
            for c in 0..envs.len() {
                let attached = kept[c] && merged_into[c].is_none() && !is_root(c);
                if !attached || tree_parent[c] != env {
                    continue;
                }
                let level = tree.nodes[node].level + 1;
                let child = tree.push_node(Some(envs[c].id), Some(node), level);
                tree.nodes[child].merged = std::mem::take(&mut merged[c]);
                tree.nodes[child].predeclared_only = envs[c].is_predeclared_only();
                tree.nodes[node].children.push(child);
                node_of[c] = Some(child);
                queue.push_back((Some(c), child));
            }
        }

        // Resolve every environment id to the node standing for it
        for i in 0..envs.len() {
            let mut j = i;
            let node = loop {
                if let Some(n) = node_of[j] {
                    break n;
                }
                match (merged_into[j], parent[j]) {
                    (Some(child), _) => j = child,
                    (None, Some(p)) => j = p,
                    (None, None) => break root_node,
                }
            };
            tree.by_env.insert(envs[i].id, node);
        }

        tracing::debug!(nodes = tree.nodes.len(), "environment tree built");
        tree
    }

    fn push_node(&mut self, env: Option<EnvId>, parent: Option<NodeId>, level: usize) -> NodeId {
        self.nodes.push(EnvTreeNode {
            env,
            parent,
            children: Vec::new(),
            level,
            merged: Vec::new(),
            predeclared_only: false,
            frame: None,
        });
        if let Some(env) = env {
            self.by_env.insert(env, self.nodes.len() - 1);
        }
        self.nodes.len() - 1
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &EnvTreeNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut EnvTreeNode {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[EnvTreeNode] {
        &self.nodes
    }

    /// Node drawn for an environment, following skips and merges
    pub fn resolve(&self, env: EnvId) -> Option<NodeId> {
        self.by_env.get(&env).copied()
    }

    /// Nodes grouped by level, each level in breadth-first order
    pub fn levels(&self) -> Vec<Vec<NodeId>> {
        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        // nodes are pushed breadth-first, so index order is already level order
        for (id, node) in self.nodes.iter().enumerate() {
            if levels.len() <= node.level {
                levels.resize(node.level + 1, Vec::new());
            }
            levels[node.level].push(id);
        }
        levels
    }
}

/// Break cycles in parent links by attaching one member of each cycle to the
/// global node. Environments that merely lead into a cycle keep their parent.
fn cut_parent_cycles(
    parent: &mut [Option<usize>],
    envs: &[&RuntimeEnv],
    warnings: &mut Vec<LayoutWarning>,
) {
    let n = parent.len();
    for start in 0..n {
        // n steps without reaching the root put the walk on a cycle
        let mut i = start;
        let mut steps = 0;
        while let Some(p) = parent[i] {
            if steps == n {
                break;
            }
            steps += 1;
            i = p;
        }
        if parent[i].is_none() {
            continue;
        }

        // cut the earliest created member
        let mut cut = i;
        let mut j = i;
        while let Some(p) = parent[j] {
            if p == i {
                break;
            }
            cut = cut.min(p);
            j = p;
        }
        parent[cut] = None;
        warnings.push(LayoutWarning::ParentCycle { env: envs[cut].id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Datum;

    fn build(snapshot: &Snapshot, policy: FramePolicy) -> (EnvTree, Vec<LayoutWarning>) {
        let mut warnings = Vec::new();
        let tree = EnvTree::build(snapshot, policy, &mut warnings);
        (tree, warnings)
    }

    #[test]
    fn test_levels_follow_nesting() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "outer", Some(0)).bind("a", Datum::number(2.0)))
            .with_env(RuntimeEnv::new(2, "inner", Some(1)).bind("b", Datum::number(3.0)));
        let (tree, warnings) = build(&snapshot, FramePolicy::NEVER);

        assert!(warnings.is_empty());
        let levels: Vec<usize> = [0, 1, 2]
            .iter()
            .map(|&e| tree.node(tree.resolve(EnvId(e)).unwrap()).level)
            .collect();
        assert_eq!(levels, vec![0, 1, 2]);
        assert_eq!(tree.levels().len(), 3);
    }

    #[test]
    fn test_empty_environment_is_skipped() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "block", Some(0)))
            .with_env(RuntimeEnv::new(2, "f", Some(1)).bind("n", Datum::number(3.0)));
        let (tree, _) = build(&snapshot, FramePolicy::PEDAGOGICAL);

        assert_eq!(tree.nodes().len(), 2);
        let f = tree.resolve(EnvId(2)).unwrap();
        assert_eq!(tree.node(f).parent, Some(tree.root()));
        assert_eq!(tree.resolve(EnvId(1)), Some(tree.root()));

        let (tree, _) = build(&snapshot, FramePolicy::NEVER);
        assert_eq!(tree.nodes().len(), 3);
    }

    #[test]
    fn test_predeclared_merges_into_single_child() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "program", Some(0)).declare("y"))
            .with_env(RuntimeEnv::new(2, "f", Some(1)).bind("n", Datum::number(3.0)));
        let (tree, _) = build(&snapshot, FramePolicy::PEDAGOGICAL);

        let f = tree.resolve(EnvId(2)).unwrap();
        assert_eq!(tree.resolve(EnvId(1)), Some(f));
        assert_eq!(tree.node(f).merged, vec![EnvId(1)]);
        assert_eq!(tree.node(f).level, 1);
    }

    #[test]
    fn test_predeclared_without_single_child_is_flagged() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "program", Some(0)).declare("y"));
        let (tree, _) = build(&snapshot, FramePolicy::PEDAGOGICAL);

        let node = tree.resolve(EnvId(1)).unwrap();
        assert!(tree.node(node).predeclared_only);
        assert!(tree.node(node).merged.is_empty());
    }

    #[test]
    fn test_malformed_parents_attach_to_global() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "a", Some(2)).bind("a", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(2, "b", Some(1)).bind("b", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(3, "c", Some(99)).bind("c", Datum::number(1.0)));
        let (tree, warnings) = build(&snapshot, FramePolicy::NEVER);

        assert_eq!(tree.nodes().len(), 4);
        assert!(warnings.contains(&LayoutWarning::ParentCycle { env: EnvId(1) }));
        assert!(warnings.contains(&LayoutWarning::DanglingParent {
            env: EnvId(3),
            parent: EnvId(99)
        }));
        let c = tree.resolve(EnvId(3)).unwrap();
        assert_eq!(tree.node(c).parent, Some(tree.root()));
    }

    #[test]
    fn test_env_leading_into_cycle_keeps_its_parent() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(3, "c", Some(1)).bind("c", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "a", Some(2)).bind("a", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(2, "b", Some(1)).bind("b", Datum::number(1.0)));
        let (tree, warnings) = build(&snapshot, FramePolicy::NEVER);

        assert_eq!(warnings, vec![LayoutWarning::ParentCycle { env: EnvId(1) }]);
        let a = tree.resolve(EnvId(1)).unwrap();
        assert_eq!(tree.node(a).parent, Some(tree.root()));
        for child in [2, 3] {
            let node = tree.resolve(EnvId(child)).unwrap();
            assert_eq!(tree.node(node).parent, Some(a));
        }
    }

    #[test]
    fn test_global_is_found_from_current_env() {
        let snapshot = Snapshot::new(0)
            .with_env(RuntimeEnv::new(5, "stray", None).bind("s", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(0, "global", None).bind("x", Datum::number(1.0)))
            .with_env(RuntimeEnv::new(1, "f", Some(0)).bind("n", Datum::number(2.0)));
        assert_eq!(snapshot.current_chain(), vec![EnvId(1), EnvId(0)]);
        let (tree, warnings) = build(&snapshot, FramePolicy::NEVER);

        assert_eq!(tree.node(tree.root()).env, Some(EnvId(0)));
        assert_eq!(warnings, vec![LayoutWarning::ExtraRoot { env: EnvId(5) }]);
        let stray = tree.resolve(EnvId(5)).unwrap();
        assert_eq!(tree.node(stray).parent, Some(tree.root()));
    }

    #[test]
    fn test_missing_global_is_synthesized() {
        let (tree, warnings) = build(&Snapshot::new(0), FramePolicy::PEDAGOGICAL);
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.node(tree.root()).env, None);
        assert_eq!(warnings, vec![LayoutWarning::MissingGlobal]);
    }
}

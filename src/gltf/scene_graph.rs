//! Global node matrices from the scene hierarchy.
//!
//! Traversal is depth-first, left to right, starting at each scene root with
//! an identity parent. A node's local matrix is its explicit `matrix` when
//! one is given, otherwise `T * R * S` from whichever TRS fields are present.
//!
//! Nodes shared between several parents are visited once per path. A node
//! reached again while it is still on the current path is a cycle and fails
//! the load. Hierarchies nested deeper than [`MAX_DEPTH`] or expanding to
//! more than [`MAX_VISITS`] visits are rejected as malformed.

use glam::{Mat4, Quat, Vec3};

use super::document::{Node, lookup};
use crate::error::{LoadError, Result};

/// Deepest root-to-node path accepted.
pub const MAX_DEPTH: usize = 4096;
/// Most node visits one scene may expand to.
pub const MAX_VISITS: usize = 1 << 20;

/// One visit of a node during traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeVisit {
    pub node: usize,
    pub global: Mat4,
}

/// Every node visit in traversal order.
#[derive(Clone, Debug, Default)]
pub struct ResolvedScene {
    pub visits: Vec<NodeVisit>,
}

impl ResolvedScene {
    /// Global matrix of `node` on its last visited path.
    pub fn global(&self, node: usize) -> Option<Mat4> {
        self.visits
            .iter()
            .rev()
            .find(|visit| visit.node == node)
            .map(|visit| visit.global)
    }
}

/// The node's transform relative to its parent.
pub fn local_matrix(node: &Node) -> Mat4 {
    if let Some(matrix) = node.matrix {
        return Mat4::from_cols_array(&matrix);
    }

    let translation = node.translation.map(Vec3::from).unwrap_or(Vec3::ZERO);
    let rotation = node.rotation.map(Quat::from_array).unwrap_or(Quat::IDENTITY);
    let scale = node.scale.map(Vec3::from).unwrap_or(Vec3::ONE);
    Mat4::from_translation(translation) * Mat4::from_quat(rotation) * Mat4::from_scale(scale)
}

/// Resolves global matrices for every node reachable from `roots`.
pub fn resolve(nodes: &[Node], roots: &[usize]) -> Result<ResolvedScene> {
    let mut walk = Walk {
        nodes,
        on_path: vec![false; nodes.len()],
        stack: Vec::new(),
        resolved: ResolvedScene::default(),
    };
    for &root in roots {
        walk.enter(root, Mat4::IDENTITY)?;
        while let Some(frame) = walk.stack.last_mut() {
            let node = &nodes[frame.node];
            match node.children.get(frame.next_child) {
                Some(&child) => {
                    frame.next_child += 1;
                    let parent = frame.global;
                    walk.enter(child, parent)?;
                }
                None => {
                    walk.on_path[frame.node] = false;
                    walk.stack.pop();
                }
            }
        }
    }
    Ok(walk.resolved)
}

/// Nodes that are nobody's child, in index order.
pub fn parentless(nodes: &[Node]) -> Vec<usize> {
    let mut has_parent = vec![false; nodes.len()];
    for child in nodes.iter().flat_map(|node| &node.children) {
        if let Some(flag) = has_parent.get_mut(*child) {
            *flag = true;
        }
    }
    (0..nodes.len()).filter(|&i| !has_parent[i]).collect()
}

/// A node on the current path and the next child to descend into.
struct Frame {
    node: usize,
    global: Mat4,
    next_child: usize,
}

struct Walk<'a> {
    nodes: &'a [Node],
    on_path: Vec<bool>,
    stack: Vec<Frame>,
    resolved: ResolvedScene,
}

impl Walk<'_> {
    /// Records a visit of `index` below `parent` and pushes it on the path.
    fn enter(&mut self, index: usize, parent: Mat4) -> Result<()> {
        let node = lookup(self.nodes, index, "node")?;
        if self.on_path[index] {
            return Err(LoadError::SceneGraphCycle(index));
        }
        if self.stack.len() >= MAX_DEPTH {
            return Err(LoadError::malformed(format!(
                "node hierarchy deeper than {MAX_DEPTH} levels"
            )));
        }
        if self.resolved.visits.len() >= MAX_VISITS {
            return Err(LoadError::malformed(format!(
                "node hierarchy expands to more than {MAX_VISITS} visits"
            )));
        }

        let global = parent * local_matrix(node);
        self.resolved.visits.push(NodeVisit {
            node: index,
            global,
        });
        self.on_path[index] = true;
        self.stack.push(Frame {
            node: index,
            global,
            next_child: 0,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated(x: f32, y: f32, z: f32, children: Vec<usize>) -> Node {
        Node {
            translation: Some([x, y, z]),
            children,
            ..Default::default()
        }
    }

    #[test]
    fn child_inherits_parent_translation() {
        let nodes = vec![translated(10.0, 0.0, 0.0, vec![1]), translated(0.0, 5.0, 0.0, vec![])];
        let scene = resolve(&nodes, &[0]).unwrap();

        let child = scene.global(1).unwrap();
        assert_eq!(child.w_axis.truncate(), Vec3::new(10.0, 5.0, 0.0));
    }

    #[test]
    fn explicit_matrix_overrides_trs() {
        let node = Node {
            matrix: Some(Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)).to_cols_array()),
            translation: Some([100.0, 100.0, 100.0]),
            scale: Some([5.0, 5.0, 5.0]),
            ..Default::default()
        };
        assert_eq!(
            local_matrix(&node),
            Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let node = Node {
            translation: Some([0.0, 0.0, 4.0]),
            rotation: Some(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2).to_array()),
            scale: Some([2.0, 2.0, 2.0]),
            ..Default::default()
        };
        let p = local_matrix(&node).transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-5));
    }

    #[test]
    fn traversal_is_depth_first_left_to_right() {
        let nodes = vec![
            translated(0.0, 0.0, 0.0, vec![1, 3]),
            translated(0.0, 0.0, 0.0, vec![2]),
            Node::default(),
            Node::default(),
        ];
        let scene = resolve(&nodes, &[0]).unwrap();
        let order: Vec<usize> = scene.visits.iter().map(|v| v.node).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn shared_child_is_visited_per_parent() {
        let nodes = vec![
            translated(1.0, 0.0, 0.0, vec![2]),
            translated(-1.0, 0.0, 0.0, vec![2]),
            Node::default(),
        ];
        let scene = resolve(&nodes, &[0, 1]).unwrap();

        let shared: Vec<Vec3> = scene
            .visits
            .iter()
            .filter(|v| v.node == 2)
            .map(|v| v.global.w_axis.truncate())
            .collect();
        assert_eq!(shared, vec![Vec3::X, Vec3::NEG_X]);
        assert_eq!(scene.global(2).unwrap().w_axis.truncate(), Vec3::NEG_X);
    }

    #[test]
    fn cycle_is_reported() {
        let nodes = vec![
            translated(0.0, 0.0, 0.0, vec![1]),
            translated(0.0, 0.0, 0.0, vec![0]),
        ];
        assert!(matches!(
            resolve(&nodes, &[0]),
            Err(LoadError::SceneGraphCycle(0))
        ));

        let self_loop = vec![translated(0.0, 0.0, 0.0, vec![0])];
        assert!(matches!(
            resolve(&self_loop, &[0]),
            Err(LoadError::SceneGraphCycle(0))
        ));
    }

    #[test]
    fn dangling_child_is_malformed() {
        let nodes = vec![translated(0.0, 0.0, 0.0, vec![7])];
        assert!(matches!(
            resolve(&nodes, &[0]),
            Err(LoadError::MalformedContainer(_))
        ));
    }

    #[test]
    fn parentless_nodes_are_roots() {
        let nodes = vec![
            translated(0.0, 0.0, 0.0, vec![2]),
            Node::default(),
            Node::default(),
        ];
        assert_eq!(parentless(&nodes), vec![0, 1]);
    }

    fn chain(len: usize) -> Vec<Node> {
        (0..len)
            .map(|i| {
                let children = if i + 1 < len { vec![i + 1] } else { vec![] };
                translated(0.0, 1.0, 0.0, children)
            })
            .collect()
    }

    #[test]
    fn deep_chain_within_limit_resolves() {
        let scene = resolve(&chain(MAX_DEPTH), &[0]).unwrap();
        assert_eq!(scene.visits.len(), MAX_DEPTH);
        assert_eq!(
            scene.global(MAX_DEPTH - 1).unwrap().w_axis.y,
            MAX_DEPTH as f32
        );
    }

    #[test]
    fn overly_deep_chain_is_malformed() {
        assert!(matches!(
            resolve(&chain(200_000), &[0]),
            Err(LoadError::MalformedContainer(_))
        ));
    }

    #[test]
    fn exponential_sharing_is_malformed() {
        // Every level's two nodes both point at both nodes of the next level.
        let levels = 40;
        let nodes: Vec<Node> = (0..levels * 2)
            .map(|i| {
                let next = (i / 2 + 1) * 2;
                let children = if next < levels * 2 { vec![next, next + 1] } else { vec![] };
                translated(0.0, 0.0, 0.0, children)
            })
            .collect();
        assert!(matches!(
            resolve(&nodes, &[0]),
            Err(LoadError::MalformedContainer(_))
        ));
    }
}

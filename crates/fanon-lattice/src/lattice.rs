//! Arena of generalization lattice nodes.
//!
//! Nodes are allocated once, when the hierarchies are fixed. Ids are dense
//! and assigned in level order (level = sum of generalization levels, ties
//! broken lexicographically), so iterating ids ascending visits every node
//! after all of its predecessors. Edges are id lists, never references.

use std::collections::HashMap;

use fanon_error::{AnonError, Result};
use fanon_types::NodeId;
use tracing::debug;

use crate::loss::{InformationLoss, max_loss, min_loss};
use crate::node::{Anonymity, LatticeNode, Transformation};

/// Largest lattice the arena will allocate.
pub const MAX_LATTICE_SIZE: usize = 1 << 24;

#[derive(Debug, Clone)]
pub struct Lattice {
    nodes: Vec<LatticeNode>,
    levels: Vec<Vec<NodeId>>,
    heights: Vec<u32>,
    index: HashMap<Transformation, NodeId>,
    optimum: Option<NodeId>,
}

impl Lattice {
    /// Build the full lattice over quasi-identifiers whose hierarchies
    /// reach `heights[i]` (inclusive).
    pub fn new(heights: &[u32]) -> Result<Self> {
        if heights.is_empty() {
            return Err(AnonError::InvalidLattice {
                detail: "no quasi-identifiers".to_owned(),
            });
        }
        let size = heights
            .iter()
            .try_fold(1usize, |acc, &h| acc.checked_mul(h as usize + 1))
            .filter(|&s| s <= MAX_LATTICE_SIZE)
            .ok_or_else(|| AnonError::InvalidLattice {
                detail: format!("more than {MAX_LATTICE_SIZE} nodes"),
            })?;

        let mut transformations: Vec<Transformation> = Vec::with_capacity(size);
        let mut current: Transformation = heights.iter().map(|_| 0).collect();
        for _ in 0..size {
            transformations.push(current.clone());
            // Mixed-radix increment, last attribute fastest.
            for i in (0..current.len()).rev() {
                if current[i] < heights[i] {
                    current[i] += 1;
                    break;
                }
                current[i] = 0;
            }
        }
        transformations.sort_by(|a, b| {
            let la: u32 = a.iter().sum();
            let lb: u32 = b.iter().sum();
            la.cmp(&lb).then_with(|| a.cmp(b))
        });

        let mut nodes = Vec::with_capacity(size);
        let mut index = HashMap::with_capacity(size);
        for (i, t) in transformations.into_iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let id = NodeId::new(i as u32);
            index.insert(t.clone(), id);
            nodes.push(LatticeNode::new(id, t));
        }

        let top_level: u32 = heights.iter().sum();
        let mut levels = vec![Vec::new(); top_level as usize + 1];
        for i in 0..nodes.len() {
            let mut probe = nodes[i].transformation.clone();
            for attr in 0..probe.len() {
                if probe[attr] > 0 {
                    probe[attr] -= 1;
                    if let Some(&pred) = index.get(&probe) {
                        nodes[i].predecessors.push(pred);
                    }
                    probe[attr] += 1;
                }
                if probe[attr] < heights[attr] {
                    probe[attr] += 1;
                    if let Some(&succ) = index.get(&probe) {
                        nodes[i].successors.push(succ);
                    }
                    probe[attr] -= 1;
                }
            }
            levels[nodes[i].level as usize].push(nodes[i].id);
        }

        debug!(
            target: "fanon.lattice",
            size,
            attributes = heights.len(),
            levels = levels.len(),
            "lattice allocated"
        );
        Ok(Self {
            nodes,
            levels,
            heights: heights.to_vec(),
            index,
            optimum: None,
        })
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Maximum generalization level per quasi-identifier.
    pub fn heights(&self) -> &[u32] {
        &self.heights
    }

    /// Node ids grouped by level, least generalized first.
    pub fn levels(&self) -> &[Vec<NodeId>] {
        &self.levels
    }

    /// The least generalized node.
    pub fn bottom(&self) -> NodeId {
        NodeId::new(0)
    }

    /// The most generalized node.
    #[allow(clippy::cast_possible_truncation)]
    pub fn top(&self) -> NodeId {
        NodeId::new(self.nodes.len() as u32 - 1)
    }

    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Result<&LatticeNode> {
        self.nodes
            .get(id.index())
            .ok_or(AnonError::NoSuchNode { id: id.get() })
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut LatticeNode> {
        self.nodes
            .get_mut(id.index())
            .ok_or(AnonError::NoSuchNode { id: id.get() })
    }

    /// Node with exactly these generalization levels.
    pub fn find(&self, transformation: &[u32]) -> Option<NodeId> {
        self.index.get(transformation).copied()
    }

    /// The lattice-wide optimum chosen by the search driver.
    pub const fn optimum(&self) -> Option<NodeId> {
        self.optimum
    }

    pub fn set_optimum(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.optimum = Some(id);
        Ok(())
    }

    /// Record the privacy verdict for a node.
    ///
    /// Reporting the verdict a node already carries is a no-op; reporting a
    /// different one fails.
    pub fn report_anonymity(&mut self, id: NodeId, anonymity: Anonymity) -> Result<()> {
        let node = self.node_mut(id)?;
        match node.anonymity {
            Anonymity::Unknown => {
                node.anonymity = anonymity;
                Ok(())
            }
            current if current == anonymity => Ok(()),
            _ => Err(AnonError::AnonymityAlreadySet { id: id.get() }),
        }
    }

    /// Record what the metric knows about a node.
    ///
    /// An exact value pins minimum and maximum to it. A lower bound raises
    /// the node's declared lower bound; an upper bound lowers its maximum.
    /// Neither ever loosens an existing bound.
    pub fn report_information_loss(
        &mut self,
        id: NodeId,
        exact: Option<InformationLoss>,
        lower_bound: Option<InformationLoss>,
        upper_bound: Option<InformationLoss>,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        if let Some(value) = exact {
            node.exact = Some(value);
            node.minimum = Some(value);
            node.maximum = Some(value);
        }
        node.lower_bound = max_loss(node.lower_bound, lower_bound);
        node.maximum = min_loss(node.maximum, upper_bound);
        Ok(())
    }

    pub(crate) fn set_minimum(&mut self, index: usize, value: InformationLoss) {
        self.nodes[index].minimum = Some(value);
    }

    pub(crate) fn set_maximum(&mut self, index: usize, value: InformationLoss) {
        self.nodes[index].maximum = Some(value);
    }
}

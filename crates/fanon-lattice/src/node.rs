use fanon_types::NodeId;
use serde::Serialize;
use smallvec::SmallVec;

use crate::loss::InformationLoss;

/// Generalization level per quasi-identifier.
pub type Transformation = SmallVec<[u32; 8]>;

/// Privacy verdict of a node. Set once by the external evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Anonymity {
    Anonymous,
    NotAnonymous,
    #[default]
    Unknown,
}

/// One combination of generalization levels.
///
/// Bounds only ever tighten. Once both are set,
/// `minimum <= exact <= maximum` holds.
#[derive(Debug, Clone, Serialize)]
pub struct LatticeNode {
    pub(crate) id: NodeId,
    pub(crate) transformation: Transformation,
    pub(crate) level: u32,
    pub(crate) predecessors: Vec<NodeId>,
    pub(crate) successors: Vec<NodeId>,
    pub(crate) anonymity: Anonymity,
    pub(crate) minimum: Option<InformationLoss>,
    pub(crate) maximum: Option<InformationLoss>,
    pub(crate) lower_bound: Option<InformationLoss>,
    pub(crate) exact: Option<InformationLoss>,
}

impl LatticeNode {
    pub(crate) fn new(id: NodeId, transformation: Transformation) -> Self {
        let level = transformation.iter().sum();
        Self {
            id,
            transformation,
            level,
            predecessors: Vec::new(),
            successors: Vec::new(),
            anonymity: Anonymity::Unknown,
            minimum: None,
            maximum: None,
            lower_bound: None,
            exact: None,
        }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Generalization level per quasi-identifier.
    pub fn transformation(&self) -> &[u32] {
        &self.transformation
    }

    /// Sum of the generalization levels; the node's rank in the lattice.
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Nodes one level less generalized on exactly one attribute.
    pub fn predecessors(&self) -> &[NodeId] {
        &self.predecessors
    }

    /// Nodes one level more generalized on exactly one attribute.
    pub fn successors(&self) -> &[NodeId] {
        &self.successors
    }

    pub const fn anonymity(&self) -> Anonymity {
        self.anonymity
    }

    pub const fn minimum(&self) -> Option<InformationLoss> {
        self.minimum
    }

    pub const fn maximum(&self) -> Option<InformationLoss> {
        self.maximum
    }

    pub const fn lower_bound(&self) -> Option<InformationLoss> {
        self.lower_bound
    }

    /// Exact loss, once the node was evaluated.
    pub const fn exact(&self) -> Option<InformationLoss> {
        self.exact
    }

    pub const fn is_evaluated(&self) -> bool {
        self.exact.is_some()
    }

    /// Whether minimum and maximum coincide.
    pub fn is_determined(&self) -> bool {
        matches!((self.minimum, self.maximum), (Some(a), Some(b)) if a == b)
    }
}

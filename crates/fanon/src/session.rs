//! One anonymization session over one dataset.

use std::collections::BTreeMap;

use fanon_data::{Dictionary, EncodedHierarchy, Generalizer, Hierarchy};
use fanon_error::{AnonError, Result};
use fanon_handle::{DataHandle, HandleRef, HandleView, InputHandle, OutputHandle, Registry};
use fanon_lattice::{Anonymity, InformationLoss, Lattice, LossEstimator};
use fanon_subset::DataSubset;
use fanon_types::{DataDefinition, Interrupt, NodeId};
use tracing::info;

use crate::config::SessionConfig;
use crate::source::DataSource;

/// Owns the encoded input, the handle registry and the lattice of one
/// dataset. Closing the session (or releasing its Input handle) releases
/// every handle.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    quasi_identifiers: Vec<usize>,
    hierarchies: Vec<EncodedHierarchy>,
    registry: Registry,
    lattice: Lattice,
    estimator: LossEstimator,
    interrupt: Interrupt,
}

impl Session {
    /// Encode `source` and build the lattice over its quasi-identifiers.
    ///
    /// `hierarchies` maps attribute names to their generalization
    /// hierarchy; every quasi-identifier needs one, entries for other
    /// attributes are ignored.
    pub fn open(
        source: DataSource,
        definition: DataDefinition,
        hierarchies: &BTreeMap<String, Hierarchy>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (header, rows) = source.into_parts();
        if header.len() != definition.len() {
            return Err(AnonError::RowWidthMismatch {
                row: 0,
                expected: definition.len(),
                actual: header.len(),
            });
        }
        for (column, name) in header.iter().enumerate() {
            if definition.index_of(name)? != column {
                return Err(AnonError::NoSuchAttribute { name: name.clone() });
            }
        }
        if let Some(name) = hierarchies.keys().find(|n| definition.index_of(n).is_err()) {
            return Err(AnonError::NoSuchAttribute { name: name.clone() });
        }

        let quasi_identifiers = definition.quasi_identifiers();
        let mut dictionary = Dictionary::new(definition.len());
        let mut encoded = Vec::with_capacity(quasi_identifiers.len());
        for &column in &quasi_identifiers {
            let name = &definition.attribute(column)?.name;
            let hierarchy = hierarchies.get(name).ok_or_else(|| AnonError::InvalidLattice {
                detail: format!("no hierarchy for quasi-identifier '{name}'"),
            })?;
            encoded.push(hierarchy.encode(&mut dictionary, column)?);
        }

        let input = InputHandle::encode(definition, dictionary, rows, &config.null_token)?;
        let heights: Vec<u32> = encoded.iter().map(EncodedHierarchy::max_level).collect();
        let lattice = Lattice::new(&heights)?;
        let estimator = LossEstimator::new(config.monotonicity(), config.loss_range);

        info!(
            target: "fanon.session",
            rows = input.num_rows(),
            columns = input.num_columns(),
            quasi_identifiers = quasi_identifiers.len(),
            lattice_size = lattice.size(),
            "session opened"
        );
        Ok(Self {
            config,
            quasi_identifiers,
            hierarchies: encoded,
            registry: Registry::new(input),
            lattice,
            estimator,
            interrupt: Interrupt::new(),
        })
    }

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Column indices of the quasi-identifiers, in lattice attribute order.
    pub fn quasi_identifiers(&self) -> &[usize] {
        &self.quasi_identifiers
    }

    pub const fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Cancellation token polled by row scans. Clone it to cancel from
    /// another thread.
    pub const fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    // ── Lattice ──────────────────────────────────────────────────────────

    /// Node with the given per-quasi-identifier levels.
    pub fn find(&self, levels: &[u32]) -> Result<NodeId> {
        self.lattice.find(levels).ok_or_else(|| AnonError::InvalidLattice {
            detail: format!("no node with levels {levels:?}"),
        })
    }

    pub fn report_anonymity(&mut self, node: NodeId, anonymity: Anonymity) -> Result<()> {
        self.lattice.report_anonymity(node, anonymity)
    }

    pub fn report_information_loss(
        &mut self,
        node: NodeId,
        exact: Option<InformationLoss>,
        lower_bound: Option<InformationLoss>,
        upper_bound: Option<InformationLoss>,
    ) -> Result<()> {
        self.lattice
            .report_information_loss(node, exact, lower_bound, upper_bound)
    }

    pub fn set_optimum(&mut self, node: NodeId) -> Result<()> {
        self.lattice.set_optimum(node)
    }

    /// Tighten every node's loss bounds from the values reported so far.
    pub fn estimate(&mut self) {
        self.estimator.estimate(&mut self.lattice);
    }

    pub const fn global_minimum(&self) -> Option<InformationLoss> {
        self.estimator.global_minimum()
    }

    pub const fn global_maximum(&self) -> Option<InformationLoss> {
        self.estimator.global_maximum()
    }

    // ── Handles ──────────────────────────────────────────────────────────

    /// Generalize the Input rows to `node` and register the result as that
    /// node's Output handle. `suppressed` rows are blanked and flagged.
    pub fn transform(&mut self, node: NodeId, suppressed: &[usize]) -> Result<()> {
        let transformation = self.lattice.node(node)?.transformation();
        let input = self.registry.input()?;
        let matrix = Generalizer::new(input.dictionary(), &self.hierarchies)?.apply(
            input.matrix(),
            transformation,
            suppressed,
        )?;
        let mut levels = vec![0; input.num_columns()];
        for (&column, &level) in self.quasi_identifiers.iter().zip(transformation) {
            levels[column] = level;
        }
        let output = OutputHandle::new(node, input, matrix, levels)?;
        self.registry.update_output(output)
    }

    pub fn view(&self, handle: HandleRef) -> Result<HandleView<'_>> {
        self.registry.view(handle)
    }

    /// Distinct values of a column, polling the session interrupt.
    pub fn distinct_values(&self, handle: HandleRef, column: usize) -> Result<Vec<String>> {
        self.registry.view(handle)?.distinct_values(
            column,
            &self.interrupt,
            self.config.interrupt_poll_interval,
        )
    }

    /// Install `subset` as the session population.
    pub fn set_population(&mut self, subset: &DataSubset) -> Result<()> {
        self.registry.set_population(subset.set().clone())
    }

    pub fn sort(&mut self, handle: HandleRef, ascending: bool, columns: &[usize]) -> Result<()> {
        self.registry.sort(handle, ascending, columns)
    }

    pub fn sort_range(
        &mut self,
        handle: HandleRef,
        from: usize,
        to: usize,
        ascending: bool,
        columns: &[usize],
    ) -> Result<()> {
        self.registry.sort_range(handle, from, to, ascending, columns)
    }

    pub fn swap(&mut self, handle: HandleRef, row1: usize, row2: usize) -> Result<()> {
        self.registry.swap(handle, row1, row2)
    }

    pub fn release(&mut self, handle: HandleRef) -> Result<()> {
        self.registry.release(handle)
    }

    /// Release every handle. Node bounds stay readable through
    /// [`Session::lattice`].
    pub fn close(&mut self) -> Result<()> {
        if !self.registry.is_released() {
            self.registry.release(HandleRef::Input)?;
        }
        info!(target: "fanon.session", "session closed");
        Ok(())
    }
}

//! Session-wide handle registry.
//!
//! The registry owns the Input handle, every Output handle, and the
//! population subset projected over each of them. All reordering goes
//! through it: a sort or swap requested on any one handle is turned into a
//! sequence of physical row swaps, and every swap is applied to the Input
//! matrix, every Output matrix and the population set before the call
//! returns. Row `i` therefore describes the same source tuple in every
//! handle at all times.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use fanon_data::PopulationSet;
use fanon_error::{AnonError, Result};
use fanon_types::{NodeId, TypedValue};
use serde::Serialize;
use tracing::{debug, warn};

use crate::handle::{DataHandle, HandleRef, HandleView, SubsetView};
use crate::input::InputHandle;
use crate::output::OutputHandle;

// ── Metrics ──────────────────────────────────────────────────────────────

static ROW_SWAPS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SORTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SUBSET_REBUILDS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Snapshot of registry counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryMetricsSnapshot {
    /// Physical row swaps applied across all synchronized handles.
    pub row_swaps_total: u64,
    /// Completed sort requests.
    pub sorts_total: u64,
    /// Subset index arrays re-derived from the population set.
    pub subset_rebuilds_total: u64,
}

/// Read registry counters.
pub fn registry_metrics_snapshot() -> RegistryMetricsSnapshot {
    RegistryMetricsSnapshot {
        row_swaps_total: ROW_SWAPS_TOTAL.load(Ordering::Relaxed),
        sorts_total: SORTS_TOTAL.load(Ordering::Relaxed),
        subset_rebuilds_total: SUBSET_REBUILDS_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset registry counters.
pub fn reset_registry_metrics() {
    ROW_SWAPS_TOTAL.store(0, Ordering::Relaxed);
    SORTS_TOTAL.store(0, Ordering::Relaxed);
    SUBSET_REBUILDS_TOTAL.store(0, Ordering::Relaxed);
}

// ── Registry ─────────────────────────────────────────────────────────────

/// All handles of one dataset session.
#[derive(Debug)]
pub struct Registry {
    /// `None` once the Input handle was released.
    input: Option<InputHandle>,
    outputs: BTreeMap<NodeId, OutputHandle>,
    /// Nodes whose Output was released and not registered again.
    released: BTreeSet<NodeId>,
    population: Option<PopulationSet>,
    input_subset: Option<Vec<usize>>,
    output_subsets: BTreeMap<NodeId, Vec<usize>>,
}

impl Registry {
    pub fn new(input: InputHandle) -> Self {
        Self {
            input: Some(input),
            outputs: BTreeMap::new(),
            released: BTreeSet::new(),
            population: None,
            input_subset: None,
            output_subsets: BTreeMap::new(),
        }
    }

    /// Whether the Input handle (and with it the session) was released.
    pub const fn is_released(&self) -> bool {
        self.input.is_none()
    }

    pub fn input(&self) -> Result<&InputHandle> {
        self.input.as_ref().ok_or_else(|| {
            warn!(target: "fanon.registry", "operation on released session");
            AnonError::HandleReleased
        })
    }

    /// The installed population, if any.
    pub const fn population(&self) -> Option<&PopulationSet> {
        self.population.as_ref()
    }

    /// Nodes with a live Output handle, ascending.
    pub fn output_nodes(&self) -> Vec<NodeId> {
        self.outputs.keys().copied().collect()
    }

    /// Register (or replace) the Output handle of its node.
    ///
    /// The handle must have been derived from the Input rows in their
    /// current order.
    pub fn update_output(&mut self, output: OutputHandle) -> Result<()> {
        let rows = self.input()?.num_rows();
        if output.num_rows() != rows {
            return Err(AnonError::RowCountMismatch {
                expected: rows,
                actual: output.num_rows(),
            });
        }
        let node = output.node();
        if let Some(population) = &self.population {
            self.output_subsets
                .insert(node, population.to_sorted_indices());
        }
        self.released.remove(&node);
        self.outputs.insert(node, output);
        debug!(target: "fanon.registry", %node, outputs = self.outputs.len(), "output registered");
        Ok(())
    }

    /// Install the session population and project it over every handle.
    pub fn set_population(&mut self, population: PopulationSet) -> Result<()> {
        let rows = self.input()?.num_rows();
        if population.capacity() != rows {
            return Err(AnonError::RowCountMismatch {
                expected: rows,
                actual: population.capacity(),
            });
        }
        self.population = Some(population);
        self.rebuild_subsets();
        Ok(())
    }

    /// Release a handle.
    ///
    /// Releasing an Output drops it together with its subset; later access
    /// to that node fails with `HandleReleased` until a new Output is
    /// registered for it. Releasing the Input cascades to every Output and
    /// ends the session; every later operation fails with `HandleReleased`.
    /// Releasing a subset is a no-op.
    pub fn release(&mut self, handle: HandleRef) -> Result<()> {
        self.input()?;
        match handle {
            HandleRef::Input => {
                let outputs = self.outputs.len();
                self.output_subsets.clear();
                self.released.extend(std::mem::take(&mut self.outputs).into_keys());
                self.input_subset = None;
                self.population = None;
                self.input = None;
                debug!(target: "fanon.registry", outputs, "input released");
            }
            HandleRef::Output(node) => {
                self.output(node)?;
                self.outputs.remove(&node);
                self.output_subsets.remove(&node);
                self.released.insert(node);
                debug!(target: "fanon.registry", %node, "output released");
            }
            HandleRef::InputSubset | HandleRef::OutputSubset(_) => {}
        }
        Ok(())
    }

    /// Resolve a handle for reading.
    pub fn view(&self, handle: HandleRef) -> Result<HandleView<'_>> {
        let input = self.input()?;
        match handle {
            HandleRef::Input => Ok(HandleView::Input(input)),
            HandleRef::InputSubset => {
                let indices = self.input_subset.as_deref().ok_or(AnonError::NoSuchHandle)?;
                Ok(HandleView::InputSubset(SubsetView::new(input, indices)))
            }
            HandleRef::Output(node) => self.output(node).map(HandleView::Output),
            HandleRef::OutputSubset(node) => {
                let output = self.output(node)?;
                let indices = self
                    .output_subsets
                    .get(&node)
                    .ok_or(AnonError::NoSuchHandle)?;
                Ok(HandleView::OutputSubset(SubsetView::new(output, indices)))
            }
        }
    }

    /// Live Output of `node`. Fails with `HandleReleased` for a released
    /// node and `NoSuchHandle` for one that was never registered.
    fn output(&self, node: NodeId) -> Result<&OutputHandle> {
        if let Some(output) = self.outputs.get(&node) {
            return Ok(output);
        }
        if self.released.contains(&node) {
            warn!(target: "fanon.registry", %node, "operation on released output");
            return Err(AnonError::HandleReleased);
        }
        Err(AnonError::NoSuchHandle)
    }

    /// Sort all rows of `handle` by `columns`, compared with the requesting
    /// handle's data types.
    pub fn sort(&mut self, handle: HandleRef, ascending: bool, columns: &[usize]) -> Result<()> {
        let rows = self.view(handle)?.num_rows();
        self.sort_range(handle, 0, rows, ascending, columns)
    }

    /// Sort rows `from..to` of `handle` by `columns`.
    ///
    /// Every key is parsed before the first row moves, so a failure leaves
    /// all handles untouched. Ties keep their relative order.
    pub fn sort_range(
        &mut self,
        handle: HandleRef,
        from: usize,
        to: usize,
        ascending: bool,
        columns: &[usize],
    ) -> Result<()> {
        let (keys, translation) = {
            let view = self.view(handle)?;
            let rows = view.num_rows();
            if from > to || to > rows {
                return Err(AnonError::row_out_of_bounds(from.max(to), rows));
            }
            for &column in columns {
                view.data_type(column)?;
            }
            let keys = (from..to)
                .map(|row| {
                    columns
                        .iter()
                        .map(|&column| view.typed_value(row, column))
                        .collect::<Result<Vec<TypedValue>>>()
                })
                .collect::<Result<Vec<_>>>()?;
            (keys, view.subset_indices().map(<[usize]>::to_vec))
        };

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| {
            let ord = keys[a].cmp(&keys[b]);
            if ascending { ord } else { ord.reverse() }
        });

        // Realize the permutation as swaps; at[p] is the original offset
        // currently at position p, pos_of is its inverse.
        let mut at: Vec<usize> = (0..order.len()).collect();
        let mut pos_of = at.clone();
        let mut swaps = 0u64;
        for (k, &want) in order.iter().enumerate() {
            let p = pos_of[want];
            if p == k {
                continue;
            }
            let (r1, r2) = (from + k, from + p);
            match &translation {
                Some(indices) => self.swap_physical(indices[r1], indices[r2])?,
                None => self.swap_physical(r1, r2)?,
            }
            let displaced = at[k];
            at[k] = want;
            at[p] = displaced;
            pos_of[want] = k;
            pos_of[displaced] = p;
            swaps += 1;
        }
        if !handle.is_subset() {
            self.rebuild_subsets();
        }

        SORTS_TOTAL.fetch_add(1, Ordering::Relaxed);
        debug!(
            target: "fanon.registry",
            ?handle,
            from,
            to,
            ascending,
            swaps,
            outputs = self.outputs.len(),
            "sort propagated"
        );
        Ok(())
    }

    /// Swap two rows of `handle`, and the same physical rows everywhere.
    pub fn swap(&mut self, handle: HandleRef, row1: usize, row2: usize) -> Result<()> {
        let (physical1, physical2) = {
            let view = self.view(handle)?;
            let rows = view.num_rows();
            for row in [row1, row2] {
                if row >= rows {
                    return Err(AnonError::row_out_of_bounds(row, rows));
                }
            }
            match view.subset_indices() {
                Some(indices) => (indices[row1], indices[row2]),
                None => (row1, row2),
            }
        };
        self.swap_physical(physical1, physical2)?;
        if !handle.is_subset() {
            self.rebuild_subsets();
        }
        debug!(target: "fanon.registry", ?handle, row1, row2, "swap propagated");
        Ok(())
    }

    fn swap_physical(&mut self, row1: usize, row2: usize) -> Result<()> {
        if row1 == row2 {
            return Ok(());
        }
        if let Some(population) = &mut self.population {
            population.swap(row1, row2)?;
        }
        if let Some(input) = &mut self.input {
            input.swap_rows(row1, row2);
        }
        for output in self.outputs.values_mut() {
            output.swap_rows(row1, row2);
        }
        ROW_SWAPS_TOTAL.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Re-derive every subset index array from the population set.
    fn rebuild_subsets(&mut self) {
        let Some(population) = &self.population else {
            return;
        };
        let indices = population.to_sorted_indices();
        for &node in self.outputs.keys() {
            self.output_subsets.insert(node, indices.clone());
        }
        self.input_subset = Some(indices);
        SUBSET_REBUILDS_TOTAL.fetch_add(self.outputs.len() as u64 + 1, Ordering::Relaxed);
    }
}

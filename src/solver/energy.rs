//! Energy distribution over the connection graph.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, trace, warn};

use super::result::{SimulationResult, EMPTY_CIRCUIT_MESSAGE, NO_PATH_MESSAGE};
use crate::circuit::{ComponentId, ConnectionGraph};
use crate::components::{Component, EnergySource, LedTarget, LossModel, Supercapacitor};
use crate::error::{CircuitError, Result};

/// One found route from the source to a target.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyPath {
    /// Index into the calculator's targets
    pub target: usize,
    /// Component ids from the source to the target, both included
    pub nodes: Vec<ComponentId>,
}

/// The pieces a calculator was built from, handed back when it is torn down.
#[derive(Debug, Clone)]
pub struct CalculatorParts {
    pub source: EnergySource,
    pub targets: Vec<LedTarget>,
    /// Player components that were registered, in no particular order
    pub components: Vec<Component>,
}

/// Owns the connection graph over one level's components and computes how
/// much energy reaches each target.
///
/// The source, targets and supercapacitor are fixed at construction. Player
/// components come and go through [`add_component`](Self::add_component)
/// and [`remove_component`](Self::remove_component).
#[derive(Debug, Clone)]
pub struct EnergyCalculator {
    source: EnergySource,
    targets: Vec<LedTarget>,
    supercapacitor: Supercapacitor,
    /// Player-placed components
    components: HashMap<ComponentId, Component>,
    graph: ConnectionGraph,
    loss_model: LossModel,
}

impl EnergyCalculator {
    /// Create a calculator with the default loss model.
    pub fn new(source: EnergySource, targets: Vec<LedTarget>, supercapacitor: Supercapacitor) -> Self {
        Self {
            source,
            targets,
            supercapacitor,
            components: HashMap::new(),
            graph: ConnectionGraph::new(),
            loss_model: LossModel::default(),
        }
    }

    /// Use a custom loss model.
    pub fn with_loss_model(mut self, loss_model: LossModel) -> Self {
        self.loss_model = loss_model;
        self
    }

    pub fn source(&self) -> &EnergySource {
        &self.source
    }

    pub fn targets(&self) -> &[LedTarget] {
        &self.targets
    }

    pub fn supercapacitor(&self) -> &Supercapacitor {
        &self.supercapacitor
    }

    pub fn loss_model(&self) -> &LossModel {
        &self.loss_model
    }

    /// Whether `id` is the source, a target or the supercapacitor.
    pub fn is_preinstalled(&self, id: &ComponentId) -> bool {
        self.source.id == *id
            || self.supercapacitor.id == *id
            || self.targets.iter().any(|t| t.id == *id)
    }

    /// Whether `id` can take part in connections.
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.is_preinstalled(id) || self.components.contains_key(id)
    }

    /// A registered player component.
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: &ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    /// All registered player components.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Register a player component, replacing any earlier one with the same
    /// id. Preinstalled kinds and ids are refused.
    pub fn add_component(&mut self, component: Component) -> bool {
        if component.is_preinstalled() || self.is_preinstalled(component.id()) {
            return false;
        }
        self.components.insert(component.id().clone(), component);
        true
    }

    /// Unregister a player component after dropping every edge touching it.
    pub fn remove_component(&mut self, id: &ComponentId) -> Option<Component> {
        let component = self.components.remove(id)?;
        self.remove_connections(id);
        Some(component)
    }

    /// Drop every edge touching `id`. Safe to call repeatedly.
    pub fn remove_connections(&mut self, id: &ComponentId) -> usize {
        self.graph.isolate(id)
    }

    /// Wire two known components together.
    ///
    /// Returns `false` for unknown ids and self-loops; reconnecting an
    /// existing pair is a no-op that returns `true`.
    pub fn add_connection(&mut self, from: &ComponentId, to: &ComponentId) -> bool {
        if from == to || !self.contains(from) || !self.contains(to) {
            return false;
        }
        self.graph.connect(from, to);
        true
    }

    /// Remove the wire between two components, if there is one.
    pub fn remove_connection(&mut self, from: &ComponentId, to: &ComponentId) -> bool {
        self.graph.disconnect(from, to)
    }

    pub fn are_connected(&self, a: &ComponentId, b: &ComponentId) -> bool {
        self.graph.are_connected(a, b)
    }

    /// Neighbours of `id` in the order they were wired.
    pub fn neighbors(&self, id: &ComponentId) -> &[ComponentId] {
        self.graph.neighbors(id)
    }

    /// All wires in the order they were added.
    pub fn connections(&self) -> &[(ComponentId, ComponentId)] {
        self.graph.edges()
    }

    /// Tear the calculator down, returning what it was built from. The
    /// supercapacitor is dropped.
    pub fn into_parts(self) -> CalculatorParts {
        CalculatorParts {
            source: self.source,
            targets: self.targets,
            components: self.components.into_values().collect(),
        }
    }

    /// Run one simulation.
    ///
    /// This never fails: internal inconsistencies are reported as an invalid
    /// result carrying the error text.
    pub fn simulate(&mut self) -> SimulationResult {
        match self.try_simulate() {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "simulation aborted");
                SimulationResult::failed(self.source.energy_output.max(0.0), err.to_string())
            }
        }
    }

    fn try_simulate(&mut self) -> Result<SimulationResult> {
        self.supercapacitor.reset();
        for target in &mut self.targets {
            target.current_energy = 0.0;
        }
        self.check_consistency()?;

        let output = self.source.energy_output.max(0.0);

        if self.graph.is_empty() {
            self.supercapacitor.store(output);
            debug!(output, "empty circuit, all energy banked");
            return Ok(SimulationResult {
                is_valid: false,
                targets_lit: Vec::new(),
                total_energy_used: 0.0,
                energy_distribution: BTreeMap::new(),
                heat_loss: 0.0,
                unused_energy: output,
                supercapacitor_energy: self.supercapacitor.stored_energy,
                final_score: self.supercapacitor.stored_energy,
                source_output: output,
                errors: vec![EMPTY_CIRCUIT_MESSAGE.to_string()],
            });
        }

        let mut paths = Vec::new();
        let mut errors = Vec::new();
        for (index, target) in self.targets.iter().enumerate() {
            match self.find_path(&target.id)? {
                Some(nodes) => paths.push(EnergyPath { target: index, nodes }),
                None => errors.push(format!("No valid path to target {}", target.id)),
            }
        }

        if paths.is_empty() {
            debug!(targets = self.targets.len(), "no target reachable");
            return Ok(SimulationResult::failed(output, NO_PATH_MESSAGE));
        }

        // Parallel branches share the source evenly.
        let share = output / paths.len() as f64;
        let mut total_energy_used = 0.0;
        let mut heat_loss = 0.0;
        let mut banked = 0.0;
        let mut delivered_total = 0.0;
        let mut energy_distribution = BTreeMap::new();
        let mut targets_lit = Vec::new();

        for path in &paths {
            let losses = self.path_losses(&path.nodes, share);
            let delivered = (share - losses).max(0.0);
            let target = &mut self.targets[path.target];
            target.current_energy = delivered;
            trace!(target = %target.id, hops = path.nodes.len(), losses, delivered, "path evaluated");

            total_energy_used += losses;
            delivered_total += delivered;
            energy_distribution.insert(target.id.clone(), delivered);
            if target.is_in_sweet_spot(delivered) {
                targets_lit.push(target.id.clone());
                banked += delivered;
            } else {
                heat_loss += delivered;
            }
        }

        let unused_energy = (output - total_energy_used - delivered_total).max(0.0);
        self.supercapacitor.store(banked + unused_energy);

        let is_valid = targets_lit.len() == self.targets.len();
        debug!(
            lit = targets_lit.len(),
            targets = self.targets.len(),
            used = total_energy_used,
            heat = heat_loss,
            stored = self.supercapacitor.stored_energy,
            "simulation finished"
        );

        Ok(SimulationResult {
            is_valid,
            targets_lit,
            total_energy_used,
            energy_distribution,
            heat_loss,
            unused_energy,
            supercapacitor_energy: self.supercapacitor.stored_energy,
            final_score: self.supercapacitor.stored_energy,
            source_output: output,
            errors,
        })
    }

    /// Every wired id must be registered and every value finite.
    fn check_consistency(&self) -> Result<()> {
        for id in self.graph.connected_ids() {
            if !self.contains(id) {
                return Err(CircuitError::DanglingConnection { id: id.to_string() });
            }
        }
        let source = Component::Source(self.source.clone());
        source.check_finite()?;
        for target in &self.targets {
            Component::LedTarget(target.clone()).check_finite()?;
        }
        for component in self.components.values() {
            component.check_finite()?;
        }
        Ok(())
    }

    /// First path found by depth-first search from the source to `target`.
    ///
    /// Children are explored in wiring order and the first hit wins; no
    /// attempt is made to find a shorter or cheaper path.
    pub fn find_path(&self, target: &ComponentId) -> Result<Option<Vec<ComponentId>>> {
        let start = self.source.id.clone();
        self.search(&start, target, HashSet::new(), vec![start.clone()])
    }

    fn search(
        &self,
        current: &ComponentId,
        target: &ComponentId,
        mut visited: HashSet<ComponentId>,
        path: Vec<ComponentId>,
    ) -> Result<Option<Vec<ComponentId>>> {
        if current == target {
            return Ok(Some(path));
        }
        visited.insert(current.clone());

        for next in self.graph.neighbors(current) {
            if visited.contains(next) || !self.conducts(next)? {
                continue;
            }
            let mut branch = path.clone();
            branch.push(next.clone());
            // Each branch gets its own copy so siblings may revisit shared nodes.
            if let Some(found) = self.search(next, target, visited.clone(), branch)? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    fn conducts(&self, id: &ComponentId) -> Result<bool> {
        if self.is_preinstalled(id) {
            return Ok(true);
        }
        self.components
            .get(id)
            .map(Component::conducts)
            .ok_or_else(|| CircuitError::DanglingConnection { id: id.to_string() })
    }

    /// Losses along `nodes` for `input` EU entering at the source.
    fn path_losses(&self, nodes: &[ComponentId], input: f64) -> f64 {
        let mut flow = input;
        let mut losses = 0.0;
        let intermediates = nodes.get(1..nodes.len().saturating_sub(1)).unwrap_or(&[]);
        for id in intermediates {
            let loss = self
                .components
                .get(id)
                .map(|c| c.path_loss(flow, &self.loss_model))
                .unwrap_or(0.0)
                .clamp(0.0, flow);
            losses += loss;
            flow -= loss;
        }
        losses
    }
}

//! Structural duplicate detection across a level corpus.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{TestCategory, TestResult, ValidationConfig};
use crate::level::{AvailableComponentDef, LevelDefinition, TargetDef};

const TARGET_FIELDS: usize = 4;
const COMPONENT_FIELDS: usize = 6;

/// How similar one known level is to the level being checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCheckResult {
    pub level_id: String,
    /// Fraction of compared fields that match, 0 to 1
    pub similarity: f64,
}

/// Matched and compared field counts.
#[derive(Debug, Default)]
struct Tally {
    matched: usize,
    total: usize,
}

impl Tally {
    fn field<T: PartialEq + ?Sized>(&mut self, a: &T, b: &T) {
        self.total += 1;
        if a == b {
            self.matched += 1;
        }
    }

    fn value(&mut self, a: f64, b: f64) {
        self.total += 1;
        if values_match(a, b) {
            self.matched += 1;
        }
    }

    fn mismatched(&mut self, fields: usize) {
        self.total += fields;
    }

    fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

fn values_match(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// Keeps every known level and compares new ones against them.
///
/// Ids, titles, descriptions, timestamps, generator versions and positions
/// are ignored, so two generator runs of the same puzzle compare equal.
#[derive(Debug, Clone)]
pub struct DuplicateChecker {
    registry: BTreeMap<String, LevelDefinition>,
    duplicate_threshold: f64,
    warning_threshold: f64,
}

impl Default for DuplicateChecker {
    fn default() -> Self {
        Self::new(&ValidationConfig::default())
    }
}

impl DuplicateChecker {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            registry: BTreeMap::new(),
            duplicate_threshold: config.duplicate_threshold,
            warning_threshold: config.similarity_warning_threshold,
        }
    }

    /// Add `level` to the registry, replacing a level with the same id.
    pub fn register(&mut self, level: &LevelDefinition) {
        if self
            .registry
            .insert(level.id().to_string(), level.clone())
            .is_some()
        {
            debug!(level = level.id(), "replaced registered level");
        }
    }

    pub fn contains(&self, level_id: &str) -> bool {
        self.registry.contains_key(level_id)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Similarity of two levels: matching fields over compared fields.
    pub fn similarity(a: &LevelDefinition, b: &LevelDefinition) -> f64 {
        let mut tally = Tally::default();

        tally.field(a.metadata.difficulty.as_str(), b.metadata.difficulty.as_str());
        tally.field(&sorted_tags(a), &sorted_tags(b));

        let (sa, sb) = (a.source(), b.source());
        tally.value(sa.voltage, sb.voltage);
        tally.value(sa.energy_output, sb.energy_output);
        tally.field(&sa.is_stable, &sb.is_stable);

        let (ta, tb) = (sorted_targets(a), sorted_targets(b));
        for (x, y) in ta.iter().zip(&tb) {
            compare_targets(&mut tally, x, y);
        }
        tally.mismatched(ta.len().abs_diff(tb.len()) * TARGET_FIELDS);

        let (ca, cb) = (sorted_components(a), sorted_components(b));
        for (x, y) in ca.iter().zip(&cb) {
            compare_components(&mut tally, x, y);
        }
        tally.mismatched(ca.len().abs_diff(cb.len()) * COMPONENT_FIELDS);

        tally.ratio()
    }

    /// Every registered level other than `level` itself, most similar first.
    pub fn find_similar(&self, level: &LevelDefinition) -> Vec<DuplicateCheckResult> {
        let mut results: Vec<_> = self
            .registry
            .iter()
            .filter(|(id, _)| id.as_str() != level.id())
            .map(|(id, other)| DuplicateCheckResult {
                level_id: id.clone(),
                similarity: Self::similarity(level, other),
            })
            .collect();
        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results
    }

    /// Compare `level` against the registry.
    pub fn check(&self, level: &LevelDefinition) -> Vec<TestResult> {
        let similar = self.find_similar(level);
        let duplicates: Vec<_> = similar
            .iter()
            .filter(|r| r.similarity > self.duplicate_threshold)
            .collect();
        let near: Vec<_> = similar
            .iter()
            .filter(|r| r.similarity > self.warning_threshold && r.similarity <= self.duplicate_threshold)
            .collect();

        let result = if !duplicates.is_empty() {
            warn!(level = level.id(), count = duplicates.len(), "duplicate level");
            TestResult::critical(
                TestCategory::Duplicate,
                "duplicate_detection",
                format!("Level duplicates {} existing level(s)", duplicates.len()),
            )
            .with_details(describe(&duplicates))
        } else if !near.is_empty() {
            TestResult::warning(
                TestCategory::Duplicate,
                "duplicate_detection",
                format!("Level is very similar to {} existing level(s)", near.len()),
            )
            .with_details(describe(&near))
        } else {
            TestResult::pass(
                TestCategory::Duplicate,
                "duplicate_detection",
                format!("Level is unique among {} other level(s)", similar.len()),
            )
        };
        vec![result]
    }
}

fn describe(results: &[&DuplicateCheckResult]) -> String {
    results
        .iter()
        .map(|r| format!("{} ({:.1}%)", r.level_id, r.similarity * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sorted_tags(level: &LevelDefinition) -> Vec<&str> {
    let mut tags: Vec<_> = level.metadata.archetype_tags.iter().map(String::as_str).collect();
    tags.sort_unstable();
    tags
}

fn sorted_targets(level: &LevelDefinition) -> Vec<&TargetDef> {
    let mut targets: Vec<_> = level.targets().iter().collect();
    targets.sort_by(|a, b| {
        a.range_min()
            .total_cmp(&b.range_min())
            .then_with(|| cmp_values(&a.energy_range, &b.energy_range))
            .then_with(|| a.component_type.cmp(&b.component_type))
            .then_with(|| a.color.cmp(&b.color))
    });
    targets
}

fn sorted_components(level: &LevelDefinition) -> Vec<&AvailableComponentDef> {
    let mut components: Vec<_> = level.available_components().iter().collect();
    components.sort_by(|a, b| {
        a.nominal_value
            .total_cmp(&b.nominal_value)
            .then_with(|| a.component_type.cmp(&b.component_type))
            .then_with(|| a.effective_value().total_cmp(&b.effective_value()))
            .then_with(|| cmp_values(a.resistance.as_slice(), b.resistance.as_slice()))
            .then_with(|| a.quantity.cmp(&b.quantity))
            .then_with(|| a.is_red_herring.cmp(&b.is_red_herring))
    });
    components
}

/// Lexicographic order over float lists; shorter lists sort first on a tie.
fn cmp_values(a: &[f64], b: &[f64]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn compare_targets(tally: &mut Tally, a: &TargetDef, b: &TargetDef) {
    tally.field(&a.component_type, &b.component_type);
    match (a.range(), b.range()) {
        (Some((amin, amax)), Some((bmin, bmax))) => {
            tally.value(amin, bmin);
            tally.value(amax, bmax);
        }
        _ => {
            tally.field(&a.energy_range.first(), &b.energy_range.first());
            tally.field(&a.energy_range.get(1), &b.energy_range.get(1));
        }
    }
    tally.field(a.color.as_str(), b.color.as_str());
}

fn compare_components(tally: &mut Tally, a: &AvailableComponentDef, b: &AvailableComponentDef) {
    tally.field(&a.component_type, &b.component_type);
    tally.value(a.nominal_value, b.nominal_value);
    tally.value(a.effective_value(), b.effective_value());
    tally.field(&a.quantity, &b.quantity);
    tally.field(&a.is_red_herring, &b.is_red_herring);
    match (a.resistance, b.resistance) {
        (Some(x), Some(y)) => tally.value(x, y),
        (x, y) => tally.field(&x.is_some(), &y.is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Position;
    use crate::test_utils::{capacitor_def, resistor_def, solved_level, LevelBuilder};
    use crate::validation::Severity;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_levels_except_volatile_fields() {
        let a = solved_level("A");
        let mut b = solved_level("B");
        b.metadata.title = Some("Another title".to_string());
        b.metadata.generated_at = Some("2025-06-01T00:00:00Z".to_string());
        b.metadata.generator_version = Some("9.9".to_string());
        b.circuit_definition.source.position = Position::new(3, 3);
        b.circuit_definition.targets[0].position = Position::new(1, 1);

        assert_relative_eq!(DuplicateChecker::similarity(&a, &b), 1.0);

        let mut checker = DuplicateChecker::default();
        checker.register(&a);
        checker.register(&b);
        let results = checker.check(&b);
        assert_eq!(results.len(), 1);
        assert!(!results[0].passed);
        assert_eq!(results[0].severity, Severity::Critical);
        assert!(results[0].details.as_deref().unwrap().contains("A (100.0%)"));
    }

    #[test]
    fn test_order_of_targets_and_components_is_ignored() {
        let a = LevelBuilder::new("A")
            .target("T1", 10.0, 20.0)
            .target("T2", 30.0, 40.0)
            .component(resistor_def("R1", 1.0))
            .component(capacitor_def("C1", 100.0))
            .build();
        let b = LevelBuilder::new("B")
            .target("X2", 30.0, 40.0)
            .target("X1", 10.0, 20.0)
            .component(capacitor_def("C9", 100.0))
            .component(resistor_def("R9", 1.0))
            .build();
        assert_relative_eq!(DuplicateChecker::similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_extra_entries_count_as_mismatches() {
        let a = LevelBuilder::new("A").target("T", 10.0, 20.0).build();
        let b = LevelBuilder::new("B")
            .target("T", 10.0, 20.0)
            .component(resistor_def("R1", 1.0))
            .build();
        // 2 metadata + 3 source + 4 target fields match, 6 component fields do not
        assert_relative_eq!(DuplicateChecker::similarity(&a, &b), 9.0 / 15.0);
    }

    #[test]
    fn test_near_duplicate_warns() {
        let a = LevelBuilder::new("A")
            .target("T", 10.0, 20.0)
            .component(resistor_def("R1", 1.0))
            .component(resistor_def("R2", 2.0))
            .build();
        let b = LevelBuilder::new("B")
            .target("T", 10.0, 20.0)
            .component(resistor_def("R1", 1.0))
            .component(resistor_def("R2", 2.5))
            .build();
        // 18 of 21 fields match
        let similarity = DuplicateChecker::similarity(&a, &b);
        assert_relative_eq!(similarity, 18.0 / 21.0);

        let mut checker = DuplicateChecker::default();
        checker.register(&a);
        checker.register(&b);
        let result = &checker.check(&a)[0];
        assert!(result.passed);
        assert!(result.is_warning());
    }

    #[test]
    fn test_unique_level_passes() {
        let a = solved_level("A");
        let b = LevelBuilder::new("B").source(5.0, 50.0).target("T", 1.0, 2.0).build();
        let mut checker = DuplicateChecker::default();
        checker.register(&a);
        checker.register(&b);

        let result = &checker.check(&a)[0];
        assert!(result.passed);
        assert!(!result.is_warning());
        assert_eq!(checker.find_similar(&a).len(), 1);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut checker = DuplicateChecker::default();
        checker.register(&solved_level("A"));
        checker.register(&solved_level("A"));
        assert_eq!(checker.len(), 1);
        assert!(checker.contains("A"));
        // A level is never its own duplicate
        assert!(checker.check(&solved_level("A"))[0].passed);
    }

    #[test]
    fn test_ties_on_sort_key_are_ignored() {
        let a = LevelBuilder::new("A")
            .target("T1", 10.0, 20.0)
            .target("T2", 10.0, 30.0)
            .component(resistor_def("R1", 5.0))
            .component(AvailableComponentDef {
                resistance: Some(12.0),
                ..resistor_def("R2", 5.0)
            })
            .build();
        let b = LevelBuilder::new("B")
            .target("T2", 10.0, 30.0)
            .target("T1", 10.0, 20.0)
            .component(AvailableComponentDef {
                resistance: Some(12.0),
                ..resistor_def("R2", 5.0)
            })
            .component(resistor_def("R1", 5.0))
            .build();
        assert_relative_eq!(DuplicateChecker::similarity(&a, &b), 1.0);

        let mut checker = DuplicateChecker::default();
        checker.register(&a);
        checker.register(&b);
        let result = &checker.check(&b)[0];
        assert!(!result.passed);
        assert_eq!(result.severity, Severity::Critical);
    }
}

//! Offline validation of generated levels.
//!
//! Three independent validators look at a level definition and its recorded
//! optimal solution:
//!
//! - [`DuplicateChecker`]: structural similarity against every known level
//! - [`EnergyValidator`]: source and range sanity, conservation of energy
//! - [`SweetSpotValidator`]: inclusive range boundaries and score bookkeeping
//!
//! [`LevelTestRunner`] runs them and folds their [`TestResult`]s into a
//! [`LevelValidationReport`]. Validators simulate on their own
//! [`CircuitSimulator`](crate::solver::CircuitSimulator) and never touch a
//! player's session. Findings are data, never errors.

mod duplicates;
mod energy;
mod runner;
mod sweet_spot;

pub use duplicates::{DuplicateCheckResult, DuplicateChecker};
pub use energy::EnergyValidator;
pub use runner::{CorpusReport, LevelTestRunner, LevelValidationReport, TestSummary, ValidationStatus};
pub use sweet_spot::{BoundaryCase, SweetSpotValidator};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::solver::SimulatorConfig;

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    /// A design choice that may be intentional
    Warning,
    Error,
    /// A broken physical law: energy created or destroyed, score above 100%
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Which validator produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestCategory {
    Duplicate,
    Energy,
    SweetSpot,
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TestCategory::Duplicate => "duplicate",
            TestCategory::Energy => "energy",
            TestCategory::SweetSpot => "sweet-spot",
        };
        f.write_str(name)
    }
}

/// One finding about one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub category: TestCategory,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TestResult {
    fn new(
        category: TestCategory,
        name: impl Into<String>,
        passed: bool,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            passed,
            severity,
            message: message.into(),
            details: None,
        }
    }

    /// A passing check.
    pub fn pass(category: TestCategory, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(category, name, true, Severity::Info, message)
    }

    /// A check that passed with reservations.
    pub fn warning(category: TestCategory, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(category, name, true, Severity::Warning, message)
    }

    pub fn error(category: TestCategory, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(category, name, false, Severity::Error, message)
    }

    pub fn critical(category: TestCategory, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(category, name, false, Severity::Critical, message)
    }

    /// Attach free-form details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Which validator to run in a quick check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckType {
    Duplicate,
    Energy,
    SweetSpot,
}

impl From<CheckType> for TestCategory {
    fn from(check: CheckType) -> Self {
        match check {
            CheckType::Duplicate => TestCategory::Duplicate,
            CheckType::Energy => TestCategory::Energy,
            CheckType::SweetSpot => TestCategory::SweetSpot,
        }
    }
}

/// Thresholds used by the validators.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Similarity above which two levels are duplicates
    pub duplicate_threshold: f64,
    /// Similarity above which two levels are suspiciously alike
    pub similarity_warning_threshold: f64,
    /// Allowed energy imbalance, as a fraction of the source output
    pub conservation_tolerance: f64,
    /// Allowed gap between computed and declared score, in percentage points
    pub score_tolerance: f64,
    /// Allowed gap between recomputed and reported efficiency, in points
    pub efficiency_tolerance: f64,
    /// Highest score a heat-only circuit may reach, in percent
    pub heat_loss_allowance: f64,
    /// Offset used for the just-outside boundary cases, in EU
    pub boundary_epsilon: f64,
    /// Configuration of the validators' own simulators
    pub simulator: SimulatorConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: 0.95,
            similarity_warning_threshold: 0.8,
            conservation_tolerance: 0.01,
            score_tolerance: 5.0,
            efficiency_tolerance: 0.1,
            heat_loss_allowance: 5.0,
            boundary_epsilon: 0.01,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_threshold(mut self, threshold: f64) -> Self {
        self.duplicate_threshold = threshold;
        self
    }

    pub fn with_similarity_warning_threshold(mut self, threshold: f64) -> Self {
        self.similarity_warning_threshold = threshold;
        self
    }

    pub fn with_conservation_tolerance(mut self, tolerance: f64) -> Self {
        self.conservation_tolerance = tolerance;
        self
    }

    pub fn with_score_tolerance(mut self, points: f64) -> Self {
        self.score_tolerance = points;
        self
    }

    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = simulator;
        self
    }
}

/// Problems with a target's `energy_range`, if any.
pub(crate) fn range_problem(range: &[f64]) -> Option<String> {
    match range {
        [min, max] => {
            if !min.is_finite() || !max.is_finite() {
                Some("range bounds must be finite".to_string())
            } else if *min <= 0.0 {
                Some(format!("range minimum {min} must be positive"))
            } else if min >= max {
                Some(format!("range [{min}, {max}] must be increasing"))
            } else {
                None
            }
        }
        other => Some(format!("range needs two values, got {}", other.len())),
    }
}

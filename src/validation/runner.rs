//! Runs the validators over levels and summarises the findings.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{
    CheckType, DuplicateChecker, EnergyValidator, Severity, SweetSpotValidator, TestCategory,
    TestResult, ValidationConfig,
};
use crate::error::{CircuitError, Result};
use crate::level::LevelDefinition;

/// Overall verdict for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Passed,
    Warning,
    Failed,
    Critical,
}

impl ValidationStatus {
    /// Derive the verdict: critical beats failed beats warning.
    pub fn from_results(results: &[TestResult]) -> Self {
        let failed = |severity: Severity| results.iter().any(|r| !r.passed && r.severity == severity);
        if failed(Severity::Critical) {
            ValidationStatus::Critical
        } else if results.iter().any(|r| !r.passed) {
            ValidationStatus::Failed
        } else if results.iter().any(TestResult::is_warning) {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Passed
        }
    }

    /// Whether a CI run should fail on this verdict.
    pub fn is_failure(self) -> bool {
        matches!(self, ValidationStatus::Failed | ValidationStatus::Critical)
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationStatus::Passed => "passed",
            ValidationStatus::Warning => "warning",
            ValidationStatus::Failed => "failed",
            ValidationStatus::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Counts over one level's findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    /// Failed findings with error severity, also counted in `failed`
    pub errors: usize,
    /// Failed findings with critical severity, also counted in `failed`
    pub critical: usize,
}

impl TestSummary {
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = TestSummary {
            total: results.len(),
            ..Default::default()
        };
        for result in results {
            if result.passed {
                summary.passed += 1;
                if result.is_warning() {
                    summary.warnings += 1;
                }
            } else {
                summary.failed += 1;
                match result.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Critical => summary.critical += 1,
                    Severity::Info | Severity::Warning => {}
                }
            }
        }
        summary
    }
}

/// Everything the validators found about one level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelValidationReport {
    pub level_id: String,
    pub status: ValidationStatus,
    pub summary: TestSummary,
    pub results: Vec<TestResult>,
    pub recommendations: Vec<String>,
}

impl LevelValidationReport {
    pub fn new(level_id: impl Into<String>, results: Vec<TestResult>) -> Self {
        let status = ValidationStatus::from_results(&results);
        Self {
            level_id: level_id.into(),
            status,
            summary: TestSummary::from_results(&results),
            recommendations: recommendations(&results),
            results,
        }
    }

    /// Findings from one validator.
    pub fn results_for(&self, category: TestCategory) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(move |r| r.category == category)
    }

    pub fn to_json(&self) -> Result<String> {
        to_json(self)
    }
}

/// Aggregate over a validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusReport {
    pub total_levels: usize,
    pub passed: usize,
    pub warning: usize,
    pub failed: usize,
    pub critical: usize,
    pub levels: Vec<LevelValidationReport>,
}

impl CorpusReport {
    pub fn from_reports(levels: Vec<LevelValidationReport>) -> Self {
        let mut report = CorpusReport {
            total_levels: levels.len(),
            ..Default::default()
        };
        for level in &levels {
            match level.status {
                ValidationStatus::Passed => report.passed += 1,
                ValidationStatus::Warning => report.warning += 1,
                ValidationStatus::Failed => report.failed += 1,
                ValidationStatus::Critical => report.critical += 1,
            }
        }
        report.levels = levels;
        report
    }

    /// Whether any level failed or broke a physical law.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.critical > 0
    }

    pub fn to_json(&self) -> Result<String> {
        to_json(self)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| CircuitError::ReportWriteError {
        message: e.to_string(),
    })
}

fn recommendations(results: &[TestResult]) -> Vec<String> {
    let failing = |category: TestCategory| results.iter().any(|r| !r.passed && r.category == category);
    let mut advice = Vec::new();
    if failing(TestCategory::Duplicate) {
        advice.push(
            "Regenerate this level or change its parts: it matches an existing level".to_string(),
        );
    }
    if failing(TestCategory::Energy) {
        advice.push(
            "Review the source output, target ranges and optimal solution: energy does not add up"
                .to_string(),
        );
    }
    if failing(TestCategory::SweetSpot) {
        advice.push(
            "Check the target ranges against the energy the optimal solution delivers".to_string(),
        );
    }
    if advice.is_empty() && results.iter().any(TestResult::is_warning) {
        advice.push("Review the warnings; they may be intentional design choices".to_string());
    }
    advice
}

/// Runs every validator over a level or a whole corpus.
#[derive(Debug, Clone)]
pub struct LevelTestRunner {
    duplicates: DuplicateChecker,
    energy: EnergyValidator,
    sweet_spot: SweetSpotValidator,
}

impl Default for LevelTestRunner {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

impl LevelTestRunner {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            duplicates: DuplicateChecker::new(&config),
            energy: EnergyValidator::new(config.clone()),
            sweet_spot: SweetSpotValidator::new(config),
        }
    }

    /// Make `level` known to the duplicate checker without validating it.
    pub fn register(&mut self, level: &LevelDefinition) {
        self.duplicates.register(level);
    }

    pub fn duplicate_checker(&self) -> &DuplicateChecker {
        &self.duplicates
    }

    /// Validate a corpus. Every level is registered before the first
    /// comparison, so each one is checked against all the others.
    pub fn run_all(&mut self, levels: &[LevelDefinition]) -> CorpusReport {
        for level in levels {
            self.register(level);
        }
        let reports: Vec<_> = levels.iter().map(|level| self.validate(level)).collect();
        let report = CorpusReport::from_reports(reports);
        info!(
            levels = report.total_levels,
            passed = report.passed,
            warning = report.warning,
            failed = report.failed,
            critical = report.critical,
            "validation run finished"
        );
        report
    }

    /// Validate one level against whatever is registered.
    pub fn run_level(&mut self, level: &LevelDefinition) -> LevelValidationReport {
        self.register(level);
        self.validate(level)
    }

    /// Run a single validator on one level.
    pub fn run_check(&mut self, level: &LevelDefinition, check: CheckType) -> LevelValidationReport {
        self.register(level);
        let results = self.check(level, check);
        self.report(level, results)
    }

    fn validate(&mut self, level: &LevelDefinition) -> LevelValidationReport {
        let mut results = Vec::new();
        for check in [CheckType::Duplicate, CheckType::Energy, CheckType::SweetSpot] {
            results.extend(self.check(level, check));
        }
        self.report(level, results)
    }

    fn check(&mut self, level: &LevelDefinition, check: CheckType) -> Vec<TestResult> {
        match check {
            CheckType::Duplicate => self.duplicates.check(level),
            CheckType::Energy => self.energy.validate(level),
            CheckType::SweetSpot => self.sweet_spot.validate(level),
        }
    }

    fn report(&self, level: &LevelDefinition, results: Vec<TestResult>) -> LevelValidationReport {
        let report = LevelValidationReport::new(level.id(), results);
        if report.status.is_failure() {
            warn!(level = level.id(), status = %report.status, failed = report.summary.failed, "level failed validation");
        } else {
            info!(level = level.id(), status = %report.status, "level validated");
        }
        report
    }
}

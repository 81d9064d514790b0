//! Report validator

use crate::factory::ReportRules;
use crate::Result;
use nibrs_catalog::{Catalog, ErrorCatalog};
use nibrs_model::{GroupAIncident, GroupBArrest, NibrsError, Report, ZeroReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Keep errors the catalog marks as warnings
    pub include_warnings: bool,
    /// Error codes dropped from every result
    pub suppressed_codes: BTreeSet<String>,
    /// Maximum errors kept per report (0 = unlimited)
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            include_warnings: true,
            suppressed_codes: BTreeSet::new(),
            max_errors: 0,
        }
    }
}

impl ValidationConfig {
    #[must_use]
    pub fn with_warnings(mut self, include: bool) -> Self {
        self.include_warnings = include;
        self
    }

    #[must_use]
    pub fn suppress(mut self, code: impl Into<String>) -> Self {
        self.suppressed_codes.insert(code.into());
        self
    }

    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    fn keeps(&self, error: &NibrsError) -> bool {
        (self.include_warnings || !error.warning)
            && !self.suppressed_codes.contains(error.code.as_str())
    }
}

/// Runs every rule set against a report
///
/// All rules run; the result holds every violation in rule order, report-level
/// rules first and then each child segment type in instance order.
pub struct ReportValidator {
    rules: ReportRules,
    errors: ErrorCatalog,
    config: ValidationConfig,
}

impl ReportValidator {
    /// Build a validator with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error`] if a rule factory cannot be assembled from `catalog`.
    pub fn new(catalog: &Catalog) -> Result<Self> {
        Ok(Self {
            rules: ReportRules::from_catalog(catalog)?,
            errors: catalog.errors.clone(),
            config: ValidationConfig::default(),
        })
    }

    #[must_use]
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate one report.
    #[must_use]
    pub fn validate(&self, report: &Report) -> Vec<NibrsError> {
        let mut errors = match report {
            Report::GroupA(incident) => self.validate_incident(incident),
            Report::GroupB(arrest) => self.validate_arrest(arrest),
            Report::Zero(zero) => self.validate_zero_report(zero),
        };
        let raised = errors.len();

        for error in &mut errors {
            error.warning = self.errors.is_warning(error.code.as_str());
        }
        errors.retain(|e| self.config.keeps(e));
        if self.config.max_errors > 0 {
            errors.truncate(self.config.max_errors);
        }

        debug!(
            identifier = report.identifier().unwrap_or_default(),
            raised,
            kept = errors.len(),
            "Validated report"
        );
        errors
    }

    fn validate_incident(&self, incident: &GroupAIncident) -> Vec<NibrsError> {
        let rules = &self.rules;
        let mut errors = rules.incident.apply(incident);
        trace!(count = errors.len(), "administrative segment checked");

        for offense in &incident.offenses {
            errors.extend(rules.offense.apply_in(offense, incident));
        }
        for property in &incident.properties {
            errors.extend(rules.property.apply_in(property, incident));
        }
        for victim in &incident.victims {
            errors.extend(rules.victim.apply_in(victim, incident));
        }
        for offender in &incident.offenders {
            errors.extend(rules.offender.apply_in(offender, incident));
        }
        for arrestee in &incident.arrestees {
            errors.extend(rules.arrestee(arrestee).apply_in(arrestee, incident));
        }
        errors
    }

    fn validate_arrest(&self, arrest: &GroupBArrest) -> Vec<NibrsError> {
        let mut errors = self.rules.group_b.apply(arrest);
        for arrestee in &arrest.arrestees {
            errors.extend(self.rules.arrestee(arrestee).apply(arrestee));
        }
        errors
    }

    fn validate_zero_report(&self, zero: &ZeroReport) -> Vec<NibrsError> {
        self.rules.zero_report.apply(zero)
    }
}

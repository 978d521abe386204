//! Input validation for camp scheduling problems.
//!
//! Checks structural integrity of troops, the activity catalog, and the
//! rule tables before scheduling. Detects:
//! - Duplicate troop names
//! - Troops with no scouts
//! - Duplicate entries in a preference list
//! - Preferences, day requests, conflicts, or rules naming activities
//!   missing from the catalog
//! - Rule limits that can never be satisfied (zero capacity)

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{ActivityCatalog, RuleTables, Troop};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?}: {message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two troops share the same name.
    DuplicateId,
    /// A troop has no scouts.
    EmptyTroop,
    /// A preference list names the same activity twice.
    DuplicatePreference,
    /// A troop or activity refers to an activity not in the catalog.
    InvalidActivityReference,
    /// A rule table refers to an activity not in the catalog.
    InvalidRuleReference,
    /// A rule limit is zero.
    InvalidRuleLimit,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a camp scheduling run.
///
/// Checks:
/// 1. No duplicate troop names
/// 2. Every troop has at least one scout
/// 3. No activity appears twice in one preference list
/// 4. All preferences and day requests name catalog activities
/// 5. All `conflicts_with` entries name catalog activities
/// 6. All rule-table activities exist in the catalog
/// 7. Capacity and sharing limits are non-zero
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    troops: &[Troop],
    catalog: &ActivityCatalog,
    rules: &RuleTables,
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut troop_names = HashSet::new();
    for troop in troops {
        if !troop_names.insert(troop.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate troop name: {}", troop.name),
            ));
        }

        if troop.scouts == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyTroop,
                format!("Troop '{}' has no scouts", troop.name),
            ));
        }

        let mut seen = HashSet::new();
        for pref in &troop.preferences {
            if !seen.insert(pref.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicatePreference,
                    format!("Troop '{}' ranks '{}' more than once", troop.name, pref),
                ));
            }
            if !catalog.contains(pref) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidActivityReference,
                    format!("Troop '{}' prefers unknown activity '{}'", troop.name, pref),
                ));
            }
        }

        for (day, acts) in &troop.day_requests {
            for act in acts {
                if !catalog.contains(act) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidActivityReference,
                        format!(
                            "Troop '{}' requests unknown activity '{}' on {}",
                            troop.name, act, day
                        ),
                    ));
                }
            }
        }
    }

    // Check conflict references
    for act in catalog.iter() {
        for other in &act.conflicts_with {
            if !catalog.contains(other) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidActivityReference,
                    format!(
                        "Activity '{}' conflicts with unknown activity '{}'",
                        act.name, other
                    ),
                ));
            }
        }
    }

    // Check rule references
    for name in rules.referenced_activities() {
        if !catalog.contains(name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRuleReference,
                format!("Rule tables reference unknown activity '{name}'"),
            ));
        }
    }

    for (pool, p) in &rules.capacity_pools {
        if p.capacity == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRuleLimit,
                format!("Capacity pool '{pool}' has zero capacity"),
            ));
        }
    }
    for (act, limit) in &rules.paired_small_group {
        if limit.max_troops == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRuleLimit,
                format!("'{act}' allows zero troops"),
            ));
        }
    }
    for (act, &max) in &rules.head_to_head {
        if max == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidRuleLimit,
                format!("'{act}' allows zero troops"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::camp_troops;
    use crate::models::{Activity, Day, Zone};

    #[test]
    fn test_valid_input() {
        let troops = camp_troops();
        assert!(validate_input(&troops, &ActivityCatalog::camp_default(), &RuleTables::default()).is_ok());
    }

    #[test]
    fn test_duplicate_troop_name() {
        let troops = vec![Troop::new("T1"), Troop::new("T1")];
        let errors = validate_input(&troops, &ActivityCatalog::camp_default(), &RuleTables::default())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_empty_troop() {
        let troops = vec![Troop::new("T1").with_size(0, 2)];
        let errors = validate_input(&troops, &ActivityCatalog::camp_default(), &RuleTables::default())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::EmptyTroop));
    }

    #[test]
    fn test_unknown_preference_and_day_request() {
        let troops = vec![Troop::new("T1")
            .with_preferences(["Archery", "Basket Weaving"])
            .with_day_request(Day::Monday, "Moon Landing")];
        let errors = validate_input(&troops, &ActivityCatalog::camp_default(), &RuleTables::default())
            .unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidActivityReference)
                .count(),
            2
        );
    }

    #[test]
    fn test_duplicate_preference() {
        let troops = vec![Troop::new("T1").with_preferences(["Archery", "Archery"])];
        let errors = validate_input(&troops, &ActivityCatalog::camp_default(), &RuleTables::default())
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicatePreference));
    }

    #[test]
    fn test_rule_reference_missing_from_catalog() {
        let catalog = ActivityCatalog::new().with_activity(Activity::new("Archery", Zone::Beach));
        let errors = validate_input(&[], &catalog, &RuleTables::default()).unwrap_err();
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidRuleReference));
        assert!(errors.iter().any(|e| e.message.contains("Reflection")));
    }

    #[test]
    fn test_conflict_reference_and_zero_capacity() {
        let catalog = ActivityCatalog::camp_default()
            .with_activity(Activity::new("Lonely", Zone::Beach).with_conflict("Nowhere"));
        let mut rules = RuleTables::default();
        if let Some(pool) = rules.capacity_pools.get_mut("Canoe") {
            pool.capacity = 0;
        }
        let errors = validate_input(&[], &catalog, &rules).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidActivityReference));
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidRuleLimit));
    }

    #[test]
    fn test_multiple_errors() {
        let troops = vec![
            Troop::new("T1").with_size(0, 1),
            Troop::new("T1").with_preferences(["Unknown"]),
        ];
        let errors = validate_input(&troops, &ActivityCatalog::camp_default(), &RuleTables::default())
            .unwrap_err();
        assert!(errors.len() >= 3);
    }
}

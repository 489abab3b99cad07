//! Mastery age estimation.

use std::collections::BTreeMap;

use tracing::debug;

use stride_core::{Cohort, MilestoneId};

use crate::first_achievement_age;

/// Typical (median) age at which a milestone is first achieved across the cohort.
///
/// Each subject contributes at most one age: the age of their first
/// not-achieved -> achieved transition. `None` when no subject shows a
/// transition for this milestone.
pub fn mastery_age(cohort: &Cohort, milestone: &MilestoneId) -> Option<f64> {
    let mut ages: Vec<f64> = cohort
        .subjects()
        .filter_map(|(_, observations)| first_achievement_age(observations, milestone))
        .collect();
    median(&mut ages)
}

/// Mastery age for every milestone tracked by the cohort.
///
/// Independent per-milestone application of [`mastery_age`]; milestones with
/// no observed transitions map to `None` rather than being dropped.
pub fn all_mastery_ages(cohort: &Cohort) -> BTreeMap<MilestoneId, Option<f64>> {
    let mut ages = BTreeMap::new();
    for milestone in cohort.milestones() {
        let age = mastery_age(cohort, milestone);
        match age {
            Some(months) => debug!(milestone = %milestone, months, "mastery age"),
            None => debug!(milestone = %milestone, "no transitions found"),
        }
        ages.insert(milestone.clone(), age);
    }
    ages
}

/// Median of the values; the mean of the two middle values for even counts.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stride_core::{Observation, Outcome};

    fn transition_subject(cohort: &mut Cohort, subject: &str, from_age: f64, to_age: f64) {
        cohort.push(
            subject,
            Observation::new(from_age).record("ddicmm029", Outcome::NotAchieved),
        );
        cohort.push(
            subject,
            Observation::new(to_age).record("ddicmm029", Outcome::Achieved),
        );
    }

    #[test]
    fn test_mastery_age_is_median_of_transition_ages() {
        let mut cohort = Cohort::new(vec![MilestoneId::from("ddicmm029")]);
        transition_subject(&mut cohort, "s1", 1.0, 2.0);
        transition_subject(&mut cohort, "s2", 1.5, 2.5);
        transition_subject(&mut cohort, "s3", 1.2, 2.2);

        // Median of [2.0, 2.5, 2.2] = 2.2
        let age = mastery_age(&cohort, &MilestoneId::from("ddicmm029")).unwrap();
        assert!((age - 2.2).abs() < 1e-9);
    }

    #[test]
    fn test_mastery_age_even_count_averages_middle_pair() {
        let mut cohort = Cohort::new(vec![MilestoneId::from("ddicmm029")]);
        transition_subject(&mut cohort, "s1", 3.0, 4.0);
        transition_subject(&mut cohort, "s2", 3.5, 4.5);

        let age = mastery_age(&cohort, &MilestoneId::from("ddicmm029")).unwrap();
        assert!((age - 4.25).abs() < 1e-9);
    }

    #[test]
    fn test_mastery_age_none_without_transitions() {
        let mut cohort = Cohort::new(vec![MilestoneId::from("ddicmm029")]);
        cohort.push(
            "s1",
            Observation::new(1.0).record("ddicmm029", Outcome::Achieved),
        );
        cohort.push(
            "s1",
            Observation::new(2.0).record("ddicmm029", Outcome::Achieved),
        );
        assert_eq!(mastery_age(&cohort, &MilestoneId::from("ddicmm029")), None);
    }

    #[test]
    fn test_mastery_age_none_with_single_visit() {
        let mut cohort = Cohort::new(vec![MilestoneId::from("ddicmm029")]);
        cohort.push(
            "s1",
            Observation::new(1.0).record("ddicmm029", Outcome::NotAchieved),
        );
        assert_eq!(mastery_age(&cohort, &MilestoneId::from("ddicmm029")), None);
    }

    #[test]
    fn test_mastery_age_counts_only_first_transition_per_subject() {
        let mut cohort = Cohort::new(vec![MilestoneId::from("ddicmm029")]);
        // Achieved at 2.0, regresses, achieved again at 4.0: only 2.0 counts.
        cohort.push(
            "s1",
            Observation::new(1.0).record("ddicmm029", Outcome::NotAchieved),
        );
        cohort.push(
            "s1",
            Observation::new(2.0).record("ddicmm029", Outcome::Achieved),
        );
        cohort.push(
            "s1",
            Observation::new(3.0).record("ddicmm029", Outcome::NotAchieved),
        );
        cohort.push(
            "s1",
            Observation::new(4.0).record("ddicmm029", Outcome::Achieved),
        );
        let age = mastery_age(&cohort, &MilestoneId::from("ddicmm029")).unwrap();
        assert!((age - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_mastery_ages_keeps_empty_milestones() {
        let mut cohort = Cohort::new(vec![
            MilestoneId::from("ddicmm029"),
            MilestoneId::from("ddicmm030"),
        ]);
        transition_subject(&mut cohort, "s1", 1.0, 2.0);

        let ages = all_mastery_ages(&cohort);
        assert_eq!(ages.len(), 2);
        assert!(ages[&MilestoneId::from("ddicmm029")].is_some());
        assert!(ages[&MilestoneId::from("ddicmm030")].is_none());
    }
}

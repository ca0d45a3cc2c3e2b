//! Time-window conflict detection shared by template and instance scheduling.
//!
//! Windows are half-open: a class ending at 19:00 never conflicts with one
//! starting at 19:00. The same predicate is applied template-vs-template
//! (same instructor, same weekday) and instance-vs-instance (same room, same
//! date).

use chrono::NaiveTime;

/// Outcome of checking a candidate window against one existing window.
///
/// `Exact` is distinguished from `Partial` because an exactly-identical
/// window is the only case where a template update may proceed as a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    None,
    Exact,
    Partial,
}

/// Half-open interval overlap: `existing.start < target.end && existing.end > target.start`.
pub fn overlaps(
    target_start: NaiveTime,
    target_end: NaiveTime,
    existing_start: NaiveTime,
    existing_end: NaiveTime,
) -> bool {
    existing_start < target_end && existing_end > target_start
}

/// Classify the candidate window against one existing window.
pub fn classify(
    target_start: NaiveTime,
    target_end: NaiveTime,
    existing_start: NaiveTime,
    existing_end: NaiveTime,
) -> Overlap {
    if target_start == existing_start && target_end == existing_end {
        Overlap::Exact
    } else if overlaps(target_start, target_end, existing_start, existing_end) {
        Overlap::Partial
    } else {
        Overlap::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn touching_boundaries_do_not_conflict() {
        assert!(!overlaps(t(18, 0), t(19, 0), t(19, 0), t(20, 0)));
        assert!(!overlaps(t(18, 0), t(19, 0), t(17, 0), t(18, 0)));
    }

    #[test]
    fn containment_and_straddling_conflict() {
        // existing contains target
        assert!(overlaps(t(18, 15), t(18, 45), t(18, 0), t(19, 0)));
        // target contains existing
        assert!(overlaps(t(17, 0), t(20, 0), t(18, 0), t(19, 0)));
        // straddles the start
        assert!(overlaps(t(17, 30), t(18, 30), t(18, 0), t(19, 0)));
        // straddles the end
        assert!(overlaps(t(18, 30), t(19, 30), t(18, 0), t(19, 0)));
    }

    #[test]
    fn disjoint_windows_do_not_conflict() {
        assert!(!overlaps(t(6, 0), t(7, 0), t(18, 0), t(19, 0)));
    }

    #[test]
    fn classify_distinguishes_exact_from_partial() {
        assert_eq!(classify(t(18, 0), t(19, 0), t(18, 0), t(19, 0)), Overlap::Exact);
        assert_eq!(
            classify(t(18, 0), t(19, 0), t(18, 30), t(19, 30)),
            Overlap::Partial
        );
        assert_eq!(classify(t(18, 0), t(19, 0), t(19, 0), t(20, 0)), Overlap::None);
    }

    #[test]
    fn identical_start_different_end_is_partial() {
        assert_eq!(
            classify(t(18, 0), t(19, 0), t(18, 0), t(19, 30)),
            Overlap::Partial
        );
    }
}

//! Spaced-repetition interval progression.
//!
//! Completing a task schedules its next occurrence after a growing number
//! of days drawn from a fixed ascending sequence. Once the largest step is
//! reached the recurrence chain ends.

/// Interval steps in days.
pub const REPEAT_INTERVALS: [i64; 5] = [1, 3, 7, 14, 30];

/// Returns the next interval after `current`, or `None` when the chain is
/// exhausted.
///
/// Picks the first step strictly greater than `current`, so inputs between
/// steps snap up to the next defined one.
pub fn next_interval(current: i64) -> Option<i64> {
    REPEAT_INTERVALS.iter().copied().find(|&step| step > current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_full_chain() {
        assert_eq!(next_interval(1), Some(3));
        assert_eq!(next_interval(3), Some(7));
        assert_eq!(next_interval(7), Some(14));
        assert_eq!(next_interval(14), Some(30));
        assert_eq!(next_interval(30), None);
    }

    #[test]
    fn off_step_inputs_snap_to_next_step() {
        assert_eq!(next_interval(0), Some(1));
        assert_eq!(next_interval(2), Some(3));
        assert_eq!(next_interval(5), Some(7));
        assert_eq!(next_interval(29), Some(30));
    }

    #[test]
    fn negative_inputs_start_the_chain() {
        assert_eq!(next_interval(-5), Some(1));
        assert_eq!(next_interval(i64::MIN), Some(1));
    }

    #[test]
    fn inputs_at_or_past_the_last_step_end_the_chain() {
        assert_eq!(next_interval(31), None);
        assert_eq!(next_interval(365), None);
        assert_eq!(next_interval(i64::MAX), None);
    }
}

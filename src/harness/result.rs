use std::iter::Sum;

use super::failure::Failure;

/// Outcome of one executed test unit.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    /// Whether the unit returned `Ok(())`.
    pub success: bool,
    /// Qualified test name, e.g. `helpers/TestTempRow::test_deleted`.
    pub name: String,
    /// Failure payload; always `None` for a passing unit.
    pub error: Option<Failure>,
}

impl TestResult {
    /// A passing result.
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            success: true,
            name: name.into(),
            error: None,
        }
    }

    /// A failing result carrying its failure payload.
    pub fn failed(name: impl Into<String>, error: Failure) -> Self {
        Self {
            success: false,
            name: name.into(),
            error: Some(error),
        }
    }

    /// Contribution of this result to a pass count.
    pub fn pass_count(&self) -> usize {
        usize::from(self.success)
    }
}

impl<'a> Sum<&'a TestResult> for usize {
    fn sum<I: Iterator<Item = &'a TestResult>>(iter: I) -> usize {
        iter.map(TestResult::pass_count).sum()
    }
}

impl Sum<TestResult> for usize {
    fn sum<I: Iterator<Item = TestResult>>(iter: I) -> usize {
        iter.map(|r| r.pass_count()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sum_counts_passes() {
        let results = vec![
            TestResult::passed("a"),
            TestResult::failed("b", Failure::message("boom")),
            TestResult::passed("c"),
        ];
        let passed: usize = results.iter().sum();
        assert_eq!(passed, 2);
        let passed: usize = results.into_iter().sum();
        assert_eq!(passed, 2);
    }

    #[test]
    fn test_sum_of_nothing_is_zero() {
        let passed: usize = Vec::<TestResult>::new().iter().sum();
        assert_eq!(passed, 0);
    }

    fn result_from(success: bool) -> TestResult {
        if success {
            TestResult::passed("t")
        } else {
            TestResult::failed("t", Failure::Empty)
        }
    }

    proptest! {
        #[test]
        fn prop_sum_equals_success_count(flags in prop::collection::vec(any::<bool>(), 0..64)) {
            let results: Vec<TestResult> = flags.iter().copied().map(result_from).collect();
            let passed: usize = results.iter().sum();
            prop_assert_eq!(passed, flags.iter().filter(|f| **f).count());
        }

        #[test]
        fn prop_sum_is_order_independent(flags in prop::collection::vec(any::<bool>(), 0..64)) {
            let results: Vec<TestResult> = flags.iter().copied().map(result_from).collect();
            let mut reversed = results.clone();
            reversed.reverse();
            let (left, right) = results.split_at(results.len() / 2);
            let forward: usize = results.iter().sum();
            let backward: usize = reversed.iter().sum();
            let split: usize = left.iter().sum::<usize>() + right.iter().sum::<usize>();
            prop_assert_eq!(forward, backward);
            prop_assert_eq!(forward, split);
        }
    }
}

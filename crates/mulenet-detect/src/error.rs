use mulenet_core::ErrorCode;

/// Errors a detector can report without aborting the analysis run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectError {
    /// A bounded graph search ran out of expansions before finishing.
    #[error("{search} search exceeded its budget of {budget} expansions")]
    SearchBudgetExceeded { search: &'static str, budget: usize },
}

impl DetectError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::SearchBudgetExceeded { .. } => ErrorCode::SearchBudgetExceeded,
        }
    }
}

/// Counts DFS expansions against a fixed allowance.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchBudget {
    search: &'static str,
    limit: usize,
    spent: usize,
}

impl SearchBudget {
    pub(crate) const fn new(search: &'static str, limit: usize) -> Self {
        Self {
            search,
            limit,
            spent: 0,
        }
    }

    /// Spend one expansion.
    pub(crate) const fn spend(&mut self) -> Result<(), DetectError> {
        if self.spent >= self.limit {
            return Err(DetectError::SearchBudgetExceeded {
                search: self.search,
                budget: self.limit,
            });
        }
        self.spent += 1;
        Ok(())
    }

    pub(crate) const fn spent(&self) -> usize {
        self.spent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_fails_after_limit() {
        let mut budget = SearchBudget::new("cycle", 2);
        assert!(budget.spend().is_ok());
        assert!(budget.spend().is_ok());

        let err = budget.spend().expect_err("third expansion must fail");
        assert_eq!(
            err,
            DetectError::SearchBudgetExceeded {
                search: "cycle",
                budget: 2
            }
        );
        assert_eq!(err.code(), ErrorCode::SearchBudgetExceeded);
        assert_eq!(budget.spent(), 2);
        assert_eq!(err.to_string(), "cycle search exceeded its budget of 2 expansions");
    }
}

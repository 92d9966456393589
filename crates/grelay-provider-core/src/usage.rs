use grelay_protocol::openai::Usage;

/// Token accounting for one relayed request.
///
/// `total_tokens` is always recomputed as prompt + completion and the counters
/// only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCounters {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl UsageCounters {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }

    pub fn add(&mut self, delta: UsageCounters) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(delta.prompt_tokens);
        self.completion_tokens = self
            .completion_tokens
            .saturating_add(delta.completion_tokens);
        self.total_tokens = self.prompt_tokens.saturating_add(self.completion_tokens);
    }

    pub fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0
    }
}

impl From<Usage> for UsageCounters {
    fn from(value: Usage) -> Self {
        Self::new(value.prompt_tokens, value.completion_tokens)
    }
}

impl From<UsageCounters> for Usage {
    fn from(value: UsageCounters) -> Self {
        Usage {
            prompt_tokens: value.prompt_tokens,
            completion_tokens: value.completion_tokens,
            total_tokens: value.total_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_recomputed_not_trusted() {
        let counters = UsageCounters::from(Usage {
            prompt_tokens: 3,
            completion_tokens: 4,
            total_tokens: 999,
        });
        assert_eq!(counters.total_tokens, 7);
    }

    #[test]
    fn deltas_accumulate() {
        let mut counters = UsageCounters::default();
        counters.add(UsageCounters::new(10, 1));
        counters.add(UsageCounters::new(0, 5));
        assert_eq!(counters, UsageCounters::new(10, 6));
    }
}

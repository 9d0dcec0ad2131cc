//! Leveled debug tracing, adapted from the teacher crate's `Log<T>`
//! facility (`src/util/logger.rs`): pipeline stages can be handed a `Log`
//! level and will print ordered, `#[cfg(debug_assertions)]`-gated traces
//! without pulling in an external logging crate.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Log {
    None,
    Default,
    Success,
    Result,
    Verbose,
}

impl Log {
    fn order(self) -> u8 {
        match self {
            Log::None => 0,
            Log::Default => 1,
            Log::Success => 2,
            Log::Result => 3,
            Log::Verbose => 4,
        }
    }

    pub fn at_least(self, level: Log) -> bool {
        self.order() >= level.order()
    }

    pub fn trace(self, level: Log, msg: impl Display) {
        #[cfg(debug_assertions)]
        if self.at_least(level) {
            println!("{}", msg);
        }
        #[cfg(not(debug_assertions))]
        {
            let _ = (level, msg);
        }
    }
}

impl Default for Log {
    fn default() -> Self {
        Log::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_verbosity() {
        assert!(Log::Verbose.at_least(Log::Success));
        assert!(!Log::Default.at_least(Log::Result));
        assert!(Log::None.at_least(Log::None));
    }
}

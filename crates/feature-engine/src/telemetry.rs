//! Logging Setup

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install a global formatting subscriber at the given level.
///
/// Fails if a global subscriber has already been set.
pub fn init_logging(level: Level) -> Result<(), SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // Either this call or an earlier one in the same process installed the subscriber
        let _ = init_logging(Level::DEBUG);
        assert!(init_logging(Level::INFO).is_err());
    }
}

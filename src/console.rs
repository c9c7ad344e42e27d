use std::time::Duration;

use futures::future::BoxFuture;
use teloxide::dispatching::ShutdownToken;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

/// How often a stop request is retried while the dispatcher is still starting
const IDLE_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Something that can be asked to stop. `None` means it is not running yet.
pub trait Shutdown {
    fn try_shutdown(&self) -> Option<BoxFuture<'_, ()>>;
}

impl Shutdown for ShutdownToken {
    fn try_shutdown(&self) -> Option<BoxFuture<'_, ()>> {
        match self.shutdown() {
            Ok(drained) => Some(Box::pin(drained)),
            Err(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Drained,
    TimedOut,
}

pub fn is_stop_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("stop")
}

/// Request shutdown, retrying until the dispatcher is running, then wait at
/// most `grace` for in-flight updates.
pub async fn stop<S: Shutdown>(shutdown: &S, grace: Duration) -> StopOutcome {
    let drained = loop {
        match shutdown.try_shutdown() {
            Some(drained) => break drained,
            None => tokio::time::sleep(IDLE_RETRY_INTERVAL).await,
        }
    };

    match tokio::time::timeout(grace, drained).await {
        Ok(()) => StopOutcome::Drained,
        Err(_) => StopOutcome::TimedOut,
    }
}

async fn stop_or_exit(shutdown: ShutdownToken, grace: Duration) {
    info!("Stopping the bot...");
    if stop(&shutdown, grace).await == StopOutcome::TimedOut {
        error!(
            "In-flight updates did not finish within {}s, exiting",
            grace.as_secs()
        );
        std::process::exit(1);
    }
}

/// Watch stdin for `stop` and shut the dispatcher down.
pub async fn watch_stdin(shutdown: ShutdownToken, grace: Duration) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if is_stop_command(&line) => break,
            Ok(Some(_)) => continue,
            Ok(None) => {
                info!("Console closed; use Ctrl-C to stop the bot");
                return;
            }
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                return;
            }
        }
    }

    stop_or_exit(shutdown, grace).await;
}

/// Same as `stop` on the console, triggered by Ctrl-C.
pub async fn watch_ctrl_c(shutdown: ShutdownToken, grace: Duration) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        return;
    }

    stop_or_exit(shutdown, grace).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports "not running" for the first `idle_attempts` calls
    struct StartingDispatcher {
        idle_attempts: usize,
        attempts: AtomicUsize,
        drains: bool,
    }

    impl StartingDispatcher {
        fn new(idle_attempts: usize, drains: bool) -> Self {
            Self {
                idle_attempts,
                attempts: AtomicUsize::new(0),
                drains,
            }
        }
    }

    impl Shutdown for StartingDispatcher {
        fn try_shutdown(&self) -> Option<BoxFuture<'_, ()>> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.idle_attempts {
                return None;
            }
            if self.drains {
                Some(Box::pin(async {}))
            } else {
                Some(Box::pin(futures::future::pending::<()>()))
            }
        }
    }

    #[test]
    fn test_stop_is_case_insensitive() {
        for line in ["stop", "STOP", "Stop", " stop\n", "sToP\r\n"] {
            assert!(is_stop_command(line), "{:?}", line);
        }
    }

    #[test]
    fn test_other_lines_are_not_stop() {
        for line in ["", "stopp", "please stop", "s top", "quit"] {
            assert!(!is_stop_command(line), "{:?}", line);
        }
    }

    #[tokio::test]
    async fn test_stop_before_dispatch_is_retried() {
        let dispatcher = StartingDispatcher::new(2, true);

        let outcome = stop(&dispatcher, Duration::from_secs(1)).await;

        assert_eq!(outcome, StopOutcome::Drained);
        assert_eq!(dispatcher.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stop_running_dispatcher_first_try() {
        let dispatcher = StartingDispatcher::new(0, true);

        assert_eq!(
            stop(&dispatcher, Duration::from_secs(1)).await,
            StopOutcome::Drained
        );
        assert_eq!(dispatcher.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stuck_drain_times_out() {
        let dispatcher = StartingDispatcher::new(0, false);

        assert_eq!(
            stop(&dispatcher, Duration::from_millis(50)).await,
            StopOutcome::TimedOut
        );
    }
}

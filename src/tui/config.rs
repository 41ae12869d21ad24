use std::time::Duration;

pub(super) const MAX_EVENTS_PER_TICK: usize = 200;

pub(super) const EVENT_DRAIN_WAIT: Duration = Duration::from_millis(1);
pub(super) const INPUT_POLL_WAIT: Duration = Duration::from_millis(50);
pub(super) const SHUTDOWN_GRACE_TIMEOUT: Duration = Duration::from_secs(3);

/// Border rows around each framed pane.
pub(super) const PANE_BORDER_ROWS: u16 = 2;
pub(super) const FOOTER_ROWS: u16 = 1;

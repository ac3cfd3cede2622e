use crate::MemoryHost;
use mutate::Engine;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettleOptions {
    /// Upper bound on notify/flush rounds before giving up.
    pub max_rounds: usize,
}

impl Default for SettleOptions {
    fn default() -> Self {
        Self { max_rounds: 32 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub rounds: usize,
    pub writes: usize,
    /// `false` when `max_rounds` ran out with work still pending, which
    /// means something keeps rewriting the tree.
    pub converged: bool,
}

/// Runs the event loop until no notification or frame is pending.
///
/// Each round delivers the queued change notifications first and then runs
/// the flush, if one was requested.
pub fn settle(engine: &mut Engine<MemoryHost>, options: SettleOptions) -> SettleReport {
    let mut report = SettleReport::default();
    while report.rounds < options.max_rounds {
        let notifications = engine.host_mut().take_notifications();
        let frame = engine.host_mut().take_frame_request();
        if notifications.is_empty() && !frame {
            report.converged = true;
            return report;
        }
        report.rounds += 1;
        for subscription in notifications {
            engine.notify(subscription);
        }
        if engine.host_mut().take_frame_request() || frame {
            let before = engine.host().write_count();
            engine.flush();
            report.writes += engine.host().write_count() - before;
        }
    }
    report.converged = !engine.host().has_pending_work();
    if !report.converged {
        log::warn!(target: "dom_host", "tree still changing after {} rounds", report.rounds);
    }
    report
}

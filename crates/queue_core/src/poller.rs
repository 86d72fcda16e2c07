use std::time::Duration;

/// Identifies one fetch. Results carrying a ticket the poller no longer
/// waits for are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollTicket {
    generation: u64,
    seq: u64,
}

impl PollTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Monotonic across generations; later tickets were issued later.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Single-flight polling state. The clock lives outside; this only decides
/// whether a tick turns into a fetch and whether a result still counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Poller {
    interval: Option<Duration>,
    generation: u64,
    last_seq: u64,
    // Outstanding request, possibly from an earlier generation. Its result
    // is dropped in that case, but it still occupies the single slot.
    in_flight: Option<PollTicket>,
    // The immediate fetch of a start that found the slot taken.
    owed: bool,
    skipped_ticks: u64,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts polling and issues the first fetch right away, unless a fetch
    /// from before a stop is still outstanding; then the first fetch goes out
    /// once that one lands. Does nothing while already running.
    pub fn start(&mut self, interval: Duration) -> Option<PollTicket> {
        if self.is_running() {
            return None;
        }
        self.generation += 1;
        self.interval = Some(interval);
        if self.in_flight.is_some() {
            self.owed = true;
            return None;
        }
        Some(self.issue())
    }

    /// Stops polling. A fetch already on the wire may finish but its result
    /// will not be accepted. Returns false when already stopped.
    pub fn stop(&mut self) -> bool {
        if self.interval.is_none() {
            return false;
        }
        self.generation += 1;
        self.interval = None;
        self.owed = false;
        true
    }

    /// Timer fired. Skipped, not queued, while a fetch is outstanding.
    pub fn on_tick(&mut self) -> Option<PollTicket> {
        self.interval?;
        if self.in_flight.is_some() {
            self.skipped_ticks += 1;
            return None;
        }
        Some(self.issue())
    }

    /// Claims a completed fetch. True only for the outstanding ticket of the
    /// current generation; an outdated outstanding ticket just frees the slot.
    pub fn accept(&mut self, ticket: PollTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        ticket.generation == self.generation
    }

    /// Issues the fetch a start had to defer, once the slot is free.
    pub fn issue_owed(&mut self) -> Option<PollTicket> {
        if !self.owed || self.in_flight.is_some() || !self.is_running() {
            return None;
        }
        self.owed = false;
        Some(self.issue())
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn in_flight(&self) -> Option<PollTicket> {
        self.in_flight
    }

    /// Sequence number of the newest ticket ever issued, 0 if none.
    pub fn last_issued_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    fn issue(&mut self) -> PollTicket {
        self.last_seq += 1;
        let ticket = PollTicket {
            generation: self.generation,
            seq: self.last_seq,
        };
        self.in_flight = Some(ticket);
        ticket
    }
}

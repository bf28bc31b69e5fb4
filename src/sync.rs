//! Ordering between push-delivered updates and fetch responses.
//!
//! A push event for a panel is authoritative: a fetch issued before that
//! push and resolving after it is dropped. Each panel keeps a revision
//! counter; a fetch captures the revision at issue time as a `Ticket`.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Kpis,
    Insights,
    Graph,
    Goals,
}

impl Panel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Kpis => "kpis",
            Panel::Insights => "insights",
            Panel::Graph => "graph",
            Panel::Goals => "goals",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    panel: Panel,
    revision: u64,
}

impl Ticket {
    pub fn panel(&self) -> Panel {
        self.panel
    }
}

#[derive(Debug, Default)]
pub struct RevisionClock {
    revisions: HashMap<Panel, u64>,
}

impl RevisionClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self, panel: Panel) -> u64 {
        self.revisions.get(&panel).copied().unwrap_or(0)
    }

    /// Capture the panel revision before issuing a fetch.
    pub fn issue(&self, panel: Panel) -> Ticket {
        Ticket {
            panel,
            revision: self.current(panel),
        }
    }

    /// Record that a push event replaced the panel.
    pub fn bump(&mut self, panel: Panel) {
        *self.revisions.entry(panel).or_insert(0) += 1;
    }

    /// True when no push touched the panel since the ticket was issued.
    pub fn is_fresh(&self, ticket: Ticket) -> bool {
        self.current(ticket.panel) == ticket.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_superseded_by_push() {
        let mut clock = RevisionClock::new();
        let ticket = clock.issue(Panel::Kpis);
        assert!(clock.is_fresh(ticket));
        clock.bump(Panel::Kpis);
        assert!(!clock.is_fresh(ticket));
    }

    #[test]
    fn test_panels_are_independent() {
        let mut clock = RevisionClock::new();
        let kpis = clock.issue(Panel::Kpis);
        clock.bump(Panel::Graph);
        assert!(clock.is_fresh(kpis));
        assert!(!clock.is_fresh(Ticket { panel: Panel::Graph, revision: 0 }));
    }
}

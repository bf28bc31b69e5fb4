use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{ChangeSet, SimulationResult};

pub const HISTORY_CAP: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("No simulation results to save")]
    NoResult,
    #[error("Please enter a scenario name")]
    EmptyName,
    #[error("no scenario at position {index} (have {len})")]
    OutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub changes: ChangeSet,
    pub impact_score: f64,
    pub results: SimulationResult,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        changes: ChangeSet,
        results: SimulationResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp: now,
            impact_score: results.overall_impact_score,
            changes,
            results,
        }
    }

    pub fn change_summary(&self) -> String {
        match self.changes.len() {
            1 => "1 KPI changed".to_string(),
            n => format!("{} KPIs changed", n),
        }
    }
}

/// Most-recent-first list of scenarios, never longer than `HISTORY_CAP`.
#[derive(Debug, Clone, Default)]
pub struct ScenarioHistory {
    items: Vec<Scenario>,
    auto_counter: u64,
}

impl ScenarioHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Result<&Scenario, ScenarioError> {
        self.items.get(index).ok_or(ScenarioError::OutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Insert at the front, evicting the oldest past the cap.
    pub fn push(&mut self, scenario: Scenario) -> &Scenario {
        self.items.insert(0, scenario);
        self.items.truncate(HISTORY_CAP);
        &self.items[0]
    }

    /// Capture a finished simulation under the next "Scenario N" name.
    /// N keeps counting after deletions so names never repeat.
    pub fn record_auto(
        &mut self,
        changes: ChangeSet,
        results: SimulationResult,
        now: DateTime<Utc>,
    ) -> &Scenario {
        self.auto_counter += 1;
        let name = format!("Scenario {}", self.auto_counter);
        self.push(Scenario::new(name, changes, results, now))
    }

    pub fn save(
        &mut self,
        name: &str,
        changes: &ChangeSet,
        results: Option<&SimulationResult>,
        now: DateTime<Utc>,
    ) -> Result<&Scenario, ScenarioError> {
        let results = results.ok_or(ScenarioError::NoResult)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ScenarioError::EmptyName);
        }
        Ok(self.push(Scenario::new(name, changes.clone(), results.clone(), now)))
    }

    /// Remove by position. Without confirmation nothing changes and `Ok(None)`
    /// is returned.
    pub fn delete(&mut self, index: usize, confirmed: bool) -> Result<Option<Scenario>, ScenarioError> {
        self.get(index)?;
        if !confirmed {
            return Ok(None);
        }
        Ok(Some(self.items.remove(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(n: usize) -> ChangeSet {
        (0..n).map(|i| (format!("kpi:{}", i), i as f64)).collect()
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = ScenarioHistory::new();
        let now = Utc::now();
        for _ in 0..11 {
            history.record_auto(changes(1), SimulationResult::default(), now);
        }
        assert_eq!(history.len(), 10);
        let names: Vec<_> = history.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"Scenario 11"));
        assert_eq!(names.last(), Some(&"Scenario 2"));
    }

    #[test]
    fn test_save_requires_result_and_name() {
        let mut history = ScenarioHistory::new();
        let now = Utc::now();
        let result = SimulationResult::default();
        assert_eq!(
            history.save("Plan A", &changes(1), None, now).unwrap_err(),
            ScenarioError::NoResult
        );
        assert_eq!(
            history.save("   ", &changes(1), Some(&result), now).unwrap_err(),
            ScenarioError::EmptyName
        );
        let saved = history.save(" Plan A ", &changes(2), Some(&result), now).unwrap();
        assert_eq!(saved.name, "Plan A");
        assert_eq!(saved.change_summary(), "2 KPIs changed");
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut history = ScenarioHistory::new();
        history.record_auto(changes(1), SimulationResult::default(), Utc::now());
        assert_eq!(history.get(0).unwrap().change_summary(), "1 KPI changed");
        assert_eq!(history.delete(0, false).unwrap(), None);
        assert_eq!(history.len(), 1);
        assert!(history.delete(0, true).unwrap().is_some());
        assert!(history.is_empty());
        assert_eq!(
            history.delete(0, true).unwrap_err(),
            ScenarioError::OutOfRange { index: 0, len: 0 }
        );
    }

    #[test]
    fn test_auto_names_do_not_repeat_after_delete() {
        let mut history = ScenarioHistory::new();
        let now = Utc::now();
        history.record_auto(changes(1), SimulationResult::default(), now);
        history.record_auto(changes(1), SimulationResult::default(), now);
        history.delete(0, true).unwrap();
        let next = history.record_auto(changes(1), SimulationResult::default(), now);
        assert_eq!(next.name, "Scenario 3");
    }
}

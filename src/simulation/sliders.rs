use crate::model::{ChangeSet, Kpi};
use crate::theme::ChangeBand;

/// Minimum distance from baseline for a slider to count as changed.
pub const CHANGE_TOLERANCE: f64 = 0.1;

pub fn step_for_unit(unit: &str) -> f64 {
    match unit {
        "minutes" | "hours" => 1.0,
        "percentage" | "days" => 0.1,
        _ => 0.1,
    }
}

/// One KPI's what-if control, bounded to [50%, 150%] of its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    pub uri: String,
    pub label: String,
    pub unit: String,
    pub target: f64,
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    value: f64,
}

impl Slider {
    pub fn from_kpi(kpi: &Kpi) -> Self {
        let baseline = kpi.value();
        // the range always contains the baseline; for negative values the
        // 50%/150% bounds swap ends
        let (min, max) = if baseline < 0.0 {
            (baseline * 1.5, baseline * 0.5)
        } else {
            ((baseline * 0.5).max(0.0), baseline * 1.5)
        };
        Self {
            uri: kpi.uri.clone(),
            label: kpi.label.clone(),
            unit: kpi.unit.clone(),
            target: kpi.target,
            baseline,
            min,
            max,
            step: step_for_unit(&kpi.unit),
            value: baseline.clamp(min, max),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Clamp into range and store; non-finite input is ignored.
    pub fn set(&mut self, value: f64) -> f64 {
        if value.is_finite() {
            self.value = value.clamp(self.min, self.max);
        }
        self.value
    }

    pub fn reset(&mut self) {
        self.value = self.baseline.clamp(self.min, self.max);
    }

    pub fn deviation_percent(&self) -> f64 {
        if self.baseline == 0.0 {
            return 0.0;
        }
        (self.value - self.baseline) / self.baseline * 100.0
    }

    pub fn band(&self) -> ChangeBand {
        ChangeBand::of(self.deviation_percent())
    }

    pub fn is_changed(&self) -> bool {
        (self.value - self.baseline).abs() > CHANGE_TOLERANCE
    }

    pub fn display(&self) -> String {
        format!("{:.1}", self.value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SliderBoard {
    sliders: Vec<Slider>,
}

impl SliderBoard {
    pub fn from_kpis(kpis: &[Kpi]) -> Self {
        Self {
            sliders: kpis.iter().map(Slider::from_kpi).collect(),
        }
    }

    pub fn sliders(&self) -> &[Slider] {
        &self.sliders
    }

    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    pub fn get(&self, uri: &str) -> Option<&Slider> {
        self.sliders.iter().find(|s| s.uri == uri)
    }

    /// Returns the stored (clamped) value, or `None` for an unknown uri.
    pub fn set(&mut self, uri: &str, value: f64) -> Option<f64> {
        self.sliders
            .iter_mut()
            .find(|s| s.uri == uri)
            .map(|s| s.set(value))
    }

    /// Every slider further than the tolerance from its baseline.
    pub fn changes(&self) -> ChangeSet {
        self.sliders
            .iter()
            .filter(|s| s.is_changed())
            .map(|s| (s.uri.clone(), s.value))
            .collect()
    }

    pub fn reset(&mut self) {
        for slider in &mut self.sliders {
            slider.reset();
        }
    }

    /// Apply recorded values; uris with no slider are ignored. Returns how
    /// many were applied.
    pub fn apply(&mut self, changes: &ChangeSet) -> usize {
        changes
            .iter()
            .filter(|(uri, value)| self.set(uri, **value).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Observation, Status};

    fn kpi(uri: &str, value: f64, unit: &str) -> Kpi {
        Kpi {
            uri: uri.into(),
            label: uri.to_uppercase(),
            unit: unit.into(),
            target: value,
            observation: Observation {
                uri: None,
                value,
                status: Status::Good,
                timestamp: String::new(),
            },
            trend: None,
            department: None,
            domain_name: None,
            goal_name: None,
        }
    }

    #[test]
    fn test_bounds_and_steps() {
        let s = Slider::from_kpi(&kpi("kpi:wait", 40.0, "minutes"));
        assert_eq!((s.min, s.max, s.step), (20.0, 60.0, 1.0));
        assert_eq!(step_for_unit("percentage"), 0.1);
        assert_eq!(step_for_unit("beds"), 0.1);
    }

    #[test]
    fn test_values_are_clamped() {
        let mut s = Slider::from_kpi(&kpi("kpi:los", 5.0, "days"));
        assert_eq!(s.set(100.0), 7.5);
        assert_eq!(s.set(-3.0), 2.5);
        assert_eq!(s.set(f64::NAN), 2.5);
    }

    #[test]
    fn test_negative_baseline_stays_in_range() {
        let mut s = Slider::from_kpi(&kpi("kpi:delta", -2.0, "units"));
        assert_eq!((s.min, s.max), (-3.0, -1.0));
        assert_eq!(s.value(), -2.0);
        assert!(!s.is_changed());
        assert_eq!(s.set(-2.5), -2.5);
        s.reset();
        assert_eq!(s.value(), -2.0);

        let board = SliderBoard::from_kpis(&[kpi("kpi:delta", -2.0, "units")]);
        assert!(board.changes().is_empty());
    }

    #[test]
    fn test_change_tolerance() {
        let mut board = SliderBoard::from_kpis(&[kpi("kpi:a", 5.0, "days"), kpi("kpi:b", 10.0, "days")]);
        board.set("kpi:a", 5.05);
        board.set("kpi:b", 10.5);
        let changes = board.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("kpi:b"), Some(&10.5));
    }

    #[test]
    fn test_band_tracks_deviation() {
        let mut s = Slider::from_kpi(&kpi("kpi:a", 100.0, "percentage"));
        s.set(106.0);
        assert_eq!(s.band(), ChangeBand::Raised);
        s.set(95.0);
        assert_eq!(s.band(), ChangeBand::Neutral);
        s.set(90.0);
        assert_eq!(s.band(), ChangeBand::Lowered);
        assert_eq!(s.display(), "90.0");
    }

    #[test]
    fn test_apply_ignores_unknown_uris() {
        let mut board = SliderBoard::from_kpis(&[kpi("kpi:a", 5.0, "days")]);
        let mut changes = ChangeSet::new();
        changes.insert("kpi:a".into(), 4.0);
        changes.insert("kpi:ghost".into(), 1.0);
        assert_eq!(board.apply(&changes), 1);
        assert_eq!(board.get("kpi:a").map(Slider::value), Some(4.0));
        board.reset();
        assert!(board.changes().is_empty());
    }
}

//! Advice for a prepared row. A fixed rule table, independent of the model.
use std::iter::FusedIterator;

use crate::features::FeatureRow;

pub const SLEEP_MORE: &str = "Try increasing sleep to at least 7 hours.";
pub const LESS_SCREEN: &str = "Reduce screen time 30–60 minutes before bed.";
pub const MORE_EXERCISE: &str = "Aim for ≥30 minutes of exercise during the day.";
pub const LESS_CAFFEINE: &str = "Avoid caffeine after mid-afternoon.";
pub const LESS_STRESS: &str = "Try relaxation (breathing, meditation) before bed to reduce stress.";
pub const FEWER_INTERRUPTIONS: &str =
    "If you wake frequently, keep a sleep log and consult a physician if persistent.";
pub const ALL_GOOD: &str = "Good! Maintain consistent sleep routines and habits.";

struct Rule {
    applies: fn(&FeatureRow) -> bool,
    tip: &'static str,
}

fn below(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v < limit)
}

fn above(value: Option<f64>, limit: f64) -> bool {
    value.is_some_and(|v| v > limit)
}

fn short_sleep(r: &FeatureRow) -> bool {
    below(r.sleep_duration, 7.0)
}

fn late_screens(r: &FeatureRow) -> bool {
    above(r.screen_time_before_bed, 60.0)
}

fn little_exercise(r: &FeatureRow) -> bool {
    below(r.exercise_duration, 30.0)
}

fn much_caffeine(r: &FeatureRow) -> bool {
    matches!(r.caffeine_intake.as_deref(), Some("Moderate") | Some("High"))
}

fn stressed(r: &FeatureRow) -> bool {
    above(r.stress_level, 5.0)
}

fn interrupted(r: &FeatureRow) -> bool {
    r.sleep_interruptions.as_deref() == Some("Yes")
}

const RULES: [Rule; 6] = [
    Rule { applies: short_sleep, tip: SLEEP_MORE },
    Rule { applies: late_screens, tip: LESS_SCREEN },
    Rule { applies: little_exercise, tip: MORE_EXERCISE },
    Rule { applies: much_caffeine, tip: LESS_CAFFEINE },
    Rule { applies: stressed, tip: LESS_STRESS },
    Rule { applies: interrupted, tip: FEWER_INTERRUPTIONS },
];

/// Lazily walks the rule table; yields [`ALL_GOOD`] once if no rule fired.
pub struct Tips<'a> {
    row: &'a FeatureRow,
    next_rule: usize,
    fired: bool,
    done: bool,
}

impl Iterator for Tips<'_> {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some(rule) = RULES.get(self.next_rule) {
            self.next_rule += 1;
            if (rule.applies)(self.row) {
                self.fired = true;
                return Some(rule.tip);
            }
        }
        self.done = true;
        if self.fired {
            None
        } else {
            Some(ALL_GOOD)
        }
    }
}

impl FusedIterator for Tips<'_> {}

pub fn tips(row: &FeatureRow) -> Tips<'_> {
    Tips {
        row,
        next_rule: 0,
        fired: false,
        done: false,
    }
}

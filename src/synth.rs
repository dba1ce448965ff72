//! Synthetic sleep diary generator. All randomness comes from the generator
//! passed in, so a seed fully determines the data set.
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::codec::SleepQuality;
use crate::error::{Error, Result};
use crate::io::{self, RawRecord};

/// Column order of generated files.
pub const COLUMNS: [&str; 12] = [
    "bedtime",
    "wakeup_time",
    "bedtime_minutes",
    "wakeup_minutes",
    "sleep_duration",
    "caffeine_intake",
    "exercise_duration",
    "screen_time_before_bed",
    "stress_level",
    "mood",
    "sleep_interruptions",
    "sleep_quality",
];

const CAFFEINE: [(&str, f64); 4] = [("None", 0.25), ("Low", 0.45), ("Moderate", 0.2), ("High", 0.1)];
const MOOD: [(&str, f64); 4] = [("Happy", 0.35), ("Neutral", 0.35), ("Sad", 0.2), ("Anxious", 0.1)];
const INTERRUPTIONS: [(&str, f64); 2] = [("No", 0.8), ("Yes", 0.2)];

fn min_to_hhmm(m: i64) -> String {
    let m = m.rem_euclid(24 * 60);
    format!("{:02}:{:02}", m / 60, m % 60)
}

fn normal(mean: f64, std: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std).map_err(|e| Error::Config(e.to_string()))
}

fn choose<'a, R: Rng + ?Sized>(rng: &mut R, options: &[(&'a str, f64)]) -> Result<&'a str> {
    options
        .choose_weighted(rng, |(_, w)| *w)
        .map(|(name, _)| *name)
        .map_err(|e| Error::Config(e.to_string()))
}

/// Hand-written scoring rule that assigns the label.
pub fn label_for(
    sleep_duration: f64,
    exercise: u32,
    screen_time: u32,
    stress: u32,
    caffeine: &str,
    interruptions: &str,
) -> SleepQuality {
    let mut score = 0;
    if sleep_duration >= 7.0 {
        score += 2;
    } else if sleep_duration >= 6.0 {
        score += 1;
    }
    if exercise >= 30 {
        score += 1;
    }
    if screen_time <= 60 {
        score += 1;
    }
    if stress <= 3 {
        score += 1;
    }
    if caffeine == "None" || caffeine == "Low" {
        score += 1;
    }
    if interruptions == "No" {
        score += 1;
    }

    if score >= 5 {
        SleepQuality::Good
    } else if score >= 3 {
        SleepQuality::Average
    } else {
        SleepQuality::Poor
    }
}

pub fn generate_row<R: Rng + ?Sized>(rng: &mut R) -> Result<RawRecord> {
    // bedtime 22:00..02:00 as minutes past the previous midnight, wake 05:00..10:00
    let bed_abs: i64 = rng.random_range(22 * 60..26 * 60);
    let wake_abs: i64 = rng.random_range(5 * 60..10 * 60);
    let duration_min = wake_abs + 24 * 60 - bed_abs;
    let duration_min = ((duration_min as f64 + normal(0.0, 20.0)?.sample(rng)) as i64).max(3 * 60);
    let sleep_duration = ((duration_min as f64 / 60.0 + normal(0.0, 0.2)?.sample(rng)) * 100.0).round() / 100.0;

    let caffeine = choose(rng, &CAFFEINE)?;
    let exercise = normal(30.0, 25.0)?.sample(rng).abs() as u32;
    let screen_time = normal(60.0, 50.0)?.sample(rng).abs() as u32;
    let stress = normal(4.0, 2.0)?.sample(rng).round().clamp(0.0, 10.0) as u32;
    let mood = choose(rng, &MOOD)?;
    let interruptions = choose(rng, &INTERRUPTIONS)?;

    let label = label_for(sleep_duration, exercise, screen_time, stress, caffeine, interruptions);
    let bed_minutes = bed_abs.rem_euclid(24 * 60);

    Ok(RawRecord {
        bedtime: Some(min_to_hhmm(bed_abs)),
        wakeup_time: Some(min_to_hhmm(wake_abs)),
        bedtime_minutes: Some(bed_minutes as f64),
        wakeup_minutes: Some(wake_abs as f64),
        sleep_duration: Some(sleep_duration),
        caffeine_intake: Some(caffeine.to_string()),
        exercise_duration: Some(f64::from(exercise)),
        screen_time_before_bed: Some(f64::from(screen_time)),
        stress_level: Some(f64::from(stress)),
        mood: Some(mood.to_string()),
        sleep_interruptions: Some(interruptions.to_string()),
        sleep_quality: Some(label.to_string()),
    })
}

pub fn generate_rows<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Vec<RawRecord>> {
    (0..n).map(|_| generate_row(rng)).collect()
}

/// Writes `n` rows to `path`. An existing file is left alone unless `force`;
/// returns whether a file was written.
pub fn generate_csv(path: impl AsRef<Path>, n: usize, seed: u64, force: bool) -> Result<bool> {
    let path = path.as_ref();
    if path.exists() && !force {
        log::warn!("{} already exists. Use --force to overwrite.", path.display());
        return Ok(false);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = generate_rows(n, &mut rng)?;
    io::write_csv(path, &rows)?;
    log::info!("Generated {} rows -> {}", n, path.display());
    Ok(true)
}

//! Leaderboard chart for a training run.
use std::path::Path;

use plotters::prelude::*;

use crate::error::{Error, Result};
use crate::train::CandidateScore;

fn plot_err<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Draws one horizontal bar per candidate (macro-F1 on a 0..1 axis) and
/// saves the PNG to `path`. The selected model is drawn in red.
pub fn plot_leaderboard(scores: &[CandidateScore], selected: Option<usize>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if scores.is_empty() {
        return Err(Error::Plot("no candidate scores to plot".into()));
    }
    let names: Vec<&str> = scores.iter().map(|s| s.kind.name()).collect();
    let count = scores.len();

    let root = BitMapBackend::new(path, (900, 120 + 60 * count as u32)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Candidate macro-F1", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(160)
        .build_cartesian_2d(0.0..1.0_f64, 0..count)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(count)
        .y_label_formatter(&|idx| names.get(*idx).map(|n| n.to_string()).unwrap_or_default())
        .x_desc("macro F1")
        .y_desc("Model")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(scores.iter().enumerate().map(|(i, s)| {
            let color = if Some(i) == selected { RED } else { BLUE };
            Rectangle::new([(0.0, i), (s.f1_macro.clamp(0.0, 1.0), i + 1)], color.mix(0.5).filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    log::info!("Wrote leaderboard chart to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_plot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = plot_leaderboard(&[], None, dir.path().join("f1.png")).unwrap_err();
        assert!(matches!(err, Error::Plot(_)));
    }
}

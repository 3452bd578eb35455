//! Score history plots

use plotters::prelude::*;
use std::path::Path;

use mephisto_rl_agent::ScoreHistory;
use mephisto_rl_core::{RLError, Result};

fn plot_error(err: impl std::fmt::Display) -> RLError {
    RLError::Other(anyhow::anyhow!("plotting failed: {err}"))
}

/// Vertical range covering every score with a little headroom
fn score_range(scores: &[f64]) -> (f64, f64) {
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (-1.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1.0);
    (min - pad, max + pad)
}

/// Draw terminal score per episode to a PNG at `path`
pub fn plot_scores(history: &ScoreHistory, path: &Path) -> Result<()> {
    let scores = history.scores();
    let (low, high) = score_range(&scores);

    let root = BitMapBackend::new(path, (960, 540)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Terminal score per episode", ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(32)
        .y_label_area_size(64)
        .build_cartesian_2d(0..scores.len().max(1), low..high)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("episode")
        .y_desc("score")
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(
            scores.iter().enumerate().map(|(i, s)| (i, *s)),
            &BLUE,
        ))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    tracing::info!(path = %path.display(), episodes = scores.len(), "plotted scores");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range_pads() {
        assert_eq!(score_range(&[]), (-1.0, 1.0));
        assert_eq!(score_range(&[5.0]), (4.0, 6.0));
        let (low, high) = score_range(&[-1000.0, 1000.0]);
        assert_eq!((low, high), (-1100.0, 1100.0));
    }
}

//! Short-term RMS envelope classification.

use crate::dsp::rms;

/// Energy class of one envelope window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WindowLevel {
    /// Tone or FSK energy.
    High,
    /// Silence.
    Low,
    /// Neither; typically a window straddling a phase transition.
    Ambiguous,
}

/// Classify consecutive windows of `window_samples` by RMS level.
///
/// Window and hop are equal; the trailing partial window is dropped.
pub(crate) fn classify_windows(
    samples: &[f64],
    window_samples: usize,
    high_threshold: f64,
    low_threshold: f64,
) -> Vec<WindowLevel> {
    samples
        .chunks_exact(window_samples)
        .map(|w| {
            let level = rms(w);
            if level > high_threshold {
                WindowLevel::High
            } else if level < low_threshold {
                WindowLevel::Low
            } else {
                WindowLevel::Ambiguous
            }
        })
        .collect()
}

/// A maximal run of equally-classified windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Run {
    pub level: WindowLevel,
    /// First window index of the run.
    pub start: usize,
    /// Number of windows.
    pub len: usize,
}

/// Collapse a window classification into maximal runs.
pub(crate) fn find_runs(levels: &[WindowLevel]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for (i, &level) in levels.iter().enumerate() {
        match runs.last_mut() {
            Some(last) if last.level == level => last.len += 1,
            _ => runs.push(Run {
                level,
                start: i,
                len: 1,
            }),
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_levels() {
        let mut samples = vec![0.0; 300];
        samples[100..200].iter_mut().for_each(|x| *x = 0.5);
        samples[200..300].iter_mut().for_each(|x| *x = 0.01);

        let levels = classify_windows(&samples, 100, 0.03, 0.003);
        assert_eq!(
            levels,
            vec![WindowLevel::Low, WindowLevel::High, WindowLevel::Ambiguous]
        );
    }

    #[test]
    fn partial_trailing_window_is_dropped() {
        let samples = vec![0.0; 250];
        assert_eq!(classify_windows(&samples, 100, 0.03, 0.003).len(), 2);
    }

    #[test]
    fn runs_collapse_consecutive_windows() {
        use WindowLevel::*;
        let runs = find_runs(&[High, High, Low, Low, Low, High]);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0], Run { level: High, start: 0, len: 2 });
        assert_eq!(runs[1], Run { level: Low, start: 2, len: 3 });
        assert_eq!(runs[2], Run { level: High, start: 5, len: 1 });
    }

    #[test]
    fn empty_input_yields_no_runs() {
        assert!(find_runs(&[]).is_empty());
        assert!(classify_windows(&[], 100, 0.03, 0.003).is_empty());
    }
}

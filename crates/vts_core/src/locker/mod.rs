//! Cycle locker: find the timecode section of each cycle in captured audio.
//!
//! Downstream decoders are only ever handed Timecode-phase ranges, which is
//! what keeps the 1 kHz chart tone from ever reaching the FSK decoder. The
//! locker works on the audio energy envelope alone: a test chart is a long
//! High run, the pre-roll silence a Low run, and the frame-exact boundaries
//! of the timecode section follow from the cycle start by rational
//! arithmetic.

mod envelope;

use tracing::debug;

use crate::dsp::{goertzel_power, rms, RMS_INT16_SCALE};
use crate::models::{
    CycleStructure, FormatParams, LockedRegion, FREQ_ONE_HZ, FREQ_ZERO_HZ,
};

use envelope::{classify_windows, find_runs, Run, WindowLevel};

/// Windows of foreign classification tolerated between a chart run and the
/// following silence run (phase transitions straddle window boundaries).
const GAP_WINDOWS: usize = 2;

/// Maximum fraction of Low windows inside a valid timecode section.
const MAX_TIMECODE_LOW_FRACTION: f64 = 0.2;

/// Minimum fraction of Low windows inside a valid post-roll silence.
const MIN_POST_SILENCE_LOW_FRACTION: f64 = 0.8;

/// Minimum share of probe power at the two FSK carriers for a section to
/// count as timecode rather than stray tone.
const MIN_FSK_POWER_FRACTION: f64 = 0.25;

/// Locker tuning.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Pin the first cycle to sample 0 (true for freshly generated
    /// streams; false for captures).
    pub assume_start_at_zero: bool,
    /// RMS above this is signal. The reference value is 1000 on the int16
    /// scale; inputs normalized differently must convert accordingly.
    pub high_rms: f64,
    /// RMS below this is silence (100 on the int16 scale).
    pub low_rms: f64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            assume_start_at_zero: false,
            high_rms: 1000.0 / RMS_INT16_SCALE,
            low_rms: 100.0 / RMS_INT16_SCALE,
        }
    }
}

impl LockConfig {
    /// Config for synthetic, sample-0-aligned input.
    pub fn synthetic() -> Self {
        Self {
            assume_start_at_zero: true,
            ..Self::default()
        }
    }
}

/// Why the locker came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDiagnostic {
    /// Less audio than one cycle.
    AudioTooShort { samples: usize, required: usize },
    /// No High-then-Low envelope shape of plausible length anywhere.
    NoCandidateCycle { high_runs: usize },
    /// Candidates existed but none validated as a full cycle.
    AllCandidatesRejected { candidates: usize },
}

/// Locker output: zero or more validated regions, plus a diagnostic when
/// nothing locked. An empty result is not an error.
#[derive(Debug, Clone)]
pub struct CycleLock {
    pub regions: Vec<LockedRegion>,
    pub diagnostic: Option<LockDiagnostic>,
}

/// Locate the timecode section of every complete cycle in `samples`.
pub fn lock_cycles(
    samples: &[f64],
    params: &FormatParams,
    structure: &CycleStructure,
    config: &LockConfig,
) -> CycleLock {
    let spf = params.samples_per_frame_exact();
    let window = ((spf / 4.0).round() as usize).max(1);
    let cycle_samples = params.frame_start_sample(structure.frames_per_cycle()) as usize;

    if samples.len() < cycle_samples {
        return CycleLock {
            regions: Vec::new(),
            diagnostic: Some(LockDiagnostic::AudioTooShort {
                samples: samples.len(),
                required: cycle_samples,
            }),
        };
    }

    let levels = classify_windows(samples, window, config.high_rms, config.low_rms);
    let runs = find_runs(&levels);
    let high_runs = runs.iter().filter(|r| r.level == WindowLevel::High).count();

    let chart_samples = params.frame_start_sample(structure.test_chart_frames) as f64;
    let pre_samples = (params.frame_start_sample(structure.timecode_offset_frames())
        - params.frame_start_sample(structure.test_chart_frames)) as f64;
    let min_high_windows = ((0.8 * chart_samples / window as f64) as usize).max(1);
    let min_low_windows = ((0.5 * pre_samples / window as f64) as usize).max(1);

    let mut regions = Vec::new();
    let mut candidates = 0usize;
    let mut next_free_sample = 0usize;
    let mut first_candidate = true;

    for (i, run) in runs.iter().enumerate() {
        if run.level != WindowLevel::High || run.len < min_high_windows {
            continue;
        }
        let coarse_start = run.start * window;
        if coarse_start < next_free_sample {
            continue;
        }
        if !has_following_silence(&runs[i + 1..], run, min_low_windows) {
            continue;
        }
        candidates += 1;

        let s_cycle = if config.assume_start_at_zero && first_candidate && coarse_start < window {
            0
        } else {
            refine_onset(samples, coarse_start, window, config.low_rms)
        };
        first_candidate = false;

        match validate_candidate(samples, &levels, window, params, structure, config, s_cycle) {
            Some(region) => {
                debug!(
                    video_frame_start = region.video_frame_start,
                    audio_sample_start = region.audio_sample_start,
                    "locked cycle"
                );
                // Leave one window of slack so onset refinement of this
                // cycle cannot push the next cycle's chart run out of reach.
                next_free_sample = (s_cycle + cycle_samples).saturating_sub(window);
                regions.push(region);
            }
            None => {
                debug!(candidate_start = s_cycle, "candidate cycle rejected");
            }
        }
    }

    let diagnostic = if regions.is_empty() {
        Some(if candidates == 0 {
            LockDiagnostic::NoCandidateCycle { high_runs }
        } else {
            LockDiagnostic::AllCandidatesRejected { candidates }
        })
    } else {
        None
    };

    CycleLock {
        regions,
        diagnostic,
    }
}

/// A chart-length High run only starts a cycle if silence follows it.
fn has_following_silence(following: &[Run], high_run: &Run, min_low_windows: usize) -> bool {
    let run_end = high_run.start + high_run.len;
    following
        .iter()
        .take_while(|r| r.start <= run_end + GAP_WINDOWS)
        .any(|r| r.level == WindowLevel::Low && r.len >= min_low_windows)
}

/// Refine a coarse envelope-grid cycle start to the first non-silent sample.
fn refine_onset(samples: &[f64], coarse: usize, window: usize, threshold: f64) -> usize {
    let lo = coarse.saturating_sub(window);
    let hi = (coarse + window).min(samples.len());
    samples[lo..hi]
        .iter()
        .position(|x| x.abs() > threshold)
        .map(|i| lo + i)
        .unwrap_or(coarse)
}

/// Check the expected phase layout from a cycle start and produce the
/// locked region when it holds.
fn validate_candidate(
    samples: &[f64],
    levels: &[WindowLevel],
    window: usize,
    params: &FormatParams,
    structure: &CycleStructure,
    config: &LockConfig,
    s_cycle: usize,
) -> Option<LockedRegion> {
    let offset = |frames: u64| params.frame_start_sample(frames) as usize;
    let tc_off = structure.timecode_offset_frames();

    let s_tc_start = s_cycle + offset(tc_off);
    let s_tc_end = s_cycle + offset(tc_off + structure.timecode_frames);
    let s_post_end = (s_cycle + offset(structure.frames_per_cycle())).min(samples.len());
    if s_tc_end > samples.len() {
        return None;
    }

    // The timecode section must carry energy...
    if low_fraction(levels, window, s_tc_start, s_tc_end) > MAX_TIMECODE_LOW_FRACTION {
        return None;
    }
    // ...and that energy must sit on the FSK carriers.
    if !fsk_present(samples, params, s_tc_start, s_tc_end, config) {
        return None;
    }
    // The post-roll must be silent; with no post-roll windows at all there
    // is no evidence of a complete cycle.
    if low_fraction(levels, window, s_tc_end, s_post_end) < MIN_POST_SILENCE_LOW_FRACTION {
        return None;
    }

    let f_cycle = params.sample_to_nearest_frame(s_cycle as u64);
    Some(LockedRegion {
        video_frame_start: f_cycle + tc_off,
        video_frame_end: f_cycle + tc_off + structure.timecode_frames,
        audio_sample_start: s_tc_start as u64,
        audio_sample_end: s_tc_end as u64,
    })
}

/// Fraction of fully-contained envelope windows classified Low.
fn low_fraction(levels: &[WindowLevel], window: usize, start: usize, end: usize) -> f64 {
    let first = start.div_ceil(window);
    let last = (end / window).min(levels.len());
    if first >= last {
        return 0.0;
    }
    let low = levels[first..last]
        .iter()
        .filter(|&&l| l == WindowLevel::Low)
        .count();
    low as f64 / (last - first) as f64
}

/// Probe one frame into the candidate timecode section for carrier energy.
fn fsk_present(
    samples: &[f64],
    params: &FormatParams,
    s_tc_start: usize,
    s_tc_end: usize,
    config: &LockConfig,
) -> bool {
    let spf = params.samples_per_frame_exact().round() as usize;
    let probe_start = s_tc_start + spf;
    let probe_end = (probe_start + spf).min(s_tc_end).min(samples.len());
    if probe_end <= probe_start {
        return false;
    }
    let probe = &samples[probe_start..probe_end];

    let total_power = rms(probe).powi(2);
    if total_power < config.low_rms.powi(2) {
        return false;
    }
    let fsk_power = goertzel_power(probe, params.audio_sample_rate, FREQ_ZERO_HZ)
        + goertzel_power(probe, params.audio_sample_rate, FREQ_ONE_HZ);
    fsk_power > MIN_FSK_POWER_FRACTION * total_power
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::ToneGenerator;
    use crate::pattern::PatternGenerator;

    fn pal_generator() -> PatternGenerator {
        PatternGenerator::new(FormatParams::pal(), CycleStructure::pal()).unwrap()
    }

    #[test]
    fn locks_single_synthetic_cycle_exactly() {
        let gen = pal_generator();
        let audio = gen.generate_cycle_audio(0).unwrap();

        let lock = lock_cycles(
            &audio,
            gen.params(),
            gen.structure(),
            &LockConfig::synthetic(),
        );

        assert!(lock.diagnostic.is_none());
        assert_eq!(lock.regions.len(), 1);
        let region = lock.regions[0];
        assert_eq!(region.video_frame_start, 100);
        assert_eq!(region.video_frame_end, 850);
        assert_eq!(region.audio_sample_start, 192_000);
        assert_eq!(region.audio_sample_end, 1_632_000);
    }

    #[test]
    fn locks_three_concatenated_cycles_with_leading_silence() {
        let gen = pal_generator();
        let pad_frames = 37u64;
        let pad_samples = gen.params().frame_start_sample(pad_frames) as usize;

        let mut audio = vec![0.0; pad_samples];
        for cycle in 0..3 {
            audio.extend(gen.generate_cycle_audio(cycle).unwrap());
        }

        let lock = lock_cycles(
            &audio,
            gen.params(),
            gen.structure(),
            &LockConfig::default(),
        );

        assert_eq!(lock.regions.len(), 3, "diagnostic: {:?}", lock.diagnostic);
        for (k, region) in lock.regions.iter().enumerate() {
            let cycle_start = pad_samples as u64 + k as u64 * 1_680_000;
            let expect_start = cycle_start + 192_000;
            let expect_end = cycle_start + 1_632_000;
            assert!(
                region.audio_sample_start.abs_diff(expect_start) <= 1,
                "cycle {}: start {} expected {}",
                k,
                region.audio_sample_start,
                expect_start
            );
            assert!(
                region.audio_sample_end.abs_diff(expect_end) <= 1,
                "cycle {}: end {} expected {}",
                k,
                region.audio_sample_end,
                expect_end
            );
            assert_eq!(region.video_frame_start, pad_frames + k as u64 * 875 + 100);
            assert_eq!(region.frame_count(), 750);
        }
    }

    #[test]
    fn empty_and_short_audio_report_too_short() {
        let params = FormatParams::pal();
        let structure = CycleStructure::pal();
        let config = LockConfig::default();

        let lock = lock_cycles(&[], &params, &structure, &config);
        assert!(lock.regions.is_empty());
        assert!(matches!(
            lock.diagnostic,
            Some(LockDiagnostic::AudioTooShort { samples: 0, .. })
        ));

        let lock = lock_cycles(&vec![0.0; 10_000], &params, &structure, &config);
        assert!(lock.regions.is_empty());
        assert!(matches!(
            lock.diagnostic,
            Some(LockDiagnostic::AudioTooShort { .. })
        ));
    }

    #[test]
    fn silence_yields_no_candidates() {
        let params = FormatParams::pal();
        let lock = lock_cycles(
            &vec![0.0; 1_700_000],
            &params,
            &CycleStructure::pal(),
            &LockConfig::default(),
        );
        assert!(lock.regions.is_empty());
        assert!(matches!(
            lock.diagnostic,
            Some(LockDiagnostic::NoCandidateCycle { high_runs: 0 })
        ));
    }

    #[test]
    fn unbroken_tone_yields_no_candidates() {
        let params = FormatParams::pal();
        let mut tone = ToneGenerator::new(48_000, 0.6);
        let audio = tone.generate(1000.0, 1_700_000);
        let lock = lock_cycles(&audio, &params, &CycleStructure::pal(), &LockConfig::default());
        assert!(lock.regions.is_empty());
        assert!(matches!(
            lock.diagnostic,
            Some(LockDiagnostic::NoCandidateCycle { high_runs: 1 })
        ));
    }

    #[test]
    fn chart_followed_by_tone_instead_of_fsk_is_rejected() {
        // Correct envelope shape, but the "timecode" section is a 1 kHz
        // tone: the carrier probe must reject the candidate.
        let params = FormatParams::pal();
        let structure = CycleStructure::pal();
        let mut tone = ToneGenerator::new(48_000, 0.6);

        let mut audio = tone.generate(1000.0, 144_000); // chart
        audio.extend(vec![0.0; 48_000]); // pre silence
        audio.extend(tone.generate(1000.0, 1_440_000)); // wrong content
        audio.extend(vec![0.0; 48_000]); // post silence

        let lock = lock_cycles(&audio, &params, &structure, &LockConfig::default());
        assert!(lock.regions.is_empty());
        assert!(matches!(
            lock.diagnostic,
            Some(LockDiagnostic::AllCandidatesRejected { .. })
        ));
    }
}

//! Temporal correlation of video and audio timecode detections.
//!
//! Matching is sequential: both detection streams are walked in position
//! order and the k-th occurrence of an id in one stream pairs with the k-th
//! occurrence in the other. An exhaustive cross-product looks equivalent but
//! is catastrophically wrong once frame ids repeat across cycles - it pairs
//! every cycle with every other. When correlating several locked regions,
//! process each region independently and combine the match lists with
//! [`build_report`].

mod types;

pub use types::{OffsetMatch, OffsetReport};

use tracing::debug;

use crate::models::TimecodeDetection;

/// Correlator tuning.
#[derive(Debug, Clone, Default)]
pub struct CorrelateConfig {
    /// Discard matches more than 3 sigma from the mean in one refinement
    /// pass and recompute; the count of discarded matches is reported.
    pub trim_outliers: bool,
}

/// Correlate two detection streams and report offset statistics.
///
/// `video` positions are frame indices, `audio` positions sample indices;
/// both are sorted internally before matching, so caller order does not
/// matter. Arbitrarily sparse inputs are fine; an empty side simply yields
/// an empty report.
pub fn correlate(
    video: &[TimecodeDetection],
    audio: &[TimecodeDetection],
    sample_rate: u32,
    fps: f64,
) -> OffsetReport {
    correlate_with(video, audio, sample_rate, fps, &CorrelateConfig::default())
}

/// [`correlate`] with explicit configuration.
pub fn correlate_with(
    video: &[TimecodeDetection],
    audio: &[TimecodeDetection],
    sample_rate: u32,
    fps: f64,
    config: &CorrelateConfig,
) -> OffsetReport {
    let mut video = video.to_vec();
    let mut audio = audio.to_vec();
    video.sort_by_key(|d| d.position);
    audio.sort_by_key(|d| d.position);

    let matches = sequential_match(&video, &audio, sample_rate, fps);
    debug!(
        video = video.len(),
        audio = audio.len(),
        matches = matches.len(),
        "sequential matching finished"
    );
    build_report(matches, config)
}

/// Walk both sorted streams, pairing equal ids and skipping ids the other
/// stream missed. O(|video| + |audio|).
fn sequential_match(
    video: &[TimecodeDetection],
    audio: &[TimecodeDetection],
    sample_rate: u32,
    fps: f64,
) -> Vec<OffsetMatch> {
    let mut matches = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < video.len() && j < audio.len() {
        match video[i].frame_id.cmp(&audio[j].frame_id) {
            std::cmp::Ordering::Equal => {
                let video_time = video[i].position as f64 / fps;
                let audio_time = audio[j].position as f64 / sample_rate as f64;
                matches.push(OffsetMatch {
                    frame_id: video[i].frame_id,
                    video_time_seconds: video_time,
                    audio_time_seconds: audio_time,
                    offset_seconds: audio_time - video_time,
                    confidence: video[i].confidence.min(audio[j].confidence),
                });
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    matches
}

/// Build the statistics report from a match list.
///
/// Public so multi-region callers can concatenate per-region match lists
/// and compute one combined report.
pub fn build_report(mut matches: Vec<OffsetMatch>, config: &CorrelateConfig) -> OffsetReport {
    if matches.is_empty() {
        return OffsetReport::empty();
    }

    let (mean, std_dev) = offset_stats(&matches);
    let mut outliers_discarded = 0;

    if config.trim_outliers && std_dev > 0.0 {
        let kept: Vec<OffsetMatch> = matches
            .iter()
            .copied()
            .filter(|m| (m.offset_seconds - mean).abs() <= 3.0 * std_dev)
            .collect();
        outliers_discarded = matches.len() - kept.len();
        if outliers_discarded > 0 && !kept.is_empty() {
            matches = kept;
        }
    }

    let (mean, std_dev) = offset_stats(&matches);
    let min = matches
        .iter()
        .map(|m| m.offset_seconds)
        .fold(f64::INFINITY, f64::min);
    let max = matches
        .iter()
        .map(|m| m.offset_seconds)
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_confidence =
        matches.iter().map(|m| m.confidence).sum::<f64>() / matches.len() as f64;

    OffsetReport {
        mean_offset_seconds: mean,
        std_dev_seconds: std_dev,
        min_offset_seconds: min,
        max_offset_seconds: max,
        match_count: matches.len(),
        mean_confidence,
        outliers_discarded,
        matches,
    }
}

/// Mean and population standard deviation of the match offsets.
fn offset_stats(matches: &[OffsetMatch]) -> (f64, f64) {
    let n = matches.len() as f64;
    let mean = matches.iter().map(|m| m.offset_seconds).sum::<f64>() / n;
    let variance = matches
        .iter()
        .map(|m| (m.offset_seconds - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPS: f64 = 25.0;
    const SR: u32 = 48_000;

    /// Video detection at its nominal stream position.
    fn vdet(frame_index: u64, id: u32) -> TimecodeDetection {
        TimecodeDetection {
            position: frame_index,
            frame_id: id,
            confidence: 0.9,
        }
    }

    /// Audio detection offset from nominal by `delta_samples`.
    fn adet(frame_index: u64, id: u32, delta_samples: i64) -> TimecodeDetection {
        let nominal = frame_index as i64 * 1920;
        TimecodeDetection {
            position: (nominal + delta_samples) as u64,
            frame_id: id,
            confidence: 0.8,
        }
    }

    #[test]
    fn matches_identical_sequences_with_constant_offset() {
        // 10 ms of audio lag on every frame.
        let video: Vec<_> = (0..5).map(|k| vdet(k, k as u32)).collect();
        let audio: Vec<_> = (0..5).map(|k| adet(k, k as u32, 480)).collect();

        let report = correlate(&video, &audio, SR, FPS);

        assert_eq!(report.match_count, 5);
        assert!((report.mean_offset_seconds - 0.010).abs() < 1e-9);
        assert!(report.std_dev_seconds < 1e-9);
        assert!((report.mean_confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn missing_audio_id_does_not_shift_pairing() {
        // Audio misses id 2: ids 0,1,3,4 must pair; video id 2 must not
        // pair with audio id 3.
        let video: Vec<_> = (0..5).map(|k| vdet(k, k as u32)).collect();
        let audio: Vec<_> = [0u32, 1, 3, 4]
            .iter()
            .map(|&id| adet(id as u64, id, 0))
            .collect();

        let report = correlate(&video, &audio, SR, FPS);

        let ids: Vec<u32> = report.matches.iter().map(|m| m.frame_id).collect();
        assert_eq!(ids, vec![0, 1, 3, 4]);
        for m in &report.matches {
            assert!(m.offset_seconds.abs() < 1e-9, "id {} drifted", m.frame_id);
        }
    }

    #[test]
    fn dropped_id_pairs_later_occurrences_correctly() {
        // Scenario: video 0..=9, audio missing id 3. Nine matches; audio[3]
        // (id 4) pairs with video id 4, not with video id 3.
        let video: Vec<_> = (0..10).map(|k| vdet(k, k as u32)).collect();
        let audio: Vec<_> = (0..10)
            .filter(|&k| k != 3)
            .map(|k| adet(k, k as u32, 0))
            .collect();

        let report = correlate(&video, &audio, SR, FPS);

        assert_eq!(report.match_count, 9);
        assert!(report.matches.iter().all(|m| m.offset_seconds.abs() < 1e-9));
        assert!(!report.matches.iter().any(|m| m.frame_id == 3));
    }

    #[test]
    fn repeated_ids_pair_by_occurrence_order() {
        // Two cycles reusing ids 0..3: the k-th occurrence of an id in
        // video pairs with the k-th occurrence in audio, never across
        // cycles.
        let video: Vec<_> = (0..8).map(|k| vdet(k, (k % 4) as u32)).collect();
        let audio: Vec<_> = (0..8).map(|k| adet(k, (k % 4) as u32, 96)).collect();

        let report = correlate(&video, &audio, SR, FPS);

        assert_eq!(report.match_count, 8);
        assert!((report.mean_offset_seconds - 0.002).abs() < 1e-9);
        assert!(report.std_dev_seconds < 1e-9);
    }

    #[test]
    fn empty_inputs_yield_empty_report() {
        let video = vec![vdet(0, 0)];
        let report = correlate(&video, &[], SR, FPS);
        assert_eq!(report.match_count, 0);
        assert_eq!(report, OffsetReport::empty());

        let report = correlate(&[], &[], SR, FPS);
        assert_eq!(report.match_count, 0);
    }

    #[test]
    fn unsorted_inputs_are_sorted_before_matching() {
        let video = vec![vdet(2, 2), vdet(0, 0), vdet(1, 1)];
        let audio = vec![adet(1, 1, 0), adet(2, 2, 0), adet(0, 0, 0)];
        let report = correlate(&video, &audio, SR, FPS);
        assert_eq!(report.match_count, 3);
    }

    #[test]
    fn negative_offsets_mean_audio_leads() {
        let video = vec![vdet(0, 0)];
        let audio = vec![TimecodeDetection {
            position: 0,
            frame_id: 0,
            confidence: 0.8,
        }];
        // Shift video later by one frame: audio now leads.
        let video_late = vec![TimecodeDetection {
            position: 1,
            ..video[0]
        }];
        let report = correlate(&video_late, &audio, SR, FPS);
        assert!(report.mean_offset_seconds < 0.0);
    }

    #[test]
    fn outlier_trimming_discards_and_reports() {
        let video: Vec<_> = (0..20).map(|k| vdet(k, k as u32)).collect();
        let mut audio: Vec<_> = (0..20).map(|k| adet(k, k as u32, 48)).collect();
        // One wild detection, 100 ms off.
        audio[10].position += 4800;

        let trimmed = correlate_with(
            &video,
            &audio,
            SR,
            FPS,
            &CorrelateConfig {
                trim_outliers: true,
            },
        );
        assert_eq!(trimmed.outliers_discarded, 1);
        assert_eq!(trimmed.match_count, 19);
        assert!((trimmed.mean_offset_seconds - 0.001).abs() < 1e-6);
        assert!(trimmed.std_dev_seconds < 1e-6);

        let untrimmed = correlate(&video, &audio, SR, FPS);
        assert_eq!(untrimmed.outliers_discarded, 0);
        assert_eq!(untrimmed.match_count, 20);
        assert!(untrimmed.std_dev_seconds > trimmed.std_dev_seconds);
    }

    #[test]
    fn statistics_cover_min_and_max() {
        let video: Vec<_> = (0..3).map(|k| vdet(k, k as u32)).collect();
        let audio = vec![
            adet(0, 0, 0),
            adet(1, 1, 480),
            adet(2, 2, 960),
        ];
        let report = correlate(&video, &audio, SR, FPS);
        assert!((report.min_offset_seconds - 0.0).abs() < 1e-9);
        assert!((report.max_offset_seconds - 0.020).abs() < 1e-9);
        assert!((report.mean_offset_seconds - 0.010).abs() < 1e-9);
    }
}

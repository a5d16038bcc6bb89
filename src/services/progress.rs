use time::OffsetDateTime;

use crate::db::models::{Module, VideoProgress};
use crate::services::course_outline::{find_video, total_videos};

/// Fraction of a video that must be watched before it counts as completed.
pub(crate) const COMPLETION_THRESHOLD: f64 = 0.9;

/// Upserts the watch record for one video and returns the stored state.
///
/// `reported_seconds` is clamped to `[0, duration]`. Watched time and the
/// completed flag only ever move forward.
pub(crate) fn record_watch(
    records: &mut Vec<VideoProgress>,
    module_id: &str,
    video_id: &str,
    reported_seconds: f64,
    duration: f64,
    now: OffsetDateTime,
) -> VideoProgress {
    let clamped = clamp_seconds(reported_seconds, duration);

    let index = match records
        .iter()
        .position(|record| record.module_id == module_id && record.video_id == video_id)
    {
        Some(index) => index,
        None => {
            records.push(VideoProgress {
                module_id: module_id.to_string(),
                video_id: video_id.to_string(),
                watched_seconds: 0.0,
                duration,
                completed: false,
                last_watched_at: now,
            });
            records.len() - 1
        }
    };

    let record = &mut records[index];
    record.watched_seconds = record.watched_seconds.min(duration.max(0.0)).max(clamped);
    record.duration = duration;
    record.completed = record.completed || reached_threshold(record.watched_seconds, duration);
    record.last_watched_at = now;
    record.clone()
}

/// Course completion percentage over the videos that still exist in the outline.
pub(crate) fn course_progress(records: &[VideoProgress], modules: &[Module]) -> (i32, bool) {
    let total = total_videos(modules);
    if total == 0 {
        return (0, false);
    }

    let completed = records
        .iter()
        .filter(|record| record.completed)
        .filter(|record| find_video(modules, &record.module_id, &record.video_id).is_some())
        .count();

    let progress = ((completed as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as i32;
    (progress, progress == 100)
}

fn clamp_seconds(value: f64, duration: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        return 0.0;
    }
    value.min(duration.max(0.0))
}

fn reached_threshold(watched: f64, duration: f64) -> bool {
    duration > 0.0 && watched / duration >= COMPLETION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::StoredAsset;
    use crate::services::course_outline::{append_module, append_video, NewVideo};

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn outline(videos_per_module: &[usize]) -> Vec<Module> {
        let mut modules = Vec::new();
        for (index, count) in videos_per_module.iter().enumerate() {
            let module_id =
                append_module(&mut modules, &format!("Module {index}"), now()).expect("module");
            for video in 0..*count {
                let public_id = format!("videos/u1/{index}-{video}.mp4");
                append_video(
                    &mut modules,
                    &module_id,
                    NewVideo {
                        title: format!("Video {video}"),
                        asset: StoredAsset {
                            url: format!("https://cdn.example/{public_id}"),
                            public_id,
                        },
                        duration: 100.0,
                        size_in_bytes: 10,
                    },
                    now(),
                )
                .expect("video");
            }
        }
        modules
    }

    #[test]
    fn overlong_watch_is_clamped_and_completes() {
        let mut records = Vec::new();
        let saved = record_watch(&mut records, "m", "v", 150.0, 100.0, now());
        assert_eq!(saved.watched_seconds, 100.0);
        assert!(saved.completed);
    }

    #[test]
    fn later_smaller_report_never_regresses() {
        let mut records = Vec::new();
        record_watch(&mut records, "m", "v", 150.0, 100.0, now());
        let saved = record_watch(&mut records, "m", "v", 10.0, 100.0, now());

        assert_eq!(saved.watched_seconds, 100.0);
        assert!(saved.completed);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn negative_or_nan_reports_count_as_zero() {
        let mut records = Vec::new();
        assert_eq!(record_watch(&mut records, "m", "v", -5.0, 100.0, now()).watched_seconds, 0.0);
        assert_eq!(
            record_watch(&mut records, "m", "w", f64::NAN, 100.0, now()).watched_seconds,
            0.0
        );
    }

    #[test]
    fn threshold_is_ninety_percent() {
        let mut records = Vec::new();
        assert!(!record_watch(&mut records, "m", "v", 89.9, 100.0, now()).completed);
        assert!(record_watch(&mut records, "m", "v", 90.0, 100.0, now()).completed);
    }

    #[test]
    fn progress_rounds_and_ignores_removed_videos() {
        let modules = outline(&[2, 1]);
        let first = &modules[0];
        let mut records = Vec::new();
        record_watch(&mut records, &first.id, &first.videos[0].id, 100.0, 100.0, now());
        record_watch(&mut records, "gone", "gone", 100.0, 100.0, now());

        assert_eq!(course_progress(&records, &modules), (33, false));

        record_watch(&mut records, &first.id, &first.videos[1].id, 95.0, 100.0, now());
        let second = &modules[1];
        record_watch(&mut records, &second.id, &second.videos[0].id, 100.0, 100.0, now());
        assert_eq!(course_progress(&records, &modules), (100, true));
    }

    #[test]
    fn empty_outline_has_zero_progress() {
        assert_eq!(course_progress(&[], &[]), (0, false));
    }
}

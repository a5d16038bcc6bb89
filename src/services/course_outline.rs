//! Pure operations over a course's ordered module/video tree.
//!
//! Every mutation leaves the tree with dense `1..N` ranks at both levels and
//! with durations recomputed from the leaves, so callers can persist the result
//! with a single compare-and-swap write.

use std::collections::HashSet;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{Module, StoredAsset, Tombstones, Video};
use crate::services::errors::DomainError;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum OutlineError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("video duration must be a positive number of seconds")]
    InvalidDuration,
    #[error("module not found")]
    ModuleNotFound,
    #[error("video not found")]
    VideoNotFound,
    #[error("module was already deleted")]
    ModuleAlreadyDeleted,
    #[error("video was already deleted")]
    VideoAlreadyDeleted,
    #[error("invalid order: {0}")]
    InvalidOrder(&'static str),
    #[error("course has no modules")]
    NoModules,
    #[error("module '{0}' has no videos")]
    EmptyModule(String),
}

impl From<OutlineError> for DomainError {
    fn from(err: OutlineError) -> Self {
        match err {
            OutlineError::EmptyTitle | OutlineError::InvalidDuration => {
                DomainError::InvalidInput(err.to_string())
            }
            OutlineError::ModuleNotFound => DomainError::NotFound("Module not found".to_string()),
            OutlineError::VideoNotFound => DomainError::NotFound("Video not found".to_string()),
            OutlineError::ModuleAlreadyDeleted | OutlineError::VideoAlreadyDeleted => {
                DomainError::AlreadyDeleted(err.to_string())
            }
            OutlineError::InvalidOrder(_) => DomainError::InvalidOrder(err.to_string()),
            OutlineError::NoModules | OutlineError::EmptyModule(_) => DomainError::InvalidState(
                format!("Course is not ready for review: {err}"),
            ),
        }
    }
}

/// Metadata for a video whose asset reference has already been validated.
#[derive(Debug, Clone)]
pub(crate) struct NewVideo {
    pub(crate) title: String,
    pub(crate) asset: StoredAsset,
    pub(crate) duration: f64,
    pub(crate) size_in_bytes: i64,
}

pub(crate) fn append_module(
    modules: &mut Vec<Module>,
    title: &str,
    now: OffsetDateTime,
) -> Result<String, OutlineError> {
    let title = normalized_title(title)?;
    let id = Uuid::new_v4().to_string();
    modules.push(Module {
        id: id.clone(),
        title,
        videos: Vec::new(),
        module_duration: 0.0,
        order: rank(modules.len()),
        created_at: now,
        updated_at: now,
    });
    Ok(id)
}

pub(crate) fn append_video(
    modules: &mut [Module],
    module_id: &str,
    video: NewVideo,
    now: OffsetDateTime,
) -> Result<String, OutlineError> {
    let title = normalized_title(&video.title)?;
    if !video.duration.is_finite() || video.duration <= 0.0 {
        return Err(OutlineError::InvalidDuration);
    }

    let module = module_mut(modules, module_id)?;
    let id = Uuid::new_v4().to_string();
    module.videos.push(Video {
        id: id.clone(),
        title,
        asset: video.asset,
        duration: video.duration,
        video_size_in_bytes: video.size_in_bytes,
        order: rank(module.videos.len()),
        created_at: now,
        updated_at: now,
    });
    module.module_duration = module_duration(module);
    module.updated_at = now;
    Ok(id)
}

/// Rewrites module ranks to match `new_order`, which must be a permutation of
/// the current module ids. Nothing is touched when validation fails.
pub(crate) fn reorder_modules(
    modules: &mut Vec<Module>,
    new_order: &[String],
    now: OffsetDateTime,
) -> Result<(), OutlineError> {
    let current: Vec<&str> = modules.iter().map(|module| module.id.as_str()).collect();
    validate_permutation(&current, new_order)?;

    let mut remaining = std::mem::take(modules);
    for id in new_order {
        if let Some(index) = remaining.iter().position(|module| &module.id == id) {
            modules.push(remaining.swap_remove(index));
        }
    }
    for (index, module) in modules.iter_mut().enumerate() {
        module.order = rank(index);
        module.updated_at = now;
    }
    Ok(())
}

pub(crate) fn reorder_videos(
    modules: &mut [Module],
    module_id: &str,
    new_order: &[String],
    now: OffsetDateTime,
) -> Result<(), OutlineError> {
    let module = module_mut(modules, module_id)?;
    let current: Vec<&str> = module.videos.iter().map(|video| video.id.as_str()).collect();
    validate_permutation(&current, new_order)?;

    let mut remaining = std::mem::take(&mut module.videos);
    for id in new_order {
        if let Some(index) = remaining.iter().position(|video| &video.id == id) {
            module.videos.push(remaining.swap_remove(index));
        }
    }
    for (index, video) in module.videos.iter_mut().enumerate() {
        video.order = rank(index);
        video.updated_at = now;
    }
    module.updated_at = now;
    Ok(())
}

/// Removes a module and returns it so the caller can clean up its assets
/// once the new outline is committed.
pub(crate) fn delete_module(
    modules: &mut Vec<Module>,
    tombstones: &mut Tombstones,
    module_id: &str,
    now: OffsetDateTime,
) -> Result<Module, OutlineError> {
    let Some(index) = modules.iter().position(|module| module.id == module_id) else {
        return Err(if tombstones.modules.contains(module_id) {
            OutlineError::ModuleAlreadyDeleted
        } else {
            OutlineError::ModuleNotFound
        });
    };

    let removed = modules.remove(index);
    tombstones.modules.insert(removed.id.clone());
    tombstones.videos.extend(removed.videos.iter().map(|video| video.id.clone()));

    for (position, module) in modules.iter_mut().enumerate() {
        let order = rank(position);
        if module.order != order {
            module.order = order;
            module.updated_at = now;
        }
    }
    Ok(removed)
}

pub(crate) fn delete_video(
    modules: &mut [Module],
    tombstones: &mut Tombstones,
    module_id: &str,
    video_id: &str,
    now: OffsetDateTime,
) -> Result<Video, OutlineError> {
    let module = match module_mut(modules, module_id) {
        Ok(module) => module,
        Err(_) if tombstones.modules.contains(module_id) => {
            return Err(OutlineError::ModuleAlreadyDeleted)
        }
        Err(err) => return Err(err),
    };

    let Some(index) = module.videos.iter().position(|video| video.id == video_id) else {
        return Err(if tombstones.videos.contains(video_id) {
            OutlineError::VideoAlreadyDeleted
        } else {
            OutlineError::VideoNotFound
        });
    };

    let removed = module.videos.remove(index);
    tombstones.videos.insert(removed.id.clone());

    for (position, video) in module.videos.iter_mut().enumerate() {
        let order = rank(position);
        if video.order != order {
            video.order = order;
            video.updated_at = now;
        }
    }
    module.module_duration = module_duration(module);
    module.updated_at = now;
    Ok(removed)
}

/// Sum of module durations, each recomputed from its videos.
pub(crate) fn course_duration(modules: &[Module]) -> f64 {
    modules.iter().map(module_duration).sum()
}

pub(crate) fn module_duration(module: &Module) -> f64 {
    module.videos.iter().map(|video| video.duration).sum()
}

pub(crate) fn total_videos(modules: &[Module]) -> usize {
    modules.iter().map(|module| module.videos.len()).sum()
}

pub(crate) fn find_video<'a>(
    modules: &'a [Module],
    module_id: &str,
    video_id: &str,
) -> Option<&'a Video> {
    modules
        .iter()
        .find(|module| module.id == module_id)
        .and_then(|module| module.videos.iter().find(|video| video.id == video_id))
}

/// A course may enter review only with at least one module, each holding a video.
pub(crate) fn ensure_ready_for_review(modules: &[Module]) -> Result<(), OutlineError> {
    if modules.is_empty() {
        return Err(OutlineError::NoModules);
    }
    if let Some(empty) = modules.iter().find(|module| module.videos.is_empty()) {
        return Err(OutlineError::EmptyModule(empty.title.clone()));
    }
    Ok(())
}

fn module_mut<'a>(modules: &'a mut [Module], module_id: &str) -> Result<&'a mut Module, OutlineError> {
    modules.iter_mut().find(|module| module.id == module_id).ok_or(OutlineError::ModuleNotFound)
}

fn normalized_title(title: &str) -> Result<String, OutlineError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(OutlineError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

fn validate_permutation(current: &[&str], new_order: &[String]) -> Result<(), OutlineError> {
    if current.len() != new_order.len() {
        return Err(OutlineError::InvalidOrder("length does not match the existing items"));
    }

    let mut seen = HashSet::with_capacity(new_order.len());
    for id in new_order {
        if !seen.insert(id.as_str()) {
            return Err(OutlineError::InvalidOrder("duplicate id"));
        }
        if !current.contains(&id.as_str()) {
            return Err(OutlineError::InvalidOrder("unknown id"));
        }
    }
    Ok(())
}

fn rank(index: usize) -> i32 {
    i32::try_from(index + 1).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn video(title: &str, duration: f64) -> NewVideo {
        NewVideo {
            title: title.to_string(),
            asset: StoredAsset {
                url: format!("https://cdn.example/videos/u1/{title}.mp4"),
                public_id: format!("videos/u1/{title}.mp4"),
            },
            duration,
            size_in_bytes: 1024,
        }
    }

    fn assert_invariants(modules: &[Module]) {
        for (index, module) in modules.iter().enumerate() {
            assert_eq!(module.order as usize, index + 1, "module ranks must be dense");
            for (video_index, video) in module.videos.iter().enumerate() {
                assert_eq!(video.order as usize, video_index + 1, "video ranks must be dense");
            }
            let expected: f64 = module.videos.iter().map(|video| video.duration).sum();
            assert!((module.module_duration - expected).abs() < 1e-9);
        }
        let total: f64 = modules.iter().map(|module| module.module_duration).sum();
        assert!((course_duration(modules) - total).abs() < 1e-9);
    }

    fn ids(modules: &[Module]) -> Vec<String> {
        modules.iter().map(|module| module.id.clone()).collect()
    }

    #[test]
    fn append_assigns_next_rank_and_rolls_up_duration() {
        let mut modules = Vec::new();
        let first = append_module(&mut modules, "  Intro  ", now()).expect("module");
        let second = append_module(&mut modules, "Basics", now()).expect("module");

        append_video(&mut modules, &first, video("a", 30.0), now()).expect("video");
        append_video(&mut modules, &first, video("b", 45.5), now()).expect("video");
        append_video(&mut modules, &second, video("c", 10.0), now()).expect("video");

        assert_eq!(modules[0].title, "Intro");
        assert_eq!(modules[1].order, 2);
        assert_eq!(modules[0].videos[1].order, 2);
        assert!((modules[0].module_duration - 75.5).abs() < 1e-9);
        assert!((course_duration(&modules) - 85.5).abs() < 1e-9);
        assert_invariants(&modules);
    }

    #[test]
    fn append_rejects_blank_title_and_bad_duration() {
        let mut modules = Vec::new();
        assert_eq!(append_module(&mut modules, "   ", now()), Err(OutlineError::EmptyTitle));

        let module_id = append_module(&mut modules, "Intro", now()).expect("module");
        assert_eq!(
            append_video(&mut modules, &module_id, video("x", 0.0), now()),
            Err(OutlineError::InvalidDuration)
        );
        assert_eq!(
            append_video(&mut modules, &module_id, video("x", f64::NAN), now()),
            Err(OutlineError::InvalidDuration)
        );
        assert_eq!(
            append_video(&mut modules, "missing", video("x", 3.0), now()),
            Err(OutlineError::ModuleNotFound)
        );
    }

    #[test]
    fn reorder_rewrites_ranks_to_new_positions() {
        let mut modules = Vec::new();
        let a = append_module(&mut modules, "A", now()).expect("module");
        let b = append_module(&mut modules, "B", now()).expect("module");
        let c = append_module(&mut modules, "C", now()).expect("module");

        reorder_modules(&mut modules, &[c.clone(), a.clone(), b.clone()], now()).expect("reorder");

        assert_eq!(ids(&modules), vec![c, a, b]);
        assert_invariants(&modules);
    }

    #[test]
    fn reorder_with_non_permutation_changes_nothing() {
        let mut modules = Vec::new();
        let a = append_module(&mut modules, "A", now()).expect("module");
        let b = append_module(&mut modules, "B", now()).expect("module");
        let before = modules.clone();

        let short = reorder_modules(&mut modules, &[a.clone()], now());
        let duplicate = reorder_modules(&mut modules, &[a.clone(), a.clone()], now());
        let unknown = reorder_modules(&mut modules, &[a.clone(), "zzz".to_string()], now());
        let long = reorder_modules(&mut modules, &[b.clone(), a.clone(), b.clone()], now());

        assert!(matches!(short, Err(OutlineError::InvalidOrder(_))));
        assert!(matches!(duplicate, Err(OutlineError::InvalidOrder(_))));
        assert!(matches!(unknown, Err(OutlineError::InvalidOrder(_))));
        assert!(matches!(long, Err(OutlineError::InvalidOrder(_))));
        assert_eq!(modules, before);
    }

    #[test]
    fn reorder_videos_is_scoped_to_one_module() {
        let mut modules = Vec::new();
        let m1 = append_module(&mut modules, "M1", now()).expect("module");
        let m2 = append_module(&mut modules, "M2", now()).expect("module");
        let v1 = append_video(&mut modules, &m1, video("v1", 1.0), now()).expect("video");
        let v2 = append_video(&mut modules, &m1, video("v2", 2.0), now()).expect("video");
        let other = append_video(&mut modules, &m2, video("o", 3.0), now()).expect("video");

        let foreign = reorder_videos(&mut modules, &m1, &[v2.clone(), other], now());
        assert!(matches!(foreign, Err(OutlineError::InvalidOrder(_))));

        reorder_videos(&mut modules, &m1, &[v2.clone(), v1.clone()], now()).expect("reorder");
        let order: Vec<_> = modules[0].videos.iter().map(|video| video.id.clone()).collect();
        assert_eq!(order, vec![v2, v1]);
        assert_invariants(&modules);
    }

    #[test]
    fn delete_module_reranks_and_second_delete_is_distinct() {
        let mut modules = Vec::new();
        let mut tombstones = Tombstones::default();
        let a = append_module(&mut modules, "A", now()).expect("module");
        let b = append_module(&mut modules, "B", now()).expect("module");
        let c = append_module(&mut modules, "C", now()).expect("module");
        append_video(&mut modules, &b, video("v", 12.0), now()).expect("video");
        append_video(&mut modules, &c, video("w", 8.0), now()).expect("video");

        let removed = delete_module(&mut modules, &mut tombstones, &b, now()).expect("delete");

        assert_eq!(removed.videos.len(), 1);
        assert_eq!(ids(&modules), vec![a, c]);
        assert!((course_duration(&modules) - 8.0).abs() < 1e-9);
        assert_invariants(&modules);

        assert_eq!(
            delete_module(&mut modules, &mut tombstones, &b, now()),
            Err(OutlineError::ModuleAlreadyDeleted)
        );
        assert_eq!(
            delete_module(&mut modules, &mut tombstones, "never-existed", now()),
            Err(OutlineError::ModuleNotFound)
        );
    }

    #[test]
    fn delete_video_recomputes_durations_and_tracks_tombstones() {
        let mut modules = Vec::new();
        let mut tombstones = Tombstones::default();
        let m = append_module(&mut modules, "M", now()).expect("module");
        let v1 = append_video(&mut modules, &m, video("v1", 10.0), now()).expect("video");
        let v2 = append_video(&mut modules, &m, video("v2", 20.0), now()).expect("video");

        let removed = delete_video(&mut modules, &mut tombstones, &m, &v1, now()).expect("delete");

        assert_eq!(removed.asset.public_id, "videos/u1/v1.mp4");
        assert_eq!(modules[0].videos[0].id, v2);
        assert_eq!(modules[0].videos[0].order, 1);
        assert!((modules[0].module_duration - 20.0).abs() < 1e-9);
        assert_eq!(
            delete_video(&mut modules, &mut tombstones, &m, &v1, now()),
            Err(OutlineError::VideoAlreadyDeleted)
        );
        assert_eq!(
            delete_video(&mut modules, &mut tombstones, &m, "nope", now()),
            Err(OutlineError::VideoNotFound)
        );
    }

    #[test]
    fn tombstones_record_each_removed_id_once() {
        let mut modules = Vec::new();
        let mut tombstones = Tombstones::default();
        let m = append_module(&mut modules, "M", now()).expect("module");
        let v = append_video(&mut modules, &m, video("v", 10.0), now()).expect("video");
        delete_video(&mut modules, &mut tombstones, &m, &v, now()).expect("delete video");
        delete_module(&mut modules, &mut tombstones, &m, now()).expect("delete module");

        assert_eq!(tombstones.modules.len(), 1);
        assert_eq!(tombstones.videos.len(), 1);
        assert!(tombstones.videos.contains(&v));
    }

    #[test]
    fn video_of_deleted_module_reports_already_deleted() {
        let mut modules = Vec::new();
        let mut tombstones = Tombstones::default();
        let m = append_module(&mut modules, "M", now()).expect("module");
        let v = append_video(&mut modules, &m, video("v", 10.0), now()).expect("video");
        delete_module(&mut modules, &mut tombstones, &m, now()).expect("delete");

        assert_eq!(
            delete_video(&mut modules, &mut tombstones, &m, &v, now()),
            Err(OutlineError::ModuleAlreadyDeleted)
        );
    }

    #[test]
    fn readiness_requires_modules_with_videos() {
        let mut modules = Vec::new();
        assert_eq!(ensure_ready_for_review(&modules), Err(OutlineError::NoModules));

        let m = append_module(&mut modules, "Intro", now()).expect("module");
        assert_eq!(
            ensure_ready_for_review(&modules),
            Err(OutlineError::EmptyModule("Intro".to_string()))
        );

        append_video(&mut modules, &m, video("v", 5.0), now()).expect("video");
        assert_eq!(ensure_ready_for_review(&modules), Ok(()));
        assert_eq!(total_videos(&modules), 1);
        assert!(find_video(&modules, &m, &modules[0].videos[0].id.clone()).is_some());
    }

    #[test]
    fn outline_errors_map_to_domain_taxonomy() {
        assert!(matches!(DomainError::from(OutlineError::EmptyTitle), DomainError::InvalidInput(_)));
        assert!(matches!(
            DomainError::from(OutlineError::InvalidOrder("duplicate id")),
            DomainError::InvalidOrder(_)
        ));
        assert!(matches!(
            DomainError::from(OutlineError::ModuleAlreadyDeleted),
            DomainError::AlreadyDeleted(_)
        ));
        assert!(matches!(DomainError::from(OutlineError::VideoNotFound), DomainError::NotFound(_)));
        assert!(matches!(DomainError::from(OutlineError::NoModules), DomainError::InvalidState(_)));
    }

    #[test]
    fn random_operation_sequences_preserve_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut modules = Vec::new();
        let mut tombstones = Tombstones::default();

        for step in 0..500 {
            match rng.gen_range(0..6) {
                0 => {
                    append_module(&mut modules, &format!("module {step}"), now()).expect("module");
                }
                1 if !modules.is_empty() => {
                    let target = modules[rng.gen_range(0..modules.len())].id.clone();
                    let duration = rng.gen_range(1.0..600.0);
                    append_video(&mut modules, &target, video(&format!("v{step}"), duration), now())
                        .expect("video");
                }
                2 if !modules.is_empty() => {
                    let mut order = ids(&modules);
                    order.shuffle(&mut rng);
                    reorder_modules(&mut modules, &order, now()).expect("reorder");
                }
                3 if !modules.is_empty() => {
                    let index = rng.gen_range(0..modules.len());
                    let module_id = modules[index].id.clone();
                    let mut order: Vec<String> =
                        modules[index].videos.iter().map(|video| video.id.clone()).collect();
                    order.shuffle(&mut rng);
                    reorder_videos(&mut modules, &module_id, &order, now()).expect("reorder");
                }
                4 if modules.len() > 2 => {
                    let target = modules[rng.gen_range(0..modules.len())].id.clone();
                    delete_module(&mut modules, &mut tombstones, &target, now()).expect("delete");
                }
                5 if !modules.is_empty() => {
                    let index = rng.gen_range(0..modules.len());
                    if let Some(video) = modules[index].videos.first().cloned() {
                        let module_id = modules[index].id.clone();
                        delete_video(&mut modules, &mut tombstones, &module_id, &video.id, now())
                            .expect("delete");
                    }
                }
                _ => {}
            }
            assert_invariants(&modules);
        }
    }
}

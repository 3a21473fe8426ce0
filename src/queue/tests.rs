use super::*;
use crate::library::Track;
use std::cell::RefCell;
use std::rc::Rc;

type Calls = Rc<RefCell<Vec<String>>>;

/// Records every transport call as a short string.
struct Recorder(Calls);

impl Transport for Recorder {
    fn play(&mut self, track: &QueueTrack) {
        self.0.borrow_mut().push(format!("play:{}", track.title));
    }
    fn toggle_pause(&mut self) {
        self.0.borrow_mut().push("toggle".into());
    }
    fn set_volume(&mut self, volume: f32) {
        self.0.borrow_mut().push(format!("volume:{volume}"));
    }
    fn activate(&mut self) {
        self.0.borrow_mut().push("activate".into());
    }
    fn deactivate(&mut self) {
        self.0.borrow_mut().push("deactivate".into());
    }
    fn stop(&mut self) {
        self.0.borrow_mut().push("stop".into());
    }
}

fn manager() -> (QueueManager, Calls) {
    let calls: Calls = Rc::new(RefCell::new(Vec::new()));
    (QueueManager::new(Box::new(Recorder(calls.clone()))), calls)
}

fn t(title: &str) -> Track {
    Track {
        title: title.into(),
        file_path: format!("/music/{title}.flac"),
        duration: 180,
        ..Track::default()
    }
}

fn many(n: usize) -> Vec<Track> {
    (0..n).map(|i| t(&format!("t{i}"))).collect()
}

fn titles<'a>(entries: impl IntoIterator<Item = &'a QueueTrack>) -> Vec<String> {
    entries.into_iter().map(|e| e.title.clone()).collect()
}

#[test]
fn bottom_adds_keep_insertion_order() {
    let (mut q, _) = manager();
    q.add_to_queue(t("a"), AddMode::Bottom);
    q.add_many_to_queue(vec![t("b"), t("c")], AddMode::Bottom);
    assert_eq!(titles(q.queue()), vec!["a", "b", "c"]);
    assert!(q.backlog().is_empty());
}

#[test]
fn top_batch_lands_ahead_in_original_order() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("x"), t("y")], AddMode::Bottom);
    q.add_many_to_queue(vec![t("a"), t("b"), t("c")], AddMode::Top);
    assert_eq!(titles(q.queue()), vec!["a", "b", "c", "x", "y"]);
}

#[test]
fn queue_fills_to_limit_before_touching_backlog() {
    let (mut q, _) = manager();
    q.add_many_to_queue(many(QUEUE_LIMIT), AddMode::Bottom);
    assert_eq!(q.queue().len(), QUEUE_LIMIT);
    assert!(q.backlog().is_empty());

    q.add_to_queue(t("overflow"), AddMode::Bottom);
    assert_eq!(q.queue().len(), QUEUE_LIMIT);
    assert_eq!(titles(q.backlog()), vec!["overflow"]);
}

#[test]
fn top_batch_across_the_limit_stays_contiguous() {
    let (mut q, _) = manager();
    q.add_many_to_queue(many(QUEUE_LIMIT - 2), AddMode::Bottom);
    q.add_many_to_queue(vec![t("a"), t("b"), t("c"), t("d")], AddMode::Top);

    assert_eq!(q.queue().len(), QUEUE_LIMIT);
    assert_eq!(titles(q.queue().iter().take(5)), vec!["a", "b", "c", "d", "t0"]);
    assert_eq!(titles(q.backlog()), vec!["t66", "t67"]);
}

#[test]
fn next_promotes_backlog_once_queue_drains() {
    let (mut q, calls) = manager();
    q.add_many_to_queue(many(QUEUE_LIMIT + 5), AddMode::Bottom);
    assert_eq!(q.backlog().len(), 5);

    for _ in 0..QUEUE_LIMIT {
        q.next();
    }
    assert!(q.queue().is_empty());
    assert_eq!(q.backlog().len(), 5);

    q.next();
    assert_eq!(q.current_track().map(|c| c.title.as_str()), Some("t70"));
    assert!(q.backlog().is_empty());
    assert_eq!(titles(q.queue()), vec!["t71", "t72", "t73", "t74"]);
    assert_eq!(q.history().len(), QUEUE_LIMIT);
    assert_eq!(calls.borrow().last().map(String::as_str), Some("play:t70"));
}

#[test]
fn shuffle_twice_restores_exact_order() {
    let (mut q, _) = manager();
    q.add_many_to_queue(many(30), AddMode::Bottom);
    let before: Vec<QueueTrack> = q.queue().iter().cloned().collect();

    q.toggle_shuffle();
    assert_eq!(q.play_mode(), PlayMode::Shuffle);
    assert_eq!(q.queue().len(), before.len());

    q.toggle_shuffle();
    assert_eq!(q.play_mode(), PlayMode::Normal);
    let after: Vec<QueueTrack> = q.queue().iter().cloned().collect();
    assert_eq!(after, before);
}

#[test]
fn unshuffle_truncates_to_entries_after_current() {
    let (mut q, _) = manager();
    q.add_many_to_queue(many(5), AddMode::Bottom);
    q.toggle_shuffle();
    q.next();
    let current = q.current_track().cloned().unwrap();

    q.toggle_shuffle();
    let idx: usize = current.title[1..].parse().unwrap();
    let expected: Vec<String> = (idx + 1..5).map(|i| format!("t{i}")).collect();
    assert_eq!(titles(q.queue()), expected);
    assert_eq!(q.current_track(), Some(&current));
}

#[test]
fn unshuffle_after_restore_keeps_the_restored_queue() {
    let (mut q, _) = manager();
    q.add_many_to_queue(many(10), AddMode::Bottom);
    q.toggle_shuffle();
    let snap = q.snapshot();

    let (mut restored, _) = manager();
    restored.restore(snap.clone());
    assert_eq!(restored.play_mode(), PlayMode::Shuffle);

    restored.toggle_shuffle();
    assert_eq!(restored.play_mode(), PlayMode::Normal);
    assert_eq!(titles(restored.queue()), titles(&snap.queue));
}

#[test]
fn entries_queued_while_shuffled_survive_unshuffle() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("a"), t("b")], AddMode::Bottom);
    q.toggle_shuffle();
    q.add_to_queue(t("late"), AddMode::Bottom);

    q.toggle_shuffle();
    assert_eq!(titles(q.queue()), vec!["a", "b", "late"]);
}

#[test]
fn removal_while_shuffled_is_not_undone_by_unshuffle() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("a"), t("b"), t("c")], AddMode::Bottom);
    q.toggle_shuffle();
    let b = q.queue().iter().find(|e| e.title == "b").cloned().unwrap();
    q.remove(&b);

    q.toggle_shuffle();
    assert_eq!(titles(q.queue()), vec!["a", "c"]);
}

#[test]
fn playing_a_bare_track_starts_over() {
    let (mut q, calls) = manager();
    q.add_many_to_queue(many(3), AddMode::Bottom);
    q.next();
    q.next();
    assert_eq!(q.history().len(), 1);

    q.play(t("solo"));
    assert!(q.queue().is_empty());
    assert!(q.history().is_empty());
    assert!(!q.is_paused());
    assert_eq!(q.current_time(), 0.0);
    assert_eq!(
        *calls.borrow(),
        vec!["activate", "play:t0", "play:t1", "play:solo"]
    );
}

#[test]
fn play_mints_identity_only_for_bare_tracks() {
    let (mut q, _) = manager();
    q.play(t("a"));
    let first = q.current_track().cloned().unwrap();
    q.play(t("a"));
    let second = q.current_track().cloned().unwrap();
    assert_ne!(first.id, second.id);

    q.play(first.clone());
    assert_eq!(q.current_track().map(|c| c.id), Some(first.id));
}

#[test]
fn after_play_hooks_fire_in_registration_order() {
    let (mut q, _) = manager();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s1 = seen.clone();
    q.on_after_play(move |e| s1.borrow_mut().push(format!("1:{}", e.title)));
    let s2 = seen.clone();
    let second = q.on_after_play(move |e| s2.borrow_mut().push(format!("2:{}", e.title)));

    q.play(t("a"));
    assert!(q.remove_observer(second));
    q.play(t("b"));
    assert_eq!(*seen.borrow(), vec!["1:a", "2:a", "1:b"]);
}

#[test]
fn removing_a_seek_hook_leaves_after_play_hooks_alone() {
    let (mut q, _) = manager();
    let played = Rc::new(RefCell::new(0));
    let seeks = Rc::new(RefCell::new(0));

    let p = played.clone();
    q.on_after_play(move |_| *p.borrow_mut() += 1);
    let s = seeks.clone();
    let seek_id = q.on_seek(move |_| *s.borrow_mut() += 1);

    assert!(q.remove_observer(seek_id));
    assert!(!q.remove_observer(seek_id));
    q.play(t("a"));
    q.seek_to(3.0);

    assert_eq!(*played.borrow(), 1);
    assert_eq!(*seeks.borrow(), 0);
}

#[test]
fn playing_file_follows_the_loaded_entry() {
    let (mut q, _) = manager();
    assert!(!q.is_playing_file(std::path::Path::new("/music/a.flac")));

    q.play(t("a"));
    q.add_to_queue(t("b"), AddMode::Bottom);
    assert!(q.is_playing_file(std::path::Path::new("/music/a.flac")));
    q.next();
    assert!(q.is_playing_file(std::path::Path::new("/music/b.flac")));
    assert!(!q.is_playing_file(std::path::Path::new("/music/a.flac")));
}

#[test]
fn continue_mode_deactivates_when_exhausted() {
    let (mut q, calls) = manager();
    q.add_to_queue(t("a"), AddMode::Bottom);
    q.next();
    q.next();
    assert!(q.current_track().is_none());
    assert!(q.history().is_empty());
    assert!(q.is_paused());
    assert_eq!(
        *calls.borrow(),
        vec!["activate", "play:a", "deactivate", "stop"]
    );
}

#[test]
fn repeat_replays_current_without_touching_queue() {
    let (mut q, calls) = manager();
    q.add_many_to_queue(vec![t("a"), t("b")], AddMode::Bottom);
    q.next();
    q.set_queue_mode(QueueMode::Repeat);
    let id = q.current_track().map(|c| c.id);

    q.next();
    assert_eq!(q.current_track().map(|c| c.id), id);
    assert_eq!(titles(q.queue()), vec!["b"]);
    assert!(q.history().is_empty());
    assert_eq!(calls.borrow().last().map(String::as_str), Some("play:a"));
}

#[test]
fn repeat_all_wraps_history_back_in() {
    let (mut q, calls) = manager();
    q.set_queue_mode(QueueMode::RepeatAll);
    q.add_many_to_queue(vec![t("a"), t("b")], AddMode::Bottom);
    q.next();
    q.next();
    assert_eq!(titles(q.history()), vec!["a"]);

    q.next();
    assert_eq!(q.current_track().map(|c| c.title.as_str()), Some("a"));
    assert_eq!(titles(q.queue()), vec!["b"]);
    assert!(q.history().is_empty());
    assert!(!calls.borrow().iter().any(|c| c == "deactivate"));
    assert_eq!(calls.borrow().iter().filter(|c| *c == "activate").count(), 1);
}

#[test]
fn repeat_all_with_empty_history_deactivates() {
    let (mut q, calls) = manager();
    q.set_queue_mode(QueueMode::RepeatAll);
    q.add_to_queue(t("a"), AddMode::Bottom);
    q.next();
    q.next();
    assert!(q.current_track().is_none());
    assert!(calls.borrow().iter().any(|c| c == "deactivate"));
}

#[test]
fn prev_puts_current_back_at_head() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("a"), t("b"), t("c")], AddMode::Bottom);
    q.next();
    q.next();

    q.prev();
    assert_eq!(q.current_track().map(|c| c.title.as_str()), Some("a"));
    assert_eq!(titles(q.queue()), vec!["b", "c"]);
    assert!(q.history().is_empty());

    // nothing left to go back to
    q.prev();
    assert_eq!(q.current_track().map(|c| c.title.as_str()), Some("a"));
}

#[test]
fn prev_on_full_queue_spills_tail_to_backlog() {
    let (mut q, _) = manager();
    q.add_many_to_queue(many(QUEUE_LIMIT + 2), AddMode::Bottom);
    q.next();
    q.next();
    q.add_many_to_queue(vec![t("f1"), t("f2")], AddMode::Bottom);
    assert_eq!(q.queue().len(), QUEUE_LIMIT);

    q.prev();
    assert_eq!(q.queue().front().map(|e| e.title.as_str()), Some("t1"));
    assert_eq!(q.queue().len(), QUEUE_LIMIT);
    assert_eq!(q.backlog().front().map(|e| e.title.as_str()), Some("f2"));
}

#[test]
fn prev_does_not_reactivate_the_player() {
    let (mut q, calls) = manager();
    q.add_many_to_queue(vec![t("a"), t("b")], AddMode::Bottom);
    q.next();
    q.next();
    q.prev();

    let activations = calls.borrow().iter().filter(|c| *c == "activate").count();
    assert_eq!(activations, 1);
}

#[test]
fn stop_unloads_but_keeps_the_queue() {
    let (mut q, calls) = manager();
    q.add_many_to_queue(vec![t("a"), t("b")], AddMode::Bottom);
    q.next();
    calls.borrow_mut().clear();

    q.stop();
    assert!(q.current_track().is_none());
    assert!(q.is_paused());
    assert_eq!(titles(q.queue()), vec!["b"]);
    assert_eq!(*calls.borrow(), vec!["deactivate", "stop"]);
}

#[test]
fn remove_filters_queue_and_backlog_by_identity() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("a"), t("a"), t("b")], AddMode::Bottom);
    let target = q.queue()[1].clone();

    q.remove(&target);
    assert_eq!(titles(q.queue()), vec!["a", "b"]);
    assert_ne!(q.queue()[0].id, target.id);
}

#[test]
fn shift_to_unknown_id_is_a_no_op() {
    let (mut q, calls) = manager();
    q.add_many_to_queue(vec![t("a"), t("b")], AddMode::Bottom);
    let before: Vec<QueueTrack> = q.queue().iter().cloned().collect();

    q.shift_to(uuid::Uuid::new_v4(), true);
    let after: Vec<QueueTrack> = q.queue().iter().cloned().collect();
    assert_eq!(after, before);
    assert!(calls.borrow().is_empty());
}

#[test]
fn shift_to_drops_preceding_entries_and_plays() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("a"), t("b"), t("c"), t("d")], AddMode::Bottom);
    let id = q.queue()[2].id;

    q.shift_to(id, true);
    assert_eq!(q.current_track().map(|c| c.id), Some(id));
    assert_eq!(titles(q.queue()), vec!["d"]);
}

#[test]
fn shuffle_play_loads_one_of_the_tracks() {
    let (mut q, _) = manager();
    q.shuffle_play(many(10));
    assert_eq!(q.play_mode(), PlayMode::Shuffle);
    assert_eq!(q.queue().len(), 9);
    assert!(q.current_track().is_some());
    assert!(q.history().is_empty());
}

#[test]
fn seek_without_track_is_ignored() {
    let (mut q, _) = manager();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    q.on_seek(move |t| s.borrow_mut().push(*t));

    q.seek_to(10.0);
    assert!(seen.borrow().is_empty());

    q.play(t("a"));
    q.seek_to(42.5);
    assert_eq!(q.current_time(), 42.5);
    assert_eq!(*seen.borrow(), vec![42.5]);
}

#[test]
fn volume_is_forwarded_unclamped() {
    let (mut q, calls) = manager();
    let seen = Rc::new(RefCell::new(None));
    let s = seen.clone();
    q.on_volume_change(move |v| *s.borrow_mut() = Some(*v));

    q.set_volume(1.5);
    assert_eq!(q.volume(), 1.5);
    assert_eq!(*seen.borrow(), Some(1.5));
    assert_eq!(*calls.borrow(), vec!["volume:1.5"]);
}

#[test]
fn toggle_play_pause_only_delegates() {
    let (mut q, calls) = manager();
    q.play(t("a"));
    q.toggle_play_pause();
    assert!(!q.is_paused());
    q.set_paused(true);
    assert!(q.is_paused());
    assert_eq!(calls.borrow().last().map(String::as_str), Some("toggle"));
}

#[test]
fn queue_mode_cycles_through_all_modes() {
    let (mut q, _) = manager();
    q.cycle_queue_mode();
    assert_eq!(q.queue_mode(), QueueMode::Repeat);
    q.cycle_queue_mode();
    assert_eq!(q.queue_mode(), QueueMode::RepeatAll);
    q.cycle_queue_mode();
    assert_eq!(q.queue_mode(), QueueMode::Continue);
}

#[test]
fn snapshot_round_trips_through_restore() {
    let (mut q, _) = manager();
    q.add_many_to_queue(vec![t("a"), t("b"), t("c")], AddMode::Bottom);
    q.next();
    q.set_current_time(12.0);
    q.set_volume(0.4);
    q.set_queue_mode(QueueMode::RepeatAll);
    let snap = q.snapshot();

    let (mut restored, calls) = manager();
    restored.restore(snap.clone());
    assert_eq!(restored.snapshot(), snap);
    assert!(restored.is_paused());
    assert!(calls.borrow().is_empty());
}

#[test]
fn revision_moves_on_mutation_only() {
    let (mut q, _) = manager();
    let r0 = q.revision();
    let _ = q.queue();
    assert_eq!(q.revision(), r0);
    q.add_to_queue(t("a"), AddMode::Bottom);
    assert!(q.revision() > r0);
}

#[test]
fn queue_track_serializes_flat_with_id() {
    let entry = QueueTrack::admit(t("a"));
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["id"], entry.id.to_string());
    assert_eq!(json["title"], "a");
    let back: QueueTrack = serde_json::from_value(json).unwrap();
    assert_eq!(back, entry);
}

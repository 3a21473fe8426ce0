use super::*;
use crate::library::Track;
use std::sync::mpsc;

fn make_track() -> QueueTrack {
    QueueTrack::admit(Track {
        file_path: "/tmp/music/test.mp3".to_string(),
        title: "Test Title".to_string(),
        artists: vec!["Test Artist".to_string(), "Guest".to_string()],
        album: "Test Album".to_string(),
        duration: 215,
        ..Track::default()
    })
}

fn handle() -> (MprisHandle, Arc<Mutex<SharedState>>, Receiver<()>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();
    let handle = MprisHandle {
        state: state.clone(),
        notify: notify_tx,
    };
    (handle, state, notify_rx)
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let (handle, state, notify_rx) = handle();
    let track = make_track();
    handle.set_track_metadata(Some(&track));

    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist, Guest".to_string()]);
        assert_eq!(s.album.as_deref(), Some("Test Album"));
        assert_eq!(s.url.as_deref(), Some("file:///tmp/music/test.mp3"));
        assert_eq!(s.length_micros, Some(215_000_000));
        let expected = format!("/org/mpris/MediaPlayer2/track/{}", track.id.simple());
        assert_eq!(s.track_id.as_ref().map(|p| p.as_str()), Some(expected.as_str()));
    }

    handle.set_track_metadata(None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.album, None);
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
    }
    assert_eq!(notify_rx.try_iter().count(), 2);
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let (handle, state, _rx) = handle();
    let (tx, _cmd_rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    handle.set_playback(PlaybackState::Stopped);
    assert_eq!(iface.playback_status(), "Stopped");
    handle.set_playback(PlaybackState::Playing);
    assert_eq!(iface.playback_status(), "Playing");
    handle.set_playback(PlaybackState::Paused);
    assert_eq!(iface.playback_status(), "Paused");
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let (handle, state, _rx) = handle();
    let (tx, _cmd_rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    assert!(iface.metadata().is_empty());

    handle.set_track_metadata(Some(&make_track()));
    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn player_methods_forward_control_commands() {
    let (_handle, state, _rx) = handle();
    let (tx, cmd_rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    iface.play_pause();
    iface.next();
    iface.previous();
    iface.stop();

    let cmds: Vec<ControlCmd> = cmd_rx.try_iter().collect();
    assert!(matches!(
        cmds.as_slice(),
        [ControlCmd::PlayPause, ControlCmd::Next, ControlCmd::Prev, ControlCmd::Stop]
    ));
}

use super::*;
use crate::config::TrackDisplayField;

fn track(title: &str, artists: &[&str], path: &str) -> Track {
    Track {
        title: title.into(),
        artists: artists.iter().map(|a| a.to_string()).collect(),
        file_path: path.into(),
        ..Track::default()
    }
}

#[test]
fn display_from_fields_can_format_artist_title() {
    let t = track("Song", &["Artist"], "/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Artist, TrackDisplayField::Title], " - "),
        "Artist - Song"
    );

    let t = track("Song", &["  Artist  ", "Guest"], "/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Artist, TrackDisplayField::Title], " - "),
        "Artist, Guest - Song"
    );

    let t = track("Song", &[], "/tmp/Song.mp3");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Artist, TrackDisplayField::Title], " - "),
        "Song"
    );
}

#[test]
fn display_from_fields_falls_back_to_file_stem() {
    let t = track("  ", &[], "/music/untitled-take.flac");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Title], " - "),
        "untitled-take"
    );
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Filename], " - "),
        "untitled-take"
    );
}

#[test]
fn format_time_switches_to_hours() {
    assert_eq!(format_time(0.0), "00:00");
    assert_eq!(format_time(75.4), "01:15");
    assert_eq!(format_time(3600.0 + 125.0), "01:02");
    assert_eq!(format_time(f64::NAN), "--:--");
}

#[test]
fn raw_timestamp_converts_to_millis() {
    let ts = RawTimestamp {
        minutes: 1,
        seconds: 2,
        millis: Some(30),
    };
    assert_eq!(ts.as_millis(), 62_030);
    assert!((ts.as_secs_f64() - 62.03).abs() < 1e-9);
}

#[test]
fn track_deserializes_from_daemon_json_with_missing_fields() {
    let json = r#"{
        "title": "Duet",
        "artists": ["A", "B"],
        "file_path": "/music/duet.flac",
        "duration": 215,
        "lyrics": [
            {"marker": {"Named": ["singer", "A"]}, "text": "hello",
             "time": {"minutes": 0, "seconds": 5, "millis": null}},
            {"marker": "Empty", "text": "", "time": {"minutes": 0, "seconds": 9, "millis": 500},
             "is_instrumental": true}
        ]
    }"#;

    let t: Track = serde_json::from_str(json).unwrap();
    assert_eq!(t.artists, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(t.duration, 215);
    assert_eq!(t.lyrics.len(), 2);
    assert_eq!(
        t.lyrics[0].marker,
        Marker::Named("singer".into(), "A".into())
    );
    assert_eq!(t.lyrics[1].marker, Marker::Empty);
    assert!(t.lyrics[1].is_instrumental);
    assert_eq!(t.lyrics[1].time.as_millis(), 9_500);
}

use crate::library::{Lrc, Track};

/// Where lyric search results go for the user to pick from.
pub trait LyricEditor {
    fn show_candidates(&mut self, track: &Track, candidates: Vec<Lrc>);
}

/// Hand search results to `editor`. Nothing is applied automatically;
/// returns false when there was nothing to offer.
pub fn offer_candidates(editor: &mut dyn LyricEditor, track: &Track, candidates: Vec<Lrc>) -> bool {
    if candidates.is_empty() {
        return false;
    }
    editor.show_candidates(track, candidates);
    true
}

//! Audio file policy: which inputs are accepted and how outputs are named.

use std::path::Path;

/// Extensions (lowercase, without the dot) accepted for conversion.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac", "aac"];

/// Extension given to encoded files.
pub const SILK_EXTENSION: &str = "silk";

/// Lowercased extension of `name`, if any.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Check an extension (without the dot) against the allow-list, ignoring case.
pub fn is_supported_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str())
}

/// Check whether a path has one of the supported audio extensions.
pub fn is_supported_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_supported_extension)
}

/// Download name for an upload: the original base name with `.silk`
/// substituted for its extension.
pub fn silk_file_name(original: &str) -> String {
    // Browsers on Windows may send a full client path.
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("audio");
    format!("{stem}.{SILK_EXTENSION}")
}

/// Comma-separated list of accepted extensions for error messages.
pub fn supported_list() -> String {
    SUPPORTED_EXTENSIONS
        .iter()
        .map(|e| format!(".{e}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_case_insensitive() {
        for ext in ["mp3", "MP3", "Wav", "ogg", "m4a", "FLAC", "aac"] {
            assert!(is_supported_extension(ext), "{ext} should be accepted");
        }
        assert!(!is_supported_extension("mp4"));
        assert!(!is_supported_extension("silk"));
        assert!(!is_supported_extension(""));
    }

    #[test]
    fn supported_audio_paths() {
        assert!(is_supported_audio(Path::new("/in/voice.M4A")));
        assert!(!is_supported_audio(Path::new("/in/notes.txt")));
        assert!(!is_supported_audio(Path::new("/in/noext")));
        assert!(!is_supported_audio(Path::new("/in/.mp3")));
    }

    #[test]
    fn extension_of_lowercases() {
        assert_eq!(extension_of("Song.FLAC").as_deref(), Some("flac"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
    }

    #[test]
    fn silk_name_replaces_extension() {
        assert_eq!(silk_file_name("hello.mp3"), "hello.silk");
        assert_eq!(silk_file_name("my.voice.note.wav"), "my.voice.note.silk");
        assert_eq!(silk_file_name("C:\\Users\\me\\clip.ogg"), "clip.silk");
        assert_eq!(silk_file_name("语音.m4a"), "语音.silk");
        assert_eq!(silk_file_name(""), "audio.silk");
    }

    #[test]
    fn supported_list_has_dots() {
        let list = supported_list();
        assert!(list.starts_with(".mp3"));
        assert!(list.contains(".aac"));
    }
}

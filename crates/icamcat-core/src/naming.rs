/// Image directory and file naming convention
///
/// Directories are named `"{NNN}ICAMF"` and image files `"ICAM_{NNNN}.JPG"`
/// or `"ICAM_{NNNN}.MJPG"`. The validators here are the exact predicates the
/// catalog builder applies to card entries; the formatters produce names the
/// validators accept.
use serde::{Deserialize, Serialize};

/// Required suffix of an image directory name
pub const DIRECTORY_SUFFIX: &str = "ICAMF";

/// Required prefix of an image file name
pub const FILE_PREFIX: &str = "ICAM";

/// Highest ordinal a three-digit directory name can carry
pub const MAX_DIRECTORY_ORDINAL: u32 = 999;

/// Highest ordinal a four-digit file name can carry
pub const MAX_FILE_ORDINAL: u32 = 9999;

const MIN_DIRECTORY_NAME_LEN: usize = 6;
const MIN_FILE_NAME_LEN: usize = 9;

/// Kind of image file written by the camera
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    /// Still image
    Jpeg,
    /// Motion JPEG recording
    Mjpeg,
}

impl ImageKind {
    /// Extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => ".JPG",
            ImageKind::Mjpeg => ".MJPG",
        }
    }

    /// Infer the kind from a file name's extension
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with(ImageKind::Jpeg.extension()) {
            Some(ImageKind::Jpeg)
        } else if name.ends_with(ImageKind::Mjpeg.extension()) {
            Some(ImageKind::Mjpeg)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageKind::Jpeg => write!(f, "JPEG"),
            ImageKind::Mjpeg => write!(f, "MJPEG"),
        }
    }
}

/// True for names like `"123ICAMF"`: a leading digit and the `ICAMF` suffix
pub fn is_valid_directory_name(name: &str) -> bool {
    name.len() >= MIN_DIRECTORY_NAME_LEN
        && name.as_bytes()[0].is_ascii_digit()
        && name.ends_with(DIRECTORY_SUFFIX)
}

/// True for names like `"ICAM_0001.JPG"` or `"ICAM_0001.MJPG"`
pub fn is_valid_file_name(name: &str) -> bool {
    name.len() >= MIN_FILE_NAME_LEN
        && name.starts_with(FILE_PREFIX)
        && ImageKind::from_name(name).is_some()
}

/// Format a directory name from its ordinal
pub fn directory_name(ordinal: u32) -> String {
    format!("{:03}{}", ordinal, DIRECTORY_SUFFIX)
}

/// Format an image file name from its ordinal and kind
pub fn file_name(ordinal: u32, kind: ImageKind) -> String {
    format!("{}_{:04}{}", FILE_PREFIX, ordinal, kind.extension())
}

/// Leading decimal ordinal of a directory name
pub fn parse_directory_ordinal(name: &str) -> Option<u32> {
    let digits = name.strip_suffix(DIRECTORY_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Ordinal between `ICAM_` and the extension of a file name
pub fn parse_file_ordinal(name: &str) -> Option<u32> {
    let rest = name.strip_prefix(FILE_PREFIX)?.strip_prefix('_')?;
    let digits = display_name(rest);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Name shown in browse lists: everything before the first `.`
pub fn display_name(name: &str) -> &str {
    match name.find('.') {
        Some(dot) => &name[..dot],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_name_validation() {
        assert!(is_valid_directory_name("123ICAMF"));
        assert!(is_valid_directory_name("1ICAMF"));
        assert!(!is_valid_directory_name("ABCICAMF"));
        assert!(!is_valid_directory_name("1ICAMG"));
        assert!(!is_valid_directory_name("ICAMF"));
        assert!(!is_valid_directory_name("123icamf"));
        assert!(!is_valid_directory_name(""));
    }

    #[test]
    fn test_file_name_validation() {
        assert!(is_valid_file_name("ICAM_0001.JPG"));
        assert!(is_valid_file_name("ICAM_0001.MJPG"));
        assert!(!is_valid_file_name("IMG_0001.JPG"));
        assert!(!is_valid_file_name("ICAM_0001.jpg"));
        assert!(!is_valid_file_name("ICAM_0001.PNG"));
        // Shorter than nine characters
        assert!(!is_valid_file_name("ICAM.JPG"));
    }

    #[test]
    fn test_formatting_round_trips_through_validation() {
        let dir = directory_name(100);
        assert_eq!(dir, "100ICAMF");
        assert!(is_valid_directory_name(&dir));
        assert_eq!(directory_name(7), "007ICAMF");

        let still = file_name(1, ImageKind::Jpeg);
        assert_eq!(still, "ICAM_0001.JPG");
        assert!(is_valid_file_name(&still));
        assert_eq!(file_name(42, ImageKind::Mjpeg), "ICAM_0042.MJPG");
    }

    #[test]
    fn test_ordinal_parsing() {
        assert_eq!(parse_directory_ordinal("123ICAMF"), Some(123));
        assert_eq!(parse_directory_ordinal("1X2ICAMF"), None);
        assert_eq!(parse_directory_ordinal("ICAMF"), None);
        assert_eq!(parse_file_ordinal("ICAM_0042.JPG"), Some(42));
        assert_eq!(parse_file_ordinal("ICAM_0042.MJPG"), Some(42));
        assert_eq!(parse_file_ordinal("ICAM0042.JPG"), None);
        assert_eq!(parse_file_ordinal("ICAM_.JPG"), None);
    }

    #[test]
    fn test_display_name_strips_at_first_dot() {
        assert_eq!(display_name("ICAM_0001.JPG"), "ICAM_0001");
        assert_eq!(display_name("ICAM_0001.MJPG"), "ICAM_0001");
        assert_eq!(display_name("a.b.c"), "a");
        assert_eq!(display_name("001ICAMF"), "001ICAMF");
    }

    #[test]
    fn test_image_kind_from_name() {
        assert_eq!(ImageKind::from_name("ICAM_0001.JPG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_name("ICAM_0001.MJPG"), Some(ImageKind::Mjpeg));
        assert_eq!(ImageKind::from_name("ICAM_0001.BMP"), None);
    }
}

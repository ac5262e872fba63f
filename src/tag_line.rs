/// One `Key : Value` line of tool output, for example
///
/// ```text
/// File Type                       : TIFF
/// Exif Byte Order                 : Little-endian (Intel, II)
/// Image Width                     : 2344
/// ```
///
/// The line is split on its first colon only, so values such as timestamps
/// keep their own colons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLine<'a> {
    /// Trimmed text before the first colon. `None` when the line has no colon.
    pub key: Option<&'a str>,
    /// Trimmed text after the first colon, empty if nothing follows it.
    pub value: &'a str,
}

impl<'a> TagLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.split_once(':') {
            Some((key, value)) => TagLine {
                key: Some(key.trim()),
                value: value.trim(),
            },
            None => TagLine {
                key: None,
                value: "",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_exiftool_line() {
        let line = TagLine::parse("Image Width                       : 2344");
        assert_eq!(line.key, Some("Image Width"));
        assert_eq!(line.value, "2344");
    }

    #[test]
    fn test_no_colon() {
        let line = TagLine::parse("NoColonHere");
        assert_eq!(line.key, None);
        assert_eq!(line.value, "");
    }

    #[test]
    fn test_value_keeps_colons() {
        let line = TagLine::parse("CreateDate                      : 2014:10:08 15:32:01");
        assert_eq!(line.key, Some("CreateDate"));
        assert_eq!(line.value, "2014:10:08 15:32:01");
    }

    #[test]
    fn test_nothing_after_colon() {
        let line = TagLine::parse("Keywords   :   ");
        assert_eq!(line.key, Some("Keywords"));
        assert_eq!(line.value, "");
    }

    #[test]
    fn test_empty_key() {
        let line = TagLine::parse(": orphan");
        assert_eq!(line.key, Some(""));
        assert_eq!(line.value, "orphan");
    }
}

//! Per-code-unit line break classification

use xi_unicode::LineBreakIterator;

use typeflow_core::convert::Utf16Text;

/// Whether a line may end after a given code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakClass {
    /// No break opportunity after this unit.
    None,
    /// A soft wrap is allowed after this unit.
    Allowed,
    /// The line must end after this unit.
    Mandatory,
}

/// Classify every code unit of the paragraph.
///
/// `classes[i]` describes the position after unit `i`. The break iterator
/// always reports a mandatory break at end of text; that one is kept only
/// when the final unit really is LF or CR, so ordinary text does not grow a
/// spurious empty trailing line.
pub fn classify_breaks(text: &Utf16Text) -> Vec<BreakClass> {
    let mut classes = vec![BreakClass::None; text.len() as usize];
    if text.is_empty() {
        return classes;
    }

    for (byte, hard) in LineBreakIterator::new(text.utf8()) {
        let unit = text.utf16_index(byte);
        if unit == 0 {
            continue;
        }
        classes[(unit - 1) as usize] = if hard {
            BreakClass::Mandatory
        } else {
            BreakClass::Allowed
        };
    }

    let last = (text.len() - 1) as usize;
    let last_unit = text.unit(last as u32);
    if classes[last] == BreakClass::Mandatory && last_unit != 0x000A && last_unit != 0x000D {
        classes[last] = BreakClass::None;
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(s: &str) -> Vec<BreakClass> {
        classify_breaks(&Utf16Text::from_str(s))
    }

    #[test]
    fn empty_text_has_no_classes() {
        assert!(classes("").is_empty());
    }

    #[test]
    fn space_allows_a_break_after_it() {
        let c = classes("hello world");
        assert_eq!(c[5], BreakClass::Allowed);
        assert_eq!(c[4], BreakClass::None);
        assert_eq!(c[6], BreakClass::None);
    }

    #[test]
    fn newline_forces_a_break() {
        let c = classes("line1\nline2");
        assert_eq!(c[5], BreakClass::Mandatory);
        // End of text after '2' must not break.
        assert_eq!(c[10], BreakClass::None);
    }

    #[test]
    fn trailing_newline_keeps_its_break() {
        let c = classes("abc\n");
        assert_eq!(c[3], BreakClass::Mandatory);
    }

    #[test]
    fn hyphen_allows_a_break() {
        let c = classes("foo-bar");
        assert_eq!(c[3], BreakClass::Allowed);
    }

    #[test]
    fn plain_word_never_breaks() {
        let c = classes("hello");
        assert!(c.iter().all(|&b| b == BreakClass::None));
    }
}

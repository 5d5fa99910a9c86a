//! Paragraph itemization: direction, script, and font runs, merged into
//! shapeable text runs in visual order

use harfbuzz_rs::Tag;
use unicode_bidi::{BidiInfo, Level};
use unicode_script::{Script, UnicodeScript};

use typeflow_core::convert::Utf16Text;
use typeflow_core::types::{DirectionHint, FontSearch, Hint};
use typeflow_fonts::FontRegistry;

/// A maximal range sharing one direction, in visual order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionRun {
    pub start: u32,
    pub end: u32,
    pub rtl: bool,
}

/// A maximal range sharing one script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRun {
    pub start: u32,
    pub end: u32,
    /// ISO 15924 tag the shaping engine understands.
    pub script: Tag,
}

/// A maximal range resolved to one font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontRun {
    pub start: u32,
    pub end: u32,
    pub font: usize,
}

/// A shapeable run: one direction, one script, one font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    pub start: u32,
    pub end: u32,
    pub font: usize,
    pub script: Tag,
    pub rtl: bool,
}

/// The merged result handed to the shaping pass
#[derive(Debug, Clone)]
pub struct Itemization {
    /// Text runs in visual order.
    pub runs: Vec<TextRun>,
    /// Direction of the paragraph's first visual run.
    pub para_rtl: bool,
}

/// Partition the paragraph and merge the partitions.
pub fn itemize(registry: &FontRegistry, text: &Utf16Text, hint: &Hint) -> Itemization {
    let dir_runs = itemize_direction(text, hint.direction);
    let script_runs = itemize_scripts(text);
    let font_runs = itemize_fonts(registry, text, hint);
    let para_rtl = dir_runs.first().is_some_and(|r| r.rtl);
    let runs = merge_runs(&dir_runs, &script_runs, &font_runs);
    Itemization { runs, para_rtl }
}

/// Direction runs from the bidirectional algorithm, in visual order.
///
/// An explicit hint direction forces the paragraph embedding level; with
/// `Multiple` the first strong character decides (LTR when there is none).
pub fn itemize_direction(text: &Utf16Text, direction: DirectionHint) -> Vec<DirectionRun> {
    let level = match direction {
        DirectionHint::LeftToRight => Some(Level::ltr()),
        DirectionHint::RightToLeft => Some(Level::rtl()),
        DirectionHint::Multiple => None,
    };

    let bidi = BidiInfo::new(text.utf8(), level);
    let mut runs = Vec::new();
    for para in &bidi.paragraphs {
        let (levels, level_runs) = bidi.visual_runs(para, para.range.clone());
        for level_run in level_runs {
            let rtl = levels[level_run.start].is_rtl();
            runs.push(DirectionRun {
                start: text.utf16_index(level_run.start),
                end: text.utf16_index(level_run.end),
                rtl,
            });
        }
    }
    runs
}

/// Script runs over the paragraph.
///
/// Common, Inherited, and Unknown code points extend the surrounding run; a
/// run that starts with them adopts the first real script that follows.
pub fn itemize_scripts(text: &Utf16Text) -> Vec<ScriptRun> {
    let neutral = |s: Script| {
        matches!(s, Script::Common | Script::Inherited | Script::Unknown)
    };

    let mut runs = Vec::new();
    let mut current: Option<(Script, u32)> = None;

    for (utf16_pos, c) in text.chars() {
        let script = c.script();
        match current {
            None => current = Some((script, utf16_pos)),
            Some((active, start)) => {
                if script != active && !neutral(script) {
                    if neutral(active) {
                        current = Some((script, start));
                    } else {
                        runs.push(ScriptRun {
                            start,
                            end: utf16_pos,
                            script: script_tag(active),
                        });
                        current = Some((script, utf16_pos));
                    }
                }
            }
        }
    }

    if let Some((active, start)) = current {
        runs.push(ScriptRun {
            start,
            end: text.len(),
            script: script_tag(active),
        });
    }
    runs
}

fn script_tag(script: Script) -> Tag {
    let name = script.short_name().as_bytes();
    if name.len() == 4 {
        Tag::new(
            name[0] as char,
            name[1] as char,
            name[2] as char,
            name[3] as char,
        )
    } else {
        // Zyyy = Common; the shaping engine will guess from content.
        Tag::new('Z', 'y', 'y', 'y')
    }
}

/// Font runs from per-code-point coverage search.
///
/// Every code unit of a code point gets the same font, so font-run
/// boundaries always land on code-unit boundaries. The move-to-front
/// rearrangement of the fallback list is local to this call.
pub fn itemize_fonts(registry: &FontRegistry, text: &Utf16Text, hint: &Hint) -> Vec<FontRun> {
    let mut fallback = hint.fallback_fonts.clone();
    let mut runs: Vec<FontRun> = Vec::new();

    for (utf16_pos, c) in text.chars() {
        let font = match hint.font_search {
            FontSearch::Explicit => match hint.prio_fonts.first() {
                Some(&idx) if registry.coverage(idx, c) != 0 => idx,
                _ => 0,
            },
            FontSearch::Fallback => {
                select_fallback(registry, hint, &mut fallback, c)
            }
        };

        let end = utf16_pos + c.len_utf16() as u32;
        match runs.last_mut() {
            Some(run) if run.font == font => run.end = end,
            _ => runs.push(FontRun {
                start: utf16_pos,
                end,
                font,
            }),
        }
    }
    runs
}

fn select_fallback(
    registry: &FontRegistry,
    hint: &Hint,
    fallback: &mut Vec<usize>,
    c: char,
) -> usize {
    for &idx in &hint.prio_fonts {
        if registry.coverage(idx, c) != 0 {
            return idx;
        }
    }

    for pos in 0..fallback.len() {
        let idx = fallback[pos];
        if registry.coverage(idx, c) != 0 {
            // Move the resolving font to the front of the list.
            if pos != 0 {
                fallback.remove(pos);
                fallback.insert(0, idx);
            }
            return idx;
        }
    }

    // Nothing covers the code point; shaping will substitute the missing
    // glyph through whichever font comes first.
    hint.prio_fonts
        .first()
        .or_else(|| hint.fallback_fonts.first())
        .copied()
        .unwrap_or(0)
}

/// Merge the three partitions into text runs.
///
/// Direction runs are already in visual order, so they drive the loop; font
/// and script boundaries subdivide them. LTR sub-runs append, RTL sub-runs
/// insert at a point pinned to the start of their direction run, which
/// reverses adjacent RTL sub-runs into visual order.
pub fn merge_runs(
    dir_runs: &[DirectionRun],
    script_runs: &[ScriptRun],
    font_runs: &[FontRun],
) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();

    for dir in dir_runs {
        let mut cursor = dir.start;
        let rtl_insert_at = runs.len();

        while cursor < dir.end {
            let mut end = dir.end;

            let font_run = font_runs
                .iter()
                .find(|r| r.start <= cursor && r.end > cursor)
                .expect("font runs cover the paragraph");
            end = end.min(font_run.end);

            let script_run = script_runs
                .iter()
                .find(|r| r.start <= cursor && r.end > cursor)
                .expect("script runs cover the paragraph");
            end = end.min(script_run.end);

            let run = TextRun {
                start: cursor,
                end,
                font: font_run.font,
                script: script_run.script,
                rtl: dir.rtl,
            };
            if dir.rtl {
                runs.insert(rtl_insert_at, run);
            } else {
                runs.push(run);
            }

            cursor = end;
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Utf16Text {
        Utf16Text::from_str(s)
    }

    #[test]
    fn pure_ltr_is_one_run() {
        let t = text("hello world");
        let runs = itemize_direction(&t, DirectionHint::Multiple);
        assert_eq!(runs, vec![DirectionRun { start: 0, end: 11, rtl: false }]);
    }

    #[test]
    fn pure_rtl_is_one_run() {
        let t = text("\u{5E9}\u{5DC}\u{5D5}\u{5DD}");
        let runs = itemize_direction(&t, DirectionHint::Multiple);
        assert_eq!(runs, vec![DirectionRun { start: 0, end: 4, rtl: true }]);
    }

    #[test]
    fn mixed_text_splits_in_visual_order() {
        // Latin then Hebrew; the paragraph level is LTR (first strong is
        // 'A'), so the Latin run is visually first.
        let t = text("A\u{5D0}");
        let runs = itemize_direction(&t, DirectionHint::Multiple);
        assert_eq!(
            runs,
            vec![
                DirectionRun { start: 0, end: 1, rtl: false },
                DirectionRun { start: 1, end: 2, rtl: true },
            ]
        );
    }

    #[test]
    fn forced_ltr_still_finds_rtl_segments() {
        let t = text("ab\u{5D0}\u{5D1}cd");
        let runs = itemize_direction(&t, DirectionHint::LeftToRight);
        assert_eq!(runs.len(), 3);
        assert!(!runs[0].rtl);
        assert!(runs[1].rtl);
        assert!(!runs[2].rtl);
    }

    #[test]
    fn latin_with_punctuation_is_one_script_run() {
        let t = text("a.b, c!");
        let runs = itemize_scripts(&t);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].script, Tag::new('L', 'a', 't', 'n'));
        assert_eq!((runs[0].start, runs[0].end), (0, 7));
    }

    #[test]
    fn leading_neutrals_adopt_the_following_script() {
        let t = text("123 \u{5D0}\u{5D1}");
        let runs = itemize_scripts(&t);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].script, Tag::new('H', 'e', 'b', 'r'));
    }

    #[test]
    fn script_change_splits_runs() {
        let t = text("ab\u{5D0}\u{5D1}");
        let runs = itemize_scripts(&t);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].script, Tag::new('L', 'a', 't', 'n'));
        assert_eq!((runs[0].start, runs[0].end), (0, 2));
        assert_eq!(runs[1].script, Tag::new('H', 'e', 'b', 'r'));
        assert_eq!((runs[1].start, runs[1].end), (2, 4));
    }

    #[test]
    fn merge_reverses_adjacent_rtl_subruns() {
        // The worked example from the run-merging design: logical
        // ARA1 HEB2 Eng ARA3 HEB4 over three direction runs in visual order.
        let arab = Tag::new('A', 'r', 'a', 'b');
        let hebr = Tag::new('H', 'e', 'b', 'r');
        let latn = Tag::new('L', 'a', 't', 'n');

        let dir_runs = vec![
            DirectionRun { start: 8, end: 14, rtl: true },
            DirectionRun { start: 6, end: 8, rtl: false },
            DirectionRun { start: 0, end: 6, rtl: true },
        ];
        let script_runs = vec![
            ScriptRun { start: 0, end: 3, script: arab },
            ScriptRun { start: 3, end: 6, script: hebr },
            ScriptRun { start: 6, end: 8, script: latn },
            ScriptRun { start: 8, end: 11, script: arab },
            ScriptRun { start: 11, end: 14, script: hebr },
        ];
        let font_runs = vec![
            FontRun { start: 0, end: 3, font: 1 },
            FontRun { start: 3, end: 6, font: 2 },
            FontRun { start: 6, end: 8, font: 3 },
            FontRun { start: 8, end: 11, font: 1 },
            FontRun { start: 11, end: 14, font: 2 },
        ];

        let runs = merge_runs(&dir_runs, &script_runs, &font_runs);
        let ranges: Vec<(u32, u32)> = runs.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(
            ranges,
            vec![(11, 14), (8, 11), (6, 8), (3, 6), (0, 3)]
        );
        assert!(runs[0].rtl && runs[1].rtl && !runs[2].rtl && runs[3].rtl && runs[4].rtl);
        assert_eq!(runs[2].font, 3);
        assert_eq!(runs[4].script, arab);
    }

    #[test]
    fn merge_splits_on_font_boundary_inside_direction_run() {
        let latn = Tag::new('L', 'a', 't', 'n');
        let dir_runs = vec![DirectionRun { start: 0, end: 10, rtl: false }];
        let script_runs = vec![ScriptRun { start: 0, end: 10, script: latn }];
        let font_runs = vec![
            FontRun { start: 0, end: 4, font: 1 },
            FontRun { start: 4, end: 10, font: 2 },
        ];

        let runs = merge_runs(&dir_runs, &script_runs, &font_runs);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].start, runs[0].end, runs[0].font), (0, 4, 1));
        assert_eq!((runs[1].start, runs[1].end, runs[1].font), (4, 10, 2));
    }
}

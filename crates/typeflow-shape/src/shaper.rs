//! Shaping, line breaking, and elision

use harfbuzz_rs::{Direction as HbDirection, Face as HbFace, Font as HbFont, UnicodeBuffer};

use typeflow_core::convert::Utf16Text;
use typeflow_core::error::Result;
use typeflow_core::types::{DirectionHint, FontSearch, GlyphInfo, GlyphOffset, Hint, ScriptHint};
use typeflow_fonts::FontRegistry;

use crate::itemize::{itemize, TextRun};
use crate::linebreak::{classify_breaks, BreakClass};

/// One shaped line: a range of the paragraph plus its glyphs in visual order
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    /// UTF-16 code-unit range of the source string.
    pub start: u32,
    pub end: u32,
    /// Parallel vectors, in visual order.
    pub infos: Vec<GlyphInfo>,
    pub offsets: Vec<GlyphOffset>,
    /// Direction of the paragraph's first visual run.
    pub rtl: bool,
}

/// Shape a whole paragraph into lines.
///
/// The paragraph is itemized and shaped as one logical line first; the break
/// pass then splits it at mandatory breaks and at the width limit, or the
/// elide pass truncates it, depending on the hint.
pub fn shape_text(registry: &FontRegistry, text: &Utf16Text, hint: &Hint) -> Result<Vec<TextLine>> {
    let item = itemize(registry, text, hint);
    log::debug!(
        "itemized {} code units into {} runs",
        text.len(),
        item.runs.len()
    );

    let mut first = TextLine {
        start: 0,
        end: text.len(),
        rtl: item.para_rtl,
        ..TextLine::default()
    };
    shape_line(registry, hint, text, &item.runs, &mut first);

    let mut lines = vec![first];
    if hint.elide {
        if hint.max_line_width_px != u32::MAX {
            elide_line(registry, text, hint, &mut lines[0])?;
        }
    } else {
        break_lines(registry, hint, text, &item.runs, &mut lines);
    }
    Ok(lines)
}

/// Shape every run overlapping the line's range, appending glyphs in visual
/// order.
fn shape_line(
    registry: &FontRegistry,
    hint: &Hint,
    text: &Utf16Text,
    runs: &[TextRun],
    line: &mut TextLine,
) {
    line.infos.clear();
    line.offsets.clear();

    for run in runs {
        if run.start >= line.end || run.end <= line.start {
            continue;
        }
        let start = line.start.max(run.start);
        let end = line.end.min(run.end);

        if run.font == 0 {
            shape_missing_run(text, hint, run.rtl, start, end, line);
            continue;
        }

        let font = registry.font(run.font);
        let hb_face = HbFace::from_bytes(font.data(), 0);
        let mut hb_font = HbFont::new(hb_face);
        // Scale to 26.6 pixels so positions divide down by 64, matching the
        // rasterizer's char size.
        let scale = (hint.glyph_res_px * 64) as i32;
        hb_font.set_scale(scale, scale);

        let mut buffer = UnicodeBuffer::new()
            .set_direction(if run.rtl {
                HbDirection::Rtl
            } else {
                HbDirection::Ltr
            })
            .set_script(run.script);
        for (utf16_pos, c) in text.chars_range(start, end) {
            // Clusters are absolute UTF-16 offsets into the paragraph.
            buffer = buffer.add(c as u32, utf16_pos);
        }

        let output = harfbuzz_rs::shape(&hb_font, buffer, &[]);
        let positions = output.get_glyph_positions();
        let infos = output.get_glyph_infos();

        line.infos.reserve(infos.len());
        line.offsets.reserve(infos.len());

        for (info, pos) in infos.iter().zip(positions.iter()) {
            let cluster = info.cluster;
            let unit = text.unit(cluster);
            let zero_width = (0x09..=0x0D).contains(&unit);

            if info.codepoint == 0 {
                // The font covered the code point at itemization time but
                // shaping still produced no glyph; fall back to the missing
                // glyph with its fixed advance.
                push_missing_glyph(line, hint, cluster, run.rtl, zero_width);
                continue;
            }

            line.infos.push(GlyphInfo {
                font: run.font,
                index: info.codepoint,
                cluster,
                rtl: run.rtl,
                zero_width,
            });
            // Break characters keep their vertical motion but must be
            // invisible and cursor-skippable horizontally.
            line.offsets.push(GlyphOffset {
                advance_x: if zero_width { 0 } else { pos.x_advance / 64 },
                advance_y: pos.y_advance / 64,
                offset_x: if zero_width { 0 } else { pos.x_offset / 64 },
                offset_y: pos.y_offset / 64,
            });
        }
    }
}

/// A run no font covers: one missing glyph per code point, reversed for RTL.
fn shape_missing_run(
    text: &Utf16Text,
    hint: &Hint,
    rtl: bool,
    start: u32,
    end: u32,
    line: &mut TextLine,
) {
    let mut clusters: Vec<u32> = text.chars_range(start, end).map(|(pos, _)| pos).collect();
    if rtl {
        clusters.reverse();
    }
    for cluster in clusters {
        let unit = text.unit(cluster);
        let zero_width = (0x09..=0x0D).contains(&unit);
        push_missing_glyph(line, hint, cluster, rtl, zero_width);
    }
}

fn push_missing_glyph(line: &mut TextLine, hint: &Hint, cluster: u32, rtl: bool, zero_width: bool) {
    line.infos.push(GlyphInfo {
        font: 0,
        index: 0,
        cluster,
        rtl,
        zero_width,
    });
    line.offsets.push(GlyphOffset {
        advance_x: if zero_width { 0 } else { hint.glyph_res_px as i32 },
        advance_y: 0,
        offset_x: 0,
        offset_y: 0,
    });
}

/// Split the trailing line at mandatory breaks and at the width limit until
/// every line fits or no further split is possible.
fn break_lines(
    registry: &FontRegistry,
    hint: &Hint,
    text: &Utf16Text,
    runs: &[TextRun],
    lines: &mut Vec<TextLine>,
) {
    let classes = classify_breaks(text);
    let max_width = hint.max_line_width_px as i64;

    loop {
        let line = lines.last_mut().expect("at least one line");
        if line.start >= line.end {
            break;
        }

        // Scatter each glyph's advance to its cluster so the scan below can
        // walk code units.
        let span = (line.end - line.start) as usize;
        let mut advances = vec![0i64; span];
        for (info, offset) in line.infos.iter().zip(&line.offsets) {
            advances[(info.cluster - line.start) as usize] += offset.advance_x as i64;
        }

        let mut combined: i64 = 0;
        let mut last_allowed: Option<u32> = None;
        let mut split_after: Option<u32> = None;

        for unit in line.start..line.end {
            combined += advances[(unit - line.start) as usize];

            match classes[unit as usize] {
                BreakClass::Mandatory => {
                    split_after = Some(unit);
                    break;
                }
                BreakClass::Allowed => last_allowed = Some(unit),
                BreakClass::None => {}
            }

            if combined > max_width {
                if let Some(b) = last_allowed {
                    // A break at the line's first unit would only strip one
                    // leading character; the line stays over-wide instead.
                    if b > line.start {
                        split_after = Some(b);
                        break;
                    }
                }
                // No usable break yet: the line stays over-wide until one
                // turns up.
            }
        }

        let Some(split) = split_after else { break };

        let old_end = line.end;
        line.end = split + 1;

        // The prefix keeps its shaped glyphs; only those past the break
        // move.
        let mut kept_infos = Vec::with_capacity(line.infos.len());
        let mut kept_offsets = Vec::with_capacity(line.offsets.len());
        for (info, offset) in line.infos.iter().zip(&line.offsets) {
            if info.cluster < line.end {
                kept_infos.push(*info);
                kept_offsets.push(*offset);
            }
        }
        line.infos = kept_infos;
        line.offsets = kept_offsets;
        let rtl = line.rtl;

        let mut next = TextLine {
            start: split + 1,
            end: old_end,
            rtl,
            ..TextLine::default()
        };
        // Reshape so the shaping engine re-evaluates context at the new
        // boundary.
        if next.start < next.end {
            shape_line(registry, hint, text, runs, &mut next);
        }
        lines.push(next);
    }
}

/// Truncate the line at the width limit and append "..." shaped in the
/// boundary glyph's font.
fn elide_line(
    registry: &FontRegistry,
    text: &Utf16Text,
    hint: &Hint,
    line: &mut TextLine,
) -> Result<()> {
    let max_width = hint.max_line_width_px as i64;

    let mut combined: i64 = 0;
    let mut boundary: Option<usize> = None;
    for (k, offset) in line.offsets.iter().enumerate() {
        combined += offset.advance_x as i64;
        if combined >= max_width {
            boundary = Some(k);
            break;
        }
    }
    let Some(boundary) = boundary else {
        return Ok(());
    };

    let ellipsis = shape_ellipsis(registry, hint, line.infos[boundary].font)?;
    let ellipsis_advance: i64 = ellipsis
        .offsets
        .iter()
        .map(|o| o.advance_x as i64)
        .sum();

    // Drop glyphs right-to-left, the boundary glyph first, until the
    // ellipsis fits behind the retained prefix.
    let mut retained = boundary + 1;
    while retained > 0 && max_width - combined < ellipsis_advance {
        retained -= 1;
        combined -= line.offsets[retained].advance_x as i64;
    }

    if max_width - combined < ellipsis_advance {
        line.infos.clear();
        line.offsets.clear();
        line.end = line.start;
        return Ok(());
    }

    line.infos.truncate(retained);
    line.offsets.truncate(retained);

    let anchor_cluster = match line.infos.last() {
        Some(last) => {
            line.end = last.cluster + 1;
            last.cluster
        }
        None => {
            line.end = line.start;
            line.start
        }
    };

    for (info, offset) in ellipsis.infos.iter().zip(&ellipsis.offsets) {
        // Ellipsis glyphs index the source string through the glyph they
        // replaced.
        line.infos.push(GlyphInfo {
            cluster: anchor_cluster,
            ..*info
        });
        line.offsets.push(*offset);
    }
    Ok(())
}

/// Shape `"..."` with an Explicit hint pinned to one font. Width and elision
/// are disabled so this cannot recurse.
fn shape_ellipsis(registry: &FontRegistry, hint: &Hint, font: usize) -> Result<TextLine> {
    let ellipsis_hint = Hint {
        prio_fonts: vec![font],
        fallback_fonts: Vec::new(),
        font_search: FontSearch::Explicit,
        direction: DirectionHint::LeftToRight,
        script: ScriptHint::Single,
        max_line_width_px: u32::MAX,
        elide: false,
        glyph_res_px: hint.glyph_res_px,
    };
    let text = Utf16Text::from_str("...");
    let mut lines = shape_text(registry, &text, &ellipsis_hint)?;
    Ok(lines.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_font() -> Option<Vec<u8>> {
        const CANDIDATES: &[&str] = &[
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        ];
        CANDIDATES.iter().find_map(|p| std::fs::read(p).ok())
    }

    fn setup() -> Option<(FontRegistry, Hint)> {
        let bytes = system_font()?;
        let mut registry = FontRegistry::new(32).unwrap();
        registry.add_font("sans", bytes).unwrap();
        let hint = Hint {
            prio_fonts: vec![1],
            direction: DirectionHint::Multiple,
            script: ScriptHint::Multiple,
            ..Hint::default()
        };
        Some((registry, hint))
    }

    #[test]
    fn hello_shapes_to_one_line_in_cluster_order() {
        let Some((registry, hint)) = setup() else { return };
        let text = Utf16Text::from_str("hello");
        let lines = shape_text(&registry, &text, &hint).unwrap();

        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!((line.start, line.end), (0, 5));
        assert!(!line.rtl);
        let clusters: Vec<u32> = line.infos.iter().map(|g| g.cluster).collect();
        assert_eq!(clusters, vec![0, 1, 2, 3, 4]);
        assert!(line.infos.iter().all(|g| g.font == 1 && g.index != 0));
        assert!(line.offsets.iter().all(|o| o.advance_x > 0));
    }

    #[test]
    fn newline_splits_and_is_zero_width() {
        let Some((registry, hint)) = setup() else { return };
        let text = Utf16Text::from_str("line1\nline2");
        let lines = shape_text(&registry, &text, &hint).unwrap();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].end <= 6);
        assert_eq!(lines[1].start, 6);
        assert_eq!(lines[1].end, 11);

        let lf = lines[0]
            .infos
            .iter()
            .zip(&lines[0].offsets)
            .find(|(g, _)| g.cluster == 5)
            .expect("the LF glyph is on line 1");
        assert!(lf.0.zero_width);
        assert_eq!(lf.1.advance_x, 0);
    }

    #[test]
    fn width_limit_breaks_at_a_space() {
        let Some((registry, mut hint)) = setup() else { return };
        let text = Utf16Text::from_str("aaaa bbbb");
        let natural: i64 = shape_text(&registry, &text, &hint).unwrap()[0]
            .offsets
            .iter()
            .map(|o| o.advance_x as i64)
            .sum();

        hint.max_line_width_px = (natural / 2) as u32;
        let lines = shape_text(&registry, &text, &hint).unwrap();
        assert!(lines.len() >= 2);
        // The split happened after the space.
        assert_eq!(lines[0].end, 5);
        assert_eq!(lines[1].start, 5);
    }

    #[test]
    fn uncovered_code_point_becomes_the_missing_glyph() {
        let Some((registry, hint)) = setup() else { return };
        // U+E005 is private use; no ordinary text face covers it.
        let text = Utf16Text::from_str("a\u{E005}b");
        let lines = shape_text(&registry, &text, &hint).unwrap();

        let missing = lines[0]
            .infos
            .iter()
            .zip(&lines[0].offsets)
            .find(|(g, _)| g.cluster == 1)
            .expect("missing glyph present");
        assert_eq!(missing.0.font, 0);
        assert_eq!(missing.0.index, 0);
        assert_eq!(missing.1.advance_x, hint.glyph_res_px as i32);
    }

    #[test]
    fn mixed_direction_marks_rtl_glyphs() {
        let Some((registry, hint)) = setup() else { return };
        let text = Utf16Text::from_str("A\u{5D0}");
        let lines = shape_text(&registry, &text, &hint).unwrap();

        let line = &lines[0];
        assert!(!line.rtl);
        assert_eq!(line.infos.len(), 2);
        // Visual order: the Latin glyph first, then the Hebrew one.
        assert_eq!(line.infos[0].cluster, 0);
        assert!(!line.infos[0].rtl);
        assert_eq!(line.infos[1].cluster, 1);
        assert!(line.infos[1].rtl);
    }

    #[test]
    fn elide_appends_ellipsis_in_the_boundary_font() {
        let Some((registry, mut hint)) = setup() else { return };
        let text = Utf16Text::from_str("mmmmmmmmmm");
        let natural: i64 = shape_text(&registry, &text, &hint).unwrap()[0]
            .offsets
            .iter()
            .map(|o| o.advance_x as i64)
            .sum();

        hint.elide = true;
        hint.max_line_width_px = (natural / 2) as u32;
        let lines = shape_text(&registry, &text, &hint).unwrap();
        assert_eq!(lines.len(), 1);

        let line = &lines[0];
        assert!(line.infos.len() >= 3);
        let dot = registry.coverage(1, '.');
        let tail: Vec<u32> = line.infos[line.infos.len() - 3..]
            .iter()
            .map(|g| g.index)
            .collect();
        assert_eq!(tail, vec![dot, dot, dot]);

        let total: i64 = line.offsets.iter().map(|o| o.advance_x as i64).sum();
        assert!(total <= hint.max_line_width_px as i64);
        assert!(line.end <= 10);
    }

    #[test]
    fn elide_with_room_to_spare_changes_nothing() {
        let Some((registry, mut hint)) = setup() else { return };
        hint.elide = true;
        hint.max_line_width_px = 1_000_000;
        let text = Utf16Text::from_str("short");
        let lines = shape_text(&registry, &text, &hint).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].infos.len(), 5);
        assert_eq!(lines[0].end, 5);
    }
}

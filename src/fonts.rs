use std::collections::HashMap;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};

use crate::xml::sanitize_xml_text;

const ELLIPSIS: &str = "…";

#[derive(Hash, PartialEq, Eq, Clone)]
struct MeasureKey {
    text: String,
    font_size_bits: u32,
    is_bold: bool,
}

pub trait TextMeasure {
    /// Width and height of `text` set on a single line.
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool) -> (f32, f32);
}

/// Shapes text with the system fonts.
pub struct CosmicTextMeasure {
    font_system: FontSystem,
    cache: HashMap<MeasureKey, (f32, f32)>,
}

impl CosmicTextMeasure {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            cache: HashMap::new(),
        }
    }
}

impl Default for CosmicTextMeasure {
    fn default() -> Self {
        Self::new()
    }
}

impl TextMeasure for CosmicTextMeasure {
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool) -> (f32, f32) {
        let key = MeasureKey {
            text: text.to_string(),
            font_size_bits: font_size.to_bits(),
            is_bold,
        };

        if let Some(cached) = self.cache.get(&key) {
            return *cached;
        }

        let line_height = font_size * 1.2;
        let mut buffer = Buffer::new(
            &mut self.font_system,
            Metrics {
                font_size,
                line_height,
            },
        );
        buffer.set_size(&mut self.font_system, None, None);

        let attrs = Attrs::new().family(Family::SansSerif).weight(if is_bold {
            Weight::BOLD
        } else {
            Weight::NORMAL
        });
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);

        let mut width: f32 = 0.0;
        let mut height: f32 = 0.0;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += run.line_height;
        }

        let measured = (width, height.max(line_height));
        self.cache.insert(key, measured);
        measured
    }
}

/// Fixed advance per character. Good enough when no fonts are installed and
/// stable across machines.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMeasure {
    pub advance: f32,
}

impl Default for ApproxMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasure for ApproxMeasure {
    fn measure_text(&mut self, text: &str, font_size: f32, is_bold: bool) -> (f32, f32) {
        let advance = if is_bold {
            self.advance * 1.08
        } else {
            self.advance
        };
        (
            text.chars().count() as f32 * font_size * advance,
            font_size * 1.2,
        )
    }
}

/// Shorten `text` with a trailing ellipsis until it fits in `max_width`.
pub fn fit_label<T: TextMeasure>(
    measure: &mut T,
    text: &str,
    font_size: f32,
    is_bold: bool,
    max_width: f32,
) -> String {
    let cleaned = sanitize_xml_text(text);
    if measure.measure_text(&cleaned, font_size, is_bold).0 <= max_width {
        return cleaned;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    let truncated = |len: usize| {
        let mut s: String = chars[..len].iter().collect();
        s.push_str(ELLIPSIS);
        s
    };

    // longest prefix that still fits with the ellipsis appended
    let (mut lo, mut hi) = (0, chars.len());
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if measure.measure_text(&truncated(mid), font_size, is_bold).0 <= max_width {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    truncated(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_are_untouched() {
        let mut measure = ApproxMeasure::default();
        assert_eq!(fit_label(&mut measure, "db", 10.0, false, 100.0), "db");
    }

    #[test]
    fn long_labels_get_an_ellipsis() {
        let mut measure = ApproxMeasure { advance: 1.0 };
        // 10px per char, 55px available: four chars plus the ellipsis
        let label = fit_label(&mut measure, "authentication-service", 10.0, false, 55.0);
        assert_eq!(label, "auth…");
    }

    #[test]
    fn nothing_fits_leaves_only_the_ellipsis() {
        let mut measure = ApproxMeasure { advance: 1.0 };
        assert_eq!(fit_label(&mut measure, "abc", 10.0, false, 5.0), "…");
    }

    #[test]
    fn bold_is_wider() {
        let mut measure = ApproxMeasure::default();
        let regular = measure.measure_text("queue", 14.0, false).0;
        let bold = measure.measure_text("queue", 14.0, true).0;
        assert!(bold > regular);
    }
}

/// Measures label text in unscaled units.
pub trait TextMeasure {
    /// Returns `(width, height)` of `text` at `font_size`.
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64);
}

/// Width estimate from per-character advance factors, no font data needed.
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasure {
    pub line_height: f64,
}

impl Default for ApproxTextMeasure {
    fn default() -> Self {
        Self { line_height: 1.2 }
    }
}

impl TextMeasure for ApproxTextMeasure {
    fn measure(&self, text: &str, font_size: f64) -> (f64, f64) {
        let lines = split_lines(text);
        let width = lines
            .iter()
            .map(|line| line.chars().map(char_width_factor).sum::<f64>() * font_size)
            .fold(0.0, f64::max);
        let height = lines.len() as f64 * font_size * self.line_height;
        (width, height)
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(str::trim).collect()
}

fn char_width_factor(ch: char) -> f64 {
    // Advance widths relative to the font size for a common sans-serif face.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        'I' | 'i' | 'j' | 'l' => 0.24,
        'f' | 't' | 'r' => 0.34,
        'M' | 'W' | 'm' | 'w' => 0.88,
        '@' | '#' | '%' | '&' => 0.946,
        '0'..='9' => 0.6,
        'A'..='Z' => 0.67,
        'a'..='z' => 0.56,
        _ if ch.is_ascii() => 0.568,
        // CJK and other wide glyphs occupy roughly a full em.
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_font_size() {
        let m = ApproxTextMeasure::default();
        let (w16, _) = m.measure("Hello", 16.0);
        let (w32, _) = m.measure("Hello", 32.0);
        assert!((w32 - 2.0 * w16).abs() < 1e-9);
    }

    #[test]
    fn multi_line_text_takes_widest_line() {
        let m = ApproxTextMeasure::default();
        let (one, h1) = m.measure("longer line", 10.0);
        let (two, h2) = m.measure("short\nlonger line", 10.0);
        assert_eq!(one, two);
        assert!((h2 - 2.0 * h1).abs() < 1e-9);
    }

    #[test]
    fn every_char_has_positive_width() {
        for ch in ['a', 'Z', ' ', '0', '@', '\u{4e2d}'] {
            assert!(char_width_factor(ch) > 0.0, "char {ch:?} has zero width");
        }
    }
}

/// Rough average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.55;

/// How many characters fit on one caption line.
pub fn chars_per_line(frame_width: u32, margin: u32, font_size: u32) -> usize {
    let usable = frame_width.saturating_sub(margin * 2) as f64;
    let per_char = (font_size as f64 * GLYPH_WIDTH_RATIO).max(1.0);
    ((usable / per_char).floor() as usize).max(1)
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_caption(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Escapes a value for use inside an ffmpeg filter option.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | ':' | '\'' | ',' | ';' | '[' | ']') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_budget_from_frame_and_font() {
        assert_eq!(chars_per_line(720, 20, 40), 30);
        assert_eq!(chars_per_line(720, 20, 28), 44);
        assert_eq!(chars_per_line(40, 20, 40), 1);
    }

    #[test]
    fn wrap_keeps_lines_within_width() {
        let text = "Brew barista-grade coffee at home in under a minute, every single morning.";
        let lines = wrap_caption(text, 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn long_word_stands_alone() {
        let lines = wrap_caption("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
        assert!(wrap_caption("  ", 5).is_empty());
    }

    #[test]
    fn escapes_filter_metacharacters() {
        assert_eq!(escape_filter_value("C:\\fonts\\Arial.ttf"), "C\\:\\\\fonts\\\\Arial.ttf");
        assert_eq!(escape_filter_value("/usr/share/fonts/a b.ttf"), "/usr/share/fonts/a b.ttf");
    }
}

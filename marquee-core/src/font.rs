//! Font lookup
//!
//! Maps a byte to a variable-width glyph. Glyphs are stored column-major:
//! each byte is one vertical slice of the character with bit 0 as the top
//! pixel row, which is exactly what the LED matrix consumes per column.

/// Maximum columns a single glyph may occupy
pub const GLYPH_CAPACITY: usize = 8;

/// A glyph copied out of a font table
///
/// Fixed capacity so the renderer can hold the current character without
/// borrowing the font across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Glyph {
    columns: [u8; GLYPH_CAPACITY],
    width: u8,
}

impl Glyph {
    /// A glyph with no columns
    pub const EMPTY: Glyph = Glyph {
        columns: [0; GLYPH_CAPACITY],
        width: 0,
    };

    /// Build a glyph from column data, truncating to [`GLYPH_CAPACITY`]
    pub fn from_columns(data: &[u8]) -> Self {
        let width = data.len().min(GLYPH_CAPACITY);
        let mut columns = [0u8; GLYPH_CAPACITY];
        columns[..width].copy_from_slice(&data[..width]);
        Self {
            columns,
            width: width as u8,
        }
    }

    /// A blank glyph `width` columns wide
    pub fn blank(width: u8) -> Self {
        Self {
            columns: [0; GLYPH_CAPACITY],
            width: width.min(GLYPH_CAPACITY as u8),
        }
    }

    /// Number of columns
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Column at `index`, blank past the end
    pub fn column(&self, index: u8) -> u8 {
        if index < self.width {
            self.columns[index as usize]
        } else {
            0
        }
    }

    /// Column data as a slice
    pub fn columns(&self) -> &[u8] {
        &self.columns[..self.width as usize]
    }
}

/// Character to glyph lookup
///
/// Lookup is infallible: characters a font cannot represent must map to a
/// fallback glyph.
pub trait Font {
    /// Get the glyph for a character byte
    fn glyph(&self, ch: u8) -> Glyph;
}

/// First character covered by [`SystemFont`]
const FIRST_CHAR: u8 = 0x20;

/// Last character covered by [`SystemFont`]
const LAST_CHAR: u8 = 0x7E;

/// Width of the fallback glyph for unmapped bytes
pub const FALLBACK_WIDTH: u8 = 2;

/// Built-in 5x7 variable-width font for printable ASCII
///
/// Narrow characters are trimmed so text reads evenly at one column of
/// inter-character spacing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFont;

impl Font for SystemFont {
    fn glyph(&self, ch: u8) -> Glyph {
        if !(FIRST_CHAR..=LAST_CHAR).contains(&ch) {
            return Glyph::blank(FALLBACK_WIDTH);
        }
        let (width, data) = &SYSTEM_FONT[(ch - FIRST_CHAR) as usize];
        Glyph::from_columns(&data[..*width as usize])
    }
}

/// (width, columns) for 0x20..=0x7E
#[rustfmt::skip]
static SYSTEM_FONT: [(u8, [u8; 5]); 95] = [
    (2, [0x00, 0x00, 0x00, 0x00, 0x00]), // ' '
    (1, [0x5F, 0x00, 0x00, 0x00, 0x00]), // '!'
    (3, [0x07, 0x00, 0x07, 0x00, 0x00]), // '"'
    (5, [0x14, 0x7F, 0x14, 0x7F, 0x14]), // '#'
    (5, [0x24, 0x2A, 0x7F, 0x2A, 0x12]), // '$'
    (5, [0x23, 0x13, 0x08, 0x64, 0x62]), // '%'
    (5, [0x36, 0x49, 0x56, 0x20, 0x50]), // '&'
    (2, [0x04, 0x03, 0x00, 0x00, 0x00]), // '\''
    (3, [0x1C, 0x22, 0x41, 0x00, 0x00]), // '('
    (3, [0x41, 0x22, 0x1C, 0x00, 0x00]), // ')'
    (5, [0x2A, 0x1C, 0x7F, 0x1C, 0x2A]), // '*'
    (5, [0x08, 0x08, 0x3E, 0x08, 0x08]), // '+'
    (2, [0x80, 0x60, 0x00, 0x00, 0x00]), // ','
    (4, [0x08, 0x08, 0x08, 0x08, 0x00]), // '-'
    (2, [0x60, 0x60, 0x00, 0x00, 0x00]), // '.'
    (5, [0x20, 0x10, 0x08, 0x04, 0x02]), // '/'
    (5, [0x3E, 0x51, 0x49, 0x45, 0x3E]), // '0'
    (3, [0x42, 0x7F, 0x40, 0x00, 0x00]), // '1'
    (5, [0x72, 0x49, 0x49, 0x49, 0x46]), // '2'
    (5, [0x21, 0x41, 0x49, 0x4D, 0x33]), // '3'
    (5, [0x18, 0x14, 0x12, 0x7F, 0x10]), // '4'
    (5, [0x27, 0x45, 0x45, 0x45, 0x39]), // '5'
    (5, [0x3C, 0x4A, 0x49, 0x49, 0x31]), // '6'
    (5, [0x41, 0x21, 0x11, 0x09, 0x07]), // '7'
    (5, [0x36, 0x49, 0x49, 0x49, 0x36]), // '8'
    (5, [0x46, 0x49, 0x49, 0x29, 0x1E]), // '9'
    (1, [0x14, 0x00, 0x00, 0x00, 0x00]), // ':'
    (2, [0x40, 0x34, 0x00, 0x00, 0x00]), // ';'
    (4, [0x08, 0x14, 0x22, 0x41, 0x00]), // '<'
    (4, [0x14, 0x14, 0x14, 0x14, 0x00]), // '='
    (4, [0x41, 0x22, 0x14, 0x08, 0x00]), // '>'
    (5, [0x02, 0x01, 0x59, 0x09, 0x06]), // '?'
    (5, [0x3E, 0x41, 0x5D, 0x59, 0x4E]), // '@'
    (5, [0x7C, 0x12, 0x11, 0x12, 0x7C]), // 'A'
    (5, [0x7F, 0x49, 0x49, 0x49, 0x36]), // 'B'
    (5, [0x3E, 0x41, 0x41, 0x41, 0x22]), // 'C'
    (5, [0x7F, 0x41, 0x41, 0x41, 0x3E]), // 'D'
    (5, [0x7F, 0x49, 0x49, 0x49, 0x41]), // 'E'
    (5, [0x7F, 0x09, 0x09, 0x09, 0x01]), // 'F'
    (5, [0x3E, 0x41, 0x41, 0x51, 0x73]), // 'G'
    (5, [0x7F, 0x08, 0x08, 0x08, 0x7F]), // 'H'
    (3, [0x41, 0x7F, 0x41, 0x00, 0x00]), // 'I'
    (5, [0x20, 0x40, 0x41, 0x3F, 0x01]), // 'J'
    (5, [0x7F, 0x08, 0x14, 0x22, 0x41]), // 'K'
    (5, [0x7F, 0x40, 0x40, 0x40, 0x40]), // 'L'
    (5, [0x7F, 0x02, 0x1C, 0x02, 0x7F]), // 'M'
    (5, [0x7F, 0x04, 0x08, 0x10, 0x7F]), // 'N'
    (5, [0x3E, 0x41, 0x41, 0x41, 0x3E]), // 'O'
    (5, [0x7F, 0x09, 0x09, 0x09, 0x06]), // 'P'
    (5, [0x3E, 0x41, 0x51, 0x21, 0x5E]), // 'Q'
    (5, [0x7F, 0x09, 0x19, 0x29, 0x46]), // 'R'
    (5, [0x26, 0x49, 0x49, 0x49, 0x32]), // 'S'
    (5, [0x03, 0x01, 0x7F, 0x01, 0x03]), // 'T'
    (5, [0x3F, 0x40, 0x40, 0x40, 0x3F]), // 'U'
    (5, [0x1F, 0x20, 0x40, 0x20, 0x1F]), // 'V'
    (5, [0x3F, 0x40, 0x38, 0x40, 0x3F]), // 'W'
    (5, [0x63, 0x14, 0x08, 0x14, 0x63]), // 'X'
    (5, [0x03, 0x04, 0x78, 0x04, 0x03]), // 'Y'
    (5, [0x61, 0x59, 0x49, 0x4D, 0x43]), // 'Z'
    (3, [0x7F, 0x41, 0x41, 0x00, 0x00]), // '['
    (5, [0x02, 0x04, 0x08, 0x10, 0x20]), // '\\'
    (3, [0x41, 0x41, 0x7F, 0x00, 0x00]), // ']'
    (5, [0x04, 0x02, 0x01, 0x02, 0x04]), // '^'
    (5, [0x40, 0x40, 0x40, 0x40, 0x40]), // '_'
    (3, [0x03, 0x07, 0x08, 0x00, 0x00]), // '`'
    (5, [0x20, 0x54, 0x54, 0x78, 0x40]), // 'a'
    (5, [0x7F, 0x28, 0x44, 0x44, 0x38]), // 'b'
    (5, [0x38, 0x44, 0x44, 0x44, 0x28]), // 'c'
    (5, [0x38, 0x44, 0x44, 0x28, 0x7F]), // 'd'
    (5, [0x38, 0x54, 0x54, 0x54, 0x18]), // 'e'
    (4, [0x08, 0x7E, 0x09, 0x02, 0x00]), // 'f'
    (5, [0x18, 0xA4, 0xA4, 0x9C, 0x78]), // 'g'
    (5, [0x7F, 0x08, 0x04, 0x04, 0x78]), // 'h'
    (3, [0x44, 0x7D, 0x40, 0x00, 0x00]), // 'i'
    (4, [0x20, 0x40, 0x40, 0x3D, 0x00]), // 'j'
    (4, [0x7F, 0x10, 0x28, 0x44, 0x00]), // 'k'
    (3, [0x41, 0x7F, 0x40, 0x00, 0x00]), // 'l'
    (5, [0x7C, 0x04, 0x78, 0x04, 0x78]), // 'm'
    (5, [0x7C, 0x08, 0x04, 0x04, 0x78]), // 'n'
    (5, [0x38, 0x44, 0x44, 0x44, 0x38]), // 'o'
    (5, [0xFC, 0x18, 0x24, 0x24, 0x18]), // 'p'
    (5, [0x18, 0x24, 0x24, 0x18, 0xFC]), // 'q'
    (5, [0x7C, 0x08, 0x04, 0x04, 0x08]), // 'r'
    (5, [0x48, 0x54, 0x54, 0x54, 0x24]), // 's'
    (5, [0x04, 0x04, 0x3F, 0x44, 0x24]), // 't'
    (5, [0x3C, 0x40, 0x40, 0x20, 0x7C]), // 'u'
    (5, [0x1C, 0x20, 0x40, 0x20, 0x1C]), // 'v'
    (5, [0x3C, 0x40, 0x30, 0x40, 0x3C]), // 'w'
    (5, [0x44, 0x28, 0x10, 0x28, 0x44]), // 'x'
    (5, [0x4C, 0x90, 0x90, 0x90, 0x7C]), // 'y'
    (5, [0x44, 0x64, 0x54, 0x4C, 0x44]), // 'z'
    (3, [0x08, 0x36, 0x41, 0x00, 0x00]), // '{'
    (1, [0x77, 0x00, 0x00, 0x00, 0x00]), // '|'
    (3, [0x41, 0x36, 0x08, 0x00, 0x00]), // '}'
    (5, [0x02, 0x01, 0x02, 0x04, 0x02]), // '~'
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_printable_ascii() {
        assert_eq!(SYSTEM_FONT.len(), (LAST_CHAR - FIRST_CHAR + 1) as usize);
    }

    #[test]
    fn test_variable_widths() {
        let font = SystemFont;
        assert_eq!(font.glyph(b'H').width(), 5);
        assert_eq!(font.glyph(b'I').width(), 3);
        assert_eq!(font.glyph(b'!').width(), 1);
        assert_eq!(font.glyph(b' ').width(), 2);
    }

    #[test]
    fn test_glyph_columns() {
        let h = SystemFont.glyph(b'H');
        assert_eq!(h.columns(), &[0x7F, 0x08, 0x08, 0x08, 0x7F]);
        assert_eq!(h.column(0), 0x7F);
        assert_eq!(h.column(5), 0);
    }

    #[test]
    fn test_unmapped_bytes_fall_back_to_blank() {
        let font = SystemFont;
        for ch in [0x00u8, 0x0A, 0x1F, 0x7F, 0xA9, 0xFF] {
            let glyph = font.glyph(ch);
            assert_eq!(glyph.width(), FALLBACK_WIDTH);
            assert!(glyph.columns().iter().all(|&c| c == 0));
        }
    }

    #[test]
    fn test_no_glyph_exceeds_capacity() {
        for (width, _) in SYSTEM_FONT.iter() {
            assert!(*width as usize <= GLYPH_CAPACITY);
            assert!(*width > 0);
        }
    }

    #[test]
    fn test_from_columns_truncates() {
        let glyph = Glyph::from_columns(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(glyph.width() as usize, GLYPH_CAPACITY);
        assert_eq!(glyph.column(7), 8);
    }

    #[test]
    fn test_empty_glyph() {
        assert_eq!(Glyph::EMPTY.width(), 0);
        assert!(Glyph::EMPTY.columns().is_empty());
        assert_eq!(Glyph::from_columns(&[]), Glyph::EMPTY);
    }
}

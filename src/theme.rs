use ratatui::style::Color;

use crate::settings::ReaderTheme;

// Color palette structure
#[derive(Debug, Clone)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_09: Color, // Orange
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0c: Color, // Cyan
    pub base_0d: Color, // Blue
    pub base_0e: Color, // Purple
    pub base_0f: Color, // Brown
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

pub fn palette_for(theme: ReaderTheme) -> &'static Base16Palette {
    match theme {
        ReaderTheme::Light => &LIGHT_PALETTE,
        ReaderTheme::Dark => &DARK_PALETTE,
        ReaderTheme::Sepia => &SEPIA_PALETTE,
    }
}

// Oceanic Next
static DARK_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0x1B2B34),
    base_01: rgb(0x343D46),
    base_02: rgb(0x4F5B66),
    base_03: rgb(0x65737E),
    base_04: rgb(0xA7ADBA),
    base_05: rgb(0xC0C5CE),
    base_06: rgb(0xCDD3DE),
    base_07: rgb(0xF0F4F8),
    base_08: rgb(0xEC5F67),
    base_09: rgb(0xF99157),
    base_0a: rgb(0xFAC863),
    base_0b: rgb(0x99C794),
    base_0c: rgb(0x5FB3B3),
    base_0d: rgb(0x6699CC),
    base_0e: rgb(0xC594C5),
    base_0f: rgb(0xAB7967),
};

// Base16 "One Light"
static LIGHT_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0xFAFAFA),
    base_01: rgb(0xF0F0F1),
    base_02: rgb(0xE5E5E6),
    base_03: rgb(0xA0A1A7),
    base_04: rgb(0x696C77),
    base_05: rgb(0x383A42),
    base_06: rgb(0x202227),
    base_07: rgb(0x090A0B),
    base_08: rgb(0xCA1243),
    base_09: rgb(0xD75F00),
    base_0a: rgb(0xC18401),
    base_0b: rgb(0x50A14F),
    base_0c: rgb(0x0184BC),
    base_0d: rgb(0x4078F2),
    base_0e: rgb(0xA626A4),
    base_0f: rgb(0x986801),
};

// Warm paper tones for long reading sessions
static SEPIA_PALETTE: Base16Palette = Base16Palette {
    base_00: rgb(0xF4ECD8),
    base_01: rgb(0xEADFC4),
    base_02: rgb(0xDCCDAA),
    base_03: rgb(0xA89676),
    base_04: rgb(0x7D6B4F),
    base_05: rgb(0x5B4636),
    base_06: rgb(0x433326),
    base_07: rgb(0x2B2018),
    base_08: rgb(0xB5452D),
    base_09: rgb(0xC26A2E),
    base_0a: rgb(0xB58A2D),
    base_0b: rgb(0x6E8B3D),
    base_0c: rgb(0x4E8C84),
    base_0d: rgb(0x4A6D8C),
    base_0e: rgb(0x8C5A7D),
    base_0f: rgb(0x8B5E3C),
};

impl Base16Palette {
    // Get colors for focused/unfocused panels
    pub fn get_panel_colors(&self, is_focused: bool) -> (Color, Color, Color) {
        if is_focused {
            (self.base_07, self.base_04, self.base_00)
        } else {
            (self.base_03, self.base_03, self.base_00)
        }
    }

    pub fn get_selection_colors(&self, is_focused: bool) -> (Color, Color) {
        if is_focused {
            (self.base_02, self.base_06)
        } else {
            (self.base_02, self.base_03)
        }
    }

    pub fn popup_border_color(&self) -> Color {
        self.base_0d
    }
}

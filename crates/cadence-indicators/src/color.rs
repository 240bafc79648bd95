//! Colours and traffic-light status.

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// `#F5F5F5`, the unlit LED lens.
    pub const WHITE_SMOKE: Self = Self::rgb(245, 245, 245);
    /// `#90EE90`
    pub const LIGHT_GREEN: Self = Self::rgb(144, 238, 144);
    /// `#FFA500`
    pub const ORANGE: Self = Self::rgb(255, 165, 0);
    /// `#FF0000`
    pub const RED: Self = Self::rgb(255, 0, 0);

    /// Create a colour from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Status shown by a lit LED.
///
/// Green is normal, Yellow a warning and Red an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrafficLight {
    /// Normal operation.
    #[default]
    Green,
    /// Warning condition.
    Yellow,
    /// Error condition.
    Red,
}

impl TrafficLight {
    /// The colour an LED shows when lit with this status.
    pub const fn color(self) -> Color {
        match self {
            Self::Green => Color::LIGHT_GREEN,
            Self::Yellow => Color::ORANGE,
            Self::Red => Color::RED,
        }
    }
}

use std::fmt::Display;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RGBColorFormat<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
}

impl<T: Copy> RGBColorFormat<T> {
    pub fn new(red: T, green: T, blue: T) -> Self {
        RGBColorFormat { red, green, blue }
    }

    pub fn component(&self, component: ColorComponent) -> T {
        match component {
            ColorComponent::Red => self.red,
            ColorComponent::Green => self.green,
            ColorComponent::Blue => self.blue,
        }
    }
}

/// Color channels in the order they are stored in a compressed frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorComponent {
    Red,
    Green,
    Blue,
}

impl ColorComponent {
    pub const ALL: [ColorComponent; 3] = [Self::Red, Self::Green, Self::Blue];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

impl Display for ColorComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Color as read from a file with an arbitrary maximum component value.
pub struct RangeColorFormat<T> {
    max: T,
    red: T,
    green: T,
    blue: T,
}

impl RangeColorFormat<u16> {
    pub fn new(max: u16, red: u16, green: u16, blue: u16) -> crate::Result<Self> {
        for value in [red, green, blue] {
            if value > max {
                return Err(Error::ColorValueExceedsMaxValue(value, max));
            }
        }
        Ok(RangeColorFormat {
            max,
            red,
            green,
            blue,
        })
    }

    fn scale(&self, value: u16) -> u8 {
        let max = u32::from(self.max);
        if max == 0 {
            return 0;
        }
        ((u32::from(value) * 255 + max / 2) / max) as u8
    }
}

impl From<&RangeColorFormat<u16>> for RGBColorFormat<u8> {
    fn from(value: &RangeColorFormat<u16>) -> Self {
        RGBColorFormat {
            red: value.scale(value.red),
            green: value.scale(value.green),
            blue: value.scale(value.blue),
        }
    }
}

impl From<RangeColorFormat<u16>> for RGBColorFormat<u8> {
    fn from(value: RangeColorFormat<u16>) -> Self {
        RGBColorFormat::from(&value)
    }
}

/// Rounds a reconstructed sample and clamps it into the 8 bit range.
pub fn quantize_component(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

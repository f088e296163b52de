use std::io::Read;

use super::super::{Image, ImageReader};
use crate::color::{RGBColorFormat, RangeColorFormat};
use crate::error::Error;

/// Reads plain (P3) and binary (P6) portable pixmaps.
pub struct PPMImageReader<T: Read> {
    reader: T,
}

impl<T: Read> PPMImageReader<T> {
    pub fn new(reader: T) -> Self {
        Self { reader }
    }
}

impl<T: Read> ImageReader for PPMImageReader<T> {
    fn read_image(&mut self) -> crate::Result<Image> {
        let mut bytes = Vec::new();
        self.reader
            .read_to_end(&mut bytes)
            .map_err(Error::FailedToReadImage)?;
        let mut parser = PPMParser::new(PPMTokenizer::new(&bytes));
        parser.parse_tokens()
    }
}

struct PPMTokenizer<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> PPMTokenizer<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        PPMTokenizer { bytes, position: 0 }
    }

    /// Bytes following the last token and its single terminating whitespace.
    fn remaining_bytes(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }
}

impl Iterator for PPMTokenizer<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mut token = Vec::new();
        let mut in_comment = false;

        while let Some(&byte) = self.bytes.get(self.position) {
            self.position += 1;
            if in_comment {
                if byte == b'\n' {
                    in_comment = false;
                }
                continue;
            }
            if byte == b'#' {
                in_comment = true;
                continue;
            }
            if byte.is_ascii_whitespace() {
                if !token.is_empty() {
                    break;
                }
            } else {
                token.push(byte);
            }
        }

        if token.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(&token).into_owned())
    }
}

const MAGIC_NUMBER_TOKEN_NAME: &str = "P3 or P6 Header";
const WIDTH_HEADER_TOKEN_NAME: &str = "Width Header";
const HEIGHT_HEADER_TOKEN_NAME: &str = "Height Header";
const MAX_VALUE_HEADER_TOKEN_NAME: &str = "Max Value Header";
const COLOR_COMPONENT_VALUE_TOKEN_NAME: &str = "Color Component Value";

#[derive(Clone, Copy, Debug, PartialEq)]
enum PPMVersion {
    Plain,
    Raw,
}

#[derive(Clone, Copy)]
struct Dot {
    buffer: [u16; 3],
    index: usize,
}

impl Dot {
    fn new() -> Self {
        Self {
            buffer: [u16::default(); 3],
            index: 0,
        }
    }

    fn red(&self) -> u16 {
        self.buffer[0]
    }

    fn green(&self) -> u16 {
        self.buffer[1]
    }

    fn blue(&self) -> u16 {
        self.buffer[2]
    }

    fn push_color_component(&mut self, component: u16) {
        if self.is_complete() {
            return;
        }
        self.buffer[self.index] = component;
        self.index += 1;
    }

    fn is_complete(&self) -> bool {
        self.index == 3
    }

    fn reset(&mut self) {
        self.index = 0;
    }

    fn is_empty(&self) -> bool {
        self.index == 0
    }
}

struct PPMParser<'a> {
    tokenizer: PPMTokenizer<'a>,
}

impl<'a> PPMParser<'a> {
    fn new(tokenizer: PPMTokenizer<'a>) -> Self {
        Self { tokenizer }
    }

    fn parse_tokens(&mut self) -> crate::Result<Image> {
        let version = self.parse_header()?;
        let width = self.parse_width()?;
        let height = self.parse_height()?;
        let max_value = self.parse_max_value()?;
        let number_of_dots = width
            .checked_mul(height)
            .ok_or(Error::MismatchOfSizeBetweenHeaderAndValues)?;
        let dots = match version {
            PPMVersion::Plain => self.parse_all_dots()?,
            PPMVersion::Raw => self.parse_raw_dots(number_of_dots, max_value)?,
        };
        Self::check_parsed_dots_length_match_header_information(&dots, number_of_dots)?;
        let dots = dots
            .into_iter()
            .map(|d| {
                RangeColorFormat::new(max_value, d.red(), d.green(), d.blue())
                    .map(RGBColorFormat::from)
            })
            .collect::<crate::Result<Vec<RGBColorFormat<u8>>>>()?;
        Image::new(width, height, dots)
    }

    fn check_parsed_dots_length_match_header_information(
        dots: &[Dot],
        expected_number_of_dots: usize,
    ) -> crate::Result<()> {
        if dots.len() != expected_number_of_dots {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        Ok(())
    }

    fn parse_header(&mut self) -> crate::Result<PPMVersion> {
        let header = self
            .tokenizer
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(
                MAGIC_NUMBER_TOKEN_NAME,
            ))?;
        match header.as_str() {
            "P3" => Ok(PPMVersion::Plain),
            "P6" => Ok(PPMVersion::Raw),
            _ => Err(Error::PPMFileDoesNotContainRequiredToken(
                MAGIC_NUMBER_TOKEN_NAME,
            )),
        }
    }

    fn parse_width(&mut self) -> crate::Result<usize> {
        self.parse_header_value(WIDTH_HEADER_TOKEN_NAME)
    }

    fn parse_height(&mut self) -> crate::Result<usize> {
        self.parse_header_value(HEIGHT_HEADER_TOKEN_NAME)
    }

    fn parse_max_value(&mut self) -> crate::Result<u16> {
        let max_value: u16 = self.parse_header_value(MAX_VALUE_HEADER_TOKEN_NAME)?;
        if max_value == 0 {
            return Err(Error::ParsingOfTokenFailed(MAX_VALUE_HEADER_TOKEN_NAME));
        }
        Ok(max_value)
    }

    fn parse_header_value<V: std::str::FromStr>(
        &mut self,
        token_name: &'static str,
    ) -> crate::Result<V> {
        self.tokenizer
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(token_name))?
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(token_name))
    }

    fn parse_all_dots(&mut self) -> crate::Result<Vec<Dot>> {
        let mut current_dot = Dot::new();
        let mut dots = Vec::new();
        for token in self.tokenizer.by_ref() {
            let component = Self::parse_color_value(&token)?;
            current_dot.push_color_component(component);
            if current_dot.is_complete() {
                dots.push(current_dot);
                current_dot.reset();
            }
        }
        Self::check_pixel_was_complete(&current_dot)?;
        Ok(dots)
    }

    /// Reads exactly `number_of_dots` dots. Bytes after the raster are
    /// ignored.
    fn parse_raw_dots(&mut self, number_of_dots: usize, max_value: u16) -> crate::Result<Vec<Dot>> {
        let bytes_per_sample = if max_value < 256 { 1 } else { 2 };
        let raster_length = number_of_dots
            .checked_mul(3 * bytes_per_sample)
            .ok_or(Error::MismatchOfSizeBetweenHeaderAndValues)?;
        let raster = self
            .tokenizer
            .remaining_bytes()
            .get(..raster_length)
            .ok_or(Error::MismatchOfSizeBetweenHeaderAndValues)?;
        let components: Vec<u16> = if bytes_per_sample == 1 {
            raster.iter().copied().map(u16::from).collect()
        } else {
            raster
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect()
        };
        let mut dots = Vec::with_capacity(components.len() / 3);
        let mut current_dot = Dot::new();
        for component in components {
            current_dot.push_color_component(component);
            if current_dot.is_complete() {
                dots.push(current_dot);
                current_dot.reset();
            }
        }
        Self::check_pixel_was_complete(&current_dot)?;
        Ok(dots)
    }

    fn check_pixel_was_complete(dot: &Dot) -> crate::Result<()> {
        if !dot.is_empty() {
            return Err(Error::IncompletePixelParsed(dot.index));
        }
        Ok(())
    }

    fn parse_color_value(token: &str) -> crate::Result<u16> {
        token
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(COLOR_COMPONENT_VALUE_TOKEN_NAME))
    }
}

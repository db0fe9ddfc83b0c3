use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Notion's fixed color vocabulary, shared by rich text and block payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
}

impl std::str::FromStr for Color {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Color::Default),
            "gray" => Ok(Color::Gray),
            "brown" => Ok(Color::Brown),
            "orange" => Ok(Color::Orange),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "purple" => Ok(Color::Purple),
            "pink" => Ok(Color::Pink),
            "red" => Ok(Color::Red),
            "gray_background" => Ok(Color::GrayBackground),
            "brown_background" => Ok(Color::BrownBackground),
            "orange_background" => Ok(Color::OrangeBackground),
            "yellow_background" => Ok(Color::YellowBackground),
            "green_background" => Ok(Color::GreenBackground),
            "blue_background" => Ok(Color::BlueBackground),
            "purple_background" => Ok(Color::PurpleBackground),
            "pink_background" => Ok(Color::PinkBackground),
            "red_background" => Ok(Color::RedBackground),
            _ => Err(ValidationError::InvalidColor(s.to_string())),
        }
    }
}

impl Color {
    /// Wire name used by the Notion API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
            Color::GrayBackground => "gray_background",
            Color::BrownBackground => "brown_background",
            Color::OrangeBackground => "orange_background",
            Color::YellowBackground => "yellow_background",
            Color::GreenBackground => "green_background",
            Color::BlueBackground => "blue_background",
            Color::PurpleBackground => "purple_background",
            Color::PinkBackground => "pink_background",
            Color::RedBackground => "red_background",
        }
    }

    /// Maps a CSS color keyword (from an inline `style="color: ..."`) onto
    /// the closest Notion text color. Hex and rgb() values are not mapped.
    pub fn from_css_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "gray" | "grey" | "darkgray" | "darkgrey" | "dimgray" | "silver" => Some(Color::Gray),
            "brown" | "saddlebrown" | "sienna" | "maroon" => Some(Color::Brown),
            "orange" | "darkorange" | "orangered" => Some(Color::Orange),
            "yellow" | "gold" | "goldenrod" => Some(Color::Yellow),
            "green" | "darkgreen" | "forestgreen" | "seagreen" | "olive" => Some(Color::Green),
            "blue" | "navy" | "darkblue" | "royalblue" | "steelblue" | "teal" => Some(Color::Blue),
            "purple" | "indigo" | "violet" | "darkviolet" | "magenta" => Some(Color::Purple),
            "pink" | "hotpink" | "deeppink" => Some(Color::Pink),
            "red" | "darkred" | "crimson" | "firebrick" => Some(Color::Red),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::from_str("red").unwrap(), Color::Red);
        assert_eq!(
            Color::from_str("gray_background").unwrap(),
            Color::GrayBackground
        );
        assert!(Color::from_str("light_gray").is_err());
    }

    #[test]
    fn test_css_keywords() {
        assert_eq!(Color::from_css_keyword(" Crimson "), Some(Color::Red));
        assert_eq!(Color::from_css_keyword("#ff0000"), None);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Color::BlueBackground).unwrap();
        assert_eq!(json, "\"blue_background\"");
    }
}

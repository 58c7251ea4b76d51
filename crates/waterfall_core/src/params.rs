use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    #[error("aspect_ratio must be one of 16:9, 9:16, 3:2, 2:3, 1:1 (got {0})")]
    AspectRatio(String),
    #[error("video_length must be 6, 10, or 15 seconds (got {0})")]
    VideoLength(String),
    #[error("resolution_name must be one of 480p, 720p (got {0})")]
    Resolution(String),
    #[error("preset must be one of fun, normal, spicy, custom (got {0})")]
    Preset(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    Landscape16x9,
    Portrait9x16,
    #[default]
    Landscape3x2,
    Portrait2x3,
    Square,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape16x9 => "16:9",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape3x2 => "3:2",
            AspectRatio::Portrait2x3 => "2:3",
            AspectRatio::Square => "1:1",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = ParamsError;

    /// Accepts the ratio itself or the pixel size the service maps onto it.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "16:9" | "1280x720" => Ok(AspectRatio::Landscape16x9),
            "9:16" | "720x1280" => Ok(AspectRatio::Portrait9x16),
            "3:2" | "1792x1024" => Ok(AspectRatio::Landscape3x2),
            "2:3" | "1024x1792" => Ok(AspectRatio::Portrait2x3),
            "1:1" | "1024x1024" => Ok(AspectRatio::Square),
            other => Err(ParamsError::AspectRatio(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoLength {
    #[default]
    Six,
    Ten,
    Fifteen,
}

impl VideoLength {
    pub fn seconds(self) -> u32 {
        match self {
            VideoLength::Six => 6,
            VideoLength::Ten => 10,
            VideoLength::Fifteen => 15,
        }
    }
}

impl TryFrom<u32> for VideoLength {
    type Error = ParamsError;

    fn try_from(seconds: u32) -> Result<Self, Self::Error> {
        match seconds {
            6 => Ok(VideoLength::Six),
            10 => Ok(VideoLength::Ten),
            15 => Ok(VideoLength::Fifteen),
            other => Err(ParamsError::VideoLength(other.to_string())),
        }
    }
}

impl FromStr for VideoLength {
    type Err = ParamsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim().trim_end_matches('s');
        trimmed
            .parse::<u32>()
            .map_err(|_| ParamsError::VideoLength(raw.to_string()))
            .and_then(VideoLength::try_from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    P480,
    P720,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::P480 => "480p",
            Resolution::P720 => "720p",
        }
    }
}

impl FromStr for Resolution {
    type Err = ParamsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "480p" => Ok(Resolution::P480),
            "720p" => Ok(Resolution::P720),
            _ => Err(ParamsError::Resolution(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    Fun,
    Normal,
    Spicy,
    #[default]
    Custom,
}

impl Preset {
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Fun => "fun",
            Preset::Normal => "normal",
            Preset::Spicy => "spicy",
            Preset::Custom => "custom",
        }
    }
}

impl FromStr for Preset {
    type Err = ParamsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fun" => Ok(Preset::Fun),
            "normal" => Ok(Preset::Normal),
            "spicy" => Ok(Preset::Spicy),
            "custom" => Ok(Preset::Custom),
            _ => Err(ParamsError::Preset(raw.to_string())),
        }
    }
}

/// Generation configuration captured on an item when it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationParams {
    pub aspect_ratio: AspectRatio,
    pub video_length: VideoLength,
    pub resolution: Resolution,
    pub preset: Preset,
}

impl fmt::Display for GenerationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}s {} {}",
            self.aspect_ratio.as_str(),
            self.video_length.seconds(),
            self.resolution.as_str(),
            self.preset.as_str()
        )
    }
}

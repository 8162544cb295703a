//! Three-step rating used for task effort and impact

use serde::{Deserialize, Serialize};

/// Rating level assigned by the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

/// How much work a task takes
pub type Effort = Level;

/// How much a task moves things forward
pub type Impact = Level;

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown level: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Low < Level::Medium);
        assert!(Level::Medium < Level::High);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("low".parse::<Level>().unwrap(), Level::Low);
        assert_eq!("MEDIUM".parse::<Level>().unwrap(), Level::Medium);
        assert!("extreme".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_serde() {
        let json = serde_json::to_string(&Level::High).unwrap();
        assert_eq!(json, "\"high\"");

        let level: Level = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(level, Level::Medium);

        assert!(serde_json::from_str::<Level>("\"urgent\"").is_err());
    }
}

use crate::services::validation::validate_not_blank;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Frontend,
    BackendDatabase,
    Languages,
    CloudDevops,
    #[default]
    ToolsPlatform,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 5] = [
        Self::Frontend,
        Self::BackendDatabase,
        Self::Languages,
        Self::CloudDevops,
        Self::ToolsPlatform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::BackendDatabase => "backend_database",
            Self::Languages => "languages",
            Self::CloudDevops => "cloud_devops",
            Self::ToolsPlatform => "tools_platform",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::BackendDatabase => "Backend & Database",
            Self::Languages => "Languages",
            Self::CloudDevops => "Cloud & DevOps",
            Self::ToolsPlatform => "Tools & Platforms",
        }
    }
}

/// Exact canonical tokens only; legacy labels go through the normaliser.
impl FromStr for SkillCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl FromStr for SkillLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            "expert" => Ok(Self::Expert),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: SkillCategory,
    pub level: SkillLevel,
    pub icon: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Category and level arrive as free text and are normalised before storage,
/// so legacy labels such as "Tools & Platforms" are accepted.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSkill {
    #[validate(
        length(min = 1, max = 50, message = "must be between 1 and 50 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: String,
    #[validate(length(max = 50, message = "must be 50 characters or less"))]
    pub category: Option<String>,
    #[validate(length(max = 20, message = "must be 20 characters or less"))]
    pub level: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "must be 10 characters or less"))]
    pub icon: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSkill {
    #[validate(
        length(min = 1, max = 50, message = "must be between 1 and 50 characters"),
        custom(function = "validate_not_blank")
    )]
    pub name: Option<String>,
    #[validate(length(max = 50, message = "must be 50 characters or less"))]
    pub category: Option<String>,
    #[validate(length(max = 20, message = "must be 20 characters or less"))]
    pub level: Option<String>,
    #[validate(length(max = 10, message = "must be 10 characters or less"))]
    pub icon: Option<String>,
}

// 🚻 Gender Type - Competition gender dimension

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GenderType {
    Male,
    Female,
}

impl GenderType {
    pub const ALL: [GenderType; 2] = [GenderType::Male, GenderType::Female];

    /// Short code used by result feeds and records ("M" / "F")
    pub fn code(&self) -> &'static str {
        match self {
            GenderType::Male => "M",
            GenderType::Female => "F",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenderType::Male => "Male",
            GenderType::Female => "Female",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim().to_uppercase().as_str() {
            "M" => Ok(GenderType::Male),
            "F" => Ok(GenderType::Female),
            other => Err(RankingError::InvalidArgument(format!(
                "unknown gender code '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for GenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// 🏊 Pool Type - Course length of the pool a race was swum in

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolType {
    /// 25 metres
    ShortCourse,

    /// 50 metres
    LongCourse,
}

impl PoolType {
    pub const ALL: [PoolType; 2] = [PoolType::ShortCourse, PoolType::LongCourse];

    pub fn code(&self) -> &'static str {
        match self {
            PoolType::ShortCourse => "25",
            PoolType::LongCourse => "50",
        }
    }

    pub fn length_in_meters(&self) -> u32 {
        match self {
            PoolType::ShortCourse => 25,
            PoolType::LongCourse => 50,
        }
    }

    pub fn is_long_course(&self) -> bool {
        matches!(self, PoolType::LongCourse)
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code.trim() {
            "25" => Ok(PoolType::ShortCourse),
            "50" => Ok(PoolType::LongCourse),
            other => Err(RankingError::InvalidArgument(format!(
                "unknown pool code '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_codes() {
        assert_eq!(PoolType::from_code("50").unwrap(), PoolType::LongCourse);
        assert!(PoolType::from_code("50").unwrap().is_long_course());
        assert!(!PoolType::ShortCourse.is_long_course());
        assert!(PoolType::from_code("33").is_err());
    }
}

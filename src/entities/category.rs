// 🏷️ Category Type - Age group a swimmer competes in
//
// Categories are identified by their code ("M25", "M30", "U25" ...). Age
// bounds are informative only: results already carry the category they were
// swum in.

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryType {
    pub code: String,

    /// Youngest age admitted (inclusive)
    pub age_begin: Option<u32>,

    /// Oldest age admitted (inclusive)
    pub age_end: Option<u32>,
}

impl CategoryType {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() {
            return Err(RankingError::InvalidArgument(
                "category code must not be empty".to_string(),
            ));
        }

        Ok(CategoryType {
            code: code.to_string(),
            age_begin: None,
            age_end: None,
        })
    }

    pub fn with_ages(code: &str, age_begin: u32, age_end: u32) -> Result<Self> {
        if age_end < age_begin {
            return Err(RankingError::InvalidArgument(format!(
                "category '{}' ends ({}) before it begins ({})",
                code, age_end, age_begin
            )));
        }

        let mut category = CategoryType::new(code)?;
        category.age_begin = Some(age_begin);
        category.age_end = Some(age_end);
        Ok(category)
    }

    pub fn admits_age(&self, age: u32) -> bool {
        self.age_begin.map_or(true, |begin| age >= begin)
            && self.age_end.map_or(true, |end| age <= end)
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

//! Abbreviation tokenizer (`"PLWN"` → `[PL, WN]`).
//!
//! Scan left to right. At each position try a 2-character window, then 3,
//! then 4; the first window found in the vocabulary is the token. Windows
//! only ever grow, so a 2-character token always shadows a longer one that
//! starts with it.

use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;
use crate::models::NoiseModel;

const MIN_TOKEN_LEN: usize = 2;
const MAX_TOKEN_LEN: usize = 4;

/// Ordered, duplicate-free, validated set of noise models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseModelSet {
    models: Vec<NoiseModel>,
}

impl NoiseModelSet {
    /// Parse an abbreviation string such as `"PLWN"` or `"fGGMAR1VA"`.
    pub fn parse(abbreviation: &str) -> Result<Self, PipelineError> {
        if abbreviation.is_empty() {
            return Err(PipelineError::InvalidAbbreviation {
                substring: String::new(),
            });
        }

        let chars: Vec<char> = abbreviation.chars().collect();
        let mut models: Vec<NoiseModel> = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let remaining = chars.len() - start;
            let mut matched = None;

            for len in MIN_TOKEN_LEN..=MAX_TOKEN_LEN.min(remaining) {
                let window: String = chars[start..start + len].iter().collect();
                if let Some(model) = NoiseModel::from_abbreviation(&window) {
                    matched = Some((model, len));
                    break;
                }
            }

            let Some((model, len)) = matched else {
                let end = (start + MAX_TOKEN_LEN).min(chars.len());
                return Err(PipelineError::InvalidAbbreviation {
                    substring: chars[start..end].iter().collect(),
                });
            };

            if models.contains(&model) {
                return Err(PipelineError::DuplicateModel {
                    token: model.abbreviation().to_string(),
                });
            }
            models.push(model);
            start += len;
        }

        if models.contains(&NoiseModel::Ggm) {
            if let Some(other) = models.iter().find(|m| m.conflicts_with_ggm()) {
                return Err(PipelineError::ConflictingModels {
                    other: other.abbreviation().to_string(),
                });
            }
        }

        Ok(Self { models })
    }

    pub fn models(&self) -> &[NoiseModel] {
        &self.models
    }

    pub fn contains(&self, model: NoiseModel) -> bool {
        self.models.contains(&model)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = NoiseModel> + '_ {
        self.models.iter().copied()
    }
}

impl fmt::Display for NoiseModelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for model in &self.models {
            f.write_str(model.abbreviation())?;
        }
        Ok(())
    }
}

impl FromStr for NoiseModelSet {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

//! Frequency bounds from the spectrum estimator's summary output.
//!
//! The estimator prints a whitespace-separated summary whose fifth- and
//! third-from-last tokens are the lowest and highest frequencies of the
//! estimated spectrum. Nothing else in the output is interpreted.

use crate::error::PipelineError;

/// Frequency range handed to the spectrum model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumBounds {
    pub low: f64,
    pub high: f64,
}

pub fn parse_spectrum_bounds(stdout: &str) -> Result<SpectrumBounds, PipelineError> {
    let tokens: Vec<&str> = stdout.split_whitespace().collect();
    if tokens.len() < 5 {
        return Err(PipelineError::MalformedResult {
            message: format!("spectrum summary has {} tokens, expected at least 5", tokens.len()),
        });
    }

    let number = |token: &str| {
        token.parse::<f64>().map_err(|_| PipelineError::MalformedResult {
            message: format!("frequency bound '{token}' is not a number"),
        })
    };

    Ok(SpectrumBounds {
        low: number(tokens[tokens.len() - 5])?,
        high: number(tokens[tokens.len() - 3])?,
    })
}

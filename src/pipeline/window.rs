//! Sliding-window framing of a scaled series for sequence regression
//!
//! Window `i` covers `values[i..i + look_back]` and its training target is
//! `values[i + look_back]`. Only `len - look_back - 1` windows are produced,
//! which leaves the final value of the series outside every training pair and
//! keeps the downstream alignment offset at `look_back + 1`.

use super::PipelineError;
use crate::ml::WindowBatch;

/// Days of history fed to the forecaster per prediction
pub const DEFAULT_LOOK_BACK: usize = 7;

/// One input window and its training target
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedSample<'a> {
    /// Position of the first value of the window in the series
    pub index: usize,
    pub input: &'a [f64],
    /// Value immediately following the window
    pub target: f64,
}

impl WindowedSample<'_> {
    pub fn target_index(&self) -> usize {
        self.index + self.input.len()
    }
}

/// Restartable, order-preserving windower over a borrowed series
#[derive(Debug, Clone, Copy)]
pub struct SequenceWindower<'a> {
    values: &'a [f64],
    look_back: usize,
}

impl<'a> SequenceWindower<'a> {
    pub fn new(values: &'a [f64], look_back: usize) -> Self {
        Self { values, look_back }
    }

    pub fn look_back(&self) -> usize {
        self.look_back
    }

    /// `n - look_back - 1`, or zero when the series is too short
    pub fn sample_count(&self) -> usize {
        self.values.len().saturating_sub(self.look_back + 1)
    }

    /// Fresh iterator from the first window; calling it again restarts.
    pub fn iter(&self) -> Samples<'a> {
        Samples {
            values: self.values,
            look_back: self.look_back,
            next: 0,
            end: self.sample_count(),
        }
    }

    /// Collect every input window into one batch for the forecaster
    pub fn batch(&self) -> Result<WindowBatch, PipelineError> {
        if self.look_back == 0 {
            return Err(PipelineError::Configuration(
                "look_back must be at least 1".into(),
            ));
        }
        let mut batch = WindowBatch::with_capacity(self.look_back, self.sample_count());
        for sample in self.iter() {
            batch.push(sample.input);
        }
        Ok(batch)
    }
}

impl<'a> IntoIterator for &SequenceWindower<'a> {
    type Item = WindowedSample<'a>;
    type IntoIter = Samples<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`SequenceWindower::iter`]
#[derive(Debug, Clone)]
pub struct Samples<'a> {
    values: &'a [f64],
    look_back: usize,
    next: usize,
    end: usize,
}

impl<'a> Iterator for Samples<'a> {
    type Item = WindowedSample<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(WindowedSample {
            index: i,
            input: &self.values[i..i + self.look_back],
            target: self.values[i + self.look_back],
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples<'_> {}

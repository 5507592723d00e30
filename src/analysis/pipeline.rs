//! Pipeline token stream: composes analyzers into one analyzer

use super::analyzer::Analyzer;
use super::token::TokenAttributes;
use crate::error::{GristError, Result};

/// Sentinel for "not yet positioned": the first token after a reset moves the
/// stage position from this value to `pos_inc - 1` by wrapping addition.
const POS_SENTINEL: u32 = u32::MAX;

struct Stage {
    analyzer: Box<dyn Analyzer>,
    /// Logical position within the stage's current input (wrapping counter)
    pos: u32,
    /// Byte length of the input most recently fed to this stage
    data_size: u32,
}

impl Stage {
    fn new(analyzer: Box<dyn Analyzer>) -> Self {
        Self {
            analyzer,
            pos: POS_SENTINEL,
            data_size: 0,
        }
    }

    fn reset(&mut self, input: &str) -> bool {
        self.data_size = input.len() as u32;
        self.pos = POS_SENTINEL;
        self.analyzer.reset(input)
    }

    fn next(&mut self) -> bool {
        if !self.analyzer.next() {
            return false;
        }
        self.pos = self.pos.wrapping_add(self.analyzer.attributes().pos_inc);
        true
    }

    fn attrs(&self) -> &TokenAttributes {
        self.analyzer.attributes()
    }
}

/// Composes `[A0, A1, …, An-1]` into a single analyzer: each term emitted by
/// stage *i* is fed as the input of stage *i + 1*, and the bottom stage's
/// terms are published with positions and offsets aggregated over the whole
/// pipeline.
///
/// Position change rules:
/// - if no stage changes position, the pipeline holds position;
/// - real gaps emitted by any stage are accumulated;
/// - position changes caused by re-seating a downstream stage on a new
///   upstream token (its transition from the sentinel to 0) are collapsed
///   into the upstream step;
/// - if the upstream held position but a downstream stage rolled back from a
///   positive position to 0 due to the re-seat, that counts as one real step.
pub struct PipelineTokenStream {
    stages: Vec<Stage>,
    current: usize,
    attrs: TokenAttributes,
}

impl PipelineTokenStream {
    /// Create a pipeline from the given analyzers, top to bottom.
    pub fn new(analyzers: Vec<Box<dyn Analyzer>>) -> Result<Self> {
        if analyzers.is_empty() {
            return Err(GristError::Config(
                "pipeline requires at least one analyzer".to_string(),
            ));
        }
        Ok(Self {
            stages: analyzers.into_iter().map(Stage::new).collect(),
            current: 0,
            attrs: TokenAttributes::default(),
        })
    }

    fn bottom(&self) -> usize {
        self.stages.len() - 1
    }

    /// Pull the next token from the current stage, walking upstream while
    /// stages are exhausted. Returns `false` once the top stage is drained.
    fn pull(&mut self) -> bool {
        while !self.stages[self.current].next() {
            if self.current == 0 {
                return false;
            }
            self.current -= 1;
        }
        true
    }

    fn compute_offsets(&mut self) {
        let bottom = self.bottom();
        let mut start = 0u32;
        let mut upstream_end = self.stages[0].data_size;
        for (idx, stage) in self.stages.iter().enumerate() {
            let offs = stage.attrs();
            start += offs.start;
            if offs.end != stage.data_size && idx != bottom {
                // this stage is not last and consumed only part of its input,
                // so it bounds the composite offset end
                upstream_end = start + (offs.end - offs.start);
            }
        }

        let last = self.stages[bottom].attrs();
        self.attrs.start = start;
        self.attrs.end = if last.end == self.stages[bottom].data_size {
            // all data eaten, the actual end is defined upstream
            upstream_end
        } else {
            start + (last.end - last.start)
        };
    }
}

impl Analyzer for PipelineTokenStream {
    fn reset(&mut self, input: &str) -> bool {
        self.current = 0;
        self.stages[0].reset(input)
    }

    fn next(&mut self) -> bool {
        if !self.pull() {
            return false;
        }
        let mut upstream_inc = self.stages[self.current].attrs().pos_inc;
        let top_holds_position = upstream_inc == 0;

        // cascade down to the bottom stage to get actual tokens
        let mut step_for_rollback = false;
        while self.current != self.bottom() {
            let term = self.stages[self.current].attrs().term.clone();
            self.current += 1;

            // re-seating a stage that had advanced past position 0 while the
            // upstream held position is a real pipeline step
            let pos = self.stages[self.current].pos;
            step_for_rollback |= top_holds_position && pos != 0 && pos != POS_SENTINEL;

            let Ok(text) = std::str::from_utf8(&term) else {
                return false;
            };
            if !self.stages[self.current].reset(text) {
                return false;
            }
            if !self.pull() {
                return false;
            }
            let inc = self.stages[self.current].attrs().pos_inc;
            debug_assert!(inc > 0, "first increment after reset must be positive");
            // compensate the downstream stage's transition from the sentinel
            // to 0: the reset itself does not move the pipeline
            upstream_inc += inc;
            upstream_inc -= 1;
        }
        if step_for_rollback {
            upstream_inc += 1;
        }

        self.attrs.term.clear();
        let bottom = self.bottom();
        self.attrs
            .term
            .extend_from_slice(&self.stages[bottom].attrs().term);
        self.attrs.payload = self.stages[bottom].attrs().payload.clone();
        self.attrs.pos_inc = upstream_inc;
        self.compute_offsets();
        true
    }

    fn attributes(&self) -> &TokenAttributes {
        &self.attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::delimiter::{DelimiterAnalyzer, DelimiterOptions};
    use crate::analysis::lowercase::LowercaseAnalyzer;

    fn delimiter(d: &str) -> Box<dyn Analyzer> {
        Box::new(DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: d.to_string(),
        }))
    }

    fn drain(pipeline: &mut PipelineTokenStream, input: &str) -> Vec<(String, u32, u32, u32)> {
        assert!(pipeline.reset(input));
        let mut out = Vec::new();
        while pipeline.next() {
            let attrs = pipeline.attributes();
            out.push((
                String::from_utf8(attrs.term.clone()).unwrap(),
                attrs.pos_inc,
                attrs.start,
                attrs.end,
            ));
        }
        out
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(PipelineTokenStream::new(Vec::new()).is_err());
    }

    #[test]
    fn test_delimiter_then_lowercase() {
        let mut pipeline = PipelineTokenStream::new(vec![
            delimiter("-"),
            Box::new(LowercaseAnalyzer::new()),
        ])
        .unwrap();
        let tokens = drain(&mut pipeline, "Aa-Bb");
        assert_eq!(
            tokens,
            vec![
                ("aa".to_string(), 1, 0, 2),
                ("bb".to_string(), 1, 3, 5),
            ]
        );
    }

    #[test]
    fn test_single_stage_identity() {
        // a one-stage pipeline reproduces the inner analyzer's stream
        let mut inner = DelimiterAnalyzer::new(DelimiterOptions {
            delimiter: ",".to_string(),
        });
        let mut pipeline = PipelineTokenStream::new(vec![delimiter(",")]).unwrap();

        let input = "x,longer,,z";
        assert!(inner.reset(input));
        assert!(pipeline.reset(input));
        loop {
            let a = inner.next();
            let b = pipeline.next();
            assert_eq!(a, b);
            if !a {
                break;
            }
            assert_eq!(inner.attributes(), pipeline.attributes());
        }
    }

    #[test]
    fn test_nested_delimiters_accumulate_offsets() {
        let mut pipeline =
            PipelineTokenStream::new(vec![delimiter(";"), delimiter(",")]).unwrap();
        let input = "a,b;c";
        let tokens = drain(&mut pipeline, input);
        assert_eq!(
            tokens,
            vec![
                ("a".to_string(), 1, 0, 1),
                ("b".to_string(), 1, 2, 3),
                ("c".to_string(), 1, 4, 5),
            ]
        );
    }

    #[test]
    fn test_offset_law() {
        let mut pipeline = PipelineTokenStream::new(vec![
            delimiter(" "),
            delimiter("-"),
            Box::new(LowercaseAnalyzer::new()),
        ])
        .unwrap();
        let input = "Foo-Bar baz-Qux quux";
        assert!(pipeline.reset(input));
        while pipeline.next() {
            let attrs = pipeline.attributes();
            assert!(attrs.start <= attrs.end);
            assert!(attrs.end <= input.len() as u32);
        }
    }

    #[test]
    fn test_pipeline_exhausts_cleanly() {
        let mut pipeline = PipelineTokenStream::new(vec![delimiter("-")]).unwrap();
        assert!(pipeline.reset("a-b"));
        assert!(pipeline.next());
        assert!(pipeline.next());
        assert!(!pipeline.next());
        assert!(!pipeline.next());
    }
}

//! Scored doc iterators, the unscored bitset iterator and the disjunction

use std::sync::Arc;

use roaring::RoaringBitmap;

use super::filter::Cancellation;
use super::sort::{MergeType, Scorers};
use crate::segment::{DocId, DocIterator, PostingIterator};

/// Wraps a posting iterator with prepared scorers and writes bucket scores
/// on demand. With no configured order the scorer set is empty and scoring
/// costs nothing.
pub struct ScoredDocIterator<'a> {
    it: PostingIterator<'a>,
    scorers: Scorers,
}

impl<'a> ScoredDocIterator<'a> {
    pub fn new(it: PostingIterator<'a>, scorers: Scorers) -> Self {
        Self { it, scorers }
    }
}

impl DocIterator for ScoredDocIterator<'_> {
    fn doc(&self) -> DocId {
        self.it.doc()
    }

    fn next(&mut self) -> bool {
        self.it.next()
    }

    fn seek(&mut self, target: DocId) -> DocId {
        self.it.seek(target)
    }

    fn cost(&self) -> u64 {
        self.it.cost()
    }

    fn freq(&self) -> u32 {
        self.it.freq()
    }

    fn score_into(&mut self, scores: &mut [f32]) {
        let freq = self.it.freq();
        self.scorers.score_into(freq, scores);
    }
}

impl ScoredDocIterator<'_> {
    fn is_scoring(&self) -> bool {
        !self.scorers.is_empty()
    }
}

/// Doc iterator over a precomputed document set, emitting the neutral score
pub struct BitsetDocIterator<'a> {
    iter: roaring::bitmap::Iter<'a>,
    doc: DocId,
    cost: u64,
}

impl<'a> BitsetDocIterator<'a> {
    pub fn new(docs: &'a RoaringBitmap) -> Self {
        Self {
            iter: docs.iter(),
            doc: DocId::INVALID,
            cost: docs.len(),
        }
    }
}

impl DocIterator for BitsetDocIterator<'_> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> bool {
        match self.iter.next() {
            Some(doc) => {
                self.doc = DocId(doc);
                true
            }
            None => {
                self.doc = DocId::EOF;
                false
            }
        }
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target == DocId::INVALID {
            return self.doc;
        }
        if target == DocId::EOF {
            self.doc = DocId::EOF;
            return self.doc;
        }
        while self.doc == DocId::INVALID || (self.doc < target && self.doc != DocId::EOF) {
            if !self.next() {
                break;
            }
        }
        self.doc
    }

    fn cost(&self) -> u64 {
        self.cost
    }
}

/// A child of a disjunction: either a scored posting iterator or any plain
/// doc iterator contributing the neutral score.
enum Child<'a> {
    Scored(ScoredDocIterator<'a>),
    Neutral(Box<dyn DocIterator + 'a>),
}

impl Child<'_> {
    fn iter(&self) -> &dyn DocIterator {
        match self {
            Child::Scored(it) => it,
            Child::Neutral(it) => it.as_ref(),
        }
    }

    fn iter_mut(&mut self) -> &mut dyn DocIterator {
        match self {
            Child::Scored(it) => it,
            Child::Neutral(it) => it.as_mut(),
        }
    }
}

/// Doc iterator emitting the union of its children in increasing document
/// order. The score of a document is the merge of the contributing scored
/// children's bucket scores under the merge policy; documents matched only
/// by neutral children keep the neutral (zero) score.
pub struct Disjunction<'a> {
    children: Vec<Child<'a>>,
    doc: DocId,
    cost: u64,
    merge_type: MergeType,
    score_size: usize,
    scratch: Vec<f32>,
    cancel: Option<Arc<Cancellation>>,
}

impl<'a> Disjunction<'a> {
    pub fn new(
        scored: Vec<ScoredDocIterator<'a>>,
        neutral: Vec<Box<dyn DocIterator + 'a>>,
        merge_type: MergeType,
        score_size: usize,
        cancel: Option<Arc<Cancellation>>,
    ) -> Self {
        let mut children: Vec<Child<'a>> = scored.into_iter().map(Child::Scored).collect();
        children.extend(neutral.into_iter().map(Child::Neutral));
        let cost = children.iter().map(|c| c.iter().cost()).sum();
        Self {
            children,
            doc: DocId::INVALID,
            cost,
            merge_type,
            score_size,
            scratch: vec![0.0; score_size],
            cancel,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

impl DocIterator for Disjunction<'_> {
    fn doc(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> bool {
        let target = match self.doc {
            DocId::EOF => return false,
            DocId::INVALID => DocId(0),
            doc => DocId(doc.0 + 1),
        };
        self.seek(target) != DocId::EOF
    }

    fn seek(&mut self, target: DocId) -> DocId {
        if target == DocId::INVALID {
            return self.doc;
        }
        if target == DocId::EOF || self.is_cancelled() {
            self.doc = DocId::EOF;
            return self.doc;
        }
        if self.doc != DocId::INVALID && self.doc >= target {
            return self.doc;
        }

        let mut min = DocId::EOF;
        for child in &mut self.children {
            let it = child.iter_mut();
            let mut doc = it.doc();
            if doc == DocId::INVALID || doc < target {
                doc = it.seek(target);
            }
            if doc.is_valid() && doc < min {
                min = doc;
            }
        }
        self.doc = min;
        self.doc
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn score_into(&mut self, scores: &mut [f32]) {
        debug_assert_eq!(scores.len(), self.score_size);
        for slot in scores.iter_mut() {
            *slot = 0.0;
        }
        if !self.doc.is_valid() {
            return;
        }

        let mut first = true;
        for child in &mut self.children {
            let positioned = child.iter().doc() == self.doc;
            if !positioned {
                continue;
            }
            let Child::Scored(it) = child else {
                continue; // neutral contribution
            };
            if !it.is_scoring() {
                continue;
            }
            it.score_into(&mut self.scratch);
            for (acc, &value) in scores.iter_mut().zip(self.scratch.iter()) {
                self.merge_type.merge(acc, value, first);
            }
            first = false;
        }
    }
}

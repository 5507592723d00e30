//! Wildcard filter visiting behavior

use grist::{DocIterator, Filter, Index, PrepareContext, SegmentId, SegmentWriter, WildcardFilter};

/// One document per term, in the given order
fn index(terms: &[&str]) -> Index {
    let mut writer = SegmentWriter::new(SegmentId::new(0));
    for term in terms {
        writer.begin_document();
        writer.index_term("name", term.as_bytes());
    }
    Index::new(vec![writer.build().unwrap()])
}

fn matched_terms(index: &Index, pattern: &str, terms: &[&str]) -> Vec<String> {
    let ctx = PrepareContext::unordered(index);
    let query = WildcardFilter::new("name", pattern).prepare(&ctx);

    let mut visited = Vec::new();
    for (ord, segment) in index.segments().iter().enumerate() {
        let mut iter = query.execute(segment, ord);
        while iter.next() {
            visited.push(terms[iter.doc().as_usize()].to_string());
        }
    }
    visited
}

#[test]
fn trailing_run_visits_prefixed_terms() {
    let terms = ["foo", "foobar", "foa", "foabar"];
    let index = index(&terms);
    assert_eq!(matched_terms(&index, "foo%", &terms), vec!["foo", "foobar"]);
}

#[test]
fn leading_run_visits_suffixed_terms() {
    let terms = ["foo", "bfoo", "foobar"];
    let index = index(&terms);
    assert_eq!(matched_terms(&index, "%foo", &terms), vec!["foo", "bfoo"]);
}

#[test]
fn single_byte_wildcard_is_exact() {
    let terms = ["azbce1d", "azbce1d1", "azbce11d"];
    let index = index(&terms);
    assert_eq!(matched_terms(&index, "a%bce_d", &terms), vec!["azbce1d"]);
}

#[test]
fn escaped_wildcards_match_literally() {
    let terms = ["100%", "100x"];
    let index = index(&terms);
    assert_eq!(matched_terms(&index, "100\\%", &terms), vec!["100%"]);
}

#[test]
fn match_all_pattern_visits_everything() {
    let terms = ["a", "b", "c"];
    let index = index(&terms);
    assert_eq!(matched_terms(&index, "%", &terms), vec!["a", "b", "c"]);
}

#[test]
fn absent_field_matches_nothing() {
    let terms = ["foo"];
    let index = index(&terms);
    let ctx = PrepareContext::unordered(&index);
    let query = WildcardFilter::new("other", "foo%").prepare(&ctx);
    let mut iter = query.execute(&index.segments()[0], 0);
    assert!(!iter.next());
}

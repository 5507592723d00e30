//! Wildcard pattern compiler
//!
//! Pattern language: `%` matches any run of bytes (including the empty run),
//! `_` matches exactly one byte, `\` escapes the next byte. Patterns compile
//! to a deterministic [`Acceptor`] via a linear NFA and subset construction
//! over the bytes occurring in the pattern plus ρ.

use std::collections::{BTreeSet, HashMap};

use super::{Acceptor, AcceptorBuilder, StateId};

const ANY_STRING: u8 = b'%';
const ANY_BYTE: u8 = b'_';
const ESCAPE: u8 = b'\\';

/// Shape of a wildcard pattern, used by filters to pick a cheaper execution
/// path before falling back to the automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WildcardKind {
    /// No unescaped wildcard bytes: an exact term
    Term,
    /// Only `%` runs: matches every term
    MatchAll,
    /// A literal followed by a single trailing `%`
    Prefix,
    /// Anything else
    Wildcard,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Symbol {
    Literal(u8),
    AnyByte,
    AnyRun,
}

fn parse(pattern: &[u8]) -> Vec<Symbol> {
    let mut symbols = Vec::with_capacity(pattern.len());
    let mut escaped = false;
    for &byte in pattern {
        if escaped {
            symbols.push(Symbol::Literal(byte));
            escaped = false;
            continue;
        }
        match byte {
            ESCAPE => escaped = true,
            ANY_STRING => symbols.push(Symbol::AnyRun),
            ANY_BYTE => symbols.push(Symbol::AnyByte),
            _ => symbols.push(Symbol::Literal(byte)),
        }
    }
    if escaped {
        // trailing escape is a literal backslash
        symbols.push(Symbol::Literal(ESCAPE));
    }
    symbols
}

/// Classify a pattern into its execution shape.
pub fn wildcard_kind(pattern: &[u8]) -> WildcardKind {
    let symbols = parse(pattern);
    if symbols.iter().all(|s| matches!(s, Symbol::Literal(_))) {
        return WildcardKind::Term;
    }
    if symbols.iter().all(|s| matches!(s, Symbol::AnyRun)) {
        return WildcardKind::MatchAll;
    }
    let runs = symbols
        .iter()
        .filter(|s| matches!(s, Symbol::AnyRun))
        .count();
    let any_bytes = symbols
        .iter()
        .filter(|s| matches!(s, Symbol::AnyByte))
        .count();
    if runs == 1 && any_bytes == 0 && matches!(symbols.last(), Some(Symbol::AnyRun)) {
        return WildcardKind::Prefix;
    }
    WildcardKind::Wildcard
}

/// Literal bytes of a pattern with no unescaped wildcards.
pub fn unescape(pattern: &[u8]) -> Vec<u8> {
    parse(pattern)
        .into_iter()
        .map(|s| match s {
            Symbol::Literal(b) => b,
            // classification guarantees literals only; fall back verbatim
            Symbol::AnyRun => ANY_STRING,
            Symbol::AnyByte => ANY_BYTE,
        })
        .collect()
}

/// Literal prefix of a `Prefix`-shaped pattern (everything before the `%`).
pub fn prefix_bytes(pattern: &[u8]) -> Vec<u8> {
    let mut symbols = parse(pattern);
    symbols.pop(); // trailing AnyRun
    symbols
        .into_iter()
        .map(|s| match s {
            Symbol::Literal(b) => b,
            Symbol::AnyRun => ANY_STRING,
            Symbol::AnyByte => ANY_BYTE,
        })
        .collect()
}

/// Epsilon closure: an `AnyRun` position may be skipped.
fn closure(symbols: &[Symbol], set: &mut BTreeSet<usize>) {
    let mut stack: Vec<usize> = set.iter().copied().collect();
    while let Some(pos) = stack.pop() {
        if pos < symbols.len() && symbols[pos] == Symbol::AnyRun && set.insert(pos + 1) {
            stack.push(pos + 1);
        }
    }
}

/// Compile a wildcard pattern into a deterministic acceptor.
pub fn wildcard_acceptor(pattern: &[u8]) -> Acceptor {
    let symbols = parse(pattern);
    let accept_pos = symbols.len();

    let mut builder = AcceptorBuilder::new();
    let mut dfa_states: HashMap<BTreeSet<usize>, StateId> = HashMap::new();

    let mut start: BTreeSet<usize> = BTreeSet::new();
    start.insert(0);
    closure(&symbols, &mut start);

    let start_id = builder.add_state();
    if start.contains(&accept_pos) {
        builder.set_accept(start_id, None);
    }
    dfa_states.insert(start.clone(), start_id);
    let mut queue = vec![start];

    while let Some(set) = queue.pop() {
        let from = dfa_states[&set];

        // bytes with explicit transitions out of this set
        let mut alphabet: BTreeSet<u8> = BTreeSet::new();
        for &pos in &set {
            if let Some(Symbol::Literal(b)) = symbols.get(pos).copied() {
                alphabet.insert(b);
            }
        }

        let mut targets: Vec<(Option<u8>, BTreeSet<usize>)> =
            Vec::with_capacity(alphabet.len() + 1);
        for byte in alphabet {
            targets.push((Some(byte), step(&symbols, &set, Some(byte))));
        }
        targets.push((None, step(&symbols, &set, None)));

        for (byte, mut target) in targets {
            if target.is_empty() {
                continue;
            }
            closure(&symbols, &mut target);
            let to = *dfa_states.entry(target.clone()).or_insert_with(|| {
                let id = builder.add_state();
                if target.contains(&accept_pos) {
                    builder.set_accept(id, None);
                }
                queue.push(target);
                id
            });
            match byte {
                Some(byte) => builder.add_arc(from, byte, to),
                None => builder.set_rho(from, to),
            }
        }
    }

    builder.finish()
}

/// NFA step on `byte` (`None` = any byte not in the explicit alphabet).
fn step(symbols: &[Symbol], set: &BTreeSet<usize>, byte: Option<u8>) -> BTreeSet<usize> {
    let mut out = BTreeSet::new();
    for &pos in set {
        match symbols.get(pos) {
            Some(Symbol::Literal(b)) if byte == Some(*b) => {
                out.insert(pos + 1);
            }
            Some(Symbol::AnyByte) => {
                out.insert(pos + 1);
            }
            Some(Symbol::AnyRun) => {
                out.insert(pos);
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(wildcard_kind(b"foo"), WildcardKind::Term);
        assert_eq!(wildcard_kind(b"\\%foo"), WildcardKind::Term);
        assert_eq!(wildcard_kind(b"%"), WildcardKind::MatchAll);
        assert_eq!(wildcard_kind(b"%%"), WildcardKind::MatchAll);
        assert_eq!(wildcard_kind(b"foo%"), WildcardKind::Prefix);
        assert_eq!(wildcard_kind(b"%foo"), WildcardKind::Wildcard);
        assert_eq!(wildcard_kind(b"fo_o"), WildcardKind::Wildcard);
        assert_eq!(wildcard_kind(b"f%o%"), WildcardKind::Wildcard);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(b"\\%foo"), b"%foo".to_vec());
        assert_eq!(unescape(b"a\\\\b"), b"a\\b".to_vec());
    }

    #[test]
    fn test_prefix_bytes() {
        assert_eq!(prefix_bytes(b"foo%"), b"foo".to_vec());
        assert_eq!(prefix_bytes(b"\\_x%"), b"_x".to_vec());
    }

    #[test]
    fn test_trailing_percent() {
        let acceptor = wildcard_acceptor(b"foo%");
        assert!(acceptor.accepts(b"foo"));
        assert!(acceptor.accepts(b"foobar"));
        assert!(!acceptor.accepts(b"foa"));
        assert!(!acceptor.accepts(b"fo"));
        assert!(acceptor.validate());
    }

    #[test]
    fn test_leading_percent() {
        let acceptor = wildcard_acceptor(b"%foo");
        assert!(acceptor.accepts(b"foo"));
        assert!(acceptor.accepts(b"bfoo"));
        assert!(acceptor.accepts(b"foofoo"));
        assert!(!acceptor.accepts(b"foobar"));
    }

    #[test]
    fn test_any_byte() {
        let acceptor = wildcard_acceptor(b"a%bce_d");
        assert!(acceptor.accepts(b"azbce1d"));
        assert!(!acceptor.accepts(b"azbce1d1"));
        assert!(!acceptor.accepts(b"azbce11d"));
    }

    #[test]
    fn test_escape_matches_literal() {
        let acceptor = wildcard_acceptor(b"a\\%b");
        assert!(acceptor.accepts(b"a%b"));
        assert!(!acceptor.accepts(b"axb"));
        assert!(!acceptor.accepts(b"ab"));
    }

    #[test]
    fn test_interleaved_runs() {
        let acceptor = wildcard_acceptor(b"f%o%");
        assert!(acceptor.accepts(b"fo"));
        assert!(acceptor.accepts(b"fxxoyy"));
        assert!(!acceptor.accepts(b"f"));
        assert!(!acceptor.accepts(b"xfo"));
    }

    #[test]
    fn test_empty_pattern() {
        let acceptor = wildcard_acceptor(b"");
        assert!(acceptor.accepts(b""));
        assert!(!acceptor.accepts(b"a"));
    }
}

//! Route prefix index.
//!
//! Built once per snapshot: route records grouped by upper-cased route-number
//! token, with directions filtered down to those that actually have a stop
//! sequence. The upstream dataset sometimes carries schedule entries with no
//! operable stops; those never make it into this index, so search results and
//! the smart keyboard can trust every entry they see.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::iter::Peekable;

use serde::Serialize;

use crate::domain::{Company, Direction};
use crate::snapshot::Snapshot;

/// One stop-backed direction of a route-company pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectionSummary {
    pub direction: Direction,
    pub route_id: String,
    pub origin: String,
    pub destination: String,
    pub stop_count: usize,
}

/// One route-company pair matching a search, with its usable directions.
///
/// Directions are never empty: a pair whose every direction lacks stop data
/// is omitted from the index entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMatch {
    pub route_number: String,
    pub company: Company,
    pub directions: Vec<DirectionSummary>,
}

/// Prefix-searchable route index over one snapshot.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    /// Upper-cased route-number token → matches, companies sorted.
    tokens: BTreeMap<String, Vec<RouteMatch>>,
}

impl PrefixIndex {
    /// Group a snapshot's routes by token, dropping directions without stops.
    pub fn build(snapshot: &Snapshot) -> Self {
        let mut grouped: BTreeMap<String, BTreeMap<Company, RouteMatch>> = BTreeMap::new();

        for (route_id, record) in &snapshot.routes {
            if !snapshot.has_stops(route_id) {
                continue;
            }
            let token = record.number.to_ascii_uppercase();
            let entry = grouped
                .entry(token)
                .or_default()
                .entry(record.company)
                .or_insert_with(|| RouteMatch {
                    route_number: record.number.clone(),
                    company: record.company,
                    directions: Vec::new(),
                });
            entry.directions.push(DirectionSummary {
                direction: record.direction,
                route_id: route_id.clone(),
                origin: record.origin_local.clone(),
                destination: record.dest_local.clone(),
                stop_count: snapshot.stops_on_route(route_id).len(),
            });
        }

        let tokens = grouped
            .into_iter()
            .map(|(token, by_company)| {
                let matches = by_company
                    .into_values()
                    .map(|mut m| {
                        m.directions.sort_by_key(|d| d.direction);
                        m
                    })
                    .collect();
                (token, matches)
            })
            .collect();

        PrefixIndex { tokens }
    }

    /// Every route-company match whose token starts with `prefix`,
    /// case-insensitively, in natural route-number order then company order.
    pub fn search(&self, prefix: &str) -> Vec<RouteMatch> {
        let prefix = prefix.trim().to_ascii_uppercase();
        let mut results: Vec<RouteMatch> = self
            .matching_tokens(&prefix)
            .flat_map(|(_, matches)| matches.iter().cloned())
            .collect();
        results.sort_by(|a, b| {
            natural_cmp(&a.route_number, &b.route_number)
                .then_with(|| a.company.as_str().cmp(b.company.as_str()))
        });
        results
    }

    /// Characters that can follow `input` on the way to a complete,
    /// stop-backed route number.
    pub fn possible_next_characters(&self, input: &str) -> BTreeSet<char> {
        let input = input.trim().to_ascii_uppercase();
        let position = input.chars().count();
        self.matching_tokens(&input)
            .filter_map(|(token, _)| token.chars().nth(position))
            .collect()
    }

    /// Whether `token` is a complete route number in the index.
    pub fn contains_token(&self, token: &str) -> bool {
        self.tokens.contains_key(&token.trim().to_ascii_uppercase())
    }

    /// Number of distinct route-number tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    fn matching_tokens<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Vec<RouteMatch>)> {
        self.tokens
            .range(prefix.to_string()..)
            .take_while(move |(token, _)| token.starts_with(prefix))
    }
}

/// Natural (alphanumeric) route-number ordering: digit runs compare as
/// numbers, everything else as case-insensitive characters. "2" sorts before
/// "10", and "A2" before "A11".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = take_digit_run(&mut ca);
                let run_b = take_digit_run(&mut cb);
                match cmp_digit_runs(&run_a, &run_b) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                match x.to_ascii_uppercase().cmp(&y.to_ascii_uppercase()) {
                    Ordering::Equal => {
                        ca.next();
                        cb.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

fn take_digit_run(chars: &mut Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

/// Compare two digit runs numerically; ties broken so that runs differing
/// only in leading zeros still order deterministically.
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let stripped_a = a.trim_start_matches('0');
    let stripped_b = b.trim_start_matches('0');
    stripped_a
        .len()
        .cmp(&stripped_b.len())
        .then_with(|| stripped_a.cmp(stripped_b))
        .then_with(|| a.len().cmp(&b.len()))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Natural ordering is a total order consistent with equality
        #[test]
        fn antisymmetric(a in "[A-Z0-9]{1,5}", b in "[A-Z0-9]{1,5}") {
            let ab = natural_cmp(&a, &b);
            let ba = natural_cmp(&b, &a);
            prop_assert_eq!(ab, ba.reverse());
        }

        /// Plain numbers order like integers
        #[test]
        fn numbers_order_numerically(a in 1u32..9999, b in 1u32..9999) {
            let ord = natural_cmp(&a.to_string(), &b.to_string());
            prop_assert_eq!(ord, a.cmp(&b));
        }
    }
}

//! Outcome-space composer - flattening and unflattening
//!
//! Turns a sequence of per-thread outcome spaces into one Cartesian
//! product and back, with matching slicing over value tuples. Flatten
//! and unflatten are exact inverses for both spaces and outcomes.

use crate::error::CoreError;
use crate::outcome::{CartesianSpace, Issue, Outcome, OutcomeSpace};

/// Controls how issue names are disambiguated when spaces are merged
#[derive(Clone, Copy, Debug, Default)]
pub struct NamingOptions {
    /// Suffix each issue name with its source-thread index
    pub index_suffix: bool,
    /// Prefix each issue name with its source space name
    pub space_prefix: bool,
}

impl NamingOptions {
    /// Both prefix and suffix, guaranteeing collision-free names
    pub fn full() -> Self {
        Self {
            index_suffix: true,
            space_prefix: true,
        }
    }
}

fn compose_name(naming: NamingOptions, index: usize, space: &str, issue: &str) -> String {
    let mut name = issue.to_string();
    if naming.space_prefix && !space.is_empty() {
        name = format!("{space}:{name}");
    }
    if naming.index_suffix {
        name = format!("{name}:{index}");
    }
    name
}

/// Concatenate the issues of all spaces, in input order, into one product space.
///
/// Returns the flat space together with the number of issues each input
/// contributed. An enumerated space is expressible as a single issue only
/// when every listed outcome carries exactly one value; anything else is a
/// `CompositionError`.
pub fn flatten_spaces(
    spaces: &[OutcomeSpace],
    naming: NamingOptions,
) -> Result<(CartesianSpace, Vec<usize>), CoreError> {
    let mut issues = Vec::new();
    let mut counts = Vec::with_capacity(spaces.len());
    for (index, space) in spaces.iter().enumerate() {
        match space {
            OutcomeSpace::Cartesian(s) => {
                for issue in &s.issues {
                    issues.push(Issue::new(
                        compose_name(naming, index, &s.name, &issue.name),
                        issue.values.clone(),
                    ));
                }
                counts.push(s.issues.len());
            }
            OutcomeSpace::Enumerated(s) => {
                let values = s
                    .outcomes
                    .iter()
                    .map(|o| match o.as_slice() {
                        [single] => Ok(single.clone()),
                        _ => Err(CoreError::Composition(format!(
                            "enumerated space '{}' lists an outcome with {} values",
                            s.name,
                            o.len()
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                issues.push(Issue::new(compose_name(naming, index, "", &s.name), values));
                counts.push(1);
            }
        }
    }
    Ok((CartesianSpace::new("product", issues), counts))
}

/// Distribute a flat space's issues back into per-thread spaces.
pub fn unflatten_spaces(
    space: &CartesianSpace,
    counts: &[usize],
) -> Result<Vec<CartesianSpace>, CoreError> {
    let total: usize = counts.iter().sum();
    if total != space.issues.len() {
        return Err(CoreError::Composition(format!(
            "issue counts sum to {total} but the space has {} issues",
            space.issues.len()
        )));
    }
    let mut parts = Vec::with_capacity(counts.len());
    let mut begin = 0;
    for &count in counts {
        parts.push(CartesianSpace::new(
            format!("os{begin}"),
            space.issues[begin..begin + count].to_vec(),
        ));
        begin += count;
    }
    Ok(parts)
}

/// Concatenate per-thread outcomes into one flat value tuple.
pub fn flatten_outcome(parts: &[Outcome]) -> Outcome {
    parts.iter().flatten().cloned().collect()
}

/// Slice a flat value tuple back into per-thread outcomes.
pub fn unflatten_outcome(outcome: &Outcome, counts: &[usize]) -> Result<Vec<Outcome>, CoreError> {
    let total: usize = counts.iter().sum();
    if total != outcome.len() {
        return Err(CoreError::Composition(format!(
            "issue counts sum to {total} but the outcome has {} values",
            outcome.len()
        )));
    }
    let mut parts = Vec::with_capacity(counts.len());
    let mut begin = 0;
    for &count in counts {
        parts.push(outcome[begin..begin + count].to_vec());
        begin += count;
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{EnumeratedSpace, Value};

    fn spaces_fixture() -> Vec<OutcomeSpace> {
        vec![
            OutcomeSpace::cartesian(
                "travel",
                vec![
                    Issue::new("day", vec![Value::Int(1), Value::Int(2)]),
                    Issue::new("mode", vec!["car".into(), "train".into()]),
                ],
            ),
            OutcomeSpace::cartesian(
                "hotel",
                vec![Issue::new("stars", vec![Value::Int(3), Value::Int(4)])],
            ),
        ]
    }

    #[test]
    fn test_flatten_counts_and_order() {
        let spaces = spaces_fixture();
        let (flat, counts) = flatten_spaces(&spaces, NamingOptions::default()).unwrap();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(flat.n_issues(), 3);
        assert_eq!(flat.issues[0].name, "day");
        assert_eq!(flat.issues[2].name, "stars");
    }

    #[test]
    fn test_flatten_naming_options() {
        let spaces = spaces_fixture();
        let (flat, _) = flatten_spaces(&spaces, NamingOptions::full()).unwrap();
        assert_eq!(flat.issues[0].name, "travel:day:0");
        assert_eq!(flat.issues[2].name, "hotel:stars:1");
    }

    #[test]
    fn test_space_round_trip() {
        let spaces = spaces_fixture();
        let (flat, counts) = flatten_spaces(&spaces, NamingOptions::default()).unwrap();
        let parts = unflatten_spaces(&flat, &counts).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].n_issues(), 2);
        assert_eq!(parts[1].n_issues(), 1);
        for (part, original) in parts.iter().zip(&spaces) {
            let OutcomeSpace::Cartesian(original) = original else {
                panic!("fixture is cartesian");
            };
            for (a, b) in part.issues.iter().zip(&original.issues) {
                assert_eq!(a.values, b.values);
            }
        }
    }

    #[test]
    fn test_outcome_round_trip_whole_product() {
        let spaces = spaces_fixture();
        let (flat, counts) = flatten_spaces(&spaces, NamingOptions::default()).unwrap();
        // every outcome of the product space survives the round trip
        for outcome in flat.outcomes() {
            let parts = unflatten_outcome(&outcome, &counts).unwrap();
            assert_eq!(flatten_outcome(&parts), outcome);
        }
    }

    #[test]
    fn test_unflatten_rejects_bad_counts() {
        let spaces = spaces_fixture();
        let (flat, _) = flatten_spaces(&spaces, NamingOptions::default()).unwrap();
        assert!(unflatten_spaces(&flat, &[1, 1]).is_err());
        assert!(unflatten_outcome(&vec!["a".into()], &[2]).is_err());
    }

    #[test]
    fn test_single_valued_enumerated_space_flattens() {
        let spaces = vec![OutcomeSpace::Enumerated(EnumeratedSpace::new(
            "listed",
            vec![vec!["a".into()], vec!["b".into()]],
        ))];
        let (flat, counts) = flatten_spaces(&spaces, NamingOptions::default()).unwrap();
        assert_eq!(counts, vec![1]);
        assert_eq!(flat.issues[0].values.len(), 2);
    }

    #[test]
    fn test_multi_valued_enumerated_space_fails() {
        let spaces = vec![OutcomeSpace::Enumerated(EnumeratedSpace::new(
            "listed",
            vec![vec!["a".into(), "b".into()]],
        ))];
        let err = flatten_spaces(&spaces, NamingOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::Composition(_)));
    }
}

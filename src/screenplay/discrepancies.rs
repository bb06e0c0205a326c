//! Differences between two projects.
//!
//! Used to compare the breakdowns of two versions of a screenplay, or the
//! breakdown of a screenplay against a reference. Only the direct children of
//! the projects are compared, as multisets.

use crate::screenplay::project::{Project, ProjectChild, Sequence};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDiscrepancies {
    /// Children of the right project absent from the left one
    pub left_missing: Vec<ProjectChild>,
    /// Children of the left project absent from the right one
    pub right_missing: Vec<ProjectChild>,
    /// Sequences present on both sides under one name but with another casting,
    /// as `(left, right)` pairs
    pub differing_sequences: Vec<(Sequence, Sequence)>,
}

impl ProjectDiscrepancies {
    pub fn analyze(left: &Project, right: &Project) -> Self {
        let left_counts = count_children(left);
        let right_counts = count_children(right);

        let mut left_missing = surplus(&right_counts, &left_counts);
        let mut right_missing = surplus(&left_counts, &right_counts);

        // A sequence missing on both sides under the same name only differs by its casting.
        let mut differing_sequences = Vec::new();
        right_missing.retain(|left_child| {
            let ProjectChild::Sequence(left_sequence) = left_child else {
                return true;
            };
            let twin = left_missing.iter().position(|right_child| {
                matches!(right_child, ProjectChild::Sequence(s) if s.name == left_sequence.name)
            });
            match twin {
                Some(idx) => {
                    if let ProjectChild::Sequence(right_sequence) = left_missing.remove(idx) {
                        differing_sequences.push((left_sequence.clone(), right_sequence));
                    }
                    false
                }
                None => true,
            }
        });

        ProjectDiscrepancies {
            left_missing,
            right_missing,
            differing_sequences,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left_missing.is_empty()
            && self.right_missing.is_empty()
            && self.differing_sequences.is_empty()
    }

    /// Text report, sorted by entity type then name.
    pub fn report(&self) -> String {
        let mut report = String::new();
        push_missing(&mut report, "Missing in left Project:", &self.left_missing);
        push_missing(&mut report, "Missing in right Project:", &self.right_missing);
        if !self.differing_sequences.is_empty() {
            report.push_str("Differing Children:\n");
            for (left, right) in &self.differing_sequences {
                report.push_str(&format!("- {} in left Project contains:\n", left));
                for asset in &left.assets {
                    report.push_str(&format!("    - {}\n", asset));
                }
                report.push_str(&format!("  while {} in right Project contains:\n", right));
                for asset in &right.assets {
                    report.push_str(&format!("    - {}\n", asset));
                }
            }
        }
        report
    }
}

impl fmt::Display for ProjectDiscrepancies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report())
    }
}

fn count_children(project: &Project) -> BTreeMap<&ProjectChild, usize> {
    let mut counts = BTreeMap::new();
    for child in project.children() {
        *counts.entry(child).or_insert(0) += 1;
    }
    counts
}

/// Distinct children counted more often in `more` than in `fewer`
fn surplus(
    more: &BTreeMap<&ProjectChild, usize>,
    fewer: &BTreeMap<&ProjectChild, usize>,
) -> Vec<ProjectChild> {
    more.iter()
        .filter(|(child, count)| fewer.get(*child).copied().unwrap_or(0) < **count)
        .map(|(child, _)| (*child).clone())
        .collect()
}

fn push_missing(report: &mut String, title: &str, children: &[ProjectChild]) {
    if children.is_empty() {
        return;
    }
    let mut sorted: Vec<&ProjectChild> = children.iter().collect();
    sorted.sort_by(|a, b| (a.type_name(), a.name()).cmp(&(b.type_name(), b.name())));
    report.push_str(title);
    report.push('\n');
    for child in sorted {
        report.push_str(&format!("- {}\n", child));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screenplay::project::Asset;

    fn project(sequences: Vec<Sequence>) -> Project {
        let mut project = Project::new("script");
        for sequence in sequences {
            project.add_sequence(sequence);
        }
        project
    }

    #[test]
    fn test_identical_projects() {
        let left = project(vec![
            Sequence::new("0010").with_assets([Asset::character("BOB")])
        ]);
        let discrepancies = ProjectDiscrepancies::analyze(&left, &left.clone());
        assert!(discrepancies.is_empty());
        assert_eq!(discrepancies.report(), "");
    }

    #[test]
    fn test_missing_children() {
        let left = project(vec![
            Sequence::new("0010").with_assets([Asset::character("BOB")]),
            Sequence::new("0020"),
        ]);
        let right = project(vec![Sequence::new("0010")
            .with_assets([Asset::character("BOB"), Asset::character("ALICE")])]);

        let discrepancies = ProjectDiscrepancies::analyze(&left, &right);
        assert_eq!(
            discrepancies.left_missing,
            vec![ProjectChild::Asset(Asset::character("ALICE"))]
        );
        assert_eq!(
            discrepancies.right_missing,
            vec![ProjectChild::Sequence(Sequence::new("0020"))]
        );
        assert_eq!(discrepancies.differing_sequences.len(), 1);

        assert_eq!(
            discrepancies.report(),
            "\
Missing in left Project:
- Asset(ALICE -- character)
Missing in right Project:
- Sequence(0020)
Differing Children:
- Sequence(0010) in left Project contains:
    - Asset(BOB -- character)
  while Sequence(0010) in right Project contains:
    - Asset(ALICE -- character)
    - Asset(BOB -- character)
"
        );
    }

    #[test]
    fn test_asset_type_mismatch_is_missing_on_both_sides() {
        let mut left = Project::new("script");
        left.add_asset(Asset::character("LAMP"));
        let mut right = Project::new("script");
        right.add_asset(Asset::undefined("LAMP"));

        let discrepancies = ProjectDiscrepancies::analyze(&left, &right);
        assert_eq!(
            discrepancies.left_missing,
            vec![ProjectChild::Asset(Asset::undefined("LAMP"))]
        );
        assert_eq!(
            discrepancies.right_missing,
            vec![ProjectChild::Asset(Asset::character("LAMP"))]
        );
        assert!(discrepancies.differing_sequences.is_empty());
    }
}

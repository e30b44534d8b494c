//! Line-based diff and three-way merge used by the application workflow.
//!
//! The engine only ever reports diffs and merge plans; it never edits the
//! caller's files, so a small LCS-based implementation is enough.

/// One contiguous edit relative to the old text: lines
/// `old_start..old_start + removed.len()` are replaced with `added`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    old_start: usize,
    removed: Vec<String>,
    added: Vec<String>,
}

/// Unified-style diff of `old` against `new`, labeled with `path`.
pub fn unified(path: &str, old: &str, new: &str) -> String {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let edits = edit_script(&old_lines, &new_lines);
    if edits.is_empty() {
        return String::new();
    }

    let mut out = format!("--- {path}\n+++ {path}\n");
    let mut new_offset: isize = 0;
    for edit in &edits {
        let old_pos = edit.old_start + 1;
        let new_pos = (edit.old_start as isize + new_offset) + 1;
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_pos,
            edit.removed.len(),
            new_pos,
            edit.added.len()
        ));
        for line in &edit.removed {
            out.push_str(&format!("-{line}\n"));
        }
        for line in &edit.added {
            out.push_str(&format!("+{line}\n"));
        }
        new_offset += edit.added.len() as isize - edit.removed.len() as isize;
    }
    out
}

/// Outcome of a three-way merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    Clean(String),
    Conflicted { merged: String, conflicts: usize },
}

/// Reconcile `local` and `incoming` against their common `base`.
///
/// Edits touching disjoint base regions combine; overlapping, non-identical
/// edits become conflict-marker blocks in the merged candidate.
pub fn three_way(base: &str, local: &str, incoming: &str) -> MergeOutcome {
    if local == base {
        return MergeOutcome::Clean(incoming.to_string());
    }
    if incoming == base || local == incoming {
        return MergeOutcome::Clean(local.to_string());
    }

    let base_lines = split_lines(base);
    let local_edits = edit_script(&base_lines, &split_lines(local));
    let incoming_edits = edit_script(&base_lines, &split_lines(incoming));

    let mut merged: Vec<String> = Vec::new();
    let mut conflicts = 0usize;
    let mut cursor = 0usize;
    let mut local_iter = local_edits.into_iter().peekable();
    let mut incoming_iter = incoming_edits.into_iter().peekable();

    while local_iter.peek().is_some() || incoming_iter.peek().is_some() {
        let next_local = local_iter.peek().map(|edit| edit.old_start);
        let next_incoming = incoming_iter.peek().map(|edit| edit.old_start);

        let (edit, other) = match (next_local, next_incoming) {
            (Some(l), Some(i)) => {
                let local_first = l <= i;
                let first = if local_first {
                    local_iter.next()
                } else {
                    incoming_iter.next()
                };
                let Some(first) = first else { break };
                let overlapping = {
                    let other_peek = if local_first {
                        incoming_iter.peek()
                    } else {
                        local_iter.peek()
                    };
                    other_peek.is_some_and(|other| overlaps(&first, other))
                };
                if overlapping {
                    let second = if local_first {
                        incoming_iter.next()
                    } else {
                        local_iter.next()
                    };
                    (first, second)
                } else {
                    (first, None)
                }
            }
            (Some(_), None) => match local_iter.next() {
                Some(edit) => (edit, None),
                None => break,
            },
            (None, Some(_)) => match incoming_iter.next() {
                Some(edit) => (edit, None),
                None => break,
            },
            (None, None) => break,
        };

        // Unchanged base lines up to the edit region.
        while cursor < edit.old_start.min(base_lines.len()) {
            merged.push(base_lines[cursor].clone());
            cursor += 1;
        }

        match other {
            None => {
                merged.extend(edit.added.iter().cloned());
                cursor += edit.removed.len();
            }
            Some(other) => {
                let end = (edit.old_start + edit.removed.len())
                    .max(other.old_start + other.removed.len());
                if edit.added == other.added && edit.removed == other.removed {
                    merged.extend(edit.added.iter().cloned());
                } else {
                    let (local_side, incoming_side) = if next_local <= next_incoming {
                        (&edit, &other)
                    } else {
                        (&other, &edit)
                    };
                    merged.push("<<<<<<< local".to_string());
                    merged.extend(local_side.added.iter().cloned());
                    merged.push("=======".to_string());
                    merged.extend(incoming_side.added.iter().cloned());
                    merged.push(">>>>>>> incoming".to_string());
                    conflicts += 1;
                }
                cursor = end.min(base_lines.len()).max(cursor);
            }
        }
    }

    while cursor < base_lines.len() {
        merged.push(base_lines[cursor].clone());
        cursor += 1;
    }

    let mut text = merged.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    if conflicts == 0 {
        MergeOutcome::Clean(text)
    } else {
        MergeOutcome::Conflicted {
            merged: text,
            conflicts,
        }
    }
}

fn overlaps(a: &Edit, b: &Edit) -> bool {
    let a_end = a.old_start + a.removed.len().max(1);
    let b_end = b.old_start + b.removed.len().max(1);
    a.old_start < b_end && b.old_start < a_end
}

fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().map(str::to_string).collect()
}

/// Minimal edit script between two line vectors via LCS.
fn edit_script(old: &[String], new: &[String]) -> Vec<Edit> {
    let lcs = lcs_table(old, new);
    let mut edits = Vec::new();
    let mut i = 0usize;
    let mut j = 0usize;
    let mut pending: Option<Edit> = None;

    while i < old.len() || j < new.len() {
        if i < old.len() && j < new.len() && old[i] == new[j] {
            if let Some(edit) = pending.take() {
                edits.push(edit);
            }
            i += 1;
            j += 1;
            continue;
        }
        let edit = pending.get_or_insert_with(|| Edit {
            old_start: i,
            removed: Vec::new(),
            added: Vec::new(),
        });
        if j < new.len() && (i >= old.len() || lcs[i][j + 1] >= lcs[i + 1][j]) {
            edit.added.push(new[j].clone());
            j += 1;
        } else {
            edit.removed.push(old[i].clone());
            i += 1;
        }
    }
    if let Some(edit) = pending.take() {
        edits.push(edit);
    }
    edits
}

fn lcs_table(old: &[String], new: &[String]) -> Vec<Vec<usize>> {
    let mut table = vec![vec![0usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            table[i][j] = if old[i] == new[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_produce_empty_diff() {
        assert_eq!(unified("a.txt", "one\ntwo\n", "one\ntwo\n"), "");
    }

    #[test]
    fn unified_reports_replaced_lines() {
        let diff = unified("a.txt", "one\ntwo\nthree\n", "one\nTWO\nthree\n");
        assert!(diff.contains("--- a.txt"));
        assert!(diff.contains("-two"));
        assert!(diff.contains("+TWO"));
    }

    #[test]
    fn three_way_takes_the_only_changed_side() {
        let base = "a\nb\nc\n";
        assert_eq!(
            three_way(base, base, "a\nB\nc\n"),
            MergeOutcome::Clean("a\nB\nc\n".to_string())
        );
        assert_eq!(
            three_way(base, "a\nB\nc\n", base),
            MergeOutcome::Clean("a\nB\nc\n".to_string())
        );
    }

    #[test]
    fn disjoint_edits_merge_cleanly() {
        let base = "a\nb\nc\nd\ne\n";
        let local = "A\nb\nc\nd\ne\n";
        let incoming = "a\nb\nc\nd\nE\n";
        match three_way(base, local, incoming) {
            MergeOutcome::Clean(text) => assert_eq!(text, "A\nb\nc\nd\nE\n"),
            other => panic!("expected clean merge, got {other:?}"),
        }
    }

    #[test]
    fn overlapping_edits_conflict_with_markers() {
        let base = "a\nb\nc\n";
        let local = "a\nLOCAL\nc\n";
        let incoming = "a\nINCOMING\nc\n";
        match three_way(base, local, incoming) {
            MergeOutcome::Conflicted { merged, conflicts } => {
                assert_eq!(conflicts, 1);
                assert!(merged.contains("<<<<<<< local"));
                assert!(merged.contains("LOCAL"));
                assert!(merged.contains("INCOMING"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn identical_edits_on_both_sides_merge_once() {
        let base = "a\nb\nc\n";
        let both = "a\nX\nc\n";
        assert_eq!(
            three_way(base, both, both),
            MergeOutcome::Clean(both.to_string())
        );
    }
}

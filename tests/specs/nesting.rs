//! Nesting specs
//!
//! Undo order is the reverse of do order at every depth.

use crate::prelude::*;
use proptest::prelude::*;
use similar_asserts::assert_eq;

#[test]
fn parent_undoes_children_in_reverse_then_itself() {
    let journal = Journal::new();
    let step = step(&journal);
    let a = {
        let journal = journal.clone();
        define(move |_: ()| {
            journal.push("do a");
            step.call("b".to_string())?;
            step.call("c".to_string())?;
            let journal = journal.clone();
            Ok::<_, Infallible>(Outcome::new(()).undo(move || journal.push("undo a")))
        })
    };

    let call = a.perform(()).unwrap();
    call.undo();

    assert_eq!(
        journal.entries(),
        entries(&["do a", "do b", "do c", "undo c", "undo b", "undo a"])
    );
}

#[test]
fn sibling_calls_outside_a_scope_are_independent() {
    let journal = Journal::new();
    let step = step(&journal);

    let first = step.perform("first".to_string()).unwrap();
    let second = step.perform("second".to_string()).unwrap();
    journal.drain();
    first.undo();

    assert_eq!(journal.drain(), entries(&["undo first"]));
    assert!(!second.undone());
}

#[test]
fn failed_child_leaves_no_undo_in_parent() {
    let journal = Journal::new();
    let step = step(&journal);
    let failing = {
        let step = step.clone();
        reversible(move |_: ()| -> Result<(), &'static str> {
            step.call("inside failure".to_string())
                .map_err(|never| -> &'static str { match never {} })?;
            Err("failed")
        })
    };
    let parent = reversible(move |_: ()| {
        let failure = failing.call(());
        step.call("after".to_string())
            .map_err(|never| -> &'static str { match never {} })?;
        Ok::<_, &'static str>(failure)
    });

    let call = parent.perform(()).unwrap();
    assert_eq!(call.result, Err("failed"));
    journal.drain();
    call.undo();

    assert_eq!(journal.drain(), entries(&["undo after"]));
}

/// Build a two-level tree from `groups`: the top call runs one composite per
/// group and each composite runs one step per label
fn tree(journal: &Journal, groups: Vec<Vec<u8>>) -> Vec<String> {
    let step = step(journal);
    let group = reversible(move |labels: Vec<u8>| {
        for label in labels {
            step.call(label.to_string())?;
        }
        Ok::<_, Infallible>(())
    });
    let top = reversible(move |groups: Vec<Vec<u8>>| {
        for labels in groups {
            group.call(labels)?;
        }
        Ok::<_, Infallible>(())
    });

    let call = top.perform(groups).unwrap();
    let done = journal.drain();
    call.undo();
    let undone = journal.drain();

    let mut expected: Vec<String> = done
        .iter()
        .map(|entry| entry.replacen("do ", "undo ", 1))
        .collect();
    expected.reverse();
    assert_eq!(undone, expected);
    done
}

proptest! {
    #[test]
    fn undo_is_reverse_of_do(groups in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..4), 0..5)) {
        let journal = Journal::new();
        let expected_do: Vec<String> = groups
            .iter()
            .flatten()
            .map(|label| format!("do {label}"))
            .collect();

        let done = tree(&journal, groups);

        prop_assert_eq!(done, expected_do);
    }
}

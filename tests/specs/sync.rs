//! Synchronous call specs
//!
//! Plain calls behave like ordinary functions; `perform` hands back an
//! idempotent undo.

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn joined_arguments_end_to_end() {
    let join = define(|args: Vec<&'static str>| {
        Ok::<_, Infallible>(Outcome::new(args.join(",")).undo(|| {}))
    });

    assert_eq!(join.call(vec!["x", "y"]).unwrap(), "x,y".to_string());

    let call = join.perform(vec!["x", "y"]).unwrap();
    assert_eq!(call.result.as_str(), "x,y");
    call.undo();
    call.undo();
    assert!(call.undone());
}

#[test]
fn undone_flag_and_single_invocation() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counted = {
        let runs = Arc::clone(&runs);
        define(move |_: ()| {
            let runs = Arc::clone(&runs);
            Ok::<_, Infallible>(Outcome::new(()).undo(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            }))
        })
    };

    let call = counted.perform(()).unwrap();
    assert!(!call.undone());
    for _ in 0..3 {
        call.undo();
    }

    assert!(call.undone());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn plain_call_runs_effects_without_undo() {
    let journal = Journal::new();
    let step = step(&journal);
    let outer = reversible(move |label: String| step.call(label));

    assert_eq!(outer.call("plain".to_string()).unwrap(), "plain".to_string());
    let call = outer.perform("explicit".to_string()).unwrap();
    call.undo();

    assert_eq!(
        journal.entries(),
        entries(&["do plain", "do explicit", "undo explicit"])
    );
}

#[test]
fn errors_pass_through_unchanged() {
    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("refused {0}")]
    struct Refused(u32);

    let picky = define(|n: u32| {
        if n % 2 == 1 {
            return Err(Refused(n));
        }
        Ok(Outcome::new(n / 2))
    });

    assert_eq!(picky.call(4), Ok(2));
    assert_eq!(picky.perform(3).unwrap_err(), Refused(3));
    assert_eq!(picky.call(3).unwrap_err().to_string(), "refused 3".to_string());
    assert!(!rev_core::is_tracking());
}

#[test]
fn receiver_is_passed_like_an_argument() {
    struct Account {
        balance: Mutex<i64>,
    }

    let deposit = define(|(this, amount): (Arc<Account>, i64)| {
        *this.balance.lock().unwrap() += amount;
        let undo_target = Arc::clone(&this);
        Ok::<_, Infallible>(
            Outcome::new(this).undo(move || *undo_target.balance.lock().unwrap() -= amount),
        )
    });
    let account = Arc::new(Account {
        balance: Mutex::new(0),
    });

    let returned = deposit.call((Arc::clone(&account), 10)).unwrap();
    assert!(Arc::ptr_eq(&returned, &account));
    let call = deposit.perform((Arc::clone(&account), 5)).unwrap();
    assert!(Arc::ptr_eq(&call.result, &account));
    assert_eq!(*account.balance.lock().unwrap(), 15);

    call.undo();

    assert_eq!(*account.balance.lock().unwrap(), 10);
}

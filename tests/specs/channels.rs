//! Side-channel specs
//!
//! Registered channels are collected across a call tree in call order.

use crate::prelude::*;
use rev_core::{is_registered, register, Channel, ChannelError, UndoChannel, RESULT, UNDO};
use similar_asserts::assert_eq;

/// Collects every contributed number
struct Collect;

impl Channel for Collect {
    type Value = Vec<u64>;
    type Bucket = Vec<u64>;
    type Exposed = Vec<u64>;

    fn bucket(&self) -> Vec<u64> {
        Vec::new()
    }

    fn add(&self, bucket: &mut Vec<u64>, value: Vec<u64>) {
        bucket.extend(value);
    }

    fn combine(&self, bucket: Vec<u64>) -> Vec<u64> {
        bucket
    }

    fn transform(&self, combined: Vec<u64>) -> Vec<u64> {
        combined
    }
}

/// Keeps the largest contribution, exposed as text
struct Peak;

impl Channel for Peak {
    type Value = u64;
    type Bucket = u64;
    type Exposed = String;

    fn bucket(&self) -> u64 {
        0
    }

    fn add(&self, bucket: &mut u64, value: u64) {
        *bucket = (*bucket).max(value);
    }

    fn combine(&self, bucket: u64) -> u64 {
        bucket
    }

    fn transform(&self, combined: u64) -> String {
        format!("peak {combined}")
    }
}

#[test]
fn foo_channel_collects_in_call_order() {
    register("foo", Collect);
    let tagged = define(|n: u64| Ok::<_, Infallible>(Outcome::new(n + 1).with("foo", vec![n])));
    let parent = define(move |n: u64| {
        tagged.call(23)?;
        tagged.call(55)?;
        tagged.call(n.pow(2))?;
        Ok::<_, Infallible>(Outcome::new(()))
    });

    let call = parent.perform(5).unwrap();

    assert_eq!(call.channel::<Vec<u64>>("foo").unwrap(), &vec![23, 55, 25]);
}

#[test]
fn channels_combine_independently_of_undo() {
    register("peak", Peak);
    let journal = Journal::new();
    let step = step(&journal);
    let measured = define(move |n: u64| {
        step.call(n.to_string())?;
        Ok::<_, Infallible>(Outcome::new(n).with("peak", n))
    });
    let parent = define(move |values: Vec<u64>| {
        for value in &values {
            measured.call(*value)?;
        }
        Ok::<_, Infallible>(Outcome::new(values.len()))
    });

    let call = parent.perform(vec![3, 9, 4]).unwrap();
    assert_eq!(call.channel::<String>("peak").unwrap().as_str(), "peak 9");
    journal.drain();
    call.undo();

    assert_eq!(journal.entries(), entries(&["undo 4", "undo 9", "undo 3"]));
}

#[test]
fn registration_is_first_wins_and_result_is_reserved() {
    assert!(is_registered(UNDO));
    assert!(!register(UNDO, UndoChannel));
    assert!(!register(RESULT, Collect));
    assert!(!is_registered(RESULT));

    register("first-wins", Peak);
    assert!(!register("first-wins", Collect));

    let tagged = define(|n: u64| Ok::<_, Infallible>(Outcome::new(()).with("first-wins", n)));
    let call = tagged.perform(8).unwrap();
    assert_eq!(call.channel::<String>("first-wins").unwrap().as_str(), "peak 8");
}

#[test]
fn untouched_and_unknown_channels_are_absent() {
    register("foo", Collect);
    let quiet = define(|_: ()| {
        Ok::<_, Infallible>(Outcome::new(()).with("never-registered", 1u8))
    });

    let call = quiet.perform(()).unwrap();

    assert_eq!(call.channels().count(), 0);
    assert_eq!(
        call.channel::<Vec<u64>>("foo").unwrap_err(),
        ChannelError::Missing {
            channel: "foo".to_string()
        }
    );
}

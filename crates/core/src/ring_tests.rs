// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn keeps_only_last_capacity_lines() {
    let mut tail = TailBuffer::new(3);
    for i in 1..=5 {
        tail.push(format!("line {i}"));
    }
    assert_eq!(tail.to_vec(), vec!["line 3", "line 4", "line 5"]);
    assert_eq!(tail.len(), 3);
}

#[test]
fn default_capacity_is_twenty() {
    let mut tail = TailBuffer::default();
    for i in 0..25 {
        tail.push(i.to_string());
    }
    assert_eq!(tail.len(), 20);
    assert_eq!(tail.lines().next(), Some("5"));
}

#[test]
fn empty_tail() {
    let tail = TailBuffer::new(4);
    assert!(tail.is_empty());
    assert_eq!(tail.to_vec(), Vec::<String>::new());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn never_exceeds_capacity_and_keeps_newest(
            lines in proptest::collection::vec(".{0,20}", 0..100),
            cap in 1usize..40,
        ) {
            let mut tail = TailBuffer::new(cap);
            for line in &lines {
                tail.push(line.clone());
            }
            prop_assert!(tail.len() <= cap);
            let expected: Vec<String> =
                lines.iter().rev().take(cap).rev().cloned().collect();
            prop_assert_eq!(tail.to_vec(), expected);
        }
    }
}

use screen_fusion::align::anchors::numeric_anchors;
use screen_fusion::align::validator::{AlignmentConfig, AlignmentValidator};

use crate::common::fixtures::{comp, kept_copies, order_rows, order_text, raw_set, texts};

mod common;

// =========================================================================
// Numeric anchors
// =========================================================================

#[test]
fn anchors_need_three_digits() {
    let anchors = numeric_anchors("Flight CA1234 at 09:45, gate 12, fare 1,299");
    let found: Vec<&str> = anchors.iter().map(|s| s.as_str()).collect();
    assert_eq!(found, vec!["1234", "299"]);

    assert!(numeric_anchors("no digits here").is_empty());
    assert!(numeric_anchors("12 34 56").is_empty());
}

// =========================================================================
// No-op cases
// =========================================================================

#[test]
fn aligned_text_is_left_untouched() {
    let raw = order_rows(5);
    let mut components = kept_copies(&raw);
    let before = components.clone();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert!(report.is_noop());
    assert_eq!(components, before);
}

#[test]
fn text_without_anchors_is_left_untouched() {
    let raw = raw_set(vec![
        comp(0, "text", "Home", 0, 0, 10, 10),
        comp(1, "text", "Profile", 0, 50, 10, 10),
        comp(2, "text", "Settings", 0, 100, 10, 10),
    ]);
    let mut components = kept_copies(&raw);
    components[0].text = "Settings".into();
    components[2].text = "Home".into();
    let before = components.clone();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert!(report.is_noop());
    assert_eq!(components, before);
}

#[test]
fn sets_below_minimum_size_are_skipped() {
    let raw = order_rows(2);
    let mut components = kept_copies(&raw);
    components[0].text = order_text(1);
    components[1].text = "Total".into();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert!(report.is_noop());
    assert_eq!(components[0].text, order_text(1));
}

#[test]
fn tie_with_identity_keeps_text() {
    let raw = raw_set(vec![
        comp(0, "text", "No. 111", 0, 0, 10, 10),
        comp(1, "text", "No. 222", 0, 50, 10, 10),
        comp(2, "text", "No. 333", 0, 100, 10, 10),
    ]);
    let mut components = kept_copies(&raw);
    components[1].text = "No. 333".into();
    components[2].text = "footer".into();
    let before = components.clone();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert_eq!(report.shift, 0);
    assert_eq!(components, before);
}

// =========================================================================
// Shift correction
// =========================================================================

#[test]
fn injected_shift_of_one_is_repaired() {
    let raw = order_rows(5);
    let mut components = kept_copies(&raw);
    for i in 0..4 {
        components[i].text = order_text(i + 1);
    }
    components[4].text = "Order total".into();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert_eq!(report.shift, 1);
    assert_eq!(report.window, Some((0, 3)));
    for i in 0..4 {
        assert_eq!(components[i].text, order_text(i), "component {}", i);
        assert_eq!(components[i].text_fix.as_deref(), Some("shift_1"));
    }
    assert_eq!(components[0].text_before_fix.as_deref(), Some("Order #1002"));
    assert_eq!(components[4].text, "Order total");
    assert!(components[4].text_before_fix.is_none());
    assert_eq!(report.fixes.len(), 4);
}

#[test]
fn components_outside_the_window_are_untouched() {
    let raw = order_rows(7);
    let mut components = kept_copies(&raw);
    for i in 2..6 {
        components[i].text = order_text(i + 1);
    }

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert_eq!(report.shift, 1);
    assert_eq!(report.window, Some((2, 5)));
    let expected: Vec<String> = (0..7).map(order_text).collect();
    assert_eq!(texts(&components), expected);
    for i in [0, 1, 6] {
        assert!(components[i].text_before_fix.is_none(), "component {}", i);
        assert!(components[i].text_fix.is_none(), "component {}", i);
    }
}

#[test]
fn negative_shift_recovers_trailing_text_from_ocr() {
    let raw = raw_set({
        let mut rows = vec![comp(0, "text", "Header", 0, 0, 600, 60)];
        rows.extend((1..5).map(|i| comp(i, "text", &order_text(i), 0, 100 * i as i32, 600, 80)));
        rows
    });
    let mut components = kept_copies(&raw);
    // Each row shows the text of the row above it.
    for i in 1..5 {
        components[i].text = raw.components[i - 1].text.clone();
    }

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert_eq!(report.shift, -1);
    assert_eq!(report.window, Some((0, 4)));
    assert_eq!(components[0].text, "Header");
    for i in 1..5 {
        assert_eq!(components[i].text, order_text(i), "component {}", i);
    }
    assert!(report.unverified.is_empty());
}

#[test]
fn boundary_without_ocr_text_is_flagged_unverified() {
    let raw = raw_set({
        let mut rows = vec![comp(0, "icon", "", 0, 0, 60, 60)];
        rows.extend((1..5).map(|i| comp(i, "text", &order_text(i), 0, 100 * i as i32, 600, 80)));
        rows
    });
    let mut components = kept_copies(&raw);
    for i in 0..4 {
        components[i].text = order_text(i + 1);
    }
    components[4].text = "Total".into();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert_eq!(report.shift, 1);
    assert_eq!(report.window, Some((0, 3)));
    assert_eq!(report.unverified, vec![0]);
    assert!(components[0].text_unverified);
    assert_eq!(components[0].text, order_text(1), "unverified text is not guessed");
    for i in 1..4 {
        assert_eq!(components[i].text, order_text(i));
    }
    assert_eq!(components[4].text, "Total");
}

#[test]
fn merged_components_use_their_source_text() {
    let raw = raw_set(vec![
        comp(0, "text", "Flight", 0, 0, 100, 40),
        comp(1, "text", "MU5101", 120, 0, 100, 40),
        comp(2, "text", "Flight", 0, 100, 100, 40),
        comp(3, "text", "MU5102", 120, 100, 100, 40),
        comp(4, "text", "Flight", 0, 200, 100, 40),
        comp(5, "text", "MU5103", 120, 200, 100, 40),
    ]);
    let mut components: Vec<_> = (0..3)
        .map(|row| {
            let mut c = comp(row, "Card", "", 0, 100 * row as i32, 220, 40);
            c.source_indices = vec![2 * row, 2 * row + 1];
            c
        })
        .collect();
    components[0].text = "Flight MU5102".into();
    components[1].text = "Flight MU5103".into();
    components[2].text = "Flight".into();

    let report = AlignmentValidator::default().validate(&mut components, &raw);

    assert_eq!(report.shift, 1);
    assert_eq!(
        texts(&components),
        vec!["Flight MU5101", "Flight MU5102", "Flight"]
    );
}

#[test]
fn custom_shift_candidates_limit_the_search() {
    let raw = order_rows(5);
    let mut components = kept_copies(&raw);
    for i in 0..4 {
        components[i].text = order_text(i + 1);
    }
    components[4].text = "Order total".into();
    let before = components.clone();

    let validator = AlignmentValidator::new(AlignmentConfig {
        shift_candidates: vec![2, -2],
        ..AlignmentConfig::default()
    });
    let report = validator.validate(&mut components, &raw);

    assert_eq!(report.shift, 0);
    assert_eq!(components, before);
}

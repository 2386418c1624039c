//! Property checks for caption timing windows.

use narrator_core::{
    OffsetZone, SegmenterSettings, TimingEstimator, assign_windows, resolve_zones,
    split_for_display,
};

const TEXT: &str = "Votre nombre d'expression révèle vos talents naturels. Il se calcule à partir de toutes les lettres de votre nom complet, voyelles et consonnes réunies. Chaque lettre correspond à un chiffre de un à neuf.";

#[test]
fn windows_partition_the_duration_without_zones() {
    for max in [20, 40, 110] {
        let chunks = split_for_display(TEXT, max, &[]);
        for duration in [0.5, 7.0, 63.25] {
            let windows = assign_windows(&chunks, duration, &[]);
            assert_eq!(windows.len(), chunks.len());
            assert!(windows[0].start.abs() < 1e-9);
            assert!((windows[windows.len() - 1].end - duration).abs() < 1e-9);
            for (i, pair) in windows.windows(2).enumerate() {
                assert_eq!(pair[0].chunk, i);
                assert!(pair[0].start <= pair[0].end);
                assert!((pair[0].end - pair[1].start).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn windows_stay_monotone_and_bounded_with_zones() {
    let chunks = split_for_display(TEXT, 40, &[]);
    let zones = resolve_zones(
        TEXT,
        &[
            OffsetZone::new("early", "Il se calcule", -3.0).until("réunies."),
            OffsetZone::new("late", "Chaque lettre", 2.5),
        ],
    );
    assert_eq!(zones.len(), 2);

    let duration = 12.0;
    let windows = assign_windows(&chunks, duration, &zones);
    assert!(windows[0].start >= 0.0);
    assert!(windows[windows.len() - 1].end <= duration);
    for pair in windows.windows(2) {
        assert!(pair[0].start <= pair[1].start);
        assert!(pair[0].end <= pair[1].end);
    }
}

#[test]
fn estimate_tracks_speaking_rate() {
    let settings = SegmenterSettings::default();
    let chunks = split_for_display(TEXT, settings.display_max_chars, &settings.protected_phrases);
    let slow = TimingEstimator::new(100.0);
    let fast = TimingEstimator::new(200.0);
    let slow_total = slow.assign_windows(&chunks, f64::NAN, &[]).last().map(|w| w.end);
    let fast_total = fast.assign_windows(&chunks, f64::NAN, &[]).last().map(|w| w.end);
    let (slow_total, fast_total) = (slow_total.unwrap(), fast_total.unwrap());
    assert!((slow_total - 2.0 * fast_total).abs() < 1e-9);
    assert!((slow.estimate_duration(TEXT) - slow_total).abs() < 1e-9);
}

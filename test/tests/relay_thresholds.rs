use intercession_server::{RelayConfig, RelayError, SuperpositionRelay};
use intercession_shared::{SpacetimeComponent, TemporalEntity, TimelineConfig, TimesliceId, TimestreamState};

fn relay(min: f32, max: f32) -> Result<SuperpositionRelay, RelayError> {
    SuperpositionRelay::new(
        RelayConfig {
            forked_threshold_min_secs: min,
            forked_threshold_max_secs: max,
        },
        &TimelineConfig::default(),
    )
}

#[test]
fn max_below_min_fails_fast() {
    assert_eq!(
        relay(2.0, 0.5).err(),
        Some(RelayError::ThresholdOrder { min: 2.0, max: 0.5 })
    );
}

#[test]
fn negative_or_nan_thresholds_fail() {
    assert!(matches!(
        relay(-1.0, 2.0).err(),
        Some(RelayError::InvalidThreshold { field: "forked_threshold_min_secs", .. })
    ));
    assert!(matches!(
        relay(0.5, f32::NAN).err(),
        Some(RelayError::InvalidThreshold { field: "forked_threshold_max_secs", .. })
    ));
}

#[test]
fn equal_thresholds_make_every_candidate_trigger() {
    let mut relay = relay(1.0, 1.0).unwrap();
    let entity = TemporalEntity::compose(TimesliceId::new(0), 1);
    let forked = SpacetimeComponent::new(TimestreamState::Forked, 0);

    relay.submit(entity, &forked, 59);
    assert!(relay.candidates().is_empty());
    assert!(!relay.resolution_needed());

    relay.clear();
    relay.submit(entity, &forked, 60);
    assert_eq!(relay.candidates(), &[entity]);
    assert!(relay.resolution_needed());
}

#[test]
fn default_thresholds_match_the_simulation_rate() {
    let relay = SuperpositionRelay::new(RelayConfig::default(), &TimelineConfig::default()).unwrap();
    assert_eq!(relay.forked_threshold_min_ticks(), 30);
    assert_eq!(relay.forked_threshold_max_ticks(), 120);
}

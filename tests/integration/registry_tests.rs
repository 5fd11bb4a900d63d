//! Bus registry lifecycle: upsert, removal, the global sensor index, and
//! the persisted form.

use s88bus::app::ports::RestrictedPins;
use s88bus::config::S88Config;
use s88bus::error::BusError;
use s88bus::s88::persist::{BusRecord, PersistedBuses};
use s88bus::s88::sensor::{SensorHandle, SensorKind};
use s88bus::s88::{BusRegistry, Upserted};

fn registry() -> BusRegistry {
    BusRegistry::new(&S88Config::default())
}

#[test]
fn second_bus_on_same_pin_is_rejected_and_first_is_untouched() {
    let mut r = registry();
    let open = RestrictedPins::none();
    r.create_or_update(1, 25, 8, &open).unwrap();
    let before = r.to_persisted();

    assert_eq!(
        r.create_or_update(2, 25, 4, &open),
        Err(BusError::PinConflict { pin: 25, owner: 1 })
    );
    assert_eq!(r.to_persisted(), before);
    assert!(r.bus(2).is_none());
}

#[test]
fn bus_five_owns_sixteen_sequential_ids_until_removed() {
    let mut r = registry();
    r.create_or_update(5, 27, 16, &RestrictedPins::none()).unwrap();
    let base = S88Config::default().sensor_base(5);
    assert_eq!(base, 3072);

    for (position, id) in (base..base + 16).enumerate() {
        assert_eq!(
            r.index().get(id),
            Some(SensorKind::BusOwned(SensorHandle { bus: 5, position: position as u16 }))
        );
    }

    let removed = r.remove(5).unwrap();
    assert_eq!(removed, BusRecord { id: 5, pin: 27, sensor_base: base, count: 16 });
    assert!((base..base + 16).all(|id| !r.index().contains(id)));
    assert!(r.describe(false).is_empty());
}

#[test]
fn update_keeps_base_and_may_move_pin() {
    let mut r = registry();
    let open = RestrictedPins::none();
    r.create_or_update(2, 4, 8, &open).unwrap();
    assert_eq!(r.create_or_update(2, 13, 3, &open), Ok(Upserted::Updated));

    let bus = r.bus(2).unwrap();
    assert_eq!(bus.data_pin(), 13);
    assert_eq!(bus.sensor_base(), 1536);
    assert_eq!(bus.sensor_count(), 3);

    // The old pin is free again.
    assert_eq!(r.create_or_update(3, 4, 1, &open), Ok(Upserted::Created));
}

#[test]
fn restricted_pins_follow_board_list() {
    let config = S88Config::default();
    let mut r = BusRegistry::new(&config);
    let guard = RestrictedPins::for_board(&config);
    assert_eq!(
        r.create_or_update(0, config.load_pin, 8, &guard),
        Err(BusError::RestrictedPin(config.load_pin))
    );
    assert_eq!(r.create_or_update(0, 32, 8, &guard), Ok(Upserted::Created));
}

#[test]
fn zero_sensor_bus_is_allowed() {
    let mut r = registry();
    r.create_or_update(0, 4, 0, &RestrictedPins::none()).unwrap();
    assert_eq!(r.bus(0).unwrap().sensor_count(), 0);
    assert!(r.index().is_empty());
}

#[test]
fn generic_mutation_of_bus_sensor_is_refused() {
    let mut r = registry();
    r.create_or_update(1, 4, 2, &RestrictedPins::none()).unwrap();
    assert_eq!(
        r.index().ensure_generic_mutable(1025),
        Err(BusError::BusOwnedSensor(1025))
    );
    assert_eq!(r.index().ensure_generic_mutable(99), Ok(()));
}

#[test]
fn stored_blob_round_trips_through_json() {
    let mut r = registry();
    let open = RestrictedPins::none();
    r.create_or_update(0, 4, 8, &open).unwrap();
    r.create_or_update(7, 13, 64, &open).unwrap();

    let blob = r.to_persisted().to_json().unwrap();
    let parsed = PersistedBuses::from_json(&blob).unwrap();
    assert_eq!(parsed.count, 2);

    let mut restored = registry();
    assert_eq!(restored.load(&parsed), 2);
    assert_eq!(restored.to_persisted(), r.to_persisted());
    assert_eq!(restored.index().len(), 72);
}

#[test]
fn load_skips_overlapping_windows_and_oversized_records() {
    let mut r = registry();
    let stored = PersistedBuses::new(vec![
        BusRecord { id: 0, pin: 4, sensor_base: 512, count: 8 },
        BusRecord { id: 1, pin: 13, sensor_base: 516, count: 8 },
        BusRecord { id: 2, pin: 14, sensor_base: 1536, count: 600 },
        BusRecord { id: 3, pin: 21, sensor_base: 2048, count: 1 },
    ]);
    assert_eq!(r.load(&stored), 2);
    let ids: Vec<u8> = r.buses().map(|b| b.id()).collect();
    assert_eq!(ids, vec![0, 3]);
}

#[test]
fn rejected_update_leaves_bus_untouched() {
    let mut r = registry();
    let open = RestrictedPins::none();
    r.create_or_update(1, 25, 8, &open).unwrap();
    let before = r.to_persisted();
    let ids_before: Vec<u32> = r.index().ids().collect();

    assert_eq!(
        r.create_or_update(1, 25, 600, &open),
        Err(BusError::TooManySensors { requested: 600, max: 512 })
    );
    assert_eq!(r.bus(1).unwrap().sensor_count(), 8);
    assert_eq!(r.index().len(), 8);
    assert_eq!(r.index().ids().collect::<Vec<_>>(), ids_before);
    assert_eq!(r.to_persisted(), before);
}

#[test]
fn bus_created_after_load_cannot_take_loaded_ids() {
    // A blob stored under an older ID layout keeps its bases on load.
    let mut r = registry();
    let open = RestrictedPins::none();
    let stored = PersistedBuses::new(vec![BusRecord { id: 1, pin: 25, sensor_base: 1536, count: 2 }]);
    assert_eq!(r.load(&stored), 1);

    assert_eq!(
        r.create_or_update(2, 26, 4, &open),
        Err(BusError::SensorIdOverlap { sensor: 1536, owner: 1 })
    );
    assert_eq!(r.index().len(), 2);

    r.remove(1).unwrap();
    assert!(r.index().is_empty());
    assert_eq!(r.create_or_update(2, 26, 4, &open), Ok(Upserted::Created));
    assert_eq!(r.index().len(), 4);
}

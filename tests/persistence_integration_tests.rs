//! Integration tests for snapshot persistence and restart recovery

use chrono::Duration;
use parkledger::core::parse_timestamp;
use parkledger::{
    CapacityTable, ClientTier, Coordinates, DurabilityMode, Ledger, LedgerConfig, LedgerError,
    ManualClock, RecoveryPolicy, VehicleType,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config(path: &Path) -> LedgerConfig {
    let mut capacity = CapacityTable::new();
    capacity.insert(VehicleType::Car, 3);
    capacity.insert(VehicleType::Motorcycle, 2);
    capacity.insert(VehicleType::Bicycle, 2);
    LedgerConfig::new().data_path(path).capacity(capacity)
}

fn clock() -> ManualClock {
    ManualClock::new(parse_timestamp("2025-09-15 07:30:00").unwrap())
}

#[test]
fn test_every_mutation_writes_the_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    let mut ledger = Ledger::open_with_clock(config(&path), clock()).unwrap();

    // Opening alone writes nothing
    assert!(!path.exists());

    ledger.check_in(ledger.new_vehicle("abc123", "car")).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["capacity"]["car"], 2);
    assert_eq!(json["active_vehicles"][0]["plate"], "ABC123");
    assert_eq!(json["active_vehicles"][0]["hora_entrada"], "2025-09-15 07:30:00");

    ledger.check_out("ABC123").unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["capacity"]["car"], 3);
    assert_eq!(json["active_vehicles"].as_array().unwrap().len(), 0);
    assert_eq!(json["historial"][0]["horas"], 1);
    assert_eq!(json["historial"][0]["total"], 2000.0);
}

#[test]
fn test_restart_restores_identical_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    let clock = clock();

    // Session 1: park, bill, leave some vehicles parked
    let before = {
        let mut ledger = Ledger::open_with_clock(config(&path), clock.clone()).unwrap();
        ledger.set_operator("ana");
        ledger
            .check_in(
                ledger
                    .new_vehicle("car001", "car")
                    .with_location(Coordinates::new(6.2319, -75.6104)),
            )
            .unwrap();
        ledger
            .check_in(ledger.new_vehicle("MOTO01", "moto").with_tier(ClientTier::Monthly))
            .unwrap();
        ledger.check_in(ledger.new_vehicle("bike01", "bicycle")).unwrap();
        clock.advance(Duration::minutes(200));
        ledger.check_out("car001").unwrap();
        ledger.snapshot()
    };

    // Session 2: reopen with a different configured capacity; the snapshot wins
    {
        let other = config(&path).slots("car", 99);
        let ledger = Ledger::open_with_clock(other, clock.clone()).unwrap();
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(ledger.remaining(&VehicleType::Car), 3);
        assert_eq!(ledger.active_vehicles().len(), 2);

        let record = &ledger.history()[0];
        assert_eq!(record.hours, 3);
        assert_eq!(record.total, 6000.0);
        assert_eq!(record.operator.as_deref(), Some("ana"));
        assert_eq!(record.location(), Some(Coordinates::new(6.2319, -75.6104)));
    }
}

#[test]
fn test_frequent_discount_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    let clock = clock();

    for _ in 0..4 {
        let mut ledger = Ledger::open_with_clock(config(&path), clock.clone()).unwrap();
        ledger.check_in(ledger.new_vehicle("REG777", "car")).unwrap();
        clock.advance(Duration::hours(1));
        ledger.check_out("REG777").unwrap();
    }

    let mut ledger = Ledger::open_with_clock(config(&path), clock.clone()).unwrap();
    assert_eq!(ledger.visit_count("reg777"), 4);
    let outcome = ledger.check_in(ledger.new_vehicle("REG777", "car")).unwrap();
    assert!(outcome.accepted);
    assert_eq!(ledger.find_active("REG777").unwrap().tier, ClientTier::Frequent);

    clock.advance(Duration::hours(2));
    let record = ledger.check_out("REG777").unwrap().unwrap();
    assert!((record.total - 2.0 * 2000.0 * 0.9).abs() < 1e-6);
}

#[test]
fn test_corrupt_snapshot_fails_fast_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    fs::write(
        &path,
        "{\"capacity\": {\"car\": 2}, \"active_vehicles\": [{\"plate\": \"AB",
    )
    .unwrap();

    let err = Ledger::open_with_clock(config(&path), clock()).err().unwrap();
    assert!(matches!(err, LedgerError::CorruptSnapshot(_)));
    assert!(err.is_storage_fault());
    // The bad file is left untouched for inspection
    assert!(path.exists());
}

#[test]
fn test_corrupt_snapshot_start_empty_policy() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    fs::write(&path, "not json at all").unwrap();

    let config = config(&path).recovery(RecoveryPolicy::StartEmpty);
    let mut ledger = Ledger::open_with_clock(config, clock()).unwrap();
    assert!(ledger.active_vehicles().is_empty());
    assert_eq!(ledger.remaining(&VehicleType::Car), 3);
    assert!(temp_dir.path().join("ledger.json.corrupt").exists());

    ledger.check_in(ledger.new_vehicle("NEW001", "car")).unwrap();
    assert!(path.exists());
}

#[test]
fn test_reads_legacy_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("parqueadero_data.json");
    fs::write(
        &path,
        r#"{
    "cupos": {"carro": 49, "moto": 80, "bici": 20},
    "vehiculos": [
        {"placa": "OLD123", "tipo": "carro", "hora_entrada": "2025-09-15 05:00:00",
         "cliente": "normal", "visitas": 1, "lat": null, "lon": null}
    ],
    "historial": [
        {"placa": "OLD999", "tipo": "moto", "cliente": "frecuente",
         "hora_entrada": "2025-09-14 08:00:00", "hora_salida": "2025-09-14 10:00:00",
         "horas": 2, "total": 1800.0, "operador": "Operador", "lat": null, "lon": null}
    ]
}"#,
    )
    .unwrap();

    let mut ledger =
        Ledger::open_with_clock(LedgerConfig::new().data_path(&path), clock()).unwrap();
    assert_eq!(ledger.remaining(&VehicleType::Car), 49);
    assert_eq!(ledger.history()[0].tier, ClientTier::Frequent);

    let record = ledger.check_out("old123").unwrap().unwrap();
    assert_eq!(record.hours, 2);
    assert_eq!(record.total, 4000.0);
    assert_eq!(ledger.remaining(&VehicleType::Car), 50);
}

#[test]
fn test_memory_only_mode_leaves_no_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    let config = config(&path).durability(DurabilityMode::None);

    let mut ledger = Ledger::open_with_clock(config, clock()).unwrap();
    ledger.check_in(ledger.new_vehicle("TMP001", "car")).unwrap();
    ledger.persist().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_unreadable_store_is_an_error_not_a_rejection() {
    let temp_dir = TempDir::new().unwrap();
    // A directory where the snapshot file should be
    let path = temp_dir.path().join("taken");
    fs::create_dir(&path).unwrap();

    let err = Ledger::open_with_clock(config(&path), clock()).err().unwrap();
    assert!(matches!(err, LedgerError::Io(_)));
}

/// Swap the snapshot file for a non-empty directory so the next save fails.
fn block_store(path: &Path) {
    if path.exists() {
        fs::remove_file(path).unwrap();
    }
    fs::create_dir(path).unwrap();
    fs::write(path.join("occupant"), b"x").unwrap();
}

#[test]
fn test_failed_save_on_check_in_leaves_no_trace() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    let mut ledger = Ledger::open_with_clock(config(&path), clock()).unwrap();
    block_store(&path);

    let err = ledger.check_in(ledger.new_vehicle("ABC123", "car")).unwrap_err();
    assert!(matches!(err, LedgerError::Io(_)));
    assert_eq!(ledger.remaining(&VehicleType::Car), 3);
    assert!(ledger.active_vehicles().is_empty());
    assert!(ledger.history().is_empty());

    // Once the store is writable again the same plate is admitted
    fs::remove_dir_all(&path).unwrap();
    let outcome = ledger.check_in(ledger.new_vehicle("ABC123", "car")).unwrap();
    assert!(outcome.is_accepted());
    assert_eq!(ledger.remaining(&VehicleType::Car), 2);
}

#[test]
fn test_failed_save_on_check_out_leaves_no_trace() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    let clock = clock();
    let mut ledger = Ledger::open_with_clock(config(&path), clock.clone()).unwrap();
    ledger.check_in(ledger.new_vehicle("MOT777", "motorcycle")).unwrap();
    let parked = ledger.active_vehicles().to_vec();
    clock.advance(Duration::hours(3));
    block_store(&path);

    let err = ledger.check_out("MOT777").unwrap_err();
    assert!(matches!(err, LedgerError::Io(_)));
    assert_eq!(ledger.remaining(&VehicleType::Motorcycle), 1);
    assert_eq!(ledger.active_vehicles(), parked.as_slice());
    assert!(ledger.history().is_empty());

    fs::remove_dir_all(&path).unwrap();
    let record = ledger.check_out("MOT777").unwrap().unwrap();
    assert_eq!(record.hours, 3);
    assert_eq!(ledger.history().len(), 1);
    assert_eq!(ledger.remaining(&VehicleType::Motorcycle), 2);
}

#[test]
fn test_hand_edited_snapshot_is_normalized_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ledger.json");
    fs::write(
        &path,
        r#"{
            "cupos": {"carro": 2},
            "vehiculos": [{"placa": "abc123", "tipo": "carro",
                           "hora_entrada": "2025-09-15 06:30:00",
                           "cliente": "Frecuente", "visitas": 6}],
            "historial": []
        }"#,
    )
    .unwrap();

    let mut ledger = Ledger::open_with_clock(config(&path), clock()).unwrap();
    let record = ledger.check_out("ABC123").unwrap().unwrap();
    assert_eq!(record.tier, ClientTier::Frequent);
    assert!((record.total - 2000.0 * 0.9).abs() < 1e-6);
}

// Unit converter tests: binary scaling, decimal labels with the same divisor, failures

use hostmon::error::UnitError;
use hostmon::units::{memory_to_mb, percent, round2, size_to_mb};

#[test]
fn percent_trims_suffix() {
    assert_eq!(percent("45.3%").unwrap(), 45.3);
    assert_eq!(percent("0.00%").unwrap(), 0.0);
}

#[test]
fn memory_binary_units() {
    assert_eq!(memory_to_mb("1GiB").unwrap(), 1024.0);
    assert_eq!(memory_to_mb("512MiB").unwrap(), 512.0);
    assert_eq!(memory_to_mb("256KiB").unwrap(), 0.25);
    assert!((memory_to_mb("1.2GiB").unwrap() - 1228.8).abs() < 1e-9);
}

#[test]
fn memory_unknown_unit_fails() {
    assert!(matches!(memory_to_mb("12TB"), Err(UnitError::UnknownUnit(_))));
    assert!(matches!(memory_to_mb("512"), Err(UnitError::UnknownUnit(_))));
}

#[test]
fn size_decimal_labels_use_1024_divisor() {
    assert_eq!(size_to_mb("1GB").unwrap(), 1024.0);
    assert_eq!(size_to_mb("512MB").unwrap(), 512.0);
    assert_eq!(size_to_mb("256KB").unwrap(), 0.25);
    assert_eq!(size_to_mb("100B").unwrap(), 100.0 / 1_048_576.0);
    assert!((size_to_mb("100B").unwrap() - 0.0000954).abs() < 1e-7);
}

#[test]
fn size_unknown_unit_fails() {
    assert!(matches!(size_to_mb("12"), Err(UnitError::UnknownUnit(_))));
    assert!(matches!(size_to_mb("3TiX"), Err(UnitError::UnknownUnit(_))));
}

#[test]
fn round2_truncates_towards_zero() {
    assert_eq!(round2(1.2349), 1.23);
    assert_eq!(round2(-1.2349), -1.23);
    assert_eq!(round2(99.999), 99.99);
}

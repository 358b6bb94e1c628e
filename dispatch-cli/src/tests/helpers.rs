//! Fixtures shared by the CLI unit and behaviour tests.

use camino::{Utf8Path, Utf8PathBuf};
use dispatch_core::{CartLine, Coordinate, MenuAvailability, Order, OrderStatus, Restaurant};
use tempfile::TempDir;

use crate::DispatchSnapshot;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write fixture file");
}

/// A temporary directory addressed through UTF-8 paths.
pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn at(lat: f64, lon: f64) -> Coordinate {
    Coordinate::new(lat, lon).expect("coordinate")
}

/// Two restaurants around central Moscow sharing product 100.
///
/// Order 10 wants products 100 and 200 (only restaurant 1 has both), order
/// 11 wants product 100, and order 12 is closed.
pub(super) fn sample_snapshot() -> DispatchSnapshot {
    let order = |id, address: &str, products: &[u64], status| Order {
        id,
        address: address.to_owned(),
        items: products
            .iter()
            .map(|&product_id| CartLine {
                product_id,
                quantity: 1,
            })
            .collect(),
        status,
        restaurant_id: None,
    };
    let row = |restaurant_id, product_id, available| MenuAvailability {
        restaurant_id,
        product_id,
        available,
    };

    DispatchSnapshot {
        restaurants: vec![
            Restaurant::new(1, "Central", Some(at(55.76, 37.64))),
            Restaurant::new(2, "South", Some(at(55.70, 37.60))),
        ],
        menu: vec![
            row(1, 100, true),
            row(1, 200, true),
            row(2, 100, true),
            row(2, 200, false),
        ],
        orders: vec![
            order(10, "1 Red Square", &[100, 200], OrderStatus::New),
            order(11, "1 Red Square", &[100], OrderStatus::InProgress),
            order(12, "1 Red Square", &[100], OrderStatus::Closed),
        ],
    }
}

pub(super) fn write_snapshot(path: &Utf8Path, snapshot: &DispatchSnapshot) {
    let payload = serde_json::to_string_pretty(snapshot).expect("serialise snapshot");
    write_utf8(path, payload.as_bytes());
}

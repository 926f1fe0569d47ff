use std::sync::LazyLock;

use crate::PigTable;

/// Published per-roll frequencies for a pair of standard pigs.
pub static STANDARD: LazyLock<PigTable> = LazyLock::new(|| {
    PigTable::builder()
        .side_up(0.240)
        .side_down(0.365)
        .trotter(0.058)
        .razorback(0.320)
        .snouter(0.017)
        .leaning_jowler(0.0)
        .build_unchecked()
});

pub fn standard() -> PigTable {
    STANDARD.clone()
}

//! Ward location derivation.
//!
//! Beds are numbered globally from 1. Each pavilion owns a block of 48
//! consecutive ids, split into two 24-bed sectors labeled `I` and `II`.
//! Labels are always recomputed from the bed id; ward text found in storage
//! is never trusted.

use std::fmt;

/// Beds per sector.
pub const BEDS_PER_SECTOR: i64 = 24;
/// Beds per pavilion (two sectors).
pub const BEDS_PER_PAVILION: i64 = 48;

/// Sector within a pavilion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sector {
    I,
    II,
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sector::I => write!(f, "I"),
            Sector::II => write!(f, "II"),
        }
    }
}

/// A derived ward location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WardLocation {
    /// A numbered pavilion sector
    Pavilion { number: i64, sector: Sector },
    /// Fallback for ids outside the numbering scheme
    General,
}

impl WardLocation {
    /// Display label: `"Pavilion {n} {I|II}"` or `"General"`. Print and UI
    /// layers depend on this exact text.
    pub fn label(&self) -> String {
        match self {
            WardLocation::Pavilion { number, sector } => format!("Pavilion {} {}", number, sector),
            WardLocation::General => "General".to_string(),
        }
    }
}

/// Map a bed id to its ward location. Pure and total: non-positive ids fall
/// back to `General` instead of failing.
pub fn locate(bed_id: i64) -> WardLocation {
    if bed_id <= 0 {
        return WardLocation::General;
    }

    // Ids are 1-based; the math is 0-based.
    let index = bed_id - 1;
    let number = index / BEDS_PER_PAVILION + 1;
    let sector = if index % BEDS_PER_PAVILION < BEDS_PER_SECTOR {
        Sector::I
    } else {
        Sector::II
    };

    WardLocation::Pavilion { number, sector }
}

/// Display label for a bed, always `"Bed {id}"` regardless of any stored
/// alternate label.
pub fn bed_label(bed_id: i64) -> String {
    format!("Bed {}", bed_id)
}

/// Deterministic grouping and per-group transform helpers.
pub mod grouping;

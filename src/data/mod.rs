/// Data layer: core types, loading, and persisted tables.
///
/// Architecture:
/// ```text
///  replicate .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse files → SpectrumSet
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ AlignedMatrix │  wavenumber × replicate, then CenteredMatrix
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ artifact  │  Combined.csv, _sync.csv, _async.csv
///   └──────────┘
/// ```

pub mod artifact;
pub mod loader;
pub mod model;

/// Data layer: core types, table reading, column detection and loading.
///
/// Architecture:
/// ```text
///  TG .csv   GS .csv   FTIR .csv (;)
///        │
///        ▼
///   ┌──────────┐
///   │  table    │  decode bytes, sniff delimiter → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  columns  │  prioritized header matchers → column roles
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  → ThermogravimetricSeries / GasSignalSeries / SpectralMatrix
///   └──────────┘
/// ```

pub mod columns;
pub mod loader;
pub mod model;
pub mod table;

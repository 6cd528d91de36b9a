/// Identifier for a single observed entity (a province in the trends export).
/// Examples: `TR-06`, `TR-34`
pub type EntityId = String;
/// Identifier for the region an entity rolls up into.
/// Examples: `Marmara`, `Doğu Anadolu`
pub type EntityGroup = String;
/// Search keyword whose interest score is tracked per entity.
/// Examples: `stres`, `panik atak`
pub type Keyword = String;
/// Identifier for an input table, used in errors and log lines.
/// Examples: `trends`, `earthquakes`, `prices`
pub type SourceId = String;
/// Column header name in a raw input table.
/// Examples: `date`, `Magnitude`, `Price`
pub type ColumnName = String;
/// Raw cell text as read from an input table.
/// Examples: `31/10/2025 07:18:50`, `4.7`, `1,234.50`
pub type CellValue = String;

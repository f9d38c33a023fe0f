/// Schema metadata for PostgreSQL tables.
///
/// Provides compile-time SQL generation for table creation and indexing.
/// All methods return `&'static str` so implementations can build their
/// statements with `const_format::concatcp!`.
///
/// # Design
///
/// This trait contains no I/O operations; it purely describes table
/// structure. [`Schema::migrates`] joins both statements for a single
/// `batch_execute`.
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
    /// Returns the full idempotent migration for this table.
    fn migrates() -> String {
        format!("{}\n{}", Self::creates(), Self::indices())
    }
}

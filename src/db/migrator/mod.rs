//! Idempotent, additive-only schema setup.
//!
//! Every migration here is safe to replay: tables are created `IF NOT
//! EXISTS`, later columns are added only when absent, and seed rows are
//! guarded by an emptiness check. Opening a store repeatedly across versions
//! converges to the latest schema with no separate migration runner.

use sea_orm_migration::prelude::*;

mod m20240101_initial;
mod m20240312_add_provenance_columns;
mod m20240520_seed_default_profile;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_initial::Migration),
            Box::new(m20240312_add_provenance_columns::Migration),
            Box::new(m20240520_seed_default_profile::Migration),
        ]
    }
}

use sea_orm_migration::prelude::*;

mod m20250902_initial;
mod m20250918_search_records_unique_owner_query;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250902_initial::Migration),
            Box::new(m20250918_search_records_unique_owner_query::Migration),
        ]
    }
}

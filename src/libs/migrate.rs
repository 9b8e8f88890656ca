use sqlx::any::{AnyPoolOptions, AnyQueryResult};
use sqlx::{AnyPool, query};

use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::model::SupaModel;
use crate::schema::TableSchema;

/// Creates the generated tables in a local SQLite database.
///
/// The emitted DDL uses SQLite column spellings (`DATETIME`, `BOOLEAN`, `BLOB`),
/// so only `sqlite:` urls are accepted.
pub struct Migrator {
    pub database_url: String,
    pool: Option<AnyPool>,
    pub schemas: Vec<TableSchema>,
    generator: Generator,
}

impl Migrator {
    pub fn new(database_url: impl Into<String>, schemas: Vec<TableSchema>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: None,
            schemas,
            generator: Generator::default(),
        }
    }

    pub fn with_generator(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    pub fn register<T: SupaModel>(&mut self) -> &mut Self {
        self.schemas.push(T::schema());
        self
    }

    pub async fn connect(&mut self) -> Result<()> {
        if !self.database_url.starts_with("sqlite:") {
            return Err(Error::UnsupportedDatabase {
                url: self.database_url.clone(),
            });
        }
        sqlx::any::install_default_drivers();
        tracing::info!(url = %self.database_url, "connecting");
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .connect(&self.database_url)
            .await?;
        self.pool = Some(pool);
        Ok(())
    }

    pub fn pool(&self) -> Result<&AnyPool> {
        self.pool.as_ref().ok_or(Error::NotConnected)
    }

    /// Table definitions in registration order.
    pub fn statements(&self) -> Vec<String> {
        self.schemas
            .iter()
            .map(|schema| self.generator.generate(schema).table_definition.to_sql())
            .collect()
    }

    // -------- Create tables --------
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool()?;
        for (schema, sql) in self.schemas.iter().zip(self.statements()) {
            tracing::info!(table = %schema.table_name, "creating table");
            query(&sql).execute(pool).await?;
        }
        Ok(())
    }

    // -------- Execute raw SQL --------
    pub async fn raw(&self, sql: &str) -> Result<AnyQueryResult> {
        Ok(query(sql).execute(self.pool()?).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;

    fn schemas() -> Vec<TableSchema> {
        vec![
            TableSchema::new(
                "blank_thing",
                vec![
                    ColumnDescriptor::new("id", "String").primary_key(),
                    ColumnDescriptor::new("name", "String"),
                ],
            ),
            TableSchema::new(
                "task_thing",
                vec![
                    ColumnDescriptor::new("id", "String").primary_key(),
                    ColumnDescriptor::new("createdAt", "Date?"),
                    ColumnDescriptor::foreign_key("otherThing", "BlankThing", "id", Some("blank_thing_id")),
                ],
            ),
        ]
    }

    #[tokio::test]
    async fn migrate_requires_a_connection() {
        let migrator = Migrator::new("sqlite::memory:", schemas());
        assert!(matches!(migrator.migrate().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn non_sqlite_urls_are_rejected() {
        let mut migrator = Migrator::new("postgres://localhost/app", schemas());
        let result = migrator.connect().await;
        assert!(matches!(
            result,
            Err(Error::UnsupportedDatabase { url }) if url == "postgres://localhost/app"
        ));
        assert!(matches!(migrator.pool(), Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn migrate_creates_tables_in_sqlite() {
        let mut migrator = Migrator::new("sqlite::memory:", schemas());
        migrator.connect().await.unwrap();
        migrator.migrate().await.unwrap();
        // idempotent with IF NOT EXISTS
        migrator.migrate().await.unwrap();

        migrator
            .raw("INSERT INTO blank_thing (id, name, is_deleted) VALUES ('b1', 'blank', 0)")
            .await
            .unwrap();
        migrator
            .raw(
                "INSERT INTO task_thing (id, created_at, blank_thing_id, updated_at, is_deleted) \
                 VALUES ('t1', NULL, 'b1', '2024-03-01T08:00:00.000Z', 0)",
            )
            .await
            .unwrap();

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(migrator.pool().unwrap())
        .await
        .unwrap();
        assert_eq!(names, ["blank_thing", "task_thing"]);
    }

    #[tokio::test]
    async fn not_null_columns_are_enforced() {
        let mut migrator = Migrator::new("sqlite::memory:", schemas());
        migrator.connect().await.unwrap();
        migrator.migrate().await.unwrap();
        let result = migrator
            .raw("INSERT INTO blank_thing (id, name) VALUES ('b1', 'missing flag')")
            .await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[test]
    fn statements_follow_registration_order() {
        let statements = Migrator::new("sqlite::memory:", schemas()).statements();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS blank_thing"));
        assert!(statements[1].contains("REFERENCES blank_thing(id) ON DELETE CASCADE"));
    }
}

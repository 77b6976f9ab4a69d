use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// SQLite reports a raced `ALTER TABLE ADD COLUMN` as "duplicate column
/// name"; that exact failure is the only one this migration tolerates.
fn is_duplicate_column(err: &DbErr) -> bool {
    err.to_string().to_lowercase().contains("duplicate column")
}

async fn add_column(
    manager: &SchemaManager<'_>,
    table: &str,
    column: &str,
    alter: TableAlterStatement,
) -> Result<(), DbErr> {
    if manager.has_column(table, column).await? {
        return Ok(());
    }
    match manager.alter_table(alter).await {
        Ok(()) => Ok(()),
        Err(err) if is_duplicate_column(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Subtitles gained modification provenance.
        add_column(
            manager,
            "subtitles",
            "confidence_score",
            Table::alter()
                .table(Subtitles::Table)
                .add_column(ColumnDef::new(Subtitles::ConfidenceScore).double().null())
                .to_owned(),
        )
        .await?;

        add_column(
            manager,
            "subtitles",
            "parent_id",
            Table::alter()
                .table(Subtitles::Table)
                .add_column(ColumnDef::new(Subtitles::ParentId).text().null())
                .to_owned(),
        )
        .await?;

        add_column(
            manager,
            "subtitles",
            "modification_type",
            Table::alter()
                .table(Subtitles::Table)
                .add_column(ColumnDef::new(Subtitles::ModificationType).text().null())
                .to_owned(),
        )
        .await?;

        // Downloads gained scoring and latency telemetry.
        add_column(
            manager,
            "downloads",
            "match_score",
            Table::alter()
                .table(Downloads::Table)
                .add_column(ColumnDef::new(Downloads::MatchScore).double().null())
                .to_owned(),
        )
        .await?;

        add_column(
            manager,
            "downloads",
            "response_time_ms",
            Table::alter()
                .table(Downloads::Table)
                .add_column(ColumnDef::new(Downloads::ResponseTimeMs).big_integer().null())
                .to_owned(),
        )
        .await?;

        // Media items gained alternative titles and user field locks.
        add_column(
            manager,
            "media_items",
            "alt_titles",
            Table::alter()
                .table(MediaItems::Table)
                .add_column(ColumnDef::new(MediaItems::AltTitles).text().null())
                .to_owned(),
        )
        .await?;

        add_column(
            manager,
            "media_items",
            "field_locks",
            Table::alter()
                .table(MediaItems::Table)
                .add_column(ColumnDef::new(MediaItems::FieldLocks).text().null())
                .to_owned(),
        )
        .await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Schema evolution is additive-only; rollback is out of scope.
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Subtitles {
    Table,
    ConfidenceScore,
    ParentId,
    ModificationType,
}

#[derive(DeriveIden)]
enum Downloads {
    Table,
    MatchScore,
    ResponseTimeMs,
}

#[derive(DeriveIden)]
enum MediaItems {
    Table,
    AltTitles,
    FieldLocks,
}

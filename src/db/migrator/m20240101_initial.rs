use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        // The three core tables are written out column by column: they
        // predate several entity fields, which arrive in the additive
        // migration that follows.
        manager
            .create_table(
                Table::create()
                    .table(Subtitles)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubtitleCol::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubtitleCol::File).text().not_null())
                    .col(ColumnDef::new(SubtitleCol::VideoFile).text().not_null())
                    .col(ColumnDef::new(SubtitleCol::Release).text().not_null())
                    .col(ColumnDef::new(SubtitleCol::Language).text().not_null())
                    .col(ColumnDef::new(SubtitleCol::Service).text().not_null())
                    .col(ColumnDef::new(SubtitleCol::Embedded).boolean().not_null())
                    .col(ColumnDef::new(SubtitleCol::SourceUrl).text().null())
                    .col(ColumnDef::new(SubtitleCol::ProviderMetadata).text().null())
                    .col(ColumnDef::new(SubtitleCol::CreatedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subtitles_file")
                    .table(Subtitles)
                    .col(SubtitleCol::File)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subtitles_video_file")
                    .table(Subtitles)
                    .col(SubtitleCol::VideoFile)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Downloads)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DownloadCol::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DownloadCol::File).text().not_null())
                    .col(ColumnDef::new(DownloadCol::VideoFile).text().not_null())
                    .col(ColumnDef::new(DownloadCol::Provider).text().not_null())
                    .col(ColumnDef::new(DownloadCol::Language).text().not_null())
                    .col(ColumnDef::new(DownloadCol::SearchQuery).text().not_null())
                    .col(
                        ColumnDef::new(DownloadCol::DownloadAttempts)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DownloadCol::ErrorMessage).text().not_null())
                    .col(ColumnDef::new(DownloadCol::CreatedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_downloads_file")
                    .table(Downloads)
                    .col(DownloadCol::File)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_downloads_video_file")
                    .table(Downloads)
                    .col(DownloadCol::VideoFile)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MediaItems)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MediaCol::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MediaCol::Path).text().not_null())
                    .col(ColumnDef::new(MediaCol::Title).text().not_null())
                    .col(ColumnDef::new(MediaCol::Season).integer().not_null())
                    .col(ColumnDef::new(MediaCol::Episode).integer().not_null())
                    .col(ColumnDef::new(MediaCol::ReleaseGroup).text().not_null())
                    .col(ColumnDef::new(MediaCol::CreatedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_media_items_path")
                    .table(MediaItems)
                    .col(MediaCol::Path)
                    .to_owned(),
            )
            .await?;

        // The remaining tables never evolved; their entity definitions are
        // the schema.
        manager
            .create_table(
                schema
                    .create_table_from_entity(Tags)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(TagAssociations)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(LanguageProfiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(MediaProfiles)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(MonitoredItems)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MonitoredItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MediaProfiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LanguageProfiles).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TagAssociations).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MediaItems).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Downloads).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subtitles).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum SubtitleCol {
    Id,
    File,
    VideoFile,
    Release,
    Language,
    Service,
    Embedded,
    SourceUrl,
    ProviderMetadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DownloadCol {
    Id,
    File,
    VideoFile,
    Provider,
    Language,
    SearchQuery,
    DownloadAttempts,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum MediaCol {
    Id,
    Path,
    Title,
    Season,
    Episode,
    ReleaseGroup,
    CreatedAt,
}

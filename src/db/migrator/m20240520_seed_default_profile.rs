use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use crate::entities::language_profiles;
use crate::entities::prelude::LanguageProfiles;
use crate::models::LanguageProfile;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Seed exactly once: an operator-created profile set must never be
        // touched, so the guard is table emptiness, not name lookup.
        let existing = LanguageProfiles::find().count(db).await?;
        if existing > 0 {
            return Ok(());
        }

        let seed = LanguageProfile::seed_default();
        let languages = serde_json::to_string(&seed.languages)
            .map_err(|e| DbErr::Custom(format!("encode seed profile languages: {e}")))?;
        let now = chrono::Utc::now().to_rfc3339();

        language_profiles::ActiveModel {
            name: Set(seed.name),
            languages: Set(languages),
            cutoff_score: Set(<i32 as TryFrom<u32>>::try_from(seed.cutoff_score).unwrap_or(80)),
            is_default: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        // Seed rows are user data once created; never unseeded.
        Ok(())
    }
}

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::db::{now_rfc3339, parse_ts};
use crate::entities::{language_profiles, media_profiles, prelude::*};
use crate::models::LanguageProfile;
use crate::storage::{StoreError, StoreResult};

pub struct ProfileRepository {
    conn: DatabaseConnection,
}

impl ProfileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn to_domain(m: language_profiles::Model) -> StoreResult<LanguageProfile> {
        Ok(LanguageProfile {
            id: m.id.to_string(),
            name: m.name,
            languages: serde_json::from_str(&m.languages)?,
            cutoff_score: u32::try_from(m.cutoff_score).unwrap_or(0),
            is_default: m.is_default,
            created_at: Some(parse_ts(&m.created_at)?),
            updated_at: Some(parse_ts(&m.updated_at)?),
        })
    }

    fn parse_profile_id(profile_id: &str) -> StoreResult<i32> {
        profile_id
            .parse()
            .map_err(|_| StoreError::not_found("language profile", profile_id))
    }

    pub async fn create(&self, profile: LanguageProfile) -> StoreResult<LanguageProfile> {
        profile.validate()?;
        let created = profile.created_at_or_now().to_rfc3339();

        let txn = self.conn.begin().await?;

        // Only one default may exist at a time.
        if profile.is_default {
            Self::clear_default(&txn).await?;
        }

        let active = language_profiles::ActiveModel {
            name: Set(profile.name.clone()),
            languages: Set(serde_json::to_string(&profile.languages)?),
            cutoff_score: Set(i32::try_from(profile.cutoff_score).unwrap_or(i32::MAX)),
            is_default: Set(profile.is_default),
            created_at: Set(created),
            updated_at: Set(now_rfc3339()),
            ..Default::default()
        };
        let result = LanguageProfiles::insert(active).exec(&txn).await?;
        let row = LanguageProfiles::find_by_id(result.last_insert_id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::Driver("created profile row disappeared".into()))?;

        txn.commit().await?;
        Self::to_domain(row)
    }

    pub async fn update(&self, profile: &LanguageProfile) -> StoreResult<LanguageProfile> {
        profile.validate()?;
        let id = Self::parse_profile_id(&profile.id)?;

        let txn = self.conn.begin().await?;

        let row = LanguageProfiles::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::not_found("language profile", &profile.id))?;

        if profile.is_default && !row.is_default {
            Self::clear_default(&txn).await?;
        }

        let mut active: language_profiles::ActiveModel = row.into();
        active.name = Set(profile.name.clone());
        active.languages = Set(serde_json::to_string(&profile.languages)?);
        active.cutoff_score = Set(i32::try_from(profile.cutoff_score).unwrap_or(i32::MAX));
        active.is_default = Set(profile.is_default);
        active.updated_at = Set(now_rfc3339());
        let updated = sea_orm::ActiveModelTrait::update(active, &txn).await?;

        txn.commit().await?;
        Self::to_domain(updated)
    }

    pub async fn list_all(&self) -> StoreResult<Vec<LanguageProfile>> {
        let rows = LanguageProfiles::find()
            .order_by_asc(language_profiles::Column::Id)
            .all(&self.conn)
            .await?;
        rows.into_iter().map(Self::to_domain).collect()
    }

    pub async fn get(&self, profile_id: &str) -> StoreResult<LanguageProfile> {
        let id = Self::parse_profile_id(profile_id)?;
        let row = LanguageProfiles::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("language profile", profile_id))?;
        Self::to_domain(row)
    }

    /// Falls back to the oldest profile when no row carries the default
    /// flag, so a store with any profiles at all always resolves one.
    pub async fn get_default(&self) -> StoreResult<LanguageProfile> {
        let flagged = LanguageProfiles::find()
            .filter(language_profiles::Column::IsDefault.eq(true))
            .order_by_asc(language_profiles::Column::Id)
            .one(&self.conn)
            .await?;
        if let Some(row) = flagged {
            return Self::to_domain(row);
        }

        let oldest = LanguageProfiles::find()
            .order_by_asc(language_profiles::Column::Id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("language profile", "default"))?;
        Self::to_domain(oldest)
    }

    pub async fn set_default(&self, profile_id: &str) -> StoreResult<()> {
        let id = Self::parse_profile_id(profile_id)?;

        let txn = self.conn.begin().await?;

        let row = LanguageProfiles::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::not_found("language profile", profile_id))?;

        Self::clear_default(&txn).await?;

        let mut active: language_profiles::ActiveModel = row.into();
        active.is_default = Set(true);
        active.updated_at = Set(now_rfc3339());
        sea_orm::ActiveModelTrait::update(active, &txn).await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn delete(&self, profile_id: &str) -> StoreResult<()> {
        let id = Self::parse_profile_id(profile_id)?;

        let txn = self.conn.begin().await?;
        MediaProfiles::delete_many()
            .filter(media_profiles::Column::ProfileId.eq(id))
            .exec(&txn)
            .await?;
        LanguageProfiles::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }

    pub async fn assign_media(&self, media_id: &str, profile_id: &str) -> StoreResult<()> {
        let id = Self::parse_profile_id(profile_id)?;

        // Verify the target exists before pointing media at it.
        LanguageProfiles::find_by_id(id)
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::not_found("language profile", profile_id))?;

        let active = media_profiles::ActiveModel {
            media_id: Set(media_id.to_string()),
            profile_id: Set(id),
            created_at: Set(now_rfc3339()),
        };
        MediaProfiles::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(media_profiles::Column::MediaId)
                    .update_column(media_profiles::Column::ProfileId)
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    /// Resolves a media item's profile, falling back to the default when no
    /// explicit assignment exists.
    pub async fn media_profile(&self, media_id: &str) -> StoreResult<LanguageProfile> {
        let assignment = MediaProfiles::find_by_id(media_id.to_string())
            .one(&self.conn)
            .await?;

        match assignment {
            Some(assoc) => {
                let row = LanguageProfiles::find_by_id(assoc.profile_id)
                    .one(&self.conn)
                    .await?
                    .ok_or_else(|| {
                        StoreError::not_found("language profile", assoc.profile_id.to_string())
                    })?;
                Self::to_domain(row)
            }
            None => self.get_default().await,
        }
    }

    pub async fn remove_media(&self, media_id: &str) -> StoreResult<()> {
        MediaProfiles::delete_by_id(media_id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    async fn clear_default(txn: &sea_orm::DatabaseTransaction) -> Result<(), sea_orm::DbErr> {
        LanguageProfiles::update_many()
            .col_expr(
                language_profiles::Column::IsDefault,
                sea_orm::sea_query::Expr::value(false),
            )
            .filter(language_profiles::Column::IsDefault.eq(true))
            .exec(txn)
            .await?;
        Ok(())
    }
}

//! Positional row encoding for the external schema registry.
//!
//! A record becomes an ordered list of [`WireValue`]s, one per field in fixed
//! declared order; field identity lives in the position, not in a name.
//! Optional fields are carried as an explicit [`WireValue::Null`] placeholder
//! so decoders distinguish "absent" from "missing index".
//!
//! The field order below IS the wire format. New fields may only be appended;
//! inserting one anywhere else silently corrupts every previously-encoded
//! row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StoreError, StoreResult};
use crate::models::{DownloadRecord, MediaItem, ModificationType, SubtitleRecord};

/// One generically-typed cell of a wire row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl WireValue {
    fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Self::Null, |v| Self::Text(v.to_string()))
    }

    fn opt_real(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Real)
    }

    fn opt_int(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Int)
    }

    fn timestamp(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Null, |ts| Self::Text(ts.to_rfc3339()))
    }
}

/// A struct with a stable positional wire encoding.
pub trait WireRecord: Sized {
    /// Number of cells this record occupies. Rows shorter than this fail
    /// decoding outright; longer rows are tolerated so old readers survive
    /// appended fields.
    const FIELD_COUNT: usize;

    fn encode(&self) -> Vec<WireValue>;

    fn decode(row: &[WireValue]) -> StoreResult<Self>;
}

fn check_len<T: WireRecord>(row: &[WireValue]) -> StoreResult<()> {
    if row.len() < T::FIELD_COUNT {
        return Err(StoreError::Serialization(format!(
            "wire row has {} cells, need at least {}",
            row.len(),
            T::FIELD_COUNT
        )));
    }
    Ok(())
}

fn cell<'a>(row: &'a [WireValue], idx: usize) -> StoreResult<&'a WireValue> {
    row.get(idx).ok_or_else(|| {
        StoreError::Serialization(format!("wire row missing cell at position {idx}"))
    })
}

fn text(row: &[WireValue], idx: usize) -> StoreResult<String> {
    match cell(row, idx)? {
        WireValue::Text(v) => Ok(v.clone()),
        other => Err(StoreError::Serialization(format!(
            "expected text at position {idx}, got {other:?}"
        ))),
    }
}

fn opt_text(row: &[WireValue], idx: usize) -> StoreResult<Option<String>> {
    match cell(row, idx)? {
        WireValue::Null => Ok(None),
        WireValue::Text(v) => Ok(Some(v.clone())),
        other => Err(StoreError::Serialization(format!(
            "expected text or null at position {idx}, got {other:?}"
        ))),
    }
}

fn boolean(row: &[WireValue], idx: usize) -> StoreResult<bool> {
    match cell(row, idx)? {
        WireValue::Bool(v) => Ok(*v),
        other => Err(StoreError::Serialization(format!(
            "expected bool at position {idx}, got {other:?}"
        ))),
    }
}

fn int(row: &[WireValue], idx: usize) -> StoreResult<i64> {
    match cell(row, idx)? {
        WireValue::Int(v) => Ok(*v),
        other => Err(StoreError::Serialization(format!(
            "expected int at position {idx}, got {other:?}"
        ))),
    }
}

fn opt_int(row: &[WireValue], idx: usize) -> StoreResult<Option<i64>> {
    match cell(row, idx)? {
        WireValue::Null => Ok(None),
        WireValue::Int(v) => Ok(Some(*v)),
        other => Err(StoreError::Serialization(format!(
            "expected int or null at position {idx}, got {other:?}"
        ))),
    }
}

fn opt_real(row: &[WireValue], idx: usize) -> StoreResult<Option<f64>> {
    match cell(row, idx)? {
        WireValue::Null => Ok(None),
        WireValue::Real(v) => Ok(Some(*v)),
        // Integral scores may arrive without a decimal point.
        WireValue::Int(v) => Ok(Some(*v as f64)),
        other => Err(StoreError::Serialization(format!(
            "expected real or null at position {idx}, got {other:?}"
        ))),
    }
}

fn timestamp(row: &[WireValue], idx: usize) -> StoreResult<Option<DateTime<Utc>>> {
    match opt_text(row, idx)? {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| {
                StoreError::Serialization(format!("bad timestamp at position {idx}: {e}"))
            }),
    }
}

impl WireRecord for SubtitleRecord {
    const FIELD_COUNT: usize = 13;

    fn encode(&self) -> Vec<WireValue> {
        vec![
            WireValue::Text(self.id.clone()),
            WireValue::Text(self.file.clone()),
            WireValue::Text(self.video_file.clone()),
            WireValue::Text(self.release.clone()),
            WireValue::Text(self.language.clone()),
            WireValue::Text(self.service.clone()),
            WireValue::Bool(self.embedded),
            WireValue::opt_text(self.source_url.as_deref()),
            self.provider_metadata
                .as_ref()
                .map_or(WireValue::Null, |m| WireValue::Text(m.to_string())),
            WireValue::opt_real(self.confidence_score),
            WireValue::opt_text(self.parent_id.as_deref()),
            WireValue::Text(self.modification_type.to_string()),
            WireValue::timestamp(self.created_at),
        ]
    }

    fn decode(row: &[WireValue]) -> StoreResult<Self> {
        check_len::<Self>(row)?;
        let provider_metadata = match opt_text(row, 8)? {
            None => None,
            Some(raw) => Some(serde_json::from_str(&raw)?),
        };
        Ok(Self {
            id: text(row, 0)?,
            file: text(row, 1)?,
            video_file: text(row, 2)?,
            release: text(row, 3)?,
            language: text(row, 4)?,
            service: text(row, 5)?,
            embedded: boolean(row, 6)?,
            source_url: opt_text(row, 7)?,
            provider_metadata,
            confidence_score: opt_real(row, 9)?,
            parent_id: opt_text(row, 10)?,
            modification_type: ModificationType::parse(&text(row, 11)?),
            created_at: timestamp(row, 12)?,
        })
    }
}

impl WireRecord for DownloadRecord {
    const FIELD_COUNT: usize = 11;

    fn encode(&self) -> Vec<WireValue> {
        vec![
            WireValue::Text(self.id.clone()),
            WireValue::Text(self.file.clone()),
            WireValue::Text(self.video_file.clone()),
            WireValue::Text(self.provider.clone()),
            WireValue::Text(self.language.clone()),
            WireValue::Text(self.search_query.clone()),
            WireValue::opt_real(self.match_score),
            WireValue::Int(i64::from(self.attempts_or_one())),
            WireValue::Text(self.error_message.clone()),
            WireValue::opt_int(self.response_time_ms),
            WireValue::timestamp(self.created_at),
        ]
    }

    fn decode(row: &[WireValue]) -> StoreResult<Self> {
        check_len::<Self>(row)?;
        Ok(Self {
            id: text(row, 0)?,
            file: text(row, 1)?,
            video_file: text(row, 2)?,
            provider: text(row, 3)?,
            language: text(row, 4)?,
            search_query: text(row, 5)?,
            match_score: opt_real(row, 6)?,
            download_attempts: u32::try_from(int(row, 7)?.max(1)).unwrap_or(1),
            error_message: text(row, 8)?,
            response_time_ms: opt_int(row, 9)?,
            created_at: timestamp(row, 10)?,
        })
    }
}

impl WireRecord for MediaItem {
    const FIELD_COUNT: usize = 9;

    fn encode(&self) -> Vec<WireValue> {
        vec![
            WireValue::Text(self.id.clone()),
            WireValue::Text(self.path.clone()),
            WireValue::Text(self.title.clone()),
            WireValue::Int(i64::from(self.season)),
            WireValue::Int(i64::from(self.episode)),
            WireValue::Text(self.release_group.clone()),
            WireValue::Text(
                serde_json::to_string(&self.alt_titles).unwrap_or_else(|_| "[]".into()),
            ),
            self.field_locks
                .as_ref()
                .map_or(WireValue::Null, |locks| WireValue::Text(locks.to_string())),
            WireValue::timestamp(self.created_at),
        ]
    }

    fn decode(row: &[WireValue]) -> StoreResult<Self> {
        check_len::<Self>(row)?;
        let field_locks = match opt_text(row, 7)? {
            None => None,
            Some(raw) => Some(serde_json::from_str(&raw)?),
        };
        Ok(Self {
            id: text(row, 0)?,
            path: text(row, 1)?,
            title: text(row, 2)?,
            season: i32::try_from(int(row, 3)?).unwrap_or(0),
            episode: i32::try_from(int(row, 4)?).unwrap_or(0),
            release_group: text(row, 5)?,
            alt_titles: serde_json::from_str(&text(row, 6)?)?,
            field_locks,
            created_at: timestamp(row, 8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtitle_round_trip_with_all_nullables_unset() {
        let rec = SubtitleRecord {
            id: "s1".into(),
            file: "movie.en.srt".into(),
            video_file: "movie.mkv".into(),
            release: String::new(),
            language: "en".into(),
            service: "opensubtitles".into(),
            embedded: false,
            source_url: None,
            provider_metadata: None,
            confidence_score: None,
            parent_id: None,
            modification_type: ModificationType::Original,
            created_at: None,
        };

        let row = rec.encode();
        assert_eq!(row.len(), SubtitleRecord::FIELD_COUNT);
        let back = SubtitleRecord::decode(&row).expect("decode");
        assert_eq!(back, rec);
        assert!(back.confidence_score.is_none());
        assert!(back.parent_id.is_none());
    }

    #[test]
    fn subtitle_round_trip_with_everything_set() {
        let rec = SubtitleRecord {
            id: "s2".into(),
            file: "movie.de.srt".into(),
            video_file: "movie.mkv".into(),
            release: "GROUP-1080p".into(),
            language: "de".into(),
            service: "addic7ed".into(),
            embedded: true,
            source_url: Some("https://example.test/sub/2".into()),
            provider_metadata: Some(serde_json::json!({"uploader": "a", "votes": 3})),
            confidence_score: Some(0.92),
            parent_id: Some("s1".into()),
            modification_type: ModificationType::Sync,
            created_at: Some("2024-05-01T10:00:00Z".parse().expect("ts")),
        };

        let back = SubtitleRecord::decode(&rec.encode()).expect("decode");
        assert_eq!(back, rec);
    }

    #[test]
    fn short_row_is_a_hard_failure() {
        let rec = DownloadRecord {
            file: "a.srt".into(),
            video_file: "a.mkv".into(),
            provider: "p".into(),
            language: "en".into(),
            ..Default::default()
        };
        let mut row = rec.encode();
        row.truncate(DownloadRecord::FIELD_COUNT - 1);

        let err = DownloadRecord::decode(&row).expect_err("must fail");
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn appended_cells_are_tolerated() {
        let rec = MediaItem {
            id: "m1".into(),
            path: "/library/show/s01e01.mkv".into(),
            title: "Show".into(),
            season: 1,
            episode: 1,
            alt_titles: vec!["Alt".into()],
            ..Default::default()
        };
        let mut row = rec.encode();
        row.push(WireValue::Text("future-field".into()));

        let back = MediaItem::decode(&row).expect("decode");
        assert_eq!(back, rec);
    }

    #[test]
    fn null_placeholder_does_not_misalign_following_fields() {
        let rec = DownloadRecord {
            id: "d1".into(),
            file: "a.srt".into(),
            video_file: "a.mkv".into(),
            provider: "p".into(),
            language: "en".into(),
            search_query: "a 2024".into(),
            match_score: None,
            download_attempts: 3,
            error_message: "timeout".into(),
            response_time_ms: Some(420),
            created_at: None,
        };

        let back = DownloadRecord::decode(&rec.encode()).expect("decode");
        assert_eq!(back.download_attempts, 3);
        assert_eq!(back.error_message, "timeout");
        assert_eq!(back.response_time_ms, Some(420));
    }
}

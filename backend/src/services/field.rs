//! Field mapping service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{FieldStatus, FieldWeather, SoilParameters};
use shared::types::GeoPoint;
use shared::validation::{validate_area, validate_coordinates, validate_name};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Newest-first page size of a session's field list
pub const FIELD_LIST_LIMIT: i64 = 50;

const FIELD_COLUMNS: &str = "id, session_id, field_name, coordinates, area, soil_type, elevation, \
    slope, drainage, soil_parameters, weather_data, status, created_at, updated_at";

/// Field service for mapped fields
#[derive(Clone)]
pub struct FieldService {
    db: PgPool,
}

/// A mapped field
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FieldMap {
    pub id: Uuid,
    pub session_id: Uuid,
    pub field_name: String,
    pub coordinates: Json<Vec<GeoPoint>>,
    /// Hectares
    pub area: Decimal,
    pub soil_type: Option<String>,
    pub elevation: Option<Decimal>,
    pub slope: Option<Decimal>,
    pub drainage: Option<String>,
    pub soil_parameters: Json<SoilParameters>,
    pub weather_data: Json<FieldWeather>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a field
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFieldInput {
    pub field_name: String,
    pub coordinates: Vec<GeoPoint>,
    pub area: Decimal,
    pub soil_type: Option<String>,
    pub elevation: Option<Decimal>,
    pub slope: Option<Decimal>,
    pub drainage: Option<String>,
    #[serde(default)]
    #[validate]
    pub soil_parameters: SoilParameters,
    #[serde(default)]
    #[validate]
    pub weather_data: FieldWeather,
}

/// Input for updating a field; soil and weather groups merge into the stored ones
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateFieldInput {
    pub field_name: Option<String>,
    pub coordinates: Option<Vec<GeoPoint>>,
    pub area: Option<Decimal>,
    pub soil_type: Option<String>,
    pub elevation: Option<Decimal>,
    pub slope: Option<Decimal>,
    pub drainage: Option<String>,
    #[validate]
    pub soil_parameters: Option<SoilParameters>,
    #[validate]
    pub weather_data: Option<FieldWeather>,
}

fn check_shape(name: Option<&str>, coordinates: Option<&[GeoPoint]>, area: Option<Decimal>) -> AppResult<()> {
    if let Some(name) = name {
        validate_name(name).map_err(|msg| AppError::validation("field_name", msg))?;
    }
    if let Some(coordinates) = coordinates {
        validate_coordinates(coordinates).map_err(|msg| AppError::validation("coordinates", msg))?;
    }
    if let Some(area) = area {
        validate_area(area).map_err(|msg| AppError::validation("area", msg))?;
    }
    Ok(())
}

impl FieldService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a field for a session
    pub async fn create_field(&self, session_id: Uuid, input: CreateFieldInput) -> AppResult<FieldMap> {
        check_shape(Some(&input.field_name), Some(&input.coordinates), Some(input.area))?;
        input.validate()?;

        let field = sqlx::query_as::<_, FieldMap>(&format!(
            r#"
            INSERT INTO field_maps (session_id, field_name, coordinates, area, soil_type,
                                    elevation, slope, drainage, soil_parameters, weather_data, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {FIELD_COLUMNS}
            "#
        ))
        .bind(session_id)
        .bind(input.field_name.trim())
        .bind(Json(&input.coordinates))
        .bind(input.area)
        .bind(&input.soil_type)
        .bind(input.elevation)
        .bind(input.slope)
        .bind(&input.drainage)
        .bind(Json(&input.soil_parameters))
        .bind(Json(&input.weather_data))
        .bind(FieldStatus::Active.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Created field {} '{}'", field.id, field.field_name);

        Ok(field)
    }

    /// Active fields of a session, newest first
    pub async fn list_fields(&self, session_id: Uuid) -> AppResult<Vec<FieldMap>> {
        let fields = sqlx::query_as::<_, FieldMap>(&format!(
            r#"
            SELECT {FIELD_COLUMNS}
            FROM field_maps
            WHERE session_id = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(session_id)
        .bind(FieldStatus::Active.as_str())
        .bind(FIELD_LIST_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(fields)
    }

    /// Get an active field by ID
    pub async fn get_field(&self, field_id: Uuid) -> AppResult<FieldMap> {
        sqlx::query_as::<_, FieldMap>(&format!(
            "SELECT {FIELD_COLUMNS} FROM field_maps WHERE id = $1 AND status = $2"
        ))
        .bind(field_id)
        .bind(FieldStatus::Active.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Field".to_string()))
    }

    /// Partial update of a field
    pub async fn update_field(&self, field_id: Uuid, input: UpdateFieldInput) -> AppResult<FieldMap> {
        check_shape(
            input.field_name.as_deref(),
            input.coordinates.as_deref(),
            input.area,
        )?;
        input.validate()?;

        let existing = self.get_field(field_id).await?;

        let mut soil_parameters = existing.soil_parameters.0;
        if let Some(update) = &input.soil_parameters {
            soil_parameters.merge(update);
        }
        let mut weather_data = existing.weather_data.0;
        if let Some(update) = &input.weather_data {
            weather_data.merge(update);
        }

        let field_name = input
            .field_name
            .map(|n| n.trim().to_string())
            .unwrap_or(existing.field_name);
        let coordinates = input.coordinates.unwrap_or(existing.coordinates.0);
        let area = input.area.unwrap_or(existing.area);
        let soil_type = input.soil_type.or(existing.soil_type);
        let elevation = input.elevation.or(existing.elevation);
        let slope = input.slope.or(existing.slope);
        let drainage = input.drainage.or(existing.drainage);

        let field = sqlx::query_as::<_, FieldMap>(&format!(
            r#"
            UPDATE field_maps
            SET field_name = $1, coordinates = $2, area = $3, soil_type = $4, elevation = $5,
                slope = $6, drainage = $7, soil_parameters = $8, weather_data = $9,
                updated_at = NOW()
            WHERE id = $10
            RETURNING {FIELD_COLUMNS}
            "#
        ))
        .bind(&field_name)
        .bind(Json(&coordinates))
        .bind(area)
        .bind(&soil_type)
        .bind(elevation)
        .bind(slope)
        .bind(&drainage)
        .bind(Json(&soil_parameters))
        .bind(Json(&weather_data))
        .bind(field_id)
        .fetch_one(&self.db)
        .await?;

        Ok(field)
    }

    /// Soft delete a field
    pub async fn delete_field(&self, field_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE field_maps SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3",
        )
        .bind(FieldStatus::Deleted.as_str())
        .bind(field_id)
        .bind(FieldStatus::Active.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Field".to_string()));
        }

        tracing::info!("Deleted field {}", field_id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_shape() {
        let point = GeoPoint::new(13.7, 100.5);
        assert!(check_shape(Some("North"), Some(&[point]), Some(Decimal::ONE)).is_ok());
        assert!(check_shape(None, None, None).is_ok());

        match check_shape(Some("North"), Some(&[]), Some(Decimal::ONE)) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "coordinates"),
            other => panic!("unexpected {:?}", other),
        }
        match check_shape(Some(" "), Some(&[point]), Some(Decimal::ONE)) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "field_name"),
            other => panic!("unexpected {:?}", other),
        }
        match check_shape(None, None, Some(Decimal::ZERO)) {
            Err(AppError::Validation { field, .. }) => assert_eq!(field, "area"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_create_input_accepts_numeric_area() {
        let input: CreateFieldInput = serde_json::from_str(
            r#"{
                "field_name": "Paddy 3",
                "coordinates": [{"lat": 13.7, "lng": 100.5}, {"lat": 13.71, "lng": 100.51}],
                "area": 2.5,
                "soil_parameters": {"ph": 6.4}
            }"#,
        )
        .unwrap();

        assert_eq!(input.area, Decimal::new(25, 1));
        assert_eq!(input.soil_parameters.ph, Some(6.4));
        assert_eq!(input.weather_data, FieldWeather::default());
        assert!(input.validate().is_ok());
    }
}

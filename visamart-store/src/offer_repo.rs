use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use visamart_offer::{DeleteOutcome, OfferRepository, OfferStatus, OfferTerms, ReserveOutcome, VisaOffer};

pub struct PostgresOfferRepository {
    pool: PgPool,
}

impl PostgresOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: Uuid,
    seller_agency_id: Uuid,
    visa_type: String,
    destination_country: String,
    processing_days: i32,
    unit_price_cents: i64,
    currency: String,
    total_quantity: i32,
    available_quantity: i32,
    status: String,
    notes: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OfferRow {
    fn into_offer(self) -> Result<VisaOffer, Box<dyn std::error::Error + Send + Sync>> {
        Ok(VisaOffer {
            id: self.id,
            seller_agency_id: self.seller_agency_id,
            visa_type: self.visa_type,
            destination_country: self.destination_country,
            processing_days: self.processing_days,
            unit_price_cents: self.unit_price_cents,
            currency: self.currency,
            total_quantity: self.total_quantity,
            available_quantity: self.available_quantity,
            status: self.status.parse::<OfferStatus>()?,
            notes: self.notes,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const OFFER_COLUMNS: &str = "id, seller_agency_id, visa_type, destination_country, \
     processing_days, unit_price_cents, currency, total_quantity, available_quantity, \
     status, notes, expires_at, created_at, updated_at";

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn create_offer(
        &self,
        offer: &VisaOffer,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO visa_offers
                (id, seller_agency_id, visa_type, destination_country, processing_days,
                 unit_price_cents, currency, total_quantity, available_quantity, status,
                 notes, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(offer.id)
        .bind(offer.seller_agency_id)
        .bind(&offer.visa_type)
        .bind(&offer.destination_country)
        .bind(offer.processing_days)
        .bind(offer.unit_price_cents)
        .bind(&offer.currency)
        .bind(offer.total_quantity)
        .bind(offer.available_quantity)
        .bind(offer.status.to_string())
        .bind(offer.notes.as_deref())
        .bind(offer.expires_at)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_offer(
        &self,
        id: Uuid,
    ) -> Result<Option<VisaOffer>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {} FROM visa_offers WHERE id = $1",
            OFFER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OfferRow::into_offer).transpose()
    }

    async fn list_open_offers(
        &self,
        exclude_agency: Uuid,
    ) -> Result<Vec<VisaOffer>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r#"
            SELECT {}
            FROM visa_offers
            WHERE status = 'ACTIVE'
              AND available_quantity > 0
              AND seller_agency_id <> $1
              AND (expires_at IS NULL OR expires_at > NOW())
            ORDER BY created_at DESC
            "#,
            OFFER_COLUMNS
        ))
        .bind(exclude_agency)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OfferRow::into_offer).collect()
    }

    async fn list_seller_offers(
        &self,
        seller_agency_id: Uuid,
    ) -> Result<Vec<VisaOffer>, Box<dyn std::error::Error + Send + Sync>> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {} FROM visa_offers WHERE seller_agency_id = $1 ORDER BY created_at DESC",
            OFFER_COLUMNS
        ))
        .bind(seller_agency_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(OfferRow::into_offer).collect()
    }

    async fn update_terms(
        &self,
        id: Uuid,
        terms: &OfferTerms,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            UPDATE visa_offers
            SET visa_type = $2,
                destination_country = $3,
                processing_days = $4,
                unit_price_cents = $5,
                currency = $6,
                notes = $7,
                expires_at = $8,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&terms.visa_type)
        .bind(&terms.destination_country)
        .bind(terms.processing_days)
        .bind(terms.unit_price_cents)
        .bind(&terms.currency)
        .bind(terms.notes.as_deref())
        .bind(terms.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: OfferStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        // Re-checked at write time: a drained offer may not go back to ACTIVE
        // even if the caller read a stale positive quantity.
        let result = sqlx::query(
            r#"
            UPDATE visa_offers
            SET status = $2, updated_at = NOW()
            WHERE id = $1
              AND ($2 <> 'ACTIVE' OR available_quantity > 0)
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_offer(
        &self,
        id: Uuid,
    ) -> Result<DeleteOutcome, Box<dyn std::error::Error + Send + Sync>> {
        // Bookings are financial records; the guard and the delete are one
        // statement so a concurrent placement cannot slip between them.
        let result = sqlx::query(
            r#"
            DELETE FROM visa_offers
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM bookings WHERE bookings.offer_id = $1)
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::InUse)
        }
    }

    async fn reserve(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<ReserveOutcome, Box<dyn std::error::Error + Send + Sync>> {
        // The WHERE clause is the compare-and-swap: the decrement applies
        // only if the persisted quantity still covers the request at write
        // time, and the SOLD_OUT flip rides the same statement.
        let row = sqlx::query_as::<_, (i32, String)>(
            r#"
            UPDATE visa_offers
            SET available_quantity = available_quantity - $2,
                status = CASE WHEN available_quantity - $2 = 0 THEN 'SOLD_OUT' ELSE status END,
                updated_at = NOW()
            WHERE id = $1 AND available_quantity >= $2
            RETURNING available_quantity, status
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((remaining, status)) => Ok(ReserveOutcome::Reserved {
                remaining,
                status: status.parse::<OfferStatus>()?,
            }),
            None => Ok(ReserveOutcome::Conflict),
        }
    }

    async fn restore(
        &self,
        id: Uuid,
        quantity: i32,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>> {
        let available: i32 = sqlx::query_scalar(
            r#"
            UPDATE visa_offers
            SET available_quantity = available_quantity + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING available_quantity
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(available)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;
use visamart_booking::{
    Applicant, Booking, BookingRepository, BookingStatus, InsertOutcome, RejectOutcome,
    UnreadCounts,
};
use visamart_core::PartyRole;

pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    offer_id: Uuid,
    buyer_agency_id: Uuid,
    seller_agency_id: Uuid,
    quantity: i32,
    applicants: Json<Vec<Applicant>>,
    total_amount_cents: i64,
    discount_cents: i64,
    final_amount_cents: i64,
    currency: String,
    payment_method: String,
    receipt_url: Option<String>,
    status: String,
    is_read_by_buyer: bool,
    is_read_by_seller: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<Booking, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Booking {
            id: self.id,
            reference: self.reference,
            offer_id: self.offer_id,
            buyer_agency_id: self.buyer_agency_id,
            seller_agency_id: self.seller_agency_id,
            quantity: self.quantity,
            applicants: self.applicants.0,
            total_amount_cents: self.total_amount_cents,
            discount_cents: self.discount_cents,
            final_amount_cents: self.final_amount_cents,
            currency: self.currency,
            payment_method: self.payment_method,
            receipt_url: self.receipt_url,
            status: self.status.parse::<BookingStatus>()?,
            is_read_by_buyer: self.is_read_by_buyer,
            is_read_by_seller: self.is_read_by_seller,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, reference, offer_id, buyer_agency_id, seller_agency_id, \
     quantity, applicants, total_amount_cents, discount_cents, final_amount_cents, currency, \
     payment_method, receipt_url, status, is_read_by_buyer, is_read_by_seller, created_at, \
     updated_at";

fn party_column(role: PartyRole) -> &'static str {
    match role {
        PartyRole::Buyer => "buyer_agency_id",
        PartyRole::Seller => "seller_agency_id",
    }
}

fn statuses(expected: &[BookingStatus]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    async fn create_booking(
        &self,
        booking: &Booking,
    ) -> Result<InsertOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            INSERT INTO bookings
                (id, reference, offer_id, buyer_agency_id, seller_agency_id, quantity,
                 applicants, total_amount_cents, discount_cents, final_amount_cents,
                 currency, payment_method, receipt_url, status, is_read_by_buyer,
                 is_read_by_seller, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.reference)
        .bind(booking.offer_id)
        .bind(booking.buyer_agency_id)
        .bind(booking.seller_agency_id)
        .bind(booking.quantity)
        .bind(Json(&booking.applicants))
        .bind(booking.total_amount_cents)
        .bind(booking.discount_cents)
        .bind(booking.final_amount_cents)
        .bind(&booking.currency)
        .bind(&booking.payment_method)
        .bind(booking.receipt_url.as_deref())
        .bind(booking.status.to_string())
        .bind(booking.is_read_by_buyer)
        .bind(booking.is_read_by_seller)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::DuplicateReference)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get_booking(
        &self,
        id: Uuid,
    ) -> Result<Option<Booking>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn list_for_party(
        &self,
        agency_id: Uuid,
        role: PartyRole,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Booking>, i64), Box<dyn std::error::Error + Send + Sync>> {
        let column = party_column(role);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookings WHERE {} = $1",
            column
        ))
        .bind(agency_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE {} = $1 ORDER BY created_at DESC OFFSET $2 LIMIT $3",
            BOOKING_COLUMNS, column
        ))
        .bind(agency_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let bookings = rows
            .into_iter()
            .map(BookingRow::into_booking)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((bookings, total))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        // Guarded on the expected source status so racing seller sessions
        // cannot produce a lost update.
        let result = sqlx::query(
            "UPDATE bookings SET status = $3, updated_at = NOW() WHERE id = $1 AND status = ANY($2)",
        )
        .bind(id)
        .bind(statuses(expected))
        .bind(to.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn reject_restocking(
        &self,
        id: Uuid,
        expected: &[BookingStatus],
    ) -> Result<RejectOutcome, Box<dyn std::error::Error + Send + Sync>> {
        // Status write and stock restore commit together or not at all; the
        // guarded status flip doubles as the double-restore lock.
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            UPDATE bookings
            SET status = 'REJECTED', updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            RETURNING offer_id, quantity
            "#,
        )
        .bind(id)
        .bind(statuses(expected))
        .fetch_optional(&mut *tx)
        .await?;

        let Some((offer_id, quantity)) = flipped else {
            return Ok(RejectOutcome::StaleStatus);
        };

        let restored_available: i32 = sqlx::query_scalar(
            r#"
            UPDATE visa_offers
            SET available_quantity = available_quantity + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING available_quantity
            "#,
        )
        .bind(offer_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RejectOutcome::Rejected { restored_available })
    }

    async fn mark_read(
        &self,
        agency_id: Uuid,
        role: PartyRole,
    ) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let (flag, column) = match role {
            PartyRole::Buyer => ("is_read_by_buyer", "buyer_agency_id"),
            PartyRole::Seller => ("is_read_by_seller", "seller_agency_id"),
        };

        let result = sqlx::query(&format!(
            "UPDATE bookings SET {flag} = TRUE WHERE {column} = $1 AND {flag} = FALSE"
        ))
        .bind(agency_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn unread_counts(
        &self,
        agency_id: Uuid,
    ) -> Result<UnreadCounts, Box<dyn std::error::Error + Send + Sync>> {
        // Only fresh incoming requests count on the sales side; any unread
        // status change counts for the buyer.
        let sales: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE seller_agency_id = $1
              AND is_read_by_seller = FALSE
              AND status = 'SUBMITTED'
            "#,
        )
        .bind(agency_id)
        .fetch_one(&self.pool)
        .await?;

        let purchases: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE buyer_agency_id = $1 AND is_read_by_buyer = FALSE",
        )
        .bind(agency_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UnreadCounts { sales, purchases })
    }
}

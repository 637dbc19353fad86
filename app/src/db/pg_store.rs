// app/src/db/pg_store.rs

use async_trait::async_trait;
use mealbox::ports::{PaymentChange, ReviewModeration, StatusChange};
use mealbox::{Order, OrderItem, OrderStore, Review, StatusHistoryEntry, StoreError};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::rows::{
  actor_columns, weekday_labels, HistoryRow, OrderItemRow, OrderRow, ReviewRow, HISTORY_COLUMNS, ITEM_COLUMNS,
  ORDER_COLUMNS, REVIEW_COLUMNS,
};

/// Maps a driver error into the store taxonomy. Unique violations keep the
/// constraint name so callers can tell order-number clashes from duplicate reviews.
fn store_error(err: sqlx::Error) -> StoreError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return StoreError::UniqueViolation {
        constraint: db_err.constraint().unwrap_or("unknown").to_string(),
      };
    }
  }
  StoreError::Backend { source: err.into() }
}

/// Postgres-backed [`OrderStore`].
#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  async fn insert_history(tx: &mut Transaction<'_, Postgres>, entry: &StatusHistoryEntry) -> Result<(), StoreError> {
    let (actor_kind, actor_id) = actor_columns(&entry.actor);
    sqlx::query(
      "INSERT INTO order_status_history (id, order_id, status, actor_kind, actor_id, note, created_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(entry.id)
    .bind(entry.order_id)
    .bind(entry.status.as_str())
    .bind(actor_kind)
    .bind(actor_id)
    .bind(entry.note.as_deref())
    .bind(entry.created_at)
    .execute(&mut **tx)
    .await
    .map_err(store_error)?;
    Ok(())
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "pg_store::insert_order", skip_all, fields(order_id = %order.id, items = items.len()))]
  async fn insert_order(
    &self,
    order: &Order,
    items: &[OrderItem],
    initial_entry: &StatusHistoryEntry,
  ) -> Result<(), StoreError> {
    let mut tx = self.pool.begin().await.map_err(store_error)?;

    sqlx::query(
      "INSERT INTO orders (id, order_number, member_id, status, payment_status, payment_method, \
       payment_transaction_id, total_amount, discount_amount, promo_discount, final_amount, promo_code, meal_count, \
       delivery_days, delivery_address_id, delivery_date, delivery_time_slot, created_at, updated_at, cancelled_at, \
       delivered_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.member_id)
    .bind(order.status.as_str())
    .bind(order.payment_status.as_str())
    .bind(order.payment_method.as_str())
    .bind(order.payment_transaction_id.as_deref())
    .bind(order.amounts.total_amount)
    .bind(order.amounts.discount_amount)
    .bind(order.amounts.promo_discount)
    .bind(order.amounts.final_amount)
    .bind(order.promo_code.as_deref())
    .bind(order.meal_count)
    .bind(weekday_labels(&order.delivery_days))
    .bind(order.delivery_address_id)
    .bind(order.delivery_date)
    .bind(&order.delivery_time_slot)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.cancelled_at)
    .bind(order.delivered_at)
    .execute(&mut *tx)
    .await
    .map_err(store_error)?;

    for item in items {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, meal_id, meal_name, meal_category, calories, protein_grams, \
         carbs_grams, fat_grams, quantity, unit_price, total_price, delivery_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
      )
      .bind(item.id)
      .bind(item.order_id)
      .bind(item.meal.meal_id)
      .bind(&item.meal.name)
      .bind(&item.meal.category)
      .bind(item.meal.calories)
      .bind(item.meal.protein_grams)
      .bind(item.meal.carbs_grams)
      .bind(item.meal.fat_grams)
      .bind(item.quantity)
      .bind(item.unit_price)
      .bind(item.total_price)
      .bind(item.delivery_date)
      .execute(&mut *tx)
      .await
      .map_err(store_error)?;
    }

    Self::insert_history(&mut tx, initial_entry).await?;
    tx.commit().await.map_err(store_error)?;
    debug!("Order, items and initial history row committed.");
    Ok(())
  }

  #[instrument(name = "pg_store::find_order", skip(self))]
  async fn find_order(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "pg_store::order_items", skip(self))]
  async fn order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, StoreError> {
    let sql = format!(
      "SELECT {} FROM order_items WHERE order_id = $1 ORDER BY delivery_date, meal_name",
      ITEM_COLUMNS
    );
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
      .bind(order_id)
      .fetch_all(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(rows.into_iter().map(OrderItem::from).collect())
  }

  #[instrument(name = "pg_store::status_history", skip(self))]
  async fn status_history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, StoreError> {
    let sql = format!(
      "SELECT {} FROM order_status_history WHERE order_id = $1 ORDER BY seq",
      HISTORY_COLUMNS
    );
    let rows = sqlx::query_as::<_, HistoryRow>(&sql)
      .bind(order_id)
      .fetch_all(&self.pool)
      .await
      .map_err(store_error)?;
    rows.into_iter().map(StatusHistoryEntry::try_from).collect()
  }

  #[instrument(
    name = "pg_store::apply_transition",
    skip_all,
    fields(order_id = %change.order_id, expected = %change.expected, target = %change.target)
  )]
  async fn apply_transition(&self, change: &StatusChange) -> Result<Option<Order>, StoreError> {
    let mut tx = self.pool.begin().await.map_err(store_error)?;

    // Compare-and-set on the status column; zero rows means another writer won.
    let sql = format!(
      "UPDATE orders SET status = $1, updated_at = $2, \
       cancelled_at = COALESCE($3, cancelled_at), delivered_at = COALESCE($4, delivered_at) \
       WHERE id = $5 AND status = $6 RETURNING {}",
      ORDER_COLUMNS
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(change.target.as_str())
      .bind(change.at)
      .bind(change.cancelled_at)
      .bind(change.delivered_at)
      .bind(change.order_id)
      .bind(change.expected.as_str())
      .fetch_optional(&mut *tx)
      .await
      .map_err(store_error)?;

    let Some(row) = row else {
      tx.rollback().await.map_err(store_error)?;
      debug!("Status changed concurrently; nothing written.");
      return Ok(None);
    };
    let order = Order::try_from(row)?;

    Self::insert_history(&mut tx, &change.entry).await?;
    tx.commit().await.map_err(store_error)?;
    Ok(Some(order))
  }

  #[instrument(
    name = "pg_store::update_payment",
    skip_all,
    fields(order_id = %change.order_id, expected = %change.expected, target = %change.target)
  )]
  async fn update_payment(&self, change: &PaymentChange) -> Result<Option<Order>, StoreError> {
    let sql = format!(
      "UPDATE orders SET payment_status = $1, updated_at = $2, \
       payment_transaction_id = COALESCE($3, payment_transaction_id) \
       WHERE id = $4 AND payment_status = $5 RETURNING {}",
      ORDER_COLUMNS
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(change.target.as_str())
      .bind(change.at)
      .bind(change.transaction_id.as_deref())
      .bind(change.order_id)
      .bind(change.expected.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "pg_store::member_email", skip(self))]
  async fn member_email(&self, member_id: Uuid) -> Result<Option<String>, StoreError> {
    sqlx::query_scalar::<_, String>("SELECT email FROM members WHERE id = $1")
      .bind(member_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)
  }

  #[instrument(name = "pg_store::find_review", skip(self))]
  async fn find_review(&self, review_id: Uuid) -> Result<Option<Review>, StoreError> {
    let sql = format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS);
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
      .bind(review_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    row.map(Review::try_from).transpose()
  }

  #[instrument(name = "pg_store::review_for_order", skip(self))]
  async fn review_for_order(&self, order_id: Uuid) -> Result<Option<Review>, StoreError> {
    let sql = format!("SELECT {} FROM reviews WHERE order_id = $1", REVIEW_COLUMNS);
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    row.map(Review::try_from).transpose()
  }

  #[instrument(name = "pg_store::insert_review", skip_all, fields(review_id = %review.id, order_id = %review.order_id))]
  async fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
    sqlx::query(
      "INSERT INTO reviews (id, order_id, member_id, rating, taste_rating, portion_rating, freshness_rating, \
       packaging_rating, delivery_rating, comment, status, created_at, moderated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(review.id)
    .bind(review.order_id)
    .bind(review.member_id)
    .bind(review.rating)
    .bind(review.categories.taste)
    .bind(review.categories.portion)
    .bind(review.categories.freshness)
    .bind(review.categories.packaging)
    .bind(review.categories.delivery)
    .bind(review.comment.as_deref())
    .bind(review.status.as_str())
    .bind(review.created_at)
    .bind(review.moderated_at)
    .execute(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(())
  }

  #[instrument(
    name = "pg_store::moderate_review",
    skip_all,
    fields(review_id = %change.review_id, target = %change.target)
  )]
  async fn moderate_review(&self, change: &ReviewModeration) -> Result<Option<Review>, StoreError> {
    let sql = format!(
      "UPDATE reviews SET status = $1, moderated_at = $2 WHERE id = $3 AND status = $4 RETURNING {}",
      REVIEW_COLUMNS
    );
    let row = sqlx::query_as::<_, ReviewRow>(&sql)
      .bind(change.target.as_str())
      .bind(change.at)
      .bind(change.review_id)
      .bind(change.expected.as_str())
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    row.map(Review::try_from).transpose()
  }
}

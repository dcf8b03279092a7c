use async_trait::async_trait;
use common::{Customer, CustomerId, WorkOrder, WorkOrderId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError, WorkOrderFilter,
    repository::{CustomerRepository, WorkOrderRepository},
};

const CUSTOMER_COLUMNS: &str =
    "id, first_name, last_name, address, start_date, end_date, is_active, created_at";

const WORK_ORDER_SELECT: &str = r#"
    SELECT w.id, w.customer_id, w.description, w.planned_date_begin, w.planned_date_end,
           w.status, w.type, w.created_at,
           c.first_name AS c_first_name, c.last_name AS c_last_name, c.address AS c_address,
           c.start_date AS c_start_date, c.end_date AS c_end_date,
           c.is_active AS c_is_active, c.created_at AS c_created_at
    FROM work_orders w
    JOIN customers c ON c.id = w.customer_id
"#;

/// PostgreSQL-backed gateway implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the database migrations (customers, work orders and stream tables).
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_customer(row: &PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            address: row.try_get("address")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_work_order(row: PgRow) -> Result<WorkOrder> {
        let customer_id = CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?);
        let status: String = row.try_get("status")?;
        let kind: String = row.try_get("type")?;

        let customer = Customer {
            id: customer_id,
            first_name: row.try_get("c_first_name")?,
            last_name: row.try_get("c_last_name")?,
            address: row.try_get("c_address")?,
            start_date: row.try_get("c_start_date")?,
            end_date: row.try_get("c_end_date")?,
            is_active: row.try_get("c_is_active")?,
            created_at: row.try_get("c_created_at")?,
        };

        Ok(WorkOrder {
            id: WorkOrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id,
            description: row.try_get("description")?,
            planned_date_begin: row.try_get("planned_date_begin")?,
            planned_date_end: row.try_get("planned_date_end")?,
            status: status.parse()?,
            kind: kind.parse()?,
            created_at: row.try_get("created_at")?,
            customer: Some(customer),
        })
    }

    fn map_insert_error(e: sqlx::Error, entity: &'static str, id: String) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e {
            match db_err.constraint() {
                Some("customers_pkey") | Some("work_orders_pkey") => {
                    return StoreError::DuplicateId { entity, id };
                }
                Some("fk_work_orders_customer") => {
                    return StoreError::UnknownCustomer(id);
                }
                _ => {}
            }
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl CustomerRepository for PostgresStore {
    #[tracing::instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, first_name, last_name, address, start_date, end_date, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.address)
        .bind(customer.start_date)
        .bind(customer.end_date)
        .bind(customer.is_active)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Self::map_insert_error(e, "customer", customer.id.to_string()))?;

        Ok(())
    }

    async fn find_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }

    async fn find_active_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = TRUE ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    async fn find_all_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_customer).collect()
    }

    #[tracing::instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn update_customer(&self, customer: &Customer) -> Result<()> {
        if customer.id.is_nil() {
            return Err(StoreError::MissingIdentifier { entity: "customer" });
        }

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET first_name = $2, last_name = $3, address = $4,
                start_date = $5, end_date = $6, is_active = $7
            WHERE id = $1
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.address)
        .bind(customer.start_date)
        .bind(customer.end_date)
        .bind(customer.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "customer",
                id: customer.id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl WorkOrderRepository for PostgresStore {
    #[tracing::instrument(skip(self, work_order), fields(work_order_id = %work_order.id))]
    async fn create_work_order(&self, work_order: &WorkOrder) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO work_orders (id, customer_id, description, planned_date_begin, planned_date_end, status, type, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(work_order.id.as_uuid())
        .bind(work_order.customer_id.as_uuid())
        .bind(&work_order.description)
        .bind(work_order.planned_date_begin)
        .bind(work_order.planned_date_end)
        .bind(work_order.status.as_str())
        .bind(work_order.kind.as_str())
        .bind(work_order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match Self::map_insert_error(e, "work order", work_order.id.to_string()) {
            StoreError::UnknownCustomer(_) => {
                StoreError::UnknownCustomer(work_order.customer_id.to_string())
            }
            other => other,
        })?;

        Ok(())
    }

    async fn find_work_order(&self, id: WorkOrderId) -> Result<Option<WorkOrder>> {
        let row = sqlx::query(&format!("{WORK_ORDER_SELECT} WHERE w.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_work_order).transpose()
    }

    async fn find_work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>> {
        let mut sql = format!("{WORK_ORDER_SELECT} WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if filter.since.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND w.planned_date_begin >= ${param_count}"));
        }
        if filter.until.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND w.planned_date_end <= ${param_count}"));
        }
        if filter.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND w.status = ${param_count}"));
        }

        sql.push_str(" ORDER BY w.created_at ASC, w.id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(since) = filter.since {
            query = query.bind(since);
        }
        if let Some(until) = filter.until {
            query = query.bind(until);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_work_order).collect()
    }

    async fn find_work_orders_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<WorkOrder>> {
        let rows = sqlx::query(&format!(
            "{WORK_ORDER_SELECT} WHERE w.customer_id = $1 ORDER BY w.created_at ASC, w.id ASC"
        ))
        .bind(customer_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_work_order).collect()
    }

    #[tracing::instrument(skip(self, work_order), fields(work_order_id = %work_order.id))]
    async fn update_work_order(&self, work_order: &WorkOrder) -> Result<()> {
        if work_order.id.is_nil() {
            return Err(StoreError::MissingIdentifier {
                entity: "work order",
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET customer_id = $2, description = $3, planned_date_begin = $4,
                planned_date_end = $5, status = $6, type = $7
            WHERE id = $1
            "#,
        )
        .bind(work_order.id.as_uuid())
        .bind(work_order.customer_id.as_uuid())
        .bind(&work_order.description)
        .bind(work_order.planned_date_begin)
        .bind(work_order.planned_date_end)
        .bind(work_order.status.as_str())
        .bind(work_order.kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match Self::map_insert_error(e, "work order", work_order.id.to_string()) {
            StoreError::UnknownCustomer(_) => {
                StoreError::UnknownCustomer(work_order.customer_id.to_string())
            }
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "work order",
                id: work_order.id.to_string(),
            });
        }
        Ok(())
    }
}

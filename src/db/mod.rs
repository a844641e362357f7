use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, StoreError, is_missing_sort_order};
use crate::models::{
    Activity, Company, Contractor, MeasurementSheet, PurchaseOrder, SheetLine, Site, StoredLines,
    Worker, now_millis,
};

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

/// Sheet header row as stored, legacy columns included.
#[derive(sqlx::FromRow)]
struct SheetRow {
    id: i32,
    priced: bool,
    client_name: String,
    client_email: String,
    client_phone1: String,
    client_phone2: String,
    contractor: String,
    site_names: Vec<String>,
    sheet_date: NaiveDate,
    legacy_description: Option<String>,
    legacy_length: Option<String>,
    legacy_height: Option<String>,
    legacy_quantity: Option<String>,
    legacy_total: Option<String>,
    legacy_notes: Option<String>,
    created_at: i64,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(config.database_url())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Fetch a collection ordered by created_at descending. When the ordered
    /// read fails because the sort column or its index is missing, fall back
    /// once to an unordered read and sort client-side.
    async fn fetch_ordered<T>(&self, base: &str, sort_key: impl Fn(&T) -> i64) -> Result<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let ordered = format!("{base} ORDER BY created_at DESC");
        match sqlx::query_as::<_, T>(&ordered).fetch_all(&self.pool).await {
            Ok(rows) => Ok(rows),
            Err(err) if is_missing_sort_order(&err) => {
                warn!("ordered read failed ({err}), retrying without ORDER BY");
                let mut rows = sqlx::query_as::<_, T>(base)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(StoreError::from_db)?;
                sort_newest_first(&mut rows, sort_key);
                Ok(rows)
            }
            Err(err) => Err(StoreError::from_db(err)),
        }
    }

    // Company operations
    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        self.fetch_ordered("SELECT * FROM companies", |c: &Company| c.created_at)
            .await
    }

    pub async fn get_company(&self, id: i32) -> Result<Company> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(company)
    }

    pub async fn create_company(&self, company: &Company) -> Result<i32> {
        company.validate()?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO companies (name, address, phone, phone2, email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.phone2)
        .bind(&company.email)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(id)
    }

    pub async fn update_company(&self, company: &Company) -> Result<()> {
        company.validate()?;

        sqlx::query(
            r#"
            UPDATE companies
            SET name = $1, address = $2, phone = $3, phone2 = $4, email = $5
            WHERE id = $6
            "#,
        )
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.phone2)
        .bind(&company.email)
        .bind(company.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(())
    }

    pub async fn delete_company(&self, id: i32) -> Result<()> {
        // Remove site associations first, then the company itself.
        let mut tx = self.pool.begin().await.map_err(StoreError::from_db)?;

        sqlx::query("DELETE FROM site_companies WHERE company_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

        sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

        tx.commit().await.map_err(StoreError::from_db)?;

        Ok(())
    }

    // Contractor operations
    pub async fn list_contractors(&self) -> Result<Vec<Contractor>> {
        self.fetch_ordered("SELECT * FROM contractors", |c: &Contractor| c.created_at)
            .await
    }

    pub async fn create_contractor(&self, contractor: &Contractor) -> Result<i32> {
        contractor.validate()?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO contractors (name, address, phone, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&contractor.name)
        .bind(&contractor.address)
        .bind(&contractor.phone)
        .bind(&contractor.email)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(id)
    }

    pub async fn update_contractor(&self, contractor: &Contractor) -> Result<()> {
        contractor.validate()?;

        sqlx::query(
            r#"
            UPDATE contractors
            SET name = $1, address = $2, phone = $3, email = $4
            WHERE id = $5
            "#,
        )
        .bind(&contractor.name)
        .bind(&contractor.address)
        .bind(&contractor.phone)
        .bind(&contractor.email)
        .bind(contractor.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(())
    }

    pub async fn delete_contractor(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM contractors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }

    // Worker operations
    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        self.fetch_ordered("SELECT * FROM workers", |w: &Worker| w.created_at)
            .await
    }

    pub async fn create_worker(&self, worker: &Worker) -> Result<i32> {
        worker.validate()?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO workers (name, alias, address, phone, job, company, work_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&worker.name)
        .bind(&worker.alias)
        .bind(&worker.address)
        .bind(&worker.phone)
        .bind(&worker.job)
        .bind(&worker.company)
        .bind(&worker.work_status)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(id)
    }

    pub async fn update_worker(&self, worker: &Worker) -> Result<()> {
        worker.validate()?;

        sqlx::query(
            r#"
            UPDATE workers
            SET name = $1, alias = $2, address = $3, phone = $4, job = $5,
                company = $6, work_status = $7
            WHERE id = $8
            "#,
        )
        .bind(&worker.name)
        .bind(&worker.alias)
        .bind(&worker.address)
        .bind(&worker.phone)
        .bind(&worker.job)
        .bind(&worker.company)
        .bind(&worker.work_status)
        .bind(worker.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(())
    }

    pub async fn delete_worker(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM workers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }

    // Site operations. Associated companies live in site_companies and are
    // written in the same transaction as the site row.
    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        self.fetch_ordered("SELECT * FROM sites", |s: &Site| s.created_at)
            .await
    }

    pub async fn get_site(&self, id: i32) -> Result<Site> {
        let site = sqlx::query_as::<_, Site>("SELECT * FROM sites WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(site)
    }

    pub async fn site_company_ids(&self, site_id: i32) -> Result<Vec<i32>> {
        let ids: Vec<i32> =
            sqlx::query_scalar("SELECT company_id FROM site_companies WHERE site_id = $1")
                .bind(site_id)
                .fetch_all(&self.pool)
                .await
                .map_err(StoreError::from_db)?;

        Ok(ids)
    }

    pub async fn save_site(&self, site: &Site, company_ids: &[i32]) -> Result<i32> {
        site.validate()?;

        let mut tx = self.pool.begin().await.map_err(StoreError::from_db)?;

        let site_id = if site.id == 0 {
            let id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO sites (name, contractor, foreman, foreman_phone, site_manager,
                                   site_manager_phone, address, town, status, start_date,
                                   request_ref, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING id
                "#,
            )
            .bind(&site.name)
            .bind(&site.contractor)
            .bind(&site.foreman)
            .bind(&site.foreman_phone)
            .bind(&site.site_manager)
            .bind(&site.site_manager_phone)
            .bind(&site.address)
            .bind(&site.town)
            .bind(&site.status)
            .bind(&site.start_date)
            .bind(&site.request_ref)
            .bind(now_millis())
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

            id
        } else {
            sqlx::query(
                r#"
                UPDATE sites
                SET name = $1, contractor = $2, foreman = $3, foreman_phone = $4,
                    site_manager = $5, site_manager_phone = $6, address = $7, town = $8,
                    status = $9, start_date = $10, request_ref = $11
                WHERE id = $12
                "#,
            )
            .bind(&site.name)
            .bind(&site.contractor)
            .bind(&site.foreman)
            .bind(&site.foreman_phone)
            .bind(&site.site_manager)
            .bind(&site.site_manager_phone)
            .bind(&site.address)
            .bind(&site.town)
            .bind(&site.status)
            .bind(&site.start_date)
            .bind(&site.request_ref)
            .bind(site.id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

            sqlx::query("DELETE FROM site_companies WHERE site_id = $1")
                .bind(site.id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_db)?;

            site.id
        };

        for company_id in company_ids {
            sqlx::query("INSERT INTO site_companies (site_id, company_id) VALUES ($1, $2)")
                .bind(site_id)
                .bind(company_id)
                .execute(&mut *tx)
                .await
                .map_err(|err| match &err {
                    // foreign_key_violation: the associated company is gone
                    sqlx::Error::Database(db) if db.code().as_deref() == Some("23503") => {
                        StoreError::InvalidReference("Empresa")
                    }
                    _ => StoreError::from_db(err),
                })?;
        }

        tx.commit().await.map_err(StoreError::from_db)?;

        Ok(site_id)
    }

    pub async fn delete_site(&self, id: i32) -> Result<()> {
        // site_companies rows go with the site (ON DELETE CASCADE)
        sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }

    // Activity operations
    pub async fn list_activities(&self) -> Result<Vec<Activity>> {
        self.fetch_ordered("SELECT * FROM activities", |a: &Activity| a.created_at)
            .await
    }

    pub async fn create_activity(&self, activity: &Activity) -> Result<i32> {
        activity.validate()?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO activities (description, created_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(&activity.description)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(id)
    }

    pub async fn update_activity(&self, activity: &Activity) -> Result<()> {
        activity.validate()?;

        sqlx::query("UPDATE activities SET description = $1 WHERE id = $2")
            .bind(&activity.description)
            .bind(activity.id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }

    pub async fn delete_activity(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }

    // Purchase order operations
    pub async fn list_purchase_orders(&self) -> Result<Vec<PurchaseOrder>> {
        self.fetch_ordered("SELECT * FROM purchase_orders", |p: &PurchaseOrder| {
            p.created_at
        })
        .await
    }

    pub async fn get_purchase_order(&self, id: i32) -> Result<PurchaseOrder> {
        let order =
            sqlx::query_as::<_, PurchaseOrder>("SELECT * FROM purchase_orders WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(StoreError::from_db)?;

        Ok(order)
    }

    pub async fn create_purchase_order(&self, order: &PurchaseOrder) -> Result<i32> {
        order.validate()?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO purchase_orders (order_date, description, quantity, cost, contractor,
                                         site, company, supplier, worker, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(order.order_date)
        .bind(&order.description)
        .bind(&order.quantity)
        .bind(&order.cost)
        .bind(&order.contractor)
        .bind(&order.site)
        .bind(&order.company)
        .bind(&order.supplier)
        .bind(&order.worker)
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(id)
    }

    pub async fn update_purchase_order(&self, order: &PurchaseOrder) -> Result<()> {
        order.validate()?;

        sqlx::query(
            r#"
            UPDATE purchase_orders
            SET order_date = $1, description = $2, quantity = $3, cost = $4, contractor = $5,
                site = $6, company = $7, supplier = $8, worker = $9
            WHERE id = $10
            "#,
        )
        .bind(order.order_date)
        .bind(&order.description)
        .bind(&order.quantity)
        .bind(&order.cost)
        .bind(&order.contractor)
        .bind(&order.site)
        .bind(&order.company)
        .bind(&order.supplier)
        .bind(&order.worker)
        .bind(order.id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        Ok(())
    }

    pub async fn delete_purchase_order(&self, id: i32) -> Result<()> {
        sqlx::query("DELETE FROM purchase_orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }

    // Measurement sheet operations. Reads normalize legacy single-measurement
    // rows through StoredLines; writes always produce the line-item shape.
    pub async fn list_sheets(&self, priced: bool) -> Result<Vec<MeasurementSheet>> {
        let rows: Vec<SheetRow> = {
            let base = if priced {
                "SELECT * FROM measurement_sheets WHERE priced = TRUE"
            } else {
                "SELECT * FROM measurement_sheets WHERE priced = FALSE"
            };
            self.fetch_ordered(base, |r: &SheetRow| r.created_at).await?
        };

        let mut sheets = Vec::with_capacity(rows.len());
        for row in rows {
            sheets.push(self.assemble_sheet(row).await?);
        }

        Ok(sheets)
    }

    pub async fn get_sheet(&self, id: i32) -> Result<MeasurementSheet> {
        let row = sqlx::query_as::<_, SheetRow>("SELECT * FROM measurement_sheets WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        self.assemble_sheet(row).await
    }

    async fn assemble_sheet(&self, row: SheetRow) -> Result<MeasurementSheet> {
        let lines: Vec<SheetLine> = sqlx::query_as(
            "SELECT * FROM sheet_lines WHERE sheet_id = $1 ORDER BY position ASC",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from_db)?;

        let stored = if lines.is_empty() && row.legacy_description.is_some() {
            StoredLines::LegacySingleItem {
                description: row.legacy_description.unwrap_or_default(),
                length: row.legacy_length.unwrap_or_default(),
                height: row.legacy_height.unwrap_or_default(),
                quantity: row.legacy_quantity.unwrap_or_default(),
                total: row.legacy_total.unwrap_or_default(),
                notes: row.legacy_notes.unwrap_or_default(),
            }
        } else {
            StoredLines::LineItemList(lines)
        };

        Ok(MeasurementSheet {
            id: row.id,
            priced: row.priced,
            client_name: row.client_name,
            client_email: row.client_email,
            client_phone1: row.client_phone1,
            client_phone2: row.client_phone2,
            contractor: row.contractor,
            site_names: row.site_names,
            sheet_date: row.sheet_date,
            lines: stored.normalize(),
            created_at: row.created_at,
        })
    }

    /// Create or overwrite a sheet together with its line items in one
    /// transaction. Legacy columns are cleared so the stored shape is always
    /// canonical after a write.
    pub async fn save_sheet(&self, sheet: &MeasurementSheet) -> Result<i32> {
        sheet.validate()?;

        let mut tx = self.pool.begin().await.map_err(StoreError::from_db)?;

        let sheet_id = if sheet.id == 0 {
            let id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO measurement_sheets (priced, client_name, client_email, client_phone1,
                                                client_phone2, contractor, site_names, sheet_date,
                                                created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id
                "#,
            )
            .bind(sheet.priced)
            .bind(&sheet.client_name)
            .bind(&sheet.client_email)
            .bind(&sheet.client_phone1)
            .bind(&sheet.client_phone2)
            .bind(&sheet.contractor)
            .bind(&sheet.site_names)
            .bind(sheet.sheet_date)
            .bind(now_millis())
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

            id
        } else {
            sqlx::query(
                r#"
                UPDATE measurement_sheets
                SET client_name = $1, client_email = $2, client_phone1 = $3, client_phone2 = $4,
                    contractor = $5, site_names = $6, sheet_date = $7,
                    legacy_description = NULL, legacy_length = NULL, legacy_height = NULL,
                    legacy_quantity = NULL, legacy_total = NULL, legacy_notes = NULL
                WHERE id = $8
                "#,
            )
            .bind(&sheet.client_name)
            .bind(&sheet.client_email)
            .bind(&sheet.client_phone1)
            .bind(&sheet.client_phone2)
            .bind(&sheet.contractor)
            .bind(&sheet.site_names)
            .bind(sheet.sheet_date)
            .bind(sheet.id)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

            sqlx::query("DELETE FROM sheet_lines WHERE sheet_id = $1")
                .bind(sheet.id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_db)?;

            sheet.id
        };

        for (position, line) in sheet.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sheet_lines (sheet_id, position, activity, description, length,
                                         height, quantity, total, notes, worker_price,
                                         worker_value, contractor_price, contractor_value)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(sheet_id)
            .bind(position as i32)
            .bind(&line.activity)
            .bind(&line.description)
            .bind(&line.length)
            .bind(&line.height)
            .bind(&line.quantity)
            .bind(&line.total)
            .bind(&line.notes)
            .bind(&line.worker_price)
            .bind(&line.worker_value)
            .bind(&line.contractor_price)
            .bind(&line.contractor_value)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;
        }

        tx.commit().await.map_err(StoreError::from_db)?;

        Ok(sheet_id)
    }

    pub async fn delete_sheet(&self, id: i32) -> Result<()> {
        // sheet_lines rows go with the sheet (ON DELETE CASCADE)
        sqlx::query("DELETE FROM measurement_sheets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from_db)?;

        Ok(())
    }
}

/// Newest-first ordering used when the server-side ORDER BY is unavailable.
fn sort_newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> i64) {
    rows.sort_by_key(|r| std::cmp::Reverse(key(r)));
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database> {
    let db = Database::new(config).await?;

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_sort_is_newest_first() {
        let mut companies = vec![
            Company {
                created_at: 100,
                ..Company::new()
            },
            Company {
                created_at: 300,
                ..Company::new()
            },
            Company {
                created_at: 200,
                ..Company::new()
            },
        ];
        sort_newest_first(&mut companies, |c| c.created_at);

        let stamps: Vec<i64> = companies.iter().map(|c| c.created_at).collect();
        assert_eq!(stamps, vec![300, 200, 100]);
    }
}

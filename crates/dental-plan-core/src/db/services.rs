//! Service price-list database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{Service, ServiceId};

impl Database {
    /// Insert or update a service from the backend price list.
    pub fn upsert_service(&self, service: &Service) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO services (id, name, price, category, active, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                category = excluded.category,
                active = 1,
                updated_at = datetime('now')
            "#,
            params![service.id, service.name, service.price, service.category],
        )?;
        Ok(())
    }

    /// Replace the local price list with a freshly fetched one.
    ///
    /// Services missing from `services` are deactivated, not deleted.
    pub fn sync_services(&mut self, services: &[Service]) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("UPDATE services SET active = 0", [])?;
        for service in services {
            tx.execute(
                r#"
                INSERT INTO services (id, name, price, category, active, updated_at)
                VALUES (?1, ?2, ?3, ?4, 1, datetime('now'))
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    price = excluded.price,
                    category = excluded.category,
                    active = 1,
                    updated_at = datetime('now')
                "#,
                params![service.id, service.name, service.price, service.category],
            )?;
        }
        tx.commit()?;
        tracing::debug!(count = services.len(), "synced service price list");
        Ok(())
    }

    /// Get a service by ID (active or not).
    pub fn get_service(&self, id: ServiceId) -> DbResult<Option<Service>> {
        let service = self
            .conn
            .query_row(
                "SELECT id, name, price, category FROM services WHERE id = ?",
                [id],
                row_to_service,
            )
            .optional()?;
        Ok(service)
    }

    /// List active services ordered by category, then name.
    pub fn list_services(&self) -> DbResult<Vec<Service>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, price, category
            FROM services
            WHERE active = 1
            ORDER BY category IS NULL, category, name
            "#,
        )?;

        let rows = stmt.query_map([], row_to_service)?;
        let mut services = Vec::new();
        for row in rows {
            services.push(row?);
        }
        Ok(services)
    }

    /// Mark a service as inactive (soft delete).
    pub fn deactivate_service(&self, id: ServiceId) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE services SET active = 0, updated_at = datetime('now') WHERE id = ?",
            [id],
        )?;
        Ok(rows_affected > 0)
    }
}

fn row_to_service(row: &rusqlite::Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        category: row.get(3)?,
    })
}

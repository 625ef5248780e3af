//! SQLite-backed projection store
//!
//! Uniqueness of the period key is enforced by an expression index, so a
//! concurrent writer on the same database file is rejected by SQLite itself
//! rather than by an application-level check.

use std::path::Path;

use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

use super::{check_batch, ProjectionStore};
use crate::error::{EngineError, Result};
use crate::period::PeriodKey;
use crate::projection::{FinancialProjection, ProjectionFields};

const COLUMNS: &str = "id, plan_id, year, month, quarter, revenue, cost_of_goods_sold, \
    operating_expenses, marketing_expenses, rd_expenses, administrative_expenses, other_expenses, \
    cash_flow, cash_balance, employee_count, customer_count, units_sold, growth_rate, notes, assumptions";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, creating the schema if it is missing
    pub fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS projections(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        plan_id INTEGER NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER,
        quarter INTEGER,
        revenue REAL,
        cost_of_goods_sold REAL,
        operating_expenses REAL,
        marketing_expenses REAL,
        rd_expenses REAL,
        administrative_expenses REAL,
        other_expenses REAL,
        cash_flow REAL,
        cash_balance REAL,
        employee_count INTEGER,
        customer_count INTEGER,
        units_sold INTEGER,
        growth_rate REAL,
        notes TEXT,
        assumptions TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        CHECK (month IS NULL OR quarter IS NULL)
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_projections_period
        ON projections(plan_id, year, IFNULL(month, 0), IFNULL(quarter, 0));
    "#,
    )?;
    Ok(())
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<FinancialProjection> {
    let count = |value: Option<i64>| value.and_then(|v| u64::try_from(v).ok());
    Ok(FinancialProjection {
        id: Some(row.get(0)?),
        plan_id: row.get(1)?,
        period: PeriodKey {
            year: row.get(2)?,
            month: row.get(3)?,
            quarter: row.get(4)?,
        },
        revenue: row.get(5)?,
        cost_of_goods_sold: row.get(6)?,
        operating_expenses: row.get(7)?,
        marketing_expenses: row.get(8)?,
        rd_expenses: row.get(9)?,
        administrative_expenses: row.get(10)?,
        other_expenses: row.get(11)?,
        cash_flow: row.get(12)?,
        cash_balance: row.get(13)?,
        employee_count: row.get(14)?,
        customer_count: count(row.get(15)?),
        units_sold: count(row.get(16)?),
        growth_rate: row.get(17)?,
        notes: row.get(18)?,
        assumptions: row.get(19)?,
    })
}

fn insert_row(conn: &Connection, p: &FinancialProjection) -> Result<FinancialProjection> {
    let inserted = conn.execute(
        "INSERT INTO projections(plan_id, year, month, quarter, revenue, cost_of_goods_sold, \
         operating_expenses, marketing_expenses, rd_expenses, administrative_expenses, other_expenses, \
         cash_flow, cash_balance, employee_count, customer_count, units_sold, growth_rate, notes, assumptions) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            p.plan_id,
            p.period.year,
            p.period.month,
            p.period.quarter,
            p.revenue,
            p.cost_of_goods_sold,
            p.operating_expenses,
            p.marketing_expenses,
            p.rd_expenses,
            p.administrative_expenses,
            p.other_expenses,
            p.cash_flow,
            p.cash_balance,
            p.employee_count,
            p.customer_count.map(|c| c as i64),
            p.units_sold.map(|u| u as i64),
            p.growth_rate,
            p.notes,
            p.assumptions,
        ],
    );

    match inserted {
        Ok(_) => Ok(FinancialProjection {
            id: Some(conn.last_insert_rowid()),
            ..p.clone()
        }),
        // Only the period index is unique; other constraint failures pass through
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            log::warn!("rejecting duplicate projection for plan {} at {}", p.plan_id, p.period);
            Err(EngineError::DuplicatePeriod {
                plan_id: p.plan_id,
                period: p.period,
            })
        }
        Err(e) => Err(e.into()),
    }
}

impl ProjectionStore for SqliteStore {
    fn find_projections(&self, plan_id: i64, year: Option<i32>) -> Result<Vec<FinancialProjection>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM projections WHERE plan_id = ?1 AND (?2 IS NULL OR year = ?2)"
        ))?;
        let mut found = stmt
            .query_map(params![plan_id, year], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        found.sort_by_key(|p| p.period);
        Ok(found)
    }

    fn get_projection(&self, id: i64) -> Result<Option<FinancialProjection>> {
        let found = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM projections WHERE id = ?1"),
                [id],
                read_row,
            )
            .optional()?;
        Ok(found)
    }

    fn create_projection(
        &mut self,
        plan_id: i64,
        period: PeriodKey,
        fields: ProjectionFields,
    ) -> Result<FinancialProjection> {
        period.validate()?;
        insert_row(&self.conn, &FinancialProjection::from_fields(plan_id, period, fields))
    }

    fn create_batch(
        &mut self,
        projections: &[FinancialProjection],
        replace_existing: bool,
    ) -> Result<Vec<FinancialProjection>> {
        // A replacing DELETE would otherwise remove rows inserted earlier in this batch
        check_batch(projections)?;

        // Dropping the transaction on an early return rolls it back
        let tx = self.conn.transaction()?;
        let mut saved = Vec::with_capacity(projections.len());
        for p in projections {
            if replace_existing {
                tx.execute(
                    "DELETE FROM projections WHERE plan_id = ?1 AND year = ?2 \
                     AND IFNULL(month, 0) = IFNULL(?3, 0) AND IFNULL(quarter, 0) = IFNULL(?4, 0)",
                    params![p.plan_id, p.period.year, p.period.month, p.period.quarter],
                )?;
            }
            saved.push(insert_row(&tx, p)?);
        }
        tx.commit()?;
        Ok(saved)
    }

    fn update_projection(&mut self, id: i64, fields: ProjectionFields) -> Result<FinancialProjection> {
        let mut projection = self
            .get_projection(id)?
            .ok_or(EngineError::ProjectionNotFound(id))?;
        fields.apply_to(&mut projection);

        self.conn.execute(
            "UPDATE projections SET revenue = ?2, cost_of_goods_sold = ?3, operating_expenses = ?4, \
             marketing_expenses = ?5, rd_expenses = ?6, administrative_expenses = ?7, other_expenses = ?8, \
             cash_flow = ?9, cash_balance = ?10, employee_count = ?11, customer_count = ?12, units_sold = ?13, \
             growth_rate = ?14, notes = ?15, assumptions = ?16, updated_at = datetime('now') WHERE id = ?1",
            params![
                id,
                projection.revenue,
                projection.cost_of_goods_sold,
                projection.operating_expenses,
                projection.marketing_expenses,
                projection.rd_expenses,
                projection.administrative_expenses,
                projection.other_expenses,
                projection.cash_flow,
                projection.cash_balance,
                projection.employee_count,
                projection.customer_count.map(|c| c as i64),
                projection.units_sold.map(|u| u as i64),
                projection.growth_rate,
                projection.notes,
                projection.assumptions,
            ],
        )?;
        Ok(projection)
    }

    fn delete_projection(&mut self, id: i64) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM projections WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }
}

//! Invoice and payment database operations.
//!
//! An invoice row and its items are always written together inside one
//! transaction. Payment status is stored for querying but recomputed from
//! the stored amounts whenever an invoice is read back.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{decimal_at, decimal_text, Database, DbResult};
use crate::billing::{invoice_number_prefix, payment_status};
use crate::models::{Invoice, InvoiceItem, Payment};

const INVOICE_COLUMNS: &str = r#"
    id, invoice_number, patient_id, subtotal, tax_amount, discount_amount,
    total_amount, paid_amount, payment_status, invoice_date, due_date, notes,
    created_at, updated_at
"#;

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        patient_id: row.get(2)?,
        items: Vec::new(),
        subtotal: decimal_at(row, 3)?,
        tax_amount: decimal_at(row, 4)?,
        discount_amount: decimal_at(row, 5)?,
        total_amount: decimal_at(row, 6)?,
        paid_amount: decimal_at(row, 7)?,
        payment_status: row.get(8)?,
        invoice_date: row.get(9)?,
        due_date: row.get(10)?,
        notes: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<InvoiceItem> {
    Ok(InvoiceItem {
        description: row.get(0)?,
        quantity: row.get(1)?,
        unit_price: decimal_at(row, 2)?,
        line_total: decimal_at(row, 3)?,
    })
}

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        invoice_id: row.get(1)?,
        amount: decimal_at(row, 2)?,
        method: row.get(3)?,
        reference: row.get(4)?,
        received_at: row.get(5)?,
    })
}

impl Database {
    /// Insert an invoice together with its items.
    pub fn insert_invoice(&self, invoice: &Invoice) -> DbResult<()> {
        self.with_transaction(|db| {
            db.conn.execute(
                r#"
                INSERT INTO invoices (
                    id, invoice_number, patient_id, subtotal, tax_amount, discount_amount,
                    total_amount, paid_amount, payment_status, invoice_date, due_date, notes,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    invoice.id,
                    invoice.invoice_number,
                    invoice.patient_id,
                    decimal_text(&invoice.subtotal),
                    decimal_text(&invoice.tax_amount),
                    decimal_text(&invoice.discount_amount),
                    decimal_text(&invoice.total_amount),
                    decimal_text(&invoice.paid_amount),
                    invoice.payment_status,
                    invoice.invoice_date,
                    invoice.due_date,
                    invoice.notes,
                    invoice.created_at,
                    invoice.updated_at,
                ],
            )?;
            db.write_invoice_items(&invoice.id, &invoice.items)
        })
    }

    /// Replace an invoice's header values and items.
    pub fn update_invoice(&self, invoice: &Invoice) -> DbResult<bool> {
        self.with_transaction(|db| {
            let rows_affected = db.conn.execute(
                r#"
                UPDATE invoices SET
                    patient_id = ?2,
                    subtotal = ?3,
                    tax_amount = ?4,
                    discount_amount = ?5,
                    total_amount = ?6,
                    paid_amount = ?7,
                    payment_status = ?8,
                    invoice_date = ?9,
                    due_date = ?10,
                    notes = ?11,
                    updated_at = ?12
                WHERE id = ?1
                "#,
                params![
                    invoice.id,
                    invoice.patient_id,
                    decimal_text(&invoice.subtotal),
                    decimal_text(&invoice.tax_amount),
                    decimal_text(&invoice.discount_amount),
                    decimal_text(&invoice.total_amount),
                    decimal_text(&invoice.paid_amount),
                    invoice.payment_status,
                    invoice.invoice_date,
                    invoice.due_date,
                    invoice.notes,
                    invoice.updated_at,
                ],
            )?;
            if rows_affected == 0 {
                return Ok(false);
            }

            db.conn
                .execute("DELETE FROM invoice_items WHERE invoice_id = ?", [&invoice.id])?;
            db.write_invoice_items(&invoice.id, &invoice.items)?;
            Ok(true)
        })
    }

    fn write_invoice_items(&self, invoice_id: &str, items: &[InvoiceItem]) -> DbResult<()> {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO invoice_items (
                invoice_id, position, description, quantity, unit_price, line_total
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        for (position, item) in items.iter().enumerate() {
            stmt.execute(params![
                invoice_id,
                position as i64,
                item.description,
                item.quantity,
                decimal_text(&item.unit_price),
                decimal_text(&item.line_total),
            ])?;
        }
        Ok(())
    }

    /// Update only the paid amount and status after a payment.
    pub fn update_invoice_payment(&self, invoice: &Invoice) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE invoices SET paid_amount = ?2, payment_status = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
            params![
                invoice.id,
                decimal_text(&invoice.paid_amount),
                invoice.payment_status,
                invoice.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    fn load_invoice_items(&self, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT description, quantity, unit_price, line_total
            FROM invoice_items
            WHERE invoice_id = ?
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([invoice_id], item_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Attach items and re-derive the payment status from the amounts.
    fn hydrate_invoice(&self, mut invoice: Invoice) -> DbResult<Invoice> {
        invoice.items = self.load_invoice_items(&invoice.id)?;

        let derived = payment_status(invoice.paid_amount, invoice.total_amount);
        if derived != invoice.payment_status {
            tracing::warn!(
                invoice = %invoice.invoice_number,
                stored = %invoice.payment_status,
                derived = %derived,
                "stored payment status disagrees with amounts"
            );
            invoice.payment_status = derived;
        }
        Ok(invoice)
    }

    /// Get an invoice with its items.
    pub fn get_invoice(&self, id: &str) -> DbResult<Option<Invoice>> {
        let invoice = self
            .conn
            .query_row(
                &format!("SELECT {} FROM invoices WHERE id = ?", INVOICE_COLUMNS),
                [id],
                invoice_from_row,
            )
            .optional()?;
        invoice.map(|i| self.hydrate_invoice(i)).transpose()
    }

    /// Get an invoice by its human-facing number.
    pub fn get_invoice_by_number(&self, invoice_number: &str) -> DbResult<Option<Invoice>> {
        let invoice = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM invoices WHERE invoice_number = ?",
                    INVOICE_COLUMNS
                ),
                [invoice_number],
                invoice_from_row,
            )
            .optional()?;
        invoice.map(|i| self.hydrate_invoice(i)).transpose()
    }

    /// Next free sequence for invoice numbers dated `invoice_date`.
    ///
    /// Call inside the transaction that inserts the invoice.
    pub fn next_invoice_sequence(&self, invoice_date: NaiveDate) -> DbResult<u32> {
        let prefix = invoice_number_prefix(invoice_date);
        let mut stmt = self
            .conn
            .prepare("SELECT invoice_number FROM invoices WHERE invoice_number LIKE ?1 || '%'")?;
        let numbers = stmt
            .query_map([&prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let last = numbers
            .iter()
            .filter_map(|n| n.strip_prefix(&prefix)?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(last + 1)
    }

    /// Invoices dated within `[from, to]`, earliest first.
    pub fn list_invoices_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM invoices
            WHERE invoice_date BETWEEN ?1 AND ?2
            ORDER BY invoice_date, invoice_number
            "#,
            INVOICE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from, to], invoice_from_row)?;
        let invoices = rows.collect::<Result<Vec<_>, _>>()?;
        invoices
            .into_iter()
            .map(|i| self.hydrate_invoice(i))
            .collect()
    }

    /// A patient's invoices, newest first.
    pub fn list_patient_invoices(&self, patient_id: &str) -> DbResult<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM invoices
            WHERE patient_id = ?
            ORDER BY invoice_date DESC, invoice_number DESC
            "#,
            INVOICE_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], invoice_from_row)?;
        let invoices = rows.collect::<Result<Vec<_>, _>>()?;
        invoices
            .into_iter()
            .map(|i| self.hydrate_invoice(i))
            .collect()
    }

    /// Delete an invoice. Items and payments cascade.
    pub fn delete_invoice(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM invoices WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Record a payment row.
    pub fn insert_payment(&self, payment: &Payment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO payments (id, invoice_id, amount, method, reference, received_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                payment.id,
                payment.invoice_id,
                decimal_text(&payment.amount),
                payment.method,
                payment.reference,
                payment.received_at,
            ],
        )?;
        Ok(())
    }

    /// Payments against an invoice in the order they were received.
    pub fn list_payments(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, invoice_id, amount, method, reference, received_at
            FROM payments
            WHERE invoice_id = ?
            ORDER BY received_at, rowid
            "#,
        )?;
        let rows = stmt.query_map([invoice_id], payment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

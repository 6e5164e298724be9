//! Hospital settings stored as key/value rows.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;

use super::{decimal_text, Database, DbResult};
use crate::models::HospitalSettings;

impl Database {
    fn setting(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    fn put_setting(&self, key: &str, value: Option<&str>) -> DbResult<()> {
        match value {
            Some(value) => {
                self.conn.execute(
                    r#"
                    INSERT INTO settings (key, value, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at
                    "#,
                    params![key, value, chrono::Utc::now().to_rfc3339()],
                )?;
            }
            None => {
                self.conn.execute("DELETE FROM settings WHERE key = ?", [key])?;
            }
        }
        Ok(())
    }

    /// Stored settings layered over `defaults`.
    pub fn load_settings(&self, defaults: &HospitalSettings) -> DbResult<HospitalSettings> {
        let mut settings = defaults.clone();

        if let Some(name) = self.setting("hospital_name")? {
            settings.hospital_name = name;
        }
        if let Some(currency) = self.setting("currency")? {
            settings.currency = currency;
        }
        if let Some(rate) = self.setting("default_tax_rate")? {
            settings.default_tax_rate = Decimal::from_str(&rate).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
            })?;
        }
        settings.address = self.setting("address")?.or(settings.address);
        settings.phone = self.setting("phone")?.or(settings.phone);
        settings.email = self.setting("email")?.or(settings.email);

        Ok(settings)
    }

    /// Persist every settings field.
    pub fn save_settings(&self, settings: &HospitalSettings) -> DbResult<()> {
        self.with_transaction(|db| {
            db.put_setting("hospital_name", Some(settings.hospital_name.as_str()))?;
            db.put_setting("currency", Some(settings.currency.as_str()))?;
            db.put_setting(
                "default_tax_rate",
                Some(decimal_text(&settings.default_tax_rate).as_str()),
            )?;
            db.put_setting("address", settings.address.as_deref())?;
            db.put_setting("phone", settings.phone.as_deref())?;
            db.put_setting("email", settings.email.as_deref())?;
            Ok(())
        })
    }
}

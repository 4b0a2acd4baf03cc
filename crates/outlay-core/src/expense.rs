//! The expense record and its field validation rules.
//!
//! Validation is enforced at the request boundary, on the fields present in
//! a given request: creates validate every required field, partial updates
//! validate only the fields supplied.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Category assigned when a request supplies none.
pub const DEFAULT_CATEGORY: &str = "Others";

/// Minimum title length, in characters.
const MIN_TITLE_LEN: usize = 3;

/// A single spending entry.
///
/// The identifier is an opaque string at this boundary; only the storage
/// adapter knows its internal representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Store-assigned identifier. `None` until the record is inserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// What the money was spent on.
    pub title: String,
    /// Amount spent.
    pub amount: f64,
    /// Spending category.
    pub category: String,
    /// When the expense occurred.
    pub date: DateTime<Utc>,
    /// When the record was created. Set once, at insert time.
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Creates a new unsaved expense with `createdAt` set to now.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        amount: f64,
        category: Option<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            amount,
            category: category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            date,
            created_at: Utc::now(),
        }
    }

    /// Applies a partial update, leaving absent fields untouched.
    pub fn apply(&mut self, update: &ExpenseUpdate) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(category) = &update.category {
            self.category = category.clone();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
    }
}

/// A validated partial update: any subset of the mutable expense fields.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    /// New title, if supplied.
    pub title: Option<String>,
    /// New amount, if supplied.
    pub amount: Option<f64>,
    /// New category, if supplied.
    pub category: Option<String>,
    /// New date, if supplied.
    pub date: Option<DateTime<Utc>>,
}

impl ExpenseUpdate {
    /// Returns `true` if no field is supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
    }
}

/// Validates a title: present and at least three characters.
pub fn validate_title(title: &str) -> Result<()> {
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(Error::validation(
            "title",
            format!("title must be at least {MIN_TITLE_LEN} characters long"),
        ));
    }
    Ok(())
}

/// Parses an amount from its text form. Must be a finite number.
pub fn parse_amount(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| Error::validation("amount", "amount must be a number"))
}

/// Validates an amount already carried as a number.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(Error::validation("amount", "amount must be a number"))
    }
}

/// Parses a date from its text form.
///
/// Accepts RFC 3339 (`2024-01-01T09:30:00Z`), a bare calendar date
/// (`2024-01-01`, taken as midnight UTC), or a date-time without offset
/// (`2024-01-01T09:30:00`, taken as UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }

    Err(Error::validation("date", "date must be a valid date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_rules() {
        assert!(validate_title("Coffee").is_ok());
        assert!(validate_title("abc").is_ok());
        assert!(validate_title("ab").is_err());
        assert!(validate_title("").is_err());
    }

    #[test]
    fn test_amount_parsing() {
        assert_eq!(parse_amount("4.50").unwrap(), 4.5);
        assert_eq!(parse_amount(" 10 ").unwrap(), 10.0);
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
        assert!(validate_amount(50.0).is_ok());
    }

    #[test]
    fn test_date_parsing() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date("2024-01-01").unwrap(), midnight);
        assert_eq!(parse_date("2024-01-01T00:00:00Z").unwrap(), midnight);
        assert_eq!(
            parse_date("2024-01-01T09:30:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
        );
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("2024-13-40").is_err());
    }

    #[test]
    fn test_default_category() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expense = Expense::new("Coffee", 4.5, None, date);
        assert_eq!(expense.category, DEFAULT_CATEGORY);
        assert!(expense.id.is_none());

        let expense = Expense::new("Lunch", 12.0, Some("Food".to_string()), date);
        assert_eq!(expense.category, "Food");
    }

    #[test]
    fn test_partial_apply_leaves_absent_fields() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut expense = Expense::new("Coffee", 4.5, None, date);

        let update = ExpenseUpdate {
            amount: Some(50.0),
            ..Default::default()
        };
        expense.apply(&update);

        assert_eq!(expense.amount, 50.0);
        assert_eq!(expense.title, "Coffee");
        assert_eq!(expense.category, DEFAULT_CATEGORY);
        assert_eq!(expense.date, date);
    }

    #[test]
    fn test_empty_update() {
        assert!(ExpenseUpdate::default().is_empty());
        let update = ExpenseUpdate {
            title: Some("Tea".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut expense = Expense::new("Coffee", 4.5, None, date);
        expense.id = Some("abc123".to_string());

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["title"], "Coffee");
        assert_eq!(json["amount"], 4.5);
        assert_eq!(json["category"], "Others");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }
}

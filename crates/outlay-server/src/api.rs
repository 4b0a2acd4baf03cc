//! API wire types for the expense endpoints.
//!
//! Each operation has an explicit input schema, validated before any store
//! call runs. Validation short-circuits on the first violation and names the
//! failed field; partial updates validate only the fields supplied.

use serde::Deserialize;

use outlay_core::{
    expense::{parse_amount, parse_date, validate_amount, validate_title},
    Error, Expense, ExpenseUpdate, Result,
};

/// An amount as it appears on the wire: a JSON number or a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    /// A JSON number.
    Number(f64),
    /// A numeric string, e.g. `"4.50"`.
    Text(String),
}

impl AmountField {
    /// Resolves the wire value to a validated amount.
    pub fn resolve(&self) -> Result<f64> {
        match self {
            Self::Number(n) => validate_amount(*n),
            Self::Text(s) => parse_amount(s),
        }
    }
}

/// Request body for `POST /expenses`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpenseRequest {
    /// What the money was spent on.
    #[serde(default)]
    pub title: Option<String>,
    /// Amount spent.
    #[serde(default)]
    pub amount: Option<AmountField>,
    /// When the expense occurred.
    #[serde(default)]
    pub date: Option<String>,
    /// Spending category. Defaults to "Others" when absent.
    #[serde(default)]
    pub category: Option<String>,
}

impl CreateExpenseRequest {
    /// Validates the request and builds an unsaved [`Expense`].
    ///
    /// Checks run in order and stop at the first failure: title present and
    /// long enough, amount present and numeric, date present and parseable.
    pub fn into_expense(self) -> Result<Expense> {
        let title = self
            .title
            .ok_or_else(|| Error::validation("title", "title is required"))?;
        validate_title(&title)?;

        let amount = self
            .amount
            .ok_or_else(|| Error::validation("amount", "amount is required"))?
            .resolve()?;

        let date = self
            .date
            .ok_or_else(|| Error::validation("date", "date is required"))?;
        let date = parse_date(&date)?;

        Ok(Expense::new(title, amount, self.category, date))
    }
}

/// Request body for `PATCH /expenses/{id}`: any subset of the mutable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpenseRequest {
    /// New title, if supplied.
    #[serde(default)]
    pub title: Option<String>,
    /// New amount, if supplied.
    #[serde(default)]
    pub amount: Option<AmountField>,
    /// New category, if supplied.
    #[serde(default)]
    pub category: Option<String>,
    /// New date, if supplied.
    #[serde(default)]
    pub date: Option<String>,
}

impl UpdateExpenseRequest {
    /// Validates the supplied fields and builds an [`ExpenseUpdate`].
    ///
    /// Absent fields are left untouched; an empty body is rejected.
    pub fn into_update(self) -> Result<ExpenseUpdate> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        let amount = self.amount.map(|a| a.resolve()).transpose()?;
        let date = self.date.map(|d| parse_date(&d)).transpose()?;

        let update = ExpenseUpdate {
            title: self.title,
            amount,
            category: self.category,
            date,
        };

        if update.is_empty() {
            return Err(Error::validation(
                "body",
                "at least one of title, amount, category, date must be supplied",
            ));
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(body: &str) -> CreateExpenseRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_create_valid() {
        let req = create_request(r#"{"title":"Coffee","amount":"4.50","date":"2024-01-01"}"#);
        let expense = req.into_expense().unwrap();
        assert_eq!(expense.title, "Coffee");
        assert_eq!(expense.amount, 4.5);
        assert_eq!(expense.category, "Others");
    }

    #[test]
    fn test_create_accepts_numeric_amount() {
        let req = create_request(r#"{"title":"Lunch","amount":12,"date":"2024-01-01"}"#);
        assert_eq!(req.into_expense().unwrap().amount, 12.0);
    }

    #[test]
    fn test_create_validation_order() {
        let err = create_request(r#"{}"#).into_expense().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "title"));

        let err = create_request(r#"{"title":"Coffee"}"#)
            .into_expense()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "amount"));

        let err = create_request(r#"{"title":"Coffee","amount":4.5}"#)
            .into_expense()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "date"));
    }

    #[test]
    fn test_create_rejects_short_title() {
        let err = create_request(r#"{"title":"ab","amount":4.5,"date":"2024-01-01"}"#)
            .into_expense()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "title"));
    }

    #[test]
    fn test_create_rejects_non_numeric_amount() {
        let err = create_request(r#"{"title":"Coffee","amount":"abc","date":"2024-01-01"}"#)
            .into_expense()
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "amount"));
    }

    #[test]
    fn test_update_validates_only_supplied_fields() {
        let req: UpdateExpenseRequest = serde_json::from_str(r#"{"amount":50}"#).unwrap();
        let update = req.into_update().unwrap();
        assert_eq!(update.amount, Some(50.0));
        assert!(update.title.is_none());
        assert!(update.category.is_none());
        assert!(update.date.is_none());
    }

    #[test]
    fn test_update_rejects_bad_supplied_field() {
        let req: UpdateExpenseRequest =
            serde_json::from_str(r#"{"title":"ab","amount":50}"#).unwrap();
        let err = req.into_update().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "title"));
    }

    #[test]
    fn test_update_rejects_empty_body() {
        let err = UpdateExpenseRequest::default().into_update().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "body"));
    }
}

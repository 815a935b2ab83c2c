//! Billing details and validation.
//!
//! Validation stops at presence and category-specific formats. Card number
//! formats are deliberately not checked here; the payment gateway owns that.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the shopper intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment through the gateway.
    Card,
    /// Regional mobile-money wallet.
    MobileMoney,
    /// Cash on collection.
    Cash,
}

/// Card fields forwarded to the gateway. Presence is validated; format is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    /// Card number as entered.
    pub number: String,
    /// Name on the card.
    pub holder: String,
    /// Expiry as entered (e.g. `"12/27"`).
    pub expiry: String,
}

/// Billing details captured at the payment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingInfo {
    /// Full name of the payer.
    pub full_name: String,
    /// Contact email; confirmation is sent here.
    pub email: String,
    /// Contact phone; format rules depend on the payment method.
    pub phone: String,
    /// Selected payment method.
    pub method: PaymentMethod,
    /// Card fields, required when `method` is [`PaymentMethod::Card`].
    pub card: Option<CardDetails>,
}

/// Field-level billing validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingValidationError {
    /// A required field was empty.
    #[error("{field} is required")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// The email did not look like an address.
    #[error("email address is not valid")]
    InvalidEmail,

    /// The phone number did not match the expected format.
    #[error("phone number is not valid for the selected payment method")]
    InvalidPhone,

    /// Card payment selected but card fields absent or incomplete.
    #[error("card details are required for card payment")]
    MissingCardDetails,
}

/// Validate billing details for submission.
///
/// Mobile-money payments require a ten-digit mobile number starting `97` or
/// `98` (the regional wallet format); other methods accept any 7–15 digit
/// number. Card payments additionally require the card fields to be present.
///
/// # Errors
///
/// Returns the first [`BillingValidationError`] encountered, field order:
/// name, email, phone, card.
pub fn validate_billing(billing: &BillingInfo) -> Result<(), BillingValidationError> {
    if billing.full_name.trim().is_empty() {
        return Err(BillingValidationError::MissingField { field: "full_name" });
    }

    if billing.email.trim().is_empty() {
        return Err(BillingValidationError::MissingField { field: "email" });
    }

    if !is_plausible_email(&billing.email) {
        return Err(BillingValidationError::InvalidEmail);
    }

    if billing.phone.trim().is_empty() {
        return Err(BillingValidationError::MissingField { field: "phone" });
    }

    if !phone_matches(billing.method, &billing.phone) {
        return Err(BillingValidationError::InvalidPhone);
    }

    if billing.method == PaymentMethod::Card {
        match &billing.card {
            None => return Err(BillingValidationError::MissingCardDetails),
            Some(card) => {
                if card.number.trim().is_empty()
                    || card.holder.trim().is_empty()
                    || card.expiry.trim().is_empty()
                {
                    return Err(BillingValidationError::MissingCardDetails);
                }
            }
        }
    }

    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn phone_matches(method: PaymentMethod, phone: &str) -> bool {
    let phone = phone.trim();

    // Reject anything beyond bare digits; separators are the UI's job.
    if phone.is_empty() || !phone.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    match method {
        PaymentMethod::MobileMoney => phone.len() == 10 && matches!(&phone[..2], "97" | "98"),
        PaymentMethod::Card | PaymentMethod::Cash => (7..=15).contains(&phone.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mobile_billing() -> BillingInfo {
        BillingInfo {
            full_name: "Asha Rai".to_owned(),
            email: "asha@example.com".to_owned(),
            phone: "9812345678".to_owned(),
            method: PaymentMethod::MobileMoney,
            card: None,
        }
    }

    #[test]
    fn valid_mobile_money_billing_passes() {
        assert_eq!(validate_billing(&mobile_billing()), Ok(()));
    }

    #[test]
    fn missing_name_is_the_first_failure() {
        let mut billing = mobile_billing();
        billing.full_name = "  ".to_owned();
        billing.email = String::new();

        assert_eq!(
            validate_billing(&billing),
            Err(BillingValidationError::MissingField { field: "full_name" })
        );
    }

    #[test]
    fn email_must_look_like_an_address() {
        let mut billing = mobile_billing();
        billing.email = "not-an-email".to_owned();

        assert_eq!(
            validate_billing(&billing),
            Err(BillingValidationError::InvalidEmail)
        );
    }

    #[test]
    fn mobile_money_requires_the_regional_format() {
        let mut billing = mobile_billing();
        billing.phone = "5512345678".to_owned();

        assert_eq!(
            validate_billing(&billing),
            Err(BillingValidationError::InvalidPhone)
        );

        billing.phone = "98123".to_owned();

        assert_eq!(
            validate_billing(&billing),
            Err(BillingValidationError::InvalidPhone)
        );
    }

    #[test]
    fn cash_accepts_any_reasonable_number() {
        let mut billing = mobile_billing();
        billing.method = PaymentMethod::Cash;
        billing.phone = "0123456".to_owned();

        assert_eq!(validate_billing(&billing), Ok(()));
    }

    #[test]
    fn card_payment_requires_card_fields() {
        let mut billing = mobile_billing();
        billing.method = PaymentMethod::Card;
        billing.phone = "5551234567".to_owned();

        assert_eq!(
            validate_billing(&billing),
            Err(BillingValidationError::MissingCardDetails)
        );

        billing.card = Some(CardDetails {
            number: "4111 1111 1111 1111".to_owned(),
            holder: "Asha Rai".to_owned(),
            expiry: "12/27".to_owned(),
        });

        // Card number format is the gateway's concern, not ours.
        assert_eq!(validate_billing(&billing), Ok(()));
    }

    #[test]
    fn card_fields_must_be_non_empty() {
        let mut billing = mobile_billing();
        billing.method = PaymentMethod::Card;
        billing.phone = "5551234567".to_owned();
        billing.card = Some(CardDetails {
            number: String::new(),
            holder: "Asha Rai".to_owned(),
            expiry: "12/27".to_owned(),
        });

        assert_eq!(
            validate_billing(&billing),
            Err(BillingValidationError::MissingCardDetails)
        );
    }
}
